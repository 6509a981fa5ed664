//! Hall-pass core
//!
//! Pure rules for return codes, pass timing, the session state machine,
//! allowance accounting and monthly aggregation. Nothing here touches the
//! store; services feed records in and persist what comes out.

pub mod code;
pub mod timer;
pub mod lifecycle;
pub mod ledger;
pub mod report;

/// Passes at or beyond this many minutes are overtime
pub const OVERTIME_MINUTES: i64 = 10;
pub const OVERTIME_SECONDS: i64 = OVERTIME_MINUTES * 60;

pub use code::{RotatingCodeGenerator, ReturnCode};
pub use timer::{PassTimer, TimerThresholds};
pub use lifecycle::{PassAuthorization, PassClosure};
pub use report::ReportWindow;
