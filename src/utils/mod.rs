//! Utility modules
//!
//! This module contains common utilities used throughout the application,
//! including error handling, logging setup, helper functions and the clock.

pub mod clock;
pub mod errors;
pub mod logging;
pub mod helpers;

pub use clock::{Clock, SystemClock, FixedClock};
pub use errors::{TeachersPetError, Result};
