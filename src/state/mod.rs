//! In-process runtime state
//!
//! This module holds what lives only in memory: the active pass index,
//! per-student locks and the live pass feed

pub mod active;
pub mod feed;
pub mod locks;

// Re-export commonly used state components
pub use active::{ActivePassIndex, Reservation};
pub use feed::{FeedMessage, PassEvent, PassFeed};
pub use locks::StudentLocks;
