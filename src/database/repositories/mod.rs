//! Database repositories module
//!
//! One repository per table family, each holding a clone of the pool

pub mod user;
pub mod student;
pub mod session;
pub mod pre_assigned;
pub mod notification;
pub mod report;
pub mod message;
pub mod attendance;

// Re-export repositories
pub use user::UserRepository;
pub use student::StudentRepository;
pub use session::SessionRepository;
pub use pre_assigned::PreAssignedRepository;
pub use notification::NotificationRepository;
pub use report::ReportRepository;
pub use message::MessageRepository;
pub use attendance::AttendanceRepository;
