pub mod config;
pub mod session_manager;
pub mod timer;

pub use config::HostConfig;
pub use session_manager::{SessionError, SessionId, SessionManager};
