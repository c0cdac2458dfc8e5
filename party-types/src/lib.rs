pub mod config;
pub mod errors;
pub mod game;
pub mod player;

// Re-export all types
pub use config::*;
pub use errors::*;
pub use game::*;
pub use player::*;
