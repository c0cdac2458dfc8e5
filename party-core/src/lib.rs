pub mod content;
pub mod engine;
pub mod game_events;
pub mod phase;
pub mod registry;
pub mod scoring;
pub mod sequencer;

// Re-export main components
pub use content::*;
pub use engine::*;
pub use game_events::*;
pub use phase::*;
pub use registry::*;
pub use scoring::*;
pub use sequencer::*;
