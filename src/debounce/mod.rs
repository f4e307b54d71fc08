//! Key chatter suppression: the filter, its run state and the engine

mod engine;
mod filter;
mod state;

pub use engine::DebounceEngine;
pub use filter::{DebounceFilter, FilterSnapshot, SuppressionTally};
pub use state::RunState;
