//! Plan files and persisted state.
//!
//! A plan is a YAML document with a `provider:` block, a map of resources
//! and a map of data sources, each keyed by a name unique within its map.
//! State is the JSON record of what the last apply produced, keyed the same
//! way.

mod model;
mod state;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::{DataSpec, Plan, ResourceSpec};
pub use state::State;
