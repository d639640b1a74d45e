//! High-level entry points that orchestrate the engine: fitting an energy
//! model to observed selection rounds and simulating synthetic rounds from a
//! known model.

pub mod fit;
pub mod simulate;
