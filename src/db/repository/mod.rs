//! Repository layer: entity-scoped database operations.
//!
//! Shifts go through `SqliteShiftStore` (the `ShiftStore` implementation);
//! providers, clinic types and monthly notes are plain functions over a
//! connection. All public functions are re-exported here.

mod directory;
mod shift;

pub use directory::*;
pub use shift::*;
