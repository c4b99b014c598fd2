//! Cog exercise protocol.
//!
//! Drives a deterministic load→unload round trip per cog and validates the
//! state transitions the bot reports.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `outcome` | Per-cog [`CogOutcome`] records |
//! | `round_trip` | [`ExerciseProtocol`] and its free-function shorthands |

/// Per-cog outcome records.
pub mod outcome;

/// Load/unload round trips.
pub mod round_trip;

pub use outcome::CogOutcome;
pub use round_trip::{ExerciseProtocol, exercise, load_one, unload_one};
