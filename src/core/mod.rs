//! Core deterministic primitives.
//!
//! Grid geometry, seeded randomness and state hashing. Nothing in here
//! knows about cards or players.

pub mod grid;
pub mod rng;
pub mod hash;

// Re-export core types
pub use grid::{Direction, GridDims, Position};
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash, StateHasher};
