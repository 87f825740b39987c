//! # Colapsi Engine
//!
//! Turn and route engine for Colapsi, a board game played on a wrapping
//! grid of face-up and face-down cards.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      COLAPSI ENGINE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── grid.rs     - Toroidal positions and directions         │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── card.rs     - Suits, ranks, the 24-card deck            │
//! │  ├── board.rs    - Card grid, adjacency, flips, swaps        │
//! │  ├── player.rs   - Players and seat registry                 │
//! │  ├── state.rs    - Board + players, event emission           │
//! │  ├── ability.rs  - Heal, Swap, Phantom Step, Diagonal Move   │
//! │  ├── route.rs    - Route building and validation             │
//! │  ├── clock.rs    - Per-turn deadline                         │
//! │  ├── engine.rs   - Turn engine, config, read models          │
//! │  ├── input.rs    - Intents, key mapping, input sources       │
//! │  └── events.rs   - Game events, renderers                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules never read the system clock or an
//! unseeded RNG:
//! - Time is passed in by the caller (`now` parameters, `poll_clock`)
//! - No HashMap (BTreeMap/BTreeSet/Vec for ordered iteration)
//! - All randomness from seeded Xorshift128+
//!
//! Two engines built from the same config and fed the same timestamped
//! inputs end with identical `compute_hash()` values.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use core::grid::{Direction, GridDims, Position};
pub use core::rng::DeterministicRng;
pub use game::engine::{GameConfig, GameEngine, GamePhase, TurnPhase};
pub use game::input::Intent;
pub use game::player::PlayerId;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
