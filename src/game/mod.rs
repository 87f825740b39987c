//! Game Logic Module
//!
//! Everything about a Colapsi match. Deterministic given a seed and the
//! sequence of (input, timestamp) pairs.
//!
//! ## Module Structure
//!
//! - `card`: Suits, ranks and the 24-card deck
//! - `board`: The toroidal card grid
//! - `player`: Players and the seat registry
//! - `state`: Board plus players, with event-emitting mutations
//! - `ability`: Suit abilities and provisional effects
//! - `route`: Route planning and validation
//! - `clock`: Per-turn deadline
//! - `engine`: Turn engine, configuration and read models
//! - `input`: Intents, key mapping and input sources
//! - `events`: Game events and renderers

pub mod card;
pub mod board;
pub mod player;
pub mod state;
pub mod ability;
pub mod route;
pub mod clock;
pub mod engine;
pub mod input;
pub mod events;

// Re-export key types
pub use card::{CardValue, Deck, Rank, Suit};
pub use board::{Adjacency, Board, BoardError, Cell, CellId, Orientation};
pub use player::{Player, PlayerError, PlayerId, PlayerRegistry, PlayerSpec};
pub use state::GameState;
pub use ability::{AbilityError, AbilityKind};
pub use route::{MoveRejection, RouteError, RouteOptions, RoutePlan};
pub use clock::TurnClock;
pub use engine::{ConfigError, EngineError, GameConfig, GameEngine, GamePhase, GameStats, TurnPhase};
pub use input::{intent_for_key, InputSource, Intent, PlayerInput};
pub use events::{EliminationReason, GameEvent, GameEventData, Renderer, TracingRenderer};
