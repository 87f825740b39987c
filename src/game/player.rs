//! Players and the Player Registry
//!
//! Seat order is registration order. The registry owns every `Player`;
//! board cells only hold `PlayerId` back-references.

use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::core::grid::Position;
use crate::game::board::CellId;
use crate::game::card::CardValue;

// =============================================================================
// ERRORS
// =============================================================================

/// Player registry errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    #[error("no seat id left for player {0}")]
    TooManySeats(usize),
}

// =============================================================================
// PLAYER ID
// =============================================================================

/// Player identifier, 1-based like the seat labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create from the raw seat number.
    pub const fn new(id: u8) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

// =============================================================================
// PLAYER SPEC
// =============================================================================

/// Presentation identity of a seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSpec {
    pub name: String,
    /// CSS-style color the renderer paints the token with
    pub color: String,
    /// Token label
    pub token: String,
}

impl PlayerSpec {
    /// Create a seat spec.
    pub fn new(name: impl Into<String>, color: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            token: token.into(),
        }
    }

    /// The four default seats.
    pub fn defaults() -> Vec<PlayerSpec> {
        vec![
            PlayerSpec::new("Player 1", "#e53e3e", "1"),
            PlayerSpec::new("Player 2", "#3182ce", "2"),
            PlayerSpec::new("Player 3", "#38a169", "3"),
            PlayerSpec::new("Player 4", "#d69e2e", "4"),
        ]
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// One entry of a player's move log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Cell landed on
    pub cell: CellId,
    /// Card on that cell at the time
    pub value: CardValue,
    /// Grid position of the cell
    pub position: Position,
    pub timestamp: DateTime<Utc>,
}

/// State of a single player.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub token: String,

    /// Cell currently occupied; `None` before placement and after elimination
    pub current_cell: Option<CellId>,

    /// Permanently out of the game?
    pub eliminated: bool,

    /// Every placement and committed route destination, in order
    pub moves: Vec<MoveRecord>,
}

impl Player {
    /// Create an unplaced player.
    pub fn new(id: PlayerId, spec: PlayerSpec) -> Self {
        Self {
            id,
            name: spec.name,
            color: spec.color,
            token: spec.token,
            current_cell: None,
            eliminated: false,
            moves: Vec::new(),
        }
    }

    /// Still in the game?
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.eliminated
    }

    /// Number of logged moves (initial placement included).
    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    /// Record a landing in the move log.
    pub fn log_move(&mut self, cell: CellId, value: CardValue, position: Position, timestamp: DateTime<Utc>) {
        self.moves.push(MoveRecord { cell, value, position, timestamp });
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// All players, in seat order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlayerRegistry {
    players: Vec<Player>,
}

impl PlayerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded from seat specs; ids are assigned 1, 2, 3...
    pub fn from_specs(specs: &[PlayerSpec]) -> Result<Self, PlayerError> {
        let mut registry = Self::new();
        for spec in specs {
            registry.add_player(spec.clone())?;
        }
        Ok(registry)
    }

    /// Append a seat and return its id.
    pub fn add_player(&mut self, spec: PlayerSpec) -> Result<PlayerId, PlayerError> {
        let seat = self.players.len() + 1;
        let raw = u8::try_from(seat).map_err(|_| PlayerError::TooManySeats(seat))?;
        let id = PlayerId::new(raw);
        self.players.push(Player::new(id, spec));
        Ok(id)
    }

    /// Get a player by ID.
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Get a player mutably by ID.
    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Player at a seat index.
    pub fn at_seat(&self, index: usize) -> Option<&Player> {
        self.players.get(index)
    }

    /// Seat index of a player.
    pub fn seat_of(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    /// Iterate in seat order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// All ids in seat order.
    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    /// Number of seats.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// True when no seats exist.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players not yet eliminated.
    pub fn count_non_eliminated(&self) -> usize {
        self.players.iter().filter(|p| p.is_active()).count()
    }

    /// Ids of players not yet eliminated, in seat order.
    pub fn survivors(&self) -> Vec<PlayerId> {
        self.players.iter().filter(|p| p.is_active()).map(|p| p.id).collect()
    }
}
