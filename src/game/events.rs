//! Game Events
//!
//! Everything observable that the engine does is recorded as a
//! `GameEvent` on the state's pending queue. A renderer drains the queue
//! after each input and redraws whatever changed.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::game::ability::AbilityKind;
use crate::game::board::{CellId, Orientation};
use crate::game::card::CardValue;
use crate::game::player::PlayerId;
use crate::game::route::MoveRejection;

/// Why a player left the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationReason {
    /// Turn clock ran out
    Timeout,
    /// Player resigned
    GaveUp,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Players placed, play begins
    GameStarted {
        players: Vec<PlayerId>,
        rng_seed: u64,
    },

    /// A card was flipped
    CellOrientationChanged {
        cell: CellId,
        orientation: Orientation,
    },

    /// A player token moved (`None` = off the board)
    OccupancyChanged {
        player: PlayerId,
        from: Option<CellId>,
        to: Option<CellId>,
    },

    /// Two cells exchanged their contents
    CellsSwapped {
        a: CellId,
        b: CellId,
    },

    /// A provisional effect was rolled back onto a cell
    CellRestored {
        cell: CellId,
        value: CardValue,
        orientation: Orientation,
    },

    /// Route grew by one cell; `step` is its index in the path
    RouteStepAdded {
        player: PlayerId,
        cell: CellId,
        step: usize,
    },

    /// Route shrank by one cell
    RouteStepRemoved {
        player: PlayerId,
        cell: CellId,
        step: usize,
    },

    /// Route planning abandoned without moving
    RouteCancelled {
        player: PlayerId,
    },

    /// Route committed
    RouteCommitted {
        player: PlayerId,
        from: CellId,
        to: CellId,
        steps: usize,
    },

    /// A movement input was refused
    MoveRejected {
        player: PlayerId,
        reason: MoveRejection,
    },

    /// Ability phase opened (`ability` set) or closed (`None`)
    AbilityPhaseChanged {
        player: PlayerId,
        ability: Option<AbilityKind>,
        targets: Vec<CellId>,
    },

    /// Turn passed to a player
    TurnChanged {
        player: PlayerId,
        turn_number: u32,
    },

    /// Player removed from play
    PlayerEliminated {
        player: PlayerId,
        reason: EliminationReason,
    },

    /// Game over
    GameEnded {
        winner: Option<PlayerId>,
    },
}

/// A game event stamped with the turn it happened in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Turn number when the event occurred
    pub turn: u32,

    /// Monotonic position in the event stream
    pub sequence: u64,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(turn: u32, sequence: u64, data: GameEventData) -> Self {
        Self { turn, sequence, data }
    }

    /// Player the event is about, if any.
    pub fn player(&self) -> Option<PlayerId> {
        match &self.data {
            GameEventData::OccupancyChanged { player, .. }
            | GameEventData::RouteStepAdded { player, .. }
            | GameEventData::RouteStepRemoved { player, .. }
            | GameEventData::RouteCancelled { player }
            | GameEventData::RouteCommitted { player, .. }
            | GameEventData::MoveRejected { player, .. }
            | GameEventData::AbilityPhaseChanged { player, .. }
            | GameEventData::TurnChanged { player, .. }
            | GameEventData::PlayerEliminated { player, .. } => Some(*player),
            GameEventData::GameEnded { winner } => *winner,
            _ => None,
        }
    }
}

// =============================================================================
// RENDERER
// =============================================================================

/// Receiver of engine events.
pub trait Renderer {
    /// Called once per event, in sequence order.
    fn notify(&mut self, event: &GameEvent);
}

/// Collects events, mostly for tests.
impl Renderer for Vec<GameEvent> {
    fn notify(&mut self, event: &GameEvent) {
        self.push(event.clone());
    }
}

/// Logs every event through `tracing`.
#[derive(Debug, Default)]
pub struct TracingRenderer {
    seen: u64,
}

impl TracingRenderer {
    /// New renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events logged so far.
    pub fn seen(&self) -> u64 {
        self.seen
    }
}

impl Renderer for TracingRenderer {
    fn notify(&mut self, event: &GameEvent) {
        self.seen += 1;
        match &event.data {
            GameEventData::GameStarted { players, rng_seed } => {
                info!(turn = event.turn, players = players.len(), rng_seed, "game started");
            }
            GameEventData::TurnChanged { player, turn_number } => {
                info!(%player, turn_number, "turn changed");
            }
            GameEventData::RouteCommitted { player, from, to, steps } => {
                info!(%player, %from, %to, steps, "route committed");
            }
            GameEventData::PlayerEliminated { player, reason } => {
                info!(%player, ?reason, "player eliminated");
            }
            GameEventData::GameEnded { winner } => match winner {
                Some(w) => info!(winner = %w, "game ended"),
                None => info!("game ended without a winner"),
            },
            other => {
                debug!(turn = event.turn, seq = event.sequence, event = ?other, "event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_player() {
        let e = GameEvent::new(1, 0, GameEventData::TurnChanged { player: PlayerId(2), turn_number: 1 });
        assert_eq!(e.player(), Some(PlayerId(2)));

        let e = GameEvent::new(1, 1, GameEventData::CellsSwapped { a: CellId(0), b: CellId(1) });
        assert_eq!(e.player(), None);

        let e = GameEvent::new(3, 2, GameEventData::GameEnded { winner: None });
        assert_eq!(e.player(), None);
    }

    #[test]
    fn test_vec_renderer_collects() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let e = GameEvent::new(1, 0, GameEventData::RouteCancelled { player: PlayerId(1) });
        sink.notify(&e);
        sink.notify(&e);
        assert_eq!(sink.len(), 2);

        let mut tracer = TracingRenderer::new();
        tracer.notify(&e);
        assert_eq!(tracer.seen(), 1);
    }

    #[test]
    fn test_event_serializes_to_json() {
        let e = GameEvent::new(
            2,
            7,
            GameEventData::PlayerEliminated { player: PlayerId(3), reason: EliminationReason::Timeout },
        );
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"PlayerEliminated\""));
        assert!(json.contains("\"timeout\""));
    }
}
