//! Game State
//!
//! The board and the player registry, plus the primitive mutations that
//! keep the two consistent. Every mutation that a renderer cares about
//! pushes a `GameEvent`; the engine drains them with `take_events()`.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::hash::{compute_state_hash, StateHash};
use crate::game::board::{Board, BoardError, Cell, CellId, CellSnapshot, SwapOutcome};
use crate::game::events::{EliminationReason, GameEvent, GameEventData};
use crate::game::player::{Player, PlayerId, PlayerRegistry};

/// Board plus players.
///
/// Player and cell references are plain ids; the registry owns players,
/// the board owns cells.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    /// The card grid
    pub board: Board,

    /// Every seat, eliminated or not
    pub players: PlayerRegistry,

    /// Seed the deal and placements were drawn from
    pub rng_seed: u64,

    /// Current round, starting at 1 once play begins
    pub turn_number: u32,

    /// Next event sequence number
    next_sequence: u64,

    /// Events not yet handed to a renderer
    #[serde(skip)]
    pending_events: Vec<GameEvent>,
}

impl GameState {
    /// Create state for a dealt board.
    pub fn new(board: Board, players: PlayerRegistry, rng_seed: u64) -> Self {
        Self {
            board,
            players,
            rng_seed,
            turn_number: 0,
            next_sequence: 0,
            pending_events: Vec::new(),
        }
    }

    /// Get a player by ID.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Cell a player stands on.
    pub fn cell_of(&self, id: PlayerId) -> Option<&Cell> {
        self.players
            .get(id)
            .and_then(|p| p.current_cell)
            .and_then(|cell| self.board.cell(cell))
    }

    /// Abilities turn on once at least one card per seat is face down.
    pub fn abilities_unlocked(&self) -> bool {
        self.board.count_face_down() >= self.players.len()
    }

    /// Players not yet eliminated.
    pub fn survivor_count(&self) -> usize {
        self.players.count_non_eliminated()
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Put a player on `cell`, leaving its previous cell, and log the move.
    pub fn place_player(&mut self, id: PlayerId, cell: CellId, now: DateTime<Utc>) -> bool {
        let Some(target) = self.board.cell(cell) else {
            return false;
        };
        let (value, position) = (target.value, target.position);

        let Some(player) = self.players.get_mut(id) else {
            return false;
        };
        let from = player.current_cell.replace(cell);
        player.log_move(cell, value, position, now);

        if let Some(old) = from {
            self.board.remove_occupant(old, id);
        }
        self.board.add_occupant(cell, id);

        debug!(player = %id, to = %cell, card = %value, "player placed");
        self.push_event(GameEventData::OccupancyChanged { player: id, from, to: Some(cell) });
        true
    }

    /// Take a player off the board. Returns the cell they stood on.
    pub fn detach_player(&mut self, id: PlayerId) -> Option<CellId> {
        let from = self.players.get_mut(id)?.current_cell.take()?;
        self.board.remove_occupant(from, id);
        self.push_event(GameEventData::OccupancyChanged { player: id, from: Some(from), to: None });
        Some(from)
    }

    /// Flip a card face up.
    pub fn flip_up(&mut self, cell: CellId) -> bool {
        let changed = self.board.flip_up(cell);
        if changed {
            self.push_orientation(cell);
        }
        changed
    }

    /// Flip a card face down.
    pub fn flip_down(&mut self, cell: CellId) -> bool {
        let changed = self.board.flip_down(cell);
        if changed {
            self.push_orientation(cell);
        }
        changed
    }

    fn push_orientation(&mut self, cell: CellId) {
        if let Some(c) = self.board.cell(cell) {
            let orientation = c.orientation;
            self.push_event(GameEventData::CellOrientationChanged { cell, orientation });
        }
    }

    /// Swap two cells. Players standing on them ride their card to its
    /// new slot.
    pub fn swap_cells(&mut self, a: CellId, b: CellId) -> Result<SwapOutcome, BoardError> {
        let outcome = self.board.swap_cells(a, b)?;
        self.push_event(GameEventData::CellsSwapped { a, b });

        for (riders, from, to) in [(&outcome.now_on_a, b, a), (&outcome.now_on_b, a, b)] {
            for id in riders {
                if let Some(player) = self.players.get_mut(*id) {
                    player.current_cell = Some(to);
                }
                self.pending_occupancy(*id, Some(from), Some(to));
            }
        }

        Ok(outcome)
    }

    /// Write cell snapshots back and re-point their occupants.
    pub fn restore_cells(&mut self, snapshots: &[CellSnapshot]) {
        for snap in snapshots {
            let before: Vec<PlayerId> = self
                .board
                .cell(snap.cell)
                .map(|c| c.occupants.iter().copied().collect())
                .unwrap_or_default();

            if !self.board.restore(snap) {
                continue;
            }
            self.push_event(GameEventData::CellRestored {
                cell: snap.cell,
                value: snap.value,
                orientation: snap.orientation,
            });

            for id in &snap.occupants {
                let from = self.players.get(*id).and_then(|p| p.current_cell);
                if from == Some(snap.cell) {
                    continue;
                }
                if let Some(player) = self.players.get_mut(*id) {
                    player.current_cell = Some(snap.cell);
                }
                self.pending_occupancy(*id, from, Some(snap.cell));
            }

            // Players whose only claim on this cell came from the overwritten contents
            for id in before {
                if snap.occupants.contains(&id) {
                    continue;
                }
                let stale = self.players.get(id).and_then(|p| p.current_cell) == Some(snap.cell);
                if stale {
                    if let Some(player) = self.players.get_mut(id) {
                        player.current_cell = None;
                    }
                }
            }
        }
    }

    fn pending_occupancy(&mut self, player: PlayerId, from: Option<CellId>, to: Option<CellId>) {
        self.push_event(GameEventData::OccupancyChanged { player, from, to });
    }

    /// Remove a player from play: their card flips face down, their token
    /// leaves the board. Returns false if already eliminated.
    pub fn eliminate_player(&mut self, id: PlayerId, reason: EliminationReason) -> bool {
        let active = self.players.get(id).map(|p| p.is_active()).unwrap_or(false);
        if !active {
            return false;
        }

        if let Some(cell) = self.players.get(id).and_then(|p| p.current_cell) {
            self.flip_down(cell);
        }
        self.detach_player(id);

        if let Some(player) = self.players.get_mut(id) {
            player.eliminated = true;
        }
        self.push_event(GameEventData::PlayerEliminated { player: id, reason });
        true
    }

    // =========================================================================
    // EVENTS AND HASHING
    // =========================================================================

    /// Push a game event stamped with the current turn.
    pub fn push_event(&mut self, data: GameEventData) {
        let event = GameEvent::new(self.turn_number, self.next_sequence, data);
        self.next_sequence += 1;
        self.pending_events.push(event);
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Events waiting to be drained.
    pub fn pending_event_count(&self) -> usize {
        self.pending_events.len()
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.turn_number, self.rng_seed, |hasher| {
            self.board.hash_into(hasher);

            hasher.update_usize(self.players.len());
            for player in self.players.iter() {
                hasher.update_u8(player.id.0);
                hasher.update_bool(player.eliminated);
                match player.current_cell {
                    Some(cell) => {
                        hasher.update_bool(true);
                        hasher.update_usize(cell.0);
                    }
                    None => hasher.update_bool(false),
                }
                hasher.update_usize(player.moves.len());
                for record in &player.moves {
                    hasher.update_usize(record.cell.0);
                }
            }
        })
    }
}
