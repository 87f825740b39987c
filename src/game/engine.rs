//! Turn Engine
//!
//! The authoritative state machine. Decides whose turn it is, opens
//! ability phases, drives the route planner, runs the turn clock and ends
//! the game when at most one player is left.
//!
//! ```text
//!   Setup ──start_game──▶ Playing ──(≤1 survivor)──▶ Ended
//!
//!   per turn:
//!   Idle ──input──▶ Ability(kind) ──select / skip──▶ Planning ──confirm──▶ next turn
//!     ▲                 │ escape                        │ escape
//!     └─────────────────┴───────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::core::grid::{GridDims, Position};
use crate::core::hash::{StateHash, StateHasher};
use crate::core::rng::DeterministicRng;
use crate::game::ability::{
    AbilityContext, AbilityError, AbilityInput, AbilityKind, AbilityResponse, AbilitySubsystem,
};
use crate::game::board::{Board, BoardError, CellId, GridStats, SuitCount};
use crate::game::card::{CardValue, Deck, Rank, Suit, MAX_RANK};
use crate::game::clock::TurnClock;
use crate::game::events::{EliminationReason, GameEvent, GameEventData, Renderer};
use crate::game::input::Intent;
use crate::game::player::{PlayerError, PlayerId, PlayerRegistry, PlayerSpec};
use crate::game::route::{RouteError, RouteOptions, RoutePlan, RoutePlanner};
use crate::game::state::GameState;

/// Default seconds per turn.
pub const DEFAULT_TURN_SECS: u64 = 60;

/// Longest turn a config may ask for.
pub const MAX_TURN_SECS: u64 = 86_400;

// =============================================================================
// CONFIG
// =============================================================================

/// Configuration for a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Grid rows
    pub rows: usize,
    /// Grid columns
    pub cols: usize,
    /// Seats, in turn order
    pub players: Vec<PlayerSpec>,
    /// Turn length in seconds
    pub turn_duration_secs: u64,
    /// Rank of the cards players start on
    pub starting_rank: u8,
    /// Seed for the deal and placements
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: GridDims::STANDARD.rows,
            cols: GridDims::STANDARD.cols,
            players: PlayerSpec::defaults(),
            turn_duration_secs: DEFAULT_TURN_SECS,
            starting_rank: MAX_RANK,
            rng_seed: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("grid dimensions must be non-zero")]
    EmptyGrid,

    #[error("a {rows}x{cols} grid needs more than the {deck} cards in the deck")]
    GridTooLarge { rows: usize, cols: usize, deck: usize },

    #[error("need at least 2 players, got {0}")]
    TooFewPlayers(usize),

    #[error("at most {max} players, got {got}")]
    TooManyPlayers { max: usize, got: usize },

    #[error("starting rank {0} outside 2..=7")]
    StartingRankOutOfRange(u8),

    #[error("turn duration must be 1..=86400 seconds, got {0}")]
    TurnDuration(u64),
}

impl GameConfig {
    /// Parse and validate JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Reject configurations no game can be played with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        let deck = Deck::standard();
        if !deck.has_enough_for(self.rows, self.cols) {
            return Err(ConfigError::GridTooLarge { rows: self.rows, cols: self.cols, deck: deck.len() });
        }
        if self.players.len() < 2 {
            return Err(ConfigError::TooFewPlayers(self.players.len()));
        }
        if self.players.len() > u8::MAX as usize {
            return Err(ConfigError::TooManyPlayers { max: u8::MAX as usize, got: self.players.len() });
        }
        if Rank::new(self.starting_rank).is_none() {
            return Err(ConfigError::StartingRankOutOfRange(self.starting_rank));
        }
        if self.turn_duration_secs == 0 || self.turn_duration_secs > MAX_TURN_SECS {
            return Err(ConfigError::TurnDuration(self.turn_duration_secs));
        }
        Ok(())
    }

    /// Grid dimensions.
    pub fn dims(&self) -> GridDims {
        GridDims::new(self.rows, self.cols)
    }

    /// Turn length.
    pub fn turn_duration(&self) -> Duration {
        Duration::seconds(self.turn_duration_secs.min(MAX_TURN_SECS) as i64)
    }

    /// Seed, zero when unset.
    pub fn seed(&self) -> u64 {
        self.rng_seed.unwrap_or_default()
    }

    /// Seat names in order.
    pub fn seat_names(&self) -> Vec<&str> {
        self.players.iter().map(|p| p.name.as_str()).collect()
    }
}

// =============================================================================
// ERRORS AND PHASES
// =============================================================================

/// Engine errors. None of them end the turn.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("game is not in progress")]
    GameNotActive,

    #[error("game already started")]
    AlreadyStarted,

    #[error("it is {expected}'s turn, not {got}'s")]
    NotYourTurn { expected: PlayerId, got: PlayerId },

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("only {available} cards of rank {rank} for {needed} players")]
    NotEnoughStartingCells { rank: u8, needed: usize, available: usize },

    #[error("expected {expected} starting positions, got {got}")]
    PlacementCount { expected: usize, got: usize },

    #[error("starting position {0} is off the board or shared")]
    InvalidPlacement(CellId),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Ability(#[from] AbilityError),

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Player(#[from] PlayerError),
}

/// Lifecycle of a game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Dealt, players not yet placed
    #[default]
    Setup,
    /// Turns are being played
    Playing,
    /// Over; `None` when nobody survived
    Ended { winner: Option<PlayerId> },
}

/// Where the current turn is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Waiting for the first input
    Idle,
    /// Heal or swap awaiting a target
    Ability(AbilityKind),
    /// Route being built
    Planning,
}

// =============================================================================
// READ MODELS
// =============================================================================

/// Per-player summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerStats {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub token: String,
    pub eliminated: bool,
    pub move_count: usize,
    pub position: Option<Position>,
    pub card: Option<CardValue>,
}

/// Whole-game summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameStats {
    pub phase: GamePhase,
    pub turn_phase: TurnPhase,
    pub current_player: Option<PlayerId>,
    pub turn_number: u32,
    pub abilities_unlocked: bool,
    pub grid: GridStats,
    pub players: Vec<PlayerStats>,
}

// =============================================================================
// ENGINE
// =============================================================================

/// Owns everything about one game.
#[derive(Clone, Debug)]
pub struct GameEngine {
    config: GameConfig,
    state: GameState,
    abilities: AbilitySubsystem,
    planner: RoutePlanner,
    clock: TurnClock,
    phase: GamePhase,
    /// Seat whose turn it is (or the last one that had it)
    current_index: usize,
    rng: DeterministicRng,
}

impl GameEngine {
    /// Deal a fresh board from the config's seed.
    pub fn new(config: GameConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let mut rng = DeterministicRng::new(config.seed());
        let board = Board::deal(config.dims(), &Deck::standard(), &mut rng)?;
        Self::assemble(config, board, rng)
    }

    /// Use a prepared board instead of dealing one.
    pub fn with_board(config: GameConfig, board: Board) -> Result<Self, EngineError> {
        config.validate()?;
        let rng = DeterministicRng::new(config.seed());
        Self::assemble(config, board, rng)
    }

    fn assemble(config: GameConfig, board: Board, rng: DeterministicRng) -> Result<Self, EngineError> {
        let players = PlayerRegistry::from_specs(&config.players)?;
        let state = GameState::new(board, players, config.seed());
        let clock = TurnClock::new(config.turn_duration());
        Ok(Self {
            config,
            state,
            abilities: AbilitySubsystem::new(),
            planner: RoutePlanner::new(),
            clock,
            phase: GamePhase::Setup,
            current_index: 0,
            rng,
        })
    }

    // =========================================================================
    // SETUP
    // =========================================================================

    /// Place every player on a distinct card of the starting rank, chosen
    /// by seeded shuffle, and begin play.
    pub fn start_game(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        if self.phase != GamePhase::Setup {
            return Err(EngineError::AlreadyStarted);
        }
        let rank = Rank::new(self.config.starting_rank)
            .ok_or(ConfigError::StartingRankOutOfRange(self.config.starting_rank))?;

        let mut cells = self.state.board.cells_with_rank(rank);
        let needed = self.state.players.len();
        if cells.len() < needed {
            return Err(EngineError::NotEnoughStartingCells {
                rank: rank.value(),
                needed,
                available: cells.len(),
            });
        }
        self.rng.shuffle(&mut cells);
        cells.truncate(needed);

        self.place_and_begin(&cells, now);
        Ok(())
    }

    /// Begin play with explicit starting cells, one per seat in order.
    pub fn start_game_with_positions(&mut self, positions: &[CellId], now: DateTime<Utc>) -> Result<(), EngineError> {
        if self.phase != GamePhase::Setup {
            return Err(EngineError::AlreadyStarted);
        }
        let expected = self.state.players.len();
        if positions.len() != expected {
            return Err(EngineError::PlacementCount { expected, got: positions.len() });
        }
        for (i, cell) in positions.iter().enumerate() {
            if !self.state.board.contains(*cell) || positions[..i].contains(cell) {
                return Err(EngineError::InvalidPlacement(*cell));
            }
        }

        self.place_and_begin(positions, now);
        Ok(())
    }

    fn place_and_begin(&mut self, positions: &[CellId], now: DateTime<Utc>) {
        let ids = self.state.players.ids();
        for (id, cell) in ids.iter().zip(positions) {
            self.state.place_player(*id, *cell, now);
        }

        self.phase = GamePhase::Playing;
        self.current_index = 0;
        self.state.turn_number = 1;
        info!(players = ids.len(), seed = self.state.rng_seed, "game started");
        self.state.push_event(GameEventData::GameStarted {
            players: ids,
            rng_seed: self.state.rng_seed,
        });

        if let Some(first) = self.current_player() {
            self.current_index = self.state.players.seat_of(first).unwrap_or(0);
            self.state.push_event(GameEventData::TurnChanged { player: first, turn_number: 1 });
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// First non-eliminated seat scanning forward from the current index.
    pub fn current_player(&self) -> Option<PlayerId> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        let n = self.state.players.len();
        (0..n)
            .map(|offset| (self.current_index + offset) % n)
            .filter_map(|seat| self.state.players.at_seat(seat))
            .find(|p| p.is_active())
            .map(|p| p.id)
    }

    /// Where the current turn stands.
    pub fn turn_phase(&self) -> TurnPhase {
        if let Some(ctx) = self.abilities.context() {
            TurnPhase::Ability(ctx.kind)
        } else if self.planner.is_planning() {
            TurnPhase::Planning
        } else {
            TurnPhase::Idle
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Game over?
    pub fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::Ended { .. })
    }

    /// Winner of an ended game.
    pub fn winner(&self) -> Option<PlayerId> {
        match self.phase {
            GamePhase::Ended { winner } => winner,
            _ => None,
        }
    }

    pub fn turn_number(&self) -> u32 {
        self.state.turn_number
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn board(&self) -> &Board {
        &self.state.board
    }

    pub fn players(&self) -> &PlayerRegistry {
        &self.state.players
    }

    /// Route being planned.
    pub fn route(&self) -> Option<&RoutePlan> {
        self.planner.plan()
    }

    /// Open ability phase.
    pub fn ability_context(&self) -> Option<&AbilityContext> {
        self.abilities.context()
    }

    /// Turn deadline, once the clock runs.
    pub fn turn_deadline(&self) -> Option<DateTime<Utc>> {
        self.clock.deadline()
    }

    /// Countdown for display. `None` while the clock is stopped.
    pub fn remaining_turn_time(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.clock.remaining(now)
    }

    /// Tally of cards per suit.
    pub fn card_counts_by_suit(&self) -> BTreeMap<Suit, SuitCount> {
        self.state.board.card_counts_by_suit()
    }

    /// Summary for display panels.
    pub fn game_stats(&self) -> GameStats {
        let players = self
            .state
            .players
            .iter()
            .map(|p| {
                let cell = p.current_cell.and_then(|c| self.state.board.cell(c));
                PlayerStats {
                    id: p.id,
                    name: p.name.clone(),
                    color: p.color.clone(),
                    token: p.token.clone(),
                    eliminated: p.eliminated,
                    move_count: p.move_count(),
                    position: cell.map(|c| c.position),
                    card: cell.map(|c| c.value),
                }
            })
            .collect();

        GameStats {
            phase: self.phase,
            turn_phase: self.turn_phase(),
            current_player: self.current_player(),
            turn_number: self.state.turn_number,
            abilities_unlocked: self.state.abilities_unlocked(),
            grid: self.state.board.stats(),
            players,
        }
    }

    /// Digest of board, players and turn counters.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_game_state();
        hasher.update_bytes(&self.state.compute_hash());
        hasher.update_usize(self.current_index);
        match self.phase {
            GamePhase::Setup => hasher.update_u8(0),
            GamePhase::Playing => hasher.update_u8(1),
            GamePhase::Ended { winner } => {
                hasher.update_u8(2);
                hasher.update_u8(winner.map(|w| w.0).unwrap_or(0));
            }
        }
        hasher.finalize()
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        self.state.take_events()
    }

    /// Hand pending events to a renderer. Returns how many were sent.
    pub fn flush_events(&mut self, renderer: &mut dyn Renderer) -> usize {
        let events = self.state.take_events();
        for event in &events {
            renderer.notify(event);
        }
        events.len()
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    /// Apply one input from `player`.
    pub fn handle_input(&mut self, player: PlayerId, intent: Intent, now: DateTime<Utc>) -> Result<(), EngineError> {
        if self.phase != GamePhase::Playing {
            return Err(EngineError::GameNotActive);
        }
        if self.state.player(player).is_none() {
            return Err(EngineError::UnknownPlayer(player));
        }
        let current = self.current_player().ok_or(EngineError::GameNotActive)?;
        if player != current {
            warn!(%player, %current, ?intent, "input out of turn");
            return Err(EngineError::NotYourTurn { expected: current, got: player });
        }

        if intent == Intent::GiveUp {
            info!(%player, "player gave up");
            self.eliminate(player, EliminationReason::GaveUp);
            return Ok(());
        }

        self.dispatch(player, intent, now)
    }

    fn dispatch(&mut self, player: PlayerId, intent: Intent, now: DateTime<Utc>) -> Result<(), EngineError> {
        match self.turn_phase() {
            TurnPhase::Idle => match intent {
                Intent::Move(_) | Intent::SelectTarget(_) => {
                    self.start_turn(now)?;
                    self.dispatch(player, intent, now)
                }
                Intent::Confirm => self.start_turn(now).map(|_| ()),
                Intent::Cancel | Intent::GiveUp => Ok(()),
            },
            TurnPhase::Ability(kind) => {
                let input = match intent {
                    Intent::Move(dir) => AbilityInput::Direction(dir),
                    Intent::SelectTarget(cell) => AbilityInput::Select(cell),
                    Intent::Cancel => AbilityInput::Cancel,
                    Intent::Confirm => AbilityInput::Confirm,
                    Intent::GiveUp => return Ok(()),
                };

                let response = match self.abilities.handle_input(&mut self.state, input) {
                    Ok(response) => response,
                    Err(err) => {
                        debug!(%player, ability = kind.name(), %err, "ability input refused");
                        return Err(err.into());
                    }
                };

                match response {
                    AbilityResponse::BeginRoute { first_move } => {
                        let options = RouteOptions { first_move, ..RouteOptions::default() };
                        self.planner.begin(&mut self.state, player, options)?;
                    }
                    AbilityResponse::Cancelled => {
                        self.abilities.revert_provisional(&mut self.state);
                        info!(%player, ability = kind.name(), "ability phase cancelled");
                    }
                    AbilityResponse::Handled | AbilityResponse::Unhandled => {}
                }
                Ok(())
            }
            TurnPhase::Planning => match intent {
                Intent::Move(dir) => {
                    self.planner.step(&mut self.state, dir)?;
                    Ok(())
                }
                Intent::Confirm => self.commit_route(now),
                Intent::Cancel => {
                    self.cancel_route();
                    Ok(())
                }
                Intent::SelectTarget(cell) => {
                    debug!(%player, %cell, "target selection ignored while planning");
                    Ok(())
                }
                Intent::GiveUp => Ok(()),
            },
        }
    }

    /// Start the current player's turn: run the clock, then open an
    /// ability phase or begin planning with any passive modifiers.
    pub fn start_turn(&mut self, now: DateTime<Utc>) -> Result<TurnPhase, EngineError> {
        let player = self.current_player().ok_or(EngineError::GameNotActive)?;
        if self.turn_phase() != TurnPhase::Idle {
            return Ok(self.turn_phase());
        }

        if self.clock.start(now) {
            debug!(%player, deadline = ?self.clock.deadline(), "turn clock started");
        }

        let available = self.abilities.available_for(&self.state, player);
        let opened = match available {
            Some(kind) if !kind.is_passive() => self.abilities.begin(&mut self.state, player, kind),
            _ => false,
        };
        if !opened {
            let passive = available.filter(|k| k.is_passive());
            if let Some(kind) = passive {
                info!(%player, ability = kind.name(), "passive ability active");
            }
            self.planner
                .begin(&mut self.state, player, AbilitySubsystem::route_options(passive))?;
        }

        Ok(self.turn_phase())
    }

    fn commit_route(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        let route = self.planner.commit(&mut self.state, now)?;
        self.abilities.commit_provisional();
        self.clock.clear();
        info!(player = %route.player, from = %route.from, to = %route.to, "route committed");
        self.advance();
        Ok(())
    }

    fn cancel_route(&mut self) {
        if let Some(plan) = self.planner.cancel(&mut self.state) {
            let reverted = self.abilities.revert_provisional(&mut self.state);
            info!(player = %plan.player, reverted, "route cancelled");
        }
    }

    /// Drop any ability phase or route, reverting provisional effects.
    fn abandon_turn(&mut self) {
        self.abilities.end_phase(&mut self.state);
        self.planner.cancel(&mut self.state);
        self.abilities.revert_provisional(&mut self.state);
    }

    // =========================================================================
    // CLOCK, ELIMINATION, ADVANCE
    // =========================================================================

    /// Check the turn deadline. Returns true when it fired.
    pub fn poll_clock(&mut self, now: DateTime<Utc>) -> bool {
        if self.phase != GamePhase::Playing || !self.clock.is_expired(now) {
            return false;
        }
        self.on_timeout();
        true
    }

    fn on_timeout(&mut self) {
        if let Some(player) = self.current_player() {
            warn!(%player, "turn timed out");
            self.eliminate(player, EliminationReason::Timeout);
        }
    }

    /// Remove a player from the game. Idempotent; returns whether
    /// anything changed.
    pub fn eliminate(&mut self, player: PlayerId, reason: EliminationReason) -> bool {
        let is_current = self.current_player() == Some(player);
        if is_current {
            self.abandon_turn();
        }
        if !self.state.eliminate_player(player, reason) {
            return false;
        }
        self.abilities.record_elimination(player);
        info!(%player, ?reason, survivors = self.state.survivor_count(), "player eliminated");

        if is_current {
            self.advance();
        } else {
            self.check_game_over();
        }
        true
    }

    /// Pass the turn to the next live seat, or end the game.
    fn advance(&mut self) {
        self.clock.clear();
        if self.check_game_over() {
            return;
        }

        let n = self.state.players.len();
        for offset in 1..=n {
            let seat = (self.current_index + offset) % n;
            let Some(next) = self.state.players.at_seat(seat).filter(|p| p.is_active()).map(|p| p.id) else {
                continue;
            };
            if seat <= self.current_index {
                self.state.turn_number += 1;
            }
            self.current_index = seat;
            let turn_number = self.state.turn_number;
            info!(player = %next, turn_number, "turn changed");
            self.state.push_event(GameEventData::TurnChanged { player: next, turn_number });
            return;
        }
    }

    /// End the game when at most one player remains.
    fn check_game_over(&mut self) -> bool {
        if self.phase != GamePhase::Playing {
            return self.is_over();
        }
        let survivors = self.state.players.survivors();
        if survivors.len() > 1 {
            return false;
        }

        self.abandon_turn();
        self.clock.clear();
        let winner = survivors.first().copied();
        self.phase = GamePhase::Ended { winner };
        match winner {
            Some(w) => info!(winner = %w, turn_number = self.state.turn_number, "game over"),
            None => info!(turn_number = self.state.turn_number, "game over, no survivors"),
        }
        self.state.push_event(GameEventData::GameEnded { winner });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::Direction;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn ordered_engine() -> GameEngine {
        let board = Board::from_values(GridDims::STANDARD, Deck::standard().values()).unwrap();
        GameEngine::with_board(GameConfig::default(), board).unwrap()
    }

    /// Seats on (0,1) 3♠, (1,5) 7♥, (2,5) 7♦, (3,5) 7♣.
    fn started_engine() -> GameEngine {
        let mut engine = ordered_engine();
        let cells: Vec<CellId> = [(0, 1), (1, 5), (2, 5), (3, 5)]
            .iter()
            .map(|(r, c)| engine.board().id_at(*r, *c))
            .collect();
        engine.start_game_with_positions(&cells, t(0)).unwrap();
        engine
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        config.validate().unwrap();
        assert_eq!(config.dims(), GridDims::STANDARD);
        assert_eq!(config.turn_duration(), Duration::seconds(60));
        assert_eq!(config.players.len(), 4);
        assert_eq!(config.seat_names()[0], "Player 1");
    }

    #[test]
    fn test_config_from_partial_json() {
        let config = GameConfig::from_json_str(r#"{"turn_duration_secs": 30, "rng_seed": 7}"#).unwrap();
        assert_eq!(config.turn_duration_secs, 30);
        assert_eq!(config.seed(), 7);
        assert_eq!(config.rows, 4);
    }

    #[test]
    fn test_config_rejections() {
        let err = GameConfig::from_json_str(r#"{"rows": 5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::GridTooLarge { .. }));

        let err = GameConfig::from_json_str(r##"{"players": [{"name": "A", "color": "#fff", "token": "A"}]}"##)
            .unwrap_err();
        assert!(matches!(err, ConfigError::TooFewPlayers(1)));

        let err = GameConfig::from_json_str(r#"{"starting_rank": 8}"#).unwrap_err();
        assert!(matches!(err, ConfigError::StartingRankOutOfRange(8)));

        let err = GameConfig::from_json_str(r#"{"turn_duration_secs": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::TurnDuration(0)));

        assert!(matches!(GameConfig::from_json_str("{"), Err(ConfigError::Parse(_))));
        assert!(matches!(GameConfig::load("/nonexistent/colapsi.json"), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_start_game_places_on_sevens() {
        let mut engine = GameEngine::new(GameConfig { rng_seed: Some(11), ..Default::default() }).unwrap();
        assert_eq!(engine.current_player(), None);
        engine.start_game(t(0)).unwrap();

        let mut seen = Vec::new();
        for p in engine.players().iter() {
            let cell = engine.state().cell_of(p.id).unwrap();
            assert_eq!(cell.rank().value(), 7);
            assert!(!seen.contains(&cell.id));
            seen.push(cell.id);
            assert_eq!(p.move_count(), 1);
        }
        assert_eq!(engine.phase(), GamePhase::Playing);
        assert_eq!(engine.turn_number(), 1);
        assert_eq!(engine.current_player(), Some(PlayerId(1)));
        assert!(matches!(engine.start_game(t(0)), Err(EngineError::AlreadyStarted)));
    }

    #[test]
    fn test_seeded_games_are_identical() {
        let config = GameConfig { rng_seed: Some(99), ..Default::default() };
        let mut a = GameEngine::new(config.clone()).unwrap();
        let mut b = GameEngine::new(config).unwrap();
        a.start_game(t(0)).unwrap();
        b.start_game(t(0)).unwrap();
        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_too_few_starting_cells() {
        let config = GameConfig {
            players: (0..5).map(|i| PlayerSpec::new(format!("P{i}"), "#000", i.to_string())).collect(),
            ..Default::default()
        };
        let mut engine = GameEngine::new(config).unwrap();
        assert!(matches!(
            engine.start_game(t(0)),
            Err(EngineError::NotEnoughStartingCells { rank: 7, needed: 5, available: 4 })
        ));
    }

    #[test]
    fn test_explicit_positions_validated() {
        let mut engine = ordered_engine();
        assert!(matches!(
            engine.start_game_with_positions(&[CellId(0)], t(0)),
            Err(EngineError::PlacementCount { expected: 4, got: 1 })
        ));
        assert!(matches!(
            engine.start_game_with_positions(&[CellId(0), CellId(1), CellId(1), CellId(2)], t(0)),
            Err(EngineError::InvalidPlacement(CellId(1)))
        ));
        assert!(matches!(
            engine.start_game_with_positions(&[CellId(0), CellId(1), CellId(2), CellId(30)], t(0)),
            Err(EngineError::InvalidPlacement(CellId(30)))
        ));
    }

    #[test]
    fn test_not_your_turn() {
        let mut engine = started_engine();
        let err = engine.handle_input(PlayerId(2), Intent::Move(Direction::Up), t(1)).unwrap_err();
        assert!(matches!(err, EngineError::NotYourTurn { expected: PlayerId(1), got: PlayerId(2) }));
        assert!(matches!(
            engine.handle_input(PlayerId(9), Intent::Confirm, t(1)),
            Err(EngineError::UnknownPlayer(PlayerId(9)))
        ));
        assert_eq!(engine.turn_phase(), TurnPhase::Idle);
        assert!(engine.turn_deadline().is_none());
    }

    #[test]
    fn test_idle_move_starts_turn_and_clock() {
        let mut engine = started_engine();
        engine.handle_input(PlayerId(1), Intent::Move(Direction::Up), t(5)).unwrap();
        assert_eq!(engine.turn_phase(), TurnPhase::Planning);
        assert_eq!(engine.route().unwrap().steps_taken(), 1);
        assert_eq!(engine.turn_deadline(), Some(t(65)));
        assert_eq!(engine.remaining_turn_time(t(20)), Some(Duration::seconds(45)));
    }

    #[test]
    fn test_idle_cancel_is_noop() {
        let mut engine = started_engine();
        engine.handle_input(PlayerId(1), Intent::Cancel, t(1)).unwrap();
        assert_eq!(engine.turn_phase(), TurnPhase::Idle);
        assert!(engine.turn_deadline().is_none());
    }

    #[test]
    fn test_turn_number_increments_on_wrap() {
        let config = GameConfig { players: PlayerSpec::defaults()[..2].to_vec(), ..Default::default() };
        let board = Board::from_values(GridDims::STANDARD, Deck::standard().values()).unwrap();
        let mut engine = GameEngine::with_board(config, board).unwrap();
        let (three, two) = (engine.board().id_at(0, 1), engine.board().id_at(0, 0));
        engine.start_game_with_positions(&[three, two], t(0)).unwrap();

        for dir in [Direction::Up, Direction::Up, Direction::Right] {
            engine.handle_input(PlayerId(1), Intent::Move(dir), t(1)).unwrap();
        }
        engine.handle_input(PlayerId(1), Intent::Confirm, t(2)).unwrap();
        assert_eq!(engine.current_player(), Some(PlayerId(2)));
        assert_eq!(engine.turn_number(), 1);

        engine.handle_input(PlayerId(2), Intent::Move(Direction::Down), t(3)).unwrap();
        engine.handle_input(PlayerId(2), Intent::Move(Direction::Down), t(3)).unwrap();
        engine.handle_input(PlayerId(2), Intent::Confirm, t(4)).unwrap();
        assert_eq!(engine.current_player(), Some(PlayerId(1)));
        assert_eq!(engine.turn_number(), 2);
        assert_eq!(engine.board().count_face_down(), 2);
    }

    #[test]
    fn test_timeout_eliminates_and_advances() {
        let mut engine = started_engine();
        engine.handle_input(PlayerId(1), Intent::Confirm, t(0)).unwrap();
        assert!(!engine.poll_clock(t(59)));
        assert!(engine.poll_clock(t(60)));

        let p1 = engine.players().get(PlayerId(1)).unwrap();
        assert!(p1.eliminated);
        assert!(p1.current_cell.is_none());
        assert!(engine.board().cell_at(0, 1).is_face_down());
        assert_eq!(engine.current_player(), Some(PlayerId(2)));
        assert_eq!(engine.turn_phase(), TurnPhase::Idle);
        assert!(engine.turn_deadline().is_none());
    }

    #[test]
    fn test_give_up_only_current_player() {
        let mut engine = started_engine();
        assert!(engine.handle_input(PlayerId(3), Intent::GiveUp, t(1)).is_err());
        engine.handle_input(PlayerId(1), Intent::GiveUp, t(1)).unwrap();
        assert!(engine.players().get(PlayerId(1)).unwrap().eliminated);
        assert_eq!(engine.current_player(), Some(PlayerId(2)));
        assert_eq!(engine.turn_number(), 1);
    }

    #[test]
    fn test_eliminate_is_idempotent() {
        let mut engine = started_engine();
        assert!(engine.eliminate(PlayerId(3), EliminationReason::GaveUp));
        assert!(!engine.eliminate(PlayerId(3), EliminationReason::GaveUp));
        assert_eq!(engine.state().survivor_count(), 3);
    }

    #[test]
    fn test_last_survivor_wins() {
        let mut engine = started_engine();
        engine.eliminate(PlayerId(2), EliminationReason::GaveUp);
        engine.eliminate(PlayerId(3), EliminationReason::GaveUp);
        assert_eq!(engine.phase(), GamePhase::Playing);
        engine.eliminate(PlayerId(1), EliminationReason::Timeout);

        assert_eq!(engine.phase(), GamePhase::Ended { winner: Some(PlayerId(4)) });
        assert_eq!(engine.current_player(), None);
        assert!(matches!(
            engine.handle_input(PlayerId(4), Intent::Confirm, t(1)),
            Err(EngineError::GameNotActive)
        ));
        let events = engine.take_events();
        assert!(events.iter().any(|e| e.data == GameEventData::GameEnded { winner: Some(PlayerId(4)) }));
    }

    #[test]
    fn test_stats_read_model() {
        let engine = started_engine();
        let stats = engine.game_stats();
        assert_eq!(stats.current_player, Some(PlayerId(1)));
        assert_eq!(stats.players.len(), 4);
        assert_eq!(stats.players[0].position, Some(Position::new(0, 1)));
        assert_eq!(stats.players[0].card.map(|c| c.to_string()), Some("3♠".to_string()));
        assert!(!stats.abilities_unlocked);
        assert_eq!(stats.grid.face_down, 0);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["turn_number"], 1);
        assert_eq!(engine.card_counts_by_suit()[&Suit::Spades].total, 6);
    }
}
