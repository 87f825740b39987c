//! Suit Abilities
//!
//! The card a player starts their turn on grants one ability by suit,
//! once enough cards are face down:
//!
//! | Suit     | Ability       | Kind                                    |
//! |----------|---------------|-----------------------------------------|
//! | Hearts   | Heal          | flip one face-down neighbor back up     |
//! | Clubs    | Swap          | exchange two orthogonally adjacent cells |
//! | Spades   | Phantom Step  | cross one face-down cell this turn      |
//! | Diamonds | Diagonal Move | diagonal steps allowed this turn        |
//!
//! Heal and Swap run as an ability phase before route planning starts.
//! Their board changes are provisional until the route commits.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::grid::Direction;
use crate::game::board::{Adjacency, BoardError, CellId, CellSnapshot, Orientation};
use crate::game::card::Suit;
use crate::game::events::GameEventData;
use crate::game::player::PlayerId;
use crate::game::route::RouteOptions;
use crate::game::state::GameState;

// =============================================================================
// KINDS
// =============================================================================

/// One ability per suit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Hearts: heal
    Hearts,
    /// Clubs: swap
    Clubs,
    /// Spades: phantom step
    Spades,
    /// Diamonds: diagonal move
    Diamonds,
}

impl AbilityKind {
    /// Ability granted by a suit.
    pub fn for_suit(suit: Suit) -> AbilityKind {
        match suit {
            Suit::Hearts => AbilityKind::Hearts,
            Suit::Clubs => AbilityKind::Clubs,
            Suit::Spades => AbilityKind::Spades,
            Suit::Diamonds => AbilityKind::Diamonds,
        }
    }

    /// Suit granting this ability.
    pub fn suit(self) -> Suit {
        match self {
            AbilityKind::Hearts => Suit::Hearts,
            AbilityKind::Clubs => Suit::Clubs,
            AbilityKind::Spades => Suit::Spades,
            AbilityKind::Diamonds => Suit::Diamonds,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            AbilityKind::Hearts => "Heal",
            AbilityKind::Clubs => "Swap",
            AbilityKind::Spades => "Phantom Step",
            AbilityKind::Diamonds => "Diagonal Move",
        }
    }

    /// Passive abilities only annotate the route.
    pub fn is_passive(self) -> bool {
        handler(self).is_passive()
    }
}

/// Ability errors. The phase stays open after any of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbilityError {
    #[error("no ability phase is active")]
    NoActivePhase,

    #[error("cell {0} is not a valid target")]
    InvalidTarget(CellId),

    #[error("cell {0} is not orthogonally adjacent to the first swap pick")]
    InvalidSwapTarget(CellId),

    #[error(transparent)]
    Board(#[from] BoardError),
}

// =============================================================================
// CONTEXT AND EFFECTS
// =============================================================================

/// Input forwarded to an ability phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbilityInput {
    Direction(Direction),
    Select(CellId),
    Cancel,
    Confirm,
}

/// What the engine should do after an ability handled an input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbilityResponse {
    /// Input ignored by this ability
    Unhandled,
    /// Input consumed, phase continues
    Handled,
    /// Phase over, start the route
    BeginRoute { first_move: Option<Direction> },
    /// Phase abandoned, turn back to idle
    Cancelled,
}

/// State of an open ability phase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AbilityContext {
    pub kind: AbilityKind,
    pub player: PlayerId,
    pub start_cell: CellId,
    /// Cells a selection may currently land on
    pub available_targets: Vec<CellId>,
    /// Heal target, once picked
    pub selected_target: Option<CellId>,
    /// First swap pick, awaiting its partner
    pub swap_first: Option<CellId>,
}

impl AbilityContext {
    fn new(kind: AbilityKind, player: PlayerId, start_cell: CellId) -> Self {
        Self {
            kind,
            player,
            start_cell,
            available_targets: Vec::new(),
            selected_target: None,
            swap_first: None,
        }
    }
}

/// A board change that holds only if the route commits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProvisionalEffect {
    /// A face-down card was healed
    Heal { before: CellSnapshot },
    /// Two cells were swapped
    Swap { before: [CellSnapshot; 2] },
}

impl ProvisionalEffect {
    /// Put the board back the way it was.
    pub fn revert(&self, state: &mut GameState) {
        match self {
            ProvisionalEffect::Heal { before } => state.restore_cells(std::slice::from_ref(before)),
            ProvisionalEffect::Swap { before } => state.restore_cells(before),
        }
    }

    fn snapshots_mut(&mut self) -> &mut [CellSnapshot] {
        match self {
            ProvisionalEffect::Heal { before } => std::slice::from_mut(before),
            ProvisionalEffect::Swap { before } => before,
        }
    }

    /// Carry an elimination into the saved snapshots: the player's card
    /// stays face down and the player stays off the board after a revert.
    pub fn record_elimination(&mut self, player: PlayerId) -> bool {
        let mut touched = false;
        for snap in self.snapshots_mut() {
            if snap.occupants.remove(&player) {
                snap.orientation = Orientation::FaceDown;
                touched = true;
            }
        }
        touched
    }
}

// =============================================================================
// ABILITY TRAIT
// =============================================================================

/// Common activation contract.
pub trait Ability {
    /// Which ability this is.
    fn kind(&self) -> AbilityKind;

    /// No ability phase; route options only.
    fn is_passive(&self) -> bool {
        false
    }

    /// Abilities unlocked and the player stands on the matching suit.
    fn can_use(&self, state: &GameState, player: PlayerId) -> bool {
        state.abilities_unlocked()
            && state
                .cell_of(player)
                .is_some_and(|cell| AbilityKind::for_suit(cell.suit()) == self.kind())
    }

    /// Fill the context. Returns false when there is nothing to do.
    fn start(&self, _state: &GameState, _ctx: &mut AbilityContext) -> bool {
        false
    }

    /// React to one input.
    fn handle_input(
        &self,
        _state: &mut GameState,
        _ctx: &mut AbilityContext,
        _input: AbilityInput,
        _effects: &mut Vec<ProvisionalEffect>,
    ) -> Result<AbilityResponse, AbilityError> {
        Ok(AbilityResponse::Unhandled)
    }

    /// Route modifiers granted.
    fn configure(&self, _options: &mut RouteOptions) {}

    /// Release phase state.
    fn cleanup(&self, ctx: &mut AbilityContext) {
        ctx.available_targets.clear();
        ctx.selected_target = None;
        ctx.swap_first = None;
    }
}

/// Hearts: flip a face-down neighbor back up.
pub struct Heal;

impl Ability for Heal {
    fn kind(&self) -> AbilityKind {
        AbilityKind::Hearts
    }

    fn start(&self, state: &GameState, ctx: &mut AbilityContext) -> bool {
        ctx.available_targets = state
            .board
            .adjacent_cells(ctx.start_cell, Adjacency::Omni)
            .into_iter()
            .filter(|id| state.board.cell(*id).is_some_and(|c| c.is_face_down()))
            .collect();
        !ctx.available_targets.is_empty()
    }

    fn handle_input(
        &self,
        state: &mut GameState,
        ctx: &mut AbilityContext,
        input: AbilityInput,
        effects: &mut Vec<ProvisionalEffect>,
    ) -> Result<AbilityResponse, AbilityError> {
        match input {
            AbilityInput::Select(target) => {
                if !ctx.available_targets.contains(&target) {
                    return Err(AbilityError::InvalidTarget(target));
                }
                let before = state
                    .board
                    .snapshot(target)
                    .ok_or(BoardError::UnknownCell(target))?;
                state.flip_up(target);
                effects.push(ProvisionalEffect::Heal { before });
                ctx.selected_target = Some(target);
                info!(player = %ctx.player, %target, "healed card");
                Ok(AbilityResponse::BeginRoute { first_move: None })
            }
            AbilityInput::Direction(dir) => Ok(AbilityResponse::BeginRoute { first_move: Some(dir) }),
            AbilityInput::Cancel => Ok(AbilityResponse::Cancelled),
            AbilityInput::Confirm => Ok(AbilityResponse::Unhandled),
        }
    }
}

/// Clubs: exchange two orthogonally adjacent cells.
pub struct Swap;

impl Swap {
    fn all_but_start(state: &GameState, start: CellId) -> Vec<CellId> {
        state.board.cells().map(|c| c.id).filter(|id| *id != start).collect()
    }
}

impl Ability for Swap {
    fn kind(&self) -> AbilityKind {
        AbilityKind::Clubs
    }

    fn start(&self, state: &GameState, ctx: &mut AbilityContext) -> bool {
        ctx.available_targets = Self::all_but_start(state, ctx.start_cell);
        ctx.swap_first = None;
        !ctx.available_targets.is_empty()
    }

    fn handle_input(
        &self,
        state: &mut GameState,
        ctx: &mut AbilityContext,
        input: AbilityInput,
        effects: &mut Vec<ProvisionalEffect>,
    ) -> Result<AbilityResponse, AbilityError> {
        match input {
            AbilityInput::Select(target) => match ctx.swap_first {
                None => {
                    if !ctx.available_targets.contains(&target) {
                        return Err(AbilityError::InvalidTarget(target));
                    }
                    ctx.swap_first = Some(target);
                    ctx.available_targets = state
                        .board
                        .adjacent_cells(target, Adjacency::Orthogonal)
                        .into_iter()
                        .filter(|id| *id != ctx.start_cell)
                        .collect();
                    debug!(player = %ctx.player, first = %target, "swap first pick");
                    Ok(AbilityResponse::Handled)
                }
                Some(first) if first == target => {
                    ctx.swap_first = None;
                    ctx.available_targets = Self::all_but_start(state, ctx.start_cell);
                    debug!(player = %ctx.player, %target, "swap pick cleared");
                    Ok(AbilityResponse::Handled)
                }
                Some(first) => {
                    if !ctx.available_targets.contains(&target) {
                        return Err(AbilityError::InvalidSwapTarget(target));
                    }
                    let a = state.board.snapshot(first).ok_or(BoardError::UnknownCell(first))?;
                    let b = state.board.snapshot(target).ok_or(BoardError::UnknownCell(target))?;
                    state.swap_cells(first, target)?;
                    effects.push(ProvisionalEffect::Swap { before: [a, b] });
                    info!(player = %ctx.player, %first, second = %target, "swapped cells");
                    Ok(AbilityResponse::BeginRoute { first_move: None })
                }
            },
            AbilityInput::Direction(dir) => Ok(AbilityResponse::BeginRoute { first_move: Some(dir) }),
            AbilityInput::Cancel => Ok(AbilityResponse::Cancelled),
            AbilityInput::Confirm => Ok(AbilityResponse::Unhandled),
        }
    }
}

/// Spades: one face-down cell may be crossed.
pub struct PhantomStep;

impl Ability for PhantomStep {
    fn kind(&self) -> AbilityKind {
        AbilityKind::Spades
    }

    fn is_passive(&self) -> bool {
        true
    }

    fn configure(&self, options: &mut RouteOptions) {
        options.phantom_step_allowed = true;
    }
}

/// Diamonds: diagonal steps allowed.
pub struct DiagonalMove;

impl Ability for DiagonalMove {
    fn kind(&self) -> AbilityKind {
        AbilityKind::Diamonds
    }

    fn is_passive(&self) -> bool {
        true
    }

    fn configure(&self, options: &mut RouteOptions) {
        options.diagonal_allowed = true;
    }
}

static HEAL: Heal = Heal;
static SWAP: Swap = Swap;
static PHANTOM_STEP: PhantomStep = PhantomStep;
static DIAGONAL_MOVE: DiagonalMove = DiagonalMove;

/// Handler for an ability kind.
pub fn handler(kind: AbilityKind) -> &'static dyn Ability {
    match kind {
        AbilityKind::Hearts => &HEAL,
        AbilityKind::Clubs => &SWAP,
        AbilityKind::Spades => &PHANTOM_STEP,
        AbilityKind::Diamonds => &DIAGONAL_MOVE,
    }
}

// =============================================================================
// SUBSYSTEM
// =============================================================================

/// Owns the open ability phase and this turn's provisional effects.
#[derive(Clone, Debug, Default)]
pub struct AbilitySubsystem {
    active: Option<AbilityContext>,
    provisional: Vec<ProvisionalEffect>,
}

impl AbilitySubsystem {
    /// No phase, no effects.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ability the player may use right now, if any.
    pub fn available_for(&self, state: &GameState, player: PlayerId) -> Option<AbilityKind> {
        let suit = state.cell_of(player)?.suit();
        let kind = AbilityKind::for_suit(suit);
        handler(kind).can_use(state, player).then_some(kind)
    }

    /// Route options a passive ability grants (defaults for the rest).
    pub fn route_options(kind: Option<AbilityKind>) -> RouteOptions {
        let mut options = RouteOptions::default();
        if let Some(kind) = kind {
            handler(kind).configure(&mut options);
        }
        options
    }

    /// Open a phase for a non-passive ability. False when the ability has
    /// nothing to act on or is passive.
    pub fn begin(&mut self, state: &mut GameState, player: PlayerId, kind: AbilityKind) -> bool {
        let ability = handler(kind);
        if ability.is_passive() || self.active.is_some() {
            return false;
        }
        let Some(start) = state.cell_of(player).map(|c| c.id) else {
            return false;
        };

        let mut ctx = AbilityContext::new(kind, player, start);
        if !ability.start(state, &mut ctx) {
            debug!(%player, ability = kind.name(), "ability has no targets");
            return false;
        }

        info!(%player, ability = kind.name(), targets = ctx.available_targets.len(), "ability phase started");
        state.push_event(GameEventData::AbilityPhaseChanged {
            player,
            ability: Some(kind),
            targets: ctx.available_targets.clone(),
        });
        self.active = Some(ctx);
        true
    }

    /// A phase is open.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Open phase.
    pub fn context(&self) -> Option<&AbilityContext> {
        self.active.as_ref()
    }

    /// Route an input to the open phase. The phase closes on
    /// `BeginRoute` and `Cancelled`.
    pub fn handle_input(&mut self, state: &mut GameState, input: AbilityInput) -> Result<AbilityResponse, AbilityError> {
        let ctx = self.active.as_mut().ok_or(AbilityError::NoActivePhase)?;
        let ability = handler(ctx.kind);
        let targets_before = ctx.available_targets.clone();

        let response = ability.handle_input(state, ctx, input, &mut self.provisional)?;
        let narrowed = (ctx.available_targets != targets_before)
            .then(|| (ctx.player, ctx.kind, ctx.available_targets.clone()));

        match (response, narrowed) {
            (AbilityResponse::BeginRoute { .. } | AbilityResponse::Cancelled, _) => self.end_phase(state),
            (AbilityResponse::Handled, Some((player, kind, targets))) => {
                state.push_event(GameEventData::AbilityPhaseChanged {
                    player,
                    ability: Some(kind),
                    targets,
                });
            }
            _ => {}
        }
        Ok(response)
    }

    /// Close the phase without touching provisional effects.
    pub fn end_phase(&mut self, state: &mut GameState) {
        if let Some(mut ctx) = self.active.take() {
            handler(ctx.kind).cleanup(&mut ctx);
            debug!(player = %ctx.player, ability = ctx.kind.name(), "ability phase ended");
            state.push_event(GameEventData::AbilityPhaseChanged {
                player: ctx.player,
                ability: None,
                targets: Vec::new(),
            });
        }
    }

    /// Provisional effects applied this turn.
    pub fn provisional(&self) -> &[ProvisionalEffect] {
        &self.provisional
    }

    /// Undo every provisional effect, newest first.
    pub fn revert_provisional(&mut self, state: &mut GameState) -> usize {
        let count = self.provisional.len();
        while let Some(effect) = self.provisional.pop() {
            effect.revert(state);
        }
        if count > 0 {
            debug!(count, "provisional effects reverted");
        }
        count
    }

    /// Keep an elimination that happened mid-turn from being undone by a
    /// later revert.
    pub fn record_elimination(&mut self, player: PlayerId) {
        for effect in &mut self.provisional {
            if effect.record_elimination(player) {
                debug!(%player, "elimination recorded in provisional effect");
            }
        }
    }

    /// Make provisional effects permanent.
    pub fn commit_provisional(&mut self) {
        self.provisional.clear();
    }
}
