//! Route Planning
//!
//! Builds the active player's path one step at a time. A route leaving a
//! card of rank `r` is exactly `r` steps long: `path` holds the start cell
//! plus one cell per step, so it is committable only at length `r + 1`.
//!
//! Rules checked on every extension, in order:
//! 1. a cell may appear in the path once
//! 2. no steps past the required count
//! 3. face-down cells only as a single phantom step, never shared with
//!    another player and never as the destination
//! 4. the destination may not hold another player
//!
//! Stepping back onto the previous cell undoes the last step instead.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::grid::Direction;
use crate::game::board::CellId;
use crate::game::events::GameEventData;
use crate::game::player::PlayerId;
use crate::game::state::GameState;

// =============================================================================
// ERRORS
// =============================================================================

/// Why a single movement input was refused. Never fatal to the turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum MoveRejection {
    #[error("cell {0} is already part of the route")]
    AlreadyInRoute(CellId),

    #[error("route already has all {0} steps")]
    RouteFull(usize),

    #[error("cell {0} is face down")]
    FaceDownNotAllowed(CellId),

    #[error("phantom step already used this turn")]
    PhantomStepSpent(CellId),

    #[error("phantom step cannot end the route on {0}")]
    PhantomStepTerminal(CellId),

    #[error("phantom step cannot pass through occupied {0}")]
    PhantomStepOccupied(CellId),

    #[error("cannot end the route on occupied {0}")]
    OccupiedTerminal(CellId),

    #[error("diagonal steps need the diamonds ability")]
    DiagonalNotAllowed,
}

/// Route planner errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("no route is being planned")]
    NotPlanning,

    #[error("a route is already being planned")]
    AlreadyPlanning,

    #[error("player {0} is not on the board")]
    NotOnBoard(PlayerId),

    #[error("route has {taken} of {required} steps")]
    Incomplete { taken: usize, required: usize },

    #[error("invalid move: {0}")]
    InvalidMove(#[from] MoveRejection),
}

// =============================================================================
// PLAN
// =============================================================================

/// Modifiers a route begins with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// One face-down cell may be crossed (spades)
    pub phantom_step_allowed: bool,
    /// Diagonal directions allowed (diamonds)
    pub diagonal_allowed: bool,
    /// Movement applied immediately after beginning
    pub first_move: Option<Direction>,
}

impl RouteOptions {
    /// Options with a first movement.
    pub fn with_first_move(mut self, dir: Direction) -> Self {
        self.first_move = Some(dir);
        self
    }
}

/// The route under construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoutePlan {
    pub player: PlayerId,
    pub start_cell: CellId,
    /// `path[0] == start_cell`
    pub path: Vec<CellId>,
    pub required_steps: usize,
    pub phantom_step_allowed: bool,
    /// Path index of the face-down cell crossed, if any
    pub phantom_step_index: Option<usize>,
    pub diagonal_allowed: bool,
}

impl RoutePlan {
    /// Steps taken so far.
    pub fn steps_taken(&self) -> usize {
        self.path.len() - 1
    }

    /// Steps still needed.
    pub fn remaining_steps(&self) -> usize {
        self.required_steps.saturating_sub(self.steps_taken())
    }

    /// Every required step taken.
    pub fn is_full(&self) -> bool {
        self.path.len() == self.required_steps + 1
    }

    /// Phantom step spent?
    pub fn phantom_step_used(&self) -> bool {
        self.phantom_step_index.is_some()
    }

    /// Last cell of the path.
    pub fn tail(&self) -> CellId {
        self.path.last().copied().unwrap_or(self.start_cell)
    }
}

/// Result of an accepted movement input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Path grew onto the cell
    Extended(CellId),
    /// Last step undone; the cell left the path
    Backtracked(CellId),
}

/// A committed route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommittedRoute {
    pub player: PlayerId,
    pub from: CellId,
    pub to: CellId,
    pub path: Vec<CellId>,
}

// =============================================================================
// PLANNER
// =============================================================================

/// Idle, or planning one route.
#[derive(Clone, Debug, Default)]
pub struct RoutePlanner {
    plan: Option<RoutePlan>,
}

impl RoutePlanner {
    /// Idle planner.
    pub fn new() -> Self {
        Self::default()
    }

    /// A route is being planned.
    pub fn is_planning(&self) -> bool {
        self.plan.is_some()
    }

    /// Current plan.
    pub fn plan(&self) -> Option<&RoutePlan> {
        self.plan.as_ref()
    }

    /// Start a route from the player's current cell.
    ///
    /// A rejected `first_move` is reported like any other rejected move
    /// and leaves the fresh route in place.
    pub fn begin(
        &mut self,
        state: &mut GameState,
        player: PlayerId,
        options: RouteOptions,
    ) -> Result<(), RouteError> {
        if self.plan.is_some() {
            return Err(RouteError::AlreadyPlanning);
        }
        let start = state.cell_of(player).ok_or(RouteError::NotOnBoard(player))?;

        let plan = RoutePlan {
            player,
            start_cell: start.id,
            path: vec![start.id],
            required_steps: start.rank().steps(),
            phantom_step_allowed: options.phantom_step_allowed,
            phantom_step_index: None,
            diagonal_allowed: options.diagonal_allowed,
        };
        debug!(
            %player,
            start = %plan.start_cell,
            steps = plan.required_steps,
            phantom = plan.phantom_step_allowed,
            diagonal = plan.diagonal_allowed,
            "route planning started"
        );
        self.plan = Some(plan);

        if let Some(dir) = options.first_move {
            // Rejection already reported through the event queue
            let _ = self.step(state, dir);
        }
        Ok(())
    }

    /// Apply one movement input.
    pub fn step(&mut self, state: &mut GameState, dir: Direction) -> Result<StepOutcome, RouteError> {
        let plan = self.plan.as_mut().ok_or(RouteError::NotPlanning)?;
        let player = plan.player;

        match Self::try_step(plan, state, dir) {
            Ok(StepOutcome::Extended(cell)) => {
                debug!(%player, %cell, step = plan.steps_taken(), "route extended");
                state.push_event(GameEventData::RouteStepAdded { player, cell, step: plan.steps_taken() });
                Ok(StepOutcome::Extended(cell))
            }
            Ok(StepOutcome::Backtracked(cell)) => {
                let step = plan.steps_taken() + 1;
                debug!(%player, %cell, step, "route backtracked");
                state.push_event(GameEventData::RouteStepRemoved { player, cell, step });
                Ok(StepOutcome::Backtracked(cell))
            }
            Err(reason) => {
                debug!(%player, ?dir, %reason, "move rejected");
                state.push_event(GameEventData::MoveRejected { player, reason });
                Err(RouteError::InvalidMove(reason))
            }
        }
    }

    fn try_step(plan: &mut RoutePlan, state: &GameState, dir: Direction) -> Result<StepOutcome, MoveRejection> {
        if dir.is_diagonal() && !plan.diagonal_allowed {
            return Err(MoveRejection::DiagonalNotAllowed);
        }

        let target = state
            .board
            .neighbor(plan.tail(), dir)
            .ok_or(MoveRejection::AlreadyInRoute(plan.tail()))?;

        let len = plan.path.len();
        if len >= 2 && plan.path[len - 2] == target {
            let popped = plan.path.pop().unwrap_or(target);
            if plan.phantom_step_index == Some(len - 1) {
                plan.phantom_step_index = None;
            }
            return Ok(StepOutcome::Backtracked(popped));
        }

        if plan.path.contains(&target) {
            return Err(MoveRejection::AlreadyInRoute(target));
        }
        if plan.is_full() {
            return Err(MoveRejection::RouteFull(plan.required_steps));
        }

        let Some(cell) = state.board.cell(target) else {
            return Err(MoveRejection::AlreadyInRoute(target));
        };
        let terminal = len == plan.required_steps;
        let occupied = cell.is_occupied_by_other(plan.player);

        if cell.is_face_down() {
            if !plan.phantom_step_allowed {
                return Err(MoveRejection::FaceDownNotAllowed(target));
            }
            if plan.phantom_step_used() {
                return Err(MoveRejection::PhantomStepSpent(target));
            }
            if occupied {
                return Err(MoveRejection::PhantomStepOccupied(target));
            }
            if terminal {
                return Err(MoveRejection::PhantomStepTerminal(target));
            }
            plan.phantom_step_index = Some(len);
        } else if terminal && occupied {
            return Err(MoveRejection::OccupiedTerminal(target));
        }

        plan.path.push(target);
        Ok(StepOutcome::Extended(target))
    }

    /// Move the player to the end of the route and flip the start card
    /// face down. Only a full route commits, and only if the board under
    /// it still obeys the step rules.
    pub fn commit(&mut self, state: &mut GameState, now: DateTime<Utc>) -> Result<CommittedRoute, RouteError> {
        let plan = self.plan.as_ref().ok_or(RouteError::NotPlanning)?;
        if !plan.is_full() {
            return Err(RouteError::Incomplete {
                taken: plan.steps_taken(),
                required: plan.required_steps,
            });
        }
        if let Err(reason) = Self::recheck(plan, state) {
            let player = plan.player;
            debug!(%player, %reason, "commit rejected, board changed under route");
            state.push_event(GameEventData::MoveRejected { player, reason });
            return Err(RouteError::InvalidMove(reason));
        }
        let plan = self.plan.take().ok_or(RouteError::NotPlanning)?;

        let to = plan.tail();
        state.place_player(plan.player, to, now);
        state.flip_down(plan.start_cell);
        state.push_event(GameEventData::RouteCommitted {
            player: plan.player,
            from: plan.start_cell,
            to,
            steps: plan.required_steps,
        });

        Ok(CommittedRoute {
            player: plan.player,
            from: plan.start_cell,
            to,
            path: plan.path,
        })
    }

    /// Cells can flip while a route is open (an elimination flips the
    /// eliminated player's card), so the finished path is checked again.
    fn recheck(plan: &RoutePlan, state: &GameState) -> Result<(), MoveRejection> {
        let last = plan.path.len() - 1;
        let mut face_down = 0;

        for (i, &id) in plan.path.iter().enumerate().skip(1) {
            let Some(cell) = state.board.cell(id) else {
                continue;
            };
            let occupied = cell.is_occupied_by_other(plan.player);

            if cell.is_face_down() {
                if !plan.phantom_step_allowed {
                    return Err(MoveRejection::FaceDownNotAllowed(id));
                }
                if i == last {
                    return Err(MoveRejection::PhantomStepTerminal(id));
                }
                face_down += 1;
                if face_down > 1 {
                    return Err(MoveRejection::PhantomStepSpent(id));
                }
                if occupied {
                    return Err(MoveRejection::PhantomStepOccupied(id));
                }
            } else if i == last && occupied {
                return Err(MoveRejection::OccupiedTerminal(id));
            }
        }
        Ok(())
    }

    /// Abandon the route. Provisional ability effects are the ability
    /// subsystem's to revert.
    pub fn cancel(&mut self, state: &mut GameState) -> Option<RoutePlan> {
        let plan = self.plan.take()?;
        debug!(player = %plan.player, steps = plan.steps_taken(), "route cancelled");
        state.push_event(GameEventData::RouteCancelled { player: plan.player });
        Some(plan)
    }
}
