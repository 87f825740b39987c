//! Player Input
//!
//! Inputs reach the engine as `Intent`s addressed to a player. Keyboard
//! front ends go through `intent_for_key`; tests and the demo drive the
//! engine through an `InputSource`.

use std::collections::VecDeque;
use serde::{Serialize, Deserialize};

use crate::core::grid::Direction;
use crate::core::rng::DeterministicRng;
use crate::game::board::CellId;
use crate::game::engine::{GameEngine, TurnPhase};
use crate::game::player::PlayerId;

/// What a player asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// One step, or skip an ability with a first step
    Move(Direction),
    /// Commit the route (or start the turn)
    Confirm,
    /// Escape: cancel the route or ability phase
    Cancel,
    /// Pick an ability target
    SelectTarget(CellId),
    /// Resign
    GiveUp,
}

/// An intent addressed to a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub player: PlayerId,
    pub intent: Intent,
}

impl PlayerInput {
    pub fn new(player: PlayerId, intent: Intent) -> Self {
        Self { player, intent }
    }
}

/// Map a key name to an intent.
///
/// W/A/S/D and the arrow keys move orthogonally, Q/E/Z/C diagonally.
/// Key names are case-insensitive.
pub fn intent_for_key(key: &str) -> Option<Intent> {
    let intent = match key.to_ascii_lowercase().as_str() {
        "w" | "arrowup" => Intent::Move(Direction::Up),
        "s" | "arrowdown" => Intent::Move(Direction::Down),
        "a" | "arrowleft" => Intent::Move(Direction::Left),
        "d" | "arrowright" => Intent::Move(Direction::Right),
        "q" => Intent::Move(Direction::UpLeft),
        "e" => Intent::Move(Direction::UpRight),
        "z" => Intent::Move(Direction::DownLeft),
        "c" => Intent::Move(Direction::DownRight),
        "enter" => Intent::Confirm,
        "escape" | "esc" => Intent::Cancel,
        _ => return None,
    };
    Some(intent)
}

// =============================================================================
// INPUT SOURCES
// =============================================================================

/// Supplier of player inputs.
pub trait InputSource {
    /// Next input, given a view of the engine. `None` when exhausted.
    fn next_input(&mut self, engine: &GameEngine) -> Option<PlayerInput>;
}

/// Replays a fixed list of inputs.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    queue: VecDeque<PlayerInput>,
}

impl ScriptedInput {
    pub fn new(inputs: impl IntoIterator<Item = PlayerInput>) -> Self {
        Self { queue: inputs.into_iter().collect() }
    }

    /// Inputs left.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl InputSource for ScriptedInput {
    fn next_input(&mut self, _engine: &GameEngine) -> Option<PlayerInput> {
        self.queue.pop_front()
    }
}

/// Seeded pseudo-random player that always speaks for the current seat.
///
/// Confirms full routes, picks ability targets at random now and then,
/// and otherwise wanders.
#[derive(Clone, Debug)]
pub struct RandomInput {
    rng: DeterministicRng,
}

impl RandomInput {
    pub fn new(seed: u64) -> Self {
        Self { rng: DeterministicRng::new(seed) }
    }

    fn random_move(&mut self, diagonal: bool) -> Intent {
        let dirs: &[Direction] = if diagonal { &Direction::ALL } else { &Direction::ORTHOGONAL };
        Intent::Move(dirs[self.rng.next_index(dirs.len())])
    }
}

impl InputSource for RandomInput {
    fn next_input(&mut self, engine: &GameEngine) -> Option<PlayerInput> {
        let player = engine.current_player()?;

        let intent = match engine.turn_phase() {
            TurnPhase::Idle => Intent::Confirm,
            TurnPhase::Ability(_) => {
                let targets = engine
                    .ability_context()
                    .map(|ctx| ctx.available_targets.clone())
                    .unwrap_or_default();
                match self.rng.next_index(4) {
                    0 => self.random_move(false),
                    _ => match self.rng.choose(&targets) {
                        Some(cell) => Intent::SelectTarget(*cell),
                        None => self.random_move(false),
                    },
                }
            }
            TurnPhase::Planning => {
                let plan = engine.route()?;
                if plan.is_full() {
                    Intent::Confirm
                } else {
                    self.random_move(plan.diagonal_allowed)
                }
            }
        };

        Some(PlayerInput::new(player, intent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(intent_for_key("w"), Some(Intent::Move(Direction::Up)));
        assert_eq!(intent_for_key("ArrowLeft"), Some(Intent::Move(Direction::Left)));
        assert_eq!(intent_for_key("D"), Some(Intent::Move(Direction::Right)));
        assert_eq!(intent_for_key("c"), Some(Intent::Move(Direction::DownRight)));
        assert_eq!(intent_for_key("q"), Some(Intent::Move(Direction::UpLeft)));
        assert_eq!(intent_for_key("Enter"), Some(Intent::Confirm));
        assert_eq!(intent_for_key("Escape"), Some(Intent::Cancel));
        assert_eq!(intent_for_key("x"), None);
    }

    #[test]
    fn test_scripted_input_drains_in_order() {
        let engine = GameEngine::new(Default::default()).unwrap();
        let mut source = ScriptedInput::new([
            PlayerInput::new(PlayerId(1), Intent::Confirm),
            PlayerInput::new(PlayerId(1), Intent::Cancel),
        ]);
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.next_input(&engine).map(|i| i.intent), Some(Intent::Confirm));
        assert_eq!(source.next_input(&engine).map(|i| i.intent), Some(Intent::Cancel));
        assert!(source.next_input(&engine).is_none());
    }

    #[test]
    fn test_random_input_idle_before_game() {
        // No current player before the game starts
        let engine = GameEngine::new(Default::default()).unwrap();
        let mut source = RandomInput::new(5);
        assert!(source.next_input(&engine).is_none());
    }
}
