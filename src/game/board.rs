//! The Board
//!
//! A toroidal grid of cards. Each cell holds one card value, an
//! orientation and the set of players standing on it. Cells are created
//! once at deal time and never destroyed; later play only flips them or
//! (through the clubs ability) exchanges their contents.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::grid::{Direction, GridDims, Position};
use crate::core::hash::{StateHash, StateHasher};
use crate::core::rng::DeterministicRng;
use crate::game::card::{CardValue, Deck, Rank, Suit};
use crate::game::player::PlayerId;

// =============================================================================
// IDS AND ENUMS
// =============================================================================

/// Physical grid slot, row-major index.
///
/// Stays attached to the slot: a swap moves card contents between slots,
/// never the ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId(pub usize);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which way a card is lying.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    FaceUp,
    FaceDown,
}

/// Neighborhood used by adjacency queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Adjacency {
    /// Up, down, left, right
    Orthogonal,
    /// All eight surrounding cells
    Omni,
}

impl Adjacency {
    fn directions(self) -> &'static [Direction] {
        match self {
            Adjacency::Orthogonal => &Direction::ORTHOGONAL,
            Adjacency::Omni => &Direction::ALL,
        }
    }
}

/// Board errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// Swap of a cell with itself.
    #[error("cannot swap cell {0} with itself")]
    InvalidSwap(CellId),

    /// Cell id outside the grid.
    #[error("cell {0} is outside the grid")]
    UnknownCell(CellId),

    /// Deck too small for the grid.
    #[error("deck of {deck} cards cannot fill a {rows}x{cols} grid")]
    NotEnoughCards { deck: usize, rows: usize, cols: usize },

    /// Zero rows or columns.
    #[error("grid dimensions must be non-zero")]
    EmptyGrid,

    /// The same card value dealt twice.
    #[error("card {0} appears more than once")]
    DuplicateValue(CardValue),
}

// =============================================================================
// CELL
// =============================================================================

/// One grid slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub position: Position,
    pub value: CardValue,
    pub orientation: Orientation,
    /// Players standing here (unbounded, may be shared)
    pub occupants: BTreeSet<PlayerId>,
}

impl Cell {
    #[inline]
    pub fn rank(&self) -> Rank {
        self.value.rank
    }

    #[inline]
    pub fn suit(&self) -> Suit {
        self.value.suit
    }

    #[inline]
    pub fn is_face_up(&self) -> bool {
        self.orientation == Orientation::FaceUp
    }

    #[inline]
    pub fn is_face_down(&self) -> bool {
        self.orientation == Orientation::FaceDown
    }

    /// Someone other than `player` stands here.
    pub fn is_occupied_by_other(&self, player: PlayerId) -> bool {
        self.occupants.iter().any(|p| *p != player)
    }
}

/// Pre-image of a cell's mutable contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellSnapshot {
    pub cell: CellId,
    pub value: CardValue,
    pub orientation: Orientation,
    pub occupants: BTreeSet<PlayerId>,
}

/// Which players ended up where after a swap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapOutcome {
    pub a: CellId,
    pub b: CellId,
    /// Players now standing on `a` (they were on `b`)
    pub now_on_a: Vec<PlayerId>,
    /// Players now standing on `b` (they were on `a`)
    pub now_on_b: Vec<PlayerId>,
}

// =============================================================================
// READ MODELS
// =============================================================================

/// Per-suit card tally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuitCount {
    pub total: usize,
    pub face_up: usize,
    pub face_down: usize,
}

/// Whole-grid tally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridStats {
    pub total_cards: usize,
    pub face_up: usize,
    pub face_down: usize,
    pub rows: usize,
    pub cols: usize,
}

// =============================================================================
// BOARD
// =============================================================================

/// The dealt grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Board {
    dims: GridDims,
    /// Row-major, `cells[i].id == CellId(i)`
    cells: Vec<Cell>,
}

impl Board {
    /// Deal a shuffled deck onto a grid, all cards face up.
    pub fn deal(dims: GridDims, deck: &Deck, rng: &mut DeterministicRng) -> Result<Self, BoardError> {
        if !deck.has_enough_for(dims.rows, dims.cols) {
            return Err(BoardError::NotEnoughCards {
                deck: deck.len(),
                rows: dims.rows,
                cols: dims.cols,
            });
        }
        Self::from_values(dims, &deck.shuffled(rng))
    }

    /// Lay out explicit values row-major, all face up.
    ///
    /// Extra values beyond the grid size are ignored.
    pub fn from_values(dims: GridDims, values: &[CardValue]) -> Result<Self, BoardError> {
        if dims.rows == 0 || dims.cols == 0 {
            return Err(BoardError::EmptyGrid);
        }
        if values.len() < dims.cell_count() {
            return Err(BoardError::NotEnoughCards {
                deck: values.len(),
                rows: dims.rows,
                cols: dims.cols,
            });
        }

        let mut seen = BTreeSet::new();
        let mut cells = Vec::with_capacity(dims.cell_count());
        for (index, value) in values.iter().take(dims.cell_count()).enumerate() {
            if !seen.insert(*value) {
                return Err(BoardError::DuplicateValue(*value));
            }
            cells.push(Cell {
                id: CellId(index),
                position: dims.position_of(index),
                value: *value,
                orientation: Orientation::FaceUp,
                occupants: BTreeSet::new(),
            });
        }

        Ok(Self { dims, cells })
    }

    /// Grid dimensions.
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True for a board without cells (never produced by the constructors).
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate cells row-major.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Whether `id` names a slot on this grid.
    pub fn contains(&self, id: CellId) -> bool {
        id.0 < self.cells.len()
    }

    /// Cell by id.
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.0)
    }

    fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(id.0)
    }

    /// Id of the cell at wrapped coordinates.
    pub fn id_at(&self, row: i64, col: i64) -> CellId {
        CellId(self.dims.index_of(self.dims.wrap(row, col)))
    }

    /// Cell at wrapped coordinates. Every coordinate pair resolves.
    pub fn cell_at(&self, row: i64, col: i64) -> &Cell {
        &self.cells[self.id_at(row, col).0]
    }

    /// Neighbor one step away in `dir`.
    pub fn neighbor(&self, id: CellId, dir: Direction) -> Option<CellId> {
        let cell = self.cell(id)?;
        Some(CellId(self.dims.index_of(self.dims.step(cell.position, dir))))
    }

    /// Distinct neighbors of `id`, excluding `id` itself.
    ///
    /// On grids narrower than three cells wrapping makes directions
    /// collide; each neighbor is listed once.
    pub fn adjacent_cells(&self, id: CellId, mode: Adjacency) -> Vec<CellId> {
        let mut out = Vec::new();
        for dir in mode.directions() {
            if let Some(n) = self.neighbor(id, *dir) {
                if n != id && !out.contains(&n) {
                    out.push(n);
                }
            }
        }
        out
    }

    /// Turn a card face up. Returns whether anything changed.
    pub fn flip_up(&mut self, id: CellId) -> bool {
        self.set_orientation(id, Orientation::FaceUp)
    }

    /// Turn a card face down. Returns whether anything changed.
    pub fn flip_down(&mut self, id: CellId) -> bool {
        self.set_orientation(id, Orientation::FaceDown)
    }

    fn set_orientation(&mut self, id: CellId, orientation: Orientation) -> bool {
        match self.cell_mut(id) {
            Some(cell) if cell.orientation != orientation => {
                cell.orientation = orientation;
                true
            }
            _ => false,
        }
    }

    /// Exchange value, orientation and occupants of two cells.
    ///
    /// Player records are not touched here; `GameState::swap_cells`
    /// re-points the riders' `current_cell`.
    pub fn swap_cells(&mut self, a: CellId, b: CellId) -> Result<SwapOutcome, BoardError> {
        if a == b {
            return Err(BoardError::InvalidSwap(a));
        }
        for id in [a, b] {
            if !self.contains(id) {
                return Err(BoardError::UnknownCell(id));
            }
        }

        let (lo, hi) = if a.0 < b.0 { (a.0, b.0) } else { (b.0, a.0) };
        let (left, right) = self.cells.split_at_mut(hi);
        let first = &mut left[lo];
        let second = &mut right[0];

        std::mem::swap(&mut first.value, &mut second.value);
        std::mem::swap(&mut first.orientation, &mut second.orientation);
        std::mem::swap(&mut first.occupants, &mut second.occupants);

        Ok(SwapOutcome {
            a,
            b,
            now_on_a: self.cells[a.0].occupants.iter().copied().collect(),
            now_on_b: self.cells[b.0].occupants.iter().copied().collect(),
        })
    }

    /// Capture a cell's mutable contents.
    pub fn snapshot(&self, id: CellId) -> Option<CellSnapshot> {
        self.cell(id).map(|cell| CellSnapshot {
            cell: id,
            value: cell.value,
            orientation: cell.orientation,
            occupants: cell.occupants.clone(),
        })
    }

    /// Write a snapshot back. Returns false for an unknown cell.
    pub fn restore(&mut self, snapshot: &CellSnapshot) -> bool {
        match self.cell_mut(snapshot.cell) {
            Some(cell) => {
                cell.value = snapshot.value;
                cell.orientation = snapshot.orientation;
                cell.occupants = snapshot.occupants.clone();
                true
            }
            None => false,
        }
    }

    /// Put a player on a cell.
    pub fn add_occupant(&mut self, id: CellId, player: PlayerId) -> bool {
        self.cell_mut(id).is_some_and(|cell| cell.occupants.insert(player))
    }

    /// Take a player off a cell.
    pub fn remove_occupant(&mut self, id: CellId, player: PlayerId) -> bool {
        self.cell_mut(id).is_some_and(|cell| cell.occupants.remove(&player))
    }

    /// Face-down card count.
    pub fn count_face_down(&self) -> usize {
        self.cells.iter().filter(|c| c.is_face_down()).count()
    }

    /// Face-up card count.
    pub fn count_face_up(&self) -> usize {
        self.cells.len() - self.count_face_down()
    }

    /// Tally of cards per suit, split by orientation.
    pub fn card_counts_by_suit(&self) -> BTreeMap<Suit, SuitCount> {
        let mut counts: BTreeMap<Suit, SuitCount> =
            Suit::ALL.into_iter().map(|s| (s, SuitCount::default())).collect();

        for cell in &self.cells {
            let entry = counts.entry(cell.suit()).or_default();
            entry.total += 1;
            if cell.is_face_up() {
                entry.face_up += 1;
            } else {
                entry.face_down += 1;
            }
        }
        counts
    }

    /// Grid statistics.
    pub fn stats(&self) -> GridStats {
        let face_down = self.count_face_down();
        GridStats {
            total_cards: self.cells.len(),
            face_up: self.cells.len() - face_down,
            face_down,
            rows: self.dims.rows,
            cols: self.dims.cols,
        }
    }

    /// Where a card value currently lies.
    pub fn find_value(&self, value: CardValue) -> Option<CellId> {
        self.cells.iter().find(|c| c.value == value).map(|c| c.id)
    }

    /// Cells holding a given rank, row-major.
    pub fn cells_with_rank(&self, rank: Rank) -> Vec<CellId> {
        self.cells.iter().filter(|c| c.rank() == rank).map(|c| c.id).collect()
    }

    /// Feed the board into a state hasher.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_usize(self.dims.rows);
        hasher.update_usize(self.dims.cols);
        for cell in &self.cells {
            hasher.update_u8(cell.rank().value());
            hasher.update_u8(cell.suit() as u8);
            hasher.update_bool(cell.is_face_up());
            hasher.update_usize(cell.occupants.len());
            for p in &cell.occupants {
                hasher.update_u8(p.0);
            }
        }
    }

    /// Digest of the board alone.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_board();
        self.hash_into(&mut hasher);
        hasher.finalize()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Deck order laid row-major: row 0 spades, 1 hearts, 2 diamonds,
    /// 3 clubs; column `c` holds rank `c + 2`.
    pub(crate) fn ordered_board() -> Board {
        Board::from_values(GridDims::STANDARD, Deck::standard().values()).unwrap()
    }

    #[test]
    fn test_ordered_layout() {
        let board = ordered_board();
        assert_eq!(board.len(), 24);
        assert_eq!(board.cell_at(0, 0).value.to_string(), "2♠");
        assert_eq!(board.cell_at(1, 5).value.to_string(), "7♥");
        assert_eq!(board.cell_at(3, 1).value.to_string(), "3♣");
        assert!(board.cells().all(|c| c.is_face_up()));
    }

    #[test]
    fn test_cell_at_wraps() {
        let board = ordered_board();
        assert_eq!(board.cell_at(-1, 0).id, board.cell_at(3, 0).id);
        assert_eq!(board.cell_at(0, 6).id, board.cell_at(0, 0).id);
        assert_eq!(board.cell_at(-5, -7).position, Position::new(3, 5));
    }

    #[test]
    fn test_adjacency_modes() {
        let board = ordered_board();
        let corner = board.id_at(0, 0);

        let ortho = board.adjacent_cells(corner, Adjacency::Orthogonal);
        assert_eq!(ortho.len(), 4);
        assert!(ortho.contains(&board.id_at(3, 0)));
        assert!(ortho.contains(&board.id_at(0, 5)));

        let omni = board.adjacent_cells(corner, Adjacency::Omni);
        assert_eq!(omni.len(), 8);
        assert!(omni.contains(&board.id_at(3, 5)));
        assert!(!omni.contains(&corner));
    }

    #[test]
    fn test_adjacency_dedupes_on_narrow_grid() {
        let board = Board::from_values(GridDims::new(2, 2), Deck::standard().values()).unwrap();
        let omni = board.adjacent_cells(CellId(0), Adjacency::Omni);
        assert_eq!(omni.len(), 3);
    }

    #[test]
    fn test_flips_are_idempotent() {
        let mut board = ordered_board();
        let id = CellId(7);
        assert!(board.flip_down(id));
        assert!(!board.flip_down(id));
        assert_eq!(board.count_face_down(), 1);
        assert!(board.flip_up(id));
        assert!(!board.flip_up(id));
        assert_eq!(board.count_face_down(), 0);
        assert!(!board.flip_up(CellId(99)));
    }

    #[test]
    fn test_find_value_and_face_up_count() {
        let mut board = ordered_board();
        let five_diamonds = CardValue::parse("5♦").unwrap();
        assert_eq!(board.find_value(five_diamonds), Some(board.id_at(2, 3)));

        let (from, to) = (board.id_at(2, 3), board.id_at(0, 0));
        board.swap_cells(from, to).unwrap();
        assert_eq!(board.find_value(five_diamonds), Some(board.id_at(0, 0)));

        assert_eq!(board.count_face_up(), 24);
        board.flip_down(CellId(3));
        board.flip_down(CellId(10));
        assert_eq!(board.count_face_up(), 22);
        assert_eq!(board.count_face_up() + board.count_face_down(), board.len());
    }

    #[test]
    fn test_swap_exchanges_everything() {
        let mut board = ordered_board();
        let a = CellId(0);
        let b = CellId(1);
        board.flip_down(b);
        board.add_occupant(a, PlayerId(1));
        board.add_occupant(b, PlayerId(2));
        board.add_occupant(b, PlayerId(3));

        let outcome = board.swap_cells(a, b).unwrap();

        let cell_a = board.cell(a).unwrap();
        assert_eq!(cell_a.value.to_string(), "3♠");
        assert!(cell_a.is_face_down());
        assert_eq!(outcome.now_on_a, vec![PlayerId(2), PlayerId(3)]);
        assert_eq!(outcome.now_on_b, vec![PlayerId(1)]);
        assert_eq!(board.cell(b).unwrap().value.to_string(), "2♠");
    }

    #[test]
    fn test_swap_rejects_self_and_unknown() {
        let mut board = ordered_board();
        assert_eq!(board.swap_cells(CellId(4), CellId(4)), Err(BoardError::InvalidSwap(CellId(4))));
        assert_eq!(board.swap_cells(CellId(4), CellId(40)), Err(BoardError::UnknownCell(CellId(40))));
    }

    #[test]
    fn test_counts_by_suit() {
        let mut board = ordered_board();
        board.flip_down(board.id_at(1, 0));
        board.flip_down(board.id_at(1, 1));
        let counts = board.card_counts_by_suit();
        assert_eq!(counts[&Suit::Hearts], SuitCount { total: 6, face_up: 4, face_down: 2 });
        assert_eq!(counts[&Suit::Clubs].face_down, 0);
        assert_eq!(board.stats().face_down, 2);
    }

    #[test]
    fn test_from_values_validation() {
        let values = Deck::standard().values().to_vec();
        assert!(matches!(
            Board::from_values(GridDims::new(5, 6), &values),
            Err(BoardError::NotEnoughCards { .. })
        ));
        assert_eq!(
            Board::from_values(GridDims::new(0, 6), &values).unwrap_err(),
            BoardError::EmptyGrid
        );
        let mut dup = values.clone();
        dup[1] = dup[0];
        assert_eq!(
            Board::from_values(GridDims::STANDARD, &dup).unwrap_err(),
            BoardError::DuplicateValue(values[0])
        );
    }

    #[test]
    fn test_deal_is_seeded() {
        let deck = Deck::standard();
        let a = Board::deal(GridDims::STANDARD, &deck, &mut DeterministicRng::new(3)).unwrap();
        let b = Board::deal(GridDims::STANDARD, &deck, &mut DeterministicRng::new(3)).unwrap();
        assert_eq!(a.compute_hash(), b.compute_hash());
        assert_eq!(a.cells_with_rank(Rank::new(7).unwrap()).len(), 4);
    }

    proptest! {
        #[test]
        fn prop_swap_then_swap_back_is_identity(
            a in 0usize..24,
            b in 0usize..24,
            down in proptest::collection::vec(0usize..24, 0..10),
            seats in proptest::collection::vec((0usize..24, 1u8..5), 0..6),
        ) {
            prop_assume!(a != b);
            let mut board = ordered_board();
            for d in down {
                board.flip_down(CellId(d));
            }
            for (cell, p) in seats {
                board.add_occupant(CellId(cell), PlayerId(p));
            }
            let before = board.compute_hash();

            board.swap_cells(CellId(a), CellId(b)).unwrap();
            board.swap_cells(CellId(a), CellId(b)).unwrap();

            prop_assert_eq!(board.compute_hash(), before);
        }

        #[test]
        fn prop_snapshot_restore_is_identity(a in 0usize..24, b in 0usize..24) {
            prop_assume!(a != b);
            let mut board = ordered_board();
            board.flip_down(CellId(b));
            let before = board.clone();
            let snaps = [board.snapshot(CellId(a)).unwrap(), board.snapshot(CellId(b)).unwrap()];

            board.swap_cells(CellId(a), CellId(b)).unwrap();
            for snap in &snaps {
                board.restore(snap);
            }

            prop_assert_eq!(board.cells().cloned().collect::<Vec<_>>(), before.cells().cloned().collect::<Vec<_>>());
        }
    }
}
