use alloc::vec;
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Valid transitions:
/// - Playing -> Won
/// - Playing -> Lost
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

impl GameState {
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Indicates the game has ended and no moves can be made anymore
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::Playing
    }
}

/// One game from mine placement to win or loss.
///
/// Positions are `(row, col)` and must lie inside the board, out-of-range
/// positions panic. Use [`Board::validate_coords`] to check caller input first.
///
/// `Clone` is a deep copy, a clone can be played independently of its source.
///
/// Deserialization recounts flags and revealed cells from the marks and
/// rejects marks that no sequence of moves could have produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedBoard")]
pub struct Board {
    mine_layout: MineLayout,
    marks: Array2<CellMarks>,
    revealed_safe_count: CellCount,
    flag_count: CellCount,
    state: GameState,
}

impl Board {
    /// Places mines with `rng` and starts a game.
    pub fn new<R: Rng + ?Sized>(config: GameConfig, rng: &mut R) -> Self {
        Self::from_layout(RandomMinefieldGenerator::new(rng).generate(config))
    }

    /// Starts a reproducible game from a seed.
    pub fn seeded(config: GameConfig, seed: u64) -> Self {
        Self::from_layout(RandomMinefieldGenerator::seeded(seed).generate(config))
    }

    /// Starts a game over a fixed mine layout.
    pub fn from_layout(mine_layout: MineLayout) -> Self {
        let size = mine_layout.size();
        Self {
            mine_layout,
            marks: Array2::default((size, size).to_nd_index()),
            revealed_safe_count: 0,
            flag_count: 0,
            state: GameState::default(),
        }
    }

    pub fn game_state(&self) -> GameState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn board_size(&self) -> Coord {
        self.mine_layout.size()
    }

    pub fn config(&self) -> GameConfig {
        self.mine_layout.game_config()
    }

    pub fn mine_layout(&self) -> &MineLayout {
        &self.mine_layout
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_layout.mine_count()
    }

    pub fn flag_count(&self) -> CellCount {
        self.flag_count
    }

    /// How many mines have not been flagged yet, negative when over-flagged.
    pub fn mines_left(&self) -> i32 {
        i32::from(self.mine_layout.mine_count()) - i32::from(self.flag_count)
    }

    /// Number of revealed cells without a mine.
    pub fn revealed_count(&self) -> CellCount {
        self.revealed_safe_count
    }

    pub fn safe_cells_left(&self) -> CellCount {
        self.mine_layout.safe_cell_count() - self.revealed_safe_count
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        self.mine_layout.validate_coords(coords)
    }

    pub fn is_revealed(&self, coords: Coord2) -> bool {
        self.marks_at(coords).contains(CellMarks::REVEALED)
    }

    pub fn is_flagged(&self, coords: Coord2) -> bool {
        self.marks_at(coords).contains(CellMarks::FLAGGED)
    }

    pub fn has_mine(&self, coords: Coord2) -> bool {
        self.assert_in_bounds(coords);
        self.mine_layout.contains_mine(coords)
    }

    pub fn count_adjacent_mines(&self, coords: Coord2) -> u8 {
        self.assert_in_bounds(coords);
        self.mine_layout.adjacent_mine_count(coords)
    }

    /// Player view of a cell, a flag takes precedence over the revealed state.
    pub fn cell_at(&self, coords: Coord2) -> CellView {
        let marks = self.marks_at(coords);
        if marks.contains(CellMarks::FLAGGED) {
            CellView::Flagged
        } else if marks.contains(CellMarks::REVEALED) {
            CellView::Revealed(self.mine_layout.adjacent_mine_count(coords))
        } else {
            CellView::Hidden
        }
    }

    /// Whole board as [`CellView::code`] values: `-1` flagged, `-2` hidden, otherwise the adjacent-mine count.
    pub fn visible_board(&self) -> Array2<i8> {
        let size = usize::from(self.board_size());
        Array2::from_shape_fn((size, size), |(row, col)| {
            self.cell_at((row as Coord, col as Coord)).code()
        })
    }

    /// Toggles the flag on a hidden cell, does nothing on revealed cells or after the game ended.
    pub fn flag_cell(&mut self, coords: Coord2) -> MarkOutcome {
        let marks = self.marks_at(coords);
        if !self.state.is_playing() || marks.contains(CellMarks::REVEALED) {
            return MarkOutcome::NoChange;
        }

        if marks.contains(CellMarks::FLAGGED) {
            self.marks[coords.to_nd_index()].remove(CellMarks::FLAGGED);
            self.flag_count -= 1;
        } else {
            self.place_flag(coords);
        }
        MarkOutcome::Changed
    }

    pub fn reveal_cell(&mut self, coords: Coord2) -> CellResult {
        let marks = self.marks_at(coords);

        if !self.state.is_playing() || marks.contains(CellMarks::REVEALED) {
            return CellResult::AlreadyRevealed;
        }
        if marks.contains(CellMarks::FLAGGED) {
            return CellResult::Flagged;
        }

        self.mark_revealed(coords);

        if self.mine_layout.contains_mine(coords) {
            log::debug!("Mine hit at {:?}, game lost", coords);
            self.state = GameState::Lost;
            return CellResult::Bomb;
        }

        let adjacent_mines = self.mine_layout.adjacent_mine_count(coords);
        log::debug!("Revealed {:?}, adjacent mines: {}", coords, adjacent_mines);

        let result = if adjacent_mines == 0 {
            self.flood_fill(coords);
            CellResult::Empty
        } else {
            CellResult::Number
        };
        self.check_win();
        result
    }

    /// Marks every cell revealed, for disclosing the board after a loss.
    ///
    /// Leaves the game state and flags untouched.
    pub fn reveal_all_cells(&mut self) {
        for marks in self.marks.iter_mut() {
            marks.insert(CellMarks::REVEALED);
        }
        self.revealed_safe_count = self.mine_layout.safe_cell_count();
        log::debug!("Revealed all cells, state: {:?}", self.state);
    }

    /// Opens the region around a zero cell, stopping at numbered cells and flags.
    fn flood_fill(&mut self, origin: Coord2) {
        // revealed marks double as the visited set
        let mut to_visit = vec![origin];

        while let Some(center) = to_visit.pop() {
            for pos in self.mine_layout.iter_neighbors(center) {
                if !self.marks[pos.to_nd_index()].is_hidden() {
                    continue;
                }

                self.mark_revealed(pos);
                let adjacent_mines = self.mine_layout.adjacent_mine_count(pos);
                log::trace!(
                    "Flood revealed {:?}, adjacent mines: {}",
                    pos,
                    adjacent_mines
                );

                if adjacent_mines == 0 {
                    to_visit.push(pos);
                }
            }
        }
    }

    fn check_win(&mut self) {
        if self.revealed_safe_count == self.mine_layout.safe_cell_count() {
            log::debug!("All safe cells revealed, game won");
            self.state = GameState::Won;
        }
    }

    fn mark_revealed(&mut self, coords: Coord2) {
        self.marks[coords.to_nd_index()].insert(CellMarks::REVEALED);
        if !self.mine_layout.contains_mine(coords) {
            self.revealed_safe_count += 1;
        }
    }

    /// Flags a cell known to be hidden.
    fn place_flag(&mut self, coords: Coord2) {
        debug_assert!(self.marks[coords.to_nd_index()].is_hidden());
        self.marks[coords.to_nd_index()].insert(CellMarks::FLAGGED);
        self.flag_count += 1;
    }

    pub(crate) fn marks_at(&self, coords: Coord2) -> CellMarks {
        self.assert_in_bounds(coords);
        self.marks[coords.to_nd_index()]
    }

    pub(crate) fn marks(&self) -> &Array2<CellMarks> {
        &self.marks
    }

    pub(crate) fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.mine_layout.iter_neighbors(coords)
    }

    fn assert_in_bounds(&self, coords: Coord2) {
        let size = self.board_size();
        assert!(
            coords.0 < size && coords.1 < size,
            "coordinates {coords:?} out of bounds for a {size}x{size} board"
        );
    }
}

/// Serialized counters are ignored, they are rebuilt from the marks.
#[derive(Deserialize)]
struct UncheckedBoard {
    mine_layout: MineLayout,
    marks: Array2<CellMarks>,
    state: GameState,
}

impl TryFrom<UncheckedBoard> for Board {
    type Error = GameError;

    fn try_from(value: UncheckedBoard) -> Result<Self> {
        let UncheckedBoard {
            mine_layout,
            marks,
            state,
        } = value;
        let size = usize::from(mine_layout.size());
        if marks.dim() != (size, size) {
            return Err(GameError::InvalidBoardShape);
        }

        let mut flag_count: CellCount = 0;
        let mut revealed_safe_count: CellCount = 0;
        let mut revealed_mines: CellCount = 0;
        let mut flagged_revealed = false;
        for ((row, col), cell) in marks.indexed_iter() {
            let coords = (row as Coord, col as Coord);
            if cell.contains(CellMarks::FLAGGED) {
                flag_count += 1;
            }
            if cell.contains(CellMarks::REVEALED) {
                if mine_layout.contains_mine(coords) {
                    revealed_mines += 1;
                } else {
                    revealed_safe_count += 1;
                }
                flagged_revealed |= cell.contains(CellMarks::FLAGGED);
            }
        }

        // only reveal_all_cells reveals flagged cells or mines beyond the one that lost
        let all_revealed = marks.iter().all(|cell| cell.contains(CellMarks::REVEALED));
        let all_safe_revealed = revealed_safe_count == mine_layout.safe_cell_count();
        let consistent = all_revealed
            || (!flagged_revealed
                && match state {
                    GameState::Playing => revealed_mines == 0 && !all_safe_revealed,
                    GameState::Won => revealed_mines == 0 && all_safe_revealed,
                    GameState::Lost => revealed_mines == 1 && !all_safe_revealed,
                });
        if !consistent {
            log::debug!(
                "Rejected board in state {:?}: {} safe and {} mine cells revealed",
                state,
                revealed_safe_count,
                revealed_mines
            );
            return Err(GameError::InconsistentBoard);
        }

        Ok(Self {
            mine_layout,
            marks,
            revealed_safe_count,
            flag_count,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn board(size: Coord, mines: &[Coord2]) -> Board {
        Board::from_layout(MineLayout::from_mine_coords(size, mines).unwrap())
    }

    fn direct_flag_count(board: &Board) -> CellCount {
        board
            .marks()
            .iter()
            .filter(|marks| marks.contains(CellMarks::FLAGGED))
            .count() as CellCount
    }

    #[test]
    fn reveal_mine_loses_and_is_terminal() {
        let mut board = board(3, &[(0, 0)]);

        assert_eq!(board.reveal_cell((0, 0)), CellResult::Bomb);
        assert_eq!(board.game_state(), GameState::Lost);
        assert!(board.is_revealed((0, 0)));

        assert_eq!(board.reveal_cell((2, 2)), CellResult::AlreadyRevealed);
        assert!(!board.is_revealed((2, 2)));
        assert_eq!(board.flag_cell((2, 2)), MarkOutcome::NoChange);
        assert!(!board.is_flagged((2, 2)));
    }

    #[test]
    fn reveal_number_does_not_cascade() {
        let mut board = board(3, &[(0, 0)]);

        assert_eq!(board.reveal_cell((1, 1)), CellResult::Number);
        assert_eq!(board.revealed_count(), 1);
        assert_eq!(board.reveal_cell((1, 1)), CellResult::AlreadyRevealed);
        assert_eq!(board.game_state(), GameState::Playing);
    }

    #[test]
    fn reveal_flood_fill_opens_zero_region_and_wins() {
        let mut board = board(3, &[(2, 2)]);

        assert_eq!(board.reveal_cell((0, 0)), CellResult::Empty);
        assert_eq!(board.game_state(), GameState::Won);
        assert_eq!(board.cell_at((0, 0)), CellView::Revealed(0));
        assert_eq!(board.cell_at((1, 1)), CellView::Revealed(1));
        assert_eq!(board.cell_at((2, 2)), CellView::Hidden);
    }

    #[test]
    fn flood_fill_stops_at_flags_and_keeps_them() {
        let mut board = board(5, &[(4, 4)]);
        // wall off the left column
        for row in 0..5 {
            board.flag_cell((row, 1));
        }

        assert_eq!(board.reveal_cell((0, 3)), CellResult::Empty);

        for row in 0..5 {
            assert!(board.is_flagged((row, 1)));
            assert!(!board.is_revealed((row, 1)));
            assert!(!board.is_revealed((row, 0)));
        }
        assert!(board.is_revealed((3, 3)));
        assert!(!board.is_revealed((4, 4)));
        assert_eq!(board.flag_count(), 5);
        assert_eq!(board.game_state(), GameState::Playing);
    }

    #[test]
    fn flagged_cell_rejects_reveal_until_unflagged() {
        let mut board = board(3, &[(0, 0)]);

        assert_eq!(board.flag_cell((2, 2)), MarkOutcome::Changed);
        assert_eq!(board.reveal_cell((2, 2)), CellResult::Flagged);
        assert!(!board.is_revealed((2, 2)));

        assert_eq!(board.flag_cell((2, 2)), MarkOutcome::Changed);
        assert_eq!(board.flag_count(), 0);
        assert_eq!(board.reveal_cell((2, 2)), CellResult::Empty);
    }

    #[test]
    fn flagging_revealed_cell_is_noop() {
        let mut board = board(3, &[(0, 0)]);

        board.reveal_cell((1, 1));
        assert_eq!(board.flag_cell((1, 1)), MarkOutcome::NoChange);
        assert!(!board.is_flagged((1, 1)));
        assert_eq!(board.flag_count(), 0);
    }

    #[test]
    fn flag_count_tracks_toggles() {
        let mut board = board(4, &[(0, 0)]);

        board.flag_cell((0, 0));
        board.flag_cell((1, 2));
        board.flag_cell((3, 3));
        board.flag_cell((1, 2));
        assert_eq!(board.flag_count(), 2);
        assert_eq!(board.flag_count(), direct_flag_count(&board));
        assert_eq!(board.mines_left(), -1);
    }

    #[test]
    fn win_only_on_last_safe_cell() {
        let mut board = board(2, &[(0, 0)]);

        assert_eq!(board.reveal_cell((0, 1)), CellResult::Number);
        assert_eq!(board.game_state(), GameState::Playing);
        assert_eq!(board.reveal_cell((1, 0)), CellResult::Number);
        assert_eq!(board.game_state(), GameState::Playing);
        assert_eq!(board.safe_cells_left(), 1);
        assert_eq!(board.reveal_cell((1, 1)), CellResult::Number);
        assert_eq!(board.game_state(), GameState::Won);
        assert_eq!(board.reveal_cell((0, 0)), CellResult::AlreadyRevealed);
    }

    #[test]
    fn reveal_all_keeps_state_and_flags() {
        let mut board = board(3, &[(0, 0)]);
        board.flag_cell((2, 2));
        board.reveal_cell((0, 0));

        board.reveal_all_cells();

        assert_eq!(board.game_state(), GameState::Lost);
        assert_eq!(board.flag_count(), 1);
        assert!(board.is_flagged((2, 2)));
        assert!(board.marks().iter().all(|m| m.contains(CellMarks::REVEALED)));
        assert_eq!(board.cell_at((2, 2)), CellView::Flagged);
    }

    #[test]
    fn visible_board_encodes_flags_hidden_and_counts() {
        let mut board = board(3, &[(0, 0)]);
        board.reveal_cell((1, 1));
        board.flag_cell((0, 0));

        let visible = board.visible_board();

        assert_eq!(visible.dim(), (3, 3));
        assert_eq!(visible[(0, 0)], -1);
        assert_eq!(visible[(1, 1)], 1);
        assert_eq!(visible[(2, 2)], -2);
    }

    #[test]
    fn seeded_board_scenario_reveal_origin() {
        let mut board = Board::seeded(GameConfig::default(), 20260228);
        let flag_target = board
            .mine_layout()
            .iter_mines()
            .next()
            .expect("board has mines");
        board.flag_cell(flag_target);

        let result = board.reveal_cell((0, 0));

        assert!(board.is_flagged(flag_target));
        assert!(!board.is_revealed(flag_target));
        if result == CellResult::Empty {
            // every revealed zero cell exposes all of its unflagged neighbors
            for row in 0..9 {
                for col in 0..9 {
                    let coords = (row, col);
                    if board.cell_at(coords) == CellView::Revealed(0) {
                        for pos in board.iter_neighbors(coords) {
                            assert!(board.is_revealed(pos) || board.is_flagged(pos));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn flagging_ten_cells_shows_in_visible_board() {
        let mut board = Board::seeded(GameConfig::default(), 42);
        let targets: [Coord2; 10] = [
            (0, 0),
            (0, 8),
            (8, 0),
            (8, 8),
            (4, 4),
            (2, 3),
            (3, 2),
            (5, 6),
            (6, 5),
            (7, 1),
        ];
        for coords in targets {
            assert_eq!(board.flag_cell(coords), MarkOutcome::Changed);
        }

        let visible = board.visible_board();
        for coords in targets {
            assert_eq!(visible[coords.to_nd_index()], -1);
        }
        assert_eq!(board.flag_count(), 10);
        assert_eq!(board.flag_count(), direct_flag_count(&board));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn out_of_range_coordinates_panic() {
        let board = board(3, &[(0, 0)]);
        board.is_revealed((3, 0));
    }

    #[test]
    fn validate_coords_reports_out_of_range() {
        let board = board(3, &[(0, 0)]);
        assert_eq!(board.validate_coords((2, 2)), Ok((2, 2)));
        assert_eq!(board.validate_coords((0, 3)), Err(GameError::InvalidCoords));
    }

    #[test]
    fn deserialization_rebuilds_tampered_counters() {
        let mut board = board(2, &[(0, 0)]);
        board.reveal_cell((0, 1));
        board.flag_cell((1, 1));
        let json = serde_json::to_string(&board).unwrap();
        assert!(json.contains("\"revealed_safe_count\":1,\"flag_count\":1"));

        let tampered = json.replace(
            "\"revealed_safe_count\":1,\"flag_count\":1",
            "\"revealed_safe_count\":0,\"flag_count\":0",
        );
        let mut back: Board = serde_json::from_str(&tampered).unwrap();

        assert_eq!(back, board);
        assert_eq!(back.flag_count(), 1);
        assert_eq!(back.revealed_count(), 1);
        assert_eq!(back.flag_cell((1, 1)), MarkOutcome::Changed);
        assert_eq!(back.flag_count(), 0);
    }

    #[test]
    fn deserialization_rejects_state_contradicting_marks() {
        let json = serde_json::to_string(&board(2, &[(0, 0)])).unwrap();
        assert!(json.contains("\"state\":\"Playing\""));

        for state in ["Won", "Lost"] {
            let tampered = json.replace("Playing", state);
            let err = serde_json::from_str::<Board>(&tampered).unwrap_err();
            assert!(err.to_string().contains("contradict"), "{state}: {err}");
        }

        let mut won = board(2, &[(0, 0)]);
        won.reveal_cell((0, 1));
        won.reveal_cell((1, 0));
        won.reveal_cell((1, 1));
        let json = serde_json::to_string(&won).unwrap();
        let tampered = json.replace("\"state\":\"Won\"", "\"state\":\"Playing\"");
        assert!(serde_json::from_str::<Board>(&tampered).is_err());
    }

    #[test]
    fn deserialization_rejects_mismatched_marks_shape() {
        let mut value = serde_json::to_value(board(3, &[(0, 0)])).unwrap();
        value["marks"] = serde_json::to_value(board(2, &[(0, 0)]).marks()).unwrap();

        let err = serde_json::from_value::<Board>(value).unwrap_err();
        assert!(err.to_string().contains("not a square"));
    }

    #[test]
    fn disclosed_board_survives_serialization() {
        let mut board = board(3, &[(0, 0), (2, 2)]);
        board.flag_cell((2, 2));
        board.reveal_cell((0, 0));
        board.reveal_all_cells();

        let json = serde_json::to_string(&board).unwrap();
        let back: Board = serde_json::from_str(&json).unwrap();

        assert_eq!(back, board);
        assert_eq!(back.game_state(), GameState::Lost);
        assert_eq!(back.flag_count(), 1);
        assert_eq!(back.safe_cells_left(), 0);
    }
}
