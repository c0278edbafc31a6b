//! Single-point constraint passes.
//!
//! A constraint is a revealed, unflagged, safe cell showing `required > 0`
//! adjacent mines. Comparing `required` against the flagged and hidden
//! neighbors either proves every hidden neighbor mined (auto flag) or proves
//! every hidden neighbor safe (auto reveal).
//!
//! Each pass is one row-major scan over live state. Neither iterates to a
//! fixed point on its own, [`Board::auto_solve`] does.

use serde::{Deserialize, Serialize};

use crate::*;

/// What one [`Board::auto_reveal`] pass did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealSummary {
    /// Safe cells newly revealed, flood-filled cells included.
    pub revealed: CellCount,
    /// A wrongly placed flag led the pass onto a mine.
    pub hit_mine: bool,
}

impl RevealSummary {
    pub const fn has_update(self) -> bool {
        self.revealed > 0 || self.hit_mine
    }
}

/// Totals of a [`Board::auto_solve`] run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveSummary {
    pub passes: u32,
    pub flagged: CellCount,
    pub revealed: CellCount,
    pub state: GameState,
}

#[derive(Copy, Clone, Debug, Default)]
struct NeighborTally {
    hidden: u8,
    flagged: u8,
}

impl Board {
    /// Flags every hidden neighbor of each constraint whose hidden plus flagged neighbors equal its count.
    ///
    /// Returns the number of flags placed.
    pub fn auto_flag(&mut self) -> CellCount {
        if !self.game_state().is_playing() {
            return 0;
        }

        let size = self.board_size();
        let mut placed: CellCount = 0;

        for row in 0..size {
            for col in 0..size {
                let coords = (row, col);
                let Some(required) = self.constraint_at(coords) else {
                    continue;
                };

                let tally = self.tally_neighbors(coords);
                if tally.hidden == 0 || tally.hidden + tally.flagged != required {
                    continue;
                }

                for pos in self.iter_neighbors(coords) {
                    if self.marks_at(pos).is_hidden() && self.flag_cell(pos).has_update() {
                        placed += 1;
                    }
                }
            }
        }

        log::debug!("Auto flag placed {} flags", placed);
        placed
    }

    /// Reveals every hidden neighbor of each constraint already satisfied by its flagged neighbors.
    ///
    /// Reveals go through [`Board::reveal_cell`], so flood fill and win or loss detection apply.
    pub fn auto_reveal(&mut self) -> RevealSummary {
        let mut summary = RevealSummary::default();
        if !self.game_state().is_playing() {
            return summary;
        }

        let size = self.board_size();
        let revealed_before = self.revealed_count();

        'scan: for row in 0..size {
            for col in 0..size {
                let coords = (row, col);
                let Some(required) = self.constraint_at(coords) else {
                    continue;
                };

                let tally = self.tally_neighbors(coords);
                if tally.hidden == 0 || tally.flagged != required {
                    continue;
                }

                for pos in self.iter_neighbors(coords) {
                    // earlier reveals in this loop may have flood filled the rest
                    if !self.marks_at(pos).is_hidden() {
                        continue;
                    }
                    if self.reveal_cell(pos) == CellResult::Bomb {
                        log::debug!("Auto reveal hit a mine at {:?} next to {:?}", pos, coords);
                        summary.hit_mine = true;
                        break 'scan;
                    }
                    if self.is_finished() {
                        break 'scan;
                    }
                }
            }
        }

        summary.revealed = self.revealed_count() - revealed_before;
        log::debug!(
            "Auto reveal opened {} cells, state: {:?}",
            summary.revealed,
            self.game_state()
        );
        summary
    }

    /// Alternates [`Board::auto_flag`] and [`Board::auto_reveal`] until neither makes progress or the game ends.
    pub fn auto_solve(&mut self) -> SolveSummary {
        let mut summary = SolveSummary::default();

        while self.game_state().is_playing() {
            let flagged = self.auto_flag();
            let revealed = self.auto_reveal();
            summary.passes += 1;
            summary.flagged += flagged;
            summary.revealed += revealed.revealed;

            if flagged == 0 && !revealed.has_update() {
                break;
            }
        }

        summary.state = self.game_state();
        log::debug!("Auto solve finished: {:?}", summary);
        summary
    }

    /// Required mine count when `coords` acts as a constraint.
    fn constraint_at(&self, coords: Coord2) -> Option<u8> {
        let marks = self.marks_at(coords);
        if !marks.contains(CellMarks::REVEALED)
            || marks.contains(CellMarks::FLAGGED)
            || self.has_mine(coords)
        {
            return None;
        }

        match self.count_adjacent_mines(coords) {
            0 => None,
            required => Some(required),
        }
    }

    fn tally_neighbors(&self, coords: Coord2) -> NeighborTally {
        let mut tally = NeighborTally::default();
        for pos in self.iter_neighbors(coords) {
            let marks = self.marks_at(pos);
            if marks.contains(CellMarks::FLAGGED) {
                tally.flagged += 1;
            } else if !marks.contains(CellMarks::REVEALED) {
                tally.hidden += 1;
            }
        }
        tally
    }
}
