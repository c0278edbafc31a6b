//! Flat numeric views of a board for model training and inference.
//!
//! Both vectors are row-major with `size * size` entries, index `row * size + col`.

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

/// Input value of a flagged cell.
pub const FLAGGED_INPUT: f64 = 1.0;
/// Input value of a hidden cell.
pub const HIDDEN_INPUT: f64 = 0.0;
/// Input value of a revealed cell without adjacent mines.
pub const EMPTY_INPUT: f64 = 0.1;
/// Input value per adjacent mine of a revealed numbered cell.
pub const COUNT_INPUT_SCALE: f64 = 0.1;

pub const fn cell_index((row, col): Coord2, size: Coord) -> usize {
    row as usize * size as usize + col as usize
}

pub const fn index_coords(index: usize, size: Coord) -> Coord2 {
    let size = size as usize;
    ((index / size) as Coord, (index % size) as Coord)
}

/// Input and label vectors taken from the same board state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub input: Vec<f64>,
    pub output: Vec<f64>,
}

impl Board {
    pub fn to_input_vector(&self) -> Vec<f64> {
        self.marks()
            .indexed_iter()
            .map(|((row, col), &marks)| {
                if marks.contains(CellMarks::FLAGGED) {
                    FLAGGED_INPUT
                } else if marks.contains(CellMarks::REVEALED) {
                    match self.count_adjacent_mines((row as Coord, col as Coord)) {
                        0 => EMPTY_INPUT,
                        count => f64::from(count) * COUNT_INPUT_SCALE,
                    }
                } else {
                    HIDDEN_INPUT
                }
            })
            .collect()
    }

    /// `1.0` where a flag is placed, `0.0` elsewhere.
    pub fn to_output_vector(&self) -> Vec<f64> {
        self.marks()
            .iter()
            .map(|marks| {
                if marks.contains(CellMarks::FLAGGED) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect()
    }

    pub fn training_sample(&self) -> TrainingSample {
        TrainingSample {
            input: self.to_input_vector(),
            output: self.to_output_vector(),
        }
    }

    /// Reveals `coords` on a clone, leaving this board untouched.
    pub fn speculate_reveal(&self, coords: Coord2) -> (CellResult, Board) {
        let mut preview = self.clone();
        let result = preview.reveal_cell(coords);
        (result, preview)
    }
}
