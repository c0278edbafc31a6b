use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Player-driven state of one cell. Mines live in the [`MineLayout`](crate::MineLayout).
    ///
    /// Both bits may be set at once only after [`Board::reveal_all_cells`](crate::Board::reveal_all_cells).
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CellMarks: u8 {
        const REVEALED = 1;
        const FLAGGED  = 1 << 1;
    }
}

impl CellMarks {
    /// Neither revealed nor flagged.
    pub const fn is_hidden(self) -> bool {
        self.is_empty()
    }
}

/// What a player is allowed to see of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    Hidden,
    Flagged,
    Revealed(u8),
}

impl CellView {
    pub const FLAGGED_CODE: i8 = -1;
    pub const HIDDEN_CODE: i8 = -2;

    /// Integer encoding used by [`Board::visible_board`](crate::Board::visible_board).
    pub const fn code(self) -> i8 {
        match self {
            Self::Flagged => Self::FLAGGED_CODE,
            Self::Hidden => Self::HIDDEN_CODE,
            Self::Revealed(count) => count as i8,
        }
    }
}

impl Default for CellView {
    fn default() -> Self {
        Self::Hidden
    }
}
