use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board size must be at least 1")]
    InvalidSize,
    #[error("At least one mine is required")]
    NoMines,
    #[error("Too many mines, at least one safe cell is required")]
    TooManyMines,
    #[error("Cell grid is not a square matching the board size")]
    InvalidBoardShape,
    #[error("Mine count does not match the mines in the mask")]
    MineCountMismatch,
    #[error("Cell marks contradict the game state")]
    InconsistentBoard,
}

pub type Result<T> = core::result::Result<T, GameError>;
