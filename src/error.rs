use std::path::PathBuf;

/// Errors raised when a serialized grid cannot form a board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardShapeError {
    #[error("board must have at least one row and one column")]
    Empty,

    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// Errors raised when a serialized game state breaks the rules of play.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameStateError {
    #[error("board is {rows}x{cols} but settings say {expected_rows}x{expected_cols}")]
    Dimensions {
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },

    #[error("piece at ({row}, {col}) has an empty cell below it")]
    FloatingPiece { row: usize, col: usize },

    #[error("piece counts do not match the player to move")]
    TurnOrder,

    #[error("last move {0} is not on the board")]
    LastMove(usize),

    #[error("inconsistent outcome: {0}")]
    Outcome(&'static str),
}

/// Errors that can occur when replaying a recorded game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error("move {index} targets column {column}, which cannot take a piece")]
    IllegalMove { index: usize, column: usize },
}

/// Errors that can occur in a game store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while finishing a game session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("game is still in progress")]
    NotFinished,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
