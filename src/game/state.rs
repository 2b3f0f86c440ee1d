use serde::{Deserialize, Serialize};

use super::board::{Cell, COLS, ROWS, WIN_LENGTH};
use super::{Board, Player};
use crate::error::GameStateError;

/// Board dimensions and the line length needed to win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub rows: usize,
    pub cols: usize,
    pub win_length: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        GameSettings {
            rows: ROWS,
            cols: COLS,
            win_length: WIN_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Won,
    Draw,
    /// Lobby placeholder; never produced by a move.
    Waiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Winner(Player),
    Draw,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("column {0} is full")]
    ColumnFull(usize),

    #[error("column {0} is not on the board")]
    InvalidColumn(usize),

    #[error("the game is already over")]
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGameState")]
pub struct GameState {
    board: Board,
    current_player: Player,
    status: GameStatus,
    winner: Option<Player>,
    winning_cells: Vec<(usize, usize)>,
    last_move: Option<usize>,
    settings: GameSettings,
}

impl GameState {
    /// Create initial game state on a standard 6x7 board
    pub fn initial() -> Self {
        Self::new(GameSettings::default())
    }

    /// Fresh game: empty board, Red to move, in progress.
    pub fn new(settings: GameSettings) -> Self {
        GameState {
            board: Board::new(settings.rows, settings.cols),
            current_player: Player::Red, // Red starts
            status: GameStatus::InProgress,
            winner: None,
            winning_cells: Vec::new(),
            last_move: None,
            settings,
        }
    }

    /// Get current player
    pub fn current_player(&self) -> Player {
        self.current_player
    }

    /// Get reference to board
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// Cells of the winning line, empty unless the game was won.
    pub fn winning_cells(&self) -> &[(usize, usize)] {
        &self.winning_cells
    }

    pub fn last_move(&self) -> Option<usize> {
        self.last_move
    }

    pub fn settings(&self) -> GameSettings {
        self.settings
    }

    /// Get game outcome if game is over
    pub fn outcome(&self) -> Option<GameOutcome> {
        match self.status {
            GameStatus::Won => self.winner.map(GameOutcome::Winner),
            GameStatus::Draw => Some(GameOutcome::Draw),
            GameStatus::InProgress | GameStatus::Waiting => None,
        }
    }

    /// Check if game is over
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, GameStatus::Won | GameStatus::Draw)
    }

    /// Get list of legal columns (not full)
    pub fn legal_actions(&self) -> Vec<usize> {
        if self.status != GameStatus::InProgress {
            return Vec::new();
        }
        self.board.valid_columns()
    }

    /// Apply a move for the current player and return the next state.
    ///
    /// Illegal columns and moves after the game has ended return an
    /// unchanged copy of `self`.
    pub fn advance_turn(&self, column: usize) -> GameState {
        self.try_advance_turn(column).unwrap_or_else(|_| self.clone())
    }

    /// Like [`GameState::advance_turn`] but reports why a move was rejected.
    pub fn try_advance_turn(&self, column: usize) -> Result<GameState, MoveError> {
        if self.status != GameStatus::InProgress {
            return Err(MoveError::GameOver);
        }

        let mover = self.current_player;
        let mut board = self.board.clone();
        let row = board.drop_piece(column, mover.to_cell())?;

        // Win is checked before draw: filling the board with a winning move is a win.
        let line = board.check_win(row, column, mover.to_cell(), self.settings.win_length);
        let (status, winner, winning_cells) = match line {
            Some(cells) => (GameStatus::Won, Some(mover), cells),
            None if board.check_draw() => (GameStatus::Draw, None, Vec::new()),
            None => (GameStatus::InProgress, None, Vec::new()),
        };

        Ok(GameState {
            board,
            current_player: mover.other(),
            status,
            winner,
            winning_cells,
            last_move: Some(column),
            settings: self.settings,
        })
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Unchecked wire form of [`GameState`].
#[derive(Deserialize)]
struct RawGameState {
    board: Board,
    current_player: Player,
    status: GameStatus,
    winner: Option<Player>,
    winning_cells: Vec<(usize, usize)>,
    last_move: Option<usize>,
    settings: GameSettings,
}

impl TryFrom<RawGameState> for GameState {
    type Error = GameStateError;

    fn try_from(raw: RawGameState) -> Result<Self, Self::Error> {
        let board = &raw.board;
        let settings = raw.settings;
        if board.rows() != settings.rows || board.cols() != settings.cols {
            return Err(GameStateError::Dimensions {
                rows: board.rows(),
                cols: board.cols(),
                expected_rows: settings.rows,
                expected_cols: settings.cols,
            });
        }

        let (mut red, mut yellow) = (0usize, 0usize);
        for col in 0..board.cols() {
            let mut seen_piece = false;
            for row in 0..board.rows() {
                match board.get(row, col) {
                    Cell::Empty if seen_piece => {
                        return Err(GameStateError::FloatingPiece { row: row - 1, col });
                    }
                    Cell::Empty => {}
                    Cell::Red => {
                        red += 1;
                        seen_piece = true;
                    }
                    Cell::Yellow => {
                        yellow += 1;
                        seen_piece = true;
                    }
                }
            }
        }
        let to_move = match red.checked_sub(yellow) {
            Some(0) => Player::Red,
            Some(1) => Player::Yellow,
            _ => return Err(GameStateError::TurnOrder),
        };
        if raw.current_player != to_move {
            return Err(GameStateError::TurnOrder);
        }
        if let Some(col) = raw.last_move.filter(|&col| col >= board.cols()) {
            return Err(GameStateError::LastMove(col));
        }

        match raw.status {
            GameStatus::Won => {
                let Some(winner) = raw.winner else {
                    return Err(GameStateError::Outcome("won without a winner"));
                };
                if winner != to_move.other() {
                    return Err(GameStateError::Outcome("winner did not make the last move"));
                }
                if raw.winning_cells.len() != settings.win_length
                    || raw
                        .winning_cells
                        .iter()
                        .any(|&(row, col)| board.get(row, col) != winner.to_cell())
                {
                    return Err(GameStateError::Outcome("winning line does not match the board"));
                }
            }
            status => {
                if raw.winner.is_some() || !raw.winning_cells.is_empty() {
                    return Err(GameStateError::Outcome("winner recorded for an unwon game"));
                }
                if status == GameStatus::Draw && !board.check_draw() {
                    return Err(GameStateError::Outcome("draw on a board that is not full"));
                }
                if status == GameStatus::InProgress && board.check_draw() {
                    return Err(GameStateError::Outcome("game in progress on a full board"));
                }
            }
        }

        Ok(GameState {
            board: raw.board,
            current_player: raw.current_player,
            status: raw.status,
            winner: raw.winner,
            winning_cells: raw.winning_cells,
            last_move: raw.last_move,
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A full 6x7 game with no four-in-a-row anywhere.
    const DRAW_SEQUENCE: [usize; 42] = [
        0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 2, 3, 2, 3, 2, 3, 3, 2, 3, 2, 3, 2, 4, 5, 4, 5, 4,
        5, 5, 4, 5, 4, 5, 4, 6, 6, 6, 6, 6, 6,
    ];

    #[test]
    fn test_initial_state() {
        let state = GameState::initial();
        assert_eq!(state.current_player(), Player::Red);
        assert_eq!(state.status(), GameStatus::InProgress);
        assert!(!state.is_terminal());
        assert_eq!(state.winner(), None);
        assert!(state.winning_cells().is_empty());
        assert_eq!(state.last_move(), None);
        assert_eq!(state.legal_actions().len(), 7);
    }

    #[test]
    fn test_advance_turn() {
        let state = GameState::initial();
        let new_state = state.advance_turn(3);

        assert_eq!(new_state.current_player(), Player::Yellow);
        assert_eq!(new_state.board().get(5, 3), Cell::Red);
        assert_eq!(new_state.last_move(), Some(3));
        // The earlier snapshot is untouched.
        assert_eq!(state.board().get(5, 3), Cell::Empty);
    }

    #[test]
    fn test_illegal_column_is_noop() {
        let state = GameState::initial().advance_turn(2);
        assert_eq!(state.advance_turn(7), state);
        assert_eq!(state.advance_turn(usize::MAX), state);
        assert_eq!(
            state.try_advance_turn(7),
            Err(MoveError::InvalidColumn(7))
        );
    }

    #[test]
    fn test_full_column_is_noop() {
        let mut state = GameState::initial();
        for _ in 0..ROWS {
            state = state.advance_turn(0);
        }
        assert!(!state.board().is_valid_move(0));
        let player = state.current_player();

        let after = state.advance_turn(0);
        assert_eq!(after, state);
        assert_eq!(after.current_player(), player);
        assert_eq!(state.try_advance_turn(0), Err(MoveError::ColumnFull(0)));
    }

    #[test]
    fn test_vertical_win_scenario() {
        let mut state = GameState::initial();
        for yellow_col in [0, 1, 2] {
            state = state.advance_turn(3); // Red
            state = state.advance_turn(yellow_col); // Yellow
        }
        state = state.advance_turn(3);

        assert_eq!(state.status(), GameStatus::Won);
        assert_eq!(state.winner(), Some(Player::Red));
        assert_eq!(state.outcome(), Some(GameOutcome::Winner(Player::Red)));
        assert_eq!(state.winning_cells(), &[(2, 3), (3, 3), (4, 3), (5, 3)]);
        assert!(state.winning_cells().iter().all(|&(_, col)| col == 3));
    }

    #[test]
    fn test_win_detection() {
        let mut state = GameState::initial();

        // Red wins with horizontal line
        for col in 0..4 {
            state = state.advance_turn(col); // Red
            if col < 3 {
                state = state.advance_turn(col); // Yellow (different row)
            }
        }

        assert!(state.is_terminal());
        assert_eq!(state.outcome(), Some(GameOutcome::Winner(Player::Red)));
        assert_eq!(state.winning_cells().len(), 4);
    }

    #[test]
    fn test_terminal_state_rejects_moves() {
        let mut state = GameState::initial();
        for col in [3, 0, 3, 1, 3, 2, 3] {
            state = state.advance_turn(col);
        }
        assert_eq!(state.status(), GameStatus::Won);
        assert!(state.legal_actions().is_empty());
        for col in 0..COLS + 2 {
            assert_eq!(state.advance_turn(col), state);
        }
        assert_eq!(state.try_advance_turn(4), Err(MoveError::GameOver));
    }

    #[test]
    fn test_draw() {
        let mut state = GameState::initial();
        for &col in &DRAW_SEQUENCE {
            assert_eq!(state.status(), GameStatus::InProgress);
            state = state.advance_turn(col);
        }

        assert_eq!(state.status(), GameStatus::Draw);
        assert_eq!(state.winner(), None);
        assert!(state.winning_cells().is_empty());
        assert_eq!(state.outcome(), Some(GameOutcome::Draw));
        assert_eq!(state.board().piece_count(), ROWS * COLS);
        assert_eq!(state.advance_turn(0), state);
    }

    #[test]
    fn test_full_board_winning_final_move_is_won() {
        // Yellow's 42nd drop fills the board and completes a diagonal.
        let sequence = [
            0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 2, 3, 2, 3, 2, 3, 3, 2, 3, 2, 3, 2, 4, 5, 4, 5,
            4, 4, 5, 4, 5, 5, 5, 4, 6, 6, 6, 6, 6, 6,
        ];
        let mut state = GameState::initial();
        for &col in &sequence {
            assert_eq!(state.status(), GameStatus::InProgress);
            state = state.advance_turn(col);
        }

        assert!(state.board().check_draw());
        assert_eq!(state.status(), GameStatus::Won);
        assert_eq!(state.winner(), Some(Player::Yellow));
        assert_eq!(state.winning_cells(), &[(0, 6), (1, 5), (2, 4), (3, 3)]);
    }

    #[test]
    fn test_small_board_settings() {
        let mut state = GameState::new(GameSettings {
            rows: 2,
            cols: 2,
            win_length: 2,
        });
        for col in [0, 1, 1] {
            state = state.advance_turn(col);
        }
        assert_eq!(state.status(), GameStatus::Won);
        assert_eq!(state.winning_cells(), &[(0, 1), (1, 0)]);

        let mut state = GameState::new(GameSettings {
            rows: 2,
            cols: 2,
            win_length: 3,
        });
        for col in [0, 1, 0, 1] {
            state = state.advance_turn(col);
        }
        assert_eq!(state.status(), GameStatus::Draw);
    }

    #[test]
    fn test_serde_roundtrip_keeps_state() {
        let state = GameState::initial().advance_turn(3).advance_turn(4);
        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_serde_roundtrip_finished_games() {
        let mut won = GameState::initial();
        for col in [3, 0, 3, 1, 3, 2, 3] {
            won = won.advance_turn(col);
        }
        let back: GameState = serde_json::from_str(&serde_json::to_string(&won).unwrap()).unwrap();
        assert_eq!(back, won);

        let mut draw = GameState::initial();
        for &col in &DRAW_SEQUENCE {
            draw = draw.advance_turn(col);
        }
        let back: GameState = serde_json::from_str(&serde_json::to_string(&draw).unwrap()).unwrap();
        assert_eq!(back, draw);
    }

    fn decode(value: serde_json::Value) -> Result<GameState, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_deserialize_rejects_mismatched_settings() {
        let mut json = serde_json::to_value(GameState::initial().advance_turn(3)).unwrap();
        json["settings"]["rows"] = 5.into();
        let err = decode(json).unwrap_err();
        assert!(err.to_string().contains("settings say 5x7"), "{}", err);
    }

    #[test]
    fn test_deserialize_rejects_won_without_winner() {
        let mut won = GameState::initial();
        for col in [3, 0, 3, 1, 3, 2, 3] {
            won = won.advance_turn(col);
        }
        let mut json = serde_json::to_value(&won).unwrap();
        json["winner"] = serde_json::Value::Null;
        assert!(decode(json).is_err());

        let mut json = serde_json::to_value(&won).unwrap();
        json["winning_cells"][0] = serde_json::json!([0, 0]);
        assert!(decode(json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_impossible_boards() {
        let state = GameState::initial().advance_turn(3).advance_turn(4);

        // Red piece hovering above an empty cell.
        let mut json = serde_json::to_value(&state).unwrap();
        json["board"][0][0] = "red".into();
        json["board"][5][3] = "empty".into();
        assert!(decode(json).is_err());

        // Wrong player to move.
        let mut json = serde_json::to_value(&state).unwrap();
        json["current_player"] = "yellow".into();
        assert!(decode(json).is_err());

        // Draw claimed on a nearly empty board.
        let mut json = serde_json::to_value(&state).unwrap();
        json["status"] = "draw".into();
        assert!(decode(json).is_err());
    }
}
