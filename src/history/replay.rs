use crate::error::ReplayError;
use crate::game::{Board, GameSettings, Player};

use super::record::{GameRecord, MoveRecord};

/// Final position reconstructed from a move list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    pub board: Board,
    pub winner: Option<Player>,
    pub winning_cells: Vec<(usize, usize)>,
}

/// Rebuild the final board by dropping every recorded move in order, then
/// look for a winning line through the last piece.
///
/// Each move is placed for the player recorded with it, so the list does not
/// have to alternate. Works on any move list, independent of a live session.
pub fn replay(settings: GameSettings, moves: &[MoveRecord]) -> Result<Replay, ReplayError> {
    let mut board = Board::new(settings.rows, settings.cols);
    let mut last = None;

    for (index, mv) in moves.iter().enumerate() {
        let row = board
            .drop_piece(mv.column, mv.player.to_cell())
            .map_err(|_| ReplayError::IllegalMove {
                index,
                column: mv.column,
            })?;
        last = Some((row, mv.column, mv.player));
    }

    let (winner, winning_cells) = last
        .and_then(|(row, col, player)| {
            board
                .check_win(row, col, player.to_cell(), settings.win_length)
                .map(|cells| (Some(player), cells))
        })
        .unwrap_or((None, Vec::new()));

    Ok(Replay {
        board,
        winner,
        winning_cells,
    })
}

impl GameRecord {
    /// Replay this record on the board it was played on.
    pub fn replay(&self) -> Result<Replay, ReplayError> {
        replay(self.settings, &self.moves)
    }
}
