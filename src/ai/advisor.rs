use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::agent::Agent;
use crate::game::{Board, GameState, Player};

/// Strength tier of the computer opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Uniform random legal column.
    Easy,
    /// Take a win, block a loss, otherwise random.
    #[default]
    Medium,
    /// Take a win, block a loss, centre, safe column, otherwise first legal.
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty '{0}' (expected 'easy', 'medium', or 'hard')")]
pub struct ParseDifficultyError(String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

/// Picks columns for a computer-controlled player at a fixed difficulty.
pub struct MoveAdvisor {
    difficulty: Difficulty,
    rng: StdRng,
}

impl MoveAdvisor {
    pub fn new(difficulty: Difficulty) -> Self {
        MoveAdvisor {
            difficulty,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Advisor with a fixed seed for the random branches.
    pub fn with_seed(difficulty: Difficulty, seed: u64) -> Self {
        MoveAdvisor {
            difficulty,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Column for the player to move in `state`. Always a legal column.
    pub fn choose_column(&mut self, state: &GameState) -> Option<usize> {
        choose_column_with(state, self.difficulty, &mut self.rng)
    }
}

impl Agent for MoveAdvisor {
    fn select_action(&mut self, state: &GameState) -> Option<usize> {
        self.choose_column(state)
    }

    fn name(&self) -> &str {
        match self.difficulty {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

/// Column the computer should play in `state` at `difficulty`, using the
/// thread-local RNG for random branches.
///
/// Returns `None` when the state has no legal column.
pub fn advise_move(state: &GameState, difficulty: Difficulty) -> Option<usize> {
    choose_column_with(state, difficulty, &mut rand::rng())
}

fn choose_column_with<R: Rng + ?Sized>(
    state: &GameState,
    difficulty: Difficulty,
    rng: &mut R,
) -> Option<usize> {
    let valid = state.legal_actions();
    if valid.is_empty() {
        return None;
    }

    let board = state.board();
    let me = state.current_player();
    let win_length = state.settings().win_length;

    let column = match difficulty {
        Difficulty::Easy => random_column(&valid, rng),
        Difficulty::Medium => winning_column(board, &valid, me, win_length)
            .or_else(|| winning_column(board, &valid, me.other(), win_length))
            .unwrap_or_else(|| random_column(&valid, rng)),
        Difficulty::Hard => winning_column(board, &valid, me, win_length)
            .or_else(|| winning_column(board, &valid, me.other(), win_length))
            .or_else(|| centre_column(board))
            .or_else(|| safe_column(board, &valid, me, win_length))
            .unwrap_or(valid[0]),
    };

    Some(column)
}

/// First column in which `player` would complete a line right now.
fn winning_column(board: &Board, valid: &[usize], player: Player, win_length: usize) -> Option<usize> {
    valid
        .iter()
        .copied()
        .find(|&col| completes_line(board, col, player, win_length))
}

fn completes_line(board: &Board, col: usize, player: Player, win_length: usize) -> bool {
    let Some(row) = board.lowest_empty_row(col) else {
        return false;
    };
    let cell = player.to_cell();
    board
        .apply_move(col, cell)
        .check_win(row, col, cell, win_length)
        .is_some()
}

/// Uniform pick from a non-empty column list.
fn random_column<R: Rng + ?Sized>(columns: &[usize], rng: &mut R) -> usize {
    columns[rng.random_range(0..columns.len())]
}

fn centre_column(board: &Board) -> Option<usize> {
    let centre = board.cols() / 2;
    board.is_valid_move(centre).then_some(centre)
}

/// First column where the opponent cannot win by dropping straight on top
/// of our piece. Only the same column is examined.
fn safe_column(board: &Board, valid: &[usize], me: Player, win_length: usize) -> Option<usize> {
    valid.iter().copied().find(|&col| {
        let after = board.apply_move(col, me.to_cell());
        !completes_line(&after, col, me.other(), win_length)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameSettings, GameStatus};

    fn play(sequence: &[usize]) -> GameState {
        play_with(GameSettings::default(), sequence)
    }

    fn play_with(settings: GameSettings, sequence: &[usize]) -> GameState {
        let mut state = GameState::new(settings);
        for &col in sequence {
            state = state.try_advance_turn(col).unwrap();
        }
        assert_eq!(state.status(), GameStatus::InProgress);
        state
    }

    #[test]
    fn test_difficulty_parse_and_display() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(difficulty.to_string().parse::<Difficulty>(), Ok(difficulty));
        }
        assert_eq!(" HARD ".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("impossible".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }

    #[test]
    fn test_easy_returns_only_valid_columns() {
        // Columns 0 and 3 are full.
        let state = play(&[0, 0, 0, 0, 0, 0, 3, 3, 3, 3, 3, 3]);
        let mut advisor = MoveAdvisor::with_seed(Difficulty::Easy, 5);
        for _ in 0..200 {
            let col = advisor.choose_column(&state).unwrap();
            assert!(state.board().is_valid_move(col), "column {} is full", col);
        }
    }

    #[test]
    fn test_easy_covers_every_valid_column() {
        let state = GameState::initial();
        let mut advisor = MoveAdvisor::with_seed(Difficulty::Easy, 9);
        let mut seen = [false; 7];
        for _ in 0..500 {
            seen[advisor.choose_column(&state).unwrap()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_takes_immediate_win() {
        // Yellow holds (5,0), (5,1), (5,2); column 3 completes the row.
        let state = play(&[6, 0, 6, 1, 4, 2, 0]);
        assert_eq!(state.current_player(), Player::Yellow);
        for difficulty in [Difficulty::Medium, Difficulty::Hard] {
            for seed in 0..20 {
                let mut advisor = MoveAdvisor::with_seed(difficulty, seed);
                assert_eq!(advisor.choose_column(&state), Some(3));
            }
        }
    }

    #[test]
    fn test_blocks_opponent_win() {
        // Red threatens (5,3); Yellow has nothing to win with.
        let state = play(&[0, 6, 1, 6, 2]);
        assert_eq!(state.current_player(), Player::Yellow);
        for difficulty in [Difficulty::Medium, Difficulty::Hard] {
            for seed in 0..20 {
                let mut advisor = MoveAdvisor::with_seed(difficulty, seed);
                assert_eq!(advisor.choose_column(&state), Some(3));
            }
        }
    }

    #[test]
    fn test_win_takes_precedence_over_block() {
        // Red can win at column 3, Yellow threatens column 6.
        let state = play(&[0, 6, 1, 6, 2, 6]);
        assert_eq!(state.current_player(), Player::Red);
        for difficulty in [Difficulty::Medium, Difficulty::Hard] {
            let mut advisor = MoveAdvisor::with_seed(difficulty, 1);
            assert_eq!(advisor.choose_column(&state), Some(3));
        }
    }

    #[test]
    fn test_hard_prefers_centre() {
        let mut advisor = MoveAdvisor::with_seed(Difficulty::Hard, 0);
        assert_eq!(advisor.choose_column(&GameState::initial()), Some(3));

        let state = play(&[0, 6, 1, 5]);
        assert_eq!(advisor.choose_column(&state), Some(3));
    }

    #[test]
    fn test_hard_skips_column_that_hands_over_a_win() {
        // Centre is full. Yellow dropping in column 0 would let Red complete
        // row 3 on top of it, so column 1 is the first safe choice.
        let state = play(&[
            1, 3, 6, 3, 4, 0, 3, 2, 1, 3, 1, 3, 6, 1, 2, 3, 2, 6, 6,
        ]);
        assert_eq!(state.current_player(), Player::Yellow);
        assert!(!state.board().is_valid_move(3));
        assert_eq!(state.legal_actions(), vec![0, 1, 2, 4, 5, 6]);

        let mut advisor = MoveAdvisor::with_seed(Difficulty::Hard, 0);
        assert_eq!(advisor.choose_column(&state), Some(1));
    }

    #[test]
    fn test_hard_falls_back_to_first_valid_column() {
        let settings = GameSettings {
            rows: 4,
            cols: 4,
            win_length: 3,
        };
        // Every legal column lets Yellow complete row 2 on top of Red's piece.
        let state = play_with(settings, &[1, 1, 1, 2, 1, 2, 2, 2]);
        assert_eq!(state.current_player(), Player::Red);
        assert_eq!(state.legal_actions(), vec![0, 3]);

        for seed in 0..10 {
            let mut advisor = MoveAdvisor::with_seed(Difficulty::Hard, seed);
            assert_eq!(advisor.choose_column(&state), Some(0));
        }
    }

    #[test]
    fn test_medium_random_fallback_is_valid() {
        let state = play(&[3, 3, 2, 4]);
        let mut advisor = MoveAdvisor::with_seed(Difficulty::Medium, 3);
        for _ in 0..100 {
            let col = advisor.choose_column(&state).unwrap();
            assert!(state.board().is_valid_move(col));
        }
    }

    #[test]
    fn test_no_column_on_finished_game() {
        let mut state = GameState::initial();
        for col in [3, 0, 3, 1, 3, 2, 3] {
            state = state.advance_turn(col);
        }
        assert_eq!(advise_move(&state, Difficulty::Hard), None);
    }

    #[test]
    fn test_advise_move_uses_thread_rng() {
        let state = GameState::initial();
        for difficulty in [Difficulty::Easy, Difficulty::Medium] {
            let col = advise_move(&state, difficulty).unwrap();
            assert!(state.board().is_valid_move(col));
        }
        assert_eq!(advise_move(&state, Difficulty::Hard), Some(3));
    }

    #[test]
    fn test_easy_agents_play_full_game() {
        let mut red = MoveAdvisor::with_seed(Difficulty::Easy, 1);
        let mut yellow = MoveAdvisor::with_seed(Difficulty::Easy, 2);
        let mut state = GameState::initial();
        while !state.is_terminal() {
            let col = match state.current_player() {
                Player::Red => red.select_action(&state),
                Player::Yellow => yellow.select_action(&state),
            };
            state = state.try_advance_turn(col.unwrap()).unwrap();
        }

        assert!(state.outcome().is_some());
        assert_eq!(red.select_action(&state), None);
        assert_eq!(red.name(), "Easy");
    }

    #[test]
    fn test_hard_beats_random_more_often_than_not() {
        let mut hard_wins = 0;
        for seed in 0..20 {
            let mut hard = MoveAdvisor::with_seed(Difficulty::Hard, seed);
            let mut random = MoveAdvisor::with_seed(Difficulty::Easy, seed + 100);
            let mut state = GameState::initial();
            while !state.is_terminal() {
                let col = match state.current_player() {
                    Player::Red => hard.select_action(&state),
                    Player::Yellow => random.select_action(&state),
                };
                state = state.try_advance_turn(col.unwrap()).unwrap();
            }
            if state.winner() == Some(Player::Red) {
                hard_wins += 1;
            }
        }
        assert!(hard_wins > 10, "hard won only {} of 20", hard_wins);
    }
}
