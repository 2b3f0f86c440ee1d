//! One game from first move to stored record.
//!
//! A [`GameSession`] owns the [`GameState`], knows which seats are human and
//! which belong to the computer, and timestamps every accepted move so the
//! finished game can be written to a [`GameStore`].

use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::ai::{Agent, Difficulty, MoveAdvisor};
use crate::error::SessionError;
use crate::game::{GameSettings, GameState, Player};
use crate::history::{GameMode, GameRecord, GameWinner, MoveRecord, NewGameRecord, PlayerIdentity, Players};
use crate::store::GameStore;

/// Who controls a colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seat {
    Human(PlayerIdentity),
    Computer,
}

impl Seat {
    pub fn identity(&self) -> PlayerIdentity {
        match self {
            Seat::Human(identity) => identity.clone(),
            Seat::Computer => PlayerIdentity::computer(),
        }
    }

    pub fn is_computer(&self) -> bool {
        matches!(self, Seat::Computer)
    }
}

pub struct GameSession {
    state: GameState,
    red: Seat,
    yellow: Seat,
    difficulty: Difficulty,
    computer: Box<dyn Agent>,
    think_delay: Duration,
    moves: Vec<MoveRecord>,
    started_at: DateTime<Utc>,
    /// Set once the store has accepted the finished game.
    saved: Option<GameRecord>,
    /// Fids whose streak already counts this game.
    streaks_recorded: Vec<u64>,
}

impl GameSession {
    pub fn new(
        settings: GameSettings,
        red: Seat,
        yellow: Seat,
        difficulty: Difficulty,
        think_delay: Duration,
    ) -> Self {
        GameSession {
            state: GameState::new(settings),
            red,
            yellow,
            difficulty,
            computer: Box::new(MoveAdvisor::new(difficulty)),
            think_delay,
            moves: Vec::new(),
            started_at: Utc::now(),
            saved: None,
            streaks_recorded: Vec::new(),
        }
    }

    /// Replace the computer's move source, e.g. with a seeded advisor.
    pub fn with_agent(mut self, agent: impl Agent + 'static) -> Self {
        self.computer = Box::new(agent);
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    pub fn seat(&self, player: Player) -> &Seat {
        match player {
            Player::Red => &self.red,
            Player::Yellow => &self.yellow,
        }
    }

    pub fn mode(&self) -> GameMode {
        if self.red.is_computer() || self.yellow.is_computer() {
            GameMode::Ai
        } else {
            GameMode::Local
        }
    }

    pub fn is_computer_turn(&self) -> bool {
        !self.state.is_terminal() && self.seat(self.state.current_player()).is_computer()
    }

    /// Play `column` for the human whose turn it is. Returns whether the
    /// move was accepted.
    pub fn play(&mut self, column: usize) -> bool {
        if self.is_computer_turn() {
            debug!(column, "ignoring human move on the computer's turn");
            return false;
        }
        self.apply(column)
    }

    /// Let the computer move if it is its turn. Returns the column played.
    #[instrument(skip(self), fields(difficulty = %self.difficulty))]
    pub fn computer_turn(&mut self) -> Option<usize> {
        if !self.is_computer_turn() {
            return None;
        }
        if !self.think_delay.is_zero() {
            thread::sleep(self.think_delay);
        }
        let column = self.computer.select_action(&self.state)?;
        debug!(column, agent = self.computer.name(), "computer chose column");
        self.apply(column).then_some(column)
    }

    fn apply(&mut self, column: usize) -> bool {
        let player = self.state.current_player();
        match self.state.try_advance_turn(column) {
            Ok(next) => {
                self.state = next;
                self.moves.push(MoveRecord {
                    column,
                    player,
                    timestamp: Utc::now(),
                });
                true
            }
            Err(err) => {
                debug!(column, %err, "move rejected");
                false
            }
        }
    }

    /// The stored record, once [`GameSession::finish`] has saved it.
    pub fn saved(&self) -> Option<&GameRecord> {
        self.saved.as_ref()
    }

    /// Each distinct human fid with whether one of its seats won.
    fn human_results(&self, winner: GameWinner) -> Vec<(u64, bool)> {
        let mut results: Vec<(u64, bool)> = Vec::new();
        for player in [Player::Red, Player::Yellow] {
            let Seat::Human(identity) = self.seat(player) else {
                continue;
            };
            let won = winner.player() == Some(player);
            match results.iter_mut().find(|(fid, _)| *fid == identity.fid) {
                Some((_, is_win)) => *is_win |= won,
                None => results.push((identity.fid, won)),
            }
        }
        results
    }

    /// Store the finished game and update the streak of every human fid.
    ///
    /// Repeat calls return the stored record without saving it again, and a
    /// call after a partial failure only performs the steps still missing.
    #[instrument(skip(self, store), fields(moves = self.moves.len()))]
    pub fn finish<S: GameStore + ?Sized>(
        &mut self,
        store: &mut S,
        now: DateTime<Utc>,
    ) -> Result<GameRecord, SessionError> {
        let winner = GameWinner::from_state(&self.state).ok_or(SessionError::NotFinished)?;

        let saved = match &self.saved {
            Some(record) => record.clone(),
            None => {
                let record = NewGameRecord {
                    mode: self.mode(),
                    ai_difficulty: (self.mode() == GameMode::Ai).then_some(self.difficulty),
                    winner,
                    players: Players {
                        red: self.red.identity(),
                        yellow: self.yellow.identity(),
                    },
                    moves: self.moves.clone(),
                    duration_ms: (now - self.started_at).num_milliseconds().max(0) as u64,
                    settings: self.state.settings(),
                };
                let saved = store.save_game(record, now).inspect_err(|err| {
                    warn!(%err, "failed to save game");
                })?;
                self.saved = Some(saved.clone());
                saved
            }
        };

        for (fid, is_win) in self.human_results(winner) {
            if self.streaks_recorded.contains(&fid) {
                continue;
            }
            store
                .record_streak_result(fid, is_win, now)
                .inspect_err(|err| warn!(fid, %err, "failed to update streak"))?;
            self.streaks_recorded.push(fid);
        }

        info!(id = %saved.id, ?winner, "game finished");
        Ok(saved)
    }
}
