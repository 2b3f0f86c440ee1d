//! # Connect Four with streaks
//!
//! Connect Four rules, a three-tier computer opponent, and bookkeeping for
//! finished games and rolling win streaks.
//!
//! ## Modules
//!
//! - [`game`]: Board, player and the immutable game state machine
//! - [`ai`]: Agent trait and the easy/medium/hard move advisor
//! - [`history`]: Finished-game records and replay
//! - [`streak`]: Win-streak counters with a rolling window
//! - [`store`]: Game, streak and profile persistence (memory and JSON files)
//! - [`session`]: One game between human and computer seats
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: Structured error types

pub mod ai;
pub mod config;
pub mod error;
pub mod game;
pub mod history;
pub mod session;
pub mod store;
pub mod streak;
