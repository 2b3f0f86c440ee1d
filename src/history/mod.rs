//! Finished-game records and replay of their move lists.

mod record;
mod replay;

pub use record::{
    GameId, GameMode, GameRecord, GameWinner, MoveRecord, NewGameRecord, PlayerIdentity, Players,
};
pub use replay::{replay, Replay};
