//! Computer opponents: the [`Agent`] trait and the three-tier [`MoveAdvisor`].

mod advisor;
mod agent;

pub use advisor::{advise_move, Difficulty, MoveAdvisor, ParseDifficultyError};
pub use agent::Agent;
