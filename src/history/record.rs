use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ai::Difficulty;
use crate::game::{GameSettings, GameState, GameStatus, Player};

/// Identifier assigned by a store when a game is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Local,
    Ai,
    Multiplayer,
}

/// Final result of a game as stored in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameWinner {
    Red,
    Yellow,
    Draw,
}

impl GameWinner {
    /// Result of a finished state, `None` while the game is still going.
    pub fn from_state(state: &GameState) -> Option<Self> {
        match (state.status(), state.winner()) {
            (GameStatus::Won, Some(player)) => Some(player.into()),
            (GameStatus::Draw, _) => Some(GameWinner::Draw),
            _ => None,
        }
    }

    pub fn player(self) -> Option<Player> {
        match self {
            GameWinner::Red => Some(Player::Red),
            GameWinner::Yellow => Some(Player::Yellow),
            GameWinner::Draw => None,
        }
    }
}

impl From<Player> for GameWinner {
    fn from(player: Player) -> Self {
        match player {
            Player::Red => GameWinner::Red,
            Player::Yellow => GameWinner::Yellow,
        }
    }
}

/// One accepted move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub column: usize,
    pub player: Player,
    pub timestamp: DateTime<Utc>,
}

/// Who sat in a seat. `fid` is the stable numeric identity from the identity
/// service; the computer opponent uses [`PlayerIdentity::COMPUTER_FID`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub fid: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl PlayerIdentity {
    pub const COMPUTER_FID: u64 = 0;

    pub fn new(fid: u64) -> Self {
        PlayerIdentity {
            fid,
            username: None,
            display_name: None,
            avatar: None,
        }
    }

    pub fn computer() -> Self {
        PlayerIdentity {
            username: Some("computer".to_string()),
            ..Self::new(Self::COMPUTER_FID)
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Best name for display: display name, then username, then fid.
    pub fn label(&self) -> String {
        self.display_name
            .clone()
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| format!("fid:{}", self.fid))
    }
}

/// Identities for both colours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    pub red: PlayerIdentity,
    pub yellow: PlayerIdentity,
}

impl Players {
    pub fn get(&self, player: Player) -> &PlayerIdentity {
        match player {
            Player::Red => &self.red,
            Player::Yellow => &self.yellow,
        }
    }

    /// Colour played by `fid`, Red first if both seats share it.
    pub fn colour_of(&self, fid: u64) -> Option<Player> {
        if self.red.fid == fid {
            Some(Player::Red)
        } else if self.yellow.fid == fid {
            Some(Player::Yellow)
        } else {
            None
        }
    }
}

/// A finished game before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGameRecord {
    pub mode: GameMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_difficulty: Option<Difficulty>,
    pub winner: GameWinner,
    pub players: Players,
    pub moves: Vec<MoveRecord>,
    pub duration_ms: u64,
    #[serde(default)]
    pub settings: GameSettings,
}

/// A stored game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: GameId,
    pub mode: GameMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_difficulty: Option<Difficulty>,
    pub winner: GameWinner,
    pub players: Players,
    pub moves: Vec<MoveRecord>,
    pub duration_ms: u64,
    #[serde(default)]
    pub settings: GameSettings,
    pub created_at: DateTime<Utc>,
}

impl GameRecord {
    pub fn from_new(id: GameId, game: NewGameRecord, created_at: DateTime<Utc>) -> Self {
        GameRecord {
            id,
            mode: game.mode,
            ai_difficulty: game.ai_difficulty,
            winner: game.winner,
            players: game.players,
            moves: game.moves,
            duration_ms: game.duration_ms,
            settings: game.settings,
            created_at,
        }
    }

    /// True if `fid` sat in either seat.
    pub fn involves(&self, fid: u64) -> bool {
        self.players.colour_of(fid).is_some()
    }

    /// Whether `fid` won this game; `None` if they did not play in it.
    pub fn won_by(&self, fid: u64) -> Option<bool> {
        let colour = self.players.colour_of(fid)?;
        Some(self.winner.player() == Some(colour))
    }
}
