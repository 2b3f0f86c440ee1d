//! Persistence for finished games, streak counters and user profiles.
//!
//! [`GameStore`] is the seam; [`MemoryStore`] keeps everything in process and
//! [`JsonStore`] mirrors it into a directory of JSON files.

mod json;
mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::history::{GameId, GameRecord, NewGameRecord};
use crate::streak::StreakRecord;

pub use json::JsonStore;
pub use memory::MemoryStore;

/// Profile data known about an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub fid: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_address: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn new(fid: u64) -> Self {
        UserProfile {
            fid,
            username: None,
            display_name: None,
            avatar: None,
            primary_address: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Fields set in `update` win; unset ones keep the current value.
    pub(crate) fn merged(&self, update: UserProfile, now: DateTime<Utc>) -> UserProfile {
        UserProfile {
            fid: self.fid,
            username: update.username.or_else(|| self.username.clone()),
            display_name: update.display_name.or_else(|| self.display_name.clone()),
            avatar: update.avatar.or_else(|| self.avatar.clone()),
            primary_address: update
                .primary_address
                .or_else(|| self.primary_address.clone()),
            created_at: self.created_at.or(Some(now)),
            updated_at: Some(now),
        }
    }
}

/// Storage operations the game needs. `now` is passed in so the streak
/// window is evaluated against a caller-controlled clock.
pub trait GameStore {
    /// Store a finished game and return it with its assigned id.
    fn save_game(&mut self, game: NewGameRecord, now: DateTime<Utc>) -> Result<GameRecord, StoreError>;

    fn game(&self, id: GameId) -> Result<Option<GameRecord>, StoreError>;

    /// Games `fid` took part in, newest first.
    fn games_for_player(&self, fid: u64, limit: usize) -> Result<Vec<GameRecord>, StoreError>;

    /// Streak for `fid`, resetting and persisting it first if it has lapsed.
    fn streak(&mut self, fid: u64, now: DateTime<Utc>) -> Result<Option<StreakRecord>, StoreError>;

    /// Count a finished game toward `fid`'s streak.
    fn record_streak_result(
        &mut self,
        fid: u64,
        is_win: bool,
        now: DateTime<Utc>,
    ) -> Result<StreakRecord, StoreError>;

    /// Best streaks by current then longest streak.
    fn top_streaks(&self, limit: usize) -> Result<Vec<StreakRecord>, StoreError>;

    /// Reset every lapsed streak. Returns how many were reset.
    fn expire_streaks(&mut self, now: DateTime<Utc>) -> Result<usize, StoreError>;

    fn upsert_user(&mut self, profile: UserProfile, now: DateTime<Utc>) -> Result<UserProfile, StoreError>;

    fn user(&self, fid: u64) -> Result<Option<UserProfile>, StoreError>;
}
