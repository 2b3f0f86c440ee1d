use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::{GameStore, MemoryStore, UserProfile};
use crate::error::StoreError;
use crate::history::{GameId, GameRecord, NewGameRecord};
use crate::streak::{StreakPolicy, StreakRecord};

const GAMES_DIR: &str = "games";
const STREAKS_FILE: &str = "streaks.json";
const USERS_FILE: &str = "users.json";

/// Directory-backed store.
///
/// Layout:
/// ```text
/// <dir>/games/00000001.json
/// <dir>/streaks.json
/// <dir>/users.json
/// ```
/// Everything is loaded on open and each mutation rewrites the file it
/// touched through a `.tmp` sibling and a rename.
#[derive(Debug)]
pub struct JsonStore {
    dir: PathBuf,
    inner: MemoryStore,
}

impl JsonStore {
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn open(dir: impl AsRef<Path>, policy: StreakPolicy) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        let games_dir = dir.join(GAMES_DIR);
        fs::create_dir_all(&games_dir)?;

        let mut games = Vec::new();
        for entry in fs::read_dir(&games_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                games.push(read_json::<GameRecord>(&path)?);
            }
        }
        let streaks: Vec<StreakRecord> = read_json_or_default(&dir.join(STREAKS_FILE))?;
        let users: Vec<UserProfile> = read_json_or_default(&dir.join(USERS_FILE))?;

        info!(
            games = games.len(),
            streaks = streaks.len(),
            users = users.len(),
            "opened store"
        );
        Ok(JsonStore {
            inner: MemoryStore::from_parts(policy, games, streaks, users),
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn game_path(&self, id: GameId) -> PathBuf {
        self.dir.join(GAMES_DIR).join(format!("{:08}.json", id.0))
    }

    /// Persist the streak set, or put `snapshot` back if the write fails.
    fn write_streaks(&mut self, snapshot: HashMap<u64, StreakRecord>) -> Result<(), StoreError> {
        let written = write_json(&self.dir.join(STREAKS_FILE), &self.inner.streak_records());
        if written.is_err() {
            warn!("streak write failed, keeping previous records");
            self.inner.restore_streaks(snapshot);
        }
        written
    }

    /// Persist the profiles, or put `snapshot` back if the write fails.
    fn write_users(&mut self, snapshot: HashMap<u64, UserProfile>) -> Result<(), StoreError> {
        let written = write_json(&self.dir.join(USERS_FILE), &self.inner.user_records());
        if written.is_err() {
            warn!("profile write failed, keeping previous records");
            self.inner.restore_users(snapshot);
        }
        written
    }
}

impl GameStore for JsonStore {
    #[instrument(skip(self, game), fields(winner = ?game.winner))]
    fn save_game(&mut self, game: NewGameRecord, now: DateTime<Utc>) -> Result<GameRecord, StoreError> {
        let record = GameRecord::from_new(self.inner.next_id(), game, now);
        let path = self.game_path(record.id);
        write_json(&path, &record)?;
        debug!(id = %record.id, path = %path.display(), "wrote game");
        self.inner.insert_game(record.clone());
        Ok(record)
    }

    fn game(&self, id: GameId) -> Result<Option<GameRecord>, StoreError> {
        self.inner.game(id)
    }

    fn games_for_player(&self, fid: u64, limit: usize) -> Result<Vec<GameRecord>, StoreError> {
        self.inner.games_for_player(fid, limit)
    }

    fn streak(&mut self, fid: u64, now: DateTime<Utc>) -> Result<Option<StreakRecord>, StoreError> {
        let lapsed = self
            .inner
            .streak_record(fid)
            .is_some_and(|r| self.inner.policy().is_expired(r, now));
        if !lapsed {
            return self.inner.streak(fid, now);
        }
        let snapshot = self.inner.streak_snapshot();
        let record = self.inner.streak(fid, now)?;
        self.write_streaks(snapshot)?;
        Ok(record)
    }

    fn record_streak_result(
        &mut self,
        fid: u64,
        is_win: bool,
        now: DateTime<Utc>,
    ) -> Result<StreakRecord, StoreError> {
        let snapshot = self.inner.streak_snapshot();
        let record = self.inner.record_streak_result(fid, is_win, now)?;
        self.write_streaks(snapshot)?;
        Ok(record)
    }

    fn top_streaks(&self, limit: usize) -> Result<Vec<StreakRecord>, StoreError> {
        self.inner.top_streaks(limit)
    }

    #[instrument(skip(self))]
    fn expire_streaks(&mut self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let snapshot = self.inner.streak_snapshot();
        let reset = self.inner.expire_streaks(now)?;
        if reset > 0 {
            self.write_streaks(snapshot)?;
        }
        info!(reset, "expired streaks");
        Ok(reset)
    }

    fn upsert_user(&mut self, profile: UserProfile, now: DateTime<Utc>) -> Result<UserProfile, StoreError> {
        let snapshot = self.inner.user_snapshot();
        let merged = self.inner.upsert_user(profile, now)?;
        self.write_users(snapshot)?;
        Ok(merged)
    }

    fn user(&self, fid: u64) -> Result<Option<UserProfile>, StoreError> {
        self.inner.user(fid)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let json = fs::read_to_string(path).map_err(|e| StoreError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    if !path.exists() {
        return Ok(T::default());
    }
    read_json(path)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
