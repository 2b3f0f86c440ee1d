use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use super::{GameStore, UserProfile};
use crate::error::StoreError;
use crate::history::{GameId, GameRecord, NewGameRecord};
use crate::streak::{StreakPolicy, StreakRecord};

/// In-process store. Also the working set behind [`super::JsonStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    policy: StreakPolicy,
    games: Vec<GameRecord>,
    streaks: HashMap<u64, StreakRecord>,
    users: HashMap<u64, UserProfile>,
}

impl MemoryStore {
    pub fn new(policy: StreakPolicy) -> Self {
        MemoryStore {
            policy,
            ..Default::default()
        }
    }

    pub(crate) fn from_parts(
        policy: StreakPolicy,
        mut games: Vec<GameRecord>,
        streaks: Vec<StreakRecord>,
        users: Vec<UserProfile>,
    ) -> Self {
        games.sort_by_key(|g| g.id);
        MemoryStore {
            policy,
            games,
            streaks: streaks.into_iter().map(|s| (s.fid, s)).collect(),
            users: users.into_iter().map(|u| (u.fid, u)).collect(),
        }
    }

    pub fn policy(&self) -> StreakPolicy {
        self.policy
    }

    pub(crate) fn next_id(&self) -> GameId {
        GameId(self.games.last().map_or(1, |g| g.id.0 + 1))
    }

    /// Append an already-numbered record. Ids must keep increasing.
    pub(crate) fn insert_game(&mut self, record: GameRecord) {
        debug_assert!(self.games.last().map_or(true, |g| g.id < record.id));
        self.games.push(record);
    }

    pub(crate) fn streak_record(&self, fid: u64) -> Option<&StreakRecord> {
        self.streaks.get(&fid)
    }

    pub(crate) fn streak_snapshot(&self) -> HashMap<u64, StreakRecord> {
        self.streaks.clone()
    }

    pub(crate) fn restore_streaks(&mut self, snapshot: HashMap<u64, StreakRecord>) {
        self.streaks = snapshot;
    }

    pub(crate) fn user_snapshot(&self) -> HashMap<u64, UserProfile> {
        self.users.clone()
    }

    pub(crate) fn restore_users(&mut self, snapshot: HashMap<u64, UserProfile>) {
        self.users = snapshot;
    }

    /// All streak records ordered by fid.
    pub(crate) fn streak_records(&self) -> Vec<StreakRecord> {
        let mut records: Vec<StreakRecord> = self.streaks.values().cloned().collect();
        records.sort_by_key(|r| r.fid);
        records
    }

    /// All profiles ordered by fid.
    pub(crate) fn user_records(&self) -> Vec<UserProfile> {
        let mut users: Vec<UserProfile> = self.users.values().cloned().collect();
        users.sort_by_key(|u| u.fid);
        users
    }
}

impl GameStore for MemoryStore {
    #[instrument(skip(self, game), fields(winner = ?game.winner, moves = game.moves.len()))]
    fn save_game(&mut self, game: NewGameRecord, now: DateTime<Utc>) -> Result<GameRecord, StoreError> {
        let record = GameRecord::from_new(self.next_id(), game, now);
        debug!(id = %record.id, "saved game");
        self.insert_game(record.clone());
        Ok(record)
    }

    fn game(&self, id: GameId) -> Result<Option<GameRecord>, StoreError> {
        Ok(self.games.iter().find(|g| g.id == id).cloned())
    }

    fn games_for_player(&self, fid: u64, limit: usize) -> Result<Vec<GameRecord>, StoreError> {
        let mut games: Vec<GameRecord> = self
            .games
            .iter()
            .filter(|g| g.involves(fid))
            .cloned()
            .collect();
        games.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        games.truncate(limit);
        Ok(games)
    }

    fn streak(&mut self, fid: u64, now: DateTime<Utc>) -> Result<Option<StreakRecord>, StoreError> {
        let Some(record) = self.streaks.get(&fid) else {
            return Ok(None);
        };
        if self.policy.is_expired(record, now) {
            let expired = self.policy.expire(record, now);
            debug!(fid, "streak lapsed");
            self.streaks.insert(fid, expired.clone());
            return Ok(Some(expired));
        }
        Ok(Some(record.clone()))
    }

    #[instrument(skip(self))]
    fn record_streak_result(
        &mut self,
        fid: u64,
        is_win: bool,
        now: DateTime<Utc>,
    ) -> Result<StreakRecord, StoreError> {
        let current = self
            .streaks
            .get(&fid)
            .cloned()
            .unwrap_or_else(|| StreakRecord::new(fid));
        let updated = self.policy.record_result(&current, is_win, now);
        debug!(
            current_streak = updated.current_streak,
            longest_streak = updated.longest_streak,
            "streak updated"
        );
        self.streaks.insert(fid, updated.clone());
        Ok(updated)
    }

    fn top_streaks(&self, limit: usize) -> Result<Vec<StreakRecord>, StoreError> {
        let mut records: Vec<StreakRecord> = self.streaks.values().cloned().collect();
        records.sort_by(|a, b| a.leaderboard_cmp(b).then(a.fid.cmp(&b.fid)));
        records.truncate(limit);
        Ok(records)
    }

    fn expire_streaks(&mut self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let policy = self.policy;
        let mut reset = 0;
        for record in self.streaks.values_mut() {
            if policy.is_expired(record, now) {
                *record = policy.expire(record, now);
                reset += 1;
            }
        }
        Ok(reset)
    }

    fn upsert_user(&mut self, profile: UserProfile, now: DateTime<Utc>) -> Result<UserProfile, StoreError> {
        let fid = profile.fid;
        let current = self
            .users
            .get(&fid)
            .cloned()
            .unwrap_or_else(|| UserProfile::new(fid));
        let merged = current.merged(profile, now);
        self.users.insert(fid, merged.clone());
        Ok(merged)
    }

    fn user(&self, fid: u64) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.get(&fid).cloned())
    }
}
