//! Win-streak bookkeeping with a rolling grace window.
//!
//! A win within the window of the previous win extends the streak; a later
//! win starts a new one at 1. Losses and draws never reset the streak on
//! their own: it only drops to 0 once the window passes without a win.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Per-identity streak counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub fid: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_wins: u32,
    pub total_games: u32,
    pub last_win_at: Option<DateTime<Utc>>,
    pub streak_started_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StreakRecord {
    pub fn new(fid: u64) -> Self {
        StreakRecord {
            fid,
            current_streak: 0,
            longest_streak: 0,
            total_wins: 0,
            total_games: 0,
            last_win_at: None,
            streak_started_at: None,
            updated_at: None,
        }
    }

    /// Wins as a whole-number percentage of games, 0 with no games.
    pub fn win_rate(&self) -> u32 {
        if self.total_games == 0 {
            return 0;
        }
        (f64::from(self.total_wins) * 100.0 / f64::from(self.total_games)).round() as u32
    }

    /// Leaderboard order: current streak, then longest streak, both descending.
    pub fn leaderboard_cmp(&self, other: &Self) -> Ordering {
        other
            .current_streak
            .cmp(&self.current_streak)
            .then_with(|| other.longest_streak.cmp(&self.longest_streak))
    }
}

/// The rolling-window rule applied to [`StreakRecord`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakPolicy {
    window: Duration,
}

impl StreakPolicy {
    pub fn new(window: Duration) -> Self {
        StreakPolicy { window }
    }

    pub fn from_hours(hours: u32) -> Self {
        Self::new(Duration::hours(i64::from(hours)))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one finished game for `record`.
    pub fn record_result(&self, record: &StreakRecord, is_win: bool, now: DateTime<Utc>) -> StreakRecord {
        let mut next = record.clone();
        next.total_games += 1;
        next.updated_at = Some(now);

        if !is_win {
            return next;
        }

        next.total_wins += 1;
        if self.within_window(record.last_win_at, now) && record.current_streak > 0 {
            next.current_streak += 1;
        } else {
            next.current_streak = 1;
            next.streak_started_at = Some(now);
        }
        next.last_win_at = Some(now);
        next.longest_streak = next.longest_streak.max(next.current_streak);
        next
    }

    /// Reset the current streak if the last win is older than the window.
    pub fn expire(&self, record: &StreakRecord, now: DateTime<Utc>) -> StreakRecord {
        if !self.is_expired(record, now) {
            return record.clone();
        }
        StreakRecord {
            current_streak: 0,
            streak_started_at: None,
            updated_at: Some(now),
            ..record.clone()
        }
    }

    pub fn is_expired(&self, record: &StreakRecord, now: DateTime<Utc>) -> bool {
        record.current_streak > 0 && !self.within_window(record.last_win_at, now)
    }

    fn within_window(&self, last_win_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        last_win_at.is_some_and(|last| now - last <= self.window)
    }
}

impl Default for StreakPolicy {
    fn default() -> Self {
        Self::from_hours(24)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_first_win_starts_streak() {
        let policy = StreakPolicy::default();
        let record = policy.record_result(&StreakRecord::new(1), true, t0());
        assert_eq!(record.current_streak, 1);
        assert_eq!(record.longest_streak, 1);
        assert_eq!(record.total_wins, 1);
        assert_eq!(record.total_games, 1);
        assert_eq!(record.last_win_at, Some(t0()));
        assert_eq!(record.streak_started_at, Some(t0()));
    }

    #[test]
    fn test_win_within_window_extends_streak() {
        let policy = StreakPolicy::default();
        let mut record = StreakRecord::new(1);
        record = policy.record_result(&record, true, t0());
        record = policy.record_result(&record, true, t0() + Duration::hours(23));
        record = policy.record_result(&record, true, t0() + Duration::hours(40));
        assert_eq!(record.current_streak, 3);
        assert_eq!(record.longest_streak, 3);
        assert_eq!(record.streak_started_at, Some(t0()));
    }

    #[test]
    fn test_win_after_window_restarts_streak() {
        let policy = StreakPolicy::default();
        let mut record = StreakRecord::new(1);
        record = policy.record_result(&record, true, t0());
        record = policy.record_result(&record, true, t0() + Duration::hours(1));
        let later = t0() + Duration::hours(30);
        record = policy.record_result(&record, true, later);
        assert_eq!(record.current_streak, 1);
        assert_eq!(record.longest_streak, 2);
        assert_eq!(record.streak_started_at, Some(later));
    }

    #[test]
    fn test_loss_keeps_streak() {
        let policy = StreakPolicy::default();
        let mut record = StreakRecord::new(1);
        record = policy.record_result(&record, true, t0());
        record = policy.record_result(&record, false, t0() + Duration::hours(2));
        assert_eq!(record.current_streak, 1);
        assert_eq!(record.total_games, 2);
        assert_eq!(record.total_wins, 1);
        assert_eq!(record.last_win_at, Some(t0()));
    }

    #[test]
    fn test_expire_after_window() {
        let policy = StreakPolicy::default();
        let record = policy.record_result(&StreakRecord::new(1), true, t0());

        let fresh = policy.expire(&record, t0() + Duration::hours(24));
        assert_eq!(fresh, record);

        let later = t0() + Duration::hours(25);
        let expired = policy.expire(&record, later);
        assert_eq!(expired.current_streak, 0);
        assert_eq!(expired.streak_started_at, None);
        assert_eq!(expired.longest_streak, 1);
        assert_eq!(expired.last_win_at, Some(t0()));
        assert_eq!(expired.updated_at, Some(later));
    }

    #[test]
    fn test_win_after_expiry_starts_at_one() {
        let policy = StreakPolicy::default();
        let mut record = policy.record_result(&StreakRecord::new(1), true, t0());
        record = policy.expire(&record, t0() + Duration::hours(26));
        record = policy.record_result(&record, true, t0() + Duration::hours(27));
        assert_eq!(record.current_streak, 1);
    }

    #[test]
    fn test_custom_window() {
        let policy = StreakPolicy::from_hours(1);
        let mut record = policy.record_result(&StreakRecord::new(1), true, t0());
        record = policy.record_result(&record, true, t0() + Duration::minutes(90));
        assert_eq!(record.current_streak, 1);
    }

    #[test]
    fn test_win_rate() {
        let mut record = StreakRecord::new(1);
        assert_eq!(record.win_rate(), 0);
        record.total_games = 3;
        record.total_wins = 2;
        assert_eq!(record.win_rate(), 67);
    }

    #[test]
    fn test_leaderboard_order() {
        let mut a = StreakRecord::new(1);
        a.current_streak = 3;
        a.longest_streak = 3;
        let mut b = StreakRecord::new(2);
        b.current_streak = 3;
        b.longest_streak = 7;
        let mut c = StreakRecord::new(3);
        c.current_streak = 5;

        let mut records = vec![a, b, c];
        records.sort_by(StreakRecord::leaderboard_cmp);
        let order: Vec<u64> = records.iter().map(|r| r.fid).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }
}
