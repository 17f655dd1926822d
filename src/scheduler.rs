//! Time-driven progression jobs: daily challenge assignment and the
//! midnight streak sweep. Both run over every known user, isolated per
//! user, and touch the rest of the system only through the shared
//! [`Database`] handle.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, Timelike};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::config::DAILY_CHALLENGE_TIME;
use crate::db::{users, Database};
use crate::engine::{daily, streak};

/// Per-run accounting for a sweep. Failures are counted, never raised.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub processed: usize,
    pub failed: usize,
}

pub struct Scheduler {
    db: Arc<Database>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db, handles: Vec::new() }
    }

    /// Spawns both job loops. Interactive handling continues untouched;
    /// the loops only wake at their scheduled local times.
    pub fn start(&mut self) -> Result<()> {
        let (hour, minute) = parse_time(DAILY_CHALLENGE_TIME)
            .context("Malformed DAILY_CHALLENGE_TIME, expected HH:MM")?;

        let db = Arc::clone(&self.db);
        self.handles.push(tokio::spawn(async move {
            loop {
                sleep_until_local(hour, minute, "daily challenges").await;
                let stats = run_daily_assignments(&db).await;
                log::info!(
                    "[daily challenges] Assigned for {} users ({} failed).",
                    stats.processed,
                    stats.failed
                );
            }
        }));

        let db = Arc::clone(&self.db);
        self.handles.push(tokio::spawn(async move {
            loop {
                sleep_until_local(0, 0, "streak sweep").await;
                let stats = run_streak_sweep(&db).await;
                log::info!(
                    "[streak sweep] Updated {} users ({} failed).",
                    stats.processed,
                    stats.failed
                );
            }
        }));

        log::info!("Scheduler started (daily challenges at {DAILY_CHALLENGE_TIME}, sweep at 00:00).");
        Ok(())
    }

    /// Stops the job loops. In-flight interactive operations are not
    /// affected; only the scheduled loops go away.
    pub fn shutdown(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        log::info!("Scheduler stopped.");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn parse_time(hhmm: &str) -> Option<(u32, u32)> {
    let (hour, minute) = hhmm.split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

async fn sleep_until_local(hour: u32, minute: u32, job: &str) {
    let now = Local::now();

    let now_minutes = now.hour() * 60 + now.minute();
    let target_minutes = hour * 60 + minute;

    // Minutes until the next occurrence of hh:mm, rolling into tomorrow
    // when the time has already passed today.
    let mins_to_wait = if target_minutes > now_minutes {
        target_minutes - now_minutes
    } else {
        24 * 60 - now_minutes + target_minutes
    };

    log::info!("[{job}] Next run in {mins_to_wait} minutes.");
    sleep(Duration::from_secs((mins_to_wait * 60) as u64)).await;
}

/// Assigns (or re-reads) today's challenge for every user. One user's
/// failure (usually an empty challenge tier) never stops the rest.
pub async fn run_daily_assignments(db: &Database) -> SweepStats {
    let user_ids = match users::all_user_ids(db) {
        Ok(ids) => ids,
        Err(err) => {
            log::error!("[run_daily_assignments] Could not list users: {err}");
            return SweepStats::default();
        }
    };

    let mut stats = SweepStats::default();
    for user_id in user_ids {
        match daily::get_or_assign_daily(db, user_id) {
            Ok(challenge) => {
                log::trace!(
                    "[run_daily_assignments] User {user_id} -> challenge #{}",
                    challenge.id
                );
                stats.processed += 1;
            }
            Err(err) => {
                log::warn!("[run_daily_assignments] Skipping user {user_id}: {err}");
                stats.failed += 1;
            }
        }

        // Keep the event loop breathing between users; the sweep holds no
        // lock across iterations.
        tokio::task::yield_now().await;
    }

    stats
}

/// Re-derives every user's streak against today's date, so streaks decay
/// for users who made no submission.
pub async fn run_streak_sweep(db: &Database) -> SweepStats {
    let user_ids = match users::all_user_ids(db) {
        Ok(ids) => ids,
        Err(err) => {
            log::error!("[run_streak_sweep] Could not list users: {err}");
            return SweepStats::default();
        }
    };

    let mut stats = SweepStats::default();
    for user_id in user_ids {
        match streak::update_streak(db, user_id) {
            Ok(_) => stats.processed += 1,
            Err(err) => {
                log::warn!("[run_streak_sweep] Skipping user {user_id}: {err}");
                stats.failed += 1;
            }
        }

        tokio::task::yield_now().await;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::challenges;
    use crate::models::Difficulty::Easy;

    #[test]
    fn time_spec_parsing() {
        assert_eq!(parse_time("09:00"), Some((9, 0)));
        assert_eq!(parse_time("23:59"), Some((23, 59)));
        assert_eq!(parse_time("24:00"), None);
        assert_eq!(parse_time("nine"), None);
    }

    #[tokio::test]
    async fn assignment_job_isolates_per_user_failures() {
        let db = Database::open_in_memory().unwrap();
        users::insert_user(&db, 1, "ada").unwrap();
        users::insert_user(&db, 2, "lin").unwrap();

        // No challenges at all: every user fails, nothing aborts.
        let stats = run_daily_assignments(&db).await;
        assert_eq!(stats, SweepStats { processed: 0, failed: 2 });

        // Add content and the same job succeeds for everyone.
        challenges::insert_challenge(&db, &challenges::sample(Easy, "python", 10)).unwrap();
        let stats = run_daily_assignments(&db).await;
        assert_eq!(stats, SweepStats { processed: 2, failed: 0 });
    }

    #[tokio::test]
    async fn streak_sweep_covers_all_users() {
        let db = Database::open_in_memory().unwrap();
        for id in 1..=5 {
            users::insert_user(&db, id, "user").unwrap();
        }

        let stats = run_streak_sweep(&db).await;
        assert_eq!(stats, SweepStats { processed: 5, failed: 0 });

        // Users created today keep their streak: the sweep is idempotent
        // alongside same-day interactive updates.
        for id in 1..=5 {
            assert_eq!(users::query_user(&db, id).unwrap().unwrap().streak, 0);
        }
    }
}
