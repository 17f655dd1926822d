use anyhow::{Context, Result};
use rand::seq::IndexedRandom;

use crate::db::{self, challenges, daily, users, Database};
use crate::models::{Challenge, Difficulty};

/// Raised when the tier a user's level maps to has no challenges at all.
/// Callers distinguish this from storage failure to report it as a content
/// gap, not an outage.
#[derive(Debug)]
pub struct NoEligibleChallenge {
    pub difficulty: Difficulty,
}

impl std::fmt::Display for NoEligibleChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No {} challenge is available to assign", self.difficulty)
    }
}

impl std::error::Error for NoEligibleChallenge {}

/// Difficulty tier a user's level maps to.
pub fn tier_for_level(level: i64) -> Difficulty {
    if level <= 3 {
        Difficulty::Easy
    } else if level <= 7 {
        Difficulty::Medium
    } else {
        Difficulty::Hard
    }
}

/// Returns today's challenge for the user, drawing and recording one if no
/// pick exists yet.
///
/// Calling this twice on the same day returns the same challenge; under a
/// race, the storage layer keeps the first write and both callers get the
/// surviving row.
pub fn get_or_assign_daily(db: &Database, user_id: i64) -> Result<Challenge> {
    get_or_assign_daily_on(db, user_id, &db::today_string())
}

pub(crate) fn get_or_assign_daily_on(db: &Database, user_id: i64, date: &str) -> Result<Challenge> {
    if let Some(existing) = daily::query_daily_challenge(db, user_id, date)? {
        return Ok(existing);
    }

    let user = users::query_user(db, user_id)?
        .with_context(|| format!("No such user: {user_id}"))?;
    let difficulty = tier_for_level(user.level);

    let pool = challenges::query_by_difficulty(db, difficulty, None)?;
    let pick = pool
        .choose(&mut rand::rng())
        .ok_or(NoEligibleChallenge { difficulty })?;

    daily::assign_daily(db, user_id, pick.id, date)?;

    // Return whatever the storage layer kept; under a race that may be a
    // concurrent caller's pick rather than ours.
    daily::query_daily_challenge(db, user_id, date)?
        .with_context(|| format!("Daily assignment for user {user_id} vanished after insert"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::UserPatch;
    use crate::models::Difficulty::{Easy, Hard, Medium};

    #[test]
    fn tier_mapping() {
        assert_eq!(tier_for_level(1), Easy);
        assert_eq!(tier_for_level(3), Easy);
        assert_eq!(tier_for_level(4), Medium);
        assert_eq!(tier_for_level(7), Medium);
        assert_eq!(tier_for_level(8), Hard);
        assert_eq!(tier_for_level(40), Hard);
    }

    #[test]
    fn assignment_is_idempotent_per_day() {
        let db = Database::open_in_memory().unwrap();
        users::insert_user(&db, 1, "ada").unwrap();
        for _ in 0..4 {
            challenges::insert_challenge(&db, &challenges::sample(Easy, "python", 10)).unwrap();
        }

        let first = get_or_assign_daily_on(&db, 1, "2026-08-07").unwrap();
        for _ in 0..5 {
            let again = get_or_assign_daily_on(&db, 1, "2026-08-07").unwrap();
            assert_eq!(again.id, first.id);
        }

        // Exactly one stored row backs all those calls.
        let row = daily::query_daily(&db, 1, "2026-08-07").unwrap().unwrap();
        assert_eq!(row.challenge_id, first.id);
    }

    #[test]
    fn draw_follows_the_level_tier() {
        let db = Database::open_in_memory().unwrap();
        users::insert_user(&db, 1, "ada").unwrap();
        users::patch_user(&db, 1, &UserPatch { level: Some(9), ..UserPatch::default() }).unwrap();

        challenges::insert_challenge(&db, &challenges::sample(Easy, "python", 10)).unwrap();
        let hard = challenges::insert_challenge(&db, &challenges::sample(Hard, "python", 50)).unwrap();

        let assigned = get_or_assign_daily_on(&db, 1, "2026-08-07").unwrap();
        assert_eq!(assigned.id, hard);
    }

    #[test]
    fn empty_tier_is_a_typed_error() {
        let db = Database::open_in_memory().unwrap();
        users::insert_user(&db, 1, "ada").unwrap();
        challenges::insert_challenge(&db, &challenges::sample(Hard, "python", 50)).unwrap();

        let err = get_or_assign_daily_on(&db, 1, "2026-08-07").unwrap_err();
        let gap = err.downcast_ref::<NoEligibleChallenge>().expect("typed error");
        assert_eq!(gap.difficulty, Easy);
    }
}
