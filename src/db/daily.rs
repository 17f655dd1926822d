use rusqlite::named_params;

use crate::db::{self, Database, DbResult};
use crate::models::{Challenge, DailyAssignment};

/////*============== DAILY ASSIGNMENT QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for DailyAssignment {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            user_id: row.get("user_id")?,
            challenge_id: row.get("challenge_id")?,
            assigned_date: row.get("assigned_date")?,
            completed: row.get("completed")?,
        })
    }
}

/// The challenge assigned to `user_id` on `date`, if one was recorded.
pub fn query_daily_challenge(
    db: &Database,
    user_id: i64,
    date: &str,
) -> DbResult<Option<Challenge>> {
    db.conn()
        .prepare(
            "SELECT c.* FROM challenges c
             JOIN user_daily_challenges udc ON c.id = udc.challenge_id
             WHERE udc.user_id = :user_id AND udc.assigned_date = :date",
        )?
        .query(named_params! { ":user_id": user_id, ":date": date })?
        .next()?
        .map(|row| row.try_into())
        .transpose()
}

/// The raw assignment row, completion flag included.
pub fn query_daily(db: &Database, user_id: i64, date: &str) -> DbResult<Option<DailyAssignment>> {
    db.conn()
        .prepare(
            "SELECT * FROM user_daily_challenges
             WHERE user_id = :user_id AND assigned_date = :date",
        )?
        .query(named_params! { ":user_id": user_id, ":date": date })?
        .next()?
        .map(|row| row.try_into())
        .transpose()
}

/// Records the day's pick for a user. First write wins: a concurrent insert
/// for the same (user, date) is ignored by the UNIQUE key.
/// Returns `true` if this call's pick was the one stored.
pub fn assign_daily(db: &Database, user_id: i64, challenge_id: i64, date: &str) -> DbResult<bool> {
    log::trace!("[assign_daily] Assigning challenge {challenge_id} to user {user_id} on {date}");

    db.conn()
        .prepare(
            "INSERT OR IGNORE INTO user_daily_challenges (user_id, challenge_id, assigned_date)
             VALUES (:user_id, :challenge_id, :date)",
        )?
        .execute(named_params! {
            ":user_id": user_id,
            ":challenge_id": challenge_id,
            ":date": date,
        })
        .map(|changed| changed > 0)
}

/// Flags today's assignment as done once a completed submission matches it.
pub fn mark_completed(db: &Database, user_id: i64, challenge_id: i64) -> DbResult<bool> {
    let updated = db
        .conn()
        .prepare(
            "UPDATE user_daily_challenges SET completed = 1
             WHERE user_id = :user_id
               AND challenge_id = :challenge_id
               AND assigned_date = :date",
        )?
        .execute(named_params! {
            ":user_id": user_id,
            ":challenge_id": challenge_id,
            ":date": db::today_string(),
        })?;

    Ok(updated > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::challenges;
    use crate::db::users;
    use crate::models::Difficulty::Easy;

    #[test]
    fn first_write_wins() {
        let db = Database::open_in_memory().unwrap();
        users::insert_user(&db, 1, "ada").unwrap();
        let first = challenges::insert_challenge(&db, &challenges::sample(Easy, "python", 10)).unwrap();
        let second = challenges::insert_challenge(&db, &challenges::sample(Easy, "python", 10)).unwrap();

        assert!(assign_daily(&db, 1, first, "2026-08-07").unwrap());
        // A racing writer's pick is dropped, not layered on top.
        assert!(!assign_daily(&db, 1, second, "2026-08-07").unwrap());

        let stored = query_daily_challenge(&db, 1, "2026-08-07").unwrap().unwrap();
        assert_eq!(stored.id, first);
    }

    #[test]
    fn assignments_are_per_date() {
        let db = Database::open_in_memory().unwrap();
        users::insert_user(&db, 1, "ada").unwrap();
        let ch = challenges::insert_challenge(&db, &challenges::sample(Easy, "python", 10)).unwrap();

        assert!(assign_daily(&db, 1, ch, "2026-08-07").unwrap());
        assert!(assign_daily(&db, 1, ch, "2026-08-08").unwrap());
        assert!(query_daily_challenge(&db, 1, "2026-08-09").unwrap().is_none());
    }
}
