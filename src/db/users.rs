use rusqlite::named_params;

use crate::config::LEVEL_UP_THRESHOLD;
use crate::db::{self, Database, DbResult};
use crate::models::User;

/////*============== USER QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for User {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            user_id: row.get("user_id")?,
            username: row.get::<_, Option<String>>("username")?.unwrap_or_default(),
            rating: row.get("rating")?,
            level: row.get("level")?,
            total_challenges: row.get("total_challenges")?,
            completed_challenges: row.get("completed_challenges")?,
            streak: row.get("streak")?,
            last_active: row.get("last_active")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// The only user fields interactive flows may overwrite. `last_active` is
/// refreshed on every patch, whether or not any field is set.
#[derive(Debug, Default, Clone)]
pub struct UserPatch {
    pub rating: Option<i64>,
    pub level: Option<i64>,
    pub total_challenges: Option<i64>,
    pub completed_challenges: Option<i64>,
    pub streak: Option<i64>,
}

/// Returns the user with id `user_id`, if they exist.
pub fn query_user(db: &Database, user_id: i64) -> DbResult<Option<User>> {
    db.conn()
        .prepare("SELECT * FROM users WHERE user_id = :user_id")?
        .query(named_params! { ":user_id": user_id })?
        .next()?
        .map(|row| row.try_into())
        .transpose()
}

/// Registers a user on first contact, doing nothing if they're already there.
/// Returns `true` if the row was newly added.
pub fn insert_user(db: &Database, user_id: i64, username: &str) -> DbResult<bool> {
    log::trace!("[insert_user] Inserting user {user_id} into users...");

    let inserted = db
        .conn()
        .prepare(
            "INSERT OR IGNORE INTO users (user_id, username, last_active)
             VALUES (:user_id, :username, :last_active)",
        )?
        .execute(named_params! {
            ":user_id": user_id,
            ":username": username,
            ":last_active": db::now_timestamp(),
        })?;

    if inserted > 0 {
        log::info!("User {user_id} ({username}) has been added to the database.");
    }

    Ok(inserted > 0)
}

/// Applies a patch in a single UPDATE. Unset fields keep their value.
pub fn patch_user(db: &Database, user_id: i64, patch: &UserPatch) -> DbResult<()> {
    log::trace!("[patch_user] Patching user {user_id}: {patch:?}");

    db.conn()
        .prepare(
            "UPDATE users SET
                rating               = COALESCE(:rating, rating),
                level                = COALESCE(:level, level),
                total_challenges     = COALESCE(:total_challenges, total_challenges),
                completed_challenges = COALESCE(:completed_challenges, completed_challenges),
                streak               = COALESCE(:streak, streak),
                last_active          = :last_active
             WHERE user_id = :user_id",
        )?
        .execute(named_params! {
            ":user_id": user_id,
            ":rating": patch.rating,
            ":level": patch.level,
            ":total_challenges": patch.total_challenges,
            ":completed_challenges": patch.completed_challenges,
            ":streak": patch.streak,
            ":last_active": db::now_timestamp(),
        })
        .inspect_err(|err| log::error!("[patch_user] Could not patch user {user_id}: {err}"))?;

    Ok(())
}

/// Credits a graded submission in one statement: rating and counters are
/// incremented server-side and the level is recomputed from the new rating,
/// so two concurrent submissions can never overwrite each other's points.
///
/// Returns the updated user.
pub fn apply_points(
    db: &Database,
    user_id: i64,
    points: i64,
    completed: bool,
) -> DbResult<Option<User>> {
    log::trace!("[apply_points] +{points} points for user {user_id} (completed: {completed})");

    let conn = db.conn();
    conn.prepare(
        "UPDATE users SET
            rating               = rating + :points,
            level                = (rating + :points) / :threshold + 1,
            total_challenges     = total_challenges + 1,
            completed_challenges = completed_challenges + :completed,
            last_active          = :last_active
         WHERE user_id = :user_id",
    )?
    .execute(named_params! {
        ":user_id": user_id,
        ":points": points,
        ":threshold": LEVEL_UP_THRESHOLD,
        ":completed": completed as i64,
        ":last_active": db::now_timestamp(),
    })?;

    conn.prepare("SELECT * FROM users WHERE user_id = :user_id")?
        .query(named_params! { ":user_id": user_id })?
        .next()?
        .map(|row| row.try_into())
        .transpose()
        .inspect(|user: &Option<User>| {
            if let Some(user) = user {
                log::info!(
                    "[apply_points] User {user_id} is now at rating {} (level {})",
                    user.rating,
                    user.level
                );
            }
        })
}

/// Every known user id, for the scheduled sweeps.
pub fn all_user_ids(db: &Database) -> DbResult<Vec<i64>> {
    db.conn()
        .prepare("SELECT user_id FROM users ORDER BY user_id")?
        .query_map([], |row| row.get(0))?
        .collect()
}

/// A page of users for the admin list.
pub fn all_users(db: &Database, limit: i64, offset: i64) -> DbResult<Vec<User>> {
    db.conn()
        .prepare("SELECT * FROM users ORDER BY user_id LIMIT :limit OFFSET :offset")?
        .query_map(named_params! { ":limit": limit, ":offset": offset }, |row| {
            User::try_from(row)
        })?
        .collect()
}

pub fn count_users(db: &Database) -> DbResult<i64> {
    db.conn()
        .prepare("SELECT COUNT(*) FROM users")?
        .query_row([], |row| row.get(0))
}

/// Users whose last activity falls within the past `days` days.
pub fn count_active_since(db: &Database, days: i64) -> DbResult<i64> {
    db.conn()
        .prepare(
            "SELECT COUNT(*) FROM users
             WHERE last_active IS NOT NULL
               AND last_active >= :cutoff",
        )?
        .query_row(
            named_params! {
                ":cutoff": (chrono::Local::now() - chrono::Duration::days(days))
                    .naive_local()
                    .format(crate::models::TIMESTAMP_FORMAT)
                    .to_string(),
            },
            |row| row.get(0),
        )
}

/////*============== LEADERBOARD QUERIES ==============*/

/// Top `n` users ordered by rating descending. Tie order is whatever the
/// storage engine returns.
pub fn top_by_rating(db: &Database, n: i64) -> DbResult<Vec<User>> {
    db.conn()
        .prepare("SELECT * FROM users ORDER BY rating DESC LIMIT :n")?
        .query_map(named_params! { ":n": n }, |row| User::try_from(row))?
        .collect()
}

/// Count of users whose rating strictly exceeds `user_id`'s.
pub fn count_rated_above(db: &Database, user_id: i64) -> DbResult<i64> {
    db.conn()
        .prepare(
            "SELECT COUNT(*) FROM users
             WHERE rating > (SELECT rating FROM users WHERE user_id = :user_id)",
        )?
        .query_row(named_params! { ":user_id": user_id }, |row| row.get(0))
}

/////*============== BAN QUERIES ==============*/

/// Records a ban. Re-banning an already banned user is a no-op.
pub fn ban_user(db: &Database, user_id: i64, banned_by: i64, reason: &str) -> DbResult<bool> {
    log::info!("[ban_user] Banning user {user_id} (by {banned_by}): {reason}");

    db.conn()
        .prepare(
            "INSERT INTO bans (user_id, banned_by, reason)
             VALUES (:user_id, :banned_by, :reason)",
        )?
        .execute(named_params! {
            ":user_id": user_id,
            ":banned_by": banned_by,
            ":reason": reason,
        })
        .map_or_else(db::swallow_constraint_violation, |_| Ok(true))
}

pub fn unban_user(db: &Database, user_id: i64) -> DbResult<bool> {
    log::info!("[unban_user] Unbanning user {user_id}");

    let removed = db
        .conn()
        .prepare("DELETE FROM bans WHERE user_id = :user_id")?
        .execute(named_params! { ":user_id": user_id })?;

    Ok(removed > 0)
}

pub fn is_banned(db: &Database, user_id: i64) -> DbResult<bool> {
    db.conn()
        .prepare("SELECT 1 FROM bans WHERE user_id = :user_id")?
        .exists(named_params! { ":user_id": user_id })
}

/// Removes a user and every row they own, as one unit.
pub fn delete_user(db: &Database, user_id: i64) -> DbResult<()> {
    log::info!("[delete_user] Deleting user {user_id} and all owned rows");

    let mut conn = db.conn();
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM submissions WHERE user_id = :user_id",
        named_params! { ":user_id": user_id },
    )?;
    tx.execute(
        "DELETE FROM user_achievements WHERE user_id = :user_id",
        named_params! { ":user_id": user_id },
    )?;
    tx.execute(
        "DELETE FROM user_daily_challenges WHERE user_id = :user_id",
        named_params! { ":user_id": user_id },
    )?;
    tx.execute(
        "DELETE FROM bans WHERE user_id = :user_id",
        named_params! { ":user_id": user_id },
    )?;
    tx.execute(
        "DELETE FROM users WHERE user_id = :user_id",
        named_params! { ":user_id": user_id },
    )?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("in-memory db")
    }

    #[test]
    fn insert_is_idempotent() {
        let db = test_db();
        assert!(insert_user(&db, 7, "ada").unwrap());
        assert!(!insert_user(&db, 7, "ada").unwrap());

        let user = query_user(&db, 7).unwrap().unwrap();
        assert_eq!(user.rating, 1000);
        assert_eq!(user.level, 1);
        assert_eq!(user.streak, 0);
        assert!(user.last_active.is_some());
    }

    #[test]
    fn apply_points_keeps_level_in_step_with_rating() {
        let db = test_db();
        insert_user(&db, 1, "ada").unwrap();

        let user = apply_points(&db, 1, 10, true).unwrap().unwrap();
        assert_eq!(user.rating, 1010);
        assert_eq!(user.level, user.rating / LEVEL_UP_THRESHOLD + 1);
        assert_eq!(user.total_challenges, 1);
        assert_eq!(user.completed_challenges, 1);

        // An attempted submission still counts toward total, not completed.
        let user = apply_points(&db, 1, 0, false).unwrap().unwrap();
        assert_eq!(user.rating, 1010);
        assert_eq!(user.total_challenges, 2);
        assert_eq!(user.completed_challenges, 1);
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let db = test_db();
        insert_user(&db, 1, "ada").unwrap();

        patch_user(
            &db,
            1,
            &UserPatch { streak: Some(5), ..UserPatch::default() },
        )
        .unwrap();

        let user = query_user(&db, 1).unwrap().unwrap();
        assert_eq!(user.streak, 5);
        assert_eq!(user.rating, 1000);
    }

    #[test]
    fn ban_roundtrip() {
        let db = test_db();
        insert_user(&db, 1, "ada").unwrap();

        assert!(!is_banned(&db, 1).unwrap());
        assert!(ban_user(&db, 1, 99, "spam").unwrap());
        assert!(!ban_user(&db, 1, 99, "spam again").unwrap());
        assert!(is_banned(&db, 1).unwrap());
        assert!(unban_user(&db, 1).unwrap());
        assert!(!is_banned(&db, 1).unwrap());
    }

    #[test]
    fn delete_user_removes_owned_rows() {
        let db = test_db();
        insert_user(&db, 1, "ada").unwrap();
        ban_user(&db, 1, 99, "spam").unwrap();
        crate::db::achievements::insert_achievement(&db, 1, "first_challenge").unwrap();

        delete_user(&db, 1).unwrap();

        assert!(query_user(&db, 1).unwrap().is_none());
        assert!(!is_banned(&db, 1).unwrap());
        assert!(crate::db::achievements::list_achievements(&db, 1).unwrap().is_empty());
    }
}
