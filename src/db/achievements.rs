use rusqlite::named_params;

use crate::db::{self, Database, DbResult};

/////*============== ACHIEVEMENT QUERIES ==============*/

/// Grants an achievement, doing nothing if the user already holds it.
/// Returns `true` if the grant is new.
pub fn insert_achievement(db: &Database, user_id: i64, achievement_id: &str) -> DbResult<bool> {
    log::trace!("[insert_achievement] Granting '{achievement_id}' to user {user_id}...");

    db.conn()
        .prepare(
            "INSERT INTO user_achievements (user_id, achievement_id)
             VALUES (:user_id, :achievement_id)",
        )?
        .execute(named_params! {
            ":user_id": user_id,
            ":achievement_id": achievement_id,
        })
        .map_or_else(db::swallow_constraint_violation, |_| Ok(true))
        .inspect(|newly| {
            if *newly {
                log::info!("User {user_id} earned achievement '{achievement_id}'.");
            }
        })
}

/// Every achievement id the user holds, in the order they were earned.
pub fn list_achievements(db: &Database, user_id: i64) -> DbResult<Vec<String>> {
    db.conn()
        .prepare(
            "SELECT achievement_id FROM user_achievements
             WHERE user_id = :user_id
             ORDER BY earned_at, rowid",
        )?
        .query_map(named_params! { ":user_id": user_id }, |row| row.get(0))?
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users;

    #[test]
    fn grants_are_unique_and_monotonic() {
        let db = Database::open_in_memory().unwrap();
        users::insert_user(&db, 1, "ada").unwrap();

        assert!(insert_achievement(&db, 1, "first_challenge").unwrap());
        assert!(!insert_achievement(&db, 1, "first_challenge").unwrap());
        assert!(insert_achievement(&db, 1, "streak_3").unwrap());

        assert_eq!(
            list_achievements(&db, 1).unwrap(),
            vec!["first_challenge", "streak_3"]
        );
    }
}
