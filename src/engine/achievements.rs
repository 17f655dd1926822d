use anyhow::Result;

use crate::db::{achievements, Database};
use crate::engine::leaderboard;

/// Checks every achievement family against the user's updated counters and
/// grants whatever newly applies. Returns the ids granted by this call.
///
/// The streak and challenge-count families are descending ladders: only the
/// highest satisfied tier is considered per call, so a streak that jumps
/// straight past 3 to 10 earns `streak_7` and never `streak_3`. Grants are
/// insert-if-absent, so nothing is ever awarded twice.
pub fn evaluate(
    db: &Database,
    user_id: i64,
    completed_challenges: i64,
    streak: i64,
) -> Result<Vec<&'static str>> {
    let earned = achievements::list_achievements(db, user_id)?;
    let has = |id: &str| earned.iter().any(|e| e.as_str() == id);

    let mut granted = Vec::new();
    let mut grant = |id: &'static str| -> Result<()> {
        if !has(id) && achievements::insert_achievement(db, user_id, id)? {
            granted.push(id);
        }
        Ok(())
    };

    // First challenge: fires on the transition to exactly 1.
    if completed_challenges == 1 {
        grant("first_challenge")?;
    }

    // Streak ladder, highest tier only.
    if streak >= 30 {
        grant("streak_30")?;
    } else if streak >= 7 {
        grant("streak_7")?;
    } else if streak >= 3 {
        grant("streak_3")?;
    }

    // Challenge-count ladder, highest tier only.
    if completed_challenges >= 100 {
        grant("challenges_100")?;
    } else if completed_challenges >= 50 {
        grant("challenges_50")?;
    } else if completed_challenges >= 10 {
        grant("challenges_10")?;
    }

    // Leaderboard standing, independent of both ladders.
    if leaderboard::rank(db, user_id)? <= 10 {
        grant("top_10")?;
    }

    Ok(granted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::{self, UserPatch};

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        users::insert_user(&db, 1, "ada").unwrap();
        db
    }

    /// A lone user always ranks first, so top_10 rides along with every
    /// evaluation in these fixtures.
    fn granted_without_top10(db: &Database, completed: i64, streak: i64) -> Vec<&'static str> {
        evaluate(db, 1, completed, streak)
            .unwrap()
            .into_iter()
            .filter(|id| *id != "top_10")
            .collect()
    }

    #[test]
    fn streak_jump_grants_only_the_highest_tier() {
        let db = test_db();
        assert_eq!(granted_without_top10(&db, 5, 10), vec!["streak_7"]);
        // streak_3 stays ungranted forever on this path.
        assert_eq!(granted_without_top10(&db, 5, 10), Vec::<&str>::new());
    }

    #[test]
    fn stepwise_progress_earns_each_tier_once() {
        let db = test_db();
        assert_eq!(granted_without_top10(&db, 5, 3), vec!["streak_3"]);
        assert_eq!(granted_without_top10(&db, 5, 5), Vec::<&str>::new());
        assert_eq!(granted_without_top10(&db, 5, 7), vec!["streak_7"]);
        assert_eq!(granted_without_top10(&db, 5, 30), vec!["streak_30"]);
    }

    #[test]
    fn first_challenge_fires_on_the_transition_to_one() {
        let db = test_db();
        assert_eq!(granted_without_top10(&db, 0, 0), Vec::<&str>::new());
        assert_eq!(granted_without_top10(&db, 1, 0), vec!["first_challenge"]);
        assert_eq!(granted_without_top10(&db, 2, 0), Vec::<&str>::new());
    }

    #[test]
    fn count_ladder_is_exclusive_per_call() {
        let db = test_db();
        assert_eq!(granted_without_top10(&db, 64, 0), vec!["challenges_50"]);
        assert_eq!(granted_without_top10(&db, 100, 0), vec!["challenges_100"]);
    }

    #[test]
    fn top_10_depends_on_rank() {
        let db = test_db();
        // Ten distinctly-rated rivals above our subject push them to rank 11.
        for id in 2..=11 {
            users::insert_user(&db, id, "rival").unwrap();
            users::patch_user(
                &db,
                id,
                &UserPatch { rating: Some(2000 + id), ..UserPatch::default() },
            )
            .unwrap();
        }

        assert_eq!(evaluate(&db, 1, 0, 0).unwrap(), Vec::<&str>::new());

        // Overtake the lowest rival; rank becomes 10 and the grant fires once.
        users::patch_user(
            &db,
            1,
            &UserPatch { rating: Some(2002), ..UserPatch::default() },
        )
        .unwrap();
        assert_eq!(evaluate(&db, 1, 0, 0).unwrap(), vec!["top_10"]);
        assert_eq!(evaluate(&db, 1, 0, 0).unwrap(), Vec::<&str>::new());
    }
}
