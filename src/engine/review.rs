use anyhow::{Context, Result};

use crate::db::{daily, submissions, users, Database};
use crate::db::submissions::NewSubmission;
use crate::engine::{achievements, rating, streak};
use crate::models::{Challenge, SubmissionStatus};

/// Turns reviewer feedback into a pass/fail status.
///
/// This substring heuristic is the sole authority on attempted-vs-completed;
/// a structured verdict from the reviewer would replace this one function
/// and nothing downstream.
pub fn classify_feedback(feedback: &str) -> SubmissionStatus {
    let lowered = feedback.to_lowercase();
    if lowered.contains("correct") || lowered.contains("good") {
        SubmissionStatus::Completed
    } else {
        SubmissionStatus::Attempted
    }
}

/// Everything the front end needs to render a graded submission.
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub status: SubmissionStatus,
    pub points_earned: i64,
    pub new_rating: i64,
    pub new_level: i64,
    pub streak: i64,
    pub new_achievements: Vec<&'static str>,
}

/// Applies one reviewed submission to the user's progression state:
/// streak first (points depend on it), then the append-only submission row,
/// then rating/counters in a single server-side increment, the daily
/// completion flag, and finally the achievement check.
pub fn record_submission(
    db: &Database,
    user_id: i64,
    challenge: &Challenge,
    code: &str,
    language: &str,
    status: SubmissionStatus,
    feedback: &str,
) -> Result<SubmissionOutcome> {
    let completed = status == SubmissionStatus::Completed;

    let streak = streak::update_streak(db, user_id)?;
    let points_earned = if completed {
        rating::points(challenge.difficulty, streak)
    } else {
        0
    };

    submissions::insert_submission(
        db,
        &NewSubmission {
            user_id,
            challenge_id: challenge.id,
            code,
            language,
            status,
            feedback,
            points_earned,
        },
    )?;

    let user = users::apply_points(db, user_id, points_earned, completed)?
        .with_context(|| format!("No such user: {user_id}"))?;

    if completed {
        daily::mark_completed(db, user_id, challenge.id)?;
    }

    let new_achievements =
        achievements::evaluate(db, user_id, user.completed_challenges, streak)?;

    log::info!(
        "[record_submission] User {user_id} {} challenge #{} (+{points_earned}, rating {})",
        status.as_str(),
        challenge.id,
        user.rating
    );

    Ok(SubmissionOutcome {
        status,
        points_earned,
        new_rating: user.rating,
        new_level: user.level,
        streak,
        new_achievements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::challenges;
    use crate::models::Difficulty::Easy;

    #[test]
    fn classifier_matches_the_reviewer_phrasing() {
        assert_eq!(classify_feedback("Correct! Nice work."), SubmissionStatus::Completed);
        assert_eq!(classify_feedback("This looks GOOD overall"), SubmissionStatus::Completed);
        assert_eq!(classify_feedback("Wrong output on case 2"), SubmissionStatus::Attempted);
        assert_eq!(classify_feedback(""), SubmissionStatus::Attempted);
        // Fallback strings from a failed reviewer never classify as a pass.
        assert_eq!(
            classify_feedback("❌ Error during code review: timeout"),
            SubmissionStatus::Attempted
        );
    }

    fn fixture() -> (Database, Challenge) {
        let db = Database::open_in_memory().unwrap();
        users::insert_user(&db, 1, "ada").unwrap();
        let id = challenges::insert_challenge(&db, &challenges::sample(Easy, "python", 10)).unwrap();
        let challenge = challenges::query_challenge(&db, id).unwrap().unwrap();
        (db, challenge)
    }

    #[test]
    fn first_completed_submission_end_to_end() {
        let (db, challenge) = fixture();

        let outcome = record_submission(
            &db,
            1,
            &challenge,
            "print(1 + 2)",
            "python",
            SubmissionStatus::Completed,
            "Correct, well done",
        )
        .unwrap();

        assert_eq!(outcome.points_earned, 10);
        assert_eq!(outcome.new_rating, 1010);
        assert_eq!(outcome.new_level, outcome.new_rating / 100 + 1);
        assert!(outcome.new_achievements.contains(&"first_challenge"));

        let user = users::query_user(&db, 1).unwrap().unwrap();
        assert_eq!(user.completed_challenges, 1);
        assert_eq!(user.total_challenges, 1);

        // A second completion must not re-grant first_challenge.
        let outcome = record_submission(
            &db,
            1,
            &challenge,
            "print(3)",
            "python",
            SubmissionStatus::Completed,
            "Correct again",
        )
        .unwrap();
        assert!(!outcome.new_achievements.contains(&"first_challenge"));
    }

    #[test]
    fn attempted_submission_earns_nothing_but_still_counts() {
        let (db, challenge) = fixture();

        let outcome = record_submission(
            &db,
            1,
            &challenge,
            "print(9)",
            "python",
            SubmissionStatus::Attempted,
            "Wrong answer",
        )
        .unwrap();

        assert_eq!(outcome.points_earned, 0);
        assert_eq!(outcome.new_rating, 1000);
        assert!(!outcome.new_achievements.contains(&"first_challenge"));

        let user = users::query_user(&db, 1).unwrap().unwrap();
        assert_eq!(user.total_challenges, 1);
        assert_eq!(user.completed_challenges, 0);
    }

    #[test]
    fn completing_the_daily_flags_the_assignment() {
        let (db, challenge) = fixture();
        daily::assign_daily(&db, 1, challenge.id, &crate::db::today_string()).unwrap();

        record_submission(
            &db,
            1,
            &challenge,
            "print(1 + 2)",
            "python",
            SubmissionStatus::Completed,
            "Correct",
        )
        .unwrap();

        let row = daily::query_daily(&db, 1, &crate::db::today_string()).unwrap().unwrap();
        assert!(row.completed);
    }
}
