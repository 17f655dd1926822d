use rusqlite::named_params;

use crate::db::{Database, DbResult};
use crate::models::{Submission, SubmissionStatus};

/////*============== SUBMISSION QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for Submission {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            challenge_id: row.get("challenge_id")?,
            code: row.get("code")?,
            language: row.get("language")?,
            status: SubmissionStatus::parse_lossy(&row.get::<_, String>("status")?),
            feedback: row.get::<_, Option<String>>("feedback")?.unwrap_or_default(),
            points_earned: row.get("points_earned")?,
            submitted_at: row.get("submitted_at")?,
        })
    }
}

pub struct NewSubmission<'a> {
    pub user_id: i64,
    pub challenge_id: i64,
    pub code: &'a str,
    pub language: &'a str,
    pub status: SubmissionStatus,
    pub feedback: &'a str,
    pub points_earned: i64,
}

/// Appends a submission to the history. Rows are never updated afterwards.
pub fn insert_submission(db: &Database, new: &NewSubmission) -> DbResult<i64> {
    log::trace!(
        "[insert_submission] Recording {} submission for user {} on challenge {}...",
        new.status.as_str(),
        new.user_id,
        new.challenge_id
    );

    let conn = db.conn();
    conn.prepare(
        "INSERT INTO submissions (user_id, challenge_id, code, language,
                                  status, feedback, points_earned)
         VALUES (:user_id, :challenge_id, :code, :language,
                 :status, :feedback, :points_earned)",
    )?
    .execute(named_params! {
        ":user_id": new.user_id,
        ":challenge_id": new.challenge_id,
        ":code": new.code,
        ":language": new.language,
        ":status": new.status.as_str(),
        ":feedback": new.feedback,
        ":points_earned": new.points_earned,
    })?;

    Ok(conn.last_insert_rowid())
}

/// The user's most recent submissions, newest first.
pub fn recent_for_user(db: &Database, user_id: i64, limit: i64) -> DbResult<Vec<Submission>> {
    db.conn()
        .prepare(
            "SELECT * FROM submissions
             WHERE user_id = :user_id
             ORDER BY submitted_at DESC, id DESC
             LIMIT :limit",
        )?
        .query_map(named_params! { ":user_id": user_id, ":limit": limit }, |row| {
            Submission::try_from(row)
        })?
        .collect()
}

pub fn count_submissions(db: &Database) -> DbResult<i64> {
    db.conn()
        .prepare("SELECT COUNT(*) FROM submissions")?
        .query_row([], |row| row.get(0))
}

pub fn count_by_status(db: &Database, status: SubmissionStatus) -> DbResult<i64> {
    db.conn()
        .prepare("SELECT COUNT(*) FROM submissions WHERE status = :status")?
        .query_row(named_params! { ":status": status.as_str() }, |row| row.get(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::challenges;
    use crate::db::users;
    use crate::models::Difficulty::Easy;

    #[test]
    fn history_is_append_only_and_ordered() {
        let db = Database::open_in_memory().unwrap();
        users::insert_user(&db, 1, "ada").unwrap();
        let ch = challenges::insert_challenge(&db, &challenges::sample(Easy, "python", 10)).unwrap();

        for (status, points) in [
            (SubmissionStatus::Attempted, 0),
            (SubmissionStatus::Completed, 10),
        ] {
            insert_submission(
                &db,
                &NewSubmission {
                    user_id: 1,
                    challenge_id: ch,
                    code: "print(1 + 2)",
                    language: "python",
                    status,
                    feedback: "fine",
                    points_earned: points,
                },
            )
            .unwrap();
        }

        let recent = recent_for_user(&db, 1, 10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].status, SubmissionStatus::Completed);
        assert_eq!(count_by_status(&db, SubmissionStatus::Attempted).unwrap(), 1);
        assert_eq!(count_by_status(&db, SubmissionStatus::Completed).unwrap(), 1);
    }
}
