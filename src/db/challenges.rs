use rusqlite::named_params;

use crate::db::{Database, DbResult};
use crate::models::{Challenge, Difficulty};

/////*============== CHALLENGE QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for Challenge {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            difficulty: Difficulty::parse_lossy(&row.get::<_, String>("difficulty")?),
            language: row.get("language")?,
            test_cases: row.get("test_cases")?,
            solution: row
                .get::<_, Option<String>>("solution")?
                .filter(|s| !s.is_empty()),
            points: row.get("points")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub struct NewChallenge<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub difficulty: Difficulty,
    pub language: &'a str,
    pub test_cases: &'a str,
    pub solution: Option<&'a str>,
    pub points: i64,
}

/// Inserts a challenge and returns its id.
pub fn insert_challenge(db: &Database, new: &NewChallenge) -> DbResult<i64> {
    log::trace!("[insert_challenge] Inserting challenge '{}'...", new.title);

    let conn = db.conn();
    conn.prepare(
        "INSERT INTO challenges (title, description, difficulty, language,
                                 test_cases, solution, points)
         VALUES (:title, :description, :difficulty, :language,
                 :test_cases, :solution, :points)",
    )?
    .execute(named_params! {
        ":title": new.title,
        ":description": new.description,
        ":difficulty": new.difficulty.as_str(),
        ":language": new.language,
        ":test_cases": new.test_cases,
        ":solution": new.solution,
        ":points": new.points,
    })?;

    let id = conn.last_insert_rowid();
    log::info!("Challenge #{id} '{}' has been added.", new.title);
    Ok(id)
}

pub fn query_challenge(db: &Database, id: i64) -> DbResult<Option<Challenge>> {
    db.conn()
        .prepare("SELECT * FROM challenges WHERE id = :id")?
        .query(named_params! { ":id": id })?
        .next()?
        .map(|row| row.try_into())
        .transpose()
}

/// All challenges in a tier, optionally narrowed to one language.
pub fn query_by_difficulty(
    db: &Database,
    difficulty: Difficulty,
    language: Option<&str>,
) -> DbResult<Vec<Challenge>> {
    let conn = db.conn();
    match language {
        Some(language) => conn
            .prepare(
                "SELECT * FROM challenges
                 WHERE difficulty = :difficulty AND language = :language",
            )?
            .query_map(
                named_params! { ":difficulty": difficulty.as_str(), ":language": language },
                |row| Challenge::try_from(row),
            )?
            .collect(),
        None => conn
            .prepare("SELECT * FROM challenges WHERE difficulty = :difficulty")?
            .query_map(named_params! { ":difficulty": difficulty.as_str() }, |row| {
                Challenge::try_from(row)
            })?
            .collect(),
    }
}

/// A page of challenges for the admin list.
pub fn all_challenges(db: &Database, limit: i64, offset: i64) -> DbResult<Vec<Challenge>> {
    db.conn()
        .prepare("SELECT * FROM challenges ORDER BY id LIMIT :limit OFFSET :offset")?
        .query_map(named_params! { ":limit": limit, ":offset": offset }, |row| {
            Challenge::try_from(row)
        })?
        .collect()
}

pub fn count_challenges(db: &Database) -> DbResult<i64> {
    db.conn()
        .prepare("SELECT COUNT(*) FROM challenges")?
        .query_row([], |row| row.get(0))
}

pub fn count_by_difficulty(db: &Database, difficulty: Difficulty) -> DbResult<i64> {
    db.conn()
        .prepare("SELECT COUNT(*) FROM challenges WHERE difficulty = :difficulty")?
        .query_row(named_params! { ":difficulty": difficulty.as_str() }, |row| row.get(0))
}

/// Removes a challenge together with its submissions and daily assignments,
/// as one unit.
pub fn delete_challenge(db: &Database, id: i64) -> DbResult<()> {
    log::info!("[delete_challenge] Deleting challenge #{id} and dependent rows");

    let mut conn = db.conn();
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM submissions WHERE challenge_id = :id",
        named_params! { ":id": id },
    )?;
    tx.execute(
        "DELETE FROM user_daily_challenges WHERE challenge_id = :id",
        named_params! { ":id": id },
    )?;
    tx.execute("DELETE FROM challenges WHERE id = :id", named_params! { ":id": id })?;
    tx.commit()
}

#[cfg(test)]
pub(crate) fn sample(difficulty: Difficulty, language: &str, points: i64) -> NewChallenge<'_> {
    NewChallenge {
        title: "Sum of two numbers",
        description: "Read two integers and print their sum.",
        difficulty,
        language,
        test_cases: r#"[{"input": "1 2", "output": "3"}]"#,
        solution: None,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty::{Easy, Hard};

    #[test]
    fn insert_and_query_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let id = insert_challenge(&db, &sample(Easy, "python", 10)).unwrap();

        let challenge = query_challenge(&db, id).unwrap().unwrap();
        assert_eq!(challenge.difficulty, Easy);
        assert_eq!(challenge.points, 10);
        assert!(challenge.solution.is_none());
    }

    #[test]
    fn difficulty_filter_respects_language() {
        let db = Database::open_in_memory().unwrap();
        insert_challenge(&db, &sample(Easy, "python", 10)).unwrap();
        insert_challenge(&db, &sample(Easy, "cpp", 10)).unwrap();
        insert_challenge(&db, &sample(Hard, "python", 50)).unwrap();

        assert_eq!(query_by_difficulty(&db, Easy, None).unwrap().len(), 2);
        assert_eq!(query_by_difficulty(&db, Easy, Some("cpp")).unwrap().len(), 1);
        assert_eq!(query_by_difficulty(&db, Hard, None).unwrap().len(), 1);
    }

    #[test]
    fn delete_cascades_to_dependents() {
        let db = Database::open_in_memory().unwrap();
        crate::db::users::insert_user(&db, 1, "ada").unwrap();
        let id = insert_challenge(&db, &sample(Easy, "python", 10)).unwrap();

        crate::db::daily::assign_daily(&db, 1, id, "2026-08-07").unwrap();
        delete_challenge(&db, id).unwrap();

        assert!(query_challenge(&db, id).unwrap().is_none());
        assert!(crate::db::daily::query_daily(&db, 1, "2026-08-07").unwrap().is_none());
    }
}
