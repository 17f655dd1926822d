use rusqlite::named_params;

use crate::db::{Database, DbResult};
use crate::models::{Difficulty, InterviewQuestion};

/////*============== INTERVIEW QUESTION QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for InterviewQuestion {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            category: row.get("category")?,
            question: row.get("question")?,
            answer: row.get("answer")?,
            difficulty: Difficulty::parse_lossy(&row.get::<_, String>("difficulty")?),
        })
    }
}

pub fn insert_question(
    db: &Database,
    category: &str,
    question: &str,
    answer: &str,
    difficulty: Difficulty,
) -> DbResult<i64> {
    log::trace!("[insert_question] Inserting interview question in '{category}'...");

    let conn = db.conn();
    conn.prepare(
        "INSERT INTO interview_questions (category, question, answer, difficulty)
         VALUES (:category, :question, :answer, :difficulty)",
    )?
    .execute(named_params! {
        ":category": category,
        ":question": question,
        ":answer": answer,
        ":difficulty": difficulty.as_str(),
    })?;

    Ok(conn.last_insert_rowid())
}

pub fn query_question(db: &Database, id: i64) -> DbResult<Option<InterviewQuestion>> {
    db.conn()
        .prepare("SELECT * FROM interview_questions WHERE id = :id")?
        .query(named_params! { ":id": id })?
        .next()?
        .map(|row| row.try_into())
        .transpose()
}

/// A uniformly random question, optionally limited to one category.
pub fn random_question(db: &Database, category: Option<&str>) -> DbResult<Option<InterviewQuestion>> {
    let conn = db.conn();
    match category {
        Some(category) => conn
            .prepare(
                "SELECT * FROM interview_questions
                 WHERE category = :category
                 ORDER BY RANDOM() LIMIT 1",
            )?
            .query(named_params! { ":category": category })?
            .next()?
            .map(|row| row.try_into())
            .transpose(),
        None => conn
            .prepare("SELECT * FROM interview_questions ORDER BY RANDOM() LIMIT 1")?
            .query([])?
            .next()?
            .map(|row| row.try_into())
            .transpose(),
    }
}

pub fn categories(db: &Database) -> DbResult<Vec<String>> {
    db.conn()
        .prepare("SELECT DISTINCT category FROM interview_questions ORDER BY category")?
        .query_map([], |row| row.get(0))?
        .collect()
}

pub fn count_questions(db: &Database) -> DbResult<i64> {
    db.conn()
        .prepare("SELECT COUNT(*) FROM interview_questions")?
        .query_row([], |row| row.get(0))
}

pub fn delete_question(db: &Database, id: i64) -> DbResult<bool> {
    log::info!("[delete_question] Deleting interview question #{id}");

    let removed = db
        .conn()
        .prepare("DELETE FROM interview_questions WHERE id = :id")?
        .execute(named_params! { ":id": id })?;

    Ok(removed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_respects_category() {
        let db = Database::open_in_memory().unwrap();
        insert_question(&db, "Algorithms", "What is big-O?", "...", Difficulty::Easy).unwrap();
        insert_question(&db, "OOP", "What is a vtable?", "...", Difficulty::Medium).unwrap();

        let q = random_question(&db, Some("OOP")).unwrap().unwrap();
        assert_eq!(q.category, "OOP");
        assert!(random_question(&db, Some("System Design")).unwrap().is_none());
        assert!(random_question(&db, None).unwrap().is_some());

        assert_eq!(categories(&db).unwrap(), vec!["Algorithms", "OOP"]);
    }
}
