use anyhow::Result;

use crate::db::{users, Database};
use crate::models::User;

/// Competition rank: one more than the number of users with a strictly
/// greater rating. Equal ratings share a rank, and the rank after a tied
/// group skips past it.
pub fn rank(db: &Database, user_id: i64) -> Result<i64> {
    Ok(users::count_rated_above(db, user_id)? + 1)
}

/// The top `n` users by rating, descending. Tie order among equal ratings
/// is whatever order storage returns.
pub fn top_n(db: &Database, n: i64) -> Result<Vec<User>> {
    Ok(users::top_by_rating(db, n)?)
}
