//! The progression engine: the rules that turn a submission into points,
//! level changes, streak continuity, achievements, daily assignments and
//! leaderboard rank. Everything here talks to storage through one injected
//! [`crate::db::Database`] handle and nothing else.

pub mod achievements;
pub mod daily;
pub mod leaderboard;
pub mod rating;
pub mod review;
pub mod streak;
