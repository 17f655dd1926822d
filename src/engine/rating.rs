use crate::config::{
    LEVEL_UP_THRESHOLD, RATING_EASY_POINTS, RATING_HARD_POINTS, RATING_MEDIUM_POINTS,
    STREAK_BONUS_MULTIPLIER,
};
use crate::models::Difficulty;

/// Points earned for completing a challenge of the given difficulty.
///
/// The streak bonus kicks in at 3 consecutive days and doubles up
/// (multiplier squared) at 7; the result is truncated to an integer.
pub fn points(difficulty: Difficulty, streak: i64) -> i64 {
    let base = match difficulty {
        Difficulty::Easy => RATING_EASY_POINTS,
        Difficulty::Medium => RATING_MEDIUM_POINTS,
        Difficulty::Hard => RATING_HARD_POINTS,
    };

    let multiplier = if streak >= 7 {
        STREAK_BONUS_MULTIPLIER * STREAK_BONUS_MULTIPLIER
    } else if streak >= 3 {
        STREAK_BONUS_MULTIPLIER
    } else {
        1.0
    };

    (base as f64 * multiplier) as i64
}

/// Level derived from total points: one level per `LEVEL_UP_THRESHOLD`.
pub fn level(total_points: i64) -> i64 {
    total_points / LEVEL_UP_THRESHOLD + 1
}

/// Points still missing until the next level boundary.
pub fn points_to_next_level(current_points: i64) -> i64 {
    level(current_points) * LEVEL_UP_THRESHOLD - current_points
}

/// Emoji shown next to a leaderboard rank.
pub fn rank_emoji(rank: i64) -> &'static str {
    match rank {
        1 => "🥇",
        2 => "🥈",
        3 => "🥉",
        4..=10 => "🏅",
        _ => "📊",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty::{Easy, Hard, Medium};

    #[test]
    fn easy_points_across_the_streak_ladder() {
        assert_eq!(points(Easy, 0), 10);
        assert_eq!(points(Easy, 2), 10);
        assert_eq!(points(Easy, 3), 11); // 10 × 1.1, floored
        assert_eq!(points(Easy, 6), 11);
        assert_eq!(points(Easy, 7), 12); // 10 × 1.21, floored
        assert_eq!(points(Easy, 30), 12);
    }

    #[test]
    fn base_values_scale_with_difficulty() {
        assert_eq!(points(Medium, 0), 25);
        assert_eq!(points(Medium, 3), 27);
        assert_eq!(points(Medium, 7), 30);
        assert_eq!(points(Hard, 0), 50);
        assert_eq!(points(Hard, 3), 55);
        assert_eq!(points(Hard, 7), 60);
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(level(0), 1);
        assert_eq!(level(99), 1);
        assert_eq!(level(100), 2);
        assert_eq!(level(250), 3);
    }

    #[test]
    fn level_is_monotone() {
        let mut previous = level(0);
        for pts in 1..1000 {
            let current = level(pts);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn next_level_distance() {
        assert_eq!(points_to_next_level(0), 100);
        assert_eq!(points_to_next_level(99), 1);
        assert_eq!(points_to_next_level(100), 100);
        assert_eq!(points_to_next_level(250), 50);
    }
}
