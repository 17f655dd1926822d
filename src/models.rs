use chrono::NaiveDate;

/// Format used for every timestamp this crate writes itself.
/// (`created_at` columns are filled by SQLite and never parsed back.)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Strict parse, for validating admin input.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    /// Lossy parse for data coming back out of storage: anything
    /// unrecognized lands in the easy tier.
    pub fn parse_lossy(s: &str) -> Self {
        Self::parse(s).unwrap_or(Self::Easy)
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Easy => "🟢",
            Self::Medium => "🟡",
            Self::Hard => "🔴",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Attempted,
    Completed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attempted => "attempted",
            Self::Completed => "completed",
        }
    }

    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "completed" => Self::Completed,
            _ => Self::Attempted,
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: i64,
    pub username: String,

    pub rating: i64,
    pub level: i64,
    pub streak: i64,

    pub total_challenges: i64,
    pub completed_challenges: i64,

    pub last_active: Option<String>,
    pub created_at: String,
}

impl User {
    /// Calendar date of the user's last activity, if any was recorded.
    pub fn last_active_date(&self) -> Option<NaiveDate> {
        let stamp = self.last_active.as_deref()?;
        NaiveDate::parse_from_str(stamp.get(..10)?, "%Y-%m-%d").ok()
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "**{}**\n\
             \t⭐ Rating: {}\n\
             \t🎯 Level: {}\n\
             \t🔥 Streak: {} days\n\
             \t✅ Completed: {}/{}",
            self.username,
            self.rating,
            self.level,
            self.streak,
            self.completed_challenges,
            self.total_challenges
        )
    }
}

#[derive(Debug, Clone)]
pub struct Challenge {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub language: String,
    pub test_cases: String,
    pub solution: Option<String>,
    pub points: i64,
    pub created_at: String,
}

impl std::fmt::Display for Challenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} **{}** (#{})\n\
             Difficulty: {}\n\
             Language: {}\n\
             Points: {} ⭐\n\n\
             📋 {}\n\n\
             🧪 Test cases:\n{}",
            self.difficulty.emoji(),
            self.title,
            self.id,
            self.difficulty,
            self.language,
            self.points,
            self.description,
            self.test_cases
        )
    }
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub id: i64,
    pub user_id: i64,
    pub challenge_id: i64,
    pub code: String,
    pub language: String,
    pub status: SubmissionStatus,
    pub feedback: String,
    pub points_earned: i64,
    pub submitted_at: String,
}

#[derive(Debug, Clone)]
pub struct DailyAssignment {
    pub user_id: i64,
    pub challenge_id: i64,
    pub assigned_date: String,
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct InterviewQuestion {
    pub id: i64,
    pub category: String,
    pub question: String,
    pub answer: String,
    pub difficulty: Difficulty,
}

impl std::fmt::Display for InterviewQuestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "🎯 **Interview Question #{}**\n\
             Category: {}\n\
             Difficulty: {} {}\n\n\
             ❓ {}",
            self.id,
            self.category,
            self.difficulty.emoji(),
            self.difficulty,
            self.question
        )
    }
}

pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// The fixed achievement catalog. Grants reference these by id; the rows
/// themselves are never stored per user.
pub const ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: "first_challenge",
        name: "🎯 First Steps",
        description: "Complete your first challenge",
    },
    Achievement {
        id: "streak_3",
        name: "🔥 On Fire",
        description: "Maintain a 3-day streak",
    },
    Achievement {
        id: "streak_7",
        name: "⚡ Unstoppable",
        description: "Maintain a 7-day streak",
    },
    Achievement {
        id: "streak_30",
        name: "💎 Legend",
        description: "Maintain a 30-day streak",
    },
    Achievement {
        id: "challenges_10",
        name: "📚 Learner",
        description: "Complete 10 challenges",
    },
    Achievement {
        id: "challenges_50",
        name: "🎓 Expert",
        description: "Complete 50 challenges",
    },
    Achievement {
        id: "challenges_100",
        name: "🏆 Master",
        description: "Complete 100 challenges",
    },
    Achievement {
        id: "top_10",
        name: "👑 Top 10",
        description: "Reach top 10 on leaderboard",
    },
];

pub fn achievement_by_id(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parse_is_case_insensitive() {
        assert_eq!(Difficulty::parse("Easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse("MEDIUM"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::parse("hard"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("brutal"), None);
    }

    #[test]
    fn lossy_parse_falls_back_to_easy() {
        assert_eq!(Difficulty::parse_lossy("brutal"), Difficulty::Easy);
        assert_eq!(Difficulty::parse_lossy("hard"), Difficulty::Hard);
    }

    #[test]
    fn last_active_date_parses_our_timestamps() {
        let user = User {
            user_id: 1,
            username: String::from("kim"),
            rating: 1000,
            level: 1,
            streak: 0,
            total_challenges: 0,
            completed_challenges: 0,
            last_active: Some(String::from("2026-03-14T09:26:53.590")),
            created_at: String::from("2026-03-14 09:26:53"),
        };

        assert_eq!(user.last_active_date(), NaiveDate::from_ymd_opt(2026, 3, 14));
    }

    #[test]
    fn catalog_lookup() {
        assert!(achievement_by_id("streak_7").is_some());
        assert!(achievement_by_id("streak_14").is_none());
    }
}
