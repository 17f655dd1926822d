use std::env;

/// Rating points awarded per difficulty tier.
pub const RATING_EASY_POINTS: i64 = 10;
pub const RATING_MEDIUM_POINTS: i64 = 25;
pub const RATING_HARD_POINTS: i64 = 50;

/// Bonus multiplier applied once at a 3-day streak, twice at 7 days.
pub const STREAK_BONUS_MULTIPLIER: f64 = 1.1;

/// Points needed per level.
pub const LEVEL_UP_THRESHOLD: i64 = 100;

/// Local time at which daily challenges are assigned, "HH:MM".
pub const DAILY_CHALLENGE_TIME: &str = "09:00";

pub const SUPPORTED_LANGUAGES: &[&str] = &["python", "javascript", "cpp"];

pub const MISTRAL_API_URL: &str = "https://api.mistral.ai/v1/chat/completions";
pub const MISTRAL_MODEL: &str = "mistral-large-latest";
pub const MISTRAL_MAX_TOKENS: u32 = 1000;
pub const MISTRAL_TEMPERATURE: f32 = 0.7;

/// Upper bound on a single reviewer request. Requests past this are treated
/// as failed reviews, not left hanging.
pub const AI_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Database path, overridable with $DATABASE_PATH.
pub fn database_path() -> String {
    env::var("DATABASE_PATH").unwrap_or_else(|_| String::from("data/bot.db"))
}

/// Admin user ids from $ADMIN_USER_IDS, comma-separated.
///
/// Entries that fail to parse are skipped with a warning rather than
/// taking the bot down.
pub fn admin_user_ids() -> Vec<u64> {
    env::var("ADMIN_USER_IDS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            s.parse::<u64>()
                .inspect_err(|_| log::warn!("Ignoring malformed admin id in $ADMIN_USER_IDS: {s}"))
                .ok()
        })
        .collect()
}

pub fn is_admin(user_id: u64) -> bool {
    admin_user_ids().contains(&user_id)
}

/// Get the call token from the environment (.env file)
///
/// # Panics
/// If $BOT_CALL_TOKEN is not defined, will panic.
pub fn getenv_call_token() -> char {
    let env_token = std::env::var("BOT_CALL_TOKEN").unwrap_or_else(|_| {
        log::error!(
            "$BOT_CALL_TOKEN not defined. \n Please define a single-character \
             call-token (i.e., $ or !)"
        );
        panic!()
    });

    let token = env_token.chars().next().expect("BOT_CALL_TOKEN is empty.");
    if env_token.len() > 1 {
        log::warn!(
            "$BOT_CALL_TOKEN not a single character. Truncating to {}",
            token
        );
    }

    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_database_path() {
        // Only meaningful when the variable isn't set in the test environment.
        if env::var("DATABASE_PATH").is_err() {
            assert_eq!(database_path(), "data/bot.db");
        }
    }
}
