pub const USERS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS users (
        user_id               INTEGER     PRIMARY KEY,
        username              TEXT,

        rating                INTEGER     NOT NULL    DEFAULT 1000,
        level                 INTEGER     NOT NULL    DEFAULT 1,
        total_challenges      INTEGER     NOT NULL    DEFAULT 0,
        completed_challenges  INTEGER     NOT NULL    DEFAULT 0,
        streak                INTEGER     NOT NULL    DEFAULT 0,

        last_active           TEXT,
        created_at            TEXT        DEFAULT CURRENT_TIMESTAMP
    )";

pub const BANS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS bans (
        user_id        INTEGER     PRIMARY KEY,
        banned_by      INTEGER     NOT NULL,
        reason         TEXT,
        created_at     TEXT        DEFAULT CURRENT_TIMESTAMP
    )";

pub const CHALLENGES_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS challenges (
        id             INTEGER     PRIMARY KEY AUTOINCREMENT,
        title          TEXT        NOT NULL,
        description    TEXT        NOT NULL,
        difficulty     TEXT        NOT NULL,
        language       TEXT        NOT NULL,
        test_cases     TEXT        NOT NULL,
        solution       TEXT,
        points         INTEGER     NOT NULL,
        created_at     TEXT        DEFAULT CURRENT_TIMESTAMP
    )";

pub const SUBMISSIONS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS submissions (
        id             INTEGER     PRIMARY KEY AUTOINCREMENT,

        user_id        INTEGER     NOT NULL    REFERENCES users(user_id),
        challenge_id   INTEGER     NOT NULL    REFERENCES challenges(id),

        code           TEXT        NOT NULL,
        language       TEXT        NOT NULL,
        status         TEXT        NOT NULL,
        feedback       TEXT,
        points_earned  INTEGER     NOT NULL    DEFAULT 0,
        submitted_at   TEXT        DEFAULT CURRENT_TIMESTAMP
    )";

pub const INTERVIEW_QUESTIONS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS interview_questions (
        id             INTEGER     PRIMARY KEY AUTOINCREMENT,
        category       TEXT        NOT NULL,
        question       TEXT        NOT NULL,
        answer         TEXT        NOT NULL,
        difficulty     TEXT        NOT NULL,
        created_at     TEXT        DEFAULT CURRENT_TIMESTAMP
    )";

pub const USER_ACHIEVEMENTS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS user_achievements (
        user_id         INTEGER    NOT NULL    REFERENCES users(user_id),
        achievement_id  TEXT       NOT NULL,
        earned_at       TEXT       DEFAULT CURRENT_TIMESTAMP,

        UNIQUE (user_id, achievement_id)
    )";

// The UNIQUE key is what turns the assignment insert into first-write-wins.
pub const USER_DAILY_CHALLENGES_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS user_daily_challenges (
        user_id        INTEGER     NOT NULL    REFERENCES users(user_id),
        challenge_id   INTEGER     NOT NULL    REFERENCES challenges(id),
        assigned_date  TEXT        NOT NULL,
        completed      BOOLEAN     NOT NULL    DEFAULT 0,

        UNIQUE (user_id, assigned_date)
    )";

pub const ALL_TABLES: &[&str] = &[
    USERS_SCHEMA,
    BANS_SCHEMA,
    CHALLENGES_SCHEMA,
    SUBMISSIONS_SCHEMA,
    INTERVIEW_QUESTIONS_SCHEMA,
    USER_ACHIEVEMENTS_SCHEMA,
    USER_DAILY_CHALLENGES_SCHEMA,
];
