//! Admin command surface: stats, user moderation, content authoring and
//! broadcasts. Destructive actions park a [`PendingAction`] that only an
//! explicit `confirm` resolves.

use anyhow::{anyhow, Context, Result};
use serenity::model::channel::Message;
use serenity::model::id::UserId;

use crate::bot::commands::CommandInstance;
use crate::bot::session::{
    ChallengeDraft, ChallengeStep, PendingAction, QuestionDraft, QuestionStep, SessionState,
};
use crate::bot::Bot;
use crate::config::{self, SUPPORTED_LANGUAGES};
use crate::db::challenges::NewChallenge;
use crate::db::{challenges, questions, submissions, users};
use crate::models::{Difficulty, SubmissionStatus};

const PAGE_SIZE: i64 = 10;

impl CommandInstance<'_> {
    fn require_admin(&self) -> Result<()> {
        if config::is_admin(self.msg.author.id.get()) {
            Ok(())
        } else {
            log::info!("Non-admin {} tried an admin command.", self.msg.author.id);
            Err(anyhow!("Access denied."))
        }
    }

    pub(crate) async fn stats(&self) -> Result<String> {
        self.require_admin()?;
        let db = self.bot.db.as_ref();

        let total_users = users::count_users(db)?;
        let active_7d = users::count_active_since(db, 7)?;
        let active_30d = users::count_active_since(db, 30)?;

        let total_challenges = challenges::count_challenges(db)?;
        let easy = challenges::count_by_difficulty(db, Difficulty::Easy)?;
        let medium = challenges::count_by_difficulty(db, Difficulty::Medium)?;
        let hard = challenges::count_by_difficulty(db, Difficulty::Hard)?;

        let total_submissions = submissions::count_submissions(db)?;
        let completed = submissions::count_by_status(db, SubmissionStatus::Completed)?;
        let attempted = submissions::count_by_status(db, SubmissionStatus::Attempted)?;
        let success_rate = completed as f64 / total_submissions.max(1) as f64 * 100.0;

        let total_questions = questions::count_questions(db)?;

        Ok(format!(
            "📊 **Bot Statistics**\n\n\
             👥 Users:\n\
             • Total: {total_users}\n\
             • Active (7 days): {active_7d}\n\
             • Active (30 days): {active_30d}\n\n\
             💻 Challenges:\n\
             • Total: {total_challenges}\n\
             • 🟢 Easy: {easy}\n\
             • 🟡 Medium: {medium}\n\
             • 🔴 Hard: {hard}\n\n\
             📝 Submissions:\n\
             • Total: {total_submissions}\n\
             • Success Rate: {success_rate:.1}%\n\
             • ✅ Completed: {completed}\n\
             • ❌ Attempted: {attempted}\n\n\
             🎯 Interview Questions: {total_questions}"
        ))
    }

    pub(crate) async fn users(&self) -> Result<String> {
        self.require_admin()?;
        let db = self.bot.db.as_ref();

        let page: i64 = self
            .parameters
            .first()
            .map(|p| p.parse())
            .transpose()
            .context("Page must be a number.")?
            .unwrap_or(1)
            .max(1);

        let listed = users::all_users(db, PAGE_SIZE, (page - 1) * PAGE_SIZE)?;
        if listed.is_empty() {
            return Ok(String::from("👥 **User Management**\n\nNo users found."));
        }

        let mut text = format!("👥 **User Management** (Page {page})\n\n");
        for user in listed {
            let status = if users::is_banned(db, user.user_id)? { "🚫" } else { "✅" };
            text += &format!(
                "{status} `{}` - {}\n   Rating: {} | Level: {}\n",
                user.user_id, user.username, user.rating, user.level
            );
        }

        Ok(text)
    }

    pub(crate) async fn user_details(&self) -> Result<String> {
        self.require_admin()?;
        let db = self.bot.db.as_ref();

        let id: i64 = self
            .parameters
            .first()
            .context("Expected a user id, got none.")?
            .parse()
            .context("User id must be a number.")?;

        let Some(user) = users::query_user(db, id)? else {
            return Ok(String::from("❌ User not found."));
        };

        let banned = users::is_banned(db, id)?;
        Ok(format!(
            "👤 **User Info**\n\n\
             ID: `{}`\n\
             Status: {}\n\n\
             {}\n\n\
             Last Active: {}\n\
             Joined: {}",
            user.user_id,
            if banned { "🚫 BANNED" } else { "✅ Active" },
            user,
            user.last_active.as_deref().unwrap_or("never"),
            user.created_at
        ))
    }

    pub(crate) async fn ban(&self) -> Result<String> {
        self.require_admin()?;

        let (id_param, reason_words) = self
            .parameters
            .split_first()
            .context("Expected a user id to ban, got none.")?;
        let id: i64 = id_param.parse().context("User id must be a number.")?;

        let reason = if reason_words.is_empty() {
            String::from("Banned by admin")
        } else {
            reason_words.join(" ")
        };

        users::ban_user(self.bot.db.as_ref(), id, self.msg.author.id.get() as i64, &reason)?;
        self.react_ok().await
    }

    pub(crate) async fn unban(&self) -> Result<String> {
        self.require_admin()?;

        let id: i64 = self
            .parameters
            .first()
            .context("Expected a user id to unban, got none.")?
            .parse()
            .context("User id must be a number.")?;

        if users::unban_user(self.bot.db.as_ref(), id)? {
            self.react_ok().await
        } else {
            Ok(String::from("That user isn't banned."))
        }
    }

    pub(crate) async fn delete_user(&self) -> Result<String> {
        self.require_admin()?;

        let id: i64 = self
            .parameters
            .first()
            .context("Expected a user id to delete, got none.")?
            .parse()
            .context("User id must be a number.")?;

        if users::query_user(self.bot.db.as_ref(), id)?.is_none() {
            return Ok(String::from("❌ User not found."));
        }

        self.park_confirmation(
            PendingAction::DeleteUser(id),
            format!(
                "⚠️ **Confirm Deletion**\n\nAre you sure you want to delete user `{id}`?\n\
                 This action cannot be undone!"
            ),
        )
        .await
    }

    pub(crate) async fn add_challenge(&self) -> Result<String> {
        self.require_admin()?;

        self.bot
            .sessions
            .set(
                self.msg.author.id.get(),
                SessionState::ChallengeForm(ChallengeDraft::new()),
            )
            .await;

        Ok(String::from("➕ **Add New Challenge**\n\nSend the challenge title:"))
    }

    pub(crate) async fn delete_challenge(&self) -> Result<String> {
        self.require_admin()?;

        let id: i64 = self
            .parameters
            .first()
            .context("Expected a challenge id to delete, got none.")?
            .parse()
            .context("Challenge id must be a number.")?;

        if challenges::query_challenge(self.bot.db.as_ref(), id)?.is_none() {
            return Ok(format!("❌ Challenge #{id} not found."));
        }

        self.park_confirmation(
            PendingAction::DeleteChallenge(id),
            format!(
                "⚠️ **Confirm Deletion**\n\nAre you sure you want to delete challenge #{id}?\n\
                 This will also delete all related submissions!"
            ),
        )
        .await
    }

    pub(crate) async fn add_question(&self) -> Result<String> {
        self.require_admin()?;

        self.bot
            .sessions
            .set(
                self.msg.author.id.get(),
                SessionState::QuestionForm(QuestionDraft::new()),
            )
            .await;

        Ok(String::from(
            "➕ **Add Interview Question**\n\nSend the category (e.g. Algorithms, OOP):",
        ))
    }

    pub(crate) async fn delete_question(&self) -> Result<String> {
        self.require_admin()?;

        let id: i64 = self
            .parameters
            .first()
            .context("Expected a question id to delete, got none.")?
            .parse()
            .context("Question id must be a number.")?;

        if questions::query_question(self.bot.db.as_ref(), id)?.is_none() {
            return Ok(format!("❌ Question #{id} not found."));
        }

        self.park_confirmation(
            PendingAction::DeleteQuestion(id),
            format!("⚠️ **Confirm Deletion**\n\nAre you sure you want to delete question #{id}?"),
        )
        .await
    }

    pub(crate) async fn broadcast(&self) -> Result<String> {
        self.require_admin()?;

        if self.parameters.is_empty() {
            return Err(anyhow!("Expected a message to broadcast, got none."));
        }
        let text = self.parameters.join(" ");

        self.park_confirmation(
            PendingAction::Broadcast(text.clone()),
            format!(
                "📢 **Confirm Broadcast**\n\nThis will be sent to every user:\n\n{text}"
            ),
        )
        .await
    }

    async fn park_confirmation(&self, action: PendingAction, warning: String) -> Result<String> {
        self.bot
            .sessions
            .set(self.msg.author.id.get(), SessionState::AwaitingConfirm(action))
            .await;

        let t = config::getenv_call_token();
        Ok(format!("{warning}\n\nType `{t}confirm` to proceed or `{t}cancel` to abort."))
    }
}

/// Runs a previously parked destructive action.
pub(crate) async fn execute_pending(
    cmd: &CommandInstance<'_>,
    action: PendingAction,
) -> Result<String> {
    cmd.require_admin()?;
    let db = cmd.bot.db.as_ref();

    match action {
        PendingAction::DeleteUser(id) => {
            users::delete_user(db, id)?;
            Ok(String::from("✅ User deleted successfully."))
        }
        PendingAction::DeleteChallenge(id) => {
            challenges::delete_challenge(db, id)?;
            Ok(String::from("✅ Challenge deleted successfully."))
        }
        PendingAction::DeleteQuestion(id) => {
            questions::delete_question(db, id)?;
            Ok(String::from("✅ Question deleted successfully."))
        }
        PendingAction::Broadcast(text) => run_broadcast(cmd, &text).await,
    }
}

async fn run_broadcast(cmd: &CommandInstance<'_>, text: &str) -> Result<String> {
    let db = cmd.bot.db.as_ref();
    let ids = users::all_user_ids(db)?;

    let mut delivered = 0;
    let mut failed = 0;

    for id in ids {
        if users::is_banned(db, id)? {
            continue;
        }

        let sent = match UserId::new(id as u64).create_dm_channel(&cmd.ctx.http).await {
            Ok(channel) => channel.id.say(&cmd.ctx.http, text).await.is_ok(),
            Err(_) => false,
        };
        if sent {
            delivered += 1;
        } else {
            failed += 1;
        }

        // Small delay to avoid rate limiting
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    log::info!("[run_broadcast] Broadcast finished: {delivered} delivered, {failed} failed.");
    Ok(format!("📢 Broadcast sent: {delivered} delivered, {failed} failed."))
}

/// Advances the challenge authoring form one step. Invalid input re-prompts
/// without losing the draft; nothing is written until the final step.
pub(crate) async fn advance_challenge_form(
    bot: &Bot,
    msg: &Message,
    mut draft: ChallengeDraft,
) -> Result<String> {
    if !config::is_admin(msg.author.id.get()) {
        return Err(anyhow!("Access denied."));
    }
    let input = msg.content.trim();

    let prompt = match draft.step {
        ChallengeStep::Title => {
            draft.title = Some(input.to_string());
            draft.step = ChallengeStep::Description;
            String::from("Send the challenge description:")
        }
        ChallengeStep::Description => {
            draft.description = Some(input.to_string());
            draft.step = ChallengeStep::Difficulty;
            String::from("Send the difficulty (easy/medium/hard):")
        }
        ChallengeStep::Difficulty => match Difficulty::parse(input) {
            Some(difficulty) => {
                draft.difficulty = Some(difficulty);
                draft.step = ChallengeStep::Language;
                String::from("Send the programming language (python/javascript/cpp):")
            }
            None => String::from("❌ Invalid difficulty. Please send: easy, medium, or hard"),
        },
        ChallengeStep::Language => {
            let language = input.to_lowercase();
            if SUPPORTED_LANGUAGES.contains(&language.as_str()) {
                draft.language = Some(language);
                draft.step = ChallengeStep::TestCases;
                String::from("Send the test cases (JSON format):")
            } else {
                String::from("❌ Invalid language. Please send: python, javascript, or cpp")
            }
        }
        ChallengeStep::TestCases => {
            if serde_json::from_str::<serde_json::Value>(input).is_ok() {
                draft.test_cases = Some(input.to_string());
                draft.step = ChallengeStep::Solution;
                String::from("Send the solution code (optional, send 'skip' to skip):")
            } else {
                String::from("❌ Invalid JSON format. Please send valid JSON test cases.")
            }
        }
        ChallengeStep::Solution => {
            draft.solution = (!input.eq_ignore_ascii_case("skip")).then(|| input.to_string());
            draft.step = ChallengeStep::Points;
            String::from("Send the points value:")
        }
        ChallengeStep::Points => match input.parse::<i64>() {
            Ok(points) if points > 0 => {
                let id = challenges::insert_challenge(
                    bot.db.as_ref(),
                    &NewChallenge {
                        title: draft.title.as_deref().context("Draft lost its title")?,
                        description: draft
                            .description
                            .as_deref()
                            .context("Draft lost its description")?,
                        difficulty: draft.difficulty.context("Draft lost its difficulty")?,
                        language: draft.language.as_deref().context("Draft lost its language")?,
                        test_cases: draft
                            .test_cases
                            .as_deref()
                            .context("Draft lost its test cases")?,
                        solution: draft.solution.as_deref(),
                        points,
                    },
                )?;
                // Form complete; the session stays cleared.
                return Ok(format!("✅ Challenge created successfully!\nChallenge ID: {id}"));
            }
            Ok(_) => String::from("❌ Points must be positive."),
            Err(_) => String::from("❌ Invalid number. Please send a valid points value."),
        },
    };

    bot.sessions
        .set(msg.author.id.get(), SessionState::ChallengeForm(draft))
        .await;
    Ok(prompt)
}

/// Advances the interview-question authoring form one step.
pub(crate) async fn advance_question_form(
    bot: &Bot,
    msg: &Message,
    mut draft: QuestionDraft,
) -> Result<String> {
    if !config::is_admin(msg.author.id.get()) {
        return Err(anyhow!("Access denied."));
    }
    let input = msg.content.trim();

    let prompt = match draft.step {
        QuestionStep::Category => {
            draft.category = Some(input.to_string());
            draft.step = QuestionStep::Question;
            String::from("Send the question text:")
        }
        QuestionStep::Question => {
            draft.question = Some(input.to_string());
            draft.step = QuestionStep::Answer;
            String::from("Send the model answer:")
        }
        QuestionStep::Answer => {
            draft.answer = Some(input.to_string());
            draft.step = QuestionStep::Difficulty;
            String::from("Send the difficulty (easy/medium/hard):")
        }
        QuestionStep::Difficulty => match Difficulty::parse(input) {
            Some(difficulty) => {
                let id = questions::insert_question(
                    bot.db.as_ref(),
                    draft.category.as_deref().context("Draft lost its category")?,
                    draft.question.as_deref().context("Draft lost its question")?,
                    draft.answer.as_deref().context("Draft lost its answer")?,
                    difficulty,
                )?;
                return Ok(format!("✅ Question created successfully!\nQuestion ID: {id}"));
            }
            None => String::from("❌ Invalid difficulty. Please send: easy, medium, or hard"),
        },
    };

    bot.sessions
        .set(msg.author.id.get(), SessionState::QuestionForm(draft))
        .await;
    Ok(prompt)
}
