use anyhow::{anyhow, Context, Result};
use serenity::model::channel::Message;

use crate::bot::{admin, session::SessionState, Bot};
use crate::config;
use crate::db::{self, challenges, daily, questions, submissions, users};
use crate::engine::{daily as daily_engine, leaderboard, rating, review};
use crate::models::{achievement_by_id, SubmissionStatus};

const MAX_CMD_LENGTH: usize = 16;

pub(crate) struct CommandInstance<'a> {
    pub(crate) bot: &'a Bot,
    pub(crate) ctx: &'a serenity::client::Context,
    pub(crate) msg: &'a Message,

    #[allow(dead_code, reason = "Just because it's never used doesn't mean it's never needed :)")]
    pub(crate) command: &'a str,
    pub(crate) parameters: &'a [&'a str],
}

pub struct Commands;
impl Commands {
    pub async fn run_command(
        bot: &Bot,
        ctx: &serenity::client::Context,
        msg: &Message,
    ) -> Result<String> {
        // Split the message's content (on whitespace) into:
        // - The command (first token)
        // - Its parameters (all tokens afterwards)

        // Skip the first letter for the command: it's the call token
        let input: String = msg.content.chars().skip(1).collect();
        let split_tokens = input.split_whitespace().collect::<Vec<_>>();
        let Some((&command, parameters)) = split_tokens.split_first() else {
            return Err(anyhow!("Invalid command syntax."));
        };

        let cmd = CommandInstance { bot, ctx, msg, command, parameters };

        // Execute the command
        let result: String = match command {
                  "start" => cmd.start().await?,
                  "daily" => cmd.daily().await?,
                 "submit" => cmd.submit().await?,
                   "hint" => cmd.hint().await?,
                "profile" => cmd.profile().await?,
            "leaderboard" => cmd.leaderboard().await?,
                 "recent" => cmd.recent().await?,
              "interview" => cmd.interview().await?,
                 "answer" => cmd.answer().await?,
                   "skip" => cmd.skip().await?,
                "confirm" => cmd.confirm().await?,
                 "cancel" => cmd.cancel().await?,
                   "help" => Self::get_help(),

            // Admin surface; every handler checks access itself.
                  "stats" => cmd.stats().await?,
                  "users" => cmd.users().await?,
                   "user" => cmd.user_details().await?,
                    "ban" => cmd.ban().await?,
                  "unban" => cmd.unban().await?,
                "deluser" => cmd.delete_user().await?,
           "addchallenge" => cmd.add_challenge().await?,
           "delchallenge" => cmd.delete_challenge().await?,
            "addquestion" => cmd.add_question().await?,
            "delquestion" => cmd.delete_question().await?,
              "broadcast" => cmd.broadcast().await?,

            _ => {
                if Commands::is_valid_cmd(command) {
                    log::info!("User submitted unknown command: {}", command);
                    return Err(anyhow!(
                        "No such command found: {}, see {}help for commands.",
                        command,
                        config::getenv_call_token()
                    ));
                } else {
                    log::info!("User submitted invalid command: {}", command);
                    return Err(anyhow!("Invalid command syntax."));
                }
            }
        };

        Ok(result)
    }
}

impl CommandInstance<'_> {
    fn user_id(&self) -> i64 {
        self.msg.author.id.get() as i64
    }

    async fn start(&self) -> Result<String> {
        let username = self.msg.author.name.clone();
        let newly_created = users::insert_user(self.bot.db.as_ref(), self.user_id(), &username)?;

        if newly_created {
            Ok(format!(
                "🎉 Welcome to Coding Mentor, {username}!\n\n\
                 I'm your personal coding assistant to help you:\n\
                 📝 Practice with daily coding challenges\n\
                 💻 Get AI-powered code reviews\n\
                 🎯 Prepare for technical interviews\n\
                 🏆 Compete on the leaderboard\n\n\
                 Let's start your coding journey! 🚀 (see {}help)",
                config::getenv_call_token()
            ))
        } else {
            let user = users::query_user(self.bot.db.as_ref(), self.user_id())?
                .context("User vanished between insert and read")?;
            Ok(format!(
                "👋 Welcome back, {username}!\n\n\
                 Ready to continue your coding journey?\n\
                 Current Rating: {} ⭐\n\
                 Level: {} 🎯\n\
                 Streak: {} 🔥",
                user.rating, user.level, user.streak
            ))
        }
    }

    async fn daily(&self) -> Result<String> {
        let db = self.bot.db.as_ref();
        if users::query_user(db, self.user_id())?.is_none() {
            return Ok(not_registered());
        }

        match daily_engine::get_or_assign_daily(db, self.user_id()) {
            Ok(challenge) => Ok(format!(
                "📝 **Daily Challenge**\n\n{challenge}\n\n\
                 Submit with `{}submit {}`. Good luck! 🚀",
                config::getenv_call_token(),
                challenge.id
            )),
            Err(err) if err.downcast_ref::<daily_engine::NoEligibleChallenge>().is_some() => {
                Ok(String::from("❌ No challenges available for your level yet. Check back soon!"))
            }
            Err(err) => Err(err),
        }
    }

    async fn submit(&self) -> Result<String> {
        let db = self.bot.db.as_ref();
        if users::query_user(db, self.user_id())?.is_none() {
            return Ok(not_registered());
        }

        let challenge_id = self
            .parameters
            .first()
            .map(|p| p.parse::<i64>())
            .transpose()
            .context("Challenge id must be a number.")?;

        if let Some(id) = challenge_id {
            if challenges::query_challenge(db, id)?.is_none() {
                return Ok(format!("❌ Challenge #{id} not found."));
            }
        }

        self.bot
            .sessions
            .set(self.user_id() as u64, SessionState::AwaitingCode { challenge_id })
            .await;

        Ok(String::from(
            "💻 **Code Submission**\n\n\
             Please send:\n\
             1. Your code as a text message\n\
             2. Or upload a file (.py, .js, .cpp)\n\n\
             Format (optional):\n\
             ```\nChallenge ID: <number>\nLanguage: <python/javascript/cpp>\n\n<your code here>\n```\n\
             I'll review it with AI and provide feedback! 🤖",
        ))
    }

    async fn hint(&self) -> Result<String> {
        let id: i64 = self
            .parameters
            .first()
            .context("Expected a challenge id for the hint, got none.")?
            .parse()
            .context("Challenge id must be a number.")?;

        let Some(challenge) = challenges::query_challenge(self.bot.db.as_ref(), id)? else {
            return Ok(format!("❌ Challenge #{id} not found."));
        };

        let hint = self
            .bot
            .ai
            .generate_hint(&challenge.description, &challenge.language)
            .await;

        Ok(format!(
            "💡 **Hint for: {}**\n\n{hint}\n\nGood luck! You got this! 💪",
            challenge.title
        ))
    }

    async fn profile(&self) -> Result<String> {
        let db = self.bot.db.as_ref();
        let Some(user) = users::query_user(db, self.user_id())? else {
            return Ok(not_registered());
        };

        let rank = leaderboard::rank(db, self.user_id())?;
        let earned = db::achievements::list_achievements(db, self.user_id())?;

        let completion_rate = if user.total_challenges > 0 {
            user.completed_challenges as f64 / user.total_challenges as f64 * 100.0
        } else {
            0.0
        };

        let mut text = format!(
            "👤 **Profile: {}**\n\n\
             📊 Statistics:\n\
             {} Rank: #{rank}\n\
             ⭐ Rating: {} ({} to next level)\n\
             🎯 Level: {}\n\
             🔥 Streak: {} days\n\
             ✅ Completed: {}/{} ({completion_rate:.1}%)\n\n\
             🏆 Achievements ({}):",
            user.username,
            rating::rank_emoji(rank),
            user.rating,
            rating::points_to_next_level(user.rating),
            user.level,
            user.streak,
            user.completed_challenges,
            user.total_challenges,
            earned.len()
        );

        if earned.is_empty() {
            text += "\nNo achievements yet. Keep coding! 💪";
        } else {
            for id in &earned {
                if let Some(achievement) = achievement_by_id(id) {
                    text += &format!("\n{}\n  {}", achievement.name, achievement.description);
                }
            }
        }

        Ok(text)
    }

    async fn leaderboard(&self) -> Result<String> {
        let db = self.bot.db.as_ref();
        let limit: i64 = self
            .parameters
            .first()
            .map(|p| p.parse())
            .transpose()
            .context("Leaderboard size must be a number.")?
            .unwrap_or(10)
            .clamp(1, 50);

        let top = leaderboard::top_n(db, limit)?;
        if top.is_empty() {
            return Ok(String::from("❌ No users found"));
        }

        let mut text = format!("🏆 **Top {limit} Leaderboard**\n\n");
        for (idx, user) in top.iter().enumerate() {
            let position = idx as i64 + 1;
            let marker = if user.user_id == self.user_id() { "➤ " } else { "" };
            text += &format!(
                "{marker}{} #{position} {}\n   ⭐ {} | 🎯 Lvl {} | ✅ {} | 🔥 {}\n",
                rating::rank_emoji(position),
                user.username,
                user.rating,
                user.level,
                user.completed_challenges,
                user.streak
            );
        }

        // Show the caller's own position when they didn't make the cut.
        if let Some(user) = users::query_user(db, self.user_id())? {
            let rank = leaderboard::rank(db, self.user_id())?;
            if rank > limit {
                text += &format!(
                    "\n━━━━━━━━━━━━━━━━━━━━\nYour position: #{rank}\n⭐ {} | 🎯 Lvl {} | ✅ {}",
                    user.rating, user.level, user.completed_challenges
                );
            }
        }

        Ok(text)
    }

    async fn recent(&self) -> Result<String> {
        let db = self.bot.db.as_ref();
        let recent = submissions::recent_for_user(db, self.user_id(), 5)?;
        if recent.is_empty() {
            return Ok(String::from("No submissions yet. Try a daily challenge!"));
        }

        let mut text = String::from("**Recent submissions:**");
        for sub in recent {
            let title = challenges::query_challenge(db, sub.challenge_id)?
                .map(|c| c.title)
                .unwrap_or_else(|| format!("challenge #{}", sub.challenge_id));
            let emoji = match sub.status {
                SubmissionStatus::Completed => "✅",
                SubmissionStatus::Attempted => "❌",
            };
            text += &format!(
                "\n{emoji} {title} (+{} ⭐) {}",
                sub.points_earned,
                &sub.submitted_at[..sub.submitted_at.len().min(16)]
            );
        }

        Ok(text)
    }

    async fn interview(&self) -> Result<String> {
        let db = self.bot.db.as_ref();
        let category = (!self.parameters.is_empty()).then(|| self.parameters.join(" "));

        let Some(question) = questions::random_question(db, category.as_deref())? else {
            let known = questions::categories(db)?;
            return Ok(if known.is_empty() {
                String::from("❌ No questions available yet.")
            } else {
                format!(
                    "❌ No questions available in this category.\nCategories: {}",
                    known.join(", ")
                )
            });
        };

        self.bot
            .sessions
            .set(self.user_id() as u64, SessionState::AwaitingAnswer { question_id: question.id })
            .await;

        let t = config::getenv_call_token();
        Ok(format!(
            "{question}\n\n━━━━━━━━━━━━━━━━━━━━\n\n\
             💡 You can:\n\
             1. Send your answer and get AI feedback\n\
             2. Type `{t}answer` to see the model answer\n\
             3. Type `{t}skip` for another question"
        ))
    }

    async fn answer(&self) -> Result<String> {
        let user_id = self.user_id() as u64;
        match self.bot.sessions.take(user_id).await {
            Some(SessionState::AwaitingAnswer { question_id }) => {
                let question = questions::query_question(self.bot.db.as_ref(), question_id)?
                    .context("Question no longer exists.")?;
                Ok(format!("📖 **Model Answer**\n\n{}", question.answer))
            }
            Some(other) => {
                self.bot.sessions.set(user_id, other).await;
                Ok(String::from("❌ No active question. Please select a question first."))
            }
            None => Ok(String::from("❌ No active question. Please select a question first.")),
        }
    }

    async fn skip(&self) -> Result<String> {
        self.bot.sessions.clear(self.user_id() as u64).await;
        Ok(format!(
            "Skipped! Use `{}interview` to get another question.",
            config::getenv_call_token()
        ))
    }

    async fn confirm(&self) -> Result<String> {
        let user_id = self.user_id() as u64;
        match self.bot.sessions.take(user_id).await {
            Some(SessionState::AwaitingConfirm(action)) => admin::execute_pending(self, action).await,
            Some(other) => {
                self.bot.sessions.set(user_id, other).await;
                Ok(String::from("Nothing to confirm."))
            }
            None => Ok(String::from("Nothing to confirm.")),
        }
    }

    async fn cancel(&self) -> Result<String> {
        if self.bot.sessions.clear(self.user_id() as u64).await {
            Ok(String::from("Cancelled."))
        } else {
            Ok(String::from("Nothing to cancel."))
        }
    }

    pub(crate) async fn react_ok(&self) -> Result<String> {
        self.msg
            .react(
                &self.ctx.http,
                serenity::all::ReactionType::Unicode(String::from("✅")),
            )
            .await?;

        Ok(String::from(""))
    }
}

/// Non-async helpers
impl Commands {
    /// Ensures that the string slice conforms to C-like identifier regex
    fn is_valid_cmd(s: &str) -> bool {
        s.len() <= MAX_CMD_LENGTH
            && regex::Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$")
                .unwrap()
                .is_match(s)
    }

    /// Gets a help string. Should be updated after a new command is added
    /// TODO: Generate automatically?
    pub fn get_help() -> String {
        let t = config::getenv_call_token();
        format!(
            r#"
**Command List:**
`{t}start`:  Register and see your current stats.
`{t}daily`:  Get today's challenge for your level.
`{t}submit [challenge id]`:  Submit code for AI review.
`{t}hint <challenge id>`:  Get an AI hint for a challenge.
`{t}profile`:  Your stats, rank and achievements.
`{t}leaderboard [n]`:  Top users by rating.
`{t}recent`:  Your recent submissions.
`{t}interview [category]`:  Practice an interview question.
`{t}answer`:  Show the model answer for the active question.
`{t}skip`:  Drop the active question.
`{t}help`:  Get information on supported commands
"#
        )
    }
}

/// Routes a non-command message through the user's conversation state.
pub(crate) async fn handle_session_message(
    bot: &Bot,
    _ctx: &serenity::client::Context,
    msg: &Message,
    state: SessionState,
) -> Result<String> {
    match state {
        SessionState::AwaitingCode { challenge_id } => {
            process_code_submission(bot, msg, challenge_id).await
        }
        SessionState::AwaitingAnswer { question_id } => {
            process_interview_answer(bot, msg, question_id).await
        }
        SessionState::ChallengeForm(draft) => admin::advance_challenge_form(bot, msg, draft).await,
        SessionState::QuestionForm(draft) => admin::advance_question_form(bot, msg, draft).await,
        SessionState::AwaitingConfirm(action) => {
            // Only confirm/cancel resolve a pending action; keep it parked.
            bot.sessions
                .set(msg.author.id.get(), SessionState::AwaitingConfirm(action))
                .await;
            let t = config::getenv_call_token();
            Ok(format!(
                "⚠️ Action pending. Type `{t}confirm` to proceed or `{t}cancel` to abort."
            ))
        }
    }
}

/// The submission pipeline: resolve code and challenge, review with AI,
/// then hand the verdict to the progression engine.
async fn process_code_submission(
    bot: &Bot,
    msg: &Message,
    challenge_hint: Option<i64>,
) -> Result<String> {
    let db = bot.db.as_ref();
    let user_id = msg.author.id.get() as i64;

    let (code, attachment_language) = match msg.attachments.first() {
        Some(attachment) => {
            let bytes = attachment
                .download()
                .await
                .context("Could not download the attached file.")?;
            let code = String::from_utf8(bytes).context("Attached file is not UTF-8 text.")?;
            (code, language_from_filename(&attachment.filename))
        }
        None => (msg.content.clone(), None),
    };

    let language = attachment_language
        .map(String::from)
        .or_else(|| extract_language(&code))
        .unwrap_or_else(|| String::from("python"));

    // Explicit header beats the `submit` parameter beats today's daily.
    let challenge = match extract_challenge_id(&code).or(challenge_hint) {
        Some(id) => challenges::query_challenge(db, id)?,
        None => daily::query_daily_challenge(db, user_id, &db::today_string())?,
    };
    let Some(challenge) = challenge else {
        return Ok(String::from(
            "❌ Please specify a valid Challenge ID or request your daily challenge first.",
        ));
    };

    let code = strip_metadata(&code);

    let feedback = bot.ai.review_code(&code, &language, &challenge.description).await;
    let status = review::classify_feedback(&feedback);

    let outcome =
        review::record_submission(db, user_id, &challenge, &code, &language, status, &feedback)?;

    let mut text = format!(
        "✅ **Code Review Complete!**\n\n\
         📊 Challenge: {}\n\
         Status: {}\n\
         Points Earned: +{} ⭐\n\
         New Rating: {}\n\
         Level: {} 🎯\n\
         Streak: {} 🔥\n",
        challenge.title,
        outcome.status.as_str(),
        outcome.points_earned,
        outcome.new_rating,
        outcome.new_level,
        outcome.streak
    );

    for id in &outcome.new_achievements {
        if let Some(achievement) = achievement_by_id(id) {
            text += &format!("\n🏆 Achievement unlocked: {}!", achievement.name);
        }
    }

    text += &format!("\n\n🤖 AI Feedback:\n{feedback}\n\nKeep coding! 💪");
    Ok(text)
}

async fn process_interview_answer(bot: &Bot, msg: &Message, question_id: i64) -> Result<String> {
    let question = questions::query_question(bot.db.as_ref(), question_id)?
        .context("Question no longer exists.")?;

    let evaluation = bot.ai.evaluate_answer(&question.question, &msg.content).await;

    Ok(format!(
        "✅ **Answer Evaluated!**\n\n🤖 AI Feedback:\n{evaluation}\n\n\
         Great job practicing! Keep it up! 💪"
    ))
}

fn not_registered() -> String {
    format!("❌ Please use {}start first", config::getenv_call_token())
}

fn extract_challenge_id(code: &str) -> Option<i64> {
    regex::Regex::new(r"(?i)challenge id:\s*(\d+)")
        .unwrap()
        .captures(code)
        .and_then(|caps| caps.get(1)?.as_str().parse().ok())
}

fn extract_language(code: &str) -> Option<String> {
    regex::Regex::new(r"(?i)language:\s*(python|javascript|cpp)")
        .unwrap()
        .captures(code)
        .map(|caps| caps[1].to_lowercase())
}

/// Drops the `Challenge ID:` / `Language:` header lines before review.
fn strip_metadata(code: &str) -> String {
    regex::Regex::new(r"(?im)^(?:challenge id|language):.*\n?")
        .unwrap()
        .replace_all(code, "")
        .trim()
        .to_string()
}

fn language_from_filename(filename: &str) -> Option<&'static str> {
    if filename.ends_with(".py") {
        Some("python")
    } else if filename.ends_with(".js") {
        Some("javascript")
    } else if filename.ends_with(".cpp") {
        Some("cpp")
    } else {
        None
    }
}
