use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;

use crate::ai::MistralClient;
use crate::config;
use crate::db::{users, Database};

pub mod admin;
pub mod commands;
pub mod session;

use session::Sessions;

pub struct Bot {
    pub db: Arc<Database>,
    pub ai: MistralClient,
    pub sessions: Sessions,
    call_token: char,
}

pub async fn run_bot(db: Arc<Database>) -> Result<()> {
    let token = env::var("DISCORD_TOKEN")
        .context("Expected 'DISCORD_TOKEN=<token>' in .env in project root.")?;

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let bot = Bot {
        db,
        ai: MistralClient::new()?,
        sessions: Sessions::default(),
        call_token: config::getenv_call_token(),
    };

    let mut client = Client::builder(&token, intents)
        .event_handler(bot)
        .await
        .context("Error creating client.")?;

    client.start().await?;

    Ok(())
}

#[async_trait]
impl EventHandler for Bot {
    async fn ready(&self, _ctx: serenity::client::Context, _ready: Ready) {
        log::info!("Bot is connected and ready!");
    }

    async fn message(&self, ctx: serenity::client::Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let user_id = msg.author.id.get();

        // Banned users get no responses at all, commands or otherwise.
        match users::is_banned(&self.db, user_id as i64) {
            Ok(false) => {}
            Ok(true) => {
                log::debug!("Ignoring message from banned user {user_id}");
                return;
            }
            Err(err) => {
                log::error!("Could not check ban status for {user_id}: {err}");
                return;
            }
        }

        let content = msg.content.clone();

        let response = if content.starts_with(self.call_token) && content.len() > 1 {
            match commands::Commands::run_command(self, &ctx, &msg).await {
                Ok(message) => message,
                Err(err) => format!("Error: {err}"),
            }
        } else if let Some(state) = self.sessions.take(user_id).await {
            // Mid-flow message: route through the conversation state.
            match commands::handle_session_message(self, &ctx, &msg, state).await {
                Ok(message) => message,
                Err(err) => format!("Error: {err}"),
            }
        } else {
            return;
        };

        // Discord doesn't like sending empty messages.
        // If everything is ok and the bot doesn't have anything to say, return early.
        if response.is_empty() {
            return;
        }

        // Attempt to send response.
        // If something goes wrong, we want to let the user know, if possible,
        //   so we try to send another "Oops, internal error" before exiting.
        // If *that* message can't be sent, it can't be helped...
        //   but it will be logged on our end anyways.
        if let Err(why) = msg.channel_id.say(&ctx.http, response).await {
            let _ = msg.channel_id.say(&ctx.http, "Oops, internal error.").await;
            log::error!("Error sending message: {why:?}");
        }
    }
}
