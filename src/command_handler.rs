//! # Feature: Command Handling
//!
//! Routes Discord messages and slash command interactions to the expense tracker.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Ephemeral slash replies, deferred /summary
//! - 1.0.0: DM and `!expense` prefix parsing, /addexpense, /summary, /help

use crate::commands::slash::{get_number_option, get_string_option};
use crate::expense::{Category, ExpenseRow, Period, EXAMPLE_FORMATS};
use crate::tracker::ExpenseTracker;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::channel::Message;
use serenity::prelude::Context;

/// Reply sent when processing a message fails
pub const MESSAGE_ERROR_REPLY: &str =
    "Sorry, there was an error processing your expense. Please try again later.";

/// Reply sent when processing a slash command fails
pub const COMMAND_ERROR_REPLY: &str = "There was an error processing your request.";

#[derive(Clone)]
pub struct CommandHandler {
    tracker: ExpenseTracker,
    prefix: String,
}

impl CommandHandler {
    pub fn new(tracker: ExpenseTracker, prefix: impl Into<String>) -> Self {
        Self {
            tracker,
            prefix: prefix.into(),
        }
    }

    /// Handle a regular chat message: DMs and prefixed messages are treated as expenses
    pub async fn handle_message(&self, ctx: &Context, msg: &Message) -> Result<()> {
        let is_dm = msg.guild_id.is_none();
        let Some(text) = expense_text(&msg.content, is_dm, &self.prefix) else {
            return Ok(());
        };

        debug!(
            "Expense message from {} ({}): {}",
            msg.author.name,
            if is_dm { "DM" } else { "guild" },
            text
        );

        let reply = match self.tracker.record_text(text, today()).await? {
            Some(row) => recorded_reply(&row),
            None => unparsed_reply(&self.prefix),
        };

        msg.reply(ctx, reply).await?;
        Ok(())
    }

    /// Handle a slash command interaction
    pub async fn handle_slash_command(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        info!(
            "Slash command /{} from {}",
            command.data.name, command.user.name
        );

        match command.data.name.as_str() {
            "addexpense" => self.handle_addexpense(ctx, command).await,
            "summary" => self.handle_summary(ctx, command).await,
            "help" => {
                respond_ephemeral(ctx, command, &help_message(&self.prefix)).await
            }
            other => {
                warn!("Unknown slash command: {}", other);
                respond_ephemeral(ctx, command, "Unknown command.").await
            }
        }
    }

    async fn handle_addexpense(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let options = &command.data.options;

        let amount = get_number_option(options, "amount")
            .ok_or_else(|| anyhow::anyhow!("Missing amount option"))?;
        let description = get_string_option(options, "description")
            .ok_or_else(|| anyhow::anyhow!("Missing description option"))?;
        let category = get_string_option(options, "category")
            .map(|c| c.parse::<Category>())
            .transpose()?;

        if amount <= 0.0 || description.trim().is_empty() {
            return respond_ephemeral(
                ctx,
                command,
                "Please give a positive amount and a description.",
            )
            .await;
        }

        let row = self
            .tracker
            .record(amount, &description, category, today())
            .await?;

        respond_ephemeral(ctx, command, &recorded_reply(&row)).await
    }

    async fn handle_summary(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        // Reading the sheet can outlast the 3 second interaction deadline
        command
            .create_interaction_response(&ctx.http, |response| {
                response
                    .kind(InteractionResponseType::DeferredChannelMessageWithSource)
                    .interaction_response_data(|message| message.ephemeral(true))
            })
            .await?;

        let period = get_string_option(&command.data.options, "period")
            .map(|p| p.parse::<Period>())
            .transpose()?
            .unwrap_or_default();

        let summary = self.tracker.summary(period, today()).await?;

        command
            .edit_original_interaction_response(&ctx.http, |response| response.content(summary))
            .await?;

        Ok(())
    }
}

async fn respond_ephemeral(
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    content: &str,
) -> Result<()> {
    command
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(content).ephemeral(true))
        })
        .await?;
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Extract the expense text from a message, if the message is meant for the bot.
///
/// In a DM every message counts. Elsewhere the message must start with
/// `prefix` as a whole word.
pub fn expense_text<'a>(content: &'a str, is_direct_message: bool, prefix: &str) -> Option<&'a str> {
    let content = content.trim();

    if let Some(rest) = content.strip_prefix(prefix) {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return Some(rest.trim());
        }
    }

    if is_direct_message {
        Some(content)
    } else {
        None
    }
}

/// Confirmation for a recorded expense
pub fn recorded_reply(row: &ExpenseRow) -> String {
    format!(
        "✅ Expense recorded: ${:.2} for {} (Category: {})",
        row.amount, row.description, row.category
    )
}

/// Guidance sent when a message couldn't be parsed
pub fn unparsed_reply(prefix: &str) -> String {
    let mut reply = String::from("I couldn't understand that expense. Please use formats like:\n");
    for format in EXAMPLE_FORMATS {
        reply.push_str(&format!("- `{}`\n", format));
    }
    reply.push_str(&format!("In server channels, start with `{}`.", prefix));
    reply
}

/// Text for /help
pub fn help_message(prefix: &str) -> String {
    let formats: String = EXAMPLE_FORMATS
        .iter()
        .map(|f| format!("- `{}`\n", f))
        .collect();

    format!(
        "**🤖 Expense Tracker Bot Help**\n\n\
         This bot helps you track your expenses in a Google Sheet. Here's how to use it:\n\n\
         **Direct Messages:**\n\
         Simply send your expense in any of these formats:\n\
         {formats}\n\
         **In Server Channels:**\n\
         Use the `{prefix}` command followed by your expense:\n\
         - `{prefix} $50 groceries`\n\n\
         **Slash Commands:**\n\
         - `/addexpense` - Add a new expense with optional category\n\
         - `/summary` - View expense summary for today, this week, this month or all time\n\
         - `/help` - Show this help message\n\n\
         The bot will automatically categorize your expenses when possible!"
    )
}
