//! Expense tracker Discord bot entry point
//!
//! Configuration can come from:
//! - config.yaml (or the file named by CONFIG_FILE)
//! - Environment variables

use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use serenity::async_trait;
use serenity::model::application::interaction::{Interaction, InteractionResponseType};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use std::sync::Arc;

use expense_tracker::command_handler::{COMMAND_ERROR_REPLY, MESSAGE_ERROR_REPLY};
use expense_tracker::commands::{register_global_commands, register_guild_commands, CommandHandler};
use expense_tracker::config::Config;
use expense_tracker::sheets::GoogleSheets;
use expense_tracker::tracker::ExpenseTracker;

/// Handler for the bot's Discord events
struct Handler {
    command_handler: Arc<CommandHandler>,
    guild_id: Option<GuildId>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        if let Err(e) = self.command_handler.handle_message(&ctx, &msg).await {
            error!("Error processing message: {e:#}");
            if let Err(why) = msg.reply(&ctx, MESSAGE_ERROR_REPLY).await {
                error!("Failed to send error message: {why}");
            }
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected and ready!", ready.user.name);
        info!("Connected to {} guilds", ready.guilds.len());

        // Register slash commands
        if let Some(guild_id) = self.guild_id {
            info!("Development mode: Registering commands for guild {guild_id}");
            if let Err(e) = register_guild_commands(&ctx, guild_id).await {
                error!("Failed to register guild slash commands: {e}");
            }
        } else {
            info!("Production mode: Registering commands globally");
            if let Err(e) = register_global_commands(&ctx).await {
                error!("Failed to register global slash commands: {e}");
            }
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::ApplicationCommand(command) = interaction else {
            return;
        };

        if let Err(e) = self
            .command_handler
            .handle_slash_command(&ctx, &command)
            .await
        {
            error!(
                "Error handling slash command '{}': {:#}",
                command.data.name, e
            );

            // Edit succeeds only when the response was already deferred or sent
            #[allow(clippy::redundant_pattern_matching)]
            if let Err(_) = command
                .edit_original_interaction_response(&ctx.http, |response| {
                    response.content(COMMAND_ERROR_REPLY)
                })
                .await
            {
                let _ = command
                    .create_interaction_response(&ctx.http, |response| {
                        response
                            .kind(InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|message| {
                                message.content(COMMAND_ERROR_REPLY).ephemeral(true)
                            })
                    })
                    .await;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::auto_load()?;

    // Set up logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.log_level),
    )
    .init();

    info!("Starting Expense Tracker Discord Bot...");

    // Fail fast on bad credentials rather than on the first expense
    let sheets = GoogleSheets::from_credentials_file(
        &config.google_credentials_path,
        config.google_sheet_id.clone(),
        config.sheet_name.clone(),
    )?;
    info!("Google Sheets API initialized successfully!");

    let tracker = ExpenseTracker::new(Arc::new(sheets));
    let handler = Handler {
        command_handler: Arc::new(CommandHandler::new(tracker, config.expense_prefix.clone())),
        guild_id: config.guild_id().map(GuildId),
    };

    // Configure gateway intents
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| anyhow::anyhow!("Client creation failed: {}", e))?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down...");
                shard_manager.lock().await.shutdown_all().await;
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    info!("Connecting to Discord gateway...");

    // Blocks until the gateway disconnects or shutdown is requested
    client
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("Gateway connection failed: {}", e))?;

    info!("Bot shut down");
    Ok(())
}
