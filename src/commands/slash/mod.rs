//! Slash command definitions, registration and option helpers

pub mod expense;
pub mod utility;

use anyhow::Result;
use log::info;
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::Command;
use serenity::model::application::interaction::application_command::CommandDataOption;
use serenity::model::id::GuildId;
use serenity::prelude::Context;

/// All slash commands the bot registers
pub fn create_slash_commands() -> Vec<CreateApplicationCommand> {
    let mut commands = expense::create_commands();
    commands.extend(utility::create_commands());
    commands
}

/// Register commands globally (can take up to an hour to show up in every guild)
pub async fn register_global_commands(ctx: &Context) -> Result<()> {
    let commands = create_slash_commands();
    let count = commands.len();

    Command::set_global_application_commands(&ctx.http, |builder| {
        builder.set_application_commands(commands)
    })
    .await?;

    info!("Registered {} global slash commands", count);
    Ok(())
}

/// Register commands on a single guild (visible immediately, for development)
pub async fn register_guild_commands(ctx: &Context, guild_id: GuildId) -> Result<()> {
    let commands = create_slash_commands();
    let count = commands.len();

    guild_id
        .set_application_commands(&ctx.http, |builder| {
            builder.set_application_commands(commands)
        })
        .await?;

    info!("Registered {} slash commands for guild {}", count, guild_id);
    Ok(())
}

/// Get a string option value by name
pub fn get_string_option(options: &[CommandDataOption], name: &str) -> Option<String> {
    options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_ref())
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Get a number option value by name
pub fn get_number_option(options: &[CommandDataOption], name: &str) -> Option<f64> {
    options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_ref())
        .and_then(|v| v.as_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_slash_commands() {
        let commands = create_slash_commands();
        let names: Vec<String> = commands
            .iter()
            .filter_map(|c| c.0.get("name").and_then(|v| v.as_str()).map(String::from))
            .collect();

        assert_eq!(names, vec!["addexpense", "summary", "help"]);
    }

    #[test]
    fn test_addexpense_options() {
        let commands = expense::create_commands();
        let options = commands[0].0["options"].as_array().unwrap();

        assert_eq!(options.len(), 3);
        assert_eq!(options[0]["name"], "amount");
        assert_eq!(options[0]["required"], true);
        assert_eq!(options[2]["name"], "category");
        assert_eq!(options[2]["choices"].as_array().unwrap().len(), 10);
    }
}
