//! Utility slash commands: /help

use serenity::builder::CreateApplicationCommand;

/// Creates utility commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![create_help_command()]
}

/// Creates the help command
fn create_help_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("help")
        .description("Show help information about the expense tracker bot")
        .to_owned()
}
