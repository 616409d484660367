//! Expense slash commands: /addexpense, /summary

use crate::expense::{Category, Period};
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

/// Creates expense commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![create_addexpense_command(), create_summary_command()]
}

/// Creates the addexpense command
fn create_addexpense_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("addexpense")
        .description("Add a new expense")
        .create_option(|option| {
            option
                .name("amount")
                .description("Amount spent")
                .kind(CommandOptionType::Number)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("description")
                .description("Description of expense")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("category")
                .description("Expense category (guessed from the description if omitted)")
                .kind(CommandOptionType::String)
                .required(false);
            for category in Category::ALL {
                option.add_string_choice(category.label(), category.as_str());
            }
            option
        })
        .to_owned()
}

/// Creates the summary command
fn create_summary_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("summary")
        .description("Get expense summary")
        .create_option(|option| {
            option
                .name("period")
                .description("Time period (defaults to all time)")
                .kind(CommandOptionType::String)
                .required(false);
            for period in Period::ALL {
                option.add_string_choice(period.label(), period.as_str());
            }
            option
        })
        .to_owned()
}
