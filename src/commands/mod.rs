//! # Command System
//!
//! Slash command (/) definitions and registration.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: /addexpense, /summary and /help

pub mod slash;

// Re-export the CommandHandler from the handler module
pub use crate::command_handler::CommandHandler;

pub use slash::{
    create_slash_commands, get_number_option, get_string_option, register_global_commands,
    register_guild_commands,
};
