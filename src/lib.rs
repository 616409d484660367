// Core layer - shared types and configuration
pub mod config;
pub mod expense;

// Infrastructure
pub mod sheets;

// Application layer
pub mod command_handler;
pub mod commands;
pub mod tracker;

pub use config::Config;

pub use expense::{categorize, parse_expense, Category, ExpenseRow, Period, SheetRow, Summary};
pub use sheets::{ExpenseSheet, GoogleSheets, InMemorySheet};
pub use tracker::ExpenseTracker;
