//! Expense operations shared by the message listener and the slash commands.

use crate::expense::{categorize, parse_expense, summarize, Category, ExpenseRow, Period};
use crate::sheets::ExpenseSheet;
use anyhow::Result;
use chrono::NaiveDate;
use log::info;
use std::sync::Arc;

#[derive(Clone)]
pub struct ExpenseTracker {
    sheet: Arc<dyn ExpenseSheet>,
}

impl ExpenseTracker {
    pub fn new(sheet: Arc<dyn ExpenseSheet>) -> Self {
        Self { sheet }
    }

    /// Parse free text and record it. Returns `None` without touching the
    /// sheet when the text isn't a recognizable expense.
    pub async fn record_text(&self, text: &str, today: NaiveDate) -> Result<Option<ExpenseRow>> {
        let Some(parsed) = parse_expense(text) else {
            return Ok(None);
        };

        let row = self.record(parsed.amount, &parsed.description, None, today).await?;
        Ok(Some(row))
    }

    /// Record an expense with already-typed fields. The category is guessed
    /// from the description when not given.
    pub async fn record(
        &self,
        amount: f64,
        description: &str,
        category: Option<Category>,
        today: NaiveDate,
    ) -> Result<ExpenseRow> {
        if !amount.is_finite() || amount <= 0.0 {
            anyhow::bail!("Amount must be a positive number, got {}", amount);
        }

        let description = description.trim();
        if description.is_empty() {
            anyhow::bail!("Description must not be empty");
        }

        let row = ExpenseRow {
            date: today,
            amount,
            category: category.unwrap_or_else(|| categorize(description)),
            description: description.to_string(),
        };

        self.sheet.append_row(&row).await?;
        info!(
            "Recorded expense: {:.2} {} ({})",
            row.amount, row.description, row.category
        );

        Ok(row)
    }

    /// Rendered summary report for `period`
    pub async fn summary(&self, period: Period, today: NaiveDate) -> Result<String> {
        let rows = self.sheet.read_rows().await?;
        Ok(summarize(&rows, period, today).render())
    }
}
