//! # Feature: Expense Records
//!
//! Parsing, categorization and summarization of expenses kept in the sheet.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Lenient reading of hand-edited rows (currency symbols, US dates)
//! - 1.0.0: Initial release with regex parsing and keyword categories

pub mod category;
pub mod parser;
pub mod summary;

pub use category::{categorize, Category};
pub use parser::{parse_expense, ParsedExpense, EXAMPLE_FORMATS};
pub use summary::{summarize, Period, Summary};

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Date format written to column A
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One expense as appended to the sheet (columns A..D)
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRow {
    pub date: NaiveDate,
    pub amount: f64,
    pub category: Category,
    pub description: String,
}

impl ExpenseRow {
    /// Cell values in column order: date, amount, category, description
    pub fn to_cells(&self) -> Vec<Value> {
        vec![
            Value::from(self.date.format(DATE_FORMAT).to_string()),
            Value::from(self.amount),
            Value::from(self.category.as_str()),
            Value::from(self.description.clone()),
        ]
    }
}

/// A row as read back from the sheet. Cells are kept as the raw strings the
/// sheet returned since people edit the sheet by hand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    pub cells: Vec<String>,
}

impl SheetRow {
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    /// True when every cell is empty, as for cleared rows inside the data range
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }

    fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(|c| c.trim()).unwrap_or("")
    }

    /// Column A, if it holds a recognizable date
    pub fn date(&self) -> Option<NaiveDate> {
        parse_sheet_date(self.cell(0))
    }

    /// Column B, if it holds a number
    pub fn amount(&self) -> Option<f64> {
        parse_sheet_amount(self.cell(1))
    }

    /// Column C, normalized; blank cells count as "other"
    pub fn category(&self) -> String {
        let category = self.cell(2).to_lowercase();
        if category.is_empty() {
            Category::Other.as_str().to_string()
        } else {
            category
        }
    }
}

impl From<&ExpenseRow> for SheetRow {
    fn from(row: &ExpenseRow) -> Self {
        SheetRow::new([
            row.date.format(DATE_FORMAT).to_string(),
            row.amount.to_string(),
            row.category.as_str().to_string(),
            row.description.clone(),
        ])
    }
}

/// Parse a date cell written by the bot or typed in by hand
pub fn parse_sheet_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }

    for format in [DATE_FORMAT, "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(cell, format) {
            return Some(date);
        }
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(cell, format) {
            return Some(datetime.date());
        }
    }

    None
}

/// Parse an amount cell, tolerating currency formatting like `$1,234.50`
pub fn parse_sheet_amount(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();

    cleaned.parse::<f64>().ok().filter(|amount| amount.is_finite())
}
