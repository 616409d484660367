//! Free-text expense parsing.
//!
//! Accepted formats, tried in order:
//! - `$50 groceries`
//! - `spent $30 on lunch`
//! - `45.50 taxi`
//! - `food $25.99`

use once_cell::sync::Lazy;
use regex::Regex;

/// Amount and description pulled out of a chat message
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExpense {
    pub amount: f64,
    pub description: String,
}

/// Which capture group holds what
#[derive(Debug, Clone, Copy)]
enum Layout {
    AmountFirst,
    DescriptionFirst,
}

static EXPENSE_PATTERNS: Lazy<Vec<(Regex, Layout)>> = Lazy::new(|| {
    [
        (r"(?i)^\$?([0-9]+(?:\.[0-9]+)?)\s+(.+)$", Layout::AmountFirst),
        (r"(?i)spent\s+\$?([0-9]+(?:\.[0-9]+)?)\s+(?:on|for)\s+(.+)", Layout::AmountFirst),
        (r"(?i)^([0-9]+(?:\.[0-9]+)?)\s+(.+)$", Layout::AmountFirst),
        (r"(?i)^(.+)\s+\$?([0-9]+(?:\.[0-9]+)?)$", Layout::DescriptionFirst),
    ]
    .into_iter()
    .map(|(pattern, layout)| (Regex::new(pattern).expect("Invalid expense regex"), layout))
    .collect()
});

/// Example formats shown to users when a message can't be parsed
pub const EXAMPLE_FORMATS: [&str; 4] = [
    "$50 groceries",
    "spent $30 on lunch",
    "45.50 taxi",
    "food $25.99",
];

/// Parse an expense out of free text. The first matching pattern decides the result.
pub fn parse_expense(text: &str) -> Option<ParsedExpense> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let (caps, layout) = EXPENSE_PATTERNS
        .iter()
        .find_map(|(re, layout)| re.captures(text).map(|caps| (caps, *layout)))?;

    let (amount, description) = match layout {
        Layout::AmountFirst => (&caps[1], &caps[2]),
        Layout::DescriptionFirst => (&caps[2], &caps[1]),
    };

    let amount: f64 = amount.parse().ok()?;
    let description = description.trim();

    if !amount.is_finite() || amount <= 0.0 || description.is_empty() {
        return None;
    }

    Some(ParsedExpense {
        amount,
        description: description.to_string(),
    })
}
