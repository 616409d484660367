//! Expense categories and the keyword heuristic that assigns them.

use std::fmt;
use std::str::FromStr;

/// Fixed set of expense categories written to the sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Food,
    Groceries,
    Transport,
    Rent,
    Utilities,
    Entertainment,
    Shopping,
    Travel,
    Health,
    Other,
}

impl Category {
    /// All categories, in the order their names are matched against descriptions
    pub const ALL: [Category; 10] = [
        Category::Food,
        Category::Groceries,
        Category::Transport,
        Category::Rent,
        Category::Utilities,
        Category::Entertainment,
        Category::Shopping,
        Category::Travel,
        Category::Health,
        Category::Other,
    ];

    /// Lowercase name stored in the sheet and used as the slash command choice value
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Groceries => "groceries",
            Category::Transport => "transport",
            Category::Rent => "rent",
            Category::Utilities => "utilities",
            Category::Entertainment => "entertainment",
            Category::Shopping => "shopping",
            Category::Travel => "travel",
            Category::Health => "health",
            Category::Other => "other",
        }
    }

    /// Human-readable label shown in command choices
    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Groceries => "Groceries",
            Category::Transport => "Transport",
            Category::Rent => "Rent",
            Category::Utilities => "Utilities",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Travel => "Travel",
            Category::Health => "Health",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Unknown category '{}'", s))
    }
}

const FOOD_KEYWORDS: &[&str] = &["restaurant", "lunch", "dinner", "breakfast"];
const TRANSPORT_KEYWORDS: &[&str] = &["uber", "taxi", "bus", "train"];
const ENTERTAINMENT_KEYWORDS: &[&str] = &["movie", "game", "netflix"];

/// Pick a category for a free-text description.
/// Priority: category name mentioned > keyword hints > other.
pub fn categorize(description: &str) -> Category {
    let desc = description.to_lowercase();

    if let Some(named) = Category::ALL.iter().find(|c| desc.contains(c.as_str())) {
        return *named;
    }

    let mentions = |keywords: &[&str]| keywords.iter().any(|k| desc.contains(k));

    if mentions(FOOD_KEYWORDS) {
        Category::Food
    } else if mentions(TRANSPORT_KEYWORDS) {
        Category::Transport
    } else if mentions(ENTERTAINMENT_KEYWORDS) {
        Category::Entertainment
    } else {
        Category::Other
    }
}
