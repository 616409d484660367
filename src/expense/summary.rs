//! Period filtering and per-category totals for the /summary command.

use super::SheetRow;
use chrono::{Datelike, Duration, NaiveDate};
use log::debug;
use std::collections::HashMap;
use std::fmt::Write;
use std::str::FromStr;

/// Discord rejects messages longer than this many characters
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Time window a summary covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    Today,
    Week,
    Month,
    #[default]
    All,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Today, Period::Week, Period::Month, Period::All];

    /// Value used for the slash command choice
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Week => "week",
            Period::Month => "month",
            Period::All => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Period::Today => "Today",
            Period::Week => "This Week",
            Period::Month => "This Month",
            Period::All => "All Time",
        }
    }

    /// Whether an expense dated `date` falls in this period, as seen on `today`.
    /// Weeks start on Sunday.
    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            Period::Today => date == today,
            Period::Week => date >= start_of_week(today) && date <= today,
            Period::Month => date.year() == today.year() && date.month() == today.month(),
            Period::All => true,
        }
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "today" => Ok(Period::Today),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "all" => Ok(Period::All),
            other => anyhow::bail!("Unknown period '{}'. Use: today, week, month, all", other),
        }
    }
}

fn start_of_week(today: NaiveDate) -> NaiveDate {
    today - Duration::days(today.weekday().num_days_from_sunday() as i64)
}

/// Aggregated spending for one period
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub period: Period,
    /// Non-blank rows in the sheet before filtering
    pub rows_in_sheet: usize,
    /// Rows that fell inside the period
    pub rows_counted: usize,
    pub total: f64,
    /// Category totals, largest first
    pub by_category: Vec<(String, f64)>,
}

/// Filter rows to `period` and total them by category.
///
/// Rows without a usable amount are skipped. Rows with an unreadable date
/// only count toward [`Period::All`].
pub fn summarize(rows: &[SheetRow], period: Period, today: NaiveDate) -> Summary {
    let mut totals: HashMap<String, f64> = HashMap::new();
    let mut total = 0.0;
    let mut rows_counted = 0;

    for row in rows {
        let in_period = match row.date() {
            Some(date) => period.contains(date, today),
            None => period == Period::All,
        };
        if !in_period {
            continue;
        }

        let Some(amount) = row.amount() else {
            debug!("Skipping sheet row without a numeric amount: {:?}", row.cells);
            continue;
        };

        total += amount;
        rows_counted += 1;
        *totals.entry(row.category()).or_insert(0.0) += amount;
    }

    let mut by_category: Vec<(String, f64)> = totals.into_iter().collect();
    by_category.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Summary {
        period,
        rows_in_sheet: rows.iter().filter(|row| !row.is_blank()).count(),
        rows_counted,
        total,
        by_category,
    }
}

impl Summary {
    /// Discord-markdown report. Category lines that would push the message
    /// past [`DISCORD_MESSAGE_LIMIT`] are folded into a final "more" line.
    pub fn render(&self) -> String {
        if self.rows_in_sheet == 0 {
            return "No expenses recorded yet.".to_string();
        }
        if self.rows_counted == 0 {
            return format!(
                "No expenses recorded for {}.",
                self.period.label().to_lowercase()
            );
        }

        let mut message = format!("📊 **{} Expense Summary**\n\n", self.period.label());
        let _ = write!(message, "**Total:** ${:.2}\n\n", self.total);
        message.push_str("**By Category:**\n");

        // Leave room for the closing "more categories" line
        let budget = DISCORD_MESSAGE_LIMIT - 64;

        for (shown, (category, amount)) in self.by_category.iter().enumerate() {
            let percentage = if self.total != 0.0 {
                amount / self.total * 100.0
            } else {
                0.0
            };
            let line = format!("- {}: ${:.2} ({:.1}%)\n", category, amount, percentage);

            if message.chars().count() + line.chars().count() > budget {
                let hidden = self.by_category.len() - shown;
                let _ = writeln!(message, "- …and {} more categories", hidden);
                break;
            }
            message.push_str(&line);
        }

        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(date: &str, amount: &str, category: &str) -> SheetRow {
        SheetRow::new([date, amount, category, "test"])
    }

    // Friday
    fn today() -> NaiveDate {
        day(2026, 10, 16)
    }

    #[test]
    fn test_period_from_str() {
        assert_eq!("today".parse::<Period>().unwrap(), Period::Today);
        assert_eq!("WEEK".parse::<Period>().unwrap(), Period::Week);
        assert_eq!("month".parse::<Period>().unwrap(), Period::Month);
        assert_eq!("all".parse::<Period>().unwrap(), Period::All);
        assert!("year".parse::<Period>().is_err());
        assert_eq!(Period::default(), Period::All);
    }

    #[test]
    fn test_week_starts_on_sunday() {
        assert_eq!(start_of_week(today()), day(2026, 10, 11));
        // A Sunday is its own week start
        assert_eq!(start_of_week(day(2026, 10, 11)), day(2026, 10, 11));

        assert!(Period::Week.contains(day(2026, 10, 11), today()));
        assert!(Period::Week.contains(today(), today()));
        assert!(!Period::Week.contains(day(2026, 10, 10), today()));
        assert!(!Period::Week.contains(day(2026, 10, 17), today()));
    }

    #[test]
    fn test_month_and_today_bounds() {
        assert!(Period::Month.contains(day(2026, 10, 1), today()));
        assert!(!Period::Month.contains(day(2026, 9, 30), today()));
        assert!(!Period::Month.contains(day(2025, 10, 16), today()));
        assert!(Period::Today.contains(today(), today()));
        assert!(!Period::Today.contains(day(2026, 10, 15), today()));
    }

    #[test]
    fn test_summarize_groups_and_sorts() {
        let rows = vec![
            row("2026-10-16", "10", "food"),
            row("2026-10-15", "30", "transport"),
            row("2026-10-14", "5.5", "Food"),
            row("2026-09-01", "100", "rent"),
        ];

        let summary = summarize(&rows, Period::Month, today());
        assert_eq!(summary.rows_counted, 3);
        assert!((summary.total - 45.5).abs() < 1e-9);
        assert_eq!(summary.by_category[0].0, "transport");
        assert_eq!(summary.by_category[1].0, "food");
        assert!((summary.by_category[1].1 - 15.5).abs() < 1e-9);
    }

    #[test]
    fn test_unreadable_rows() {
        let rows = vec![
            row("someday", "20", "other"),
            row("2026-10-16", "n/a", "food"),
            row("2026-10-16", "4", ""),
        ];

        let all = summarize(&rows, Period::All, today());
        assert_eq!(all.rows_counted, 2);
        assert!((all.total - 24.0).abs() < 1e-9);
        assert_eq!(all.by_category[0], ("other".to_string(), 24.0));

        let today_only = summarize(&rows, Period::Today, today());
        assert_eq!(today_only.rows_counted, 1);
        assert!((today_only.total - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_report() {
        let rows = vec![
            row("2026-10-16", "75", "food"),
            row("2026-10-16", "25", "transport"),
        ];

        let rendered = summarize(&rows, Period::Today, today()).render();
        assert_eq!(
            rendered,
            "📊 **Today Expense Summary**\n\n\
             **Total:** $100.00\n\n\
             **By Category:**\n\
             - food: $75.00 (75.0%)\n\
             - transport: $25.00 (25.0%)\n"
        );
    }

    #[test]
    fn test_render_stays_within_discord_limit() {
        let rows: Vec<SheetRow> = (0..400)
            .map(|i| row("2026-10-16", "1", &format!("hand typed category {}", i)))
            .collect();

        let summary = summarize(&rows, Period::All, today());
        let rendered = summary.render();

        assert!(rendered.chars().count() <= DISCORD_MESSAGE_LIMIT);
        assert!(rendered.contains("**Total:** $400.00"));
        assert!(rendered.trim_end().ends_with("more categories"));
    }

    #[test]
    fn test_blank_rows_do_not_count_as_expenses() {
        let rows = vec![SheetRow::new(["", "", "", ""]), SheetRow::default()];
        let summary = summarize(&rows, Period::All, today());

        assert_eq!(summary.rows_in_sheet, 0);
        assert_eq!(summary.render(), "No expenses recorded yet.");
    }

    #[test]
    fn test_render_empty_cases() {
        assert_eq!(
            summarize(&[], Period::All, today()).render(),
            "No expenses recorded yet."
        );

        let rows = vec![row("2025-01-01", "10", "food")];
        assert_eq!(
            summarize(&rows, Period::Week, today()).render(),
            "No expenses recorded for this week."
        );
    }
}
