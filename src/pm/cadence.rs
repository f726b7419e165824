//! Recurrence table for preventive-maintenance schedules.
//!
//! Month and year lengths are fixed-day approximations: a monthly schedule
//! due on 2024-01-01 is next due on 2024-01-31.

use chrono::{DateTime, Duration, Utc};

use crate::models::ParseEnumError;

/// Longest period a schedule may span, about one hundred years.
pub const MAX_PERIOD_DAYS: i64 = 36_500;

/// A recognised `frequency_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Daily,
    Weekly,
    Fortnightly,
    Monthly,
    Quarterly,
    SixMonthly,
    Yearly,
    /// Legacy unit multiplied by the schedule interval
    Days,
    Weeks,
    Months,
    Years,
}

impl Cadence {
    pub fn parse(frequency_type: &str) -> Result<Self, ParseEnumError> {
        let key = frequency_type
            .trim()
            .to_ascii_lowercase()
            .replace([' ', '-'], "_");

        let cadence = match key.as_str() {
            "daily" => Cadence::Daily,
            "weekly" => Cadence::Weekly,
            "fortnightly" => Cadence::Fortnightly,
            "monthly" => Cadence::Monthly,
            "quarterly" => Cadence::Quarterly,
            "6_monthly" | "six_monthly" => Cadence::SixMonthly,
            "yearly" => Cadence::Yearly,
            "days" => Cadence::Days,
            "weeks" => Cadence::Weeks,
            "months" => Cadence::Months,
            "years" => Cadence::Years,
            _ => {
                return Err(ParseEnumError {
                    kind: "frequency type",
                    value: frequency_type.to_string(),
                });
            }
        };

        Ok(cadence)
    }

    /// Stored spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
            Cadence::Fortnightly => "fortnightly",
            Cadence::Monthly => "monthly",
            Cadence::Quarterly => "quarterly",
            Cadence::SixMonthly => "6 monthly",
            Cadence::Yearly => "yearly",
            Cadence::Days => "days",
            Cadence::Weeks => "weeks",
            Cadence::Months => "months",
            Cadence::Years => "years",
        }
    }

    /// Length of one period in days.
    pub fn period_days(&self, interval: i32) -> i64 {
        let interval = i64::from(interval.max(1));
        match self {
            Cadence::Daily => 1,
            Cadence::Weekly => 7,
            Cadence::Fortnightly => 14,
            Cadence::Monthly => 30,
            Cadence::Quarterly => 91,
            Cadence::SixMonthly => 182,
            Cadence::Yearly => 365,
            Cadence::Days => interval,
            Cadence::Weeks => 7 * interval,
            Cadence::Months => 30 * interval,
            Cadence::Years => 365 * interval,
        }
    }
}

/// Period in days for a stored `frequency_type`.
///
/// Unrecognised frequency types fall back to `interval` days.
pub fn period_days(frequency_type: &str, interval: i32) -> i64 {
    match Cadence::parse(frequency_type) {
        Ok(cadence) => cadence.period_days(interval),
        Err(_) => i64::from(interval.max(1)),
    }
}

/// Next due date after `due` for a stored schedule.
///
/// Returns `None` when the result falls outside the representable date range.
pub fn advance(due: DateTime<Utc>, frequency_type: &str, interval: i32) -> Option<DateTime<Utc>> {
    let days = Duration::try_days(period_days(frequency_type, interval))?;
    due.checked_add_signed(days)
}
