//! Reminder evaluation for upcoming predicted events.
//!
//! Compares the predictions in [`CycleData`] against "today" and reports
//! which alerts are due. Delivery (terminal banner, desktop notification) is
//! up to the caller.

use crate::classify::FERTILE_DAYS_BEFORE_OVULATION;
use crate::CycleData;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A due reminder
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reminder {
    /// Period expected in exactly the configured lead time
    PeriodSoon { days: u32 },
    /// Period expected today
    PeriodToday,
    /// Predicted ovulation is today
    OvulationToday,
    /// Inside the fertile window, ovulation still ahead
    FertileWindow { days_until_ovulation: u32 },
}

impl Reminder {
    pub fn title(&self) -> &'static str {
        match self {
            Reminder::PeriodSoon { .. } => "Period Reminder",
            Reminder::PeriodToday => "Period Expected",
            Reminder::OvulationToday => "Ovulation Day",
            Reminder::FertileWindow { .. } => "Fertile Window",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Reminder::PeriodSoon { days } => {
                format!("Your period is expected in {} days", days)
            }
            Reminder::PeriodToday => "Your period is expected today".to_string(),
            Reminder::OvulationToday => "Today is your predicted ovulation day".to_string(),
            Reminder::FertileWindow {
                days_until_ovulation,
            } => format!(
                "Fertile window - {} days until ovulation",
                days_until_ovulation
            ),
        }
    }
}

impl fmt::Display for Reminder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title(), self.message())
    }
}

/// Reminders due on `today` for the given predictions
///
/// A period reminder fires when the predicted start is exactly
/// `days_before` away, or on the day itself. Ovulation and fertile-window
/// reminders are only considered when a period prediction exists.
pub fn upcoming_reminders(cycle: &CycleData, today: NaiveDate, days_before: u32) -> Vec<Reminder> {
    let mut due = Vec::new();

    let Some(next_period) = cycle.next_predicted_period else {
        return due;
    };

    let until_period = (next_period - today).num_days();
    if until_period == i64::from(days_before) {
        due.push(Reminder::PeriodSoon { days: days_before });
    } else if until_period == 0 {
        due.push(Reminder::PeriodToday);
    }

    if let Some(ovulation) = cycle.next_predicted_ovulation {
        let until_ovulation = (ovulation - today).num_days();
        if until_ovulation == 0 {
            due.push(Reminder::OvulationToday);
        } else if until_ovulation > 0
            && until_ovulation.unsigned_abs() <= FERTILE_DAYS_BEFORE_OVULATION
        {
            due.push(Reminder::FertileWindow {
                days_until_ovulation: until_ovulation as u32,
            });
        }
    }

    if !due.is_empty() {
        tracing::debug!("{} reminder(s) due on {}", due.len(), today);
    }

    due
}
