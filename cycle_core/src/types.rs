//! Core domain types for cycle tracking.
//!
//! This module defines the value objects passed between the engine and its
//! collaborators:
//! - Logged period entries and their flow intensity
//! - Derived cycle statistics and predictions
//! - Per-day classification results

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Fallback cycle length when history has no usable samples
pub const DEFAULT_CYCLE_LENGTH: u32 = 28;

/// Fallback period duration when history has no usable samples
pub const DEFAULT_PERIOD_DURATION: u32 = 5;

// ============================================================================
// Period Entries
// ============================================================================

/// Flow intensity recorded for a period
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Light,
    #[default]
    Medium,
    Heavy,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::Light => "light",
            Flow::Medium => "medium",
            Flow::Heavy => "heavy",
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flow {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Flow::Light),
            "medium" => Ok(Flow::Medium),
            "heavy" => Ok(Flow::Heavy),
            other => Err(crate::Error::InvalidEntry(format!(
                "unknown flow '{}' (expected light, medium or heavy)",
                other
            ))),
        }
    }
}

/// One observed period, covering `[start_date, end_date]` inclusive.
///
/// A missing `end_date` means a single-day period. `end_date >= start_date`
/// is a caller precondition; the engine does not check it, but
/// [`PeriodEntry::validate`] is available for callers that want to.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodEntry {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub flow: Flow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PeriodEntry {
    /// Create an entry with a freshly generated id
    pub fn new(
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        flow: Flow,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            start_date,
            end_date,
            flow,
            notes,
        }
    }

    /// Last day covered by this entry
    pub fn last_day(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.start_date)
    }

    /// Whether `date` falls inside this entry's inclusive range
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.last_day()
    }

    /// Check the `end_date >= start_date` precondition
    pub fn validate(&self) -> crate::Result<()> {
        if self.id.trim().is_empty() {
            return Err(crate::Error::InvalidEntry("entry id is empty".into()));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(crate::Error::InvalidEntry(format!(
                    "end date {} is before start date {}",
                    end, self.start_date
                )));
            }
        }
        Ok(())
    }
}

/// Partial update applied to a stored entry.
///
/// `None` leaves a field untouched. For the optional fields the inner
/// `Option` is the new value, so `Some(None)` clears it.
#[derive(Clone, Debug, Default)]
pub struct PeriodPatch {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub flow: Option<Flow>,
    pub notes: Option<Option<String>>,
}

impl PeriodPatch {
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.flow.is_none()
            && self.notes.is_none()
    }

    /// Apply the patch, keeping the entry's id
    pub fn apply_to(&self, entry: &mut PeriodEntry) {
        if let Some(start) = self.start_date {
            entry.start_date = start;
        }
        if let Some(end) = self.end_date {
            entry.end_date = end;
        }
        if let Some(flow) = self.flow {
            entry.flow = flow;
        }
        if let Some(ref notes) = self.notes {
            entry.notes = notes.clone();
        }
    }
}

// ============================================================================
// Derived Statistics
// ============================================================================

/// Averages and predictions derived from the full entry history
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CycleData {
    pub average_cycle_length: u32,
    pub average_period_duration: u32,
    pub next_predicted_period: Option<NaiveDate>,
    pub next_predicted_ovulation: Option<NaiveDate>,
}

impl Default for CycleData {
    fn default() -> Self {
        Self {
            average_cycle_length: DEFAULT_CYCLE_LENGTH,
            average_period_duration: DEFAULT_PERIOD_DURATION,
            next_predicted_period: None,
            next_predicted_ovulation: None,
        }
    }
}

/// Classification of a single calendar day.
///
/// Flags may overlap (a logged period inside the fertile window, say);
/// picking a visual precedence is up to whoever renders it. The one
/// exclusion is `is_period` vs `is_predicted_period`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayInfo {
    pub date: NaiveDate,
    pub is_period: bool,
    pub is_ovulation: bool,
    pub is_fertile: bool,
    pub is_predicted_period: bool,
    pub flow: Option<Flow>,
}

// ============================================================================
// Date Normalization
// ============================================================================

/// Anything that can be reduced to a calendar day.
///
/// Time-of-day is discarded; zoned values use their own local date.
pub trait CalendarDate {
    fn calendar_date(&self) -> NaiveDate;
}

impl CalendarDate for NaiveDate {
    fn calendar_date(&self) -> NaiveDate {
        *self
    }
}

impl CalendarDate for NaiveDateTime {
    fn calendar_date(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> CalendarDate for DateTime<Tz> {
    fn calendar_date(&self) -> NaiveDate {
        self.date_naive()
    }
}

impl<T: CalendarDate + ?Sized> CalendarDate for &T {
    fn calendar_date(&self) -> NaiveDate {
        (**self).calendar_date()
    }
}
