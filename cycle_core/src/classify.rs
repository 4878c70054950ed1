//! Per-day classification against history and predictions.
//!
//! A date is tested against:
//! - Logged periods (first matching entry supplies the flow)
//! - The predicted period window
//! - The predicted ovulation day and its fertile window

use crate::{generate_grid, CalendarDate, CycleData, DayInfo, PeriodEntry, Result};
use chrono::{Days, NaiveDate};

/// Length of the fertile window before ovulation day (exclusive of it)
pub const FERTILE_DAYS_BEFORE_OVULATION: u64 = 5;

/// Classify a single calendar day
///
/// Time-of-day on `date` is discarded before any comparison. When period
/// entries overlap, the first one in iteration order decides the flow. A
/// logged period always suppresses the predicted-period flag for that day.
pub fn classify_day(
    date: impl CalendarDate,
    entries: &[PeriodEntry],
    cycle: &CycleData,
) -> DayInfo {
    let date = date.calendar_date();

    let logged = entries.iter().find(|e| e.contains(date));
    let is_period = logged.is_some();
    let flow = logged.map(|e| e.flow);

    let is_predicted_period = !is_period
        && cycle
            .next_predicted_period
            .is_some_and(|start| in_predicted_window(date, start, cycle.average_period_duration));

    let is_ovulation = cycle.next_predicted_ovulation == Some(date);
    let is_fertile = cycle
        .next_predicted_ovulation
        .is_some_and(|ovulation| in_fertile_window(date, ovulation));

    DayInfo {
        date,
        is_period,
        is_ovulation,
        is_fertile,
        is_predicted_period,
        flow,
    }
}

/// Classify every cell of the 6x7 grid for a month
pub fn classify_grid(
    year: i32,
    month: u32,
    entries: &[PeriodEntry],
    cycle: &CycleData,
) -> Result<Vec<DayInfo>> {
    let days = generate_grid(year, month)?
        .into_iter()
        .map(|date| classify_day(date, entries, cycle))
        .collect();
    Ok(days)
}

fn in_predicted_window(date: NaiveDate, start: NaiveDate, duration: u32) -> bool {
    // A zero duration leaves an empty window
    if date < start || duration == 0 {
        return false;
    }
    let span = u64::from(duration - 1);
    match start.checked_add_days(Days::new(span)) {
        Some(end) => date <= end,
        None => true,
    }
}

fn in_fertile_window(date: NaiveDate, ovulation: NaiveDate) -> bool {
    if date > ovulation {
        return false;
    }
    match ovulation.checked_sub_days(Days::new(FERTILE_DAYS_BEFORE_OVULATION)) {
        Some(start) => date >= start,
        None => true,
    }
}
