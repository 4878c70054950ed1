//! Month grid generation for calendar views.
//!
//! A grid is always 6 weeks of 7 days starting on a Sunday, padded with
//! trailing days of the previous month and leading days of the next.

use crate::{Error, Result};
use chrono::{Datelike, Days, NaiveDate};

/// Number of cells in a month grid (6 rows x 7 columns)
pub const GRID_CELLS: usize = 42;

/// Build the 42-day grid for `month` (1-12) of `year`
pub fn generate_grid(year: i32, month: u32) -> Result<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        Error::Calendar(format!("no such month: {:04}-{:02}", year, month))
    })?;

    let leading = u64::from(first.weekday().num_days_from_sunday());
    let grid_start = first
        .checked_sub_days(Days::new(leading))
        .ok_or_else(|| Error::Calendar(format!("{:04}-{:02} is out of range", year, month)))?;

    let days: Vec<NaiveDate> = grid_start.iter_days().take(GRID_CELLS).collect();
    if days.len() != GRID_CELLS {
        return Err(Error::Calendar(format!(
            "{:04}-{:02} is out of range",
            year, month
        )));
    }

    Ok(days)
}
