//! Cycle statistics and forward prediction.
//!
//! Everything here is recomputed from the full entry history on each call:
//! - Average cycle length (start-to-start gaps)
//! - Average period duration (inclusive day counts)
//! - Next period and ovulation dates projected from the latest entry

use crate::{CycleData, PeriodEntry, DEFAULT_CYCLE_LENGTH, DEFAULT_PERIOD_DURATION};
use chrono::{Days, NaiveDate};

/// Start-to-start gaps are kept only inside this open interval (days)
const CYCLE_LENGTH_BOUNDS: (i64, i64) = (0, 60);

/// Inclusive period durations are kept only inside this open interval (days)
const PERIOD_DURATION_BOUNDS: (i64, i64) = (0, 15);

/// Ovulation is placed this many days before the predicted period
pub const LUTEAL_PHASE_DAYS: u64 = 14;

/// Derive cycle averages and predictions from logged periods
///
/// With no entries the population defaults (28-day cycle, 5-day period, no
/// predictions) are returned. Samples outside the plausibility bounds are
/// dropped rather than rejected, so a single bad entry only weakens the
/// average.
pub fn compute_cycle_data(entries: &[PeriodEntry]) -> CycleData {
    if entries.is_empty() {
        return CycleData::default();
    }

    // Stable sort keeps input order for entries sharing a start date
    let mut sorted: Vec<&PeriodEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.start_date);

    let cycle_lengths = cycle_length_samples(&sorted);
    let average_cycle_length = rounded_mean(&cycle_lengths).unwrap_or(DEFAULT_CYCLE_LENGTH);

    let durations = period_duration_samples(&sorted);
    let average_period_duration = rounded_mean(&durations).unwrap_or(DEFAULT_PERIOD_DURATION);

    let anchor = sorted.last().map(|e| e.start_date);
    let next_predicted_period =
        anchor.and_then(|start| start.checked_add_days(Days::new(average_cycle_length.into())));
    let next_predicted_ovulation = next_predicted_period.and_then(predict_ovulation);

    tracing::debug!(
        "Computed cycle data from {} entries ({} cycle samples, {} duration samples)",
        entries.len(),
        cycle_lengths.len(),
        durations.len()
    );

    CycleData {
        average_cycle_length,
        average_period_duration,
        next_predicted_period,
        next_predicted_ovulation,
    }
}

/// Ovulation date for a given predicted period start
pub fn predict_ovulation(next_period: NaiveDate) -> Option<NaiveDate> {
    next_period.checked_sub_days(Days::new(LUTEAL_PHASE_DAYS))
}

/// Day gaps between successive start dates that pass the plausibility filter
fn cycle_length_samples(sorted: &[&PeriodEntry]) -> Vec<i64> {
    sorted
        .windows(2)
        .map(|pair| (pair[1].start_date - pair[0].start_date).num_days())
        .filter(|days| within(*days, CYCLE_LENGTH_BOUNDS))
        .collect()
}

/// Inclusive day counts of entries with an end date that pass the filter
fn period_duration_samples(sorted: &[&PeriodEntry]) -> Vec<i64> {
    sorted
        .iter()
        .filter_map(|e| e.end_date.map(|end| (end - e.start_date).num_days() + 1))
        .filter(|days| within(*days, PERIOD_DURATION_BOUNDS))
        .collect()
}

fn within(value: i64, (low, high): (i64, i64)) -> bool {
    value > low && value < high
}

/// Arithmetic mean rounded to the nearest day, halves rounding up
fn rounded_mean(samples: &[i64]) -> Option<u32> {
    if samples.is_empty() {
        return None;
    }
    let sum: i64 = samples.iter().sum();
    let n = samples.len() as i64;
    // Samples are strictly positive, so integer half-up rounding is exact
    u32::try_from((2 * sum + n) / (2 * n)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Flow;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn entry(start: &str, end: Option<&str>) -> PeriodEntry {
        PeriodEntry::new(date(start), end.map(date), Flow::Medium, None)
    }

    #[test]
    fn test_empty_history_uses_defaults() {
        let data = compute_cycle_data(&[]);
        assert_eq!(data, CycleData::default());
        assert_eq!(data.average_cycle_length, 28);
        assert_eq!(data.average_period_duration, 5);
    }

    #[test]
    fn test_single_entry_without_end_date() {
        let data = compute_cycle_data(&[entry("2024-03-01", None)]);

        assert_eq!(data.average_cycle_length, 28);
        assert_eq!(data.average_period_duration, 5);
        assert_eq!(data.next_predicted_period, Some(date("2024-03-29")));
        assert_eq!(data.next_predicted_ovulation, Some(date("2024-03-15")));
    }

    #[test]
    fn test_regular_cycles_average_exactly() {
        let entries = vec![
            entry("2024-01-01", None),
            entry("2024-01-29", None),
            entry("2024-02-26", None),
        ];
        let data = compute_cycle_data(&entries);

        assert_eq!(data.average_cycle_length, 28);
        assert_eq!(data.next_predicted_period, Some(date("2024-03-25")));
    }

    #[test]
    fn test_unsorted_input_is_sorted_before_sampling() {
        let entries = vec![
            entry("2024-02-26", None),
            entry("2024-01-01", None),
            entry("2024-01-29", None),
        ];
        let data = compute_cycle_data(&entries);

        assert_eq!(data.average_cycle_length, 28);
        // Anchored on the latest start, not the last element
        assert_eq!(data.next_predicted_period, Some(date("2024-03-25")));
    }

    #[test]
    fn test_long_gap_is_excluded() {
        // 30-day gap kept, 90-day gap dropped
        let entries = vec![
            entry("2024-01-01", None),
            entry("2024-01-31", None),
            entry("2024-04-30", None),
        ];
        let data = compute_cycle_data(&entries);

        assert_eq!(data.average_cycle_length, 30);
        assert_eq!(data.next_predicted_period, Some(date("2024-05-30")));
    }

    #[test]
    fn test_same_day_entries_are_not_cycle_samples() {
        let entries = vec![entry("2024-01-01", None), entry("2024-01-01", None)];
        let data = compute_cycle_data(&entries);
        assert_eq!(data.average_cycle_length, 28);
    }

    #[test]
    fn test_average_rounds_half_up() {
        // Gaps of 27 and 28 average to 27.5
        let entries = vec![
            entry("2024-01-01", None),
            entry("2024-01-28", None),
            entry("2024-02-25", None),
        ];
        assert_eq!(compute_cycle_data(&entries).average_cycle_length, 28);

        // Gaps of 27, 27 and 28 average to 27.33
        let entries = vec![
            entry("2024-01-01", None),
            entry("2024-01-28", None),
            entry("2024-02-24", None),
            entry("2024-03-23", None),
        ];
        assert_eq!(compute_cycle_data(&entries).average_cycle_length, 27);
    }

    #[test]
    fn test_period_duration_is_inclusive() {
        let entries = vec![
            entry("2024-01-01", Some("2024-01-04")),
            entry("2024-01-29", Some("2024-02-01")),
        ];
        let data = compute_cycle_data(&entries);
        assert_eq!(data.average_period_duration, 4);
    }

    #[test]
    fn test_bad_durations_are_filtered() {
        let entries = vec![
            // 20 days: too long
            entry("2024-01-01", Some("2024-01-20")),
            // Reversed range: non-positive
            entry("2024-02-10", Some("2024-02-05")),
            entry("2024-03-01", Some("2024-03-03")),
        ];
        let data = compute_cycle_data(&entries);
        assert_eq!(data.average_period_duration, 3);
    }

    #[test]
    fn test_no_valid_durations_falls_back() {
        let entries = vec![entry("2024-01-01", Some("2024-01-30"))];
        assert_eq!(compute_cycle_data(&entries).average_period_duration, 5);
    }

    #[test]
    fn test_ovulation_is_fourteen_days_before_period() {
        let entries = vec![entry("2024-01-01", None), entry("2024-01-25", None)];
        let data = compute_cycle_data(&entries);

        assert_eq!(data.average_cycle_length, 24);
        assert_eq!(data.next_predicted_period, Some(date("2024-02-18")));
        assert_eq!(data.next_predicted_ovulation, Some(date("2024-02-04")));
    }

    #[test]
    fn test_rounded_mean() {
        assert_eq!(rounded_mean(&[]), None);
        assert_eq!(rounded_mean(&[5]), Some(5));
        assert_eq!(rounded_mean(&[4, 5]), Some(5));
        assert_eq!(rounded_mean(&[4, 4, 5]), Some(4));
    }
}
