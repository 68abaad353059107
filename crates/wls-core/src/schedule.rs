//! Start-of-day scheduling for created and updated worklogs.
//!
//! Source ledgers carry no time of day, but the remote service wants an
//! absolute start instant per record. The scheduler synthesizes one: entries
//! for a date are laid out contiguously from 08:00 local, separated by a
//! one-minute gap, in the order they are assigned. The resulting times are
//! not semantically meaningful to anyone; they only keep same-day entries
//! from overlapping and make repeated runs reproducible.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Start-of-day seed for every date's cursor, in the scheduler's zone.
const DAY_START_HOUR: u32 = 8;

/// Gap inserted between consecutive entries on the same date.
const ENTRY_GAP_MINUTES: i64 = 1;

/// Per-date cursor map assigning non-overlapping start instants.
///
/// Transient: exists only for the duration of one scheduling pass. The zone
/// decides what "08:00 local" means and must match the zone used to derive
/// calendar dates during reconciliation.
#[derive(Debug)]
pub struct Scheduler<Tz: TimeZone> {
    tz: Tz,
    cursors: HashMap<NaiveDate, NaiveDateTime>,
}

impl<Tz: TimeZone> Scheduler<Tz> {
    #[must_use]
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            cursors: HashMap::new(),
        }
    }

    /// Assigns the next start instant for `date` and advances that date's
    /// cursor by `duration` plus the inter-entry gap.
    ///
    /// Callers must assign in the plan's sorted order for the output to be
    /// deterministic across runs.
    pub fn assign(&mut self, date: NaiveDate, duration: Duration) -> DateTime<Utc> {
        let cursor = self
            .cursors
            .entry(date)
            .or_insert_with(|| date.and_time(day_start()));
        let start_local = *cursor;
        *cursor += duration + Duration::minutes(ENTRY_GAP_MINUTES);

        // A nonexistent local time (DST spring-forward gap) falls back to
        // reading the naive value as UTC.
        self.tz
            .from_local_datetime(&start_local)
            .earliest()
            .map_or_else(
                || Utc.from_utc_datetime(&start_local),
                |dt| dt.with_timezone(&Utc),
            )
    }
}

fn day_start() -> NaiveTime {
    NaiveTime::from_hms_opt(DAY_START_HOUR, 0, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::FixedOffset;

    fn date(text: &str) -> NaiveDate {
        text.parse().unwrap()
    }

    #[test]
    fn first_entry_starts_at_eight_local() {
        let mut scheduler = Scheduler::new(Utc);
        let start = scheduler.assign(date("2023-10-01"), Duration::hours(1));
        assert_eq!(start.to_rfc3339(), "2023-10-01T08:00:00+00:00");
    }

    #[test]
    fn same_date_entries_are_laid_out_with_a_one_minute_gap() {
        let mut scheduler = Scheduler::new(Utc);
        let first = scheduler.assign(date("2023-10-01"), Duration::minutes(133));
        let second = scheduler.assign(date("2023-10-01"), Duration::hours(3));
        assert_eq!(first.to_rfc3339(), "2023-10-01T08:00:00+00:00");
        // 08:00 + 2h13m + 1m
        assert_eq!(second.to_rfc3339(), "2023-10-01T10:14:00+00:00");
    }

    #[test]
    fn each_date_has_its_own_cursor() {
        let mut scheduler = Scheduler::new(Utc);
        scheduler.assign(date("2023-10-01"), Duration::hours(2));
        let other_day = scheduler.assign(date("2023-10-02"), Duration::hours(1));
        assert_eq!(other_day.to_rfc3339(), "2023-10-02T08:00:00+00:00");
        let same_day = scheduler.assign(date("2023-10-01"), Duration::hours(1));
        assert_eq!(same_day.to_rfc3339(), "2023-10-01T10:01:00+00:00");
    }

    #[test]
    fn local_zone_offsets_shift_the_utc_instant() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let mut scheduler = Scheduler::new(tz);
        let start = scheduler.assign(date("2023-10-01"), Duration::hours(1));
        // 08:00 at UTC+2 is 06:00 UTC.
        assert_eq!(start.to_rfc3339(), "2023-10-01T06:00:00+00:00");
    }

    #[test]
    fn assignment_is_deterministic_across_schedulers() {
        let rows = [
            (date("2023-10-01"), Duration::minutes(133)),
            (date("2023-10-01"), Duration::hours(3)),
            (date("2023-10-02"), Duration::minutes(45)),
        ];
        let run = || {
            let mut scheduler = Scheduler::new(Utc);
            rows.iter()
                .map(|(d, dur)| scheduler.assign(*d, *dur))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn long_days_spill_past_midnight_without_colliding() {
        let mut scheduler = Scheduler::new(Utc);
        let first = scheduler.assign(date("2023-10-01"), Duration::hours(15));
        let second = scheduler.assign(date("2023-10-01"), Duration::hours(2));
        assert!(second > first);
        assert_eq!(second.to_rfc3339(), "2023-10-01T23:01:00+00:00");
        let third = scheduler.assign(date("2023-10-01"), Duration::hours(1));
        assert!(third > second);
    }
}
