//! Bidirectional wall-time <-> slot <-> epoch conversions (spec.md
//! §4.1) plus the two watermarks every forward-progressing fetcher
//! checks itself against: the oldest slot we'll ever create state
//! for, and the newest slot it's currently safe to fetch.
use super::{epoch::Epoch, slot::Slot, ChainProfile};
use chrono::{DateTime, Datelike, Timelike, Utc};

pub fn slot_of(timestamp: DateTime<Utc>, profile: &ChainProfile) -> Slot {
    Slot::from_date_time(&timestamp, profile)
}

pub fn time_of(slot: Slot, profile: &ChainProfile) -> DateTime<Utc> {
    slot.date_time(profile)
}

pub fn epoch_of(slot: Slot, profile: &ChainProfile) -> Epoch {
    slot.epoch(profile)
}

/// The oldest slot the indexer will ever create a row for (spec.md
/// §3 invariant I1, §4.1 "oldest lookback slot").
pub fn oldest_lookback_slot(now: DateTime<Utc>, profile: &ChainProfile) -> Slot {
    slot_of(now, profile) - crate::env::ENV_CONFIG.consensus_lookback_slot
}

/// The newest slot it is currently safe to fetch: the buffer behind
/// head absorbs re-orgs near the tip (spec.md §4.1 "max slot to
/// fetch").
pub fn max_slot_to_fetch(now: DateTime<Utc>, profile: &ChainProfile) -> Slot {
    slot_of(now, profile) - profile.delay_slots_to_head
}

/// `(date, hour)` UTC bucket key a timestamp falls into, the primary
/// sharding dimension for the hourly tables (spec.md §9).
pub fn date_hour_bucket(timestamp: DateTime<Utc>) -> (chrono::NaiveDate, i16) {
    (timestamp.date_naive(), timestamp.hour() as i16)
}

/// Start of the UTC hour immediately following `timestamp`, i.e. the
/// exclusive upper bound `endTime` of the hourly window that contains
/// `timestamp` (spec.md §4.5).
pub fn hour_window_end(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = timestamp
        .date_naive()
        .and_hms_opt(timestamp.hour(), 0, 0)
        .expect("hour/minute/second 0 is always a valid time")
        .and_utc();
    truncated + chrono::Duration::hours(1)
}

/// Start of the UTC day immediately following `timestamp`.
pub fn day_window_end(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = timestamp
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc();
    truncated + chrono::Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ETHEREUM;

    #[test]
    fn slot_of_time_of_roundtrip_test() {
        for s in [0, 1, 3599, 100_000] {
            let slot = Slot(s);
            assert_eq!(slot_of(time_of(slot, &ETHEREUM), &ETHEREUM), slot);
        }
    }

    #[test]
    fn epoch_of_matches_slots_per_epoch_test() {
        assert_eq!(epoch_of(Slot(64), &ETHEREUM), Epoch(2));
    }

    #[test]
    fn hour_window_end_test() {
        let t: DateTime<Utc> = "2024-01-01T05:30:00Z".parse().unwrap();
        let end: DateTime<Utc> = "2024-01-01T06:00:00Z".parse().unwrap();
        assert_eq!(hour_window_end(t), end);
    }

    #[test]
    fn day_window_end_test() {
        let t: DateTime<Utc> = "2024-01-01T05:30:00Z".parse().unwrap();
        let end: DateTime<Utc> = "2024-01-02T00:00:00Z".parse().unwrap();
        assert_eq!(day_window_end(t), end);
    }
}
