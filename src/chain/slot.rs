use super::{epoch::Epoch, ChainProfile};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    fmt::Display,
    ops::{Add, Sub},
    str::FromStr,
};

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Ord, PartialOrd, PartialEq, Serialize, sqlx::Type, Hash,
)]
#[sqlx(transparent)]
pub struct Slot(pub i32);

impl Slot {
    pub const GENESIS: Self = Self(0);

    pub fn date_time(&self, profile: &ChainProfile) -> DateTime<Utc> {
        profile.genesis_timestamp + Duration::seconds(self.0 as i64 * profile.seconds_per_slot)
    }

    pub fn from_date_time(date_time: &DateTime<Utc>, profile: &ChainProfile) -> Self {
        let seconds_since_genesis = (*date_time - profile.genesis_timestamp).num_seconds();
        Self((seconds_since_genesis / profile.seconds_per_slot) as i32)
    }

    pub fn epoch(&self, profile: &ChainProfile) -> Epoch {
        Epoch(self.0 / profile.slots_per_epoch)
    }

    pub fn is_first_of_epoch(&self, profile: &ChainProfile) -> bool {
        self.0 % profile.slots_per_epoch == 0
    }
}

impl Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<i32> for Slot {
    type Output = Self;
    fn add(self, rhs: i32) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl Sub<i32> for Slot {
    type Output = Self;
    fn sub(self, rhs: i32) -> Self::Output {
        Self(self.0 - rhs)
    }
}

impl Sub<Slot> for Slot {
    type Output = i32;
    fn sub(self, rhs: Slot) -> Self::Output {
        self.0 - rhs.0
    }
}

impl From<Slot> for i32 {
    fn from(slot: Slot) -> Self {
        slot.0
    }
}

impl From<i32> for Slot {
    fn from(slot: i32) -> Self {
        Self(slot)
    }
}

impl From<Slot> for i64 {
    fn from(slot: Slot) -> Self {
        slot.0 as i64
    }
}

impl FromStr for Slot {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

pub fn slot_from_string<'de, D>(deserializer: D) -> Result<Slot, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer)
        .map(|slot_text| slot_text.parse().expect("expect slots to be i32"))
        .map(Slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ETHEREUM;

    #[test]
    fn date_time_roundtrip_test() {
        let slot = Slot(3599);
        let dt = slot.date_time(&ETHEREUM);
        assert_eq!(Slot::from_date_time(&dt, &ETHEREUM), slot);
    }

    #[test]
    fn epoch_test() {
        assert_eq!(Slot(32).epoch(&ETHEREUM), Epoch(1));
        assert_eq!(Slot(63).epoch(&ETHEREUM), Epoch(1));
        assert_eq!(Slot(64).epoch(&ETHEREUM), Epoch(2));
    }

    #[test]
    fn is_first_of_epoch_test() {
        assert!(Slot(0).is_first_of_epoch(&ETHEREUM));
        assert!(Slot(32).is_first_of_epoch(&ETHEREUM));
        assert!(!Slot(33).is_first_of_epoch(&ETHEREUM));
    }
}
