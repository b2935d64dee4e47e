use super::ChainProfile;
use serde::{Deserialize, Serialize};
use std::{
    fmt::Display,
    ops::{Add, Sub},
};

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Ord, PartialOrd, PartialEq, Serialize, sqlx::Type, Hash,
)]
#[sqlx(transparent)]
pub struct Epoch(pub i32);

impl Epoch {
    /// The first epoch of the sync-committee period this epoch falls
    /// in (spec.md §4.1, `periodStartEpoch`).
    pub fn period_start_epoch(&self, profile: &ChainProfile) -> Epoch {
        Epoch((self.0 / profile.epochs_per_sync_committee_period) * profile.epochs_per_sync_committee_period)
    }

    pub fn period_end_epoch(&self, profile: &ChainProfile) -> Epoch {
        self.period_start_epoch(profile) + (profile.epochs_per_sync_committee_period - 1)
    }
}

impl Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<i32> for Epoch {
    type Output = Self;
    fn add(self, rhs: i32) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl Sub<i32> for Epoch {
    type Output = Self;
    fn sub(self, rhs: i32) -> Self::Output {
        Self(self.0 - rhs)
    }
}

impl From<Epoch> for i32 {
    fn from(epoch: Epoch) -> Self {
        epoch.0
    }
}

impl From<i32> for Epoch {
    fn from(epoch: i32) -> Self {
        Self(epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ETHEREUM;

    #[test]
    fn period_start_epoch_test() {
        assert_eq!(Epoch(0).period_start_epoch(&ETHEREUM), Epoch(0));
        assert_eq!(Epoch(255).period_start_epoch(&ETHEREUM), Epoch(0));
        assert_eq!(Epoch(256).period_start_epoch(&ETHEREUM), Epoch(256));
        assert_eq!(Epoch(300).period_start_epoch(&ETHEREUM), Epoch(256));
    }

    #[test]
    fn period_end_epoch_test() {
        assert_eq!(Epoch(0).period_end_epoch(&ETHEREUM), Epoch(255));
        assert_eq!(Epoch(300).period_end_epoch(&ETHEREUM), Epoch(511));
    }
}
