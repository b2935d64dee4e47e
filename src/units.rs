//! Arbitrary-precision gwei and wei amounts.
//!
//! Reward and balance arithmetic sums across many validators and many
//! hours; a 64-bit accumulator can overflow well before the heat death
//! of the universe but not before a few years of mainnet data, so we
//! keep everything in `i128` and persist it as Postgres `NUMERIC`.
use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::{
    iter::Sum,
    ops::{Add, AddAssign, Div, Mul, Sub},
    str::FromStr,
};

#[derive(
    Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct GweiNewtype(pub i128);

impl GweiNewtype {
    pub const ZERO: Self = Self(0);

    /// One gwei unit of effective balance, the granularity the beacon
    /// chain rounds effective balances to before looking up ideal
    /// rewards.
    pub const EFFECTIVE_BALANCE_INCREMENT: i128 = 1_000_000_000;

    /// Round down to the nearest effective-balance increment, as the
    /// beacon chain itself does before keying the ideal-rewards table.
    pub fn round_down_to_effective_balance_increment(&self) -> Self {
        Self((self.0 / Self::EFFECTIVE_BALANCE_INCREMENT) * Self::EFFECTIVE_BALANCE_INCREMENT)
    }

    /// Saturating non-negative subtraction, used for missed-reward
    /// math where a validator's received reward may exceed the ideal
    /// one (e.g. inclusion-distance bonuses) and the spec clamps the
    /// difference at zero.
    pub fn saturating_sub_floor_zero(&self, other: Self) -> Self {
        if self.0 <= other.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }
}

impl Add for GweiNewtype {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for GweiNewtype {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for GweiNewtype {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<i128> for GweiNewtype {
    type Output = Self;
    fn mul(self, rhs: i128) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<i128> for GweiNewtype {
    type Output = Self;
    fn div(self, rhs: i128) -> Self::Output {
        Self(self.0 / rhs)
    }
}

impl Sum for GweiNewtype {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<i64> for GweiNewtype {
    fn from(value: i64) -> Self {
        Self(value as i128)
    }
}

impl From<i32> for GweiNewtype {
    fn from(value: i32) -> Self {
        Self(value as i128)
    }
}

impl FromStr for GweiNewtype {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i128>().map(Self)
    }
}

impl From<GweiNewtype> for BigDecimal {
    fn from(value: GweiNewtype) -> Self {
        BigDecimal::from(value.0)
    }
}

impl From<BigDecimal> for GweiNewtype {
    fn from(value: BigDecimal) -> Self {
        Self(
            value
                .to_i128()
                .expect("expect gwei amounts stored in NUMERIC columns to fit in i128"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_down_to_effective_balance_increment_test() {
        let balance = GweiNewtype(32_123_456_789);
        assert_eq!(
            balance.round_down_to_effective_balance_increment(),
            GweiNewtype(32_000_000_000)
        );
    }

    #[test]
    fn round_down_zero_test() {
        assert_eq!(
            GweiNewtype::ZERO.round_down_to_effective_balance_increment(),
            GweiNewtype::ZERO
        );
    }

    #[test]
    fn saturating_sub_floor_zero_test() {
        let ideal = GweiNewtype(100);
        let received = GweiNewtype(130);
        assert_eq!(ideal.saturating_sub_floor_zero(received), GweiNewtype::ZERO);

        let received = GweiNewtype(70);
        assert_eq!(ideal.saturating_sub_floor_zero(received), GweiNewtype(30));
    }

    #[test]
    fn sum_test() {
        let total: GweiNewtype = vec![GweiNewtype(1), GweiNewtype(2), GweiNewtype(3)]
            .into_iter()
            .sum();
        assert_eq!(total, GweiNewtype(6));
    }
}
