use std::fmt;

use serde::{Deserialize, Serialize};

/// A price expressed in integer ticks.
///
/// One tick is 1/10,000 of the quote currency, so `100.10` is `Price(1_001_000)`.
/// Keying the book by ticks keeps price-level lookups exact; floating point
/// only appears at the boundary, via [`Price::from_f64`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(pub u64);

impl Price {
    /// Ticks per whole unit of the quote currency.
    pub const TICKS_PER_UNIT: u64 = 10_000;

    pub const fn from_ticks(ticks: u64) -> Self {
        Self(ticks)
    }

    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Convert a decimal price to ticks, rounding to the nearest tick.
    ///
    /// Returns `None` for values that do not admit a total order (NaN,
    /// infinities) or are negative. This is the only place a float can
    /// enter the engine.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Some(Self((value * Self::TICKS_PER_UNIT as f64).round() as u64))
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::TICKS_PER_UNIT as f64
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f64_rounds_to_tick() {
        assert_eq!(Price::from_f64(100.10), Some(Price(1_001_000)));
        assert_eq!(Price::from_f64(0.0), Some(Price(0)));
        assert_eq!(Price::from_f64(99.99995), Some(Price(1_000_000)));
    }

    #[test]
    fn test_from_f64_rejects_unordered_values() {
        assert_eq!(Price::from_f64(f64::NAN), None);
        assert_eq!(Price::from_f64(f64::INFINITY), None);
        assert_eq!(Price::from_f64(f64::NEG_INFINITY), None);
        assert_eq!(Price::from_f64(-1.0), None);
    }

    #[test]
    fn test_round_trip() {
        let p = Price::from_f64(101.5).unwrap();
        assert_eq!(p.to_f64(), 101.5);
        assert_eq!(format!("{p}"), "101.5000");
    }

    #[test]
    fn test_ordering_is_tick_ordering() {
        assert!(Price::from_ticks(995_000) < Price::from_ticks(1_000_000));
    }
}
