//! Fixed-point math utilities for deterministic simulation.
//!
//! Resource amounts, timers and combat power all use fixed-point
//! arithmetic so that two engines fed the same commands end up with
//! bit-identical state on every platform.

use fixed::types::I32F32;

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Exact quotient `numerator / denominator` as a fixed-point number.
///
/// The whole part and the remainder are converted separately so large
/// numerators never overflow the intermediate `Fixed`. The result
/// saturates at the `Fixed` range and is zero when `denominator` is zero.
#[must_use]
pub fn ratio(numerator: i64, denominator: i64) -> Fixed {
    if denominator == 0 {
        return Fixed::ZERO;
    }
    let whole = numerator / denominator;
    let rem = numerator % denominator;
    let whole = Fixed::saturating_from_num(whole);
    let frac = Fixed::from_num(rem) / Fixed::from_num(denominator);
    whole.saturating_add(frac)
}

/// Serde support for durations written by hand, such as script ticks.
///
/// Serializes seconds as whole milliseconds, rounding to the nearest one.
pub mod millis_serde {
    use super::{ratio, Fixed};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize seconds as milliseconds.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = value.saturating_mul_int(1000).saturating_round();
        millis.to_num::<i64>().serialize(serializer)
    }

    /// Deserialize milliseconds as seconds.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = i64::deserialize(deserializer)?;
        Ok(ratio(millis, 1000))
    }
}
