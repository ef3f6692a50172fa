use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PowerError;

const NS_EXPONENT: i32 = -9;
const MW_EXPONENT: i32 = -3;

/// A duration, stored in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeValue {
    ns: f64,
}

/// A power magnitude, stored in milliwatts.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PowerValue {
    mw: f64,
}

/// Power-of-ten exponent of an SI prefix.
fn prefix_exponent(prefix: &str) -> Option<i32> {
    Some(match prefix {
        "f" => -15,
        "p" => -12,
        "n" => -9,
        "u" | "µ" => -6,
        "m" => -3,
        "" => 0,
        "k" => 3,
        "M" => 6,
        "G" => 9,
        _ => return None,
    })
}

/// Returns the exponent of `unit` relative to the bare `base` unit.
fn unit_exponent(unit: &str, base: &str) -> Result<i32, PowerError> {
    let unit = unit.trim();
    unit.strip_suffix(base)
        .and_then(prefix_exponent)
        .ok_or_else(|| PowerError::Unit(format!("`{unit}` is not a unit of `{base}`")))
}

/// Splits `"2.5 us"` into `(2.5, "us")`. A bare unit has magnitude 1.
fn split_quantity(s: &str) -> Result<(f64, &str), PowerError> {
    let s = s.trim();
    let idx = s
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
        .unwrap_or(s.len());
    // An exponent marker is only part of the number when followed by a digit or sign.
    let idx = match s[..idx].rfind(['e', 'E']) {
        Some(e) if e + 1 == idx => e,
        _ => idx,
    };
    let (num, unit) = s.split_at(idx);
    let value = if num.is_empty() {
        1.0
    } else {
        num.parse::<f64>()
            .map_err(|_| PowerError::Unit(format!("invalid magnitude in `{s}`")))?
    };
    Ok((value, unit.trim()))
}

fn scale(value: f64, from: i32, to: i32) -> f64 {
    value * 10f64.powi(from - to)
}

impl TimeValue {
    pub fn from_ns(ns: f64) -> Self {
        Self { ns }
    }

    pub fn from_seconds(s: f64) -> Self {
        Self {
            ns: scale(s, 0, NS_EXPONENT),
        }
    }

    /// Builds a value from a magnitude expressed in `unit` (e.g. `"us"`).
    pub fn with_units(value: f64, unit: &str) -> Result<Self, PowerError> {
        let exp = unit_exponent(unit, "s")?;
        Ok(Self {
            ns: scale(value, exp, NS_EXPONENT),
        })
    }

    pub fn ns(&self) -> f64 {
        self.ns
    }

    /// Expresses this duration in `unit`.
    pub fn value_in_units(&self, unit: &str) -> Result<f64, PowerError> {
        let exp = unit_exponent(unit, "s")?;
        Ok(scale(self.ns, NS_EXPONENT, exp))
    }
}

impl PowerValue {
    pub fn from_mw(mw: f64) -> Self {
        Self { mw }
    }

    pub fn with_units(value: f64, unit: &str) -> Result<Self, PowerError> {
        let exp = unit_exponent(unit, "W")?;
        Ok(Self {
            mw: scale(value, exp, MW_EXPONENT),
        })
    }

    pub fn mw(&self) -> f64 {
        self.mw
    }

    pub fn value_in_units(&self, unit: &str) -> Result<f64, PowerError> {
        let exp = unit_exponent(unit, "W")?;
        Ok(scale(self.mw, MW_EXPONENT, exp))
    }
}

impl FromStr for TimeValue {
    type Err = PowerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, unit) = split_quantity(s)?;
        Self::with_units(value, unit)
    }
}

impl FromStr for PowerValue {
    type Err = PowerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, unit) = split_quantity(s)?;
        Self::with_units(value, unit)
    }
}

impl TryFrom<String> for TimeValue {
    type Error = PowerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for PowerValue {
    type Error = PowerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeValue> for String {
    fn from(t: TimeValue) -> String {
        t.to_string()
    }
}

impl From<PowerValue> for String {
    fn from(p: PowerValue) -> String {
        p.to_string()
    }
}

impl Display for TimeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}ns", self.ns)
    }
}

impl Display for PowerValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}mW", self.mw)
    }
}
