//! Parsing of Kubernetes resource quantity strings into fixed base units.
//!
//! CPU is normalized to millicores and memory to mebibytes. Only the shapes
//! `^\d+$` / `^\d+m$` (CPU) and `^\d+(Ki|Mi|Gi)$` (memory) are accepted;
//! anything else is rejected instead of being coerced.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::Serialize;

use crate::error::QuantityError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scale {
    Multiply(u64),
    Divide(u64),
}

impl Scale {
    fn apply(self, value: u64) -> Option<u64> {
        match self {
            Scale::Multiply(factor) => value.checked_mul(factor),
            Scale::Divide(divisor) => Some(value / divisor),
        }
    }
}

// Suffixes are tried in order, so the empty suffix has to stay last.
const CPU_UNITS: &[(&str, Scale)] = &[("m", Scale::Multiply(1)), ("", Scale::Multiply(1000))];

const MEMORY_UNITS: &[(&str, Scale)] = &[
    ("Ki", Scale::Divide(1024)),
    ("Mi", Scale::Multiply(1)),
    ("Gi", Scale::Multiply(1024)),
];

/// CPU amount in thousandths of a core.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Millicores(pub u64);

/// Memory amount in units of 2^20 bytes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Mebibytes(pub u64);

// `+` saturates at `u64::MAX`; `checked_add` tells the caller when that happened.
macro_rules! unit_arithmetic {
    ($unit:ident, $suffix:literal) => {
        impl $unit {
            pub const MAX: $unit = $unit(u64::MAX);

            pub fn checked_add(self, rhs: $unit) -> Option<$unit> {
                self.0.checked_add(rhs.0).map($unit)
            }
        }

        impl Add for $unit {
            type Output = $unit;

            fn add(self, rhs: $unit) -> $unit {
                $unit(self.0.saturating_add(rhs.0))
            }
        }

        impl AddAssign for $unit {
            fn add_assign(&mut self, rhs: $unit) {
                *self = *self + rhs;
            }
        }

        impl Sum for $unit {
            fn sum<I: Iterator<Item = $unit>>(iter: I) -> $unit {
                iter.fold($unit::default(), Add::add)
            }
        }

        impl std::fmt::Display for $unit {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", self.0, $suffix)
            }
        }
    };
}

unit_arithmetic!(Millicores, "m");
unit_arithmetic!(Mebibytes, "Mi");

/// Parses `"1500m"` or `"3"` into millicores.
pub fn parse_cpu(quantity: &str) -> Result<Millicores, QuantityError> {
    parse_scaled(quantity, CPU_UNITS).map(Millicores)
}

/// Parses `"512Ki"`, `"2000Mi"` or `"1Gi"` into mebibytes. Kibibytes are truncated.
pub fn parse_memory(quantity: &str) -> Result<Mebibytes, QuantityError> {
    parse_scaled(quantity, MEMORY_UNITS).map(Mebibytes)
}

fn parse_scaled(quantity: &str, units: &[(&str, Scale)]) -> Result<u64, QuantityError> {
    let (digits, scale) = units
        .iter()
        .find_map(|(suffix, scale)| quantity.strip_suffix(*suffix).map(|digits| (digits, *scale)))
        .ok_or_else(|| QuantityError::UnsupportedUnit(quantity.to_string()))?;

    let invalid = || QuantityError::InvalidQuantity(quantity.to_string());

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let value: u64 = digits.parse().map_err(|_| invalid())?;
    scale.apply(value).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_millicores_and_cores() {
        assert_eq!(parse_cpu("1500m"), Ok(Millicores(1500)));
        assert_eq!(parse_cpu("3"), Ok(Millicores(3000)));
        assert_eq!(parse_cpu("0"), Ok(Millicores(0)));
        assert_eq!(parse_cpu("0m"), Ok(Millicores(0)));
    }

    #[test]
    fn cpu_rejects_non_digits() {
        for input in ["abc", "", "m", "1.5", "-1", "+2", "2 ", "5x", "100mm", "1Gi"] {
            assert_eq!(
                parse_cpu(input),
                Err(QuantityError::InvalidQuantity(input.to_string())),
                "{input:?}"
            );
        }
    }

    #[test]
    fn cpu_overflow_is_invalid() {
        let input = "99999999999999999999";
        assert_eq!(parse_cpu(input), Err(QuantityError::InvalidQuantity(input.to_string())));
        // Fits in u64 but not once scaled to millicores.
        let input = "18446744073709552";
        assert_eq!(parse_cpu(input), Err(QuantityError::InvalidQuantity(input.to_string())));
    }

    #[test]
    fn memory_binary_suffixes() {
        assert_eq!(parse_memory("2048Mi"), Ok(Mebibytes(2048)));
        assert_eq!(parse_memory("1048576Ki"), Ok(Mebibytes(1024)));
        assert_eq!(parse_memory("1Gi"), Ok(Mebibytes(1024)));
        assert_eq!(parse_memory("0Mi"), Ok(Mebibytes(0)));
    }

    #[test]
    fn memory_kibibytes_truncate() {
        assert_eq!(parse_memory("512Ki"), Ok(Mebibytes(0)));
        assert_eq!(parse_memory("2047Ki"), Ok(Mebibytes(1)));
        assert_eq!(parse_memory("16283736Ki"), Ok(Mebibytes(15902)));
    }

    #[test]
    fn memory_unknown_unit_is_an_error() {
        for input in ["5Xi", "1024", "1G", "3Ti", "100M", ""] {
            assert_eq!(
                parse_memory(input),
                Err(QuantityError::UnsupportedUnit(input.to_string())),
                "{input:?}"
            );
        }
    }

    #[test]
    fn memory_bad_number_is_invalid() {
        for input in ["Mi", "abcMi", "-1Gi", "1.5Gi", " 1Mi"] {
            assert_eq!(
                parse_memory(input),
                Err(QuantityError::InvalidQuantity(input.to_string())),
                "{input:?}"
            );
        }
    }

    #[test]
    fn units_sum_and_display() {
        let total: Millicores = [Millicores(500), Millicores(250)].into_iter().sum();
        assert_eq!(total, Millicores(750));
        assert_eq!(total.to_string(), "750m");
        assert_eq!((Mebibytes(1) + Mebibytes(2)).to_string(), "3Mi");
    }

    #[test]
    fn addition_saturates_instead_of_wrapping() {
        assert_eq!(Millicores::MAX + Millicores(1), Millicores::MAX);
        assert_eq!(Millicores::MAX.checked_add(Millicores(1)), None);
        assert_eq!(Mebibytes(2).checked_add(Mebibytes(3)), Some(Mebibytes(5)));

        let mut total = Mebibytes(u64::MAX - 1);
        total += Mebibytes(5);
        assert_eq!(total, Mebibytes::MAX);
    }
}
