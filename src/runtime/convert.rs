//! Checked conversions between declared field types and canonical scalars.
//!
//! Generated code only reaches for these when a field's declared type differs
//! from the canonical representation of its storage kind. A `None` becomes a
//! `CodecError::Conversion` naming the record and field.
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

use super::Timestamp;

/// Declared value → canonical scalar `C`.
pub trait ToCanonical<C> {
    fn to_canonical(&self) -> Option<C>;
}

/// Canonical scalar `C` → declared value.
pub trait FromCanonical<C>: Sized {
    fn from_canonical(value: C) -> Option<Self>;
}

impl<T: Clone> ToCanonical<T> for T {
    fn to_canonical(&self) -> Option<T> {
        Some(self.clone())
    }
}

impl<T> FromCanonical<T> for T {
    fn from_canonical(value: T) -> Option<T> {
        Some(value)
    }
}

// ------------------------------- numbers --------------------------------- //

macro_rules! integer_canonical {
    ($($ty:ty),* $(,)?) => {$(
        /// Fails when the integer has no exact `f64` representation.
        impl ToCanonical<f64> for $ty {
            fn to_canonical(&self) -> Option<f64> {
                let value = *self as f64;
                (<$ty as FromCanonical<f64>>::from_canonical(value) == Some(*self)).then_some(value)
            }
        }

        impl FromCanonical<f64> for $ty {
            fn from_canonical(value: f64) -> Option<Self> {
                // MAX is 2^k - 1, so MAX as f64 + 1.0 is exactly 2^k even when MAX rounds up.
                // NaN and ±inf fail the fract test too.
                if value.fract() != 0.0 || value < <$ty>::MIN as f64 || value >= <$ty>::MAX as f64 + 1.0 {
                    return None;
                }
                Some(value as $ty)
            }
        }

        impl ToCanonical<String> for $ty {
            fn to_canonical(&self) -> Option<String> {
                Some(self.to_string())
            }
        }

        impl FromCanonical<String> for $ty {
            fn from_canonical(value: String) -> Option<Self> {
                value.trim().parse().ok()
            }
        }
    )*};
}

integer_canonical!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl ToCanonical<f64> for f32 {
    fn to_canonical(&self) -> Option<f64> {
        Some(f64::from(*self))
    }
}

/// Only values an `f32` holds exactly.
impl FromCanonical<f64> for f32 {
    fn from_canonical(value: f64) -> Option<Self> {
        let narrowed = value as f32;
        (f64::from(narrowed) == value || value.is_nan()).then_some(narrowed)
    }
}

impl ToCanonical<String> for f64 {
    fn to_canonical(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl FromCanonical<String> for f64 {
    fn from_canonical(value: String) -> Option<Self> {
        value.trim().parse().ok()
    }
}

impl ToCanonical<f64> for String {
    fn to_canonical(&self) -> Option<f64> {
        self.trim().parse().ok()
    }
}

impl FromCanonical<f64> for String {
    fn from_canonical(value: f64) -> Option<Self> {
        Some(value.to_string())
    }
}

// -------------------------------- bools ---------------------------------- //

impl ToCanonical<bool> for String {
    fn to_canonical(&self) -> Option<bool> {
        self.trim().parse().ok()
    }
}

impl FromCanonical<bool> for String {
    fn from_canonical(value: bool) -> Option<Self> {
        Some(value.to_string())
    }
}

impl ToCanonical<String> for bool {
    fn to_canonical(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl FromCanonical<String> for bool {
    fn from_canonical(value: String) -> Option<Self> {
        value.trim().parse().ok()
    }
}

// -------------------------------- times ---------------------------------- //

impl ToCanonical<Timestamp> for String {
    fn to_canonical(&self) -> Option<Timestamp> {
        DateTime::parse_from_rfc3339(self.trim()).ok().map(|t| t.with_timezone(&Utc))
    }
}

impl FromCanonical<Timestamp> for String {
    fn from_canonical(value: Timestamp) -> Option<Self> {
        Some(value.to_rfc3339())
    }
}

/// Unix seconds.
impl ToCanonical<Timestamp> for i64 {
    fn to_canonical(&self) -> Option<Timestamp> {
        DateTime::from_timestamp(*self, 0)
    }
}

/// Unix seconds, sub-second precision dropped.
impl FromCanonical<Timestamp> for i64 {
    fn from_canonical(value: Timestamp) -> Option<Self> {
        Some(value.timestamp())
    }
}

impl ToCanonical<Timestamp> for DateTime<FixedOffset> {
    fn to_canonical(&self) -> Option<Timestamp> {
        Some(self.with_timezone(&Utc))
    }
}

impl FromCanonical<Timestamp> for DateTime<FixedOffset> {
    fn from_canonical(value: Timestamp) -> Option<Self> {
        Some(value.fixed_offset())
    }
}

/// Naive values are read as UTC.
impl ToCanonical<Timestamp> for NaiveDateTime {
    fn to_canonical(&self) -> Option<Timestamp> {
        Some(self.and_utc())
    }
}

impl FromCanonical<Timestamp> for NaiveDateTime {
    fn from_canonical(value: Timestamp) -> Option<Self> {
        Some(value.naive_utc())
    }
}
