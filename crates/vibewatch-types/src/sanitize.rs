//! Numeric sanitization
//!
//! Every value that crosses a trust boundary (inbound samples, outbound
//! messages) passes through [`Sanitize`]. After sanitization every float leaf
//! is finite and therefore representable as a JSON number:
//!
//! - `NaN` becomes `0.0` (or a caller-supplied default)
//! - `+inf` becomes [`SAFE_MAGNITUDE`]
//! - `-inf` becomes `-SAFE_MAGNITUDE`
//! - finite values pass through unchanged
//!
//! Sanitization is total and idempotent. Non-numeric leaves are left alone.
//! Sanitization runs on typed values rather than on `serde_json::Value`,
//! because `serde_json::Number` cannot hold a non-finite float: by the time a
//! value is JSON, a NaN has already become `null`.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::BuildHasher;

/// Magnitude substituted for infinities.
pub const SAFE_MAGNITUDE: f64 = 1e10;

/// Coerce a float to a finite value, mapping `NaN` to `0.0`.
#[inline]
pub fn sanitize_f64(value: f64) -> f64 {
    sanitize_f64_or(value, 0.0)
}

/// Coerce a float to a finite value, mapping `NaN` to `default`.
#[inline]
pub fn sanitize_f64_or(value: f64, default: f64) -> f64 {
    if value.is_nan() {
        default
    } else if value == f64::INFINITY {
        SAFE_MAGNITUDE
    } else if value == f64::NEG_INFINITY {
        -SAFE_MAGNITUDE
    } else {
        value
    }
}

/// Recursive in-place coercion of every float leaf to a finite value.
pub trait Sanitize {
    /// Sanitize in place.
    fn sanitize(&mut self);

    /// Consume and return the sanitized value.
    fn sanitized(mut self) -> Self
    where
        Self: Sized,
    {
        self.sanitize();
        self
    }
}

impl Sanitize for f64 {
    fn sanitize(&mut self) {
        *self = sanitize_f64(*self);
    }
}

impl Sanitize for f32 {
    fn sanitize(&mut self) {
        *self = sanitize_f64(f64::from(*self)) as f32;
    }
}

macro_rules! passthrough {
    ($($t:ty),* $(,)?) => {
        $(
            impl Sanitize for $t {
                #[inline]
                fn sanitize(&mut self) {}
            }
        )*
    };
}

passthrough!(bool, String, i32, i64, u32, u64, usize, DateTime<Utc>);

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitize(&mut self) {
        if let Some(inner) = self {
            inner.sanitize();
        }
    }
}

impl<T: Sanitize + ?Sized> Sanitize for Box<T> {
    fn sanitize(&mut self) {
        (**self).sanitize();
    }
}

impl<T: Sanitize> Sanitize for [T] {
    fn sanitize(&mut self) {
        self.iter_mut().for_each(Sanitize::sanitize);
    }
}

impl<T: Sanitize, const N: usize> Sanitize for [T; N] {
    fn sanitize(&mut self) {
        self.iter_mut().for_each(Sanitize::sanitize);
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize(&mut self) {
        self.as_mut_slice().sanitize();
    }
}

impl<T: Sanitize> Sanitize for VecDeque<T> {
    fn sanitize(&mut self) {
        self.iter_mut().for_each(Sanitize::sanitize);
    }
}

impl<K, V: Sanitize> Sanitize for BTreeMap<K, V> {
    fn sanitize(&mut self) {
        self.values_mut().for_each(Sanitize::sanitize);
    }
}

impl<K, V: Sanitize, S: BuildHasher> Sanitize for HashMap<K, V, S> {
    fn sanitize(&mut self) {
        self.values_mut().for_each(Sanitize::sanitize);
    }
}
