//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Number of km/h in one m/s
pub const KMH_PER_MS: f64 = 3.6;

/// Constrain a value to the range `[min, max]`.
///
/// Unlike `f64::clamp` a `NaN` value does not propagate, it is mapped onto `min`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    if value.is_nan() {
        return *min;
    }

    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Return the value if it is finite, or the fallback otherwise.
pub fn finite_or<T>(value: T, fallback: T) -> T
where
    T: Float,
{
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Convert a speed in meters/second into kilometers/hour.
pub fn ms_to_kmh(speed_ms: f64) -> f64 {
    speed_ms * KMH_PER_MS
}
