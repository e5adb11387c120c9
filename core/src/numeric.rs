//! Numeric coercions shared by the graph builder and the scorers.
//!
//! Upstream payloads occasionally carry NaN or infinite values; every helper
//! here collapses those to a finite value instead of letting them propagate
//! into scores.

/// Clamp to `[0, 1]`. Non-finite input becomes `0.0`.
pub fn clamp01(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Read an optional weight, falling back to `default` when it is absent or
/// non-finite. The result is clamped to `[0, 1]`.
pub fn parse_weight(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => clamp01(v),
        _ => clamp01(default),
    }
}

/// Finite-or-zero.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    finite_or_zero(values.iter().sum::<f64>() / values.len() as f64)
}
