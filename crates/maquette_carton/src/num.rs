//! Decimal precision helpers.
//!
//! Step-based numeric fields accumulate binary floating point drift
//! (`0.2 + 0.1 == 0.30000000000000004`). Values are therefore re-quantized
//! to the decimal precision of the configured step after every change.

/// Number of decimal digits in the shortest decimal rendering of `value`.
///
/// Integers and non-finite values have a precision of zero.
pub fn precision_of(value: f64) -> u32 {
    if !value.is_finite() || value.fract() == 0.0 {
        return 0;
    }
    let rendered = format!("{value}");
    match rendered.split('.').nth(1) {
        Some(decimals) => decimals.len() as u32,
        None => 0,
    }
}

/// Re-round `value` to `precision` decimal digits. Exact halves round
/// away from zero.
///
/// Integers and non-finite values are returned unchanged.
pub fn quantize(value: f64, precision: u32) -> f64 {
    if !value.is_finite() || value.fract() == 0.0 {
        return value;
    }
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_of() {
        assert_eq!(precision_of(1.0), 0);
        assert_eq!(precision_of(0.1), 1);
        assert_eq!(precision_of(0.25), 2);
        assert_eq!(precision_of(f64::NAN), 0);
    }

    #[test]
    fn test_quantize_drift() {
        let drifted = 0.2 + 0.1;
        assert_ne!(drifted, 0.3);
        assert_eq!(quantize(drifted, 1), 0.3);
    }

    #[test]
    fn test_quantize_integers_untouched() {
        assert_eq!(quantize(42.0, 3), 42.0);
    }

    #[test]
    fn test_quantize_half_rounds_away_from_zero() {
        assert_eq!(quantize(1.25, 1), 1.3);
        assert_eq!(quantize(-1.25, 1), -1.3);
        assert_eq!(quantize(3.75, 1), 3.8);
    }
}
