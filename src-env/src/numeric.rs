//! Numeric helpers shared by the input controls and the curve engine.

/// Bound `value` to `[min, max]`.
///
/// Unlike [`f64::clamp`] this never panics: with `min > max` the result is
/// whichever bound is tested first, and callers must not rely on it.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Round `value` to `precision` decimals with `round(value * 10^p) / 10^p`.
///
/// Halves go away from zero. The multiplication happens in binary floating
/// point, so `-1.005` at precision 2 rounds to `-1.0` (the product is
/// `-100.49999...`), not to the decimal-exact `-1.01`.
pub fn round_to_precision(value: f64, precision: u32) -> f64 {
    let factor = 10.0_f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Number of integer digits of `round(|n|)`, at least 1.
pub fn digit_count(n: f64) -> usize {
    let mut rest = n.abs().round() as u64;
    let mut digits = 1;
    while rest >= 10 {
        rest /= 10;
        digits += 1;
    }
    digits
}

/// Canonical text of a committed number.
///
/// Shortest round-trip decimal, never in exponent form; negative zero is
/// written as `0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{}", value)
    }
}
