/// Tolerance used when comparing temperatures that went through grid arithmetic.
pub const TEMPERATURE_EPSILON: f64 = 1e-6;

/// Rounds `value` half away from zero to the given number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < TEMPERATURE_EPSILON
}
