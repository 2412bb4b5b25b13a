use crate::core::utils::numeric::round_to;

/// Melting temperature depression per % formamide, in Celsius degrees.
///
/// The equivalence always uses this classical coefficient, whatever formamide
/// correction the evaluator applied internally. It is guidance for presenting the
/// selected condition at the default temperature, not a thermodynamic result.
pub const FA_COEFFICIENT: f64 = 0.72;

/// Formamide percentage that, at `default_temperature`, mimics hybridizing at
/// `selected_temperature` with `default_formamide`. Rounded to 2 decimals.
pub fn equivalent_formamide(
    selected_temperature: f64,
    default_temperature: f64,
    default_formamide: f64,
) -> f64 {
    round_to(
        default_formamide + (selected_temperature - default_temperature) / FA_COEFFICIENT,
        2,
    )
}
