use super::config::{ConfigError, TemperatureRange};
use crate::core::utils::numeric::{TEMPERATURE_EPSILON, approx_eq, round_to};
use std::collections::HashMap;

/// Grid temperatures are rounded to this many decimals to absorb float drift.
const GRID_DECIMALS: i32 = 4;
/// Upper bound on the number of points a single sweep may plan.
pub const MAX_PLAN_POINTS: usize = 100_000;

/// The temperatures of one stage sweep and the order they are visited in.
///
/// The grid is `min + k * step` up to `max` inclusive, plus the default temperature
/// when it falls between grid points. Both sweep strategies evaluate exactly these
/// points, so they can only differ in the order results are recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    default: f64,
    grid: Vec<f64>,
    sequential: Vec<f64>,
    ranks: HashMap<i64, usize>,
}

/// Integer key of a temperature at grid resolution.
fn grid_key(temperature: f64) -> i64 {
    (temperature * 10f64.powi(GRID_DECIMALS)).round() as i64
}

impl SweepPlan {
    pub fn new(range: &TemperatureRange) -> Result<Self, ConfigError> {
        range.validate()?;

        let intervals = ((range.max - range.min) / range.step + TEMPERATURE_EPSILON).floor();
        if intervals >= MAX_PLAN_POINTS as f64 {
            return Err(ConfigError::InvalidParameter {
                name: "step",
                reason: format!(
                    "{} over [{}, {}] plans more than {} temperatures",
                    range.step, range.min, range.max, MAX_PLAN_POINTS
                ),
            });
        }

        let default = round_to(range.default, GRID_DECIMALS);
        let mut grid: Vec<f64> = (0..=intervals as usize)
            .map(|k| round_to(range.min + k as f64 * range.step, GRID_DECIMALS))
            .collect();
        if !grid.iter().any(|&t| approx_eq(t, default)) {
            let at = grid.partition_point(|&t| t < default);
            grid.insert(at, default);
        }

        let below = grid.iter().rev().filter(|&&t| t < default && !approx_eq(t, default));
        let above = grid.iter().filter(|&&t| t > default && !approx_eq(t, default));
        let sequential: Vec<f64> = std::iter::once(default)
            .chain(below.copied())
            .chain(above.copied())
            .collect();
        let ranks = sequential
            .iter()
            .enumerate()
            .map(|(rank, &t)| (grid_key(t), rank))
            .collect();

        Ok(Self {
            default,
            grid,
            sequential,
            ranks,
        })
    }

    pub fn default_temperature(&self) -> f64 {
        self.default
    }

    /// Default first, then below it descending, then above it ascending.
    pub fn sequential_order(&self) -> &[f64] {
        &self.sequential
    }

    /// All points ascending.
    pub fn grid_order(&self) -> &[f64] {
        &self.grid
    }

    /// Points below the default, nearest first.
    pub fn downward(&self) -> &[f64] {
        &self.sequential[1..1 + self.count_below()]
    }

    /// Points above the default, nearest first.
    pub fn upward(&self) -> &[f64] {
        &self.sequential[1 + self.count_below()..]
    }

    fn count_below(&self) -> usize {
        self.grid
            .iter()
            .filter(|&&t| t < self.default && !approx_eq(t, self.default))
            .count()
    }

    /// Position of `temperature` in the sequential order.
    pub fn rank(&self, temperature: f64) -> Option<usize> {
        if !temperature.is_finite() {
            return None;
        }
        self.ranks.get(&grid_key(temperature)).copied()
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(default: f64, step: f64, min: f64, max: f64) -> TemperatureRange {
        TemperatureRange {
            default,
            step,
            min,
            max,
        }
    }

    #[test]
    fn sequential_order_walks_down_then_up() {
        let plan = SweepPlan::new(&range(37.0, 1.0, 35.0, 39.0)).unwrap();
        assert_eq!(plan.sequential_order(), &[37.0, 36.0, 35.0, 38.0, 39.0]);
        assert_eq!(plan.grid_order(), &[35.0, 36.0, 37.0, 38.0, 39.0]);
        assert_eq!(plan.downward(), &[36.0, 35.0]);
        assert_eq!(plan.upward(), &[38.0, 39.0]);
    }

    #[test]
    fn grid_size_follows_floor_formula() {
        let plan = SweepPlan::new(&range(37.0, 0.5, 32.0, 42.2)).unwrap();
        let expected = ((42.2f64 - 32.0) / 0.5).floor() as usize + 1;
        assert_eq!(plan.len(), expected);
        assert_eq!(plan.grid_order().last(), Some(&42.0));
    }

    #[test]
    fn fractional_steps_do_not_drift() {
        let plan = SweepPlan::new(&range(37.0, 0.1, 36.5, 37.5)).unwrap();
        assert_eq!(plan.len(), 11);
        assert!(plan.grid_order().contains(&36.8));
        assert_eq!(plan.grid_order().last(), Some(&37.5));
    }

    #[test]
    fn off_grid_default_is_added_once() {
        let plan = SweepPlan::new(&range(37.3, 1.0, 35.0, 39.0)).unwrap();
        assert_eq!(plan.len(), 6);
        assert_eq!(plan.grid_order(), &[35.0, 36.0, 37.0, 37.3, 38.0, 39.0]);
        assert_eq!(plan.sequential_order(), &[37.3, 37.0, 36.0, 35.0, 38.0, 39.0]);
    }

    #[test]
    fn degenerate_range_has_one_point() {
        let plan = SweepPlan::new(&range(37.0, 0.5, 37.0, 37.0)).unwrap();
        assert_eq!(plan.sequential_order(), &[37.0]);
        assert_eq!(plan.grid_order(), &[37.0]);
        assert!(plan.downward().is_empty());
        assert!(plan.upward().is_empty());
    }

    #[test]
    fn rank_follows_sequential_order() {
        let plan = SweepPlan::new(&range(37.0, 1.0, 35.0, 39.0)).unwrap();
        assert_eq!(plan.rank(37.0), Some(0));
        assert_eq!(plan.rank(35.0), Some(2));
        assert_eq!(plan.rank(39.0), Some(4));
        assert_eq!(plan.rank(40.0), None);
        assert_eq!(plan.rank(f64::NAN), None);
    }

    #[test]
    fn rank_covers_every_point_of_a_large_plan() {
        let plan = SweepPlan::new(&range(50.0, 0.001, 10.0, 90.0)).unwrap();
        assert_eq!(plan.len(), 80_001);
        for (position, &t) in plan.sequential_order().iter().enumerate() {
            assert_eq!(plan.rank(t), Some(position));
        }
        assert_eq!(plan.rank(37.0004), None);
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        assert!(SweepPlan::new(&range(37.0, 0.0, 35.0, 39.0)).is_err());
        assert!(SweepPlan::new(&range(40.0, 1.0, 35.0, 39.0)).is_err());
        assert!(SweepPlan::new(&range(37.0, 1e-6, 0.0, 100.0)).is_err());
        assert!(SweepPlan::new(&range(37.0, 1e-3, 0.0, 200.0)).is_err());
    }
}
