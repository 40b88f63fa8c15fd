//! Eustatic sea-level curves.
//!
//! A [`SeaLevel`] model is a piecewise-linear curve of sea level (metres,
//! relative to present day, positive for a rise) against age (Ma). The
//! drivers use the level averaged over a stratigraphic unit's deposition
//! interval; because the curve is piecewise linear the average is computed
//! exactly. A missing model is equivalent to a level of zero everywhere.

use serde::{Deserialize, Serialize};

use crate::errors::PaleobathResult;
use crate::interpolate::{parse_curve, Curve, OutOfBounds};
use crate::{FloatValue, Time};

/// A sea-level curve relative to present day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeaLevel {
    curve: Curve,
}

impl SeaLevel {
    /// Build a model from `(age, level)` knots.
    pub fn new(points: Vec<(Time, FloatValue)>) -> PaleobathResult<Self> {
        Ok(Self {
            curve: Curve::new(points, OutOfBounds::Clamp)?,
        })
    }

    /// Parse a model from two-column `age level` text.
    pub fn parse(source: &str, source_name: &str) -> PaleobathResult<Self> {
        Ok(Self {
            curve: parse_curve(source, source_name, 0, 1, OutOfBounds::Clamp)?,
        })
    }

    /// Sea level at `age`, clamped to the curve's age range (m).
    pub fn level(&self, age: Time) -> FloatValue {
        self.curve
            .evaluate(age)
            .expect("clamped curve evaluation cannot be out of range")
    }

    /// Mean sea level over the deposition interval `[end_age, begin_age]`
    /// (m). `begin_age` is the older bound. An empty interval returns the
    /// instantaneous level.
    pub fn average_level(&self, begin_age: Time, end_age: Time) -> FloatValue {
        self.curve.mean(end_age, begin_age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sawtooth() -> SeaLevel {
        SeaLevel::new(vec![(0.0, 0.0), (10.0, 40.0), (20.0, 0.0)]).unwrap()
    }

    #[test]
    fn instantaneous_level() {
        let model = sawtooth();
        assert_relative_eq!(model.level(0.0), 0.0);
        assert_relative_eq!(model.level(5.0), 20.0);
        assert_relative_eq!(model.level(10.0), 40.0);
    }

    #[test]
    fn level_clamps_outside_curve() {
        let model = sawtooth();
        assert_relative_eq!(model.level(100.0), 0.0);
    }

    #[test]
    fn average_over_one_segment() {
        let model = sawtooth();
        assert_relative_eq!(model.average_level(10.0, 0.0), 20.0);
    }

    #[test]
    fn average_across_the_peak_is_exact() {
        let model = sawtooth();
        // Symmetric sawtooth: the mean over the full span is half the peak.
        assert_relative_eq!(model.average_level(20.0, 0.0), 20.0);
        // Asymmetric interval around the peak.
        assert_relative_eq!(model.average_level(15.0, 5.0), 30.0);
    }

    #[test]
    fn empty_interval_returns_point_value() {
        let model = sawtooth();
        assert_relative_eq!(model.average_level(5.0, 5.0), 20.0);
    }

    #[test]
    fn flat_curve_average_matches_instantaneous() {
        use is_close::is_close;
        let model = SeaLevel::new(vec![(0.0, -15.0), (50.0, -15.0)]).unwrap();
        assert!(is_close!(model.average_level(30.0, 10.0), model.level(20.0)));
    }

    #[test]
    fn parse_two_column_text() {
        let model = SeaLevel::parse("# Haq 87\n0 0\n5 -10\n15 30\n", "sea_level.txt").unwrap();
        assert_relative_eq!(model.level(5.0), -10.0);
        assert_relative_eq!(model.level(10.0), 10.0);
    }
}
