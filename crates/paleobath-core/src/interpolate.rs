//! Piecewise-linear curves.
//!
//! A [`Curve`] is a sequence of linear segments through `(x, y)` knots. It
//! supports point evaluation with a configurable out-of-bounds policy and an
//! exact mean over an interval (the integral of a piecewise-linear function
//! is evaluated segment by segment, so no quadrature error is involved).
//!
//! Curves back the user-supplied age-to-depth tables and the eustatic
//! sea-level model.

use serde::{Deserialize, Serialize};

use crate::errors::{PaleobathError, PaleobathResult};
use crate::FloatValue;

/// Behaviour of [`Curve::evaluate`] when `x` lies outside the knot range.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutOfBounds {
    /// Return the `y` value at the nearest endpoint.
    Clamp,
    /// Return `None`.
    Exclude,
    /// Extend the first/last segment linearly.
    Extrapolate,
}

/// A piecewise-linear function `y = f(x)` through a sorted sequence of knots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curve {
    xs: Vec<FloatValue>,
    ys: Vec<FloatValue>,
    out_of_bounds: OutOfBounds,
}

impl Curve {
    /// Create a curve from `(x, y)` knots.
    ///
    /// The knots are sorted by `x`. At least one knot is required and no two
    /// knots may share an `x` value.
    pub fn new(
        mut points: Vec<(FloatValue, FloatValue)>,
        out_of_bounds: OutOfBounds,
    ) -> PaleobathResult<Self> {
        if points.is_empty() {
            return Err(PaleobathError::Error(
                "curve requires at least one point".to_string(),
            ));
        }
        points.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("curve x values must not be NaN"));
        for pair in points.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(PaleobathError::Error(format!(
                    "curve contains two points with the same x value {}",
                    pair[0].0
                )));
            }
        }
        let (xs, ys) = points.into_iter().unzip();
        Ok(Self {
            xs,
            ys,
            out_of_bounds,
        })
    }

    /// The sorted `x` values of the knots.
    pub fn xs(&self) -> &[FloatValue] {
        &self.xs
    }

    /// The `y` values of the knots, in `x` order.
    pub fn ys(&self) -> &[FloatValue] {
        &self.ys
    }

    /// Evaluate the curve at `x`.
    ///
    /// Returns `None` only when `x` is out of range and the policy is
    /// [`OutOfBounds::Exclude`].
    pub fn evaluate(&self, x: FloatValue) -> Option<FloatValue> {
        let n = self.xs.len();
        if x < self.xs[0] || x > self.xs[n - 1] {
            return match self.out_of_bounds {
                OutOfBounds::Clamp => {
                    if x < self.xs[0] {
                        Some(self.ys[0])
                    } else {
                        Some(self.ys[n - 1])
                    }
                }
                OutOfBounds::Exclude => None,
                OutOfBounds::Extrapolate => {
                    if n == 1 {
                        Some(self.ys[0])
                    } else if x < self.xs[0] {
                        Some(self.segment_value(0, x))
                    } else {
                        Some(self.segment_value(n - 2, x))
                    }
                }
            };
        }

        // Index of the segment whose [x0, x1] contains x.
        let segment = match self.xs.binary_search_by(|probe| {
            probe.partial_cmp(&x).expect("curve x values must not be NaN")
        }) {
            Ok(knot) => return Some(self.ys[knot]),
            Err(upper) => upper - 1,
        };
        Some(self.segment_value(segment, x))
    }

    /// Mean value of the curve over `[x0, x1]`.
    ///
    /// The interval endpoints are clamped to the knot range first (the curve
    /// is constant beyond its endpoints). Returns the point value when the
    /// interval is empty.
    pub fn mean(&self, x0: FloatValue, x1: FloatValue) -> FloatValue {
        let (lo, hi) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        if lo == hi {
            return self
                .evaluate(lo.clamp(self.xs[0], *self.xs.last().unwrap()))
                .expect("clamped evaluation cannot be out of range");
        }
        self.integral(lo, hi) / (hi - lo)
    }

    /// Integral of the curve over `[lo, hi]` (`lo <= hi`), treating the curve
    /// as constant beyond its endpoints.
    fn integral(&self, lo: FloatValue, hi: FloatValue) -> FloatValue {
        let first = self.xs[0];
        let last = *self.xs.last().unwrap();

        let mut total = 0.0;

        // Constant extensions outside the knot range.
        if lo < first {
            total += (hi.min(first) - lo) * self.ys[0];
        }
        if hi > last {
            total += (hi - lo.max(last)) * self.ys[self.ys.len() - 1];
        }

        let lo = lo.max(first);
        let hi = hi.min(last);
        if lo >= hi {
            return total;
        }

        // Trapezoids over each (partially) covered segment.
        for segment in 0..self.xs.len() - 1 {
            let x0 = self.xs[segment].max(lo);
            let x1 = self.xs[segment + 1].min(hi);
            if x0 >= x1 {
                continue;
            }
            let y0 = self.segment_value(segment, x0);
            let y1 = self.segment_value(segment, x1);
            total += 0.5 * (y0 + y1) * (x1 - x0);
        }

        total
    }

    fn segment_value(&self, segment: usize, x: FloatValue) -> FloatValue {
        let x0 = self.xs[segment];
        let x1 = self.xs[segment + 1];
        let y0 = self.ys[segment];
        let y1 = self.ys[segment + 1];
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

/// Parse a two-column curve from whitespace-separated text.
///
/// `x_column` and `y_column` select which columns hold the knot values.
/// Lines that are blank or start with `#` or `>` are skipped.
pub fn parse_curve(
    source: &str,
    source_name: &str,
    x_column: usize,
    y_column: usize,
    out_of_bounds: OutOfBounds,
) -> PaleobathResult<Curve> {
    let min_columns = x_column.max(y_column) + 1;
    let mut points = Vec::new();

    for (line_index, line) in source.lines().enumerate() {
        let line_number = line_index + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() || fields[0].starts_with('#') || fields[0].starts_with('>') {
            continue;
        }
        if fields.len() < min_columns {
            return Err(PaleobathError::BadInputFormat {
                source_name: source_name.to_string(),
                line: line_number,
                reason: format!("expected at least {} columns", min_columns),
            });
        }
        let parse = |column: usize| -> PaleobathResult<FloatValue> {
            fields[column]
                .parse()
                .map_err(|_| PaleobathError::BadInputFormat {
                    source_name: source_name.to_string(),
                    line: line_number,
                    reason: format!("cannot parse {:?} as a number", fields[column]),
                })
        };
        points.push((parse(x_column)?, parse(y_column)?));
    }

    if points.is_empty() {
        return Err(PaleobathError::BadInputFormat {
            source_name: source_name.to_string(),
            line: 0,
            reason: "no data rows".to_string(),
        });
    }

    Curve::new(points, out_of_bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp() -> Curve {
        Curve::new(
            vec![(0.0, 0.0), (10.0, 50.0), (20.0, 120.0)],
            OutOfBounds::Clamp,
        )
        .unwrap()
    }

    #[test]
    fn evaluate_at_knots_and_between() {
        let curve = ramp();
        assert_relative_eq!(curve.evaluate(0.0).unwrap(), 0.0);
        assert_relative_eq!(curve.evaluate(10.0).unwrap(), 50.0);
        assert_relative_eq!(curve.evaluate(5.0).unwrap(), 25.0);
        assert_relative_eq!(curve.evaluate(15.0).unwrap(), 85.0);
    }

    #[test]
    fn clamp_out_of_range() {
        let curve = ramp();
        assert_relative_eq!(curve.evaluate(-5.0).unwrap(), 0.0);
        assert_relative_eq!(curve.evaluate(25.0).unwrap(), 120.0);
    }

    #[test]
    fn exclude_out_of_range() {
        let curve = Curve::new(vec![(0.0, 1.0), (1.0, 2.0)], OutOfBounds::Exclude).unwrap();
        assert!(curve.evaluate(-0.1).is_none());
        assert!(curve.evaluate(1.1).is_none());
        assert!(curve.evaluate(0.5).is_some());
    }

    #[test]
    fn extrapolate_out_of_range() {
        let curve = Curve::new(vec![(0.0, 0.0), (1.0, 2.0)], OutOfBounds::Extrapolate).unwrap();
        assert_relative_eq!(curve.evaluate(2.0).unwrap(), 4.0);
        assert_relative_eq!(curve.evaluate(-1.0).unwrap(), -2.0);
    }

    #[test]
    fn mean_over_single_segment() {
        let curve = ramp();
        // Linear from 0 to 50 over [0, 10]: mean is 25.
        assert_relative_eq!(curve.mean(0.0, 10.0), 25.0);
    }

    #[test]
    fn mean_spanning_knots_is_exact() {
        let curve = ramp();
        // Integral is 250 over [0, 10] plus 850 over [10, 20].
        assert_relative_eq!(curve.mean(0.0, 20.0), 1100.0 / 20.0);
    }

    #[test]
    fn mean_beyond_endpoints_uses_constant_extension() {
        let curve = ramp();
        // [20, 30] is flat at 120.
        assert_relative_eq!(curve.mean(20.0, 30.0), 120.0);
        // Reversed argument order is accepted.
        assert_relative_eq!(curve.mean(30.0, 20.0), 120.0);
    }

    #[test]
    fn mean_of_empty_interval_is_point_value() {
        let curve = ramp();
        assert_relative_eq!(curve.mean(5.0, 5.0), 25.0);
    }

    #[test]
    fn duplicate_x_rejected() {
        let result = Curve::new(vec![(1.0, 0.0), (1.0, 2.0)], OutOfBounds::Clamp);
        assert!(result.is_err());
    }

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let text = "# age level\n\n0 0\n> segment break\n10 -20\n100 30\n";
        let curve = parse_curve(text, "sea_level.txt", 0, 1, OutOfBounds::Clamp).unwrap();
        assert_eq!(curve.xs().len(), 3);
        assert_relative_eq!(curve.evaluate(5.0).unwrap(), -10.0);
    }

    #[test]
    fn parse_reports_bad_line() {
        let text = "0 0\n10 abc\n";
        let err = parse_curve(text, "curve.txt", 0, 1, OutOfBounds::Clamp).unwrap_err();
        assert!(matches!(
            err,
            PaleobathError::BadInputFormat { line: 2, .. }
        ));
    }

    #[test]
    fn parse_selects_columns() {
        let text = "a 1.0 10.0\nb 2.0 20.0\n";
        let curve = parse_curve(text, "curve.txt", 1, 2, OutOfBounds::Clamp).unwrap();
        assert_relative_eq!(curve.evaluate(1.5).unwrap(), 15.0);
    }
}
