//! Keyed response curves: air-density response, intake velocity scaling,
//! atmospheric attenuation.
//!
//! Keys are written in data as `[time, value]` or
//! `[time, value, in_tangent, out_tangent]`. Between two keys without
//! tangents the curve is linear; when tangents are present the segment is a
//! cubic Hermite. Outside the key range the curve holds its end values.

use serde::{Deserialize, Serialize};

/// A single curve key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct CurveKey {
    pub time: f64,
    pub value: f64,
    pub tangents: Option<(f64, f64)>,
}

impl TryFrom<Vec<f64>> for CurveKey {
    type Error = String;

    fn try_from(raw: Vec<f64>) -> Result<Self, Self::Error> {
        match raw[..] {
            [time, value] => Ok(CurveKey {
                time,
                value,
                tangents: None,
            }),
            [time, value, tin, tout] => Ok(CurveKey {
                time,
                value,
                tangents: Some((tin, tout)),
            }),
            _ => Err(format!("curve key needs 2 or 4 numbers, got {}", raw.len())),
        }
    }
}

impl From<CurveKey> for Vec<f64> {
    fn from(key: CurveKey) -> Self {
        match key.tangents {
            None => vec![key.time, key.value],
            Some((tin, tout)) => vec![key.time, key.value, tin, tout],
        }
    }
}

/// Piecewise curve sorted by key time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct FloatCurve {
    keys: Vec<CurveKey>,
}

impl From<Vec<CurveKey>> for FloatCurve {
    fn from(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }
}

impl From<FloatCurve> for Vec<CurveKey> {
    fn from(curve: FloatCurve) -> Self {
        curve.keys
    }
}

impl FloatCurve {
    /// Build a linear curve from `(time, value)` pairs.
    pub fn linear(points: &[(f64, f64)]) -> Self {
        points
            .iter()
            .map(|&(time, value)| CurveKey {
                time,
                value,
                tangents: None,
            })
            .collect::<Vec<_>>()
            .into()
    }

    /// A curve that evaluates to `value` everywhere.
    pub fn constant(value: f64) -> Self {
        Self::linear(&[(0.0, value)])
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Evaluate the curve at `time`. An empty curve evaluates to 0.
    pub fn evaluate(&self, time: f64) -> f64 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return 0.0,
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        // Index of the first key strictly after `time`; bounded by the checks above.
        let upper = self.keys.partition_point(|k| k.time <= time);
        let k0 = &self.keys[upper - 1];
        let k1 = &self.keys[upper];
        let span = k1.time - k0.time;
        if span <= 0.0 {
            return k1.value;
        }
        let s = (time - k0.time) / span;

        if k0.tangents.is_none() && k1.tangents.is_none() {
            return k0.value + (k1.value - k0.value) * s;
        }

        let slope = (k1.value - k0.value) / span;
        let m0 = k0.tangents.map_or(slope, |(_, out)| out);
        let m1 = k1.tangents.map_or(slope, |(tin, _)| tin);

        let s2 = s * s;
        let s3 = s2 * s;
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;
        h00 * k0.value + h10 * span * m0 + h01 * k1.value + h11 * span * m1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_curve_is_zero() {
        assert_eq!(FloatCurve::default().evaluate(5.0), 0.0);
    }

    #[test]
    fn linear_interpolation_and_clamping() {
        let curve = FloatCurve::linear(&[(0.0, 1.0), (70000.0, 5.0), (500000.0, 0.0)]);
        assert_eq!(curve.evaluate(-10.0), 1.0);
        assert_eq!(curve.evaluate(35000.0), 3.0);
        assert_eq!(curve.evaluate(70000.0), 5.0);
        assert_eq!(curve.evaluate(1.0e9), 0.0);
    }

    #[test]
    fn keys_are_sorted_on_construction() {
        let curve = FloatCurve::linear(&[(10.0, 10.0), (0.0, 0.0)]);
        assert_eq!(curve.evaluate(5.0), 5.0);
    }

    #[test]
    fn hermite_with_matching_slope_is_linear() {
        let curve: FloatCurve = vec![
            CurveKey {
                time: 0.0,
                value: 0.0,
                tangents: Some((1.0, 1.0)),
            },
            CurveKey {
                time: 2.0,
                value: 2.0,
                tangents: Some((1.0, 1.0)),
            },
        ]
        .into();
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-12);
        assert!((curve.evaluate(1.5) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn hermite_flat_tangents_ease() {
        let curve: FloatCurve = vec![
            CurveKey {
                time: 0.0,
                value: 0.0,
                tangents: Some((0.0, 0.0)),
            },
            CurveKey {
                time: 1.0,
                value: 1.0,
                tangents: Some((0.0, 0.0)),
            },
        ]
        .into();
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-12);
        assert!(curve.evaluate(0.25) < 0.25);
    }

    #[test]
    fn deserializes_mixed_key_shapes() {
        let curve: FloatCurve = serde_json::from_str("[[0, 0], [1, 1, 1, 1], [12, 12]]").unwrap();
        assert_eq!(curve.keys().len(), 3);
        assert_eq!(curve.keys()[1].tangents, Some((1.0, 1.0)));
        assert!((curve.evaluate(6.5) - 6.5).abs() < 1e-9);
    }

    #[test]
    fn rejects_three_number_keys() {
        assert!(serde_json::from_str::<FloatCurve>("[[0, 0, 1]]").is_err());
    }
}
