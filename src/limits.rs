//! Bounds of the feed-mix constraint set.
//!
//! All constants are configuration. The defaults describe the reference problem:
//! a 1000 kg batch with 17–20 % protein, 2800–3000 kcal/kg and 3.2–4.5 % calcium.
use serde::{Deserialize, Serialize};

use crate::constraint::EQUALITY_TOLERANCE;

/// An inclusive range `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Range { min, max }
    }
}

/// `x[bounded] <= sqrt(x[left] + x[right] + epsilon)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatioLimit {
    pub bounded: usize,
    pub left: usize,
    pub right: usize,
    pub epsilon: f64,
}

impl Default for RatioLimit {
    fn default() -> Self {
        RatioLimit {
            bounded: 2,
            left: 0,
            right: 1,
            epsilon: 1e-5,
        }
    }
}

/// Every bound constant of the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendLimits {
    /// Total mass of the blend, in kg
    pub mass_target: f64,
    /// Absolute tolerance of the mass balance
    pub mass_tolerance: f64,
    pub protein: Range,
    pub energy: Range,
    pub calcium: Range,
    pub ratio: RatioLimit,
}

impl Default for BlendLimits {
    fn default() -> Self {
        BlendLimits {
            mass_target: 1000.,
            mass_tolerance: EQUALITY_TOLERANCE,
            protein: Range::new(170., 200.),
            energy: Range::new(2_800_000., 3_000_000.),
            calcium: Range::new(32., 45.),
            ratio: RatioLimit::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let limits: BlendLimits = toml::from_str(
            r#"
            mass_target = 500.0
            [protein]
            min = 80.0
            max = 100.0
            "#,
        )
        .unwrap();
        assert_eq!(limits.mass_target, 500.);
        assert_eq!(limits.protein, Range::new(80., 100.));
        assert_eq!(limits.calcium, BlendLimits::default().calcium);
        assert_eq!(limits.ratio.epsilon, 1e-5);
    }
}
