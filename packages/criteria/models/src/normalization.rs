//! Rules for converting raw physical measurements into 0-100 suitability
//! scores.
//!
//! Every dataset documents the rule that produced its normalized values so
//! callers can map a score back to raw units when they need to.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a raw measurement maps onto the 0-100 suitability scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NormalizationRule {
    /// Values are already on the 0-100 scale.
    #[default]
    Identity,
    /// `min` maps to 0 and `max` maps to 100 (e.g. NDVI, service access).
    HigherIsBetter {
        /// Raw value scoring 0.
        min: f64,
        /// Raw value scoring 100.
        max: f64,
    },
    /// `min` maps to 100 and `max` maps to 0 (e.g. AQI, surface
    /// temperature).
    LowerIsBetter {
        /// Raw value scoring 100.
        min: f64,
        /// Raw value scoring 0.
        max: f64,
    },
    /// Scores 100 inside `[optimal_low, optimal_high]`, falling linearly to
    /// 0 at `floor` and `ceiling` (e.g. population density, where both
    /// sparse and overcrowded areas are unsuitable).
    Optimum {
        /// Raw value (and below) scoring 0.
        floor: f64,
        /// Lower edge of the optimal band.
        optimal_low: f64,
        /// Upper edge of the optimal band.
        optimal_high: f64,
        /// Raw value (and above) scoring 0.
        ceiling: f64,
    },
}

impl NormalizationRule {
    /// Converts a raw measurement into a score clamped to `[0, 100]`.
    #[must_use]
    pub fn normalize(&self, raw: f64) -> f64 {
        let score = match *self {
            Self::Identity => raw,
            Self::HigherIsBetter { min, max } => fraction(raw, min, max) * 100.0,
            Self::LowerIsBetter { min, max } => (1.0 - fraction(raw, min, max)) * 100.0,
            Self::Optimum {
                floor,
                optimal_low,
                optimal_high,
                ceiling,
            } => {
                if raw < optimal_low {
                    fraction(raw, floor, optimal_low) * 100.0
                } else if raw > optimal_high {
                    (1.0 - fraction(raw, optimal_high, ceiling)) * 100.0
                } else {
                    100.0
                }
            }
        };
        score.clamp(0.0, 100.0)
    }

    /// Maps a score back to the raw measurement that produces it.
    ///
    /// Returns `None` for [`NormalizationRule::Optimum`], where every score
    /// below 100 corresponds to two raw values.
    #[must_use]
    pub fn denormalize(&self, score: f64) -> Option<f64> {
        let t = score.clamp(0.0, 100.0) / 100.0;
        match *self {
            Self::Identity => Some(score),
            Self::HigherIsBetter { min, max } => Some(t.mul_add(max - min, min)),
            Self::LowerIsBetter { min, max } => Some(t.mul_add(min - max, max)),
            Self::Optimum { .. } => None,
        }
    }

    /// Checks that the rule's parameters are finite and ordered.
    ///
    /// # Errors
    ///
    /// Returns an error if any bound is non-finite or the bounds are out of
    /// order.
    pub fn validate(&self) -> Result<(), InvalidNormalizationError> {
        let ok = match *self {
            Self::Identity => true,
            Self::HigherIsBetter { min, max } | Self::LowerIsBetter { min, max } => {
                min.is_finite() && max.is_finite() && min < max
            }
            Self::Optimum {
                floor,
                optimal_low,
                optimal_high,
                ceiling,
            } => {
                [floor, optimal_low, optimal_high, ceiling]
                    .iter()
                    .all(|v| v.is_finite())
                    && floor <= optimal_low
                    && optimal_low <= optimal_high
                    && optimal_high <= ceiling
            }
        };

        if ok {
            Ok(())
        } else {
            Err(InvalidNormalizationError { rule: *self })
        }
    }
}

/// Position of `raw` between `from` and `to`, clamped to `[0, 1]`.
/// A zero-width span is a step at `to`.
fn fraction(raw: f64, from: f64, to: f64) -> f64 {
    let span = to - from;
    if span.abs() < f64::EPSILON {
        return if raw >= to { 1.0 } else { 0.0 };
    }
    ((raw - from) / span).clamp(0.0, 1.0)
}

/// Error returned when a [`NormalizationRule`] has unusable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("invalid normalization rule {rule:?}: bounds must be finite and ascending")]
pub struct InvalidNormalizationError {
    /// The rejected rule.
    pub rule: NormalizationRule,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn lower_is_better_matches_aqi_conversion() {
        let rule = NormalizationRule::LowerIsBetter {
            min: 0.0,
            max: 100.0,
        };
        assert!(approx(rule.normalize(35.0), 65.0));
        assert!(approx(rule.normalize(150.0), 0.0));
        assert!(approx(rule.normalize(-5.0), 100.0));
    }

    #[test]
    fn higher_is_better_matches_ndvi_conversion() {
        let rule = NormalizationRule::HigherIsBetter { min: 0.0, max: 0.8 };
        assert!(approx(rule.normalize(0.4), 50.0));
        assert!(approx(rule.normalize(0.95), 100.0));
    }

    #[test]
    fn optimum_is_flat_inside_band_and_falls_off_both_sides() {
        let rule = NormalizationRule::Optimum {
            floor: 0.0,
            optimal_low: 500.0,
            optimal_high: 5000.0,
            ceiling: 15000.0,
        };
        assert!(approx(rule.normalize(2000.0), 100.0));
        assert!(approx(rule.normalize(250.0), 50.0));
        assert!(approx(rule.normalize(10000.0), 50.0));
        assert!(approx(rule.normalize(20000.0), 0.0));
    }

    #[test]
    fn denormalize_inverts_linear_rules() {
        let rule = NormalizationRule::LowerIsBetter {
            min: 20.0,
            max: 50.0,
        };
        let raw = rule.denormalize(rule.normalize(30.0));
        assert!(raw.is_some_and(|r| approx(r, 30.0)));

        let optimum = NormalizationRule::Optimum {
            floor: 0.0,
            optimal_low: 1.0,
            optimal_high: 2.0,
            ceiling: 3.0,
        };
        assert_eq!(optimum.denormalize(50.0), None);
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        assert!(
            NormalizationRule::HigherIsBetter { min: 1.0, max: 0.0 }
                .validate()
                .is_err()
        );
        assert!(
            NormalizationRule::LowerIsBetter {
                min: f64::NAN,
                max: 1.0
            }
            .validate()
            .is_err()
        );
        assert!(NormalizationRule::Identity.validate().is_ok());
    }

    #[test]
    fn validation_error_describes_the_rule() {
        let err = NormalizationRule::HigherIsBetter { min: 1.0, max: 0.0 }
            .validate()
            .unwrap_err();
        let source: &dyn std::error::Error = &err;
        assert_eq!(
            source.to_string(),
            "invalid normalization rule HigherIsBetter { min: 1.0, max: 0.0 }: bounds must be \
             finite and ascending"
        );
    }
}
