//! Composite scoring across criteria.

use std::collections::BTreeMap;

use suitability_map_criteria_models::{
    Criterion, CriterionResult, DevelopmentReadiness, OverallAssessment, Status,
};

/// Unweighted mean of the available criterion scores.
///
/// Unavailable criteria never reach this map, so they are excluded from both
/// the sum and the divisor. With no criterion available the area is
/// [`OverallAssessment::InsufficientData`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compose(results: &BTreeMap<Criterion, CriterionResult>) -> OverallAssessment {
    if results.is_empty() {
        return OverallAssessment::InsufficientData;
    }

    let sum: f64 = results.values().map(|r| r.score).sum();
    let score = sum / results.len() as f64;
    let status = Status::from_score(score);

    OverallAssessment::Scored {
        score,
        status,
        readiness: DevelopmentReadiness::from(status),
    }
}

#[cfg(test)]
mod tests {
    use crate::aggregate::CriterionStats;

    use super::*;

    fn result(criterion: Criterion, score: f64) -> (Criterion, CriterionResult) {
        let stats = CriterionStats {
            count: 1,
            mean: score,
            min: score,
            max: score,
            details: BTreeMap::new(),
        };
        (criterion.clone(), stats.into_result(criterion))
    }

    #[test]
    fn averages_available_criteria_only() {
        let results = BTreeMap::from([
            result(Criterion::AirQuality, 90.0),
            result(Criterion::HeatGreenspace, 70.0),
            result(Criterion::Infrastructure, 30.0),
        ]);

        let OverallAssessment::Scored {
            score,
            status,
            readiness,
        } = compose(&results)
        else {
            panic!("expected a score");
        };
        assert!((score - 190.0 / 3.0).abs() < 1e-9);
        assert_eq!(status, Status::Good);
        assert_eq!(readiness, DevelopmentReadiness::MinorImprovementsNeeded);
    }

    #[test]
    fn no_criteria_is_insufficient_data() {
        assert_eq!(
            compose(&BTreeMap::new()),
            OverallAssessment::InsufficientData
        );
    }

    #[test]
    fn single_low_criterion_is_scored_not_insufficient() {
        let results = BTreeMap::from([result(Criterion::Topography, 0.0)]);
        assert!(matches!(
            compose(&results),
            OverallAssessment::Scored {
                status: Status::Poor,
                ..
            }
        ));
    }
}
