//! Per-request analysis pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use strum_macros::{AsRefStr, Display};
use suitability_map_criteria_models::{
    CompositeResult, Criterion, CriterionResult, Status, UnavailableReason,
};
use suitability_map_spatial::{AnalysisArea, ContainmentFilter};
use suitability_map_store::PointStore;

use crate::aggregate::{aggregate, combine};
use crate::composite::compose;
use crate::recommend::synthesize;
use crate::{AnalysisError, AnalysisOptions};

/// Stages of one analysis, in order. None is skipped or retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum Phase {
    /// Check the deadline and the polygon.
    ValidatePolygon,
    /// Filter and aggregate every criterion in parallel.
    FilterAndAggregate,
    /// Compute the overall score.
    Compose,
    /// Produce recommendations.
    Synthesize,
}

/// Outcome of one criterion before composition.
enum Outcome {
    Available(CriterionResult),
    Unavailable(UnavailableReason),
}

/// Runs area analyses against a shared, immutable point store.
///
/// Holds no per-request state, so one analyzer can serve any number of
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct AreaAnalyzer {
    store: Arc<PointStore>,
}

impl AreaAnalyzer {
    /// Creates an analyzer over `store`.
    #[must_use]
    pub const fn new(store: Arc<PointStore>) -> Self {
        Self { store }
    }

    /// The store this analyzer reads from.
    #[must_use]
    pub fn store(&self) -> &PointStore {
        &self.store
    }

    /// Analyzes the polygon with `(latitude, longitude)` vertices.
    ///
    /// # Errors
    ///
    /// * [`AnalysisError::DeadlineExceeded`] if the deadline has passed
    /// * [`AnalysisError::InvalidArea`] if the polygon is rejected
    pub fn analyze(
        &self,
        vertices: &[(f64, f64)],
        options: &AnalysisOptions,
    ) -> Result<CompositeResult, AnalysisError> {
        check_deadline(options)?;
        let area = AnalysisArea::from_lat_lon(vertices).inspect_err(|e| {
            log::warn!("Rejected analysis area: {e}");
        })?;
        self.run(&area, options)
    }

    /// Analyzes a `GeoJSON` polygon.
    ///
    /// # Errors
    ///
    /// Same as [`Self::analyze`], plus unparseable `GeoJSON`.
    pub fn analyze_geojson(
        &self,
        geojson: &str,
        options: &AnalysisOptions,
    ) -> Result<CompositeResult, AnalysisError> {
        check_deadline(options)?;
        let area = AnalysisArea::from_geojson(geojson).inspect_err(|e| {
            log::warn!("Rejected analysis area: {e}");
        })?;
        self.run(&area, options)
    }

    /// Analyzes an already-validated area.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::DeadlineExceeded`] if the deadline has
    /// passed.
    pub fn analyze_area(
        &self,
        area: &AnalysisArea,
        options: &AnalysisOptions,
    ) -> Result<CompositeResult, AnalysisError> {
        check_deadline(options)?;
        self.run(area, options)
    }

    fn run(&self, area: &AnalysisArea, options: &AnalysisOptions) -> Result<CompositeResult, AnalysisError> {
        log::debug!("{}: {} vertices", Phase::ValidatePolygon, area.vertex_count());
        let area_km2 = area.area_km2();
        let filter = ContainmentFilter::new(area, options.tolerance_degrees);

        log::debug!("{}", Phase::FilterAndAggregate);
        let criteria = self.criteria();
        let outcomes: Vec<(Criterion, Outcome)> = criteria
            .into_par_iter()
            .map(|criterion| {
                let outcome = self.evaluate(&criterion, &filter);
                (criterion, outcome)
            })
            .collect();

        log::debug!("{}", Phase::Compose);
        let mut per_criterion = BTreeMap::new();
        let mut unavailable = BTreeMap::new();
        for (criterion, outcome) in outcomes {
            match outcome {
                Outcome::Available(result) => {
                    per_criterion.insert(criterion, result);
                }
                Outcome::Unavailable(reason) => {
                    log::debug!("{criterion} unavailable: {reason}");
                    unavailable.insert(criterion, reason);
                }
            }
        }
        let assessment = compose(&per_criterion);
        let analysis_points = per_criterion.values().map(|r| r.point_count).sum();

        log::debug!("{}", Phase::Synthesize);
        let statuses: BTreeMap<Criterion, Status> = per_criterion
            .iter()
            .map(|(c, r)| (c.clone(), r.status))
            .collect();
        let mut synthesis = synthesize(&statuses);
        for (criterion, result) in &mut per_criterion {
            if let Some(recommendations) = synthesis.per_criterion.remove(criterion) {
                result.recommendations = recommendations;
            }
        }

        let result = CompositeResult {
            assessment,
            area_km2,
            analysis_points,
            per_criterion,
            unavailable,
            global_recommendations: synthesis.global,
        };

        match result.overall_score() {
            Some(score) => log::info!(
                "Analyzed {area_km2:.3} km²: score {score:.1} from {} criteria ({} points), {} unavailable",
                result.per_criterion.len(),
                result.analysis_points,
                result.unavailable.len()
            ),
            None => log::info!("Analyzed {area_km2:.3} km²: insufficient data"),
        }

        Ok(result)
    }

    /// Every registered criterion plus any unregistered ones the store
    /// holds, in relevance order.
    fn criteria(&self) -> Vec<Criterion> {
        let mut criteria = Criterion::REGISTERED.to_vec();
        criteria.extend(self.store.criteria().filter(|c| !c.is_registered()).cloned());
        criteria
    }

    fn evaluate(&self, criterion: &Criterion, filter: &ContainmentFilter) -> Outcome {
        let Some(sources) = self.store.get(criterion) else {
            return Outcome::Unavailable(UnavailableReason::NoDataset);
        };
        if sources.iter().all(|s| s.dataset().is_empty()) {
            return Outcome::Unavailable(UnavailableReason::EmptyDataset);
        }

        let per_source = sources.iter().filter_map(|source| {
            let contained = filter.filter_indexed(source.index());
            aggregate(source.dataset().points(), &contained)
        });
        match combine(per_source) {
            Some(stats) => Outcome::Available(stats.into_result(criterion.clone())),
            None => Outcome::Unavailable(UnavailableReason::NoPointsInArea),
        }
    }
}

fn check_deadline(options: &AnalysisOptions) -> Result<(), AnalysisError> {
    match options.deadline {
        Some(deadline) if Instant::now() >= deadline => {
            log::warn!("Rejected analysis: deadline already passed");
            Err(AnalysisError::DeadlineExceeded)
        }
        _ => Ok(()),
    }
}
