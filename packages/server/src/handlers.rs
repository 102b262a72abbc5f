//! HTTP handler functions for the suitability API.

use actix_web::{HttpResponse, web};
use suitability_map_analysis::AnalysisOptions;
use suitability_map_criteria_models::Criterion;
use suitability_map_server_models::{AnalyzeRequest, ApiCriterionInfo, ApiError, ApiHealth};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/criteria`
///
/// Lists every known criterion plus any extra datasets the store holds,
/// with point counts and coverage.
pub async fn criteria(state: web::Data<AppState>) -> HttpResponse {
    let store = state.analyzer.store();

    let mut ids: Vec<Criterion> = Criterion::REGISTERED.to_vec();
    ids.extend(store.criteria().filter(|c| !c.is_registered()).cloned());

    let list: Vec<ApiCriterionInfo> = ids
        .into_iter()
        .map(|criterion| {
            let summary = store.summary(&criterion);
            ApiCriterionInfo {
                label: criterion.label().to_string(),
                registered: criterion.is_registered(),
                available: summary.as_ref().is_some_and(|s| s.point_count > 0),
                point_count: summary.as_ref().map_or(0, |s| s.point_count),
                coverage: summary.as_ref().and_then(|s| s.coverage),
                sources: summary.map(|s| s.sources).unwrap_or_default(),
                id: criterion,
            }
        })
        .collect();

    HttpResponse::Ok().json(list)
}

/// `POST /api/analyze`
///
/// Analyzes the polygon in the request body. Invalid areas are rejected
/// with `422 Unprocessable Entity`.
pub async fn analyze(
    state: web::Data<AppState>,
    body: web::Json<AnalyzeRequest>,
) -> HttpResponse {
    let request = body.into_inner();

    let mut options: AnalysisOptions = state.options;
    if let Some(tolerance) = request.tolerance_degrees {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return unprocessable("toleranceDegrees must be a non-negative number");
        }
        options.tolerance_degrees = tolerance;
    }

    let area = match (request.vertices, request.geojson) {
        (Some(vertices), None) => AreaInput::Vertices(
            vertices
                .into_iter()
                .map(|[lat, lon]| (lat, lon))
                .collect(),
        ),
        (None, Some(geojson)) => AreaInput::GeoJson(geojson.to_string()),
        _ => return unprocessable("Provide exactly one of 'vertices' or 'geojson'"),
    };

    let state = state.into_inner();
    let result = web::block(move || match area {
        AreaInput::Vertices(vertices) => state.analyzer.analyze(&vertices, &options),
        AreaInput::GeoJson(geojson) => state.analyzer.analyze_geojson(&geojson, &options),
    })
    .await;

    match result {
        Ok(Ok(composite)) => HttpResponse::Ok().json(composite),
        Ok(Err(e)) => unprocessable(e.to_string()),
        Err(e) => {
            log::error!("Analysis task failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Analysis failed"))
        }
    }
}

enum AreaInput {
    Vertices(Vec<(f64, f64)>),
    GeoJson(String),
}

fn unprocessable(reason: impl Into<String>) -> HttpResponse {
    HttpResponse::UnprocessableEntity().json(ApiError::new(reason))
}
