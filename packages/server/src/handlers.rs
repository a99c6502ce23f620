//! HTTP handler functions for the climate need dashboard.

use std::collections::BTreeSet;

use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, web};
use climate_need_county_models::{CountyFips, CountyMetrics, Weights};
use climate_need_geography::{join_scores, to_feature_collection};
use climate_need_render::choropleth::{self, ChoroplethOptions};
use climate_need_render::dashboard::{DashboardView, render_page};
use climate_need_render::scatter::{self, ScatterOptions};
use climate_need_render::table;
use climate_need_scoring::{ScoringError, score, state_counties};
use climate_need_server_models::{ApiError, ApiHealth, ApiScores, ApiStates, DashboardParams};

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        records: state.records.len(),
        boundaries: state.boundaries.len(),
    })
}

/// `GET /api/states`
pub async fn states(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiStates {
        states: state.states.clone(),
    })
}

/// `GET /api/scores`
///
/// Scores every county with the requested weights, optionally restricted to
/// one state.
pub async fn scores(
    state: web::Data<AppState>,
    params: web::Query<DashboardParams>,
) -> HttpResponse {
    let (weights, metrics) = match run_pipeline(&state, &params) {
        Ok(result) => result,
        Err(response) => return response,
    };

    let counties = match params.state() {
        Some(name) => restrict(metrics, &state_counties(&state.records, name)),
        None => metrics,
    };

    HttpResponse::Ok().json(ApiScores {
        state: params.state().map(ToString::to_string),
        weights,
        counties,
    })
}

/// `GET /api/counties.geojson`
///
/// The selected state's scored counties as a `GeoJSON` `FeatureCollection`.
pub async fn counties_geojson(
    state: web::Data<AppState>,
    params: web::Query<DashboardParams>,
) -> HttpResponse {
    let selected = match select_state(&state, &params) {
        Ok(selected) => selected,
        Err(response) => return response,
    };
    let (_, metrics) = match run_pipeline(&state, &params) {
        Ok(result) => result,
        Err(response) => return response,
    };

    let counties = state_counties(&state.records, &selected);
    let joined = join_scores(&metrics, &state.boundaries, &counties);

    match to_feature_collection(&joined).and_then(|fc| Ok(serde_json::to_string(&fc)?)) {
        Ok(body) => HttpResponse::Ok()
            .content_type("application/geo+json")
            .body(body),
        Err(e) => {
            log::error!("Failed to serialize counties for {selected}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to serialize counties"))
        }
    }
}

/// `GET /api/top.csv`
///
/// The top counties by need score as a CSV download. With a `state`
/// parameter the ranking is restricted to that state.
pub async fn top_csv(
    state: web::Data<AppState>,
    params: web::Query<DashboardParams>,
) -> HttpResponse {
    let (_, metrics) = match run_pipeline(&state, &params) {
        Ok(result) => result,
        Err(response) => return response,
    };

    let metrics = match params.state() {
        Some(name) => restrict(metrics, &state_counties(&state.records, name)),
        None => metrics,
    };
    let rows = table::top_counties(&metrics, state.config.report.top_n);

    match table::to_csv_string(&rows) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename("top_counties.csv".to_string())],
            })
            .body(body),
        Err(e) => {
            log::error!("Failed to write top counties CSV: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to write CSV"))
        }
    }
}

/// `GET /`
///
/// The dashboard page for the selected state (the first state when none is
/// given).
pub async fn index(
    state: web::Data<AppState>,
    params: web::Query<DashboardParams>,
) -> HttpResponse {
    let selected = match select_state(&state, &params) {
        Ok(selected) => selected,
        Err(response) => return response,
    };
    let (weights, metrics) = match run_pipeline(&state, &params) {
        Ok(result) => result,
        Err(response) => return response,
    };

    let counties = state_counties(&state.records, &selected);
    let joined = join_scores(&metrics, &state.boundaries, &counties);

    let map_svg = choropleth::render_svg(
        &joined,
        &ChoroplethOptions {
            title: format!("Enhanced need score, {selected}"),
            ..ChoroplethOptions::default()
        },
    );
    let scatter_svg = scatter::render_svg(&metrics, &ScatterOptions::default());
    let table_html =
        table::render_html(&table::top_counties(&metrics, state.config.report.top_n));
    let csv_href = format!(
        "/api/top.csv?politicalWeight={}&resilienceWeight={}",
        weights.political, weights.resilience
    );

    let page = render_page(&DashboardView {
        states: &state.states,
        state: &selected,
        weights,
        map_svg: &map_svg,
        scatter_svg: &scatter_svg,
        table_html: &table_html,
        csv_href: &csv_href,
        mapped_counties: joined.len(),
    });

    HttpResponse::Ok()
        .insert_header(header::ContentType::html())
        .body(page)
}

/// Validates the requested weights and scores every county.
fn run_pipeline(
    state: &AppState,
    params: &DashboardParams,
) -> Result<(Weights, Vec<CountyMetrics>), HttpResponse> {
    let defaults = state.config.weights().unwrap_or_default();
    let weights = params.weights_or(defaults);

    match score(&state.records, weights, state.config.scoring_options()) {
        Ok(metrics) => Ok((weights, metrics)),
        Err(ScoringError::InvalidWeight(e)) => {
            Err(HttpResponse::BadRequest().json(ApiError::new(e.to_string())))
        }
        Err(e) => {
            log::error!("Scoring failed: {e}");
            Err(HttpResponse::InternalServerError().json(ApiError::new(e.to_string())))
        }
    }
}

/// Resolves the requested state against the known states.
///
/// Matching ignores case; the canonical spelling is returned.
fn select_state(state: &AppState, params: &DashboardParams) -> Result<String, HttpResponse> {
    match params.state() {
        Some(name) => state
            .states
            .iter()
            .find(|s| s.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| {
                HttpResponse::NotFound().json(ApiError::new(format!("Unknown state '{name}'")))
            }),
        None => state
            .states
            .first()
            .cloned()
            .ok_or_else(|| HttpResponse::NotFound().json(ApiError::new("No states loaded"))),
    }
}

fn restrict(metrics: Vec<CountyMetrics>, counties: &BTreeSet<CountyFips>) -> Vec<CountyMetrics> {
    metrics
        .into_iter()
        .filter(|m| counties.contains(&m.county_fips))
        .collect()
}
