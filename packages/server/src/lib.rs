#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web dashboard server for the climate need map.
//!
//! Loads the county dataset and boundaries once at startup and keeps them
//! read-only in [`AppState`]. Every request re-runs the scoring pipeline
//! with the requested weights, so moving a slider on the dashboard always
//! produces a fresh, complete result. Reports written by the CLI are served
//! from `/reports`.

mod handlers;
pub mod interactive;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use climate_need_config::NeedConfig;
use climate_need_county_models::CountyRecord;
use climate_need_geography::{BoundaryKey, CountyBoundary, GeoError, load_boundaries};
use climate_need_scoring::{ScoringError, load_records};
use thiserror::Error;

/// Errors that can occur while loading the server's source data.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The county dataset could not be loaded.
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    /// The boundary file could not be loaded.
    #[error(transparent)]
    Geo(#[from] GeoError),
}

/// Shared application state.
pub struct AppState {
    /// Every row of the county dataset.
    pub records: Vec<CountyRecord>,
    /// Distinct state names, sorted.
    pub states: Vec<String>,
    /// County boundaries.
    pub boundaries: Vec<CountyBoundary>,
    /// Active configuration.
    pub config: NeedConfig,
}

impl AppState {
    /// Builds the state from already loaded data.
    #[must_use]
    pub fn new(
        records: Vec<CountyRecord>,
        boundaries: Vec<CountyBoundary>,
        config: NeedConfig,
    ) -> Self {
        let states = climate_need_scoring::states(&records);
        Self {
            records,
            states,
            boundaries,
            config,
        }
    }

    /// Loads the dataset and boundaries named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if either file cannot be read or parsed.
    pub fn load(config: NeedConfig) -> Result<Self, LoadError> {
        log::info!("Loading county data from {}", config.data.records.display());
        let records = load_records(&config.data.records)?;

        log::info!(
            "Loading county boundaries from {}",
            config.data.boundaries.display()
        );
        let key = BoundaryKey::new(&config.data.boundary_key);
        let boundaries = load_boundaries(&config.data.boundaries, &key)?;

        Ok(Self::new(records, boundaries, config))
    }
}

/// Registers the dashboard page and the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/states", web::get().to(handlers::states))
            .route("/scores", web::get().to(handlers::scores))
            .route("/counties.geojson", web::get().to(handlers::counties_geojson))
            .route("/top.csv", web::get().to(handlers::top_csv)),
    )
    .route("/", web::get().to(handlers::index));
}

/// Starts the dashboard server.
///
/// Loads the source data named in `config` and serves the dashboard on the
/// configured bind address and port. This is a regular async function; the
/// caller is responsible for providing the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the source data cannot be loaded,
/// the HTTP server fails to bind, or it encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: NeedConfig) -> std::io::Result<()> {
    let bind_addr = config.server.bind.clone();
    let port = config.server.port;
    let reports_dir = config.report.output_dir.clone();

    let state = web::Data::new(AppState::load(config).map_err(std::io::Error::other)?);

    log::info!(
        "Loaded {} rows, {} states, {} boundaries",
        state.records.len(),
        state.states.len(),
        state.boundaries.len()
    );
    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            // Serve reports written by `climate_need report`
            .service(Files::new("/reports", &reports_dir).show_files_listing())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use climate_need_county_models::CountyMetrics;
    use climate_need_geography::boundaries::parse_boundaries;
    use climate_need_scoring::read_records;
    use climate_need_server_models::{ApiError, ApiScores, ApiStates};

    use super::*;

    const RECORDS: &str = "\
county_fips,state,party,happening,candidatevotes,totalvotes,risk_score,resl_score
1001,Alabama,DEMOCRAT,2,600,1000,50,80
1001,Alabama,REPUBLICAN,4,400,1000,50,80
1003,Alabama,DEMOCRAT,6,300,1000,90,20
1003,Alabama,REPUBLICAN,6,700,1000,90,20
4001,Arizona,DEMOCRAT,5,500,1000,40,60
4001,Arizona,REPUBLICAN,5,500,1000,40,60
";

    const BOUNDARIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"STATEFP": "01", "COUNTYFP": "001", "NAME": "Autauga"},
                "geometry": {"type": "Polygon", "coordinates": [[[-87,32],[-86,32],[-86,33],[-87,33],[-87,32]]]}
            },
            {
                "type": "Feature",
                "properties": {"STATEFP": "01", "COUNTYFP": "003", "NAME": "Baldwin"},
                "geometry": {"type": "Polygon", "coordinates": [[[-86,32],[-85,32],[-85,33],[-86,33],[-86,32]]]}
            },
            {
                "type": "Feature",
                "properties": {"STATEFP": "04", "COUNTYFP": "001", "NAME": "Apache"},
                "geometry": {"type": "Polygon", "coordinates": [[[-110,35],[-109,35],[-109,36],[-110,36],[-110,35]]]}
            }
        ]
    }"#;

    fn app_state() -> web::Data<AppState> {
        let records = read_records(RECORDS.as_bytes()).unwrap();
        let boundaries = parse_boundaries(BOUNDARIES, &BoundaryKey::default()).unwrap();
        web::Data::new(AppState::new(records, boundaries, NeedConfig::defaults()))
    }

    macro_rules! app {
        () => {
            test::init_service(App::new().app_data(app_state()).configure(configure)).await
        };
    }

    #[actix_web::test]
    async fn health_reports_loaded_data() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["records"], 6);
        assert_eq!(body["boundaries"], 3);
    }

    #[actix_web::test]
    async fn lists_states() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/states").to_request();
        let body: ApiStates = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.states, vec!["Alabama", "Arizona"]);
    }

    #[actix_web::test]
    async fn scores_can_be_filtered_by_state() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/scores").to_request();
        let body: ApiScores = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.counties.len(), 3);
        assert_eq!(body.state, None);

        let req = test::TestRequest::get()
            .uri("/api/scores?state=alabama&politicalWeight=1&resilienceWeight=1")
            .to_request();
        let body: ApiScores = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.counties.len(), 2);
        let b: &CountyMetrics = body
            .counties
            .iter()
            .find(|c| c.county_fips.as_str() == "01003")
            .unwrap();
        assert!((b.enhanced_need_score.unwrap() - 102.9).abs() < 1e-9);
    }

    #[actix_web::test]
    async fn invalid_weights_are_bad_requests() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/scores?politicalWeight=1.5")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ApiError = test::read_body_json(resp).await;
        assert!(body.error.contains("political"));

        let req = test::TestRequest::get()
            .uri("/?resilienceWeight=-0.5")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn geojson_contains_state_counties() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/counties.geojson?state=Alabama")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["type"], "FeatureCollection");
        let features = body["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert!(features.iter().all(|f| f["properties"]["state"] == "Alabama"));
    }

    #[actix_web::test]
    async fn unknown_state_is_not_found() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/counties.geojson?state=Atlantis")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn top_csv_is_an_attachment() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/top.csv").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment"));

        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("county_fips,TotalRiskScore"));
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("01003,"));
    }

    #[actix_web::test]
    async fn dashboard_renders_selected_state() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/?state=Alabama&politicalWeight=0.5")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains(r#"<option value="Alabama" selected>"#));
        assert!(html.contains(r#"id="county-01001""#));
        assert!(!html.contains(r#"id="county-04001""#));
        assert!(html.contains(r#"value="0.5""#));
    }
}
