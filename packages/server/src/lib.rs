#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the arrest tracker dashboard.
//!
//! Loads the dataset once at startup and serves the dashboard's update
//! cycles over HTTP. Cycles are serialized through one shared
//! [`ViewController`], so every client sees the same filter state.

mod handlers;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use arrest_tracker_dashboard::{AppConfig, ConfigError, JsonChartRenderer, ViewController};
use arrest_tracker_dataset::{Dataset, DatasetError};
use thiserror::Error;

/// Default bind address when neither `--bind` nor `BIND_ADDR` is set.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Default port when neither `--port` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 8080;

/// Errors that can prevent the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The config file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The dataset could not be loaded.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// The HTTP server failed to bind or run.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state.
pub struct AppState {
    /// The dashboard controller. Held for the length of one update cycle.
    pub controller: Mutex<ViewController<JsonChartRenderer>>,
}

impl AppState {
    /// Wraps a dataset in a fresh controller.
    #[must_use]
    pub fn new(dataset: Arc<Dataset>, config: &AppConfig) -> Self {
        Self {
            controller: Mutex::new(ViewController::new(
                dataset,
                JsonChartRenderer,
                config.dashboard,
            )),
        }
    }
}

/// Where to listen and which config to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    /// Explicit config path, overriding the environment and default.
    pub config_path: Option<PathBuf>,
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/options", web::get().to(handlers::options))
            .route("/dashboard", web::get().to(handlers::dashboard))
            .route("/events", web::post().to(handlers::event))
            .route("/events/batch", web::post().to(handlers::events_batch))
            .route("/state", web::get().to(handlers::current_state)),
    );
}

/// Starts the arrest tracker API server.
///
/// Loads the config and dataset, then serves until shut down. This is a
/// regular async function; the caller provides the runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// * [`ServerError::Config`] if the config file cannot be read or parsed
/// * [`ServerError::Dataset`] if the dataset files cannot be loaded
/// * [`ServerError::Io`] if the HTTP server fails to bind or run
#[allow(clippy::future_not_send)]
pub async fn run_server(options: ServerOptions) -> Result<(), ServerError> {
    let config_path = AppConfig::resolve_path(options.config_path);
    let config = AppConfig::load(&config_path)?;

    let dataset = Arc::new(Dataset::load(&config.data)?);
    let state = web::Data::new(AppState::new(dataset, &config));

    log::info!("Starting server on {}:{}", options.bind_addr, options.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((options.bind_addr, options.port))?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};
    use arrest_tracker_arrest_models::{AgeGroup, ArrestRecord, Borough, PerpSex};
    use arrest_tracker_geography_models::{GeoRegion, RegionKey};
    use serde_json::{Value, json};

    fn state() -> web::Data<AppState> {
        let records = [
            (Borough::Brooklyn, 75, "ROBBERY"),
            (Borough::Brooklyn, 75, "ASSAULT"),
            (Borough::Queens, 110, "ROBBERY"),
        ]
        .into_iter()
        .map(|(borough, precinct, offense)| ArrestRecord {
            precinct: Some(precinct),
            borough: Some(borough),
            offense: offense.to_string(),
            sex: PerpSex::Female,
            age_group: AgeGroup::From18To24,
            date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1),
        })
        .collect();
        let boroughs = Borough::all()
            .iter()
            .map(|&name| GeoRegion {
                key: RegionKey::Borough { name },
                geometry: None,
            })
            .collect();
        let dataset = Dataset::from_parts(records, boroughs, Vec::new());
        web::Data::new(AppState::new(Arc::new(dataset), &AppConfig::default()))
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn options_list_controls() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/options").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["crimeTypes"], json!(["ASSAULT", "ROBBERY"]));
        assert_eq!(body["minDate"], "2024-03-01");
        assert_eq!(body["boroughs"].as_array().unwrap().len(), 5);
    }

    #[actix_web::test]
    async fn region_click_then_state() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/events")
            .set_json(json!({
                "trigger": "clickRegion",
                "signal": { "select_region": { "Borough": ["Brooklyn"] } },
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["trigger"], "clickRegion");
        assert_eq!(body["matchedRecords"], 2);
        assert!(body["map"].is_object());
        assert_eq!(body["genderChart"]["status"], "ready");

        let req = test::TestRequest::get().uri("/api/state").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body["selectedRegion"],
            json!({ "kind": "borough", "name": "Brooklyn" })
        );
    }

    #[actix_web::test]
    async fn batch_rejects_concurrent_triggers() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/events/batch")
            .set_json(json!([{ "trigger": "clickApply" }, { "trigger": "clickReset" }]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/events/batch")
            .set_json(json!([]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/events/batch")
            .set_json(json!([{ "trigger": "clickReset" }]))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["matchedRecords"], 3);
    }

    #[actix_web::test]
    async fn dashboard_renders_all_outputs() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/dashboard").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["trigger"], "initial");
        assert!(body["map"].is_object());
        assert_eq!(body["crimeChart"]["status"], "ready");
    }
}
