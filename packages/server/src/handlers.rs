//! HTTP handler functions for the arrest tracker API.

use std::sync::MutexGuard;

use actix_web::{HttpResponse, web};
use arrest_tracker_arrest_models::Borough;
use arrest_tracker_dashboard::{JsonChartRenderer, UiEvent, ViewController};
use arrest_tracker_server_models::{ApiError, ApiHealth, ApiOptions};

use crate::AppState;

type Controller<'a> = MutexGuard<'a, ViewController<JsonChartRenderer>>;

fn lock(state: &AppState) -> Result<Controller<'_>, HttpResponse> {
    state.controller.lock().map_err(|e| {
        log::error!("Controller mutex poisoned: {e}");
        HttpResponse::InternalServerError().json(ApiError::new("controller unavailable"))
    })
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/options`
///
/// Returns the values needed to populate the filter controls.
pub async fn options(state: web::Data<AppState>) -> HttpResponse {
    let controller = match lock(&state) {
        Ok(controller) => controller,
        Err(response) => return response,
    };
    let dataset = controller.dataset();
    let bounds = dataset.date_bounds();

    HttpResponse::Ok().json(ApiOptions {
        crime_types: dataset.crime_types().to_vec(),
        min_date: bounds.map(|b| b.min),
        max_date: bounds.map(|b| b.max),
        boroughs: Borough::all().iter().map(ToString::to_string).collect(),
    })
}

/// `GET /api/dashboard`
///
/// Renders every output from the current filter state.
pub async fn dashboard(state: web::Data<AppState>) -> HttpResponse {
    match lock(&state) {
        Ok(mut controller) => HttpResponse::Ok().json(controller.initial()),
        Err(response) => response,
    }
}

/// `POST /api/events`
///
/// Applies one UI event and returns the outputs it changed.
pub async fn event(state: web::Data<AppState>, body: web::Json<UiEvent>) -> HttpResponse {
    match lock(&state) {
        Ok(mut controller) => HttpResponse::Ok().json(controller.handle(body.into_inner())),
        Err(response) => response,
    }
}

/// `POST /api/events/batch`
///
/// Applies the events that fired in one cycle. Exactly one is accepted.
pub async fn events_batch(
    state: web::Data<AppState>,
    body: web::Json<Vec<UiEvent>>,
) -> HttpResponse {
    let mut controller = match lock(&state) {
        Ok(controller) => controller,
        Err(response) => return response,
    };

    match controller.dispatch(body.into_inner()) {
        Ok(update) => HttpResponse::Ok().json(update),
        Err(e) => {
            log::warn!("Rejected event batch: {e}");
            HttpResponse::BadRequest().json(ApiError::new(e))
        }
    }
}

/// `GET /api/state`
///
/// Returns the staged and active filters, selected region, and view mode.
pub async fn current_state(state: web::Data<AppState>) -> HttpResponse {
    match lock(&state) {
        Ok(controller) => HttpResponse::Ok().json(controller.state()),
        Err(response) => response,
    }
}
