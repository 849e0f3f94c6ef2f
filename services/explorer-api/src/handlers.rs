//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use explorer::{CatalogEntry, PassReport, UiEvent};
use wms_common::{TileCoord, WmsError};

use crate::state::{AppState, EventOutcome, SessionView};

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn metrics_handler(Extension(handle): Extension<PrometheusHandle>) -> impl IntoResponse {
    (StatusCode::OK, handle.render())
}

#[derive(Serialize)]
struct CatalogResponse<'a> {
    title: Option<&'a str>,
    layers: usize,
    products: Vec<CatalogEntry>,
}

pub async fn catalog_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let controller = &state.controller;
    Json(CatalogResponse {
        title: controller.capabilities().title.as_deref(),
        layers: controller.catalog().len(),
        products: controller.catalog().entries(),
    })
    .into_response()
}

/// Body returned after a session runs a pass.
#[derive(Serialize)]
struct PassResponse {
    #[serde(flatten)]
    session: SessionView,
    report: Option<PassReport>,
    error: Option<String>,
}

impl PassResponse {
    fn from_outcome(outcome: EventOutcome) -> (Self, Option<WmsError>) {
        let (report, error) = match outcome.result {
            Ok(report) => (Some(report), None),
            Err(err) => (None, Some(err)),
        };
        let body = Self {
            session: outcome.view,
            report,
            error: error.as_ref().map(ToString::to_string),
        };
        (body, error)
    }
}

pub async fn create_session_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Response {
    match state.create_session().await {
        Ok(outcome) => {
            let (body, error) = PassResponse::from_outcome(outcome);
            if let Some(err) = error {
                warn!(session = %body.session.session_id, error = %err, "Initial pass failed");
            }
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(err) => error_response(&err),
    }
}

pub async fn get_session_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Response {
    let Some(session) = state.session(&id).await else {
        return session_not_found(&id);
    };
    match session.view().await {
        Ok(view) => Json(view).into_response(),
        Err(err) => error_response(&err),
    }
}

pub async fn session_event_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(event): Json<UiEvent>,
) -> Response {
    let Some(session) = state.session(&id).await else {
        return session_not_found(&id);
    };
    debug!(session = %id, event = ?event, "Dispatching event");

    match session.dispatch(event).await {
        Ok(outcome) => {
            let (body, error) = PassResponse::from_outcome(outcome);
            let status = error
                .map(|err| status_code(&err))
                .unwrap_or(StatusCode::OK);
            (status, Json(body)).into_response()
        }
        Err(err) => error_response(&err),
    }
}

pub async fn delete_session_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Response {
    if state.remove_session(&id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        session_not_found(&id)
    }
}

/// Redirect to the WMS URL for one tile of the session's current overlay.
pub async fn tile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((id, z, x, y)): Path<(Uuid, u32, u32, u32)>,
) -> Response {
    let coord = TileCoord::new(z, x, y);
    if !coord.is_valid() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("Tile {} is out of range", coord) })),
        )
            .into_response();
    }

    let Some(session) = state.session(&id).await else {
        return session_not_found(&id);
    };
    let view = match session.view().await {
        Ok(view) => view,
        Err(err) => return error_response(&err),
    };

    match view.snapshot.overlay {
        Some(overlay) => Redirect::temporary(&overlay.url_template.tile_url(coord)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Session has no overlay yet" })),
        )
            .into_response(),
    }
}

fn status_code(err: &WmsError) -> StatusCode {
    StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn error_response(err: &WmsError) -> Response {
    (status_code(err), Json(json!({ "error": err.to_string() }))).into_response()
}

fn session_not_found(id: &Uuid) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("Session not found: {}", id) })),
    )
        .into_response()
}
