//! HTTP surface: `POST /api/plan` and `GET /health`.

use crate::config::{Config, SamplingConfig};
use crate::error::Error;
use crate::planner::{TravelGroupSpec, TripPlanner};
use crate::providers::{ClientFactory, ConfiguredClients};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub factory: Arc<dyn ClientFactory>,
    pub sampling: SamplingConfig,
}

impl AppState {
    pub fn from_config(config: Arc<Config>) -> Self {
        let sampling = config.planner;
        Self {
            factory: Arc::new(ConfiguredClients::new(config)),
            sampling,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub plan: String,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Upstream { .. } | Error::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/plan", post(plan_trip))
        .route("/health", get(health))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn plan_trip(
    State(state): State<AppState>,
    body: Result<Json<TravelGroupSpec>, JsonRejection>,
) -> Result<Json<PlanResponse>, ApiError> {
    let Json(group) = body?;
    let request_id = Uuid::new_v4();

    group.validate()?;

    // Resolve both clients before any network call.
    let search = state.factory.search()?;
    let model = state.factory.model()?;

    info!(%request_id, total_persons = group.total_persons, "planning trip");
    let plan = TripPlanner::new(search, model, state.sampling)
        .plan(&group)
        .await
        .inspect_err(|e| error!(%request_id, "plan failed: {}", e))?;

    Ok(Json(PlanResponse { plan }))
}

pub async fn serve(config: Arc<Config>) -> crate::error::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(AppState::from_config(config))).await?;
    Ok(())
}
