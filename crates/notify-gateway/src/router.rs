use crate::domain::config::GatewayConfig;
use crate::domain::error::{ApiError, ApiResult};
use crate::domain::types::{NotifyParams, NotifyResponse, PingResponse};
use crate::middleware::middleware_stack;
use crate::rest::RestHandlers;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub rest: Arc<RestHandlers>,
}

/// Build the HTTP router.
///
/// | Method | Path      | Handler                    |
/// |--------|-----------|----------------------------|
/// | GET    | `/ping`   | liveness, never touches the broker |
/// | POST   | `/notify` | publish `?message=` to the channel |
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/notify", post(notify))
        .layer(middleware_stack(config))
        .with_state(state)
}

async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    Json(state.rest.health.ping())
}

async fn notify(
    State(state): State<AppState>,
    params: Result<Query<NotifyParams>, QueryRejection>,
) -> ApiResult<Json<NotifyResponse>> {
    let Query(params) = params.map_err(|e| ApiError::invalid_params(e.body_text()))?;
    state.rest.notify.notify(&params.message).await.map(Json)
}
