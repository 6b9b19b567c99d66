use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use voting_cli::ClientState;

use crate::{error::ApiError, state::AppState};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/meta", get(get_meta))
        .route("/state", get(get_state))
        .route("/refresh", post(refresh))
        .route("/vote/{candidate_id}", post(vote))
        .route("/connect", post(connect))
        .route("/disconnect", post(disconnect))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

async fn get_meta(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "git_hash": option_env!("TALLY_BUILD_GIT_HASH"),
        "build_time_unix": option_env!("TALLY_BUILD_TIME_UNIX"),
        "target_network": state.sync.config().target_network,
    }))
}

async fn get_state(State(state): State<AppState>) -> Json<ClientState> {
    Json(state.sync.state())
}

async fn refresh(State(state): State<AppState>) -> Json<ClientState> {
    info!("POST /refresh - Refresh requested");
    Json(state.sync.load_state().await)
}

async fn vote(
    State(state): State<AppState>,
    Path(candidate_id): Path<u64>,
) -> Result<Json<Value>, ApiError> {
    info!("POST /vote/{} - Vote requested", candidate_id);
    let signature = state.sync.vote(candidate_id).await?;
    Ok(Json(json!({
        "signature": signature.to_string(),
        "state": state.sync.state(),
    })))
}

async fn connect(State(state): State<AppState>) -> Result<Json<ClientState>, ApiError> {
    info!("POST /connect - Wallet connection requested");
    state.sync.connect().await?;
    Ok(Json(state.sync.state()))
}

async fn disconnect(State(state): State<AppState>) -> Json<ClientState> {
    info!("POST /disconnect - Wallet disconnect requested");
    state.sync.disconnect();
    Json(state.sync.state())
}
