//! HTTP server exposing the query pipeline

use crate::error::{KqError, Result};
use crate::handler::{self, AppContext};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    prompt: String,
}

/// Start the query API server
pub async fn start_server(ctx: AppContext, port: u16) -> Result<()> {
    // Permissive CORS for local dashboards and dev tooling
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/query", post(query))
        .layer(cors)
        .with_state(Arc::new(ctx));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("query API listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| KqError::Config(format!("Server error: {e}")))
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn query(State(ctx): State<Arc<AppContext>>, Json(body): Json<QueryBody>) -> Response {
    match handler::handle(&ctx, &body.prompt).await {
        Ok(response) => Json(response).into_response(),
        Err(KqError::EmptyPrompt) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "prompt is required" })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}
