//! Credential-injecting boundary server for the IP-fraud provider.
//!
//! Browsers and other keyless clients call `GET /api/ipqs/check?ip=<ip>`;
//! the server fronts the key-rotation gateway so credentials never leave
//! the process. Upstream answers are passed through verbatim, status
//! included, and every response is marked non-cacheable JSON.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use log::{error, info, warn};
use serde_json::json;

use crate::error_handling::ProviderError;
use crate::gateway::key_rotation::KeyRotationGateway;

/// Builds the boundary router over a key-rotation gateway.
pub fn router(gateway: Arc<KeyRotationGateway>) -> Router {
    Router::new()
        .route("/api/ipqs/check", get(check_handler))
        .with_state(gateway)
}

/// Runs the boundary server on the given port until the process exits.
pub async fn run_proxy_server(port: u16, gateway: Arc<KeyRotationGateway>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind boundary server to port {port}"))?;
    info!("boundary server listening on port {port}");
    axum::serve(listener, router(gateway))
        .await
        .context("boundary server terminated")?;
    Ok(())
}

async fn check_handler(
    State(gateway): State<Arc<KeyRotationGateway>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let ip = match params.get("ip").map(String::as_str) {
        Some(ip) if !ip.trim().is_empty() => ip.trim().to_string(),
        _ => {
            return json_response(
                StatusCode::BAD_REQUEST,
                json!({"error": "Missing required parameter: ip"}).to_string(),
            )
        }
    };

    if !gateway.has_keys() {
        return json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "Server misconfigured: IPQS_API_KEY not set"}).to_string(),
        );
    }

    match gateway.check_ip(&ip).await {
        // Upstream answers, 2xx or not, pass through verbatim.
        Ok(response) => json_response(
            StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            response.body,
        ),
        Err(e @ ProviderError::Configuration(_)) => {
            warn!("boundary check rejected: {e}");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": e.to_string()}).to_string(),
            )
        }
        Err(ProviderError::Upstream { status, body }) => json_response(
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        ),
        Err(e) => {
            error!("boundary check failed ({}): {e}", e.category());
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "Internal Server Error"}).to_string(),
            )
        }
    }
}

/// Builds a response with the boundary's invariant headers.
fn json_response(status: StatusCode, body: String) -> Response {
    axum::http::Response::builder()
        .status(status)
        .header(header::CACHE_CONTROL, "no-store")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap_or_else(|_| {
            let mut fallback = Response::new(Body::from(
                json!({"error": "Internal Server Error"}).to_string(),
            ));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}
