use std::io;
use std::net::SocketAddr;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use facet::Facet;
use faultline_types::{WireEdge, WireSnapshot, now_ms};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::state::{Fault, StubState};
use crate::topology::snapshot_at;

#[derive(Debug, Deserialize)]
struct GraphQuery {
    timestamp: Option<String>,
}

pub fn router(state: StubState) -> Router {
    Router::new()
        .route("/api/graph", get(api_graph).options(preflight))
        .layer(axum::middleware::map_response(allow_any_origin))
        .with_state(state)
}

/// Binds `addr` and serves until the listener fails.
pub async fn serve(addr: &str, state: StubState) -> Result<(), String> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind HTTP on {addr}: {e}"))?;
    info!(%addr, "faultline stub backend ready");
    axum::serve(listener, router(state))
        .await
        .map_err(|e| format!("HTTP server error: {e}"))
}

/// Serves on an ephemeral localhost port in the background.
pub async fn spawn_ephemeral(state: StubState) -> io::Result<(SocketAddr, JoinHandle<io::Result<()>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move { axum::serve(listener, router(state)).await });
    Ok((addr, handle))
}

async fn api_graph(State(state): State<StubState>, Query(query): Query<GraphQuery>) -> Response {
    // Missing or unparsable timestamps mean "now", like a zero protobuf field.
    let requested = query
        .timestamp
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .unwrap_or(0);
    let ts = if requested == 0 { now_ms() } else { requested };
    let fault = state.record(ts);
    debug!(requested, ts, ?fault, "graph request");

    let snapshot = match snapshot_at(ts) {
        Ok(snapshot) => snapshot,
        Err(error) => {
            warn!(%error, "simulated topology is invalid");
            return text(StatusCode::INTERNAL_SERVER_ERROR, error.to_string());
        }
    };

    match fault {
        None => json_ok(&WireSnapshot::from(&snapshot)),
        Some(Fault::ServerError) => text(StatusCode::INTERNAL_SERVER_ERROR, "injected failure"),
        Some(Fault::MalformedBody) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            "{\"timestamp\": ",
        )
            .into_response(),
        Some(Fault::DanglingEdge) => {
            let mut wire = WireSnapshot::from(&snapshot);
            wire.edges.get_or_insert_with(Vec::new).push(WireEdge {
                source: "api-gateway".to_string(),
                target: "decommissioned-service".to_string(),
                causal_confidence: 0.5,
                is_active: true,
            });
            json_ok(&wire)
        }
    }
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn allow_any_origin(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

fn json_ok<T>(value: &T) -> Response
where
    T: for<'facet> Facet<'facet>,
{
    match facet_json::to_string(value) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(error) => text(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("json encode error: {error}"),
        ),
    }
}

fn text(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body.into(),
    )
        .into_response()
}
