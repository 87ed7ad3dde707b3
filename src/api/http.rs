//! HTTP server setup with Axum

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::websocket::{handler::ws_handler, AppState, StatusReport};
use crate::error::{ServerError, ServerResult};

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // Local test server: any origin may connect
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket endpoints; clients connect to the bare host as well
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        // Health check
        .route("/health", get(health_check))
        .route("/status", get(status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listener, reporting the address on failure
pub async fn bind(addr: SocketAddr) -> ServerResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serve until the state's shutdown token is cancelled
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> ServerResult<()> {
    let shutdown = state.shutdown.clone();
    let app = create_router(state);

    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "websocket server listening");
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await
    .map_err(ServerError::from)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Sequencer and connection status
async fn status(State(state): State<Arc<AppState>>) -> Json<StatusReport> {
    Json(state.status().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::Sequencer;
    use crate::types::{Event, Script};
    use axum::body::Body;
    use axum::http::Request;
    use tokio_util::sync::CancellationToken;
    use tower::util::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let script = Script::once(vec![Event::new("series1", 0)]);
        Arc::new(AppState::new(
            Arc::new(Sequencer::new(script)),
            "joined".to_string(),
            CancellationToken::new(),
        ))
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(test_state());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_status_reports_idle_sequencer() {
        let app = create_router(test_state());

        let response = app
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["sequencer"]["state"], "idle");
        assert_eq!(json["connected_clients"], 0);
    }

    #[tokio::test]
    async fn test_plain_get_on_ws_route_is_rejected() {
        let app = create_router(test_state());

        let response = app
            .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_bind_conflict_reports_address() {
        let first = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let taken = first.local_addr().unwrap();

        let err = bind(taken).await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { addr, .. } if addr == taken));
    }
}
