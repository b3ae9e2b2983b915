//! REST server
//!
//! Serves wire-protocol commands over a REST API: requests arrive as a
//! URL path, JSON body or query string, get dispatched to a backing
//! connection, and return as JSON envelopes. The HTTP surface is an axum
//! router; all protocol logic lives in [`dispatch`], which is testable
//! without a network layer.

mod dispatch;
mod tokens;

pub use dispatch::{parse_path_command, request_token, RestRequest, RestResponse};
pub use tokens::{Credential, TokenStore};

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::config::Config;
use crate::conn::ConnFactory;
use crate::error::Result;
use dispatch::ServerState;

/// The REST API server.
///
/// Holds the admin token, the backing connection factory and the
/// ephemeral token store; each inbound request is handled independently.
pub struct RestServer {
    listen_addr: String,
    state: Arc<ServerState>,
}

impl RestServer {
    /// Create a server from its config and a backing connection factory.
    pub fn new(config: Config, factory: Arc<dyn ConnFactory>) -> Self {
        Self {
            listen_addr: config.listen_addr,
            state: Arc::new(ServerState {
                api_token: config.api_token,
                factory,
                tokens: TokenStore::new(),
            }),
        }
    }

    /// Build the axum router serving the REST surface.
    ///
    /// Every path is meaningful to the dispatcher, so the router is a
    /// single fallback handler rather than a route table.
    pub fn router(&self) -> Router {
        Router::new().fallback(handle).with_state(self.state.clone())
    }

    /// Bind the listen address and serve until Ctrl+C.
    pub async fn run(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.listen_addr).await?;
        tracing::info!(addr = %self.listen_addr, "listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to install Ctrl+C handler");
    }
}

/// Adapt an axum request into the dispatcher's view and back.
async fn handle(State(state): State<Arc<ServerState>>, req: Request) -> Response {
    let (parts, body) = req.into_parts();

    let path = parts.uri.path().to_string();
    let raw_query = parts.uri.query().unwrap_or("").to_string();
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let bearer_token = request_token(&raw_query, auth_header);

    // read the whole body eagerly; the dispatcher reports a failed read
    // after its authentication and method checks
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|err| err.to_string());

    tracing::debug!(method = %parts.method, %path, "dispatching request");

    let res = dispatch::dispatch(
        &state,
        RestRequest {
            method: parts.method,
            path,
            raw_query,
            bearer_token,
            body,
        },
    )
    .await;

    res.into_response()
}

impl IntoResponse for RestResponse {
    fn into_response(self) -> Response {
        match self.body {
            Some(value) => (
                self.status,
                [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
                value.to_string(),
            )
                .into_response(),
            None => (self.status, Body::empty()).into_response(),
        }
    }
}
