//! REST command dispatcher
//!
//! Parses an inbound HTTP request into a command and argument list from
//! three possible sources (URL path, JSON body, query string), executes it
//! against a backing connection, and shapes the reply or error into the
//! REST envelope. Transport-independent: the axum layer only adapts
//! requests into [`RestRequest`] and responses out of [`RestResponse`].

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use percent_encoding::percent_decode_str;
use serde_json::{json, Value};

use super::tokens::{Credential, TokenStore};
use crate::conn::{Conn, ConnFactory};

/// Shared server context for all requests.
pub(crate) struct ServerState {
    /// Admin API token; issued REST tokens are held in `tokens`.
    pub api_token: String,
    pub factory: Arc<dyn ConnFactory>,
    pub tokens: TokenStore,
}

/// The transport-independent view of an inbound REST request.
#[derive(Debug)]
pub struct RestRequest {
    pub method: Method,
    /// URL path, rooted ("/...").
    pub path: String,
    /// Raw query string, without the leading '?'.
    pub raw_query: String,
    /// Bearer token extracted from the `_token` query parameter or the
    /// `Authorization` header (query wins).
    pub bearer_token: String,
    /// Outcome of eagerly reading the request body. A failed read is
    /// reported only after the authentication and method checks.
    pub body: Result<Vec<u8>, String>,
}

/// Terminal outcome of a dispatched request.
#[derive(Debug)]
pub struct RestResponse {
    pub status: StatusCode,
    /// JSON envelope; `None` means an empty response body.
    pub body: Option<Value>,
}

impl RestResponse {
    fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: Some(body),
        }
    }

    fn error(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: Some(json!({ "error": message })),
        }
    }

    fn empty(status: StatusCode) -> Self {
        Self { status, body: None }
    }
}

/// Extract the bearer token from a request: the `_token` query parameter
/// wins if present and non-empty, otherwise the `Authorization` header
/// with any `Bearer ` prefix stripped. The query value is URL-decoded;
/// the header is used verbatim.
pub fn request_token(raw_query: &str, auth_header: Option<&str>) -> String {
    for pair in raw_query.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            if key == "_token" && !value.is_empty() {
                return decode_query_value(value);
            }
        }
    }
    match auth_header {
        Some(header) => header.strip_prefix("Bearer ").unwrap_or(header).to_string(),
        None => String::new(),
    }
}

/// Percent-decode one path segment. Invalid UTF-8 sequences degrade to
/// replacement characters rather than failing the request.
fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// Decode a query value: '+' means space, then percent-escapes.
fn decode_query_value(value: &str) -> String {
    percent_decode_str(&value.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

/// Assemble a command from the three request sources, in fixed priority
/// order: path segments first, then the whole body as a single trailing
/// argument, then query-string pairs in the query's own order (a key with
/// a value contributes two arguments, a bare key one). The `_token`
/// parameter carries authentication, not command data, and is skipped.
///
/// Path segments are percent-decoded individually, so an encoded slash
/// stays inside its segment. Query pairs are passed through raw.
///
/// The first returned segment is the command name, the rest its arguments.
pub fn parse_path_command(path: &str, body: &[u8], raw_query: &str) -> Vec<String> {
    // the first path segment is always empty for a rooted path
    let mut segments: Vec<String> = path.split('/').skip(1).map(decode_segment).collect();

    if !body.is_empty() {
        segments.push(String::from_utf8_lossy(body).into_owned());
    }

    if !raw_query.is_empty() {
        for pair in raw_query.split('&') {
            let (key, value) = match pair.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (pair, None),
            };
            if key == "_token" {
                continue;
            }
            segments.push(key.to_string());
            if let Some(value) = value {
                segments.push(value.to_string());
            }
        }
    }

    segments
}

/// Run the full per-request state machine: authenticate, validate the
/// method, read the body outcome, acquire a backing connection, execute,
/// and shape the reply.
pub(crate) async fn dispatch(state: &ServerState, req: RestRequest) -> RestResponse {
    let credential = match authenticate(state, &req.bearer_token) {
        Some(credential) => credential,
        None => return RestResponse::error(StatusCode::UNAUTHORIZED, "Unauthorized"),
    };

    if req.method != Method::GET && req.method != Method::POST {
        return RestResponse::empty(StatusCode::METHOD_NOT_ALLOWED);
    }

    let body = match &req.body {
        Ok(body) => body.as_slice(),
        Err(message) => {
            return RestResponse::error(StatusCode::INTERNAL_SERVER_ERROR, message);
        }
    };

    let mut conn = state.factory.get_conn().await;
    let res = dispatch_with_conn(state, &req, body, credential, conn.as_mut()).await;
    // released unconditionally, whatever the outcome
    if let Err(err) = conn.close().await {
        tracing::warn!(%err, "failed to close backing connection");
    }
    res
}

async fn dispatch_with_conn(
    state: &ServerState,
    req: &RestRequest,
    body: &[u8],
    credential: Option<Credential>,
    conn: &mut dyn Conn,
) -> RestResponse {
    // a token-store identity must authenticate against the backing store
    // before the caller's own command runs
    if let Some(credential) = credential {
        let (value, code) = exec_cmd(
            state,
            conn,
            "AUTH",
            &[
                Value::String(credential.username),
                Value::String(credential.password),
            ],
        )
        .await;
        if code != StatusCode::OK {
            return RestResponse {
                status: code,
                body: Some(value),
            };
        }
    }

    // trailing slash is ignored when branching on the path
    let path = req.path.strip_suffix('/').unwrap_or(&req.path);

    match path {
        "" => {
            // a full single command in the body (a single JSON array)
            let args: Vec<Value> = match serde_json::from_slice(body) {
                Ok(args) => args,
                Err(_) => {
                    return RestResponse::error(
                        StatusCode::BAD_REQUEST,
                        "ERR failed to parse command",
                    )
                }
            };
            if args.is_empty() {
                return RestResponse::error(StatusCode::BAD_REQUEST, "ERR empty command");
            }

            let cmd = text_of(&args[0]);
            let (value, code) = exec_cmd(state, conn, &cmd, &args[1..]).await;
            RestResponse {
                status: code,
                body: Some(value),
            }
        }

        "/pipeline" => {
            // multiple full commands in the body (an array of arrays)
            let cmds: Vec<Vec<Value>> = match serde_json::from_slice(body) {
                Ok(cmds) => cmds,
                Err(_) => {
                    return RestResponse::error(
                        StatusCode::BAD_REQUEST,
                        "ERR failed to parse pipeline request",
                    )
                }
            };
            if cmds.is_empty() {
                return RestResponse::error(StatusCode::BAD_REQUEST, "ERR empty pipeline request");
            }

            // executed one at a time, in order, without atomicity: one
            // command's failure never prevents the next from running
            let mut results = Vec::with_capacity(cmds.len());
            for cmd in &cmds {
                if cmd.is_empty() {
                    results.push(json!({ "error": "ERR empty pipeline command" }));
                    continue;
                }
                let name = text_of(&cmd[0]);
                let (value, _) = exec_cmd(state, conn, &name, &cmd[1..]).await;
                results.push(value);
            }
            RestResponse::ok(Value::Array(results))
        }

        _ => {
            // the single command is assembled from path, body and query
            let mut segments = parse_path_command(path, body, &req.raw_query);
            if segments.is_empty() {
                return RestResponse::error(StatusCode::BAD_REQUEST, "ERR empty command");
            }

            let args: Vec<Value> = segments.split_off(1).into_iter().map(Value::String).collect();
            let cmd = segments.remove(0);
            let (value, code) = exec_cmd(state, conn, &cmd, &args).await;
            RestResponse {
                status: code,
                body: Some(value),
            }
        }
    }
}

fn authenticate(state: &ServerState, token: &str) -> Option<Option<Credential>> {
    if token == state.api_token {
        return Some(None);
    }
    state.tokens.lookup(token).map(Some)
}

/// Execute one command against the backing connection, returning the
/// REST envelope and status. The `ACL RESTTOKEN` extension is recognized
/// here, before anything is forwarded to the store, so it also applies to
/// pipeline entries.
async fn exec_cmd(
    state: &ServerState,
    conn: &mut dyn Conn,
    cmd: &str,
    args: &[Value],
) -> (Value, StatusCode) {
    let is_resttoken = cmd.eq_ignore_ascii_case("acl")
        && args
            .first()
            .is_some_and(|arg| text_of(arg).eq_ignore_ascii_case("resttoken"));
    if is_resttoken {
        return exec_acl_resttoken(state, conn, args).await;
    }

    match conn.execute(cmd, args).await {
        Ok(value) => (json!({ "result": value }), StatusCode::OK),
        Err(err) => {
            tracing::debug!(cmd, %err, "backing store rejected command");
            (json!({ "error": err.to_string() }), StatusCode::BAD_REQUEST)
        }
    }
}

/// Exchange a username/password pair for a single-use bearer token.
///
/// The credential is verified with an `AUTH` round trip; on success a
/// fresh secret is obtained from the store's password generator and
/// recorded in the token store. `args` starts at the `RESTTOKEN` token.
async fn exec_acl_resttoken(
    state: &ServerState,
    conn: &mut dyn Conn,
    args: &[Value],
) -> (Value, StatusCode) {
    if args.len() != 3 {
        return (
            json!({ "error": "ERR invalid syntax. Usage: ACL RESTTOKEN username password" }),
            StatusCode::BAD_REQUEST,
        );
    }

    let username = text_of(&args[1]);
    let password = text_of(&args[2]);

    // verify the credential; a failure surfaces the store's own error
    let auth_args = [
        Value::String(username.clone()),
        Value::String(password.clone()),
    ];
    if let Err(err) = conn.execute("AUTH", &auth_args).await {
        return (json!({ "error": err.to_string() }), StatusCode::BAD_REQUEST);
    }

    // auth succeeded, ask the store for a fresh secret
    let token = match conn
        .execute("ACL", &[Value::String("GENPASS".to_string())])
        .await
    {
        Ok(Value::String(token)) => token,
        Ok(other) => text_of(&other),
        Err(err) => return (json!({ "error": err.to_string() }), StatusCode::BAD_REQUEST),
    };

    state.tokens.issue(
        token.clone(),
        Credential { username, password },
    );
    tracing::info!("issued REST token");

    (json!({ "result": token }), StatusCode::OK)
}

/// Textual form of a JSON value: strings verbatim, everything else via
/// its JSON rendering. Used to coerce non-string command names and
/// RESTTOKEN arguments.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
