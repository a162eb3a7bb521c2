//! HTTP transport
//!
//! MCP over server-sent events: `GET /mcp` opens a session stream whose
//! first event names the endpoint to post messages to, and
//! `POST /mcp/messages?sessionId=...` feeds JSON-RPC messages into that
//! session. Responses travel back over the stream. Any other GET is served
//! from the widget assets directory.

use std::collections::HashMap;
use std::convert::Infallible;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{header, Method, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::mcp::server::McpServer;
use crate::mcp::tools::ToolHandler;
use crate::mcp::widgets::WidgetRegistry;

pub const SSE_PATH: &str = "/mcp";
pub const POST_PATH: &str = "/mcp/messages";

/// Pending outbound messages per session
const SESSION_BUFFER: usize = 32;

struct Session {
    sender: mpsc::Sender<String>,
    server: Arc<tokio::sync::Mutex<McpServer>>,
}

type Sessions = Arc<Mutex<HashMap<String, Session>>>;

/// Shared state of the HTTP transport
#[derive(Clone)]
pub struct HttpState {
    tool_handler: Arc<ToolHandler>,
    widgets: Arc<WidgetRegistry>,
    sessions: Sessions,
}

impl HttpState {
    pub fn new(tool_handler: Arc<ToolHandler>, widgets: Arc<WidgetRegistry>) -> Self {
        Self {
            tool_handler,
            widgets,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn session_count(&self) -> usize {
        lock(&self.sessions).len()
    }
}

fn lock(sessions: &Sessions) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
    sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Removes its session once the SSE stream is dropped
struct SessionGuard {
    sessions: Sessions,
    id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        lock(&self.sessions).remove(&self.id);
        tracing::debug!(session = %self.id, "SSE session closed");
    }
}

/// Build the transport router
pub fn router(state: HttpState, assets_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(SSE_PATH, get(open_stream))
        .route(POST_PATH, post(post_message))
        .fallback_service(ServeDir::new(assets_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `host:port` and serve until the listener fails
pub async fn serve(state: HttpState, assets_dir: &Path, host: &str, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;

    tracing::info!("Badevand MCP server listening on http://{}:{}", host, port);
    tracing::info!("  SSE stream: GET http://{}:{}{}", host, port, SSE_PATH);
    tracing::info!(
        "  Message post endpoint: POST http://{}:{}{}?sessionId=...",
        host,
        port,
        POST_PATH
    );

    axum::serve(listener, router(state, assets_dir)).await?;
    Ok(())
}

async fn open_stream(
    State(state): State<HttpState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let session_id = uuid::Uuid::new_v4().to_string();
    let (sender, receiver) = mpsc::channel(SESSION_BUFFER);

    let server = McpServer::new(state.tool_handler.clone(), state.widgets.clone());
    lock(&state.sessions).insert(
        session_id.clone(),
        Session {
            sender,
            server: Arc::new(tokio::sync::Mutex::new(server)),
        },
    );
    tracing::debug!(session = %session_id, "SSE session opened");

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{}?sessionId={}", POST_PATH, session_id));

    let guard = SessionGuard {
        sessions: state.sessions.clone(),
        id: session_id,
    };
    let messages = ReceiverStream::new(receiver).map(move |message: String| {
        let _session = &guard;
        Ok(Event::default().event("message").data(message))
    });

    let stream = tokio_stream::once(Ok::<_, Infallible>(endpoint)).chain(messages);
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

async fn post_message(
    State(state): State<HttpState>,
    Query(query): Query<SessionQuery>,
    body: String,
) -> Response {
    let Some(session_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "Missing sessionId query parameter").into_response();
    };

    let session = lock(&state.sessions)
        .get(&session_id)
        .map(|s| (s.sender.clone(), s.server.clone()));
    let Some((sender, server)) = session else {
        return (StatusCode::NOT_FOUND, "Unknown session").into_response();
    };

    let outcome = server.lock().await.handle_message(&body).await;
    let response = match outcome {
        Ok(Some(response)) => response,
        Ok(None) => return StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            tracing::error!(session = %session_id, "Failed to process message: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to process message").into_response();
        }
    };

    let json = match serde_json::to_string(&response) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(session = %session_id, "Failed to serialize response: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to process message").into_response();
        }
    };

    // A stalled stream must not block the poster
    match sender.try_send(json) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(mpsc::error::TrySendError::Full(_)) => {
            tracing::warn!(session = %session_id, "SSE stream is not draining, dropping response");
            (StatusCode::SERVICE_UNAVAILABLE, "Session stream is full").into_response()
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            (StatusCode::NOT_FOUND, "Unknown session").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beaches::client::FixtureBeachSource;
    use crate::mcp::widgets::tests::stub_registry;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> HttpState {
        let widgets = Arc::new(stub_registry());
        let source = Arc::new(FixtureBeachSource::new(vec![]));
        HttpState::new(Arc::new(ToolHandler::new(source, widgets.clone())), widgets)
    }

    fn app(state: HttpState) -> Router {
        router(state, &std::env::temp_dir().join("badevand-no-assets"))
    }

    async fn next_chunk(stream: &mut axum::body::BodyDataStream) -> String {
        let chunk = stream.next().await.unwrap().unwrap();
        String::from_utf8(chunk.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_post_without_session_id() {
        let response = app(state())
            .oneshot(Request::post(POST_PATH).body(Body::from("{}")).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_post_unknown_session() {
        let response = app(state())
            .oneshot(
                Request::post(format!("{}?sessionId=missing", POST_PATH))
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stalled_stream_rejects_posts() {
        let state = state();
        let app = app(state.clone());

        let response = app
            .clone()
            .oneshot(Request::get(SSE_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let mut stream = response.into_body().into_data_stream();
        let first = next_chunk(&mut stream).await;
        let post_url = first
            .lines()
            .find_map(|line| line.strip_prefix("data:"))
            .unwrap()
            .trim()
            .to_string();

        let ping = |id: usize| {
            Request::post(post_url.clone())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(r#"{{"jsonrpc":"2.0","id":{},"method":"ping"}}"#, id)))
                .unwrap()
        };

        // Nobody reads the stream, so the buffer fills up
        for id in 0..SESSION_BUFFER {
            let response = app.clone().oneshot(ping(id)).await.unwrap();
            assert_eq!(response.status(), StatusCode::ACCEPTED);
        }

        let response = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            app.clone().oneshot(ping(SESSION_BUFFER)),
        )
        .await
        .expect("post must not block on a full stream")
        .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        drop(stream);
    }

    #[tokio::test]
    async fn test_sse_session_round_trip() {
        let state = state();
        let app = app(state.clone());

        let response = app
            .clone()
            .oneshot(Request::get(SSE_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut stream = response.into_body().into_data_stream();
        let first = next_chunk(&mut stream).await;
        assert!(first.contains("endpoint"));

        let post_url = first
            .lines()
            .find_map(|line| line.strip_prefix("data:"))
            .unwrap()
            .trim()
            .to_string();
        assert!(post_url.starts_with("/mcp/messages?sessionId="));
        assert_eq!(state.session_count(), 1);

        let response = app
            .clone()
            .oneshot(
                Request::post(post_url)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let message = next_chunk(&mut stream).await;
        assert!(message.contains("message"));
        assert!(message.contains(r#""id":1"#));

        drop(stream);
        assert_eq!(state.session_count(), 0);
    }
}
