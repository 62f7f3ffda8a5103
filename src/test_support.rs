// Shared fixtures for the unit tests: app wiring, cookies and a fake API.
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::Value;

use crate::app::{self, AppState};
use crate::config::{ApiConfig, Config, ServerConfig, SessionConfig};
use crate::session::{Session, TOKEN_KEY};
use crate::views::Templates;

const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

pub fn test_session_config() -> SessionConfig {
    SessionConfig {
        cookie_name: "__session".into(),
        secret: TEST_SECRET.into(),
        max_age_days: 7,
        secure: false,
    }
}

pub fn test_config(api_base_url: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            templates_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/templates").into(),
            static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/static").into(),
            max_body_size: 1024 * 1024,
        },
        api: ApiConfig {
            base_url: api_base_url.into(),
        },
        session: test_session_config(),
    }
}

pub fn templates() -> Templates {
    Templates::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"))
}

pub fn test_app(api_base_url: &str) -> (Router, AppState) {
    let state = AppState::new(test_config(api_base_url)).unwrap();
    (app::router(state.clone()), state)
}

/// `name=value` part of the response's `Set-Cookie` header.
pub fn set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(|pair| pair.trim().to_string())
}

pub fn cookie_header(cookie: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
    headers
}

/// Cookie of a logged-in browser holding `token`.
pub fn authenticated_cookie(state: &AppState, token: &str) -> String {
    let mut session = Session::default();
    session.set(TOKEN_KEY, token);
    let response = state.sessions.commit(&session).unwrap().into_response();
    set_cookie(&response).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

type CallLog = Arc<Mutex<Vec<RecordedCall>>>;

/// Stand-in for the external API, served on an ephemeral local port.
/// Routes are mounted under `/api`, matching `base_url`.
pub struct FakeApi {
    pub base_url: String,
    calls: CallLog,
}

impl FakeApi {
    pub async fn spawn(routes: Router) -> Self {
        let calls = CallLog::default();
        let app = routes
            .fallback(|| async { StatusCode::NOT_FOUND })
            .layer(from_fn_with_state(calls.clone(), record_call));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            calls,
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

async fn record_call(State(calls): State<CallLog>, req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    calls.lock().unwrap().push(RecordedCall {
        method: parts.method.clone(),
        path: parts.uri.path().to_string(),
        authorization: parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned),
        body: serde_json::from_slice(&bytes).ok(),
    });

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
