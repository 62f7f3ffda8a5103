use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;

use crate::errors::{AppError, AppResult, UNKNOWN_UPSTREAM};
use crate::models::{NamedOption, Record};

/// Relay to the external REST API. Cloning shares the connection pool.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

/// What a successful login or registration hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthGrant {
    pub token: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Registration<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub password_confirmation: &'a str,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends one request and decodes the JSON answer.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> AppResult<Value> {
        tracing::debug!("Relaying {} {}", method, path);

        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("Request to {} {} failed: {}", method, path, e);
            AppError::Transport(e)
        })?;

        decode(response).await
    }

    pub async fn get(&self, token: &str, path: &str) -> AppResult<Value> {
        self.send(Method::GET, path, Some(token), None).await
    }

    pub async fn fetch_list(&self, token: &str, path: &str) -> AppResult<Vec<Record>> {
        let body = self.get(token, path).await?;
        into_records(body)
    }

    pub async fn fetch_options(&self, token: &str, path: &str) -> AppResult<Vec<NamedOption>> {
        let body = self.get(token, path).await?;
        let items = into_array(body)?;
        serde_json::from_value(Value::Array(items)).map_err(|e| {
            tracing::warn!("Unexpected option list from {}: {}", path, e);
            AppError::MalformedResponse
        })
    }

    pub async fn login(&self, credentials: &Credentials<'_>) -> AppResult<AuthGrant> {
        let body = serde_json::to_value(credentials)
            .map_err(|_| AppError::Validation("Invalid credentials".into()))?;
        let response = self.send(Method::POST, "/login", None, Some(&body)).await?;
        extract_grant(&response)
    }

    pub async fn register(&self, registration: &Registration<'_>) -> AppResult<AuthGrant> {
        let body = serde_json::to_value(registration)
            .map_err(|_| AppError::Validation("Invalid registration".into()))?;
        let response = self.send(Method::POST, "/register", None, Some(&body)).await?;
        extract_grant(&response)
    }
}

// The body is parsed before the status is looked at: a non-JSON body is a
// malformed response whatever the status.
async fn decode(response: reqwest::Response) -> AppResult<Value> {
    let status = response.status();
    let text = response.text().await?;

    let body = if text.trim().is_empty() {
        if status.is_success() {
            // 204 and friends
            return Ok(Value::Null);
        }
        None
    } else {
        match serde_json::from_str::<Value>(&text) {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!("Upstream answered {} with a non-JSON body: {}", status, e);
                return Err(AppError::MalformedResponse);
            }
        }
    };

    if !status.is_success() {
        let message = body
            .as_ref()
            .and_then(|b| b.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(UNKNOWN_UPSTREAM)
            .to_string();
        let field_errors = body.as_ref().map(collect_field_errors).unwrap_or_default();
        tracing::warn!("Upstream rejected request with {}: {}", status, message);
        return Err(AppError::Upstream { status, message, field_errors });
    }

    body.ok_or(AppError::MalformedResponse)
}

// `{"errors": {"email": ["taken"]}}` -> ["email: taken"]
fn collect_field_errors(body: &Value) -> Vec<String> {
    let Some(errors) = body.get("errors").and_then(Value::as_object) else {
        return Vec::new();
    };

    errors
        .iter()
        .flat_map(|(field, messages)| {
            let messages = match messages {
                Value::Array(items) => items.iter().filter_map(Value::as_str).map(str::to_owned).collect(),
                Value::String(message) => vec![message.clone()],
                _ => Vec::new(),
            };
            messages.into_iter().map(move |m| format!("{}: {}", field, m))
        })
        .collect()
}

fn into_array(body: Value) -> AppResult<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(AppError::MalformedResponse),
        },
        _ => Err(AppError::MalformedResponse),
    }
}

fn into_records(body: Value) -> AppResult<Vec<Record>> {
    into_array(body)?
        .into_iter()
        .map(|item| match item {
            Value::Object(record) => Ok(record),
            _ => Err(AppError::MalformedResponse),
        })
        .collect()
}

/// Pulls `data.token` out of an auth response; a 2xx without it is a failure.
pub fn extract_grant(body: &Value) -> AppResult<AuthGrant> {
    let data = body.get("data");
    let token = data
        .and_then(|d| d.get("token"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::MissingToken)?;

    let user_id = data
        .and_then(|d| d.get("user").and_then(|u| u.get("id")).or_else(|| d.get("user_id")))
        .and_then(crate::models::entity::display_value);

    Ok(AuthGrant { token: token.to_string(), user_id })
}
