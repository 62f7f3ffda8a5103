// Error type shared by handlers, the API relay and the session store.
use axum::http::StatusCode;
use thiserror::Error;

pub mod response;

pub const INVALID_RESPONSE: &str = "invalid server response";
pub const UNREACHABLE: &str = "could not reach the server";
pub const UNKNOWN_UPSTREAM: &str = "unknown error";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not authenticated")]
    MissingAuth,

    #[error("Validation error: {0}")]
    Validation(String),

    // Non-2xx answer from the external API
    #[error("Upstream error ({status}): {message}")]
    Upstream {
        status: StatusCode,
        message: String,
        field_errors: Vec<String>,
    },

    #[error("Malformed upstream response")]
    MalformedResponse,

    // Auth endpoint answered 2xx without `data.token`
    #[error("Upstream response carried no token")]
    MissingToken,

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("Session error: {0}")]
    Session(String),
}

impl AppError {
    /// Text shown to the user inline, after an `Error: ` prefix.
    pub fn user_message(&self) -> String {
        match self {
            AppError::MissingAuth => "not authenticated".to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Upstream { message, .. } => message.clone(),
            AppError::MalformedResponse => INVALID_RESPONSE.to_string(),
            AppError::MissingToken => "no token received".to_string(),
            AppError::Transport(_) => UNREACHABLE.to_string(),
            AppError::File(_) | AppError::Session(_) => "internal server error".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingAuth => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream { status, .. } => *status,
            AppError::MissingToken => StatusCode::UNAUTHORIZED,
            AppError::MalformedResponse
            | AppError::Transport(_)
            | AppError::File(_)
            | AppError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
