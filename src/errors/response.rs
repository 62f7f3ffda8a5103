use axum::{
    response::{Html, IntoResponse, Response, Redirect},
};
use crate::errors::AppError;
use crate::views::escape;

// Fallback for errors that reach the page boundary without a form to re-render.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Missing session token sends the browser to the login page
            AppError::MissingAuth => Redirect::to("/login").into_response(),

            AppError::File(ref e) => {
                tracing::error!("Template error: {}", e);
                (self.status(), Html(error_page(&self.user_message()))).into_response()
            }

            AppError::Session(ref msg) => {
                tracing::error!("Session error: {}", msg);
                (self.status(), Html(error_page(&self.user_message()))).into_response()
            }

            other => (other.status(), Html(error_page(&other.user_message()))).into_response(),
        }
    }
}

fn error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Error</title><link rel="stylesheet" href="/static/style.css"></head>
<body>
    <main class="card">
        <p class="error">Error: {}</p>
        <a href="/dashboard" class="button">Back to dashboard</a>
    </main>
</body>
</html>"#,
        escape(message)
    )
}
