use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use crate::app::AppState;
use crate::errors::{AppError, UNKNOWN_UPSTREAM};
use crate::models::FormFields;
use crate::services::{AuthGrant, Credentials, Registration};
use crate::session::{Session, TOKEN_KEY, USER_ID_KEY};
use crate::views::{error_banner, field_error_list};

pub async fn serve_login_page(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    // Already authenticated: no second login
    if state.sessions.load(&headers).token().is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    render_auth_page(&state, "login.html", StatusCode::OK, String::new()).await
}

pub async fn serve_register_page(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    if state.sessions.load(&headers).token().is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    render_auth_page(&state, "register.html", StatusCode::OK, String::new()).await
}

pub async fn handle_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: FormFields,
) -> Response {
    if let Err(e) = form.require_names(&["email", "password"]) {
        return render_auth_page(&state, "login.html", e.status(), error_banner(Some(&e.user_message()))).await;
    }

    let email = form.get("email").unwrap_or_default();
    tracing::debug!("Login attempt for user: {}", email);

    let credentials = Credentials {
        email,
        password: form.get("password").unwrap_or_default(),
    };

    match state.api.login(&credentials).await {
        Ok(grant) => {
            tracing::debug!("Login succeeded for user: {}", email);
            // Keep whatever else the browser's session already held
            let session = state.sessions.load(&headers);
            authenticated_redirect(&state, session, grant)
        }
        Err(e) => {
            let (status, message) = match &e {
                AppError::Upstream { message, .. } => (StatusCode::UNAUTHORIZED, fallback(message, "Login failed")),
                AppError::MissingToken => (StatusCode::UNAUTHORIZED, "Login failed: no token received".to_string()),
                other => (other.status(), other.user_message()),
            };
            tracing::warn!("Login failed: {}", e);
            render_auth_page(&state, "login.html", status, error_banner(Some(&message))).await
        }
    }
}

pub async fn handle_register(
    State(state): State<AppState>,
    form: FormFields,
) -> Response {
    if let Err(e) = form.require_names(&["name", "email", "password", "passwordConfirmation"]) {
        return render_auth_page(&state, "register.html", e.status(), error_banner(Some(&e.user_message()))).await;
    }

    if form.get("password") != form.get("passwordConfirmation") {
        return render_auth_page(
            &state,
            "register.html",
            StatusCode::BAD_REQUEST,
            error_banner(Some("Passwords do not match")),
        )
        .await;
    }

    let registration = Registration {
        name: form.get("name").unwrap_or_default(),
        email: form.get("email").unwrap_or_default(),
        password: form.get("password").unwrap_or_default(),
        password_confirmation: form.get("passwordConfirmation").unwrap_or_default(),
    };
    tracing::debug!("Registration attempt for user: {}", registration.email);

    match state.api.register(&registration).await {
        // A new account always starts from a fresh session
        Ok(grant) => authenticated_redirect(&state, Session::default(), grant),
        Err(e) => {
            let (status, message) = match &e {
                AppError::Upstream { message, .. } => (StatusCode::BAD_REQUEST, fallback(message, "Registration failed")),
                AppError::MissingToken => (StatusCode::INTERNAL_SERVER_ERROR, "Token missing from response".to_string()),
                other => (other.status(), other.user_message()),
            };
            tracing::warn!("Registration failed: {}", e);
            let banner = error_banner(Some(&message)) + &field_error_list(&e);
            render_auth_page(&state, "register.html", status, banner).await
        }
    }
}

// Logout works with or without a session and always expires the cookie
pub async fn handle_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let session = state.sessions.load(&headers);
    if session.token().is_some() {
        tracing::info!("Logging out user {}", session.user_id().unwrap_or("unknown"));
    }
    (state.sessions.destroy(&session), Redirect::to("/login")).into_response()
}

// The cookie travels on this very redirect
fn authenticated_redirect(state: &AppState, mut session: Session, grant: AuthGrant) -> Response {
    session.set(TOKEN_KEY, grant.token);
    match grant.user_id {
        Some(user_id) => session.set(USER_ID_KEY, user_id),
        None => session.unset(USER_ID_KEY),
    }

    match state.sessions.commit(&session) {
        Ok(jar) => (jar, Redirect::to("/dashboard")).into_response(),
        Err(e) => e.into_response(),
    }
}

fn fallback(message: &str, default: &str) -> String {
    if message == UNKNOWN_UPSTREAM {
        default.to_string()
    } else {
        message.to_string()
    }
}

async fn render_auth_page(state: &AppState, template: &str, status: StatusCode, error: String) -> Response {
    match state.templates.render(template, &[("error", error)]).await {
        Ok(html) => (status, html).into_response(),
        Err(e) => e.into_response(),
    }
}
