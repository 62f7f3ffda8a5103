use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::errors::AppError;

/// Bearer token of the current request, inserted by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthToken(pub String);

// Admission check only: the token is not verified here, the API does that on
// every relayed call.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let session = state.sessions.load(req.headers());

    let Some(token) = session.token().map(str::to_owned) else {
        tracing::debug!("No session token for {}, redirecting to login", req.uri().path());
        return AppError::MissingAuth.into_response();
    };

    req.extensions_mut().insert(AuthToken(token));
    req.extensions_mut().insert(session);
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use crate::test_support::{authenticated_cookie, body_text, test_app, FakeApi};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use tower::ServiceExt;

    const GUARDED: &[&str] = &[
        "/",
        "/dashboard",
        "/clients",
        "/mostrar_client",
        "/crear_client",
        "/serveis",
        "/mostrar_serveis",
        "/crear_servei",
        "/inventari",
        "/mostrar_inventari",
        "/crear_inventari",
        "/reserves",
        "/llistar_reserves",
        "/crear_reserva",
        "/mostrar_reserves",
    ];

    #[tokio::test]
    async fn guarded_pages_redirect_without_calling_api() {
        let api = FakeApi::spawn(Router::new()).await;
        let (app, _) = test_app(&api.base_url);

        for path in GUARDED {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(*path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", path);
            assert_eq!(response.headers()[header::LOCATION], "/login", "{}", path);
        }

        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn guarded_actions_redirect_without_calling_api() {
        let api = FakeApi::spawn(Router::new()).await;
        let (app, _) = test_app(&api.base_url);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/mostrar_client")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("actionType=delete&id=5"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn forged_cookie_is_treated_as_anonymous() {
        let api = FakeApi::spawn(Router::new()).await;
        let (app, _) = test_app(&api.base_url);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/clients")
                    .header(header::COOKIE, r#"__session={"token":"forged"}"#)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn token_is_relayed_but_not_checked_locally() {
        let api = FakeApi::spawn(Router::new().route(
            "/api/clients",
            get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthenticated."}))) }),
        ))
        .await;
        let (app, state) = test_app(&api.base_url);
        let cookie = authenticated_cookie(&state, "expired");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/mostrar_client")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // The API's rejection is surfaced on the page, not masked as a crash
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("Error: Unauthenticated."));

        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].authorization.as_deref(), Some("Bearer expired"));
    }
}
