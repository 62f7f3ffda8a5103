use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    response::Redirect,
    routing::{get, post},
    Router,
};
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    config::Config,
    errors::AppResult,
    handlers,
    middleware,
    models::resource::{self, RESERVATIONS},
    services::ApiClient,
    session::SessionStore,
    views::Templates,
};

// Application state shared by handlers; all of it is read-only
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: ApiClient,
    pub sessions: SessionStore,
    pub templates: Templates,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let sessions = SessionStore::new(&config.session)?;
        let api = ApiClient::new(config.api.base_url.clone());
        let templates = Templates::new(&config.server.templates_dir);

        Ok(Self {
            config: Arc::new(config),
            api,
            sessions,
            templates,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/login", get(handlers::serve_login_page).post(handlers::handle_login))
        .route("/register", get(handlers::serve_register_page).post(handlers::handle_register))
        .route("/logout", post(handlers::handle_logout));

    let mut guarded = Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/dashboard", get(handlers::serve_dashboard))
        // Legacy draft of the reservations list
        .route("/mostrar_reserves", get(|| async { Redirect::permanent(RESERVATIONS.list_path) }));

    for entity in resource::ALL {
        guarded = guarded.merge(handlers::resource_routes(entity));
    }

    let guarded = guarded.route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public)
        .merge(guarded)
        .nest_service("/static", ServeDir::new(&state.config.server.static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.server.max_body_size))
        .with_state(state)
}
