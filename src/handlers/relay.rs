//! Guarded relay pages shared by every entity.
//!
//! One set of handlers serves clients, services, inventory and reservations;
//! the [`Resource`] attached to each route says which API path, columns and
//! form fields apply. Routes are mounted behind [`require_auth`], so every
//! handler here can rely on an [`AuthToken`].
//!
//! [`require_auth`]: crate::middleware::require_auth

use std::collections::HashMap;

use axum::{
    extract::{Extension, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::json;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::middleware::AuthToken;
use crate::models::entity::record_id;
use crate::models::{FormFields, NamedOption, Resource};
use crate::views::{error_banner_for, escape, html};
use super::dashboard::serve_section;

pub fn resource_routes(resource: &'static Resource) -> Router<AppState> {
    Router::new()
        .route(resource.hub_path, get(serve_section))
        .route(resource.list_path, get(list_page).post(list_action))
        .route(resource.create_path, get(create_form).post(create_submit))
        .layer(Extension(resource))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    // Record whose edit form is open
    edit: Option<String>,
}

pub async fn list_page(
    State(state): State<AppState>,
    Extension(resource): Extension<&'static Resource>,
    Extension(AuthToken(token)): Extension<AuthToken>,
    Query(query): Query<ListQuery>,
) -> Response {
    tracing::info!("Listing {}", resource.title);
    let edit = query.edit.as_deref().filter(|id| !id.is_empty());
    render_list(&state, resource, &token, edit, None).await
}

// A failed action outranks a failed reload; either one hides the edit form
async fn render_list(
    state: &AppState,
    resource: &Resource,
    token: &str,
    edit: Option<&str>,
    action_error: Option<&AppError>,
) -> Response {
    let (records, load_error) = match state.api.fetch_list(token, resource.api_path).await {
        Ok(records) => (records, None),
        Err(e) => {
            tracing::warn!("Failed to load {}: {}", resource.title, e);
            (Vec::new(), Some(e))
        }
    };
    let error = action_error.or(load_error.as_ref());

    let edit = match (error, edit) {
        (None, Some(id)) => {
            let record = records.iter().find(|r| record_id(r).as_deref() == Some(id));
            html::edit_form(resource, id, record)
        }
        _ => String::new(),
    };

    let status = error.map(AppError::status).unwrap_or(StatusCode::OK);
    let banner = error.map(error_banner_for).unwrap_or_default();

    let page = state
        .templates
        .render(
            "list.html",
            &[
                ("title", escape(resource.title)),
                ("singular", escape(resource.singular)),
                ("error", banner),
                ("header", html::table_header(resource)),
                ("rows", html::table_rows(resource, &records)),
                ("edit", edit),
                ("create_path", resource.create_path.to_string()),
                ("hub_path", resource.hub_path.to_string()),
            ],
        )
        .await;

    match page {
        Ok(html) => (status, html).into_response(),
        Err(e) => e.into_response(),
    }
}

// Scripted callers ask for JSON; plain form posts get pages and redirects
fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

/// Inline update/delete submitted from a list page.
pub async fn list_action(
    State(state): State<AppState>,
    Extension(resource): Extension<&'static Resource>,
    Extension(AuthToken(token)): Extension<AuthToken>,
    headers: HeaderMap,
    form: FormFields,
) -> Response {
    let id = form.filled("id").map(str::to_owned);
    let json = wants_json(&headers);

    match (form.get("actionType"), id) {
        (Some("delete"), Some(id)) => delete_record(&state, resource, &token, &id, json).await,
        (Some("update"), Some(id)) => update_record(&state, resource, &token, &id, &form, json).await,
        _ if json => (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid action" }))).into_response(),
        _ => AppError::Validation("invalid action".into()).into_response(),
    }
}

async fn delete_record(state: &AppState, resource: &Resource, token: &str, id: &str, json: bool) -> Response {
    tracing::info!("Deleting {} {}", resource.singular, id);

    match state.api.send(Method::DELETE, &resource.item_path(id), Some(token), None).await {
        Ok(_) if json => Json(json!({ "success": true })).into_response(),
        Ok(_) => Redirect::to(resource.list_path).into_response(),
        Err(e) => {
            tracing::warn!("Failed to delete {} {}: {}", resource.singular, id, e);
            if json {
                (
                    e.status(),
                    Json(json!({ "success": false, "error": e.user_message() })),
                )
                    .into_response()
            } else {
                render_list(state, resource, token, None, Some(&e)).await
            }
        }
    }
}

async fn update_record(
    state: &AppState,
    resource: &Resource,
    token: &str,
    id: &str,
    form: &FormFields,
    json: bool,
) -> Response {
    if let Err(e) = form.require(resource.update_fields) {
        return render_edit_failure(state, resource, id, &e).await;
    }

    tracing::info!("Updating {} {}", resource.singular, id);
    let body = form.to_json(resource.update_fields);

    match state.api.send(Method::PUT, &resource.item_path(id), Some(token), Some(&body)).await {
        Ok(_) if json => Json(json!({ "success": true })).into_response(),
        Ok(_) => Redirect::to(resource.list_path).into_response(),
        Err(e) => {
            tracing::warn!("Failed to update {} {}: {}", resource.singular, id, e);
            render_edit_failure(state, resource, id, &e).await
        }
    }
}

// Submitted values are not echoed back
async fn render_edit_failure(state: &AppState, resource: &Resource, id: &str, err: &AppError) -> Response {
    let page = state
        .templates
        .render(
            "form.html",
            &[
                ("title", format!("Edit {}", escape(resource.singular))),
                ("error", error_banner_for(err)),
                ("form", html::edit_form(resource, id, None)),
                ("back_path", resource.list_path.to_string()),
            ],
        )
        .await;

    match page {
        Ok(html) => (err.status(), html).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_form(
    State(state): State<AppState>,
    Extension(resource): Extension<&'static Resource>,
    Extension(AuthToken(token)): Extension<AuthToken>,
) -> AppResult<Response> {
    tracing::info!("Serving create form for {}", resource.singular);

    // Any failing reference list fails the whole page
    let options = load_options(&state, resource, &token).await?;
    Ok(render_create(&state, resource, StatusCode::OK, None, &options).await)
}

pub async fn create_submit(
    State(state): State<AppState>,
    Extension(resource): Extension<&'static Resource>,
    Extension(AuthToken(token)): Extension<AuthToken>,
    form: FormFields,
) -> Response {
    let result = match form.require(resource.create_fields) {
        Ok(()) => {
            tracing::info!("Creating {}", resource.singular);
            let body = form.to_json(resource.create_fields);
            state
                .api
                .send(Method::POST, resource.api_path, Some(&token), Some(&body))
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => Redirect::to(resource.hub_path).into_response(),
        Err(e) => {
            tracing::warn!("Failed to create {}: {}", resource.singular, e);
            // The form's select inputs need their options again
            let options = load_options(&state, resource, &token).await.unwrap_or_else(|reload| {
                tracing::warn!("Failed to reload options for {}: {}", resource.singular, reload);
                HashMap::new()
            });
            render_create(&state, resource, e.status(), Some(&e), &options).await
        }
    }
}

/// Fetches every select source of the create form concurrently.
async fn load_options(
    state: &AppState,
    resource: &Resource,
    token: &str,
) -> AppResult<HashMap<&'static str, Vec<NamedOption>>> {
    let sources = resource.option_sources();
    if sources.is_empty() {
        return Ok(HashMap::new());
    }

    let lists = try_join_all(sources.iter().map(|source| state.api.fetch_options(token, source))).await?;
    Ok(sources.into_iter().zip(lists).collect())
}

async fn render_create(
    state: &AppState,
    resource: &Resource,
    status: StatusCode,
    error: Option<&AppError>,
    options: &HashMap<&'static str, Vec<NamedOption>>,
) -> Response {
    let form = format!(
        r#"<form method="post" action="{action}">
{inputs}
<button type="submit">Create {singular}</button>
</form>"#,
        action = resource.create_path,
        inputs = html::form_inputs(resource.create_fields, &HashMap::new(), options),
        singular = escape(resource.singular),
    );

    let page = state
        .templates
        .render(
            "form.html",
            &[
                ("title", format!("New {}", escape(resource.singular))),
                ("error", error.map(error_banner_for).unwrap_or_default()),
                ("form", form),
                ("back_path", resource.hub_path.to_string()),
            ],
        )
        .await;

    match page {
        Ok(html) => (status, html).into_response(),
        Err(e) => e.into_response(),
    }
}
