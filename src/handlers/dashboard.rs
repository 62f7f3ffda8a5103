use axum::{
    extract::{Extension, State},
    response::{IntoResponse, Response},
};
use crate::app::AppState;
use crate::errors::AppResult;
use crate::models::resource::{self, Resource};
use crate::session::Session;
use crate::views::escape;

pub async fn serve_dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Response> {
    tracing::info!("Accessing dashboard");

    let user = session
        .user_id()
        .map(|id| format!(r#"<p class="user">Signed in as user #{}</p>"#, escape(id)))
        .unwrap_or_default();

    let sections = resource::ALL
        .iter()
        .map(|entity| format!(r#"<a href="{}" class="button">{}</a>"#, entity.hub_path, escape(entity.title)))
        .collect::<Vec<_>>()
        .join("\n");

    let html = state
        .templates
        .render("dashboard.html", &[("user", user), ("sections", sections)])
        .await?;
    Ok(html.into_response())
}

/// Hub page of one entity: links to its list and create pages.
pub async fn serve_section(
    State(state): State<AppState>,
    Extension(resource): Extension<&'static Resource>,
) -> AppResult<Response> {
    tracing::debug!("Serving {} section", resource.title);

    let html = state
        .templates
        .render(
            "section.html",
            &[
                ("title", escape(resource.title)),
                ("title_lower", escape(&resource.title.to_lowercase())),
                ("singular", escape(resource.singular)),
                ("list_path", resource.list_path.to_string()),
                ("create_path", resource.create_path.to_string()),
            ],
        )
        .await?;
    Ok(html.into_response())
}
