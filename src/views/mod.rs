//! HTML rendering: template files with `{{placeholder}}` substitution.
//!
//! Values are substituted verbatim, so anything that comes from the API or
//! from the user must go through [`escape`] (or one of the builders in
//! [`html`]) first.

use std::path::PathBuf;

use axum::response::Html;

use crate::errors::{AppError, AppResult};

pub mod html;

#[derive(Debug, Clone)]
pub struct Templates {
    dir: PathBuf,
}

impl Templates {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn render(&self, name: &str, vars: &[(&str, String)]) -> AppResult<Html<String>> {
        let path = self.dir.join(name);
        let template = tokio::fs::read_to_string(&path).await.map_err(|e| {
            tracing::error!("Failed to read template {}: {}", path.display(), e);
            AppError::File(e)
        })?;

        Ok(Html(substitute(&template, vars)))
    }
}

// Single left-to-right pass: inserted values are never scanned again, so
// record data containing `{{...}}` comes out unchanged.
fn substitute(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let Some(end) = tail.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = &tail[..end];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &tail[end + 2..];
    }

    out.push_str(rest);
    out
}

/// Escapes text for element content and double-quoted attribute values.
pub fn escape(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// Inline error block, or nothing.
pub fn error_banner(message: Option<&str>) -> String {
    match message {
        Some(message) => format!(r#"<p class="error">Error: {}</p>"#, escape(message)),
        None => String::new(),
    }
}

/// Error block for an [`AppError`], with upstream field errors listed below it.
pub fn error_banner_for(err: &AppError) -> String {
    error_banner(Some(&err.user_message())) + &field_error_list(err)
}

/// Per-field messages the API attached to a rejection, if any.
pub fn field_error_list(err: &AppError) -> String {
    match err {
        AppError::Upstream { field_errors, .. } if !field_errors.is_empty() => {
            let items = field_errors
                .iter()
                .map(|e| format!("<li>{}</li>", escape(e)))
                .collect::<Vec<_>>()
                .join("");
            format!(r#"<ul class="error-list">{}</ul>"#, items)
        }
        _ => String::new(),
    }
}
