use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header,
    Form,
};

use crate::errors::AppError;
use super::resource::Field;

/// Submitted form values, from either a URL-encoded or a multipart body.
#[derive(Debug, Default, Clone)]
pub struct FormFields(pub HashMap<String, String>);

impl FormFields {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Value of `name` when present and not blank.
    pub fn filled(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|value| !value.trim().is_empty())
    }

    /// Checks presence of every required field; no other validation happens.
    pub fn require(&self, fields: &[Field]) -> Result<(), AppError> {
        let missing: Vec<&str> = fields
            .iter()
            .filter(|field| field.required && self.filled(field.name).is_none())
            .map(|field| field.label)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "All required fields must be filled in (missing: {})",
                missing.join(", ")
            )))
        }
    }

    pub fn require_names(&self, names: &[&str]) -> Result<(), AppError> {
        if names.iter().all(|name| self.filled(name).is_some()) {
            Ok(())
        } else {
            Err(AppError::Validation("All fields are required".into()))
        }
    }

    /// JSON body for the API: one entry per field, `null` when not submitted.
    pub fn to_json(&self, fields: &[Field]) -> serde_json::Value {
        let body = fields
            .iter()
            .map(|field| {
                let value = match self.get(field.name) {
                    Some(value) => serde_json::Value::String(value.to_string()),
                    None => serde_json::Value::Null,
                };
                (field.name.to_string(), value)
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(body)
    }
}

#[async_trait]
impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if is_multipart {
            let mut multipart = Multipart::from_request(req, state).await.map_err(|e| {
                tracing::warn!("Rejected multipart form: {}", e);
                AppError::Validation("Invalid form submission".into())
            })?;
            read_multipart(&mut multipart).await
        } else {
            let Form(values) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| {
                    tracing::warn!("Rejected form body: {}", e);
                    AppError::Validation("Invalid form submission".into())
                })?;
            Ok(FormFields(values))
        }
    }
}

// Text parts only; file parts are read as text too, the forms never upload files
async fn read_multipart(multipart: &mut Multipart) -> Result<FormFields, AppError> {
    let mut values = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to get next field from multipart form: {}", e);
        AppError::Validation("Invalid form submission".into())
    })? {
        let name = field.name().unwrap_or("").to_string();
        let value = field.text().await.map_err(|e| {
            tracing::error!("Failed to read multipart field {}: {}", name, e);
            AppError::Validation("Invalid form submission".into())
        })?;
        if !name.is_empty() {
            values.insert(name, value);
        }
    }

    Ok(FormFields(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resource::CLIENTS;
    use axum::body::Body;

    fn fields(pairs: &[(&str, &str)]) -> FormFields {
        FormFields(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn blank_required_field_is_rejected() {
        let form = fields(&[("name", "  "), ("email", "a@b.com")]);
        let err = form.require(CLIENTS.create_fields).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("Name")));
    }

    #[test]
    fn optional_fields_may_be_missing() {
        let form = fields(&[("name", "Anna"), ("email", "a@b.com")]);
        assert!(form.require(CLIENTS.create_fields).is_ok());
        assert_eq!(
            form.to_json(CLIENTS.create_fields),
            serde_json::json!({"name": "Anna", "email": "a@b.com", "phone": null})
        );
    }

    #[tokio::test]
    async fn reads_urlencoded_body() {
        let req = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("actionType=delete&id=5"))
            .unwrap();
        let form = FormFields::from_request(req, &()).await.unwrap();
        assert_eq!(form.get("actionType"), Some("delete"));
        assert_eq!(form.get("id"), Some("5"));
    }

    #[tokio::test]
    async fn reads_multipart_body() {
        let body = "--XBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"email\"\r\n\r\n\
            a@b.com\r\n\
            --XBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"password\"\r\n\r\n\
            x\r\n\
            --XBOUNDARY--\r\n";
        let req = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap();
        let form = FormFields::from_request(req, &()).await.unwrap();
        assert_eq!(form.filled("email"), Some("a@b.com"));
        assert_eq!(form.filled("password"), Some("x"));
    }
}
