//! Request extractors.

use std::collections::HashMap;

use axum::{
    Form, Json,
    extract::{FromRequest, FromRequestParts, Multipart, Request},
    http::{header::CONTENT_TYPE, request::Parts},
};
use noxa_common::{AppError, IncomingFile};
use noxa_db::entities::user;
use serde::de::DeserializeOwned;

use crate::middleware::session_token;

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get user from request extensions (set by auth middleware)
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl MaybeAuthUser {
    /// ID of the signed-in user, if any.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(|user| user.id.as_str())
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

/// Raw session token of the request, if one was sent.
#[derive(Debug, Clone)]
pub struct SessionToken(pub Option<String>);

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_token(&parts.headers)))
    }
}

/// Body accepted either as JSON or as an urlencoded form, by content type.
#[derive(Debug, Clone)]
pub struct JsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self(value))
        }
    }
}

/// A collected multipart form: text fields and uploaded files.
///
/// File inputs submitted without a file are skipped.
#[derive(Debug, Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, IncomingFile>,
}

impl FormData {
    /// Read every part of a multipart body.
    pub async fn collect(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            match field.file_name().map(ToString::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;

                    if file_name.is_empty() && data.is_empty() {
                        continue;
                    }
                    form.files.insert(
                        name,
                        IncomingFile {
                            file_name,
                            content_type,
                            data: data.to_vec(),
                        },
                    );
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// Take the uploaded file sent under `name`.
    pub fn take_file(&mut self, name: &str) -> Option<IncomingFile> {
        self.files.remove(name)
    }

    /// Deserialize the text fields into a typed input.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        let object = self
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
            .collect::<serde_json::Map<_, _>>();

        serde_json::from_value(serde_json::Value::Object(object))
            .map_err(|e| AppError::BadRequest(format!("Invalid form: {e}")))
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Self::collect(multipart).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use noxa_core::CreatePublicationInput;

    #[test]
    fn test_parse_fields_into_input() {
        let form = FormData {
            fields: HashMap::from([
                ("theme".to_string(), "Graph Sampling".to_string()),
                ("topic".to_string(), "Statistics".to_string()),
                ("tags".to_string(), "graphs, sampling".to_string()),
            ]),
            files: HashMap::new(),
        };

        let input: CreatePublicationInput = form.parse().unwrap();
        assert_eq!(input.theme, "Graph Sampling");
        assert_eq!(input.topic, "Statistics");
        assert!(input.authors.is_empty());
    }

    #[test]
    fn test_parse_missing_required_field() {
        let form = FormData::default();
        let result: Result<CreatePublicationInput, _> = form.parse();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_take_file() {
        let mut form = FormData::default();
        form.files.insert(
            "file".to_string(),
            IncomingFile {
                file_name: "paper.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                data: b"%PDF".to_vec(),
            },
        );

        assert_eq!(form.take_file("file").unwrap().file_name, "paper.pdf");
        assert!(form.take_file("file").is_none());
    }
}
