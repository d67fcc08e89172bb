use std::ops::{Deref, DerefMut};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use bytes::BytesMut;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use serde_json::Error as JsonError;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::logging::pii::Redacted;
use crate::web::trace_ctx;

/// Largest request body accepted by [`ValidatedJson`].
pub const MAX_JSON_BODY_BYTES: usize = 256 * 1024;

/// JSON body extractor with problem-details errors.
///
/// Malformed JSON is `BAD_REQUEST`; well-formed JSON of the wrong shape
/// (unknown or missing fields, wrong types) is `VALIDATION_ERROR`. Both are
/// HTTP 400. Bodies over [`MAX_JSON_BODY_BYTES`] are rejected with 413.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    /// Extract the inner value from the ValidatedJson wrapper
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for ValidatedJson<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> FromRequest for ValidatedJson<T>
where
    T: DeserializeOwned + 'static,
{
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        let mut payload = payload.take();

        // Extract content type before creating the async future to avoid borrow-across-await
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("")
            .to_string();

        Box::pin(async move {
            let trace_id = trace_ctx::trace_id();

            // Collect the request body into BytesMut
            let mut body = BytesMut::new();
            while let Some(chunk) = payload.next().await {
                let chunk = chunk.map_err(|e| {
                    warn!(
                        trace_id = %trace_id,
                        error = %e,
                        "Failed to read request body chunk"
                    );
                    AppError::bad_request(
                        ErrorCode::BadRequest,
                        "Failed to read request body".to_string(),
                    )
                })?;
                if body.len() + chunk.len() > MAX_JSON_BODY_BYTES {
                    return Err(AppError::bad_request(
                        ErrorCode::PayloadTooLarge,
                        format!("Request body exceeds {MAX_JSON_BODY_BYTES} bytes"),
                    ));
                }
                body.extend_from_slice(&chunk);
            }

            let parsed = serde_json::from_slice::<T>(&body).map_err(|e| {
                let detail = classify_json_error(&e);
                let is_data_error = matches!(e.classify(), Category::Data);

                debug!(
                    trace_id = %trace_id,
                    error = %Redacted(&e.to_string()),
                    content_type = %content_type,
                    body_size = body.len(),
                    "JSON parsing failed"
                );

                if is_data_error {
                    AppError::invalid(ErrorCode::ValidationError, detail)
                } else {
                    AppError::bad_request(ErrorCode::BadRequest, detail)
                }
            })?;

            Ok(ValidatedJson(parsed))
        })
    }
}

/// Classify serde_json::Error and return a sanitized error message.
///
/// Only field-name errors are echoed back; type errors can quote the
/// offending value, so they get a generic message.
fn classify_json_error(error: &JsonError) -> String {
    match error.classify() {
        Category::Syntax => {
            let line = error.line();
            format!("Invalid JSON at line {line}")
        }
        Category::Eof => "Invalid JSON: unexpected end of input".to_string(),
        Category::Data => {
            let message = error.to_string();
            let message = message
                .rfind(" at line ")
                .map_or(message.as_str(), |idx| &message[..idx]);
            if message.starts_with("unknown field") || message.starts_with("missing field") {
                format!("Invalid request body: {message}")
            } else {
                "Invalid JSON: wrong types for one or more fields".to_string()
            }
        }
        Category::Io => "Invalid JSON: I/O error while reading body".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(deny_unknown_fields)]
    struct TestStruct {
        pub name: String,
        pub age: u32,
    }

    #[test]
    fn test_classify_json_error_syntax() {
        let json = r#"{"name": "test", "age": }"#;
        let error = serde_json::from_str::<TestStruct>(json).unwrap_err();
        let detail = classify_json_error(&error);
        assert!(detail.contains("Invalid JSON"));
        assert!(detail.contains("line") || detail.contains("syntax"));
    }

    #[test]
    fn test_classify_json_error_eof() {
        let json = r#"{"name": "test""#;
        let error = serde_json::from_str::<TestStruct>(json).unwrap_err();
        let detail = classify_json_error(&error);
        assert!(detail.contains("unexpected end of input"));
    }

    #[test]
    fn test_classify_json_error_data() {
        let json = r#"{"name": 123, "age": "invalid"}"#;
        let error = serde_json::from_str::<TestStruct>(json).unwrap_err();
        let detail = classify_json_error(&error);
        assert!(detail.contains("wrong types"));
    }

    #[test]
    fn test_classify_json_error_unknown_field_names_field() {
        let json = r#"{"id": 5, "name": "test", "age": 1}"#;
        let error = serde_json::from_str::<TestStruct>(json).unwrap_err();
        let detail = classify_json_error(&error);
        assert!(detail.starts_with("Invalid request body: unknown field `id`"));
        assert!(!detail.contains("at line"));
    }

    #[test]
    fn test_classify_json_error_missing_field_names_field() {
        let json = r#"{"name": "test"}"#;
        let error = serde_json::from_str::<TestStruct>(json).unwrap_err();
        let detail = classify_json_error(&error);
        assert_eq!(detail, "Invalid request body: missing field `age`");
    }

    #[test]
    fn test_classify_json_error_type_error_hides_value() {
        let json = r#"{"name": "secret-value", "age": "x"}"#;
        let error = serde_json::from_str::<TestStruct>(json).unwrap_err();
        let detail = classify_json_error(&error);
        assert!(!detail.contains("secret-value"));
        assert_eq!(detail, "Invalid JSON: wrong types for one or more fields");
    }

    async fn extract(body: impl Into<bytes::Bytes>) -> Result<TestStruct, AppError> {
        let (req, mut payload) = actix_web::test::TestRequest::post()
            .insert_header(("content-type", "application/json"))
            .set_payload(body.into())
            .to_http_parts();
        ValidatedJson::<TestStruct>::from_request(&req, &mut payload)
            .await
            .map(ValidatedJson::into_inner)
    }

    #[actix_web::test]
    async fn test_extracts_valid_body() {
        let parsed = extract(r#"{"name": "ada", "age": 36}"#).await.unwrap();
        assert_eq!(parsed.name, "ada");
        assert_eq!(parsed.age, 36);
    }

    #[actix_web::test]
    async fn test_shape_errors_are_validation_errors() {
        let err = extract(r#"{"name": "ada"}"#).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(err.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_syntax_errors_are_bad_requests() {
        let err = extract("{nope").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadRequest);
    }

    #[actix_web::test]
    async fn test_oversized_body_is_rejected() {
        let padding = "x".repeat(MAX_JSON_BODY_BYTES);
        let body = format!(r#"{{"name": "{padding}", "age": 1}}"#);
        let err = extract(body).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::PayloadTooLarge);
        assert_eq!(err.status(), actix_web::http::StatusCode::PAYLOAD_TOO_LARGE);
    }
}
