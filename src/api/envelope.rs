//! Consistent response envelope for all API endpoints.
//!
//! Every JSON response is wrapped in either [`ApiResponse`] (success) or
//! [`ApiErrorResponse`] (error), ensuring a uniform shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;

/// Metadata included in every response.
#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
    pub version: &'static str,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: "1",
        }
    }
}

/// Successful response: `{ "data": T, "meta": { ... } }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Response {
        let body = Self {
            data,
            meta: ResponseMeta::default(),
        };
        (StatusCode::OK, axum::Json(body)).into_response()
    }
}

/// Error payload: `{ "error": { "code": ..., "message": ... }, "meta": ... }`
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    /// Stable machine-readable error code (kebab-case)
    pub code: &'static str,
    pub message: String,
}

impl ApiErrorResponse {
    fn build(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
        let body = Self {
            error: ApiErrorBody {
                code,
                message: message.into(),
            },
            meta: ResponseMeta::default(),
        };
        (status, axum::Json(body)).into_response()
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Response {
        Self::build(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Response {
        Self::build(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Response {
        Self::build(StatusCode::CONFLICT, code, message)
    }

    pub fn unprocessable(code: &'static str, message: impl Into<String>) -> Response {
        Self::build(StatusCode::UNPROCESSABLE_ENTITY, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Response {
        Self::build(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn body_json(response: Response) -> Value {
        let bytes = tokio_test::block_on(axum::body::to_bytes(response.into_body(), usize::MAX))
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn ok_wraps_data_with_meta() {
        let response = ApiResponse::ok(json!({ "page": 1 }));
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response);
        assert_eq!(body["data"]["page"], 1);
        assert_eq!(body["meta"]["version"], "1");
        assert!(body["meta"]["timestamp"].is_string());
    }

    #[test]
    fn error_helpers_carry_status_and_code() {
        let response = ApiErrorResponse::conflict("no-project-selected", "no project selected");
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response);
        assert_eq!(body["error"]["code"], "no-project-selected");
        assert_eq!(body["error"]["message"], "no project selected");
        assert!(body.get("data").is_none());

        let response = ApiErrorResponse::bad_request("unknown-slot", "unknown image slot");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = ApiErrorResponse::not_found("no-frame", "no frames captured yet");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = ApiErrorResponse::unprocessable("catalog-empty", "no header row");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let response = ApiErrorResponse::internal("catalog-io", "read failed");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
