use axum::http::header::{ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON body of every response: `{"result": ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultBody {
    pub result: Value,
}

/// A status code plus a `{"result": ...}` body, always sent with
/// permissive CORS headers so browser clients can read it.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub result: Value,
}

impl ApiResponse {
    pub fn ok(result: impl Into<Value>) -> Self {
        Self {
            status: StatusCode::OK,
            result: result.into(),
        }
    }

    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            result: Value::String(message.into()),
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut response = (
            self.status,
            Json(ResultBody {
                result: self.result,
            }),
        )
            .into_response();
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        response
    }
}
