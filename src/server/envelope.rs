//! JSON response envelopes: `{ "status", "msg", "data" }`.

use crate::error::TailError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    pub msg: String,
    pub data: T,
}

fn respond<T: Serialize>(code: StatusCode, status: &'static str, msg: String, data: T) -> Response {
    (code, Json(Envelope { status, msg, data })).into_response()
}

pub fn success<T: Serialize>(msg: impl Into<String>, data: T) -> Response {
    respond(StatusCode::OK, "SUCCESS", msg.into(), data)
}

pub fn invalid<T: Serialize>(msg: impl Into<String>, data: T) -> Response {
    respond(StatusCode::BAD_REQUEST, "INVALID", msg.into(), data)
}

pub fn denied<T: Serialize>(msg: impl Into<String>, data: T) -> Response {
    respond(StatusCode::FORBIDDEN, "DENIED", msg.into(), data)
}

pub fn error<T: Serialize>(msg: impl Into<String>, data: T) -> Response {
    respond(StatusCode::INTERNAL_SERVER_ERROR, "ERROR", msg.into(), data)
}

impl IntoResponse for TailError {
    fn into_response(self) -> Response {
        match self {
            TailError::Validation { message } => invalid(message, Value::Null),
            TailError::AccessDenied { ref path } => {
                let data = path.display().to_string();
                denied(self.to_string(), data)
            }
            other => error(other.to_string(), Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_status_codes() {
        assert_eq!(success("ok", 1).status(), StatusCode::OK);
        assert_eq!(invalid("bad", Value::Null).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            TailError::access_denied(PathBuf::from("/etc/passwd"))
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            TailError::Cancelled.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_envelope_shape() {
        let envelope = Envelope {
            status: "SUCCESS",
            msg: "list_logs".to_string(),
            data: vec!["/var/log/syslog"],
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "SUCCESS",
                "msg": "list_logs",
                "data": ["/var/log/syslog"],
            })
        );
    }
}
