use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Pagination block attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_pages: i64,
    pub total_row: i64,
}

/// `{"success": true, "<key>": <value>}`
pub fn ok<T: Serialize>(key: &str, value: T) -> HttpResponse {
    envelope(StatusCode::OK, key, value, None)
}

pub fn created<T: Serialize>(key: &str, value: T) -> HttpResponse {
    envelope(StatusCode::CREATED, key, value, None)
}

pub fn ok_paged<T: Serialize>(key: &str, value: T, pagination: Pagination) -> HttpResponse {
    envelope(StatusCode::OK, key, value, Some(pagination))
}

/// Success envelope carrying two payload keys, e.g. `user` plus `token`.
pub fn ok_with<T: Serialize, U: Serialize>(
    key: &str,
    value: T,
    extra_key: &str,
    extra: U,
) -> HttpResponse {
    let (value, extra) = match (serde_json::to_value(value), serde_json::to_value(extra)) {
        (Ok(value), Ok(extra)) => (value, extra),
        _ => return internal(),
    };
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    body.insert(key.to_string(), value);
    body.insert(extra_key.to_string(), extra);
    HttpResponse::Ok().json(Value::Object(body))
}

/// `{"success": true, "message": <message>}` for mutations with no payload.
pub fn done(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "message": message }))
}

pub fn fail(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "success": false, "message": message }))
}

pub fn bad_request(message: &str) -> HttpResponse {
    fail(StatusCode::BAD_REQUEST, message)
}

pub fn not_found(message: &str) -> HttpResponse {
    fail(StatusCode::NOT_FOUND, message)
}

pub fn conflict(message: &str) -> HttpResponse {
    fail(StatusCode::CONFLICT, message)
}

pub fn internal() -> HttpResponse {
    fail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

fn envelope<T: Serialize>(
    status: StatusCode,
    key: &str,
    value: T,
    pagination: Option<Pagination>,
) -> HttpResponse {
    let value = match serde_json::to_value(value) {
        Ok(value) => value,
        Err(err) => {
            log::error!("Response serialization error: {err}");
            return internal();
        }
    };

    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    body.insert(key.to_string(), value);
    if let Some(pagination) = pagination {
        body.insert("pagination".to_string(), json!(pagination));
    }
    HttpResponse::build(status).json(Value::Object(body))
}
