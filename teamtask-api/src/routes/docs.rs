/// OpenAPI document
///
/// `GET /openapi.json` serves the OpenAPI 3.0 description of the HTTP API,
/// embedded at compile time.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

/// The embedded document
pub const OPENAPI_DOCUMENT: &str = include_str!("../openapi.json");

pub async fn openapi_json() -> Response {
    (
        [(header::CONTENT_TYPE, "application/json")],
        OPENAPI_DOCUMENT,
    )
        .into_response()
}
