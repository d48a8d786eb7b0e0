/// Request extractors with JSON error bodies
///
/// Wrap axum's `Json`, `Path` and `Query` so that malformed bodies and
/// parameters are rejected with a 400 [`ApiError`] instead of axum's plain
/// text rejections (and instead of 422 for well-formed JSON of the wrong
/// shape).

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
