//! Request extractors.

use crate::error::ApiError;
use axum::extract::FromRequest;

/// JSON request body whose rejections are reported as [`ApiError`].
///
/// Syntax errors, missing fields and wrong types all become `400` with a JSON `{"message"}`
/// body instead of axum's plain-text rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
