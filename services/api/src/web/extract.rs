//! services/api/src/web/extract.rs
//!
//! Request extractors whose rejections render through `ApiError`.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json` with rejections (bad syntax, wrong field types, missing
/// `Content-Type`) reported as a 400 `{error}` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
