// ABOUTME: Middleware that encodes Content<T> responses with the negotiated content encoder
// ABOUTME: Selects the encoder from the request's Accept header, defaulting to application/json
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

use crate::application::Application;
use crate::content::PendingContent;
use crate::errors::AppError;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::BytesMut;
use http::header::ACCEPT;
use http::HeaderMap;
use tracing::warn;

/// Encode `Content` responses produced by the inner service
///
/// Responses that are not `Content` pass through untouched.
pub async fn encode_content(
    State(application): State<Application>,
    req: Request,
    next: Next,
) -> Response {
    let accept = req
        .headers()
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);

    let mut response = next.run(req).await;
    let Some(pending) = response.extensions_mut().remove::<PendingContent>() else {
        return response;
    };

    let encoder = match application.content().negotiate_encoder(accept.as_deref()) {
        Ok(encoder) => encoder,
        Err(error) => {
            warn!("no acceptable content encoder: {error}");
            return AppError::from(error).into_response();
        }
    };

    let mut body = BytesMut::new();
    let mut headers = HeaderMap::new();
    if let Err(error) = pending.encode(encoder.as_ref(), &mut body, &mut headers) {
        return AppError::from(error).into_response();
    }

    let (mut parts, _) = response.into_parts();
    parts.headers.extend(headers);
    Response::from_parts(parts, Body::from(body.freeze()))
}
