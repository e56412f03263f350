// ABOUTME: Content<T> extractor and responder backed by the application's content coders
// ABOUTME: Decodes request bodies by Content-Type and defers response encoding to the encode_content middleware
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

use super::{CodingContext, ContentEncoder, ContentEncoderExt};
use crate::application::Application;
use crate::errors::{AppError, ContentError};
use async_trait::async_trait;
use axum::extract::{FromRef, FromRequest, Request};
use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Request or response body coded with the application's content coders
///
/// As an extractor, the body is decoded with the decoder registered for the
/// request's `Content-Type`. As a response, the value is encoded by the
/// [`encode_content`](crate::middleware::encode_content) middleware with the
/// encoder negotiated from the request's `Accept` header.
///
/// ```rust,no_run
/// use mongodb_axum::bson::Document;
/// use mongodb_axum::content::Content;
///
/// async fn echo(Content(document): Content<Document>) -> Content<Document> {
///     Content(document)
/// }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Content<T>(pub T);

impl<T> Content<T> {
    /// Respond with `user_info` applied on top of the encoder's baseline context
    #[must_use]
    pub fn with_user_info(self, user_info: CodingContext) -> ContentResponse<T> {
        ContentResponse {
            value: self.0,
            status: StatusCode::OK,
            user_info,
        }
    }

    /// Respond with `status` instead of 200
    #[must_use]
    pub fn with_status(self, status: StatusCode) -> ContentResponse<T> {
        ContentResponse {
            value: self.0,
            status,
            user_info: CodingContext::new(),
        }
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for Content<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    Application: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let application = Application::from_ref(state);
        let headers = req.headers().clone();
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::invalid_input(rejection.body_text()))?;
        let value = application
            .content()
            .decode(&body, &headers, &CodingContext::new())?;
        Ok(Self(value))
    }
}

impl<T> IntoResponse for Content<T>
where
    T: Serialize + Send + Sync + 'static,
{
    fn into_response(self) -> Response {
        self.with_status(StatusCode::OK).into_response()
    }
}

/// A [`Content`] response with a status code and per-call coding context
#[derive(Debug, Clone)]
pub struct ContentResponse<T> {
    value: T,
    status: StatusCode,
    user_info: CodingContext,
}

impl<T> ContentResponse<T> {
    /// Replace the status code
    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Replace the per-call coding context
    #[must_use]
    pub fn with_user_info(mut self, user_info: CodingContext) -> Self {
        self.user_info = user_info;
        self
    }
}

impl<T> IntoResponse for ContentResponse<T>
where
    T: Serialize + Send + Sync + 'static,
{
    fn into_response(self) -> Response {
        let mut response = self.status.into_response();
        response.extensions_mut().insert(PendingContent {
            value: Arc::new(self.value),
            user_info: self.user_info,
        });
        response
    }
}

trait ErasedContent: Send + Sync {
    fn encode_into(
        &self,
        encoder: &dyn ContentEncoder,
        body: &mut BytesMut,
        headers: &mut HeaderMap,
        user_info: &CodingContext,
    ) -> Result<(), ContentError>;
}

impl<T: Serialize + Send + Sync> ErasedContent for T {
    fn encode_into(
        &self,
        encoder: &dyn ContentEncoder,
        body: &mut BytesMut,
        headers: &mut HeaderMap,
        user_info: &CodingContext,
    ) -> Result<(), ContentError> {
        encoder.encode_with_user_info(self, body, headers, user_info)
    }
}

/// Response value waiting to be encoded by the `encode_content` middleware
#[derive(Clone)]
pub(crate) struct PendingContent {
    value: Arc<dyn ErasedContent>,
    user_info: CodingContext,
}

impl PendingContent {
    pub(crate) fn encode(
        &self,
        encoder: &dyn ContentEncoder,
        body: &mut BytesMut,
        headers: &mut HeaderMap,
    ) -> Result<(), ContentError> {
        self.value.encode_into(encoder, body, headers, &self.user_info)
    }
}
