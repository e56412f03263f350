// ABOUTME: Content coding pipeline: encoder/decoder traits, per-media-type registry and helpers
// ABOUTME: Routes request and response bodies through the coder registered for their media type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

//! # Content Coding
//!
//! Bodies are coded in two steps. The value is first turned into a BSON value
//! with its `Serialize` impl (or read back with `Deserialize`) while the
//! effective [`CodingContext`] is installed; a [`ContentEncoder`] or
//! [`ContentDecoder`] then maps that BSON value to and from bytes.
//!
//! The effective context is the coder's baseline with the per-call context
//! applied on top. Passing an empty per-call context uses the baseline as is.
//!
//! [`ContentConfiguration`] maps media types to coders. Plain JSON serves
//! `application/json` until [`ContentConfiguration::use_extended_json`]
//! switches it to extended JSON.

mod context;
mod extended_json;
mod extract;
mod json;

pub use context::CodingContext;
pub use extended_json::{ExtendedJsonDecoder, ExtendedJsonEncoder, ExtendedJsonFormat};
pub use extract::{Content, ContentResponse};
pub(crate) use extract::PendingContent;
pub use json::{JsonDecoder, JsonEncoder};

use crate::errors::ContentError;
use bytes::BytesMut;
use dashmap::DashMap;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::HeaderMap;
use mongodb::bson::{self, Bson};
use mongodb_axum_core::constants::media_types::APPLICATION_JSON;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Writes BSON values into response bodies
pub trait ContentEncoder: Send + Sync + 'static {
    /// Baseline coding context for every call
    fn user_info(&self) -> &CodingContext;

    /// Append `value` to `body` and set the matching headers
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written in this format
    fn encode_bson(
        &self,
        value: Bson,
        body: &mut BytesMut,
        headers: &mut HeaderMap,
    ) -> Result<(), ContentError>;
}

/// Reads BSON values from request bodies
pub trait ContentDecoder: Send + Sync + 'static {
    /// Baseline coding context for every call
    fn user_info(&self) -> &CodingContext;

    /// Parse `body`
    ///
    /// # Errors
    ///
    /// Returns an error if the body is malformed for this format
    fn decode_bson(&self, body: &[u8], headers: &HeaderMap) -> Result<Bson, ContentError>;
}

/// Typed encoding on top of [`ContentEncoder`]
pub trait ContentEncoderExt: ContentEncoder {
    /// Encode `value` with the baseline context
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or encoding fails
    fn encode<T: Serialize + ?Sized>(
        &self,
        value: &T,
        body: &mut BytesMut,
        headers: &mut HeaderMap,
    ) -> Result<(), ContentError> {
        self.encode_with_user_info(value, body, headers, &CodingContext::new())
    }

    /// Encode `value` with `user_info` applied on top of the baseline context
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or encoding fails
    fn encode_with_user_info<T: Serialize + ?Sized>(
        &self,
        value: &T,
        body: &mut BytesMut,
        headers: &mut HeaderMap,
        user_info: &CodingContext,
    ) -> Result<(), ContentError> {
        let bson = self
            .user_info()
            .merged(user_info)
            .scope(|| bson::to_bson(value))?;
        self.encode_bson(bson, body, headers)
    }
}

impl<E: ContentEncoder + ?Sized> ContentEncoderExt for E {}

/// Typed decoding on top of [`ContentDecoder`]
pub trait ContentDecoderExt: ContentDecoder {
    /// Decode a `T` with the baseline context
    ///
    /// # Errors
    ///
    /// Returns an error if the body is malformed or does not match `T`
    fn decode<T: DeserializeOwned>(&self, body: &[u8], headers: &HeaderMap) -> Result<T, ContentError> {
        self.decode_with_user_info(body, headers, &CodingContext::new())
    }

    /// Decode a `T` with `user_info` applied on top of the baseline context
    ///
    /// # Errors
    ///
    /// Returns an error if the body is malformed or does not match `T`
    fn decode_with_user_info<T: DeserializeOwned>(
        &self,
        body: &[u8],
        headers: &HeaderMap,
        user_info: &CodingContext,
    ) -> Result<T, ContentError> {
        let bson = self.decode_bson(body, headers)?;
        Ok(self
            .user_info()
            .merged(user_info)
            .scope(|| bson::from_bson(bson))?)
    }
}

impl<D: ContentDecoder + ?Sized> ContentDecoderExt for D {}

pub(crate) fn set_json_content_type(headers: &mut HeaderMap) {
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
}

/// Media type without parameters, lowercased (`Application/JSON; charset=utf-8` -> `application/json`)
#[must_use]
pub fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

struct ContentCoders {
    encoders: DashMap<String, Arc<dyn ContentEncoder>>,
    decoders: DashMap<String, Arc<dyn ContentDecoder>>,
}

/// Registry of content coders keyed by media type
///
/// Clones share the same registry, so a change made through one clone is seen
/// by every request handled afterwards.
#[derive(Clone)]
pub struct ContentConfiguration {
    coders: Arc<ContentCoders>,
}

impl Default for ContentConfiguration {
    fn default() -> Self {
        let configuration = Self::empty();
        configuration.use_encoder(JsonEncoder::new(), APPLICATION_JSON);
        configuration.use_decoder(JsonDecoder::new(), APPLICATION_JSON);
        configuration
    }
}

impl ContentConfiguration {
    /// Registry with plain JSON for `application/json`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry without any coders
    #[must_use]
    pub fn empty() -> Self {
        Self {
            coders: Arc::new(ContentCoders {
                encoders: DashMap::new(),
                decoders: DashMap::new(),
            }),
        }
    }

    /// Use `encoder` for responses of `media_type`
    pub fn use_encoder(&self, encoder: impl ContentEncoder, media_type: &str) {
        self.coders
            .encoders
            .insert(essence(media_type), Arc::new(encoder));
    }

    /// Use `decoder` for requests of `media_type`
    pub fn use_decoder(&self, decoder: impl ContentDecoder, media_type: &str) {
        self.coders
            .decoders
            .insert(essence(media_type), Arc::new(decoder));
    }

    /// Code `application/json` bodies as relaxed extended JSON
    pub fn use_extended_json(&self) {
        self.use_encoder(ExtendedJsonEncoder::new(), APPLICATION_JSON);
        self.use_decoder(ExtendedJsonDecoder::new(), APPLICATION_JSON);
        info!("using extended JSON for {APPLICATION_JSON}");
    }

    /// Encoder registered for `media_type`
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::UnsupportedMediaType`] if none is registered
    pub fn encoder(&self, media_type: &str) -> Result<Arc<dyn ContentEncoder>, ContentError> {
        let media_type = essence(media_type);
        self.coders
            .encoders
            .get(&media_type)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ContentError::UnsupportedMediaType(media_type))
    }

    /// Decoder registered for `media_type`
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::UnsupportedMediaType`] if none is registered
    pub fn decoder(&self, media_type: &str) -> Result<Arc<dyn ContentDecoder>, ContentError> {
        let media_type = essence(media_type);
        self.coders
            .decoders
            .get(&media_type)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ContentError::UnsupportedMediaType(media_type))
    }

    /// Encoder for a response given the request's `Accept` header
    ///
    /// Picks the first listed media type with a registered encoder. A missing
    /// header, or a wildcard reached before any registered type, selects
    /// `application/json`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::UnsupportedMediaType`] if nothing acceptable is registered
    pub fn negotiate_encoder(
        &self,
        accept: Option<&str>,
    ) -> Result<Arc<dyn ContentEncoder>, ContentError> {
        let Some(accept) = accept else {
            return self.encoder(APPLICATION_JSON);
        };
        for candidate in accept.split(',').map(essence) {
            if candidate == "*/*" || candidate == "application/*" {
                return self.encoder(APPLICATION_JSON);
            }
            if let Ok(encoder) = self.encoder(&candidate) {
                return Ok(encoder);
            }
        }
        Err(ContentError::UnsupportedMediaType(essence(accept)))
    }

    /// Decode a request body using the decoder for its `Content-Type`
    ///
    /// # Errors
    ///
    /// Returns an error if the content type is missing or unregistered, or the
    /// body does not decode into `T`
    pub fn decode<T: DeserializeOwned>(
        &self,
        body: &[u8],
        headers: &HeaderMap,
        user_info: &CodingContext,
    ) -> Result<T, ContentError> {
        let media_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ContentError::UnsupportedMediaType("(none)".to_owned()))?;
        self.decoder(media_type)?
            .decode_with_user_info(body, headers, user_info)
    }

    /// Encode `value` with the encoder registered for `media_type`
    ///
    /// # Errors
    ///
    /// Returns an error if no encoder is registered or encoding fails
    pub fn encode<T: Serialize + ?Sized>(
        &self,
        value: &T,
        media_type: &str,
        user_info: &CodingContext,
    ) -> Result<(BytesMut, HeaderMap), ContentError> {
        let mut body = BytesMut::new();
        let mut headers = HeaderMap::new();
        self.encoder(media_type)?
            .encode_with_user_info(value, &mut body, &mut headers, user_info)?;
        Ok((body, headers))
    }
}

impl fmt::Debug for ContentConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut encoders: Vec<String> = self
            .coders
            .encoders
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        encoders.sort();
        let mut decoders: Vec<String> = self
            .coders
            .decoders
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        decoders.sort();
        f.debug_struct("ContentConfiguration")
            .field("encoders", &encoders)
            .field("decoders", &decoders)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_essence_strips_parameters() {
        assert_eq!(essence("Application/JSON; charset=utf-8"), "application/json");
        assert_eq!(essence(" text/plain "), "text/plain");
    }

    #[test]
    fn test_default_registry_serves_json_only() {
        let content = ContentConfiguration::new();
        assert!(content.encoder("application/json").is_ok());
        assert!(content.decoder("application/json; charset=utf-8").is_ok());
        assert!(matches!(
            content.decoder("text/csv"),
            Err(ContentError::UnsupportedMediaType(media_type)) if media_type == "text/csv"
        ));
    }

    #[test]
    fn test_negotiation_falls_back_to_json() {
        let content = ContentConfiguration::new();
        assert!(content.negotiate_encoder(None).is_ok());
        assert!(content.negotiate_encoder(Some("text/html, */*;q=0.8")).is_ok());
        assert!(content.negotiate_encoder(Some("text/html")).is_err());
    }

    #[test]
    fn test_missing_content_type_is_unsupported() {
        let content = ContentConfiguration::new();
        let result = content.decode::<Bson>(b"{}", &HeaderMap::new(), &CodingContext::new());
        assert!(matches!(result, Err(ContentError::UnsupportedMediaType(_))));
    }
}
