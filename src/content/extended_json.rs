// ABOUTME: Extended JSON content coder that preserves BSON types across JSON bodies
// ABOUTME: Emits relaxed or canonical extended JSON and parses either form back into BSON values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

//! Extended JSON keeps BSON-specific types such as `ObjectId`, 64-bit
//! integers, dates and binary data intact by wrapping them in `$`-prefixed
//! objects (`{"$oid": "..."}`).
//!
//! Standard relaxed output writes every integer as a bare number, so an
//! `Int64` small enough for 32 bits would read back as `Int32`. The relaxed
//! format here keeps `Int64` tagged as `{"$numberLong": "..."}`, which makes
//! both formats decode back to an equal value.

use super::{set_json_content_type, CodingContext, ContentDecoder, ContentEncoder};
use crate::errors::ContentError;
use bytes::BytesMut;
use http::HeaderMap;
use mongodb::bson::Bson;
use serde_json::json;

/// Extended JSON output mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtendedJsonFormat {
    /// Native JSON numbers and ISO-8601 dates where lossless
    #[default]
    Relaxed,
    /// Every BSON type wrapped explicitly (`{"$numberInt": "1"}`)
    Canonical,
}

/// Encodes content as extended JSON
#[derive(Debug, Clone, Default)]
pub struct ExtendedJsonEncoder {
    format: ExtendedJsonFormat,
    user_info: CodingContext,
}

impl ExtendedJsonEncoder {
    /// Relaxed-format encoder with an empty baseline context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the output format
    #[must_use]
    pub const fn with_format(mut self, format: ExtendedJsonFormat) -> Self {
        self.format = format;
        self
    }

    /// Replace the baseline coding context
    #[must_use]
    pub fn with_user_info(mut self, user_info: CodingContext) -> Self {
        self.user_info = user_info;
        self
    }

    /// Output format
    #[must_use]
    pub const fn format(&self) -> ExtendedJsonFormat {
        self.format
    }
}

impl ContentEncoder for ExtendedJsonEncoder {
    fn user_info(&self) -> &CodingContext {
        &self.user_info
    }

    fn encode_bson(
        &self,
        value: Bson,
        body: &mut BytesMut,
        headers: &mut HeaderMap,
    ) -> Result<(), ContentError> {
        let json = match self.format {
            ExtendedJsonFormat::Relaxed => relaxed_extjson(value),
            ExtendedJsonFormat::Canonical => value.into_canonical_extjson(),
        };
        body.extend_from_slice(&serde_json::to_vec(&json)?);
        set_json_content_type(headers);
        Ok(())
    }
}

/// Relaxed extended JSON with every `Int64` left tagged
fn relaxed_extjson(value: Bson) -> serde_json::Value {
    match value {
        Bson::Int64(number) => json!({ "$numberLong": number.to_string() }),
        Bson::Document(document) => serde_json::Value::Object(
            document
                .into_iter()
                .map(|(key, value)| (key, relaxed_extjson(value)))
                .collect(),
        ),
        Bson::Array(values) => {
            serde_json::Value::Array(values.into_iter().map(relaxed_extjson).collect())
        }
        other => other.into_relaxed_extjson(),
    }
}

/// Decodes extended JSON content in either format
#[derive(Debug, Clone, Default)]
pub struct ExtendedJsonDecoder {
    user_info: CodingContext,
}

impl ExtendedJsonDecoder {
    /// Decoder with an empty baseline context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the baseline coding context
    #[must_use]
    pub fn with_user_info(mut self, user_info: CodingContext) -> Self {
        self.user_info = user_info;
        self
    }
}

impl ContentDecoder for ExtendedJsonDecoder {
    fn user_info(&self) -> &CodingContext {
        &self.user_info
    }

    fn decode_bson(&self, body: &[u8], _headers: &HeaderMap) -> Result<Bson, ContentError> {
        let json: serde_json::Value = serde_json::from_slice(body)?;
        Ok(Bson::try_from(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentDecoderExt, ContentEncoderExt};
    use mongodb::bson::{doc, Document};

    #[test]
    fn test_relaxed_round_trip_keeps_integer_widths() {
        let document = doc! { "small": 5_i64, "large": 5_000_000_000_i64, "plain": 5 };
        let encoder = ExtendedJsonEncoder::new();
        let mut body = BytesMut::new();
        let mut headers = HeaderMap::new();
        encoder.encode(&document, &mut body, &mut headers).unwrap();

        let decoded: Document = ExtendedJsonDecoder::new().decode(&body, &headers).unwrap();
        assert_eq!(decoded.get("small"), Some(&Bson::Int64(5)));
        assert_eq!(decoded.get("large"), Some(&Bson::Int64(5_000_000_000)));
        assert_eq!(decoded.get("plain"), Some(&Bson::Int32(5)));
    }
}
