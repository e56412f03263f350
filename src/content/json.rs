// ABOUTME: Plain JSON content coder, the default for application/json
// ABOUTME: Writes BSON values as ordinary JSON and reads JSON bodies back into BSON values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

use super::{set_json_content_type, CodingContext, ContentDecoder, ContentEncoder};
use crate::errors::ContentError;
use bytes::BytesMut;
use http::HeaderMap;
use mongodb::bson::Bson;

/// Encodes content as plain JSON
#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    pretty: bool,
    user_info: CodingContext,
}

impl JsonEncoder {
    /// Compact JSON encoder with an empty baseline context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indent output
    #[must_use]
    pub const fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Replace the baseline coding context
    #[must_use]
    pub fn with_user_info(mut self, user_info: CodingContext) -> Self {
        self.user_info = user_info;
        self
    }
}

impl ContentEncoder for JsonEncoder {
    fn user_info(&self) -> &CodingContext {
        &self.user_info
    }

    fn encode_bson(
        &self,
        value: Bson,
        body: &mut BytesMut,
        headers: &mut HeaderMap,
    ) -> Result<(), ContentError> {
        let json = if self.pretty {
            serde_json::to_vec_pretty(&value)?
        } else {
            serde_json::to_vec(&value)?
        };
        body.extend_from_slice(&json);
        set_json_content_type(headers);
        Ok(())
    }
}

/// Decodes plain JSON content
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    user_info: CodingContext,
}

impl JsonDecoder {
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

impl ContentDecoder for JsonDecoder {
    fn user_info(&self) -> &CodingContext {
        &self.user_info
    }

    fn decode_bson(&self, body: &[u8], _headers: &HeaderMap) -> Result<Bson, ContentError> {
        Ok(serde_json::from_slice(body)?)
    }
}
