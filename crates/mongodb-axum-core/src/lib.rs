// ABOUTME: Core error types and constants shared by the mongodb-axum workspace
// ABOUTME: Foundation crate with the unified AppError, error codes, and configuration defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

#![deny(unsafe_code)]

//! # mongodb-axum core
//!
//! Foundation crate providing the types that change least often in the
//! workspace, so the adapter crate can recompile without touching them.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode` and the JSON error body
//! - **constants**: Library metadata, environment variable names and defaults

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Library metadata, environment variable names and configuration defaults
pub mod constants;
