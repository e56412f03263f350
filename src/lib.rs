// ABOUTME: Main library entry point for the MongoDB integration for axum
// ABOUTME: Wires an application-scoped client, lane-bound request clients and extended JSON coders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

#![deny(unsafe_code)]

//! # mongodb-axum
//!
//! Connects axum's request lifecycle to the MongoDB driver.
//!
//! ## Features
//!
//! - **Application-scoped client**: configure one client at startup, read it
//!   from anywhere, close it at shutdown
//! - **Execution lanes**: requests are pinned to single-threaded runtimes and
//!   client operations complete on the request's lane
//! - **Extended JSON**: `application/json` bodies can carry `ObjectId`, dates
//!   and 64-bit integers losslessly
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::{routing::get, Router};
//! use mongodb_axum::bson::Document;
//! use mongodb_axum::content::Content;
//! use mongodb_axum::errors::AppResult;
//! use mongodb_axum::middleware::ApplicationRouterExt;
//! use mongodb_axum::mongo::MongoDbRequest;
//! use mongodb_axum::Application;
//!
//! async fn kittens(mongodb: MongoDbRequest) -> AppResult<Content<Vec<Document>>> {
//!     let kittens = mongodb
//!         .client()
//!         .database("home")
//!         .collection::<Document>("kittens")
//!         .find(Document::new())
//!         .await?;
//!     Ok(Content(kittens))
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let application = Application::with_lane_count(4)?;
//!     application.mongodb().configure("mongodb://localhost:27017", None).await?;
//!     application.content().use_extended_json();
//!
//!     let app = Router::<Application>::new()
//!         .route("/kittens", get(kittens))
//!         .with_application(application.clone());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!
//!     application.mongodb().cleanup().await;
//!     application.shutdown().await;
//!     Ok(())
//! }
//! ```

/// The application container
pub mod application;

/// Configuration loaded from the environment
pub mod config;

/// Content coders and the `Content` extractor
pub mod content;

/// Error types
pub mod errors;

/// Execution lanes
pub mod lanes;

/// Logging configuration and initialization
pub mod logging;

/// HTTP middleware
pub mod middleware;

/// MongoDB client registry and lane-bound handles
pub mod mongo;

/// Typed application storage
pub mod storage;

pub use application::Application;
pub use mongodb::bson;
pub use mongodb_axum_core::constants;
