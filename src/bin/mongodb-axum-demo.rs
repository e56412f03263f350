// ABOUTME: Demo server storing kittens in MongoDB through the lane-bound request client
// ABOUTME: Shows startup configuration, extended JSON content and orderly cleanup on ctrl-c
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

//! # mongodb-axum Demo Server
//!
//! Serves a `kittens` collection in the `home` database:
//!
//! - `GET /health` pings the deployment
//! - `GET /kittens` lists every kitten
//! - `POST /kittens` stores a kitten and returns its `_id`
//! - `GET /kittens/{id}` finds one kitten by `ObjectId`

use anyhow::Result;
use axum::{
    extract::Path,
    routing::get,
    Router,
};
use clap::Parser;
use http::StatusCode;
use mongodb_axum::{
    bson::{doc, oid::ObjectId, Document},
    config::ServerConfig,
    content::{Content, ContentResponse},
    errors::{AppError, AppResult},
    logging,
    middleware::ApplicationRouterExt,
    mongo::{BoundCollection, MongoDbRequest},
    Application,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const DATABASE: &str = "home";
const COLLECTION: &str = "kittens";

#[derive(Parser)]
#[command(name = "mongodb-axum-demo")]
#[command(about = "Demo server for the MongoDB integration for axum")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override the number of execution lanes
    #[arg(long)]
    lanes: Option<usize>,

    /// Code application/json bodies as extended JSON
    #[arg(long)]
    extended_json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Kitten {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
    color: String,
}

fn kittens(mongodb: &MongoDbRequest) -> BoundCollection<Kitten> {
    mongodb
        .client()
        .database(DATABASE)
        .collection::<Kitten>(COLLECTION)
}

async fn health(mongodb: MongoDbRequest) -> AppResult<Content<Document>> {
    mongodb
        .client()
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await?;
    Ok(Content(doc! { "status": "ok" }))
}

async fn list_kittens(mongodb: MongoDbRequest) -> AppResult<Content<Vec<Kitten>>> {
    Ok(Content(kittens(&mongodb).find(doc! {}).await?))
}

async fn create_kitten(
    mongodb: MongoDbRequest,
    Content(mut kitten): Content<Kitten>,
) -> AppResult<ContentResponse<Document>> {
    kitten.id = None;
    let id = kittens(&mongodb).insert_one_returning_id(kitten).await?;
    Ok(Content(doc! { "_id": id }).with_status(StatusCode::CREATED))
}

async fn find_kitten(
    mongodb: MongoDbRequest,
    Path(id): Path<String>,
) -> AppResult<Content<Kitten>> {
    let id = ObjectId::parse_str(&id)
        .map_err(|e| AppError::invalid_input(format!("invalid kitten id `{id}`: {e}")))?;
    kittens(&mongodb)
        .find_one(doc! { "_id": id })
        .await?
        .map(Content)
        .ok_or_else(|| AppError::not_found(format!("kitten {id}")))
}

fn routes(application: Application) -> Router {
    Router::<Application>::new()
        .route("/health", get(health))
        .route("/kittens", get(list_kittens).post(create_kitten))
        .route("/kittens/:id", get(find_kitten))
        .with_application(application)
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {e}");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(lanes) = args.lanes {
        config.lane_count = lanes.max(1);
    }
    config.extended_json |= args.extended_json;

    logging::init_from_env()?;
    info!("{}", config.summary());

    let application = Application::with_lane_count(config.lane_count)?;
    application.mongodb().configure_from(&config.mongo).await?;
    if config.extended_json {
        application.content().use_extended_json();
    }

    let listener = TcpListener::bind(("0.0.0.0", config.http_port)).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    let served = axum::serve(listener, routes(application.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    application.mongodb().cleanup().await;
    application.shutdown().await;

    served?;
    Ok(())
}
