//! In-process router over an in-memory database.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use ledgerline_db::migration::Migrator;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{AppState, create_router};

/// Router backed by a fresh SQLite database with the schema applied.
pub(crate) async fn test_app() -> Router {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.expect("connect sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    create_router(AppState {
        db: Arc::new(db),
        balance_tolerance: Decimal::new(1, 2),
        match_window_days: 2,
    })
}

/// Request headers identifying the caller.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Caller {
    pub id: Uuid,
    pub role: &'static str,
}

impl Caller {
    pub(crate) fn accountant() -> Self {
        Self {
            id: Uuid::now_v7(),
            role: "accountant",
        }
    }

    pub(crate) fn viewer() -> Self {
        Self {
            id: Uuid::now_v7(),
            role: "viewer",
        }
    }
}

/// Sends one request and returns the status with the parsed JSON body
/// (`Value::Null` when the body is empty).
pub(crate) async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    caller: Option<Caller>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder
            .header("x-actor-id", caller.id.to_string())
            .header("x-actor-role", caller.role);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
