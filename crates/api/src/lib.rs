//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Actor identity middleware
//! - Extractors that reject with the error envelope
//! - The JSON error envelope

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use ledgerline_db::{
    AccountRepository, BankRepository, BudgetRepository, FiscalRepository, JournalRepository,
    VatRepository,
};
use ledgerline_shared::AppConfig;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Accepted `|debits - credits|` when posting.
    pub balance_tolerance: Decimal,
    /// Bank matching window in days.
    pub match_window_days: u32,
}

impl AppState {
    /// Builds state from a connection and the loaded configuration.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &AppConfig) -> Self {
        Self {
            db: Arc::new(db),
            balance_tolerance: config.ledger.balance_tolerance,
            match_window_days: config.reconciliation.window_days,
        }
    }

    pub(crate) fn accounts(&self) -> AccountRepository {
        AccountRepository::new((*self.db).clone()).with_tolerance(self.balance_tolerance)
    }

    pub(crate) fn fiscal(&self) -> FiscalRepository {
        FiscalRepository::new((*self.db).clone())
    }

    pub(crate) fn journal(&self) -> JournalRepository {
        JournalRepository::new((*self.db).clone()).with_tolerance(self.balance_tolerance)
    }

    pub(crate) fn budgets(&self) -> BudgetRepository {
        BudgetRepository::new((*self.db).clone())
    }

    pub(crate) fn bank(&self) -> BankRepository {
        BankRepository::new((*self.db).clone())
            .with_window_days(self.match_window_days)
            .with_tolerance(self.balance_tolerance)
    }

    pub(crate) fn vat(&self) -> VatRepository {
        VatRepository::new((*self.db).clone())
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .merge(routes::health::routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support;
