//! API route definitions.

use axum::{Router, middleware};
use serde::{Deserialize, Deserializer};

use crate::{AppState, middleware::actor_middleware};

pub mod accounts;
pub mod bank;
pub mod budgets;
pub mod fiscal;
pub mod health;
pub mod journal;
pub mod vat;


/// Creates the API router: health plus every organization route behind the
/// actor middleware.
pub fn api_routes() -> Router<AppState> {
    let organization_routes = Router::new()
        .merge(accounts::routes())
        .merge(fiscal::routes())
        .merge(journal::routes())
        .merge(budgets::routes())
        .merge(bank::routes())
        .merge(vat::routes())
        .layer(middleware::from_fn(actor_middleware));

    Router::new()
        .merge(health::routes())
        .merge(organization_routes)
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
