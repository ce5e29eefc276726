//! Actor identity middleware for organization routes.
//!
//! Identity is asserted by the upstream gateway through two headers:
//! `X-Actor-Id` (a UUID) and `X-Actor-Role` (`admin`, `accountant` or
//! `viewer`). Requests without a valid pair are rejected with 401.

use std::str::FromStr;

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, Method, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use ledgerline_shared::types::ActorId;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the actor's UUID.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Header carrying the actor's role.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// What an actor is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    /// Full access, including period close and lock.
    Admin,
    /// Day-to-day bookkeeping, including period close and lock.
    Accountant,
    /// Read-only.
    Viewer,
}

impl ActorRole {
    /// True for roles that may change data.
    #[must_use]
    pub const fn can_write(self) -> bool {
        matches!(self, Self::Admin | Self::Accountant)
    }
}

impl FromStr for ActorRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "accountant" => Ok(Self::Accountant),
            "viewer" => Ok(Self::Viewer),
            _ => Err(()),
        }
    }
}

/// The caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    /// Actor ID recorded on audit fields.
    pub id: ActorId,
    /// Actor role.
    pub role: ActorRole,
}

impl Actor {
    fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let id = headers
            .get(ACTOR_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| Uuid::parse_str(h.trim()).ok())
            .ok_or_else(|| ApiError::unauthorized("X-Actor-Id header with a UUID is required"))?;
        let role = headers
            .get(ACTOR_ROLE_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.parse::<ActorRole>().ok())
            .ok_or_else(|| {
                ApiError::unauthorized("X-Actor-Role header must be admin, accountant or viewer")
            })?;

        Ok(Self {
            id: ActorId::from(id),
            role,
        })
    }

    /// Fails with 403 unless the actor may change data.
    pub fn require_writer(&self) -> Result<(), ApiError> {
        if self.role.can_write() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Viewers cannot modify data"))
        }
    }
}

/// Resolves the actor and rejects writes by viewers.
///
/// The actor is stored in request extensions for the [`Actor`] extractor.
pub async fn actor_middleware(mut request: Request, next: Next) -> Response {
    let actor = match Actor::from_headers(request.headers()) {
        Ok(actor) => actor,
        Err(err) => return err.into_response(),
    };

    let is_read = matches!(*request.method(), Method::GET | Method::HEAD | Method::OPTIONS);
    if !is_read && let Err(err) = actor.require_writer() {
        return err.into_response();
    }

    request.extensions_mut().insert(actor);
    next.run(request).await
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("Actor identity required"))
    }
}
