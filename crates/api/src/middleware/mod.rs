//! Request middleware.

pub mod actor;

pub use actor::{Actor, ActorRole, actor_middleware};
