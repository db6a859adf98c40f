//! `hvacdesk-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod version;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{EntityId, TenantId, UserId};
pub use version::ExpectedVersion;
