//! `hvacdesk-auth`: authentication boundary.
//!
//! Resolves "who is calling, on behalf of which tenant" into an explicit
//! [`RequestContext`]. Nothing downstream looks up the session implicitly.
//! This crate is decoupled from HTTP and storage.

pub mod authenticator;
pub mod claims;
pub mod context;
pub mod jwt;
pub mod principal;

pub use authenticator::{Authenticator, StaticAuthenticator};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use context::{AuthError, RequestContext};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use principal::SessionUser;
