//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: backend selection and the shared service bundle
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON response mapping
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(jwt_secret: String, services: AppServices) -> Router {
    let jwt = Arc::new(hvacdesk_auth::Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    // Protected routes: require auth + tenant context.
    let protected = routes::router().layer(
        ServiceBuilder::new()
            .layer(Extension(Arc::new(services)))
            .layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::auth_middleware,
            )),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}
