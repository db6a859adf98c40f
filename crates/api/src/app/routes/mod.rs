use axum::{Router, routing::get};

pub mod dashboard;
pub mod items;
pub mod quotes;
pub mod system;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/dashboard", get(dashboard::summary))
        .nest("/items", items::router())
        .nest("/quotes", quotes::router())
}
