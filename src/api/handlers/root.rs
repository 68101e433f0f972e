//! Root route.

use axum::response::IntoResponse;

pub async fn root() -> impl IntoResponse {
    env!("CARGO_PKG_NAME")
}
