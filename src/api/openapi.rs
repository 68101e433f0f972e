//! `OpenAPI` router wiring and route registration.

use utoipa::openapi::{InfoBuilder, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::api::handlers::{auth, health};

/// Generated `OpenAPI` spec, as served and as printed by the `openapi` binary.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` spec. Routes added outside (like
/// `/`) are intentionally not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    // `routes!` reads #[utoipa::path] to bind HTTP method + path and add the route to OpenAPI.
    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::login::login))
        .routes(routes!(auth::register::register))
        .routes(routes!(auth::confirmation::confirm_email))
        .routes(routes!(auth::confirmation::resend_confirmation))
        .routes(routes!(auth::recovery::forgot_password))
        .routes(routes!(auth::recovery::reset_password))
        .routes(routes!(auth::session::refresh_token));

    let mut ingresso_tag = Tag::new("ingresso");
    ingresso_tag.description = Some("Service status and metadata".to_string());

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Login, registration, and account recovery".to_string());

    router.get_openapi_mut().tags = Some(vec![ingresso_tag, auth_tag]);

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(Some(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    OpenApiBuilder::new().info(info).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_contains_every_auth_route() {
        let spec = openapi();
        for path in [
            "/health",
            "/login",
            "/register",
            "/confirm-email",
            "/resend-confirmation/{email}",
            "/forgot-password/{email}",
            "/reset-password",
            "/refresh-token",
        ] {
            assert!(
                spec.paths.paths.contains_key(path),
                "missing path: {path}"
            );
        }
    }

    #[test]
    fn spec_uses_cargo_metadata() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
    }
}
