//! Session refresh endpoint for bearer-authenticated callers.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::types::SessionResponse;
use super::utils::extract_bearer_token;
use super::workflow::AuthWorkflow;

#[utoipa::path(
    get,
    path = "/refresh-token",
    responses(
        (status = 200, description = "Fresh session token issued", body = SessionResponse),
        (status = 401, description = "Missing or invalid session token", body = String)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn refresh_token(
    headers: HeaderMap,
    workflow: Extension<Arc<AuthWorkflow>>,
) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            "Missing session token".to_string(),
        )
            .into_response();
    };

    match workflow.refresh(&token).await {
        Ok(grant) => {
            let response = SessionResponse {
                first_name: grant.user.first_name,
                last_name: grant.user.last_name,
                session_token: grant.token,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::confirmed_workflow;
    use super::*;
    use axum::http::{header::AUTHORIZATION, HeaderValue};

    #[tokio::test]
    async fn missing_bearer_is_unauthorized() {
        let workflow = confirmed_workflow("alice@example.com", "Secretpass1").await;
        let response = refresh_token(HeaderMap::new(), Extension(workflow))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_bearer_is_unauthorized() {
        let workflow = confirmed_workflow("alice@example.com", "Secretpass1").await;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        let response = refresh_token(headers, Extension(workflow))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_bearer_gets_a_fresh_token() {
        let workflow = confirmed_workflow("alice@example.com", "Secretpass1").await;
        let grant = workflow.login("alice@example.com", "Secretpass1").await.unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", grant.token)).unwrap(),
        );
        let response = refresh_token(headers, Extension(workflow.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
