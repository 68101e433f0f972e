//! Password recovery endpoints.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::types::{MessageResponse, ResetPasswordRequest};
use super::workflow::AuthWorkflow;

#[utoipa::path(
    post,
    path = "/forgot-password/{email}",
    params(
        ("email" = String, Path, description = "Address of the account to recover")
    ),
    responses(
        (status = 200, description = "Reset link sent", body = MessageResponse),
        (status = 400, description = "Undeliverable email", body = String),
        (status = 401, description = "Unknown or unconfirmed email", body = String)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    workflow: Extension<Arc<AuthWorkflow>>,
    Path(email): Path<String>,
) -> impl IntoResponse {
    match workflow.forgot_password(&email).await {
        Ok(()) => {
            let response = MessageResponse {
                title: "Reset link sent".to_string(),
                message: "Check your inbox for a password reset link".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = MessageResponse),
        (status = 400, description = "Invalid, expired, or malformed token, or policy violation", body = String),
        (status = 401, description = "Unknown or unconfirmed email", body = String)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    workflow: Extension<Arc<AuthWorkflow>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let request: ResetPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match workflow
        .reset_password(&request.email, &request.token, &request.new_password)
        .await
    {
        Ok(()) => {
            let response = MessageResponse {
                title: "Password replaced".to_string(),
                message: "You can now log in with your new password".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{confirmed_workflow_with_sender, test_workflow};
    use super::*;

    #[tokio::test]
    async fn forgot_password_for_unknown_email_is_unauthorized() {
        let (workflow, _sender) = test_workflow();
        let response =
            forgot_password(Extension(workflow), Path("nobody@example.com".to_string()))
                .await
                .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_payload_is_bad_request() {
        let (workflow, _sender) = test_workflow();
        let response = reset_password(Extension(workflow), None).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reset_flow_replaces_the_password() {
        let (workflow, sender) =
            confirmed_workflow_with_sender("alice@example.com", "Secretpass1").await;

        let response =
            forgot_password(Extension(workflow.clone()), Path("alice@example.com".to_string()))
                .await
                .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let token = sender.last_token();
        let response = reset_password(
            Extension(workflow.clone()),
            Some(Json(ResetPasswordRequest {
                email: "alice@example.com".to_string(),
                token: token.clone(),
                new_password: "Newerpass2".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        // The consumed token cannot reset again.
        let response = reset_password(
            Extension(workflow),
            Some(Json(ResetPasswordRequest {
                email: "alice@example.com".to_string(),
                token,
                new_password: "Thirdpass3".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_token_is_bad_request() {
        let (workflow, _sender) =
            confirmed_workflow_with_sender("alice@example.com", "Secretpass1").await;
        let response = reset_password(
            Extension(workflow),
            Some(Json(ResetPasswordRequest {
                email: "alice@example.com".to_string(),
                token: "not%base64url!".to_string(),
                new_password: "Newerpass2".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
