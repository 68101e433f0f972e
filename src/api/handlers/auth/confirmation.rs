//! Email confirmation endpoints.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::types::{ConfirmEmailRequest, MessageResponse};
use super::workflow::AuthWorkflow;

#[utoipa::path(
    put,
    path = "/confirm-email",
    request_body = ConfirmEmailRequest,
    responses(
        (status = 200, description = "Email confirmed", body = MessageResponse),
        (status = 400, description = "Invalid, expired, or malformed token", body = String),
        (status = 401, description = "Unknown email", body = String)
    ),
    tag = "auth"
)]
pub async fn confirm_email(
    workflow: Extension<Arc<AuthWorkflow>>,
    payload: Option<Json<ConfirmEmailRequest>>,
) -> impl IntoResponse {
    let request: ConfirmEmailRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match workflow.confirm_email(&request.email, &request.token).await {
        Ok(()) => {
            let response = MessageResponse {
                title: "Email confirmed".to_string(),
                message: "You can now log in".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/resend-confirmation/{email}",
    params(
        ("email" = String, Path, description = "Address the original confirmation was sent to")
    ),
    responses(
        (status = 200, description = "Fresh confirmation link sent", body = MessageResponse),
        (status = 400, description = "Already confirmed or undeliverable email", body = String),
        (status = 401, description = "Unknown email", body = String)
    ),
    tag = "auth"
)]
pub async fn resend_confirmation(
    workflow: Extension<Arc<AuthWorkflow>>,
    Path(email): Path<String>,
) -> impl IntoResponse {
    match workflow.resend_confirmation(&email).await {
        Ok(()) => {
            let response = MessageResponse {
                title: "Confirmation sent".to_string(),
                message: "Check your inbox for a fresh confirmation link".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{registered_workflow, test_workflow};
    use super::*;

    #[tokio::test]
    async fn missing_payload_is_bad_request() {
        let (workflow, _sender) = test_workflow();
        let response = confirm_email(Extension(workflow), None).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_email_is_unauthorized() {
        let (workflow, _sender) = test_workflow();
        let response = confirm_email(
            Extension(workflow),
            Some(Json(ConfirmEmailRequest {
                email: "nobody@example.com".to_string(),
                token: "dG9rZW4".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn emailed_token_confirms_the_account() {
        let (workflow, sender) = registered_workflow("alice@example.com", "Secretpass1").await;
        let token = sender.last_token();

        let response = confirm_email(
            Extension(workflow.clone()),
            Some(Json(ConfirmEmailRequest {
                email: "alice@example.com".to_string(),
                token: token.clone(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        // Replay is rejected.
        let response = confirm_email(
            Extension(workflow),
            Some(Json(ConfirmEmailRequest {
                email: "alice@example.com".to_string(),
                token,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn resend_supersedes_previous_link() {
        let (workflow, sender) = registered_workflow("alice@example.com", "Secretpass1").await;
        let first = sender.last_token();

        let response =
            resend_confirmation(Extension(workflow.clone()), Path("alice@example.com".to_string()))
                .await
                .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let response = confirm_email(
            Extension(workflow),
            Some(Json(ConfirmEmailRequest {
                email: "alice@example.com".to_string(),
                token: first,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
