//! Registration endpoint.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use super::types::{MessageResponse, RegisterRequest};
use super::workflow::AuthWorkflow;

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registration successful", body = MessageResponse),
        (status = 400, description = "Duplicate email, validation failure, or undeliverable confirmation email", body = String)
    ),
    tag = "auth"
)]
pub async fn register(
    workflow: Extension<Arc<AuthWorkflow>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match workflow
        .register(
            &request.first_name,
            &request.last_name,
            &request.email,
            &request.password,
        )
        .await
    {
        Ok(()) => {
            let response = MessageResponse {
                title: "Registration successful".to_string(),
                message: "Check your inbox for a confirmation link".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
