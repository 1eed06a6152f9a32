//! User, role and admin routes
//!
//! - GET    /users              - list users (authenticated)
//! - GET    /user/:email        - fetch one user by email
//! - PUT    /save-user          - idempotent registration
//! - PATCH  /save-as-a-donator  - self-service donator toggle
//! - PUT    /update-role/:id    - role overwrite (admin-gated only when
//!                                `--guard-role-updates` is set)
//! - DELETE /users/:id          - admin removal of a user
//! - GET    /admin-state        - admin aggregation
//!
//! Errors use the success shape.

use bson::oid::ObjectId;
use bytes::Bytes;
use hyper::{HeaderMap, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::response::{
    decode_segment, denial_response, json_response, parse_json, success_shape, FullBody,
};
use crate::auth::{AccessLevel, Role};
use crate::db::schemas::UserView;
use crate::server::AppState;
use crate::services::{
    compute_admin_stats, register_or_fetch, set_role, toggle_donator_role, NewUser, Registration,
};
use crate::types::{AppError, Result};

#[derive(Debug, Default, Deserialize)]
struct EmailBody {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RoleBody {
    #[serde(default)]
    role: Option<String>,
}

fn respond(result: Result<Response<FullBody>>) -> Response<FullBody> {
    result.unwrap_or_else(|e| success_shape(&e))
}

/// Handle GET /users
pub async fn list(state: &AppState, headers: &HeaderMap) -> Response<FullBody> {
    if let Err(denial) = state.gate.authorize(headers, AccessLevel::Authenticated).await {
        return denial_response(&denial);
    }
    respond(list_inner(state).await)
}

async fn list_inner(state: &AppState) -> Result<Response<FullBody>> {
    let users: Vec<UserView> = state
        .stores
        .users
        .list()
        .await?
        .iter()
        .map(|u| u.view())
        .collect();
    Ok(json_response(StatusCode::OK, &users))
}

/// Handle GET /user/:email
pub async fn by_email(state: &AppState, raw_email: &str) -> Response<FullBody> {
    respond(by_email_inner(state, raw_email).await)
}

async fn by_email_inner(state: &AppState, raw_email: &str) -> Result<Response<FullBody>> {
    let email = decode_segment(raw_email)?;
    let user = state
        .stores
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(json_response(StatusCode::OK, &user.view()))
}

/// Handle PUT /save-user
pub async fn save_user(state: &AppState, body: &Bytes) -> Response<FullBody> {
    respond(save_user_inner(state, body).await)
}

async fn save_user_inner(state: &AppState, body: &Bytes) -> Result<Response<FullBody>> {
    let input: NewUser = parse_json(body)?;
    let body = match register_or_fetch(state.stores.users.as_ref(), input, Role::User).await? {
        Registration::Created { id, .. } => json!({
            "acknowledged": true,
            "insertedId": id.to_hex(),
        }),
        Registration::Existing(_) => json!({
            "message": "user already exists",
            "insertedId": null,
        }),
    };
    Ok(json_response(StatusCode::OK, &body))
}

/// Handle PATCH /save-as-a-donator
pub async fn toggle_donator(state: &AppState, body: &Bytes) -> Response<FullBody> {
    respond(toggle_donator_inner(state, body).await)
}

async fn toggle_donator_inner(state: &AppState, body: &Bytes) -> Result<Response<FullBody>> {
    let input: EmailBody = parse_json(body)?;
    let change = toggle_donator_role(state.stores.users.as_ref(), input.email.as_deref()).await?;
    Ok(json_response(
        StatusCode::OK,
        &json!({
            "success": true,
            "email": change.email,
            "role": change.role.as_str(),
            "previousRole": change.previous,
        }),
    ))
}

/// Handle PUT /update-role/:id
pub async fn update_role(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
    body: &Bytes,
) -> Response<FullBody> {
    let guarded = state.args.guard_role_updates;
    if guarded {
        if let Err(denial) = state.gate.authorize(headers, AccessLevel::Admin).await {
            return denial_response(&denial);
        }
    }
    respond(update_role_inner(state, raw_id, body, guarded).await)
}

async fn update_role_inner(
    state: &AppState,
    raw_id: &str,
    body: &Bytes,
    canonical_only: bool,
) -> Result<Response<FullBody>> {
    let input: RoleBody = parse_json(body)?;
    set_role(
        state.stores.users.as_ref(),
        raw_id,
        input.role.as_deref(),
        canonical_only,
    )
    .await?;
    Ok(json_response(
        StatusCode::OK,
        &json!({ "success": true, "role": input.role }),
    ))
}

/// Handle DELETE /users/:id
pub async fn delete_user(state: &AppState, headers: &HeaderMap, raw_id: &str) -> Response<FullBody> {
    let admission = match state.gate.authorize(headers, AccessLevel::Admin).await {
        Ok(admission) => admission,
        Err(denial) => return denial_response(&denial),
    };
    let admin = admission.claim.map(|c| c.email).unwrap_or_default();
    respond(delete_user_inner(state, raw_id, &admin).await)
}

async fn delete_user_inner(state: &AppState, raw_id: &str, admin: &str) -> Result<Response<FullBody>> {
    let id = ObjectId::parse_str(raw_id)?;
    if !state.stores.users.delete(id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    info!("User {} removed by {}", id, admin);
    Ok(json_response(
        StatusCode::OK,
        &json!({ "success": true, "deletedCount": 1 }),
    ))
}

/// Handle GET /admin-state
pub async fn admin_state(state: &AppState, headers: &HeaderMap) -> Response<FullBody> {
    if let Err(denial) = state.gate.authorize(headers, AccessLevel::Admin).await {
        return denial_response(&denial);
    }
    respond(
        compute_admin_stats(&state.stores)
            .await
            .map(|stats| json_response(StatusCode::OK, &stats)),
    )
}
