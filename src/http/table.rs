use super::app_error::AppError;
use super::state::HttpServerState;
use crate::auth::{authorization_token, sign_admin_token, verify_admin_token};
use crate::config;
use crate::datamodel::{Row, validate_columns};
use anyhow::anyhow;
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RowViewModel {
    pub id: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TableResponse {
    pub columns: Vec<String>,
    pub rows: Vec<RowViewModel>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthRequest {
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RowUpsert {
    /// Absent or blank ids get a freshly generated one.
    pub id: Option<String>,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRequest {
    pub columns: Option<Vec<String>>,
    pub rows: Option<Vec<RowUpsert>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateResponse {
    pub ok: bool,
}

/// Read the table
///
/// Returns the current column set and every row in creation order.
/// Anonymous, read-only.
#[utoipa::path(
    get,
    path = "/api/data",
    tag = "Table",
    responses(
        (status = 200, description = "The current table", body = TableResponse),
        (status = 500, description = "Internal Server Error", body = AppError),
    )
)]
pub async fn get_table(
    State(state): State<HttpServerState>,
) -> Result<Json<TableResponse>, AppError> {
    let snapshot = state.storage.fetch_table().await?;
    let rows = snapshot
        .rows
        .into_iter()
        .map(|row| RowViewModel {
            id: row.id,
            data: row.data,
        })
        .collect();
    Ok(Json(TableResponse {
        columns: snapshot.columns,
        rows,
    }))
}

/// Exchange the admin password for a bearer token
///
/// The token carries the single admin role and a configured time to live.
#[utoipa::path(
    post,
    path = "/api/admin-auth",
    tag = "Admin",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Signed admin token", body = AuthResponse),
        (status = 401, description = "Wrong password", body = AppError),
        (status = 500, description = "Internal Server Error", body = AppError),
    )
)]
pub async fn admin_auth(Json(payload): Json<AuthRequest>) -> Result<Json<AuthResponse>, AppError> {
    let config = config::get()?;
    if payload.password.as_deref() != Some(config.admin_password.as_str()) {
        return Err(AppError::unauthorized(crate::auth::AuthError::WrongPassword));
    }
    let token = sign_admin_token(
        &config.token_secret,
        Duration::from_secs(config.token_ttl_seconds),
    );
    Ok(Json(AuthResponse { token }))
}

/// Replace the whole table
///
/// Full replacement of columns and rows in one transaction. The bearer
/// token is verified before anything else, and the submitted column names
/// are validated before any row is touched.
#[utoipa::path(
    post,
    path = "/api/admin-update",
    tag = "Admin",
    request_body = UpdateRequest,
    responses(
        (status = 200, description = "Table replaced", body = UpdateResponse),
        (status = 400, description = "Bad Request", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 500, description = "Internal Server Error", body = AppError),
    )
)]
pub async fn admin_update(
    State(state): State<HttpServerState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateRequest>,
) -> Result<Json<UpdateResponse>, AppError> {
    let config = config::get()?;

    // Credentials first. Nothing below runs for an unauthenticated caller.
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let token = authorization_token(authorization).map_err(AppError::unauthorized)?;
    verify_admin_token(&config.token_secret, token).map_err(AppError::unauthorized)?;

    let columns = payload
        .columns
        .ok_or_else(|| AppError::bad_request(anyhow!("columns is required")))?;
    let rows = payload
        .rows
        .ok_or_else(|| AppError::bad_request(anyhow!("rows is required")))?;

    // Validation happens against the submitted names so the caller gets an
    // explicit error instead of silent stripping.
    let columns = validate_columns(&columns).map_err(AppError::bad_request)?;

    let rows: Vec<Row> = rows
        .into_iter()
        .map(|upsert| {
            let id = upsert
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let mut row = Row {
                id,
                data: upsert.data,
            };
            row.data = row.restrict_to_columns(&columns);
            row
        })
        .collect();

    state.storage.replace_table(&columns, &rows).await?;

    Ok(Json(UpdateResponse { ok: true }))
}
