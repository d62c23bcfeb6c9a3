use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::backend::auth::issue_token;
use crate::backend::error::{ApiError, ApiResult, FieldError};
use crate::backend::AppState;
use crate::database::db::queries;

const BCRYPT_COST: u32 = 12;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn validate_register(req: &RegisterRequest) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if req.name.trim().is_empty() {
        errors.push(FieldError {
            field: "name",
            message: "Name is required",
        });
    }
    if !req.email.contains('@') {
        errors.push(FieldError {
            field: "email",
            message: "Valid email required",
        });
    }
    if req.password.chars().count() < 6 {
        errors.push(FieldError {
            field: "password",
            message: "Password must be at least 6 characters",
        });
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    validate_register(&req)?;

    if queries::find_user_by_email(&state.db, &req.email)
        .await?
        .is_some()
    {
        return Err(ApiError::BadRequest("User already exists".to_string()));
    }

    let hashed = bcrypt::hash(&req.password, BCRYPT_COST)?;
    let user = queries::create_user(&state.db, req.name.trim(), &req.email, &hashed).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": { "id": user.id, "name": user.name, "email": user.email },
            "message": "User registered successfully",
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    // Same message for unknown email and bad password.
    let user = queries::find_user_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid credentials".to_string()))?;

    if !bcrypt::verify(&req.password, &user.password)? {
        return Err(ApiError::BadRequest("Invalid credentials".to_string()));
    }

    let token = issue_token(&state.config, user.id, &user.email)?;

    Ok(Json(json!({
        "token": token,
        "user": { "id": user.id, "name": user.name, "email": user.email },
    })))
}
