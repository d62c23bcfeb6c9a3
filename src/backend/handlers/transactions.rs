use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::backend::auth::AuthUser;
use crate::backend::error::{ApiError, ApiResult, FieldError};
use crate::backend::AppState;
use crate::database::db::queries;
use crate::database::models::{Transaction, TxKind};

pub const MAX_DESCRIPTION_LEN: usize = 255;

#[derive(Debug, Deserialize)]
pub struct TransactionPayload {
    #[serde(rename = "type")]
    pub kind: TxKind,
    pub amount: Decimal,
    pub description: Option<String>,
    pub category: String,
    pub date: Option<NaiveDate>,
}

pub(crate) fn validate_amount_fields(
    amount: Decimal,
    description: Option<&str>,
    category: &str,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if amount <= Decimal::ZERO {
        errors.push(FieldError {
            field: "amount",
            message: "Amount must be a positive number",
        });
    }
    if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN) {
        errors.push(FieldError {
            field: "description",
            message: "Description must be at most 255 characters",
        });
    }
    if category.trim().is_empty() {
        errors.push(FieldError {
            field: "category",
            message: "Category is required",
        });
    }
    errors
}

fn validate(payload: &TransactionPayload) -> Result<(), ApiError> {
    let errors = validate_amount_fields(
        payload.amount,
        payload.description.as_deref(),
        &payload.category,
    );
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Transaction>>> {
    let transactions = queries::list_transactions(&state.db, user.user_id).await?;
    Ok(Json(transactions))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<TransactionPayload>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    validate(&payload)?;

    let date = payload.date.unwrap_or_else(|| Local::now().date_naive());
    let transaction = queries::create_transaction(
        &state.db,
        user.user_id,
        payload.kind,
        payload.amount,
        payload.description.as_deref(),
        &payload.category,
        date,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<TransactionPayload>,
) -> ApiResult<Json<Transaction>> {
    validate(&payload)?;

    let date = payload.date.unwrap_or_else(|| Local::now().date_naive());
    let updated = queries::update_transaction(
        &state.db,
        user.user_id,
        id,
        payload.kind,
        payload.amount,
        payload.description.as_deref(),
        &payload.category,
        date,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Transaction not found or access denied".to_string()))?;

    Ok(Json(updated))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let deleted = queries::delete_transaction(&state.db, user.user_id, id).await?;
    if !deleted {
        return Err(ApiError::NotFound(
            "Transaction not found or access denied".to_string(),
        ));
    }
    Ok(Json(json!({ "message": "Transaction deleted" })))
}
