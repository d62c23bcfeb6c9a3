use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::backend::auth::AuthUser;
use crate::backend::error::{ApiError, ApiResult};
use crate::backend::handlers::transactions::validate_amount_fields;
use crate::backend::AppState;
use crate::core;
use crate::database::db::queries;
use crate::database::models::{Frequency, RecurringRule, TxKind};

#[derive(Debug, Deserialize)]
pub struct RecurringPayload {
    #[serde(rename = "type")]
    pub kind: TxKind,
    pub amount: Decimal,
    pub description: Option<String>,
    pub category: String,
    pub frequency: Frequency,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn validate(payload: &RecurringPayload) -> Result<(), ApiError> {
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
) -> ApiResult<Json<Vec<RecurringRule>>> {
    let rules = queries::list_recurring(&state.db, user.user_id).await?;
    Ok(Json(rules))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RecurringPayload>,
) -> ApiResult<(StatusCode, Json<RecurringRule>)> {
    validate(&payload)?;

    let start_date = payload
        .start_date
        .unwrap_or_else(|| Local::now().date_naive());

    let rule = queries::create_recurring(
        &state.db,
        user.user_id,
        payload.kind,
        payload.amount,
        payload.description.as_deref(),
        &payload.category,
        payload.frequency,
        start_date,
        payload.end_date,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let deleted = queries::delete_recurring(&state.db, user.user_id, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Recurring rule not found".to_string()));
    }
    Ok(Json(json!({ "message": "Recurring rule deleted" })))
}

pub async fn generate(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<Value>> {
    let today = Local::now().date_naive();
    let count = core::recurring::generate(&state.db, user.user_id, today).await?;
    Ok(Json(json!({
        "message": format!("{count} recurring transaction(s) generated"),
    })))
}
