use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::backend::auth::AuthUser;
use crate::backend::error::{ApiError, ApiResult, FieldError};
use crate::backend::AppState;
use crate::database::db::queries;
use crate::database::models::Budget;

#[derive(Debug, Deserialize)]
pub struct BudgetPayload {
    pub category: String,
    pub monthly_limit: Decimal,
    pub month: Option<NaiveDate>,
}

fn validate(payload: &BudgetPayload) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if payload.category.trim().is_empty() {
        errors.push(FieldError {
            field: "category",
            message: "Category is required",
        });
    }
    // Positive limit is enforced here so the aggregator can never divide
    // by zero.
    if payload.monthly_limit <= Decimal::ZERO {
        errors.push(FieldError {
            field: "monthly_limit",
            message: "Monthly limit must be a positive number",
        });
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

pub async fn list(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<Vec<Budget>>> {
    let budgets = queries::list_budgets(&state.db, user.user_id).await?;
    Ok(Json(budgets))
}

pub async fn upsert(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BudgetPayload>,
) -> ApiResult<(StatusCode, Json<Budget>)> {
    validate(&payload)?;

    // Normalize to the first of the month, no time component.
    let month = payload.month.unwrap_or_else(|| Local::now().date_naive());
    let month = month.with_day(1).unwrap_or(month);

    let budget = queries::upsert_budget(
        &state.db,
        user.user_id,
        payload.category.trim(),
        payload.monthly_limit,
        month,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(budget)))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let deleted = queries::delete_budget(&state.db, user.user_id, id).await?;
    if !deleted {
        return Err(ApiError::NotFound(
            "Budget not found or access denied".to_string(),
        ));
    }
    Ok(Json(json!({ "message": "Budget deleted" })))
}
