use axum::extract::State;
use axum::Json;
use chrono::Local;

use crate::backend::auth::AuthUser;
use crate::backend::error::ApiResult;
use crate::backend::AppState;
use crate::core::dashboard::{self, DashboardSummary};

pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<DashboardSummary>> {
    let today = Local::now().date_naive();
    let summary = dashboard::summarize(&state.db, user.user_id, today).await?;
    Ok(Json(summary))
}
