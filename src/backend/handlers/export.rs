use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use chrono::Local;
use rust_xlsxwriter::{Workbook, XlsxError};

use crate::backend::auth::AuthUser;
use crate::backend::error::{ApiError, ApiResult};
use crate::backend::AppState;
use crate::core::dashboard::CURRENCY;
use crate::database::db::queries;
use crate::database::models::Transaction;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const HEADERS: [&str; 5] = ["Date", "Type", "Amount", "Category", "Description"];

fn export_cells(tx: &Transaction) -> [String; 5] {
    [
        tx.date.to_string(),
        tx.kind.title().to_string(),
        format!("{:.2} {CURRENCY}", tx.amount),
        tx.category.clone(),
        tx.description.clone().unwrap_or_default(),
    ]
}

fn build_workbook(rows: &[Transaction]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Transactions")?;

    for (col, title) in HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *title)?;
    }

    for (i, tx) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, cell) in export_cells(tx).iter().enumerate() {
            sheet.write_string(row, col as u16, cell)?;
        }
    }

    workbook.save_to_buffer()
}

/// Streams all of the caller's transactions as an xlsx attachment.
pub async fn transactions(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let rows = queries::list_transactions(&state.db, user.user_id).await?;
    if rows.is_empty() {
        return Err(ApiError::NotFound(
            "No transactions found to export".to_string(),
        ));
    }

    let buffer = build_workbook(&rows)?;

    let filename = format!("finledger-transactions-{}.xlsx", Local::now().date_naive());
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        buffer,
    ))
}
