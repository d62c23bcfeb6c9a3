use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub category: String,
    pub monthly_limit: Decimal,
    pub month: NaiveDate, // always the first of the month
    pub created_at: NaiveDateTime,
}
