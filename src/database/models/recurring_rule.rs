use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{Frequency, TxKind};

#[derive(Debug, Clone, Serialize)]
pub struct RecurringRule {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: TxKind,
    pub amount: Decimal,
    pub description: Option<String>,
    pub category: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>, // inclusive; None = open-ended
    pub created_at: NaiveDateTime,
}
