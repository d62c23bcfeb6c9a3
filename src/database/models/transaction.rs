use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use super::TxKind;

#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: TxKind,
    pub amount: Decimal,
    pub description: Option<String>,
    pub category: String,
    pub date: NaiveDate,
    /// Rule that generated this row; None for ordinary transactions.
    pub recurring_rule_id: Option<i64>,
    pub created_at: NaiveDateTime,
}
