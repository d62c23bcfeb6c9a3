//! Budget aggregator: monthly income/expense totals plus per-category
//! spend-vs-limit status with alert thresholds.

use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use crate::database::db::queries;
use crate::database::models::TxKind;

/// Fixed output currency label, not derived from data.
pub const CURRENCY: &str = "ETB";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alert {
    Caution,
    Warning,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
    pub currency: &'static str,
}

#[derive(Debug, Serialize)]
pub struct BudgetStatus {
    pub category: String,
    pub monthly_limit: Decimal,
    pub month: NaiveDate,
    pub spent: Decimal,
    pub percent_used: Decimal,
    pub alert: Option<Alert>,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub summary: Summary,
    pub budgets: Vec<BudgetStatus>,
}

/// First and last day of the calendar month containing `reference`,
/// both inclusive.
pub fn month_window(reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = reference.with_day(1).unwrap_or(reference);
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(reference);
    (start, end)
}

/// Thresholds are inclusive: >= 90 is "warning", >= 75 is "caution".
pub fn alert_for(percent_used: Decimal) -> Option<Alert> {
    if percent_used >= Decimal::from(90) {
        Some(Alert::Warning)
    } else if percent_used >= Decimal::from(75) {
        Some(Alert::Caution)
    } else {
        None
    }
}

/// Builds the dashboard payload for `user_id`'s month containing
/// `reference`. Amounts live in TEXT columns, so the sums happen here on
/// `Decimal` rather than in SQL.
pub async fn summarize(
    pool: &Pool<Sqlite>,
    user_id: i64,
    reference: NaiveDate,
) -> Result<DashboardSummary, sqlx::Error> {
    let (start, end) = month_window(reference);

    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;
    for (kind, amount) in queries::amounts_in_window(pool, user_id, start, end).await? {
        match kind {
            TxKind::Income => total_income += amount,
            TxKind::Expense => total_expenses += amount,
        }
    }

    let mut spent_by_category: HashMap<String, Decimal> = HashMap::new();
    for (category, amount) in queries::expense_amounts_in_window(pool, user_id, start, end).await? {
        *spent_by_category.entry(category).or_insert(Decimal::ZERO) += amount;
    }

    let budgets = queries::budgets_for_month(pool, user_id, start)
        .await?
        .into_iter()
        .map(|budget| {
            let spent = spent_by_category
                .get(&budget.category)
                .copied()
                .unwrap_or(Decimal::ZERO);
            // monthly_limit is constrained positive at the entry boundary.
            let percent_used = (spent / budget.monthly_limit * Decimal::from(100)).round_dp(2);
            BudgetStatus {
                category: budget.category,
                monthly_limit: budget.monthly_limit,
                month: budget.month,
                spent,
                percent_used,
                alert: alert_for(percent_used),
            }
        })
        .collect();

    Ok(DashboardSummary {
        summary: Summary {
            balance: total_income - total_expenses,
            total_income,
            total_expenses,
            currency: CURRENCY,
        },
        budgets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_user, setup_test_db};
    use rust_decimal_macros::dec;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn month_window_covers_whole_month() {
        assert_eq!(
            month_window(d("2026-06-17")),
            (d("2026-06-01"), d("2026-06-30"))
        );
        assert_eq!(
            month_window(d("2026-12-31")),
            (d("2026-12-01"), d("2026-12-31"))
        );
        // Leap year February.
        assert_eq!(
            month_window(d("2028-02-10")),
            (d("2028-02-01"), d("2028-02-29"))
        );
    }

    #[test]
    fn alert_thresholds_are_inclusive() {
        assert_eq!(alert_for(dec!(74)), None);
        assert_eq!(alert_for(dec!(74.99)), None);
        assert_eq!(alert_for(dec!(75)), Some(Alert::Caution));
        assert_eq!(alert_for(dec!(89.99)), Some(Alert::Caution));
        assert_eq!(alert_for(dec!(90)), Some(Alert::Warning));
        assert_eq!(alert_for(dec!(250)), Some(Alert::Warning));
    }

    #[tokio::test]
    async fn summarize_totals_split_by_kind() {
        let pool = setup_test_db().await.unwrap();
        let user_id = create_test_user(&pool, "totals@example.com").await.unwrap();

        for (kind, amount) in [
            (TxKind::Income, dec!(1000)),
            (TxKind::Income, dec!(500)),
            (TxKind::Expense, dec!(300)),
            (TxKind::Expense, dec!(200)),
        ] {
            queries::create_transaction(&pool, user_id, kind, amount, None, "Misc", d("2026-06-10"))
                .await
                .unwrap();
        }
        // Outside the reference month, must not count.
        queries::create_transaction(
            &pool,
            user_id,
            TxKind::Expense,
            dec!(999),
            None,
            "Misc",
            d("2026-05-31"),
        )
        .await
        .unwrap();

        let dashboard = summarize(&pool, user_id, d("2026-06-15")).await.unwrap();
        assert_eq!(dashboard.summary.total_income, dec!(1500));
        assert_eq!(dashboard.summary.total_expenses, dec!(500));
        assert_eq!(dashboard.summary.balance, dec!(1000));
        assert_eq!(dashboard.summary.currency, "ETB");
        assert!(dashboard.budgets.is_empty());
    }

    #[tokio::test]
    async fn summarize_flags_budgets_against_spending() {
        let pool = setup_test_db().await.unwrap();
        let user_id = create_test_user(&pool, "alerts@example.com").await.unwrap();
        let month = d("2026-06-01");

        queries::upsert_budget(&pool, user_id, "Food", dec!(1000), month)
            .await
            .unwrap();
        queries::upsert_budget(&pool, user_id, "Transport", dec!(100), month)
            .await
            .unwrap();
        queries::upsert_budget(&pool, user_id, "Rent", dec!(5000), month)
            .await
            .unwrap();

        queries::create_transaction(
            &pool,
            user_id,
            TxKind::Expense,
            dec!(600),
            None,
            "Food",
            d("2026-06-05"),
        )
        .await
        .unwrap();
        queries::create_transaction(
            &pool,
            user_id,
            TxKind::Expense,
            dec!(150),
            None,
            "Food",
            d("2026-06-20"),
        )
        .await
        .unwrap();
        queries::create_transaction(
            &pool,
            user_id,
            TxKind::Expense,
            dec!(95),
            None,
            "Transport",
            d("2026-06-08"),
        )
        .await
        .unwrap();

        let dashboard = summarize(&pool, user_id, d("2026-06-15")).await.unwrap();
        assert_eq!(dashboard.budgets.len(), 3);

        let by_category = |name: &str| {
            dashboard
                .budgets
                .iter()
                .find(|b| b.category == name)
                .unwrap()
        };

        let food = by_category("Food");
        assert_eq!(food.spent, dec!(750));
        assert_eq!(food.percent_used, dec!(75.00));
        assert_eq!(food.alert, Some(Alert::Caution));

        let transport = by_category("Transport");
        assert_eq!(transport.spent, dec!(95));
        assert_eq!(transport.percent_used, dec!(95.00));
        assert_eq!(transport.alert, Some(Alert::Warning));

        let rent = by_category("Rent");
        assert_eq!(rent.spent, dec!(0));
        assert_eq!(rent.percent_used, dec!(0));
        assert_eq!(rent.alert, None);
    }

    #[tokio::test]
    async fn percent_used_rounds_to_two_decimals() {
        let pool = setup_test_db().await.unwrap();
        let user_id = create_test_user(&pool, "round@example.com").await.unwrap();
        let month = d("2026-06-01");

        queries::upsert_budget(&pool, user_id, "Books", dec!(300), month)
            .await
            .unwrap();
        queries::create_transaction(
            &pool,
            user_id,
            TxKind::Expense,
            dec!(100),
            None,
            "Books",
            d("2026-06-03"),
        )
        .await
        .unwrap();

        let dashboard = summarize(&pool, user_id, d("2026-06-15")).await.unwrap();
        assert_eq!(dashboard.budgets[0].percent_used, dec!(33.33));
    }
}
