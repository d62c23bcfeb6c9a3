//! Recurring-rule engine: materializes due rules into concrete transactions,
//! at most once per rule per day.

use chrono::{Datelike, NaiveDate};
use sqlx::{Pool, Sqlite};

use crate::database::db::queries;
use crate::database::models::{Frequency, RecurringRule};

/// Prefix tag on every generated transaction's description. Together with
/// the rule's description-or-category it forms the dedup key
/// (user, description, date).
pub const MARKER_PREFIX: &str = "[Recurring] ";

pub fn marker_description(rule: &RecurringRule) -> String {
    let label = rule.description.as_deref().unwrap_or(&rule.category);
    format!("{MARKER_PREFIX}{label}")
}

/// Whether a rule active on `today` should fire, based on whole days elapsed
/// since its start date.
pub fn is_due(frequency: Frequency, start_date: NaiveDate, today: NaiveDate) -> bool {
    let diff_days = (today - start_date).num_days();
    match frequency {
        Frequency::Daily => true,
        // Fires on the start weekday, including day zero.
        Frequency::Weekly => diff_days >= 0 && diff_days % 7 == 0,
        // Day-of-month match only. A start day that does not exist in the
        // current month (e.g. the 31st in April) never matches.
        Frequency::Monthly => today.day() == start_date.day(),
    }
}

/// Runs every active rule for `user_id` as of `today` and returns how many
/// transactions were created. Re-running on the same day creates nothing new.
///
/// Each insert is its own statement: a failure aborts the call, but rows
/// already written for earlier rules stay committed (best-effort batch).
pub async fn generate(
    pool: &Pool<Sqlite>,
    user_id: i64,
    today: NaiveDate,
) -> Result<u32, sqlx::Error> {
    let rules = queries::active_rules(pool, user_id, today).await?;

    let mut generated: u32 = 0;

    for rule in rules {
        let description = marker_description(&rule);

        // Skip if already materialized today.
        if queries::generated_exists(pool, user_id, &description, today).await? {
            continue;
        }

        if !is_due(rule.frequency, rule.start_date, today) {
            continue;
        }

        let inserted = queries::insert_generated(
            pool,
            user_id,
            rule.id,
            rule.kind,
            rule.amount,
            &description,
            &rule.category,
            today,
        )
        .await?;

        generated += inserted as u32;
    }

    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::TxKind;
    use crate::test_utils::{create_test_user, setup_test_db};
    use rust_decimal_macros::dec;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn daily_is_always_due_once_active() {
        assert!(is_due(Frequency::Daily, d("2026-01-01"), d("2026-01-01")));
        assert!(is_due(Frequency::Daily, d("2026-01-01"), d("2026-03-17")));
    }

    #[test]
    fn weekly_fires_on_multiples_of_seven_days() {
        let start = d("2026-01-05");
        assert!(is_due(Frequency::Weekly, start, d("2026-01-05"))); // day 0
        assert!(is_due(Frequency::Weekly, start, d("2026-01-12"))); // day 7
        assert!(is_due(Frequency::Weekly, start, d("2026-01-19"))); // day 14
        assert!(!is_due(Frequency::Weekly, start, d("2026-01-08")));
        assert!(!is_due(Frequency::Weekly, start, d("2026-01-11")));
    }

    #[test]
    fn monthly_fires_on_matching_day_of_month() {
        let start = d("2026-01-15");
        assert!(is_due(Frequency::Monthly, start, d("2026-02-15")));
        assert!(is_due(Frequency::Monthly, start, d("2026-07-15")));
        assert!(!is_due(Frequency::Monthly, start, d("2026-02-14")));
    }

    #[test]
    fn monthly_rule_on_day_31_never_fires_in_short_months() {
        let start = d("2026-01-31");
        assert!(!is_due(Frequency::Monthly, start, d("2026-02-28")));
        assert!(!is_due(Frequency::Monthly, start, d("2026-04-30")));
        assert!(is_due(Frequency::Monthly, start, d("2026-03-31")));
    }

    #[test]
    fn marker_prefers_description_and_falls_back_to_category() {
        let mut rule = RecurringRule {
            id: 1,
            user_id: 1,
            kind: TxKind::Expense,
            amount: dec!(10),
            description: Some("Gym membership".to_string()),
            category: "Health".to_string(),
            frequency: Frequency::Monthly,
            start_date: d("2026-01-01"),
            end_date: None,
            created_at: d("2026-01-01").and_hms_opt(0, 0, 0).unwrap(),
        };
        assert_eq!(marker_description(&rule), "[Recurring] Gym membership");

        rule.description = None;
        assert_eq!(marker_description(&rule), "[Recurring] Health");
    }

    #[tokio::test]
    async fn generate_is_idempotent_for_daily_rules() {
        let pool = setup_test_db().await.unwrap();
        let user_id = create_test_user(&pool, "gen@example.com").await.unwrap();
        let today = d("2026-06-10");

        queries::create_recurring(
            &pool,
            user_id,
            TxKind::Expense,
            dec!(12.50),
            Some("Coffee"),
            "Food",
            Frequency::Daily,
            d("2026-06-01"),
            None,
        )
        .await
        .unwrap();

        assert_eq!(generate(&pool, user_id, today).await.unwrap(), 1);
        // Second run the same day creates nothing.
        assert_eq!(generate(&pool, user_id, today).await.unwrap(), 0);

        let txs = queries::list_transactions(&pool, user_id).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].description.as_deref(), Some("[Recurring] Coffee"));
        assert_eq!(txs[0].date, today);
        assert_eq!(txs[0].amount, dec!(12.50));
    }

    #[tokio::test]
    async fn generate_skips_rules_outside_their_window() {
        let pool = setup_test_db().await.unwrap();
        let user_id = create_test_user(&pool, "window@example.com").await.unwrap();
        let today = d("2026-06-10");

        // Ended before today.
        queries::create_recurring(
            &pool,
            user_id,
            TxKind::Expense,
            dec!(5),
            Some("Expired"),
            "Misc",
            Frequency::Daily,
            d("2026-05-01"),
            Some(d("2026-06-09")),
        )
        .await
        .unwrap();

        // Starts after today.
        queries::create_recurring(
            &pool,
            user_id,
            TxKind::Expense,
            dec!(5),
            Some("Future"),
            "Misc",
            Frequency::Daily,
            d("2026-06-11"),
            None,
        )
        .await
        .unwrap();

        assert_eq!(generate(&pool, user_id, today).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn generate_respects_weekly_cadence() {
        let pool = setup_test_db().await.unwrap();
        let user_id = create_test_user(&pool, "weekly@example.com").await.unwrap();

        queries::create_recurring(
            &pool,
            user_id,
            TxKind::Income,
            dec!(200),
            None,
            "Allowance",
            Frequency::Weekly,
            d("2026-06-01"),
            None,
        )
        .await
        .unwrap();

        assert_eq!(generate(&pool, user_id, d("2026-06-08")).await.unwrap(), 1);
        assert_eq!(generate(&pool, user_id, d("2026-06-09")).await.unwrap(), 0);

        let txs = queries::list_transactions(&pool, user_id).await.unwrap();
        assert_eq!(txs.len(), 1);
        // No description on the rule, so the marker uses the category.
        assert_eq!(txs[0].description.as_deref(), Some("[Recurring] Allowance"));
    }

    #[tokio::test]
    async fn rule_day_key_blocks_duplicate_generated_rows() {
        let pool = setup_test_db().await.unwrap();
        let user_id = create_test_user(&pool, "race@example.com").await.unwrap();
        let today = d("2026-06-10");

        let rule = queries::create_recurring(
            &pool,
            user_id,
            TxKind::Expense,
            dec!(9.99),
            Some("Streaming"),
            "Entertainment",
            Frequency::Daily,
            d("2026-06-01"),
            None,
        )
        .await
        .unwrap();

        // Two racing inserts for the same rule and day: only one lands.
        let first = queries::insert_generated(
            &pool,
            user_id,
            rule.id,
            rule.kind,
            rule.amount,
            "[Recurring] Streaming",
            &rule.category,
            today,
        )
        .await
        .unwrap();
        let second = queries::insert_generated(
            &pool,
            user_id,
            rule.id,
            rule.kind,
            rule.amount,
            "[Recurring] Streaming",
            &rule.category,
            today,
        )
        .await
        .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn failure_mid_batch_keeps_earlier_inserts_committed() {
        let pool = setup_test_db().await.unwrap();
        let user_id = create_test_user(&pool, "batch@example.com").await.unwrap();
        let today = d("2026-06-10");

        // Two active daily rules, processed in creation order.
        queries::create_recurring(
            &pool,
            user_id,
            TxKind::Expense,
            dec!(10),
            None,
            "Food",
            Frequency::Daily,
            d("2026-06-01"),
            None,
        )
        .await
        .unwrap();
        queries::create_recurring(
            &pool,
            user_id,
            TxKind::Expense,
            dec!(20),
            None,
            "Broken",
            Frequency::Daily,
            d("2026-06-01"),
            None,
        )
        .await
        .unwrap();

        // Make the second rule's insert fail at the storage layer.
        sqlx::query(
            r#"
            CREATE TRIGGER inject_insert_failure BEFORE INSERT ON transactions
            WHEN NEW.category = 'Broken'
            BEGIN
                SELECT RAISE(ABORT, 'injected storage failure');
            END
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        assert!(generate(&pool, user_id, today).await.is_err());

        // The first rule's row stays committed; no rollback across rules.
        let txs = queries::list_transactions(&pool, user_id).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].description.as_deref(), Some("[Recurring] Food"));
    }
}
