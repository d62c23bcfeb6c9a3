use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

use crate::database::models::{Budget, Frequency, RecurringRule, Transaction, TxKind, User};

/*
This file contains the specific SQL query,
CRUD (Create, Read, Update, Delete) logic
and is responsible for interacting with the database.
Every row is scoped by user_id.
 */

// Amounts live in TEXT columns, so SUMs happen in Rust on Decimal.
fn decimal_column(row: &SqliteRow, col: &str) -> Result<Decimal, sqlx::Error> {
    let text: String = row.try_get(col)?;
    Decimal::from_str(&text)
        .map_err(|e| sqlx::Error::Decode(format!("Invalid Decimal format for {col}: {e}").into()))
}

fn kind_column(row: &SqliteRow, col: &str) -> Result<TxKind, sqlx::Error> {
    let text: String = row.try_get(col)?;
    TxKind::from_str(&text).map_err(|e| sqlx::Error::Decode(e.into()))
}

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction, sqlx::Error> {
    Ok(Transaction {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        kind: kind_column(row, "type")?,
        amount: decimal_column(row, "amount")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        date: row.try_get("date")?,
        recurring_rule_id: row.try_get("recurring_rule_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn budget_from_row(row: &SqliteRow) -> Result<Budget, sqlx::Error> {
    Ok(Budget {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        category: row.try_get("category")?,
        monthly_limit: decimal_column(row, "monthly_limit")?,
        month: row.try_get("month")?,
        created_at: row.try_get("created_at")?,
    })
}

fn rule_from_row(row: &SqliteRow) -> Result<RecurringRule, sqlx::Error> {
    let frequency: String = row.try_get("frequency")?;
    Ok(RecurringRule {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        kind: kind_column(row, "type")?,
        amount: decimal_column(row, "amount")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        frequency: Frequency::from_str(&frequency).map_err(|e| sqlx::Error::Decode(e.into()))?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        created_at: row.try_get("created_at")?,
    })
}

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password: row.try_get("password")?,
        created_at: row.try_get("created_at")?,
    })
}

/*==========User Queries=========== */

pub async fn create_user(
    pool: &Pool<Sqlite>,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO users (name, email, password)
        VALUES (?, ?, ?)
        RETURNING id, name, email, password, created_at
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    user_from_row(&row)
}

pub async fn find_user_by_email(
    pool: &Pool<Sqlite>,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, name, email, password, created_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}

/*==========Transaction Queries=========== */

pub async fn list_transactions(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, type, amount, description, category, date,
               recurring_rule_id, created_at
        FROM transactions
        WHERE user_id = ?
        ORDER BY date DESC, created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(transaction_from_row).collect()
}

pub async fn create_transaction(
    pool: &Pool<Sqlite>,
    user_id: i64,
    kind: TxKind,
    amount: Decimal,
    description: Option<&str>,
    category: &str,
    date: NaiveDate,
) -> Result<Transaction, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO transactions (user_id, type, amount, description, category, date)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, user_id, type, amount, description, category, date,
                  recurring_rule_id, created_at
        "#,
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(amount.to_string())
    .bind(description)
    .bind(category)
    .bind(date)
    .fetch_one(pool)
    .await?;

    transaction_from_row(&row)
}

// Full-field replace, scoped to the owner. None when the row is absent or
// belongs to someone else.
pub async fn update_transaction(
    pool: &Pool<Sqlite>,
    user_id: i64,
    id: i64,
    kind: TxKind,
    amount: Decimal,
    description: Option<&str>,
    category: &str,
    date: NaiveDate,
) -> Result<Option<Transaction>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        UPDATE transactions
        SET type = ?, amount = ?, description = ?, category = ?, date = ?
        WHERE id = ? AND user_id = ?
        RETURNING id, user_id, type, amount, description, category, date,
                  recurring_rule_id, created_at
        "#,
    )
    .bind(kind.as_str())
    .bind(amount.to_string())
    .bind(description)
    .bind(category)
    .bind(date)
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(transaction_from_row).transpose()
}

pub async fn delete_transaction(
    pool: &Pool<Sqlite>,
    user_id: i64,
    id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM transactions
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// (kind, amount) pairs inside a date window, both bounds inclusive.
pub async fn amounts_in_window(
    pool: &Pool<Sqlite>,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(TxKind, Decimal)>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT type, amount
        FROM transactions
        WHERE user_id = ? AND date BETWEEN ? AND ?
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| Ok((kind_column(row, "type")?, decimal_column(row, "amount")?)))
        .collect()
}

// (category, amount) pairs for expenses inside a date window.
pub async fn expense_amounts_in_window(
    pool: &Pool<Sqlite>,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(String, Decimal)>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT category, amount
        FROM transactions
        WHERE user_id = ? AND type = 'expense' AND date BETWEEN ? AND ?
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let category: String = row.try_get("category")?;
            Ok((category, decimal_column(row, "amount")?))
        })
        .collect()
}

/*==========Budget Queries=========== */

pub async fn list_budgets(pool: &Pool<Sqlite>, user_id: i64) -> Result<Vec<Budget>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, category, monthly_limit, month, created_at
        FROM budgets
        WHERE user_id = ?
        ORDER BY category
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(budget_from_row).collect()
}

// One budget row per (user, category, month); re-posting replaces the limit.
pub async fn upsert_budget(
    pool: &Pool<Sqlite>,
    user_id: i64,
    category: &str,
    monthly_limit: Decimal,
    month: NaiveDate,
) -> Result<Budget, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO budgets (user_id, category, monthly_limit, month)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (user_id, category, month)
        DO UPDATE SET monthly_limit = excluded.monthly_limit
        RETURNING id, user_id, category, monthly_limit, month, created_at
        "#,
    )
    .bind(user_id)
    .bind(category)
    .bind(monthly_limit.to_string())
    .bind(month)
    .fetch_one(pool)
    .await?;

    budget_from_row(&row)
}

pub async fn delete_budget(pool: &Pool<Sqlite>, user_id: i64, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM budgets
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn budgets_for_month(
    pool: &Pool<Sqlite>,
    user_id: i64,
    month: NaiveDate,
) -> Result<Vec<Budget>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, category, monthly_limit, month, created_at
        FROM budgets
        WHERE user_id = ? AND month = ?
        "#,
    )
    .bind(user_id)
    .bind(month)
    .fetch_all(pool)
    .await?;

    rows.iter().map(budget_from_row).collect()
}

/*==========Recurring Rule Queries=========== */

pub async fn list_recurring(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Vec<RecurringRule>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, type, amount, description, category,
               frequency, start_date, end_date, created_at
        FROM recurring_transactions
        WHERE user_id = ?
        ORDER BY start_date DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(rule_from_row).collect()
}

pub async fn create_recurring(
    pool: &Pool<Sqlite>,
    user_id: i64,
    kind: TxKind,
    amount: Decimal,
    description: Option<&str>,
    category: &str,
    frequency: Frequency,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> Result<RecurringRule, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO recurring_transactions
            (user_id, type, amount, description, category, frequency, start_date, end_date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, user_id, type, amount, description, category,
                  frequency, start_date, end_date, created_at
        "#,
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(amount.to_string())
    .bind(description)
    .bind(category)
    .bind(frequency.as_str())
    .bind(start_date)
    .bind(end_date)
    .fetch_one(pool)
    .await?;

    rule_from_row(&row)
}

pub async fn delete_recurring(
    pool: &Pool<Sqlite>,
    user_id: i64,
    id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM recurring_transactions
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// Rules whose validity window includes `today`, in creation order.
pub async fn active_rules(
    pool: &Pool<Sqlite>,
    user_id: i64,
    today: NaiveDate,
) -> Result<Vec<RecurringRule>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, type, amount, description, category,
               frequency, start_date, end_date, created_at
        FROM recurring_transactions
        WHERE user_id = ?
          AND start_date <= ?
          AND (end_date IS NULL OR end_date >= ?)
        ORDER BY id
        "#,
    )
    .bind(user_id)
    .bind(today)
    .bind(today)
    .fetch_all(pool)
    .await?;

    rows.iter().map(rule_from_row).collect()
}

pub async fn generated_exists(
    pool: &Pool<Sqlite>,
    user_id: i64,
    description: &str,
    date: NaiveDate,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id FROM transactions
        WHERE user_id = ? AND description = ? AND date = ?
        "#,
    )
    .bind(user_id)
    .bind(description)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

// OR IGNORE rides on the partial unique (user, rule, day) index, so two
// racing generate calls cannot both insert a rule's row for one day.
pub async fn insert_generated(
    pool: &Pool<Sqlite>,
    user_id: i64,
    rule_id: i64,
    kind: TxKind,
    amount: Decimal,
    description: &str,
    category: &str,
    date: NaiveDate,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO transactions
            (user_id, recurring_rule_id, type, amount, description, category, date)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(rule_id)
    .bind(kind.as_str())
    .bind(amount.to_string())
    .bind(description)
    .bind(category)
    .bind(date)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
