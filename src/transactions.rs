use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use libsql::{Value, params::Params};
use rust_decimal::Decimal;
use tower_sessions::Session;
use uuid::Uuid;

use crate::accounts::get_account;
use crate::app::AppState;
use crate::auth::get_current_user;
use crate::categories::category_exists;
use crate::constants::MAX_DESCRIPTION_LENGTH;
use crate::database::Db;
use crate::models::{
    ListTransactionsQuery, ListTransactionsResponse, Transaction, TransactionKind,
    TransactionPayload,
};
use crate::utils::{
    ApiResult, bad_request, db_error, db_error_with_context, format_date, get_user_database,
    not_found, now_timestamp, parse_date, parse_money, to_money, today, validate_money,
    validate_offset, validate_string_length, validate_transactions_limit,
};

const SELECT_TRANSACTION: &str = "SELECT t.id, t.account_id, t.category_id, c.name, t.description, \
     t.amount, t.kind, t.date, t.settled, t.created_at, t.updated_at \
     FROM transactions t LEFT JOIN categories c ON c.id = t.category_id";

const LEDGER_ORDER: &str = "ORDER BY t.date DESC, t.created_at DESC, t.rowid DESC";

fn optional_text(row: &libsql::Row, idx: i32) -> ApiResult<Option<String>> {
    match row
        .get_value(idx)
        .map_err(|_| db_error_with_context("invalid transaction data"))?
    {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text)),
        _ => Err(db_error_with_context("invalid transaction data")),
    }
}

pub fn extract_transaction_from_row(row: libsql::Row) -> ApiResult<Transaction> {
    let invalid = |_| db_error_with_context("invalid transaction data");

    let id: String = row.get(0).map_err(invalid)?;
    let account_id: String = row.get(1).map_err(invalid)?;
    let category_id = optional_text(&row, 2)?;
    let category_name = optional_text(&row, 3)?;
    let description: String = row.get(4).map_err(invalid)?;
    let amount: String = row.get(5).map_err(invalid)?;
    let kind: String = row.get(6).map_err(invalid)?;
    let date: String = row.get(7).map_err(invalid)?;
    let settled: i64 = row.get(8).map_err(invalid)?;
    let created_at: i64 = row.get(9).map_err(invalid)?;
    let updated_at: i64 = row.get(10).map_err(invalid)?;

    Ok(Transaction {
        id,
        account_id,
        category_id,
        category_name,
        description,
        amount: parse_money(&amount)?,
        kind: kind
            .parse::<TransactionKind>()
            .map_err(|_| db_error_with_context("invalid transaction kind"))?,
        date: parse_date(&date)?,
        settled: settled != 0,
        created_at,
        updated_at,
    })
}

pub fn validate_description(description: &str) -> ApiResult<()> {
    validate_string_length(description, "Description", MAX_DESCRIPTION_LENGTH)
}

pub fn validate_amount(amount: Decimal) -> ApiResult<()> {
    if amount <= Decimal::ZERO {
        return Err(bad_request("Amount must be positive"));
    }
    validate_money(amount, "Amount")
}

/// Checks the payload against this ledger: the account must exist and so
/// must the category, when one is given.
async fn validate_transaction_payload(db: &Db, payload: &TransactionPayload) -> ApiResult<()> {
    validate_description(&payload.description)?;
    validate_amount(payload.amount)?;

    if payload.account_id.trim().is_empty() {
        return Err(bad_request("Account ID cannot be empty"));
    }
    if get_account(db, payload.account_id.trim()).await?.is_none() {
        return Err(bad_request("Account does not exist"));
    }

    if let Some(category_id) = &payload.category_id {
        if category_id.trim().is_empty() {
            return Err(bad_request("Category ID cannot be empty"));
        }
        if !category_exists(db, category_id.trim()).await? {
            return Err(bad_request("Category does not exist"));
        }
    }
    Ok(())
}

fn category_value(category_id: &Option<String>) -> Value {
    match category_id {
        Some(id) => Value::Text(id.trim().to_string()),
        None => Value::Null,
    }
}

pub async fn get_transaction(db: &Db, transaction_id: &str) -> ApiResult<Option<Transaction>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!("{} WHERE t.id = ?", SELECT_TRANSACTION),
            [transaction_id],
        )
        .await
        .map_err(|_| db_error_with_context("failed to query transaction"))?;

    match rows.next().await.map_err(|_| db_error())? {
        Some(row) => Ok(Some(extract_transaction_from_row(row)?)),
        None => Ok(None),
    }
}

pub async fn insert_transaction(db: &Db, payload: &TransactionPayload) -> ApiResult<Transaction> {
    validate_transaction_payload(db, payload).await?;

    let id = Uuid::new_v4().to_string();
    let date = payload.date.unwrap_or_else(today);
    let now = now_timestamp();

    {
        let conn = db.write().await;
        conn.execute(
            "INSERT INTO transactions \
             (id, account_id, category_id, description, amount, kind, date, settled, \
              created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            [
                Value::Text(id.clone()),
                Value::Text(payload.account_id.trim().to_string()),
                category_value(&payload.category_id),
                Value::Text(payload.description.trim().to_string()),
                Value::Text(to_money(payload.amount).to_string()),
                Value::Text(payload.kind.as_str().to_string()),
                Value::Text(format_date(date)?),
                Value::Integer(i64::from(payload.settled)),
                Value::Integer(now),
                Value::Integer(now),
            ],
        )
        .await
        .map_err(|_| db_error_with_context("transaction creation failed"))?;
    }

    // Re-read so the category name comes from the join
    get_transaction(db, &id)
        .await?
        .ok_or_else(|| db_error_with_context("transaction vanished after insert"))
}

pub async fn update_transaction(
    db: &Db,
    transaction_id: &str,
    payload: &TransactionPayload,
) -> ApiResult<Transaction> {
    let existing = get_transaction(db, transaction_id)
        .await?
        .ok_or_else(|| not_found("Transaction"))?;
    validate_transaction_payload(db, payload).await?;

    let date = payload.date.unwrap_or(existing.date);

    {
        let conn = db.write().await;
        conn.execute(
            "UPDATE transactions SET account_id = ?, category_id = ?, description = ?, amount = ?, \
             kind = ?, date = ?, settled = ?, updated_at = ? WHERE id = ?",
            [
                Value::Text(payload.account_id.trim().to_string()),
                category_value(&payload.category_id),
                Value::Text(payload.description.trim().to_string()),
                Value::Text(to_money(payload.amount).to_string()),
                Value::Text(payload.kind.as_str().to_string()),
                Value::Text(format_date(date)?),
                Value::Integer(i64::from(payload.settled)),
                Value::Integer(now_timestamp()),
                Value::Text(transaction_id.to_string()),
            ],
        )
        .await
        .map_err(|_| db_error_with_context("transaction update failed"))?;
    }

    get_transaction(db, transaction_id)
        .await?
        .ok_or_else(|| not_found("Transaction"))
}

pub async fn delete_transaction(db: &Db, transaction_id: &str) -> ApiResult<()> {
    let conn = db.write().await;
    let removed = conn
        .execute("DELETE FROM transactions WHERE id = ?", [transaction_id])
        .await
        .map_err(|_| db_error_with_context("transaction deletion failed"))?;

    if removed == 0 {
        return Err(not_found("Transaction"));
    }
    Ok(())
}

fn ledger_filter(query: &ListTransactionsQuery) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(account_id) = &query.account_id {
        clauses.push("t.account_id = ?");
        values.push(Value::Text(account_id.clone()));
    }
    if let Some(settled) = query.settled {
        clauses.push("t.settled = ?");
        values.push(Value::Integer(i64::from(settled)));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), values)
    }
}

/// One page of the ledger, settled and unsettled alike, newest first.
pub async fn list_transactions(
    db: &Db,
    query: &ListTransactionsQuery,
) -> ApiResult<ListTransactionsResponse> {
    let limit = validate_transactions_limit(query.limit)?;
    let offset = validate_offset(query.offset)?;
    let (filter, values) = ledger_filter(query);

    let conn = db.read().await;

    let mut count_rows = conn
        .query(
            &format!("SELECT COUNT(*) FROM transactions t {}", filter),
            Params::Positional(values.clone()),
        )
        .await
        .map_err(|_| db_error_with_context("failed to count transactions"))?;
    let total_count: u32 = match count_rows.next().await.map_err(|_| db_error())? {
        Some(row) => row
            .get(0)
            .map_err(|_| db_error_with_context("failed to read transaction count"))?,
        None => 0,
    };

    let mut page_values = values;
    page_values.push(Value::Integer(i64::from(limit)));
    page_values.push(Value::Integer(i64::from(offset)));

    let mut rows = conn
        .query(
            &format!(
                "{} {} {} LIMIT ? OFFSET ?",
                SELECT_TRANSACTION, filter, LEDGER_ORDER
            ),
            Params::Positional(page_values),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query transactions"))?;

    let mut transactions = Vec::new();
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        transactions.push(extract_transaction_from_row(row)?);
    }

    Ok(ListTransactionsResponse {
        transactions,
        total_count,
    })
}

/// The whole ledger, read eagerly into memory.
pub async fn load_ledger(db: &Db) -> ApiResult<Vec<Transaction>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(&format!("{} {}", SELECT_TRANSACTION, LEDGER_ORDER), ())
        .await
        .map_err(|_| db_error_with_context("failed to load ledger"))?;

    let mut ledger = Vec::new();
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        ledger.push(extract_transaction_from_row(row)?);
    }
    Ok(ledger)
}

pub async fn get_transactions(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListTransactionsQuery>,
) -> ApiResult<(StatusCode, Json<ListTransactionsResponse>)> {
    let user = get_current_user(&session).await?;
    let user_db = get_user_database(&state.data_path, &user.id).await?;

    Ok((StatusCode::OK, Json(list_transactions(&user_db, &query).await?)))
}

pub async fn get_transaction_by_id(
    State(state): State<AppState>,
    session: Session,
    Path(transaction_id): Path<String>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let user = get_current_user(&session).await?;
    let user_db = get_user_database(&state.data_path, &user.id).await?;

    let transaction = get_transaction(&user_db, &transaction_id)
        .await?
        .ok_or_else(|| not_found("Transaction"))?;
    Ok((StatusCode::OK, Json(transaction)))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<TransactionPayload>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let user = get_current_user(&session).await?;
    let user_db = get_user_database(&state.data_path, &user.id).await?;

    let transaction = insert_transaction(&user_db, &payload).await?;
    tracing::info!(
        user_id = %user.id,
        transaction_id = %transaction.id,
        kind = %transaction.kind,
        "transaction created"
    );

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn edit_transaction(
    State(state): State<AppState>,
    session: Session,
    Path(transaction_id): Path<String>,
    Json(payload): Json<TransactionPayload>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let user = get_current_user(&session).await?;
    let user_db = get_user_database(&state.data_path, &user.id).await?;

    let transaction = update_transaction(&user_db, &transaction_id, &payload).await?;
    tracing::info!(user_id = %user.id, transaction_id = %transaction.id, "transaction updated");

    Ok((StatusCode::OK, Json(transaction)))
}

pub async fn remove_transaction(
    State(state): State<AppState>,
    session: Session,
    Path(transaction_id): Path<String>,
) -> ApiResult<StatusCode> {
    let user = get_current_user(&session).await?;
    let user_db = get_user_database(&state.data_path, &user.id).await?;

    delete_transaction(&user_db, &transaction_id).await?;
    tracing::info!(user_id = %user.id, transaction_id = %transaction_id, "transaction deleted");

    Ok(StatusCode::NO_CONTENT)
}
