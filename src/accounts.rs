use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use tower_sessions::Session;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::get_current_user;
use crate::constants::MAX_ACCOUNT_NAME_LENGTH;
use crate::database::Db;
use crate::models::{Account, AccountKind, AccountPayload};
use crate::utils::{
    ApiResult, conflict, db_error, db_error_with_context, get_user_database, not_found,
    now_timestamp, parse_money, to_money, validate_money, validate_string_length,
};

const SELECT_ACCOUNT: &str = "SELECT id, name, kind, opening_balance, created_at FROM accounts";

pub fn validate_account_name(name: &str) -> ApiResult<()> {
    validate_string_length(name, "Account name", MAX_ACCOUNT_NAME_LENGTH)
}

pub fn extract_account_from_row(row: libsql::Row) -> ApiResult<Account> {
    let invalid = |_| db_error_with_context("invalid account data");

    let id: String = row.get(0).map_err(invalid)?;
    let name: String = row.get(1).map_err(invalid)?;
    let kind: String = row.get(2).map_err(invalid)?;
    let opening_balance: String = row.get(3).map_err(invalid)?;
    let created_at: i64 = row.get(4).map_err(invalid)?;

    Ok(Account {
        id,
        name,
        kind: kind
            .parse::<AccountKind>()
            .map_err(|_| db_error_with_context("invalid account kind"))?,
        opening_balance: parse_money(&opening_balance)?,
        created_at,
    })
}

/// All accounts of the ledger, ordered by name.
pub async fn list_accounts(db: &Db) -> ApiResult<Vec<Account>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(&format!("{} ORDER BY name", SELECT_ACCOUNT), ())
        .await
        .map_err(|_| db_error_with_context("failed to query accounts"))?;

    let mut accounts = Vec::new();
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        accounts.push(extract_account_from_row(row)?);
    }
    Ok(accounts)
}

pub async fn get_account(db: &Db, account_id: &str) -> ApiResult<Option<Account>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(&format!("{} WHERE id = ?", SELECT_ACCOUNT), [account_id])
        .await
        .map_err(|_| db_error_with_context("failed to query account"))?;

    match rows.next().await.map_err(|_| db_error())? {
        Some(row) => Ok(Some(extract_account_from_row(row)?)),
        None => Ok(None),
    }
}

fn validate_account_payload(payload: &AccountPayload) -> ApiResult<(String, Decimal)> {
    validate_account_name(&payload.name)?;
    validate_money(payload.opening_balance, "Opening balance")?;
    Ok((payload.name.trim().to_string(), to_money(payload.opening_balance)))
}

async fn ensure_unique_name(
    conn: &libsql::Connection,
    name: &str,
    except_id: Option<&str>,
) -> ApiResult<()> {
    let mut rows = conn
        .query(
            "SELECT id FROM accounts WHERE LOWER(name) = LOWER(?) AND id != ?",
            (name, except_id.unwrap_or("")),
        )
        .await
        .map_err(|_| db_error_with_context("failed to check existing account"))?;

    if rows.next().await.map_err(|_| db_error())?.is_some() {
        return Err(conflict("Account name already exists"));
    }
    Ok(())
}

pub async fn insert_account(db: &Db, payload: &AccountPayload) -> ApiResult<Account> {
    let (name, opening_balance) = validate_account_payload(payload)?;

    let conn = db.write().await;
    ensure_unique_name(&conn, &name, None).await?;

    let account = Account {
        id: Uuid::new_v4().to_string(),
        name,
        kind: payload.kind,
        opening_balance,
        created_at: now_timestamp(),
    };

    conn.execute(
        "INSERT INTO accounts (id, name, kind, opening_balance, created_at) VALUES (?, ?, ?, ?, ?)",
        (
            account.id.as_str(),
            account.name.as_str(),
            account.kind.as_str(),
            account.opening_balance.to_string(),
            account.created_at,
        ),
    )
    .await
    .map_err(|_| db_error_with_context("account creation failed"))?;

    Ok(account)
}

pub async fn update_account(
    db: &Db,
    account_id: &str,
    payload: &AccountPayload,
) -> ApiResult<Account> {
    let (name, opening_balance) = validate_account_payload(payload)?;

    let existing = get_account(db, account_id)
        .await?
        .ok_or_else(|| not_found("Account"))?;

    let conn = db.write().await;
    ensure_unique_name(&conn, &name, Some(account_id)).await?;

    conn.execute(
        "UPDATE accounts SET name = ?, kind = ?, opening_balance = ? WHERE id = ?",
        (
            name.as_str(),
            payload.kind.as_str(),
            opening_balance.to_string(),
            account_id,
        ),
    )
    .await
    .map_err(|_| db_error_with_context("account update failed"))?;

    Ok(Account {
        name,
        kind: payload.kind,
        opening_balance,
        ..existing
    })
}

/// Deletes the account together with every transaction booked on it.
/// Returns how many transactions went with it.
pub async fn delete_account(db: &Db, account_id: &str) -> ApiResult<u64> {
    let conn = db.write().await;
    let tx = conn
        .transaction()
        .await
        .map_err(|_| db_error_with_context("failed to begin account deletion"))?;

    let removed_transactions = tx
        .execute(
            "DELETE FROM transactions WHERE account_id = ?",
            [account_id],
        )
        .await
        .map_err(|_| db_error_with_context("failed to delete account transactions"))?;
    let removed = tx
        .execute("DELETE FROM accounts WHERE id = ?", [account_id])
        .await
        .map_err(|_| db_error_with_context("account deletion failed"))?;

    if removed == 0 {
        tx.rollback().await.map_err(|_| db_error())?;
        return Err(not_found("Account"));
    }
    tx.commit().await.map_err(|_| db_error())?;

    Ok(removed_transactions)
}

pub async fn get_accounts(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<(StatusCode, Json<Vec<Account>>)> {
    let user = get_current_user(&session).await?;
    let user_db = get_user_database(&state.data_path, &user.id).await?;

    Ok((StatusCode::OK, Json(list_accounts(&user_db).await?)))
}

pub async fn create_account(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<AccountPayload>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    let user = get_current_user(&session).await?;
    let user_db = get_user_database(&state.data_path, &user.id).await?;

    let account = insert_account(&user_db, &payload).await?;
    tracing::info!(user_id = %user.id, account_id = %account.id, "account created");

    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn edit_account(
    State(state): State<AppState>,
    session: Session,
    Path(account_id): Path<String>,
    Json(payload): Json<AccountPayload>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    let user = get_current_user(&session).await?;
    let user_db = get_user_database(&state.data_path, &user.id).await?;

    let account = update_account(&user_db, &account_id, &payload).await?;
    tracing::info!(user_id = %user.id, account_id = %account.id, "account updated");

    Ok((StatusCode::OK, Json(account)))
}

pub async fn remove_account(
    State(state): State<AppState>,
    session: Session,
    Path(account_id): Path<String>,
) -> ApiResult<StatusCode> {
    let user = get_current_user(&session).await?;
    let user_db = get_user_database(&state.data_path, &user.id).await?;

    let removed_transactions = delete_account(&user_db, &account_id).await?;
    tracing::info!(
        user_id = %user.id,
        account_id = %account_id,
        removed_transactions,
        "account deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
