#![allow(dead_code)]

use fintrack_server::accounts::insert_account;
use fintrack_server::categories::insert_category;
use fintrack_server::database::{Db, get_user_db, init_main_db};
use fintrack_server::models::{
    Account, AccountKind, AccountPayload, Category, CategoryPayload, Transaction, TransactionKind,
    TransactionPayload,
};
use fintrack_server::transactions::insert_transaction;
use rust_decimal::Decimal;
use tempfile::{TempDir, tempdir};
use time::Date;
use uuid::Uuid;

pub async fn setup_test_environment() -> (String, String, TempDir) {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let data_path = temp_dir
        .path()
        .to_str()
        .expect("Failed to convert path to string")
        .to_string();
    let user_id = Uuid::new_v4().to_string();

    init_main_db(&data_path)
        .await
        .unwrap_or_else(|e| panic!("Failed to initialize main database at {}: {}", data_path, e));

    get_user_db(&data_path, &user_id).await.unwrap_or_else(|e| {
        panic!(
            "Failed to initialize user database for user {} at {}: {}",
            user_id, data_path, e
        )
    });

    (data_path, user_id, temp_dir)
}

pub async fn open_user_db(data_path: &str, user_id: &str) -> Db {
    get_user_db(data_path, user_id)
        .await
        .unwrap_or_else(|e| panic!("Failed to get user database for {}: {}", user_id, e))
}

pub async fn create_test_account(db: &Db, name: &str, opening_balance: Decimal) -> Account {
    insert_account(
        db,
        &AccountPayload {
            name: name.to_string(),
            kind: AccountKind::Checking,
            opening_balance,
        },
    )
    .await
    .unwrap_or_else(|e| panic!("Failed to insert test account '{}': {}", name, e.1))
}

pub async fn create_test_category(db: &Db, name: &str) -> Category {
    insert_category(
        db,
        &CategoryPayload {
            name: name.to_string(),
        },
    )
    .await
    .unwrap_or_else(|e| panic!("Failed to insert test category '{}': {}", name, e.1))
}

pub fn transaction_payload(
    account_id: &str,
    category_id: Option<&str>,
    amount: Decimal,
    kind: TransactionKind,
    date: Date,
    settled: bool,
) -> TransactionPayload {
    TransactionPayload {
        account_id: account_id.to_string(),
        category_id: category_id.map(str::to_string),
        description: format!("{} of {}", kind, amount),
        amount,
        kind,
        date: Some(date),
        settled,
    }
}

pub async fn create_test_transaction(
    db: &Db,
    account_id: &str,
    category_id: Option<&str>,
    amount: Decimal,
    kind: TransactionKind,
    date: Date,
    settled: bool,
) -> Transaction {
    let payload = transaction_payload(account_id, category_id, amount, kind, date, settled);
    insert_transaction(db, &payload)
        .await
        .unwrap_or_else(|e| panic!("Failed to insert test transaction: {}", e.1))
}

/// In-memory ledger entry for aggregation tests; no database involved.
pub fn ledger_entry(
    id: &str,
    amount: Decimal,
    kind: TransactionKind,
    category: Option<&str>,
    date: Date,
    settled: bool,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        account_id: "acc-main".to_string(),
        category_id: category.map(|name| format!("cat-{}", name)),
        category_name: category.map(str::to_string),
        description: format!("entry {}", id),
        amount,
        kind,
        date,
        settled,
        created_at: 1_700_000_000,
        updated_at: 1_700_000_000,
    }
}
