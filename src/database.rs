use anyhow::Result;
use libsql::{Builder, Connection};
use std::{path::Path, sync::Arc};
use tokio::sync::RwLock;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id             TEXT    PRIMARY KEY,
    name           TEXT    UNIQUE NOT NULL,
    password_hash  TEXT    NOT NULL
);
"#;

const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id               TEXT    PRIMARY KEY,
    name             TEXT    UNIQUE NOT NULL,
    kind             TEXT    NOT NULL,
    opening_balance  TEXT    NOT NULL,
    created_at       INTEGER NOT NULL
);
"#;

const CREATE_CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id    TEXT PRIMARY KEY,
    name  TEXT UNIQUE NOT NULL
);
"#;

const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id           TEXT    PRIMARY KEY,
    account_id   TEXT    NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    category_id  TEXT    REFERENCES categories(id) ON DELETE SET NULL,
    description  TEXT    NOT NULL,
    amount       TEXT    NOT NULL,
    kind         TEXT    NOT NULL,
    date         TEXT    NOT NULL,
    settled      INTEGER NOT NULL DEFAULT 1,
    created_at   INTEGER NOT NULL,
    updated_at   INTEGER NOT NULL
);
"#;

const CREATE_TRANSACTIONS_DATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_transactions_date \
     ON transactions (date DESC, created_at DESC);";

const CREATE_TRANSACTIONS_ACCOUNT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions (account_id);";

pub type Db = Arc<RwLock<Connection>>;

/// Main users registry DB (users.db)
pub async fn init_main_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join("users.db");
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;

    conn.execute(CREATE_USERS_TABLE, ()).await?;
    Ok(Arc::new(RwLock::new(conn)))
}

/// Per-user isolated ledger DB (user_{id}.db). The schema is created on open.
pub async fn get_user_db(data_dir: &str, user_id: &str) -> Result<Db> {
    if user_id.is_empty() || !user_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        anyhow::bail!("invalid user id for database path: {:?}", user_id);
    }

    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join(format!("user_{}.db", user_id));
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;

    conn.execute("PRAGMA foreign_keys = ON", ()).await?;
    conn.execute(CREATE_ACCOUNTS_TABLE, ()).await?;
    conn.execute(CREATE_CATEGORIES_TABLE, ()).await?;
    conn.execute(CREATE_TRANSACTIONS_TABLE, ()).await?;
    conn.execute(CREATE_TRANSACTIONS_DATE_INDEX, ()).await?;
    conn.execute(CREATE_TRANSACTIONS_ACCOUNT_INDEX, ()).await?;

    Ok(Arc::new(RwLock::new(conn)))
}
