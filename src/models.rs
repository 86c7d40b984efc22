use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// Storage format for transaction dates.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RegisterPayload {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Wallet,
    #[default]
    Checking,
    Savings,
    CreditCard,
    Investment,
    Other,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Wallet => "wallet",
            AccountKind::Checking => "checking",
            AccountKind::Savings => "savings",
            AccountKind::CreditCard => "credit_card",
            AccountKind::Investment => "investment",
            AccountKind::Other => "other",
        }
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wallet" => Ok(AccountKind::Wallet),
            "checking" => Ok(AccountKind::Checking),
            "savings" => Ok(AccountKind::Savings),
            "credit_card" => Ok(AccountKind::CreditCard),
            "investment" => Ok(AccountKind::Investment),
            "other" => Ok(AccountKind::Other),
            other => Err(format!("unknown account kind: {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    #[default]
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// Balance effect of one unit of this kind.
    pub fn sign(&self) -> Decimal {
        match self {
            TransactionKind::Income => Decimal::ONE,
            TransactionKind::Expense => Decimal::NEGATIVE_ONE,
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("unknown transaction kind: {}", other)),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub kind: AccountKind,
    pub opening_balance: Decimal,
    pub created_at: i64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AccountPayload {
    pub name: String,
    #[serde(default)]
    pub kind: AccountKind,
    #[serde(default)]
    pub opening_balance: Decimal,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CategoryPayload {
    pub name: String,
}

/// A ledger entry. `amount` is always positive; `kind` carries the sign.
/// `category_name` is resolved from `category_id` when the row is loaded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub description: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub date: Date,
    pub settled: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Transaction {
    pub fn signed_amount(&self) -> Decimal {
        self.amount * self.kind.sign()
    }
}

fn default_settled() -> bool {
    true
}

#[derive(Deserialize, Debug, Clone)]
pub struct TransactionPayload {
    pub account_id: String,
    #[serde(default)]
    pub category_id: Option<String>,
    pub description: String,
    pub amount: Decimal,
    #[serde(default)]
    pub kind: TransactionKind,
    /// Defaults to today's date when omitted.
    #[serde(default)]
    pub date: Option<Date>,
    #[serde(default = "default_settled")]
    pub settled: bool,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ListTransactionsQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub account_id: Option<String>,
    pub settled: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ListTransactionsResponse {
    pub transactions: Vec<Transaction>,
    pub total_count: u32,
}
