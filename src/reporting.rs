//! Dashboard aggregation over a ledger snapshot.
//!
//! Every function here is pure: it borrows an already owner-filtered slice
//! of transactions (and accounts), validates the whole snapshot, and returns
//! freshly computed figures. Amounts are summed as `Decimal`; an empty
//! snapshot yields zero totals and empty series, never an error.

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use time::{Date, Month};

use crate::constants::{MONEY_SCALE, RECENT_TRANSACTIONS_LIMIT, UNCATEGORIZED_LABEL};
use crate::models::{Account, AccountKind, Transaction, TransactionKind};
use crate::utils::is_within_money_limit;

/// A record in the snapshot is not fit for aggregation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("transaction {id}: amount must be positive, got {amount}")]
    NonPositiveAmount { id: String, amount: Decimal },

    #[error("transaction {id}: amount {amount} has more than two decimal places")]
    AmountPrecision { id: String, amount: Decimal },

    #[error("transaction {id}: amount {amount} exceeds the money column range")]
    AmountOutOfRange { id: String, amount: Decimal },

    #[error("transaction {id}: missing account reference")]
    MissingAccount { id: String },

    #[error("transaction {id}: category {category_id} has no resolved name")]
    UnresolvedCategory { id: String, category_id: String },

    #[error("account {id}: opening balance {amount} has more than two decimal places")]
    OpeningBalancePrecision { id: String, amount: Decimal },

    #[error("account {id}: opening balance {amount} exceeds the money column range")]
    OpeningBalanceOutOfRange { id: String, amount: Decimal },
}

/// Income, expense and net for some slice of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct PeriodTotals {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// Group key for expense totals. A missing category is its own group and
/// never collides with a category that happens to be named "Uncategorized".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoryLabel {
    Named(String),
    Uncategorized,
}

impl CategoryLabel {
    pub fn as_str(&self) -> &str {
        match self {
            CategoryLabel::Named(name) => name,
            CategoryLabel::Uncategorized => UNCATEGORIZED_LABEL,
        }
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CategoryLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: CategoryLabel,
    pub total: Decimal,
}

/// Calendar month; orders chronologically and displays as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u8,
}

impl MonthKey {
    pub fn of(date: Date) -> Self {
        MonthKey {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyBalance {
    pub month: MonthKey,
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub account_id: String,
    pub name: String,
    pub kind: AccountKind,
    pub opening_balance: Decimal,
    pub balance: Decimal,
}

/// Parallel label/value arrays, ready for a chart.
///
/// `uncategorized_index` points at the entry grouping transactions without a
/// category, so it stays distinguishable from a category whose name happens
/// to match its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub data: Vec<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncategorized_index: Option<usize>,
}

impl From<&[CategoryTotal]> for ChartSeries {
    fn from(totals: &[CategoryTotal]) -> Self {
        ChartSeries {
            labels: totals.iter().map(|t| t.category.to_string()).collect(),
            data: totals.iter().map(|t| t.total).collect(),
            uncategorized_index: totals
                .iter()
                .position(|t| t.category == CategoryLabel::Uncategorized),
        }
    }
}

impl From<&[MonthlyBalance]> for ChartSeries {
    fn from(series: &[MonthlyBalance]) -> Self {
        ChartSeries {
            labels: series.iter().map(|m| m.month.to_string()).collect(),
            data: series.iter().map(|m| m.net).collect(),
            uncategorized_index: None,
        }
    }
}

/// Everything the dashboard shows, computed from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub today: Date,
    pub total_balance: Decimal,
    pub current_month: PeriodTotals,
    pub recent_transactions: Vec<Transaction>,
    pub accounts: Vec<AccountBalance>,
    pub expense_by_category: ChartSeries,
    pub monthly_balance: ChartSeries,
}

fn has_money_scale(value: Decimal) -> bool {
    value.normalize().scale() <= MONEY_SCALE
}

/// Rejects any record that cannot be aggregated.
pub fn validate_transactions(transactions: &[Transaction]) -> Result<(), ValidationError> {
    for txn in transactions {
        if txn.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount {
                id: txn.id.clone(),
                amount: txn.amount,
            });
        }
        if !has_money_scale(txn.amount) {
            return Err(ValidationError::AmountPrecision {
                id: txn.id.clone(),
                amount: txn.amount,
            });
        }
        if !is_within_money_limit(txn.amount) {
            return Err(ValidationError::AmountOutOfRange {
                id: txn.id.clone(),
                amount: txn.amount,
            });
        }
        if txn.account_id.trim().is_empty() {
            return Err(ValidationError::MissingAccount { id: txn.id.clone() });
        }
        if let (Some(category_id), None) = (&txn.category_id, &txn.category_name) {
            return Err(ValidationError::UnresolvedCategory {
                id: txn.id.clone(),
                category_id: category_id.clone(),
            });
        }
    }
    Ok(())
}

fn validate_accounts(accounts: &[Account]) -> Result<(), ValidationError> {
    for account in accounts {
        if !has_money_scale(account.opening_balance) {
            return Err(ValidationError::OpeningBalancePrecision {
                id: account.id.clone(),
                amount: account.opening_balance,
            });
        }
        if !is_within_money_limit(account.opening_balance) {
            return Err(ValidationError::OpeningBalanceOutOfRange {
                id: account.id.clone(),
                amount: account.opening_balance,
            });
        }
    }
    Ok(())
}

fn settled(transactions: &[Transaction]) -> impl Iterator<Item = &Transaction> {
    transactions.iter().filter(|t| t.settled)
}

fn totals<'a>(transactions: impl Iterator<Item = &'a Transaction>) -> PeriodTotals {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    for txn in transactions {
        match txn.kind {
            TransactionKind::Income => income += txn.amount,
            TransactionKind::Expense => expense += txn.amount,
        }
    }
    PeriodTotals {
        income,
        expense,
        net: income - expense,
    }
}

/// Settled income minus settled expense.
pub fn total_balance(transactions: &[Transaction]) -> Result<Decimal, ValidationError> {
    validate_transactions(transactions)?;
    Ok(totals(settled(transactions)).net)
}

/// Settled income, expense and net for one calendar month.
pub fn month_totals(
    transactions: &[Transaction],
    year: i32,
    month: Month,
) -> Result<PeriodTotals, ValidationError> {
    validate_transactions(transactions)?;
    Ok(totals(
        settled(transactions).filter(|t| t.date.year() == year && t.date.month() == month),
    ))
}

/// The `n` latest settled transactions, newest date first; same-day entries
/// are ordered by creation time, newest first.
pub fn recent_transactions(
    transactions: &[Transaction],
    n: usize,
) -> Result<Vec<&Transaction>, ValidationError> {
    validate_transactions(transactions)?;
    let mut recent: Vec<&Transaction> = settled(transactions).collect();
    recent.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    recent.truncate(n);
    Ok(recent)
}

/// Opening balance plus the signed sum of each account's settled
/// transactions, in the order the accounts were given.
pub fn account_balances(
    accounts: &[Account],
    transactions: &[Transaction],
) -> Result<Vec<AccountBalance>, ValidationError> {
    validate_accounts(accounts)?;
    validate_transactions(transactions)?;

    let mut effects: BTreeMap<&str, Decimal> = BTreeMap::new();
    for txn in settled(transactions) {
        *effects.entry(txn.account_id.as_str()).or_default() += txn.signed_amount();
    }

    Ok(accounts
        .iter()
        .map(|account| AccountBalance {
            account_id: account.id.clone(),
            name: account.name.clone(),
            kind: account.kind,
            opening_balance: account.opening_balance,
            balance: account.opening_balance
                + effects.get(account.id.as_str()).copied().unwrap_or_default(),
        })
        .collect())
}

/// Settled expenses summed per category, largest total first.
pub fn expense_by_category(
    transactions: &[Transaction],
) -> Result<Vec<CategoryTotal>, ValidationError> {
    validate_transactions(transactions)?;

    let mut groups: BTreeMap<CategoryLabel, Decimal> = BTreeMap::new();
    for txn in settled(transactions).filter(|t| t.kind == TransactionKind::Expense) {
        let label = match &txn.category_name {
            Some(name) => CategoryLabel::Named(name.clone()),
            None => CategoryLabel::Uncategorized,
        };
        *groups.entry(label).or_default() += txn.amount;
    }

    let mut totals: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|(category, total)| CategoryTotal { category, total })
        .collect();
    // stable: equal totals keep label order
    totals.sort_by(|a, b| b.total.cmp(&a.total));
    Ok(totals)
}

/// Signed settled total per calendar month, oldest month first.
pub fn monthly_balance_series(
    transactions: &[Transaction],
) -> Result<Vec<MonthlyBalance>, ValidationError> {
    validate_transactions(transactions)?;

    let mut months: BTreeMap<MonthKey, Decimal> = BTreeMap::new();
    for txn in settled(transactions) {
        *months.entry(MonthKey::of(txn.date)).or_default() += txn.signed_amount();
    }

    Ok(months
        .into_iter()
        .map(|(month, net)| MonthlyBalance { month, net })
        .collect())
}

/// Assembles the dashboard from one ledger snapshot, with `today` deciding
/// the current month.
pub fn build_dashboard(
    transactions: &[Transaction],
    accounts: &[Account],
    today: Date,
) -> Result<DashboardSummary, ValidationError> {
    let by_category = expense_by_category(transactions)?;
    let by_month = monthly_balance_series(transactions)?;

    Ok(DashboardSummary {
        today,
        total_balance: total_balance(transactions)?,
        current_month: month_totals(transactions, today.year(), today.month())?,
        recent_transactions: recent_transactions(transactions, RECENT_TRANSACTIONS_LIMIT)?
            .into_iter()
            .cloned()
            .collect(),
        accounts: account_balances(accounts, transactions)?,
        expense_by_category: ChartSeries::from(by_category.as_slice()),
        monthly_balance: ChartSeries::from(by_month.as_slice()),
    })
}
