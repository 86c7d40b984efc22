use criterion::{Criterion, criterion_group, criterion_main};
use rust_decimal::Decimal;
use std::hint::black_box;
use tempfile::tempdir;
use time::{Date, Duration, Month};
use tokio::runtime::Runtime;
use uuid::Uuid;

use fintrack_server::accounts::insert_account;
use fintrack_server::categories::insert_category;
use fintrack_server::database::{Db, get_user_db};
use fintrack_server::models::{
    Account, AccountKind, AccountPayload, CategoryPayload, Transaction, TransactionKind,
    TransactionPayload,
};
use fintrack_server::reporting::{build_dashboard, expense_by_category, monthly_balance_series};
use fintrack_server::transactions::{insert_transaction, load_ledger};

// Benchmark constants
const BENCH_TRANSACTION_COUNT: usize = 1000;
const BENCH_CATEGORY_COUNT: usize = 10;

fn bench_start_date() -> Date {
    Date::from_calendar_date(2023, Month::January, 1).unwrap()
}

fn in_memory_ledger(count: usize) -> Vec<Transaction> {
    (0..count)
        .map(|i| {
            let category = (i % (BENCH_CATEGORY_COUNT + 1) != 0)
                .then(|| format!("category_{}", i % BENCH_CATEGORY_COUNT));
            Transaction {
                id: format!("txn-{}", i),
                account_id: format!("acc-{}", i % 3),
                category_id: category.as_ref().map(|name| format!("id-{}", name)),
                category_name: category,
                description: format!("Benchmark Transaction {}", i),
                amount: Decimal::new(1000 + (i % 100) as i64 * 37, 2),
                kind: if i % 4 == 0 {
                    TransactionKind::Income
                } else {
                    TransactionKind::Expense
                },
                date: bench_start_date() + Duration::days(i as i64 % 730),
                settled: i % 10 != 0,
                created_at: 1_700_000_000 + i as i64,
                updated_at: 1_700_000_000 + i as i64,
            }
        })
        .collect()
}

fn bench_accounts() -> Vec<Account> {
    (0..3)
        .map(|i| Account {
            id: format!("acc-{}", i),
            name: format!("Account {}", i),
            kind: AccountKind::Checking,
            opening_balance: Decimal::new(100_000, 2),
            created_at: 1_700_000_000,
        })
        .collect()
}

async fn setup_benchmark_ledger(count: usize) -> (Db, tempfile::TempDir) {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let data_path = temp_dir.path().to_str().unwrap().to_string();
    let db = get_user_db(&data_path, &Uuid::new_v4().to_string())
        .await
        .unwrap();

    let account = insert_account(
        &db,
        &AccountPayload {
            name: "Bench".to_string(),
            kind: AccountKind::Checking,
            opening_balance: Decimal::ZERO,
        },
    )
    .await
    .unwrap();
    let category = insert_category(
        &db,
        &CategoryPayload {
            name: "Bench".to_string(),
        },
    )
    .await
    .unwrap();

    for txn in in_memory_ledger(count) {
        insert_transaction(
            &db,
            &TransactionPayload {
                account_id: account.id.clone(),
                category_id: txn.category_id.as_ref().map(|_| category.id.clone()),
                description: txn.description,
                amount: txn.amount,
                kind: txn.kind,
                date: Some(txn.date),
                settled: txn.settled,
            },
        )
        .await
        .unwrap();
    }

    (db, temp_dir)
}

fn criterion_benchmark(c: &mut Criterion) {
    let ledger = in_memory_ledger(BENCH_TRANSACTION_COUNT);
    let accounts = bench_accounts();
    let today = bench_start_date() + Duration::days(400);

    c.bench_function("expense_by_category", |b| {
        b.iter(|| expense_by_category(black_box(&ledger)).unwrap())
    });

    c.bench_function("monthly_balance_series", |b| {
        b.iter(|| monthly_balance_series(black_box(&ledger)).unwrap())
    });

    c.bench_function("build_dashboard", |b| {
        b.iter(|| build_dashboard(black_box(&ledger), black_box(&accounts), today).unwrap())
    });

    let rt = Runtime::new().unwrap();
    let (db, _temp_dir) = rt.block_on(setup_benchmark_ledger(BENCH_TRANSACTION_COUNT));

    c.bench_function("load_ledger", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(load_ledger(&db).await.unwrap().len()) })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
