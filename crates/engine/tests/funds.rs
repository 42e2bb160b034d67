use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Amount, BalanceStore, Engine, EngineError, HistoryQuery, NewEntry, OperationKind, SortField,
    SqlBalanceStore, SqlTransactionStore, StoreError, TransactionStore,
};
use migration::MigratorTrait;

async fn connect_memory_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

async fn engine_with_db() -> Engine {
    Engine::with_database(connect_memory_db().await)
}

async fn engine_with_file_db() -> (Engine, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = root.join(format!("funds_{}_{}.db", std::process::id(), stamp));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    (Engine::with_database(db), path)
}

#[tokio::test]
async fn add_provisions_account_and_snapshots_balance() {
    let engine = engine_with_db().await;

    let entry = engine.add(5, Amount::new(100)).await.unwrap();

    assert_eq!(entry.user_id, 5);
    assert_eq!(entry.user_from_id, None);
    assert_eq!(entry.operation, OperationKind::Add);
    assert_eq!(entry.sum, Amount::new(100));
    assert_eq!(entry.balance_after, Amount::new(100));
    assert_eq!(entry.balance_from_after, None);

    let account = engine.balance(5).await.unwrap();
    assert_eq!(account.balance, Amount::new(100));
}

#[tokio::test]
async fn add_rejects_non_positive_sum_but_still_provisions() {
    let engine = engine_with_db().await;

    let err = engine.add(9, Amount::new(0)).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("sum must be positive".to_string())
    );
    let err = engine.add(9, Amount::new(-25)).await.unwrap_err();
    assert!(err.is_validation());

    // The account was created before validation, as a first reference.
    assert_eq!(engine.balance(9).await.unwrap().balance, Amount::ZERO);
}

#[tokio::test]
async fn withdraw_updates_balance() {
    let engine = engine_with_db().await;

    engine.add(1, Amount::new(100)).await.unwrap();
    let entry = engine.withdraw(1, Amount::new(40)).await.unwrap();

    assert_eq!(entry.operation, OperationKind::Withdraw);
    assert_eq!(entry.balance_after, Amount::new(60));
    assert_eq!(engine.balance(1).await.unwrap().balance, Amount::new(60));
}

#[tokio::test]
async fn withdraw_with_low_funds_is_rejected_distinctly() {
    let engine = engine_with_db().await;

    engine.add(1, Amount::new(50)).await.unwrap();
    let err = engine.withdraw(1, Amount::new(100)).await.unwrap_err();

    assert_eq!(
        err,
        EngineError::InsufficientFunds("you don't have enough funds".to_string())
    );
    assert!(!err.is_validation());
    // The failed withdrawal left the balance untouched.
    assert_eq!(engine.balance(1).await.unwrap().balance, Amount::new(50));
}

#[tokio::test]
async fn withdraw_rejects_non_positive_sum() {
    let engine = engine_with_db().await;

    let err = engine.withdraw(3, Amount::new(-1)).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("sum must be positive".to_string())
    );
}

#[tokio::test]
async fn transfer_moves_funds_and_snapshots_both_balances() {
    let engine = engine_with_db().await;

    engine.add(1, Amount::new(100)).await.unwrap();
    engine.add(2, Amount::new(10)).await.unwrap();

    let entry = engine.transfer(2, 1, Amount::new(100)).await.unwrap();

    assert_eq!(entry.operation, OperationKind::Transfer);
    assert_eq!(entry.user_id, 2);
    assert_eq!(entry.user_from_id, Some(1));
    assert_eq!(entry.balance_after, Amount::new(110));
    assert_eq!(entry.balance_from_after, Some(Amount::ZERO));

    assert_eq!(engine.balance(1).await.unwrap().balance, Amount::ZERO);
    assert_eq!(engine.balance(2).await.unwrap().balance, Amount::new(110));
}

#[tokio::test]
async fn transfer_conserves_value() {
    let engine = engine_with_db().await;

    engine.add(1, Amount::new(700)).await.unwrap();
    engine.add(2, Amount::new(300)).await.unwrap();
    engine.transfer(2, 1, Amount::new(250)).await.unwrap();

    let a = engine.balance(1).await.unwrap().balance;
    let b = engine.balance(2).await.unwrap().balance;
    assert_eq!(a + b, Amount::new(1000));
}

#[tokio::test]
async fn transfer_with_low_funds_is_rejected_and_nothing_moves() {
    let engine = engine_with_db().await;

    engine.add(1, Amount::new(50)).await.unwrap();
    let err = engine.transfer(2, 1, Amount::new(100)).await.unwrap_err();

    assert_eq!(
        err,
        EngineError::InsufficientFunds("user doesn't have enough funds".to_string())
    );
    assert_eq!(engine.balance(1).await.unwrap().balance, Amount::new(50));
    assert_eq!(engine.balance(2).await.unwrap().balance, Amount::ZERO);
}

#[tokio::test]
async fn transfer_to_self_is_rejected() {
    let engine = engine_with_db().await;

    engine.add(1, Amount::new(100)).await.unwrap();
    let err = engine.transfer(1, 1, Amount::new(10)).await.unwrap_err();

    assert!(err.is_validation());
    assert_eq!(engine.balance(1).await.unwrap().balance, Amount::new(100));
}

#[tokio::test]
async fn transfer_rejects_non_positive_sum() {
    let engine = engine_with_db().await;

    let err = engine.transfer(7, 8, Amount::new(0)).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("sum must be positive".to_string())
    );
}

#[tokio::test]
async fn balance_provisions_on_first_read_and_is_idempotent() {
    let engine = engine_with_db().await;

    let first = engine.balance(42).await.unwrap();
    assert_eq!(first.balance, Amount::ZERO);

    let second = engine.balance(42).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn balance_rejects_reserved_user_id() {
    let engine = engine_with_db().await;

    let err = engine.balance(0).await.unwrap_err();
    assert_eq!(err, EngineError::InvalidUser("incorrect user id".to_string()));
}

#[tokio::test]
async fn transactions_for_unknown_user_is_empty_without_provisioning() {
    let db = connect_memory_db().await;
    let engine = Engine::with_database(db.clone());

    let entries = engine
        .transactions(42, None, None, None, false)
        .await
        .unwrap();
    assert!(entries.is_empty());

    // Unlike a balance read, a history read must not create the account.
    let err = SqlBalanceStore::new(db).balance(42).await.unwrap_err();
    assert!(matches!(err, StoreError::AccountNotFound));
}

#[tokio::test]
async fn transactions_rejects_unknown_sort_regardless_of_account_state() {
    let engine = engine_with_db().await;

    // Never-seen user: the sort param is still validated first.
    let err = engine
        .transactions(42, None, None, Some("bogus"), false)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::WrongSortParam("bogus".to_string()));

    engine.add(1, Amount::new(100)).await.unwrap();
    let err = engine
        .transactions(1, None, None, Some("bogus"), true)
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn transactions_rejects_reserved_user_id() {
    let engine = engine_with_db().await;

    let err = engine
        .transactions(0, None, None, None, false)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidUser("incorrect user id".to_string()));
}

#[tokio::test]
async fn transactions_include_entries_where_user_is_source() {
    let engine = engine_with_db().await;

    engine.add(1, Amount::new(500)).await.unwrap();
    engine.transfer(2, 1, Amount::new(200)).await.unwrap();

    let entries = engine
        .transactions(1, None, None, None, false)
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].operation, OperationKind::Transfer);
    assert_eq!(entries[1].user_from_id, Some(1));

    let entries = engine
        .transactions(2, None, None, None, false)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn balance_snapshots_replay_to_current_balance() {
    let engine = engine_with_db().await;

    engine.add(1, Amount::new(1000)).await.unwrap();
    engine.withdraw(1, Amount::new(300)).await.unwrap();
    engine.add(1, Amount::new(50)).await.unwrap();
    engine.transfer(2, 1, Amount::new(250)).await.unwrap();

    let entries = engine
        .transactions(1, None, None, None, false)
        .await
        .unwrap();

    // Walking the append-only sequence, each snapshot must equal the
    // running balance of account 1.
    let mut running = Amount::ZERO;
    for entry in &entries {
        running = match entry.operation {
            OperationKind::Add => running + entry.sum,
            OperationKind::Withdraw => running - entry.sum,
            OperationKind::Transfer => running - entry.sum,
        };
        let snapshot = if entry.user_id == 1 {
            entry.balance_after
        } else {
            entry.balance_from_after.unwrap()
        };
        assert_eq!(snapshot, running);
    }
    assert_eq!(engine.balance(1).await.unwrap().balance, running);
}

struct SeededHistory {
    store: SqlTransactionStore,
    /// `(id, sum_minor, created_at)` of account 1's entries, in insertion
    /// order.
    rows: Vec<(i64, i64, DateTime<Utc>)>,
    t2: DateTime<Utc>,
}

/// Seeds a ledger where account 1 is primary on three entries and source
/// on one, plus an unrelated entry for another account.
async fn seeded_history() -> SeededHistory {
    let db = connect_memory_db().await;
    let balances = SqlBalanceStore::new(db.clone());
    let store = SqlTransactionStore::new(db);

    for user_id in [1, 2, 9] {
        balances.create_account(user_id).await.unwrap();
    }

    let at = |minute: u32| Utc.with_ymd_and_hms(2026, 8, 1, 10, minute, 0).unwrap();
    let (t1, t2, t3, t4) = (at(1), at(2), at(3), at(4));

    let mut rows = Vec::new();

    let entry = store
        .append(NewEntry {
            user_id: 1,
            user_from_id: None,
            operation: OperationKind::Add,
            sum: Amount::new(300),
            created_at: t1,
        })
        .await
        .unwrap();
    rows.push((entry.id, 300, t1));

    // Unrelated account; must never show up in account 1's history.
    store
        .append(NewEntry {
            user_id: 9,
            user_from_id: None,
            operation: OperationKind::Add,
            sum: Amount::new(999),
            created_at: t1,
        })
        .await
        .unwrap();

    let entry = store
        .append(NewEntry {
            user_id: 1,
            user_from_id: None,
            operation: OperationKind::Add,
            sum: Amount::new(100),
            created_at: t2,
        })
        .await
        .unwrap();
    rows.push((entry.id, 100, t2));

    // Account 1 is the source here, which still counts as its history.
    let entry = store
        .append(NewEntry {
            user_id: 2,
            user_from_id: Some(1),
            operation: OperationKind::Transfer,
            sum: Amount::new(50),
            created_at: t3,
        })
        .await
        .unwrap();
    rows.push((entry.id, 50, t3));

    let entry = store
        .append(NewEntry {
            user_id: 1,
            user_from_id: None,
            operation: OperationKind::Withdraw,
            sum: Amount::new(200),
            created_at: t4,
        })
        .await
        .unwrap();
    rows.push((entry.id, 200, t4));

    SeededHistory { store, rows, t2 }
}

/// Reference ordering for [`HistoryQuery`]: filter by `since`
/// (direction-dependent), order by the sort key with id as tie-break,
/// reverse when descending, then cap.
fn expected_ids(rows: &[(i64, i64, DateTime<Utc>)], query: &HistoryQuery) -> Vec<i64> {
    let mut rows: Vec<_> = rows
        .iter()
        .copied()
        .filter(|(_, _, created)| match query.since {
            None => true,
            Some(since) if query.descending => *created <= since,
            Some(since) => *created >= since,
        })
        .collect();

    rows.sort_by(|a, b| match query.sort {
        None => a.0.cmp(&b.0),
        Some(SortField::Date) => a.2.cmp(&b.2).then(a.0.cmp(&b.0)),
        Some(SortField::Sum) => a.1.cmp(&b.1).then(a.0.cmp(&b.0)),
    });
    if query.descending {
        rows.reverse();
    }
    if let Some(limit) = query.limit {
        rows.truncate(limit as usize);
    }

    rows.into_iter().map(|(id, _, _)| id).collect()
}

#[tokio::test]
async fn history_supports_every_filter_sort_combination() {
    let seeded = seeded_history().await;

    for descending in [false, true] {
        for sort in [None, Some(SortField::Date), Some(SortField::Sum)] {
            for limit in [None, Some(2)] {
                for since in [None, Some(seeded.t2)] {
                    let query = HistoryQuery {
                        limit,
                        since,
                        sort,
                        descending,
                    };
                    let got: Vec<i64> = seeded
                        .store
                        .history(1, &query)
                        .await
                        .unwrap()
                        .into_iter()
                        .map(|entry| entry.id)
                        .collect();
                    assert_eq!(
                        got,
                        expected_ids(&seeded.rows, &query),
                        "mismatch for {query:?}"
                    );
                }
            }
        }
    }
}

#[tokio::test]
async fn store_append_is_the_balance_authority() {
    let db = connect_memory_db().await;
    let balances = SqlBalanceStore::new(db.clone());
    let store = SqlTransactionStore::new(db);

    balances.create_account(1).await.unwrap();

    // A debit with no funds is rejected by the store itself, regardless
    // of what a caller projected.
    let err = store
        .append(NewEntry {
            user_id: 1,
            user_from_id: None,
            operation: OperationKind::Withdraw,
            sum: Amount::new(10),
            created_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InsufficientFunds));

    // An append against a missing account is a distinct failure.
    let err = store
        .append(NewEntry {
            user_id: 77,
            user_from_id: None,
            operation: OperationKind::Add,
            sum: Amount::new(10),
            created_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AccountNotFound));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_withdrawals_never_overdraw() {
    let (engine, _path) = engine_with_file_db().await;

    engine.add(1, Amount::new(300)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.withdraw(1, Amount::new(100)).await
        }));
    }

    let mut successes = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(EngineError::InsufficientFunds(_)) => rejected += 1,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    // Balance was exactly 3 * 100: any interleaving must admit exactly
    // three withdrawals.
    assert_eq!(successes, 3);
    assert_eq!(rejected, 5);
    assert_eq!(engine.balance(1).await.unwrap().balance, Amount::ZERO);
}
