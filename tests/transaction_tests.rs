/// Transaction tests
///
/// Tests for begin / commit / rollback through the database facade
/// Run with: cargo test --test transaction_tests

use deactivatedb::{
    Column, DataType, Database, DbError, DeactivationOptions, ModelDescriptor, Query, Record,
    SaveMode, Value,
};

async fn setup() -> Database {
    let db = Database::in_memory();
    db.define_model(
        ModelDescriptor::builder("accounts")
            .column(Column::new("balance", DataType::Float))
            .build(),
    )
    .await
    .unwrap();
    db.acts_as_deactivatable("accounts", DeactivationOptions::new())
        .await
        .unwrap();
    db
}

fn account(balance: f64) -> Record {
    Record::new("accounts").with("balance", balance)
}

#[tokio::test]
async fn test_transaction_begin_commit() {
    let db = setup().await;

    let mut txn = db.begin().await;
    txn.save(&mut account(1000.0), SaveMode::Validate).unwrap();
    txn.save(&mut account(500.0), SaveMode::Validate).unwrap();
    assert_eq!(txn.changes().len(), 2);

    // Not visible outside the transaction until commit
    assert_eq!(db.count(&Query::new("accounts")).await.unwrap(), 0);

    txn.commit().await.unwrap();
    assert_eq!(db.count(&Query::new("accounts")).await.unwrap(), 2);
}

#[tokio::test]
async fn test_transaction_begin_rollback() {
    let db = setup().await;

    let mut txn = db.begin().await;
    txn.save(&mut account(1.0), SaveMode::Validate).unwrap();
    txn.rollback().unwrap();

    assert_eq!(db.count(&Query::new("accounts")).await.unwrap(), 0);
    assert_eq!(db.transaction_stats().aborted, 1);
}

#[tokio::test]
async fn test_transaction_auto_rollback_on_drop() {
    let db = setup().await;

    {
        let mut txn = db.begin().await;
        txn.save(&mut account(1.0), SaveMode::Validate).unwrap();
        // Dropped here without commit
    }

    assert_eq!(db.count(&Query::new("accounts")).await.unwrap(), 0);
    assert_eq!(db.transaction_stats().aborted, 1);
}

#[tokio::test]
async fn test_transaction_rollback_preserves_previous_state() {
    let db = setup().await;
    let mut existing = db.create(account(100.0)).await.unwrap();

    let mut txn = db.begin().await;
    existing.set("balance", 200.0);
    txn.save(&mut existing, SaveMode::Validate).unwrap();
    txn.save(&mut account(300.0), SaveMode::Validate).unwrap();
    txn.rollback().unwrap();

    let stored = db.find("accounts", existing.id().unwrap()).await.unwrap();
    assert_eq!(stored.get("balance"), &Value::Float(100.0));
    assert_eq!(db.count(&Query::new("accounts")).await.unwrap(), 1);
}

#[tokio::test]
async fn test_transaction_isolation_between_transactions() {
    let db = setup().await;

    let mut writer = db.begin().await;
    writer.save(&mut account(1.0), SaveMode::Validate).unwrap();

    let reader = db.begin().await;
    assert_eq!(reader.count(&Query::new("accounts")).unwrap(), 0);

    writer.commit().await.unwrap();

    // The reader keeps its snapshot
    assert_eq!(reader.count(&Query::new("accounts")).unwrap(), 0);
    assert_eq!(db.count(&Query::new("accounts")).await.unwrap(), 1);
}

#[tokio::test]
async fn test_transaction_write_conflict() {
    let db = setup().await;
    let mut existing = db.create(account(100.0)).await.unwrap();

    let mut first = db.begin().await;
    let mut second = db.begin().await;

    existing.set("balance", 150.0);
    first.save(&mut existing.clone(), SaveMode::Validate).unwrap();
    second.save(&mut existing, SaveMode::Validate).unwrap();

    first.commit().await.unwrap();
    let err = second.commit().await.unwrap_err();
    assert!(matches!(err, DbError::WriteConflict(_)));

    let stats = db.transaction_stats();
    assert_eq!(stats.aborted, 1);
}

#[tokio::test]
async fn test_transactions_on_different_rows_both_commit() {
    let db = setup().await;
    let mut left = db.create(account(100.0)).await.unwrap();
    let mut right = db.create(account(200.0)).await.unwrap();

    let mut first = db.begin().await;
    let mut second = db.begin().await;

    left.set("balance", 110.0);
    right.set("balance", 220.0);
    first.save(&mut left, SaveMode::Validate).unwrap();
    second.save(&mut right, SaveMode::Validate).unwrap();

    first.commit().await.unwrap();
    second.commit().await.unwrap();

    let stored = db.find("accounts", left.id().unwrap()).await.unwrap();
    assert_eq!(stored.get("balance"), &Value::Float(110.0));
    let stored = db.find("accounts", right.id().unwrap()).await.unwrap();
    assert_eq!(stored.get("balance"), &Value::Float(220.0));
    assert_eq!(db.transaction_stats().aborted, 0);
}

#[tokio::test]
async fn test_concurrent_inserts_get_distinct_ids() {
    let db = setup().await;

    let mut first = db.begin().await;
    let mut second = db.begin().await;
    let mut a = account(1.0);
    let mut b = account(2.0);
    first.save(&mut a, SaveMode::Validate).unwrap();
    second.save(&mut b, SaveMode::Validate).unwrap();
    assert_ne!(a.id(), b.id());

    first.commit().await.unwrap();
    second.commit().await.unwrap();
    assert_eq!(db.count(&Query::new("accounts")).await.unwrap(), 2);
}

#[tokio::test]
async fn test_transaction_validation_uses_schema() {
    let db = setup().await;

    let mut txn = db.begin().await;
    let err = txn
        .save(
            &mut Record::new("accounts").with("balance", "lots"),
            SaveMode::Validate,
        )
        .unwrap_err();
    assert!(matches!(err, DbError::TypeMismatch(_)));

    let err = txn
        .save(&mut Record::new("accounts").with("owner", "ann"), SaveMode::Validate)
        .unwrap_err();
    assert!(matches!(err, DbError::ColumnNotFound(..)));

    assert!(txn.changes().is_empty());
}

#[tokio::test]
async fn test_transaction_find_missing_record() {
    let db = setup().await;
    let txn = db.begin().await;

    assert!(matches!(
        txn.find("accounts", 7),
        Err(DbError::RecordNotFound { id: 7, .. })
    ));
    assert!(matches!(
        txn.all(&Query::new("ledgers")),
        Err(DbError::ModelNotFound(_))
    ));
}
