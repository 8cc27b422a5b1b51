/// Deactivation tests
///
/// Single-record deactivate / activate and dependency cascades through a
/// has-many association.
/// Run with: cargo test --test deactivation_tests

use chrono::Utc;
use deactivatedb::{
    Association, Column, DEACTIVATED_AT, DataType, Database, Deactivatable, DeactivationOptions,
    DependentAction, ModelDescriptor, Query, Record, RowId,
};

async fn setup() -> Database {
    let db = Database::in_memory();
    db.define_model(ModelDescriptor::builder("deactivatable_items").build())
        .await
        .unwrap();
    db.define_model(
        ModelDescriptor::builder("deactivatable_dependencies")
            .column(Column::new("deactivatable_item_id", DataType::Integer))
            .column(Column::new("status", DataType::Integer))
            .build(),
    )
    .await
    .unwrap();
    db.acts_as_deactivatable("deactivatable_dependencies", DeactivationOptions::new())
        .await
        .unwrap();
    db
}

async fn plain_item(db: &Database) -> Record {
    db.acts_as_deactivatable("deactivatable_items", DeactivationOptions::new())
        .await
        .unwrap();
    db.create(Record::new("deactivatable_items")).await.unwrap()
}

async fn create_item_dependencies(db: &Database, item: &Record) -> Vec<RowId> {
    let mut ids = Vec::new();
    for _ in 0..6 {
        let dependency = db
            .build_associated(item, "deactivatable_dependencies")
            .unwrap();
        ids.push(db.create(dependency).await.unwrap().id().unwrap());
    }
    ids
}

async fn assert_deactivates_and_reactivates_dependencies(
    db: &Database,
    item: &mut Record,
    dependencies: &[RowId],
) {
    item.deactivate(db).await.unwrap();

    for id in dependencies {
        assert!(!db.exists("deactivatable_dependencies", *id).await.unwrap());
    }

    db.remove_deactivated_objects_scope("deactivatable_dependencies", async {
        for id in dependencies {
            let dependency = db.find("deactivatable_dependencies", *id).await.unwrap();
            assert!(dependency.deactivated_at().is_some());
        }
    })
    .await;

    item.activate(db).await.unwrap();

    for id in dependencies {
        assert!(db.exists("deactivatable_dependencies", *id).await.unwrap());
    }
}

// ============================================================================
// An inactive item
// ============================================================================

async fn inactive_item(db: &Database) -> Record {
    db.acts_as_deactivatable("deactivatable_items", DeactivationOptions::new())
        .await
        .unwrap();
    db.create(Record::new("deactivatable_items").with(DEACTIVATED_AT, Utc::now()))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_inactive_item_is_not_returned_on_find() {
    let db = setup().await;
    let item = inactive_item(&db).await;

    assert!(!db.exists("deactivatable_items", item.id().unwrap()).await.unwrap());
}

#[tokio::test]
async fn test_inactive_item_is_findable_in_deactivated_objects_scope() {
    let db = setup().await;
    let item = inactive_item(&db).await;
    let id = item.id().unwrap();

    let found = db
        .with_deactivated_objects_scope("deactivatable_items", db.exists("deactivatable_items", id))
        .await
        .unwrap();
    assert!(found);
}

#[tokio::test]
async fn test_inactive_item_is_deactivated() {
    let db = setup().await;
    let item = inactive_item(&db).await;

    assert!(item.is_deactivated());
}

#[tokio::test]
async fn test_inactive_item_is_findable_when_activated() {
    let db = setup().await;
    let mut item = inactive_item(&db).await;

    item.activate(&db).await.unwrap();

    assert!(!item.is_deactivated());
    assert!(db.exists("deactivatable_items", item.id().unwrap()).await.unwrap());
}

// ============================================================================
// An active item
// ============================================================================

#[tokio::test]
async fn test_active_item_has_null_deactivated_at() {
    let db = setup().await;
    let item = plain_item(&db).await;

    assert_eq!(item.deactivated_at(), None);
    assert!(db.exists("deactivatable_items", item.id().unwrap()).await.unwrap());
}

#[tokio::test]
async fn test_deactivate_sets_deactivated_at() {
    let db = setup().await;
    let mut item = plain_item(&db).await;

    let before = Utc::now();
    item.deactivate(&db).await.unwrap();

    let at = item.deactivated_at().unwrap();
    assert!(at >= before);
    assert!(!item.has_changes());
}

#[tokio::test]
async fn test_deactivated_item_is_not_findable() {
    let db = setup().await;
    let mut item = plain_item(&db).await;
    let id = item.id().unwrap();

    db.deactivate(&mut item).await.unwrap();

    assert!(!db.exists("deactivatable_items", id).await.unwrap());
    assert!(matches!(
        db.find("deactivatable_items", id).await,
        Err(deactivatedb::DbError::RecordNotFound { .. })
    ));
}

#[tokio::test]
async fn test_explicit_dependencies_cascade() {
    let db = setup().await;
    db.declare_association(
        "deactivatable_items",
        Association::has_many(
            "deactivatable_dependencies",
            "deactivatable_dependencies",
            "deactivatable_item_id",
        ),
    )
    .unwrap();
    db.acts_as_deactivatable(
        "deactivatable_items",
        DeactivationOptions::new().dependency("deactivatable_dependencies"),
    )
    .await
    .unwrap();

    let mut item = db.create(Record::new("deactivatable_items")).await.unwrap();
    let dependencies = create_item_dependencies(&db, &item).await;

    assert_deactivates_and_reactivates_dependencies(&db, &mut item, &dependencies).await;
}

#[tokio::test]
async fn test_auto_configured_destroy_dependencies_cascade() {
    let db = setup().await;
    db.declare_association(
        "deactivatable_items",
        Association::has_many(
            "deactivatable_dependencies",
            "deactivatable_dependencies",
            "deactivatable_item_id",
        )
        .dependent(DependentAction::Destroy),
    )
    .unwrap();
    db.acts_as_deactivatable(
        "deactivatable_items",
        DeactivationOptions::new().auto_configure_dependencies(true),
    )
    .await
    .unwrap();

    let mut item = db.create(Record::new("deactivatable_items")).await.unwrap();
    let dependencies = create_item_dependencies(&db, &item).await;

    assert_deactivates_and_reactivates_dependencies(&db, &mut item, &dependencies).await;
}

#[tokio::test]
async fn test_auto_configured_delete_all_dependencies_cascade() {
    let db = setup().await;
    db.declare_association(
        "deactivatable_items",
        Association::has_many(
            "deactivatable_dependencies",
            "deactivatable_dependencies",
            "deactivatable_item_id",
        )
        .dependent(DependentAction::DeleteAll),
    )
    .unwrap();
    db.acts_as_deactivatable(
        "deactivatable_items",
        DeactivationOptions::new().auto_configure_dependencies(true),
    )
    .await
    .unwrap();

    let mut item = db.create(Record::new("deactivatable_items")).await.unwrap();
    let dependencies = create_item_dependencies(&db, &item).await;

    assert_deactivates_and_reactivates_dependencies(&db, &mut item, &dependencies).await;
}

#[tokio::test]
async fn test_deactivated_dependencies_drop_out_of_association() {
    let db = setup().await;
    db.declare_association(
        "deactivatable_items",
        Association::has_many(
            "deactivatable_dependencies",
            "deactivatable_dependencies",
            "deactivatable_item_id",
        ),
    )
    .unwrap();
    db.acts_as_deactivatable(
        "deactivatable_items",
        DeactivationOptions::new().dependency("deactivatable_dependencies"),
    )
    .await
    .unwrap();

    let mut item = db.create(Record::new("deactivatable_items")).await.unwrap();
    create_item_dependencies(&db, &item).await;
    assert_eq!(
        db.associated(&item, "deactivatable_dependencies")
            .await
            .unwrap()
            .len(),
        6
    );

    item.deactivate(&db).await.unwrap();

    // The owner is still in memory, so the association can be walked.
    assert!(
        db.associated(&item, "deactivatable_dependencies")
            .await
            .unwrap()
            .is_empty()
    );
    let inactive = db
        .with_deactivated_objects_scope(
            "deactivatable_dependencies",
            db.associated(&item, "deactivatable_dependencies"),
        )
        .await
        .unwrap();
    assert_eq!(inactive.len(), 6);
}

#[tokio::test]
async fn test_cascade_shares_one_timestamp() {
    let db = setup().await;
    db.declare_association(
        "deactivatable_items",
        Association::has_many(
            "deactivatable_dependencies",
            "deactivatable_dependencies",
            "deactivatable_item_id",
        ),
    )
    .unwrap();
    db.acts_as_deactivatable(
        "deactivatable_items",
        DeactivationOptions::new().dependency("deactivatable_dependencies"),
    )
    .await
    .unwrap();

    let mut item = db.create(Record::new("deactivatable_items")).await.unwrap();
    create_item_dependencies(&db, &item).await;
    item.deactivate(&db).await.unwrap();

    let dependencies = db
        .all(&Query::new("deactivatable_dependencies").unscope_deactivated())
        .await
        .unwrap();
    assert_eq!(dependencies.len(), 6);
    for dependency in dependencies {
        assert_eq!(dependency.deactivated_at(), item.deactivated_at());
    }
}
