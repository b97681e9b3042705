/// Integration tests for the email outbox: transactional enqueue, mock-mode
/// delivery, and the failed-row requeue.
mod common;
use serial_test::serial;

use common::database::*;
use sea_orm::{entity::*, query::*, TransactionTrait};
use sharehub::orm::email_outbox::{self, OutboxStatus};
use sharehub::outbox;

fn enable_mock_smtp() {
    std::env::set_var("SMTP_MOCK", "true");
}

#[actix_rt::test]
#[serial]
async fn test_enqueue_joins_the_callers_transaction() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    // Rolled-back transaction leaves no row behind.
    let txn = db.begin().await.expect("begin");
    outbox::enqueue(
        &txn,
        "donor@test.com",
        "Subject".to_string(),
        "Body".to_string(),
    )
    .await
    .expect("enqueue");
    txn.rollback().await.expect("rollback");

    let rows = email_outbox::Entity::find().all(&db).await.expect("fetch");
    assert!(rows.is_empty(), "rollback discards the queued email");

    // Committed transaction persists it as pending.
    let txn = db.begin().await.expect("begin");
    outbox::enqueue(
        &txn,
        "donor@test.com",
        "Subject".to_string(),
        "Body".to_string(),
    )
    .await
    .expect("enqueue");
    txn.commit().await.expect("commit");

    let rows = email_outbox::Entity::find().all(&db).await.expect("fetch");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, OutboxStatus::Pending);
    assert_eq!(rows[0].attempts, 0);
    assert!(rows[0].sent_at.is_none());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_deliver_pending_marks_rows_sent() {
    enable_mock_smtp();
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let txn = db.begin().await.expect("begin");
    for i in 0..3 {
        outbox::enqueue(
            &txn,
            &format!("user{}@test.com", i),
            format!("Subject {}", i),
            "Body".to_string(),
        )
        .await
        .expect("enqueue");
    }
    txn.commit().await.expect("commit");

    let sent = outbox::deliver_pending(&db).await.expect("delivery pass");
    assert_eq!(sent, 3);

    let rows = email_outbox::Entity::find().all(&db).await.expect("fetch");
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.status, OutboxStatus::Sent);
        assert!(row.sent_at.is_some());
    }

    // A second pass has nothing left to do.
    let sent = outbox::deliver_pending(&db).await.expect("delivery pass");
    assert_eq!(sent, 0);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_retry_failed_requeues_rows() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    email_outbox::ActiveModel {
        recipient: Set("user@test.com".to_string()),
        subject: Set("Subject".to_string()),
        body: Set("Body".to_string()),
        status: Set(OutboxStatus::Failed),
        attempts: Set(outbox::MAX_ATTEMPTS),
        last_error: Set(Some("connection refused".to_string())),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect("insert failed row");

    let requeued = outbox::retry_failed(&db).await.expect("retry");
    assert_eq!(requeued, 1);

    let rows = email_outbox::Entity::find()
        .filter(email_outbox::Column::Status.eq(OutboxStatus::Pending))
        .all(&db)
        .await
        .expect("fetch");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].attempts, 0);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
