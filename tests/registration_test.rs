/// Integration tests for registration and login credential checks.
mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use sharehub::web::login::verify_credentials;
use sharehub::web::register::{insert_new_user, uniqueness_errors};

#[actix_rt::test]
#[serial]
async fn test_verify_credentials() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "alice", false)
        .await
        .expect("Failed to create user");

    let ok = verify_credentials("alice", "password123")
        .await
        .expect("lookup should not fail");
    assert_eq!(ok.map(|u| u.id), Some(user.id));

    let wrong_password = verify_credentials("alice", "not-the-password")
        .await
        .expect("lookup should not fail");
    assert!(wrong_password.is_none());

    let unknown_user = verify_credentials("nobody", "password123")
        .await
        .expect("lookup should not fail");
    assert!(unknown_user.is_none());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_duplicate_username_and_email_are_reported() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    create_test_user(&db, "alice", false)
        .await
        .expect("Failed to create user");

    let errors = uniqueness_errors("alice", "fresh@test.com")
        .await
        .expect("check should not fail");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("username"));

    let errors = uniqueness_errors("fresh", "alice@test.com")
        .await
        .expect("check should not fail");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("email"));

    let errors = uniqueness_errors("fresh", "fresh@test.com")
        .await
        .expect("check should not fail");
    assert!(errors.is_empty());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_unique_constraint_backstops_concurrent_registration() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    insert_new_user("bob", "bob@test.com", "not-a-real-hash")
        .await
        .expect("first insert succeeds");

    let duplicate = insert_new_user("bob", "bob2@test.com", "not-a-real-hash").await;
    assert!(duplicate.is_err(), "duplicate username hits the constraint");

    let duplicate = insert_new_user("bob2", "bob@test.com", "not-a-real-hash").await;
    assert!(duplicate.is_err(), "duplicate email hits the constraint");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
