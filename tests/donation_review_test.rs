/// Integration tests for the donation review lifecycle
/// Covers status transitions, timestamp invariants, the donor notification,
/// and the admin alerts for candidate requests.
mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use sea_orm::{entity::*, query::*};
use sharehub::matching::{self, ReviewDecision, ReviewError};
use sharehub::orm::{
    donations::DonationStatus,
    notifications,
    requests::{RequestStatus, Urgency},
};

#[actix_rt::test]
#[serial]
async fn test_approve_sets_status_timestamps_and_reviewer() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin = create_test_user(&db, "admin1", true).await.expect("admin");
    let donor = create_test_user(&db, "donor1", false).await.expect("donor");
    let category = create_test_category(&db, "Clothing").await.expect("category");

    let donation = create_test_donation(
        &db,
        donor.id,
        category.id,
        "Winter coat",
        "Barely worn",
        DonationStatus::Pending,
    )
    .await
    .expect("donation");

    let reviewed =
        matching::review_donation(&db, donation.id, ReviewDecision::Approved, admin.id)
            .await
            .expect("review should succeed");

    assert_eq!(reviewed.status, DonationStatus::Approved);
    assert!(reviewed.approved_at.is_some(), "approved_at must be set");
    assert!(reviewed.donated_at.is_none(), "donated_at only when donated");
    assert_eq!(reviewed.approved_by_id, Some(admin.id));

    // Donor got exactly one success notification.
    let donor_notifications = notifications::Entity::find()
        .filter(notifications::Column::UserId.eq(donor.id))
        .all(&db)
        .await
        .expect("fetch notifications");

    assert_eq!(donor_notifications.len(), 1);
    assert_eq!(
        donor_notifications[0].kind,
        notifications::NotificationKind::Success
    );
    assert!(donor_notifications[0].message.contains("Winter coat"));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_reject_leaves_approval_timestamp_unset() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin = create_test_user(&db, "admin1", true).await.expect("admin");
    let donor = create_test_user(&db, "donor1", false).await.expect("donor");
    let category = create_test_category(&db, "Clothing").await.expect("category");

    let donation = create_test_donation(
        &db,
        donor.id,
        category.id,
        "Broken toaster",
        "Sparks a bit",
        DonationStatus::Pending,
    )
    .await
    .expect("donation");

    let reviewed =
        matching::review_donation(&db, donation.id, ReviewDecision::Rejected, admin.id)
            .await
            .expect("review should succeed");

    assert_eq!(reviewed.status, DonationStatus::Rejected);
    assert!(reviewed.approved_at.is_none());
    assert_eq!(reviewed.approved_by_id, Some(admin.id));

    let donor_notifications = notifications::Entity::find()
        .filter(notifications::Column::UserId.eq(donor.id))
        .all(&db)
        .await
        .expect("fetch notifications");

    assert_eq!(donor_notifications.len(), 1);
    assert_eq!(
        donor_notifications[0].kind,
        notifications::NotificationKind::Warning
    );

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_review_is_single_shot() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin = create_test_user(&db, "admin1", true).await.expect("admin");
    let donor = create_test_user(&db, "donor1", false).await.expect("donor");
    let category = create_test_category(&db, "Clothing").await.expect("category");

    let donation = create_test_donation(
        &db,
        donor.id,
        category.id,
        "Winter coat",
        "Barely worn",
        DonationStatus::Pending,
    )
    .await
    .expect("donation");

    matching::review_donation(&db, donation.id, ReviewDecision::Approved, admin.id)
        .await
        .expect("first review succeeds");

    let second =
        matching::review_donation(&db, donation.id, ReviewDecision::Rejected, admin.id).await;

    match second {
        Err(ReviewError::NotPending(DonationStatus::Approved)) => {}
        other => panic!("expected NotPending(Approved), got {:?}", other.map(|d| d.status)),
    }

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_approval_alerts_every_admin_per_candidate_request() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin1 = create_test_user(&db, "admin1", true).await.expect("admin1");
    let admin2 = create_test_user(&db, "admin2", true).await.expect("admin2");
    let donor = create_test_user(&db, "donor1", false).await.expect("donor");
    let requester = create_test_user(&db, "requester1", false)
        .await
        .expect("requester");

    let clothing = create_test_category(&db, "Clothing").await.expect("category");
    let books = create_test_category(&db, "Books & Media").await.expect("category");

    // Exactly one active request in the donation's category; requests in
    // other categories or other states must not produce alerts.
    create_test_request(
        &db,
        requester.id,
        clothing.id,
        "Warm jacket",
        Urgency::High,
        RequestStatus::Active,
    )
    .await
    .expect("active request");
    create_test_request(
        &db,
        requester.id,
        books.id,
        "Textbooks",
        Urgency::Normal,
        RequestStatus::Active,
    )
    .await
    .expect("other-category request");
    create_test_request(
        &db,
        requester.id,
        clothing.id,
        "Old scarf",
        Urgency::Low,
        RequestStatus::Cancelled,
    )
    .await
    .expect("cancelled request");

    let donation = create_test_donation(
        &db,
        donor.id,
        clothing.id,
        "Winter coat",
        "Barely worn",
        DonationStatus::Pending,
    )
    .await
    .expect("donation");

    matching::review_donation(&db, donation.id, ReviewDecision::Approved, admin1.id)
        .await
        .expect("review should succeed");

    // One candidate request x two admins = two match alerts, each naming
    // the request.
    for admin_id in [admin1.id, admin2.id] {
        let alerts = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(admin_id))
            .filter(notifications::Column::Title.eq("Potential Match Found"))
            .all(&db)
            .await
            .expect("fetch alerts");

        assert_eq!(alerts.len(), 1, "one alert per admin");
        assert!(alerts[0].message.contains("Warm jacket"));
        assert!(alerts[0].message.contains("Winter coat"));
    }

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
