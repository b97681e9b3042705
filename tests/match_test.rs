/// Integration tests for match creation
/// Covers the happy path, the duplicate-pair guard, state guards, and the
/// one-shot thank-you email claim.
mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use sea_orm::{entity::*, query::*};
use sharehub::matching::{self, MatchError};
use sharehub::orm::{
    donations::{self, DonationStatus},
    email_outbox::{self, OutboxStatus},
    matches,
    matches::MatchStatus,
    requests::{self, RequestStatus, Urgency},
};

async fn outbox_count(db: &sea_orm::DatabaseConnection, subject_contains: &str) -> usize {
    email_outbox::Entity::find()
        .all(db)
        .await
        .expect("fetch outbox")
        .into_iter()
        .filter(|row| row.subject.contains(subject_contains))
        .count()
}

#[actix_rt::test]
#[serial]
async fn test_create_match_updates_both_sides_and_queues_emails() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin = create_test_user(&db, "admin1", true).await.expect("admin");
    let donor = create_test_user(&db, "donor1", false).await.expect("donor");
    let requester = create_test_user(&db, "requester1", false)
        .await
        .expect("requester");
    let category = create_test_category(&db, "Clothing").await.expect("category");

    let donation = create_test_donation(
        &db,
        donor.id,
        category.id,
        "Winter coat",
        "Barely worn",
        DonationStatus::Approved,
    )
    .await
    .expect("donation");

    let request = create_test_request(
        &db,
        requester.id,
        category.id,
        "Warm jacket",
        Urgency::High,
        RequestStatus::Active,
    )
    .await
    .expect("request");

    let created = matching::create_match(&db, donation.id, request.id, admin.id, None)
        .await
        .expect("match should be created");

    assert_eq!(created.status, MatchStatus::Approved);
    assert_eq!(created.donation_id, donation.id);
    assert_eq!(created.request_id, request.id);
    assert_eq!(created.matched_by_id, admin.id);

    let donation = donations::Entity::find_by_id(donation.id)
        .one(&db)
        .await
        .expect("fetch donation")
        .expect("donation exists");
    assert_eq!(donation.status, DonationStatus::Donated);
    assert!(donation.donated_at.is_some(), "donated_at iff donated");
    assert!(donation.approved_at.is_some(), "approval timestamp survives");
    assert!(donation.thank_you_sent, "thank-you flag claimed");

    let request = requests::Entity::find_by_id(request.id)
        .one(&db)
        .await
        .expect("fetch request")
        .expect("request exists");
    assert_eq!(request.status, RequestStatus::Fulfilled);
    assert!(request.fulfilled_at.is_some(), "fulfilled_at iff fulfilled");

    // Donor match email, requester match email, and the one thank-you.
    assert_eq!(outbox_count(&db, "has been matched").await, 1);
    assert_eq!(outbox_count(&db, "has been fulfilled").await, 1);
    assert_eq!(outbox_count(&db, "Thank you for your donation").await, 1);

    let pending = email_outbox::Entity::find()
        .filter(email_outbox::Column::Status.eq(OutboxStatus::Pending))
        .all(&db)
        .await
        .expect("fetch outbox");
    assert_eq!(pending.len(), 3, "all emails await the delivery task");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_duplicate_pair_is_rejected_without_a_new_row() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin = create_test_user(&db, "admin1", true).await.expect("admin");
    let donor = create_test_user(&db, "donor1", false).await.expect("donor");
    let requester = create_test_user(&db, "requester1", false)
        .await
        .expect("requester");
    let category = create_test_category(&db, "Clothing").await.expect("category");

    let donation = create_test_donation(
        &db,
        donor.id,
        category.id,
        "Winter coat",
        "Barely worn",
        DonationStatus::Approved,
    )
    .await
    .expect("donation");
    let request = create_test_request(
        &db,
        requester.id,
        category.id,
        "Warm jacket",
        Urgency::High,
        RequestStatus::Active,
    )
    .await
    .expect("request");

    // A match row already exists for the pair while the donation is still
    // approved; the unique constraint must reject the second insert.
    create_test_match(&db, donation.id, request.id, admin.id)
        .await
        .expect("seed match");

    let result = matching::create_match(&db, donation.id, request.id, admin.id, None).await;
    assert!(
        matches!(result, Err(MatchError::AlreadyMatched)),
        "duplicate pair must be rejected"
    );

    let rows = matches::Entity::find()
        .all(&db)
        .await
        .expect("fetch matches");
    assert_eq!(rows.len(), 1, "no new row inserted");

    // The failed attempt rolled back entirely: no status flip, no emails.
    let donation = donations::Entity::find_by_id(donation.id)
        .one(&db)
        .await
        .expect("fetch donation")
        .expect("donation exists");
    assert_eq!(donation.status, DonationStatus::Approved);

    let outbox = email_outbox::Entity::find().all(&db).await.expect("outbox");
    assert!(outbox.is_empty(), "rolled-back match queued no email");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_only_approved_donations_and_active_requests_match() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin = create_test_user(&db, "admin1", true).await.expect("admin");
    let donor = create_test_user(&db, "donor1", false).await.expect("donor");
    let requester = create_test_user(&db, "requester1", false)
        .await
        .expect("requester");
    let category = create_test_category(&db, "Clothing").await.expect("category");

    let pending = create_test_donation(
        &db,
        donor.id,
        category.id,
        "Unreviewed lamp",
        "Still pending",
        DonationStatus::Pending,
    )
    .await
    .expect("pending donation");
    let active = create_test_request(
        &db,
        requester.id,
        category.id,
        "Desk lamp",
        Urgency::Normal,
        RequestStatus::Active,
    )
    .await
    .expect("active request");

    let result = matching::create_match(&db, pending.id, active.id, admin.id, None).await;
    assert!(matches!(
        result,
        Err(MatchError::DonationNotAvailable(DonationStatus::Pending))
    ));

    let approved = create_test_donation(
        &db,
        donor.id,
        category.id,
        "Desk lamp",
        "Works fine",
        DonationStatus::Approved,
    )
    .await
    .expect("approved donation");
    let cancelled = create_test_request(
        &db,
        requester.id,
        category.id,
        "Old request",
        Urgency::Low,
        RequestStatus::Cancelled,
    )
    .await
    .expect("cancelled request");

    let result = matching::create_match(&db, approved.id, cancelled.id, admin.id, None).await;
    assert!(matches!(
        result,
        Err(MatchError::RequestNotActive(RequestStatus::Cancelled))
    ));

    assert!(matches::Entity::find()
        .all(&db)
        .await
        .expect("fetch matches")
        .is_empty());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_thank_you_is_enqueued_at_most_once() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin = create_test_user(&db, "admin1", true).await.expect("admin");
    let donor = create_test_user(&db, "donor1", false).await.expect("donor");
    let requester = create_test_user(&db, "requester1", false)
        .await
        .expect("requester");
    let category = create_test_category(&db, "Clothing").await.expect("category");

    // The flag was already claimed (e.g. by an earlier retried action), so
    // this match must not queue a second thank-you.
    let donation = create_test_donation(
        &db,
        donor.id,
        category.id,
        "Winter coat",
        "Barely worn",
        DonationStatus::Approved,
    )
    .await
    .expect("donation");
    set_thank_you_sent(&db, donation.id).await.expect("claim flag");

    let request = create_test_request(
        &db,
        requester.id,
        category.id,
        "Warm jacket",
        Urgency::High,
        RequestStatus::Active,
    )
    .await
    .expect("request");

    matching::create_match(&db, donation.id, request.id, admin.id, None)
        .await
        .expect("match should be created");

    assert_eq!(
        outbox_count(&db, "Thank you for your donation").await,
        0,
        "claimed flag suppresses the thank-you email"
    );
    // The match emails themselves still go out.
    assert_eq!(outbox_count(&db, "has been matched").await, 1);
    assert_eq!(outbox_count(&db, "has been fulfilled").await, 1);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
