//! Test fixtures for creating test data
#![allow(dead_code)]
#![allow(clippy::needless_update)]

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};
use sharehub::orm::{
    categories,
    donations::{self, DonationStatus},
    matches::{self, MatchStatus},
    requests::{self, RequestStatus, Urgency},
    users,
};

/// Create a test user with a known password ("password123").
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    is_admin: bool,
) -> Result<users::Model, DbErr> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = sharehub::session::get_argon2()
        .hash_password("password123".as_bytes(), &salt)
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?
        .to_string();

    users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@test.com", username)),
        password: Set(password_hash),
        is_admin: Set(is_admin),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
) -> Result<categories::Model, DbErr> {
    categories::ActiveModel {
        name: Set(name.to_string()),
        description: Set(Some(format!("{} test items", name))),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create a donation in the given lifecycle state. Timestamps are filled in
/// to keep the status/timestamp invariants intact.
pub async fn create_test_donation(
    db: &DatabaseConnection,
    donor_id: i32,
    category_id: i32,
    title: &str,
    description: &str,
    status: DonationStatus,
) -> Result<donations::Model, DbErr> {
    let now = Utc::now().naive_utc();

    let approved_at = match status {
        DonationStatus::Approved | DonationStatus::Donated => Some(now),
        DonationStatus::Pending | DonationStatus::Rejected => None,
    };
    let donated_at = match status {
        DonationStatus::Donated => Some(now),
        _ => None,
    };

    donations::ActiveModel {
        title: Set(title.to_string()),
        description: Set(description.to_string()),
        status: Set(status),
        created_at: Set(now),
        approved_at: Set(approved_at),
        donated_at: Set(donated_at),
        thank_you_sent: Set(false),
        donor_id: Set(donor_id),
        category_id: Set(category_id),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Pin an approved donation's approval timestamp, for date-range filters.
pub async fn set_approved_at(
    db: &DatabaseConnection,
    donation_id: i32,
    approved_at: NaiveDateTime,
) -> Result<(), DbErr> {
    let donation = donations::Entity::find_by_id(donation_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::Custom("donation fixture missing".to_string()))?;

    let mut update: donations::ActiveModel = donation.into();
    update.approved_at = Set(Some(approved_at));
    update.update(db).await?;
    Ok(())
}

/// Attach a photo filename to a donation.
pub async fn set_photo(
    db: &DatabaseConnection,
    donation_id: i32,
    filename: &str,
) -> Result<(), DbErr> {
    let donation = donations::Entity::find_by_id(donation_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::Custom("donation fixture missing".to_string()))?;

    let mut update: donations::ActiveModel = donation.into();
    update.photo_filename = Set(Some(filename.to_string()));
    update.update(db).await?;
    Ok(())
}

/// Mark a donation's thank-you flag as already claimed.
pub async fn set_thank_you_sent(
    db: &DatabaseConnection,
    donation_id: i32,
) -> Result<(), DbErr> {
    let donation = donations::Entity::find_by_id(donation_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::Custom("donation fixture missing".to_string()))?;

    let mut update: donations::ActiveModel = donation.into();
    update.thank_you_sent = Set(true);
    update.update(db).await?;
    Ok(())
}

pub async fn create_test_request(
    db: &DatabaseConnection,
    requester_id: i32,
    category_id: i32,
    title: &str,
    urgency: Urgency,
    status: RequestStatus,
) -> Result<requests::Model, DbErr> {
    let now = Utc::now().naive_utc();

    let fulfilled_at = match status {
        RequestStatus::Fulfilled => Some(now),
        _ => None,
    };

    requests::ActiveModel {
        title: Set(title.to_string()),
        description: Set(format!("{} needed", title)),
        urgency: Set(urgency),
        status: Set(status),
        created_at: Set(now),
        fulfilled_at: Set(fulfilled_at),
        requester_id: Set(requester_id),
        category_id: Set(category_id),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Insert a match row directly, bypassing the lifecycle checks.
pub async fn create_test_match(
    db: &DatabaseConnection,
    donation_id: i32,
    request_id: i32,
    matched_by_id: i32,
) -> Result<matches::Model, DbErr> {
    matches::ActiveModel {
        status: Set(MatchStatus::Approved),
        notes: Set(None),
        created_at: Set(Utc::now().naive_utc()),
        donation_id: Set(donation_id),
        request_id: Set(request_id),
        matched_by_id: Set(matched_by_id),
        ..Default::default()
    }
    .insert(db)
    .await
}
