//! Notification dispatcher for lifecycle events
//!
//! Fan-out helpers that turn a domain event into notification rows. All of
//! them run on the caller's connection so they can join the transaction of
//! the state change they announce.

use crate::notifications::create_notification;
use crate::orm::notifications::NotificationKind;
use crate::orm::users;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};

/// All admin user ids.
pub async fn admin_user_ids<'a, C: ConnectionTrait>(db: &'a C) -> Result<Vec<i32>, DbErr> {
    let admins = users::Entity::find()
        .filter(users::Column::IsAdmin.eq(true))
        .all(db)
        .await?;

    Ok(admins.into_iter().map(|u| u.id).collect())
}

/// Insert one info notification per admin.
pub async fn notify_admins<'a, C: ConnectionTrait>(
    db: &'a C,
    title: &str,
    message: &str,
) -> Result<usize, DbErr> {
    let admins = admin_user_ids(db).await?;
    let count = admins.len();

    for admin_id in admins {
        create_notification(
            db,
            admin_id,
            NotificationKind::Info,
            title.to_owned(),
            message.to_owned(),
        )
        .await?;
    }

    Ok(count)
}

/// Tell every admin a new donation is waiting for review.
pub async fn notify_donation_submitted<'a, C: ConnectionTrait>(
    db: &'a C,
    donation_title: &str,
    donor_name: &str,
) -> Result<usize, DbErr> {
    notify_admins(
        db,
        "New Donation Submitted",
        &format!("New donation \"{}\" by {}", donation_title, donor_name),
    )
    .await
}

/// Tell every admin a new request has been posted.
pub async fn notify_request_submitted<'a, C: ConnectionTrait>(
    db: &'a C,
    request_title: &str,
    requester_name: &str,
) -> Result<usize, DbErr> {
    notify_admins(
        db,
        "New Item Request",
        &format!("New request \"{}\" by {}", request_title, requester_name),
    )
    .await
}

/// Tell the donor their donation was reviewed.
pub async fn notify_donation_reviewed<'a, C: ConnectionTrait>(
    db: &'a C,
    donor_id: i32,
    donation_title: &str,
    approved: bool,
) -> Result<i32, DbErr> {
    let (kind, verdict) = if approved {
        (NotificationKind::Success, "approved")
    } else {
        (NotificationKind::Warning, "rejected")
    };

    create_notification(
        db,
        donor_id,
        kind,
        format!("Donation {}", capitalize(verdict)),
        format!(
            "Your donation \"{}\" has been {}.",
            donation_title, verdict
        ),
    )
    .await
}

/// Tell every admin about one candidate request for a freshly approved
/// donation. Called once per active request in the donation's category.
pub async fn notify_match_candidate<'a, C: ConnectionTrait>(
    db: &'a C,
    donation_title: &str,
    request_title: &str,
) -> Result<usize, DbErr> {
    notify_admins(
        db,
        "Potential Match Found",
        &format!(
            "Donation \"{}\" may match request \"{}\"",
            donation_title, request_title
        ),
    )
    .await
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
