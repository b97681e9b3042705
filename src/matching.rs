//! Donation review and match creation.
//!
//! Both operations are single transactions: the status transition, the
//! in-app notifications it triggers, and the outbox rows for any emails all
//! commit together. Duplicate matches are stopped by the database's unique
//! constraint on (donation_id, request_id); the thank-you email is claimed
//! with a compare-and-set on the donation's one-shot flag.

use crate::email::templates;
use crate::notifications::dispatcher;
use crate::orm::{
    categories,
    donations::{self, DonationStatus},
    matches::{self, MatchStatus},
    requests::{self, RequestStatus},
    users,
};
use crate::outbox;
use sea_orm::{
    entity::*, query::*, sea_query::Expr, ConnectionTrait, DatabaseConnection, DbErr,
    TransactionTrait,
};
use serde::Deserialize;

/// Admin verdict on a pending donation. Closed set; anything else fails
/// form deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

#[derive(Debug)]
pub enum ReviewError {
    DonationNotFound,
    /// Only pending donations may be reviewed.
    NotPending(DonationStatus),
    Db(DbErr),
}

impl std::fmt::Display for ReviewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewError::DonationNotFound => write!(f, "donation not found"),
            ReviewError::NotPending(status) => {
                write!(f, "donation is {}, not pending", status.as_str())
            }
            ReviewError::Db(e) => write!(f, "database error: {}", e),
        }
    }
}

impl std::error::Error for ReviewError {}

impl From<DbErr> for ReviewError {
    fn from(e: DbErr) -> Self {
        ReviewError::Db(e)
    }
}

/// Apply an admin review to a pending donation.
///
/// One transaction: status + reviewer + timestamp, the donor's
/// notification, and (on approval) the admin alerts for candidate requests
/// in the same category.
pub async fn review_donation(
    db: &DatabaseConnection,
    donation_id: i32,
    decision: ReviewDecision,
    reviewer_id: i32,
) -> Result<donations::Model, ReviewError> {
    let txn = db.begin().await?;

    let donation = donations::Entity::find_by_id(donation_id)
        .one(&txn)
        .await?
        .ok_or(ReviewError::DonationNotFound)?;

    match donation.status {
        DonationStatus::Pending => {}
        status => return Err(ReviewError::NotPending(status)),
    }

    let now = chrono::Utc::now().naive_utc();
    let approved = decision == ReviewDecision::Approved;

    let mut update: donations::ActiveModel = donation.into();
    update.status = Set(if approved {
        DonationStatus::Approved
    } else {
        DonationStatus::Rejected
    });
    update.approved_by_id = Set(Some(reviewer_id));
    if approved {
        update.approved_at = Set(Some(now));
    }
    let donation = update.update(&txn).await?;

    dispatcher::notify_donation_reviewed(&txn, donation.donor_id, &donation.title, approved)
        .await?;

    if approved {
        alert_match_candidates(&txn, &donation).await?;
    }

    txn.commit().await?;

    log::info!(
        "donation {} reviewed: id={} reviewer={}",
        donation.status.as_str(),
        donation.id,
        reviewer_id
    );

    Ok(donation)
}

/// Scan active requests in the donation's category and alert every admin
/// about each one. No ranking; this is surfacing, not deciding.
pub async fn alert_match_candidates<'a, C: ConnectionTrait>(
    db: &'a C,
    donation: &donations::Model,
) -> Result<usize, DbErr> {
    let candidates = requests::Entity::find()
        .filter(requests::Column::CategoryId.eq(donation.category_id))
        .filter(requests::Column::Status.eq(RequestStatus::Active))
        .all(db)
        .await?;

    let mut alerts = 0;
    for request in &candidates {
        alerts += dispatcher::notify_match_candidate(db, &donation.title, &request.title).await?;
    }

    Ok(alerts)
}

#[derive(Debug)]
pub enum MatchError {
    DonationNotFound,
    RequestNotFound,
    /// A match for this (donation, request) pair already exists.
    AlreadyMatched,
    /// Donation must be approved (and not yet donated) to be matched.
    DonationNotAvailable(DonationStatus),
    /// Request must be active to be matched.
    RequestNotActive(RequestStatus),
    Db(DbErr),
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::DonationNotFound => write!(f, "donation not found"),
            MatchError::RequestNotFound => write!(f, "request not found"),
            MatchError::AlreadyMatched => write!(f, "match already exists for these items"),
            MatchError::DonationNotAvailable(status) => {
                write!(f, "donation is {}, not approved", status.as_str())
            }
            MatchError::RequestNotActive(_) => write!(f, "request is no longer active"),
            MatchError::Db(e) => write!(f, "database error: {}", e),
        }
    }
}

impl std::error::Error for MatchError {}

impl From<DbErr> for MatchError {
    fn from(e: DbErr) -> Self {
        MatchError::Db(e)
    }
}

/// Link a donation to a request.
///
/// One transaction: the match row, donation → donated, request →
/// fulfilled, outbox rows for the donor and requester emails, and the
/// one-shot thank-you claim.
pub async fn create_match(
    db: &DatabaseConnection,
    donation_id: i32,
    request_id: i32,
    matched_by_id: i32,
    notes: Option<String>,
) -> Result<matches::Model, MatchError> {
    let txn = db.begin().await?;

    let donation = donations::Entity::find_by_id(donation_id)
        .one(&txn)
        .await?
        .ok_or(MatchError::DonationNotFound)?;
    let request = requests::Entity::find_by_id(request_id)
        .one(&txn)
        .await?
        .ok_or(MatchError::RequestNotFound)?;

    match donation.status {
        DonationStatus::Approved => {}
        status => return Err(MatchError::DonationNotAvailable(status)),
    }
    match request.status {
        RequestStatus::Active => {}
        status => return Err(MatchError::RequestNotActive(status)),
    }

    let now = chrono::Utc::now().naive_utc();

    let match_row = matches::ActiveModel {
        status: Set(MatchStatus::Approved),
        notes: Set(notes),
        created_at: Set(now),
        donation_id: Set(donation.id),
        request_id: Set(request.id),
        matched_by_id: Set(matched_by_id),
        ..Default::default()
    };

    let match_row = match match_row.insert(&txn).await {
        Ok(row) => row,
        Err(e) if is_unique_violation(&e) => return Err(MatchError::AlreadyMatched),
        Err(e) => return Err(e.into()),
    };

    let mut donation_update: donations::ActiveModel = donation.into();
    donation_update.status = Set(DonationStatus::Donated);
    donation_update.donated_at = Set(Some(now));
    let donation = donation_update.update(&txn).await?;

    let mut request_update: requests::ActiveModel = request.into();
    request_update.status = Set(RequestStatus::Fulfilled);
    request_update.fulfilled_at = Set(Some(now));
    let request = request_update.update(&txn).await?;

    let donor = users::Entity::find_by_id(donation.donor_id)
        .one(&txn)
        .await?
        .ok_or_else(|| MatchError::Db(DbErr::Custom("donor row missing".to_owned())))?;
    let requester = users::Entity::find_by_id(request.requester_id)
        .one(&txn)
        .await?
        .ok_or_else(|| MatchError::Db(DbErr::Custom("requester row missing".to_owned())))?;
    let category = categories::Entity::find_by_id(donation.category_id)
        .one(&txn)
        .await?
        .ok_or_else(|| MatchError::Db(DbErr::Custom("category row missing".to_owned())))?;

    let (subject, body) =
        templates::match_donor_email(&donor.username, &donation.title, &category.name, now);
    outbox::enqueue(&txn, &donor.email, subject, body).await?;

    let (subject, body) =
        templates::match_requester_email(&requester.username, &request.title, &category.name, now);
    outbox::enqueue(&txn, &requester.email, subject, body).await?;

    // Claim the one-shot thank-you flag; only the claimant enqueues the
    // email, so retried or concurrent match actions cannot duplicate it.
    let claimed = donations::Entity::update_many()
        .col_expr(donations::Column::ThankYouSent, Expr::value(true))
        .filter(donations::Column::Id.eq(donation.id))
        .filter(donations::Column::ThankYouSent.eq(false))
        .exec(&txn)
        .await?;

    if claimed.rows_affected == 1 {
        let (subject, body) = templates::thank_you_email(
            &donor.username,
            &donation.title,
            &category.name,
            donation.donated_at,
        );
        outbox::enqueue(&txn, &donor.email, subject, body).await?;
    }

    txn.commit().await?;

    log::info!(
        "match created: id={} donation={} request={} by={}",
        match_row.id,
        donation.id,
        request.id,
        matched_by_id
    );

    Ok(match_row)
}

/// Best-effort detection of a unique-constraint violation across backends.
fn is_unique_violation(e: &DbErr) -> bool {
    let message = e.to_string();
    message.contains("duplicate key") || message.contains("UNIQUE constraint")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_decision_is_a_closed_set() {
        let approved: ReviewDecision = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(approved, ReviewDecision::Approved);
        let rejected: ReviewDecision = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(rejected, ReviewDecision::Rejected);
        assert!(serde_json::from_str::<ReviewDecision>("\"donated\"").is_err());
        assert!(serde_json::from_str::<ReviewDecision>("\"Approved\"").is_err());
    }

    #[test]
    fn unique_violation_detection() {
        let pg = DbErr::Query(
            "error returned from database: duplicate key value violates unique constraint \
             \"uq_matches_donation_request\""
                .to_owned(),
        );
        assert!(is_unique_violation(&pg));

        let sqlite = DbErr::Exec("UNIQUE constraint failed: matches.donation_id".to_owned());
        assert!(is_unique_violation(&sqlite));

        let other = DbErr::Exec("connection reset".to_owned());
        assert!(!is_unique_violation(&other));
    }
}
