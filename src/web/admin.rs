/// Administration dashboard and lifecycle actions.
///
/// All routes are admin-gated; a non-admin gets a flash message and a
/// redirect home rather than a bare error page.
use crate::constants::ADMIN_RECENT_MATCHES;
use crate::db::get_db_pool;
use crate::matching::{self, MatchError, ReviewDecision, ReviewError};
use crate::middleware::ClientCtx;
use crate::orm::{
    categories,
    donations::{self, DonationStatus},
    matches,
    requests::{self, RequestStatus},
    users,
};
use actix_web::{error, get, post, web, Error, Responder};
use askama::Template;
use askama_actix::TemplateToResponse;
use sea_orm::{entity::*, query::*};
use serde::Deserialize;
use std::collections::HashMap;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_dashboard)
        .service(approve_donation)
        .service(create_match);
}

#[derive(Debug)]
pub struct DashboardStats {
    pub total_donations: u64,
    pub pending_donations: u64,
    pub approved_donations: u64,
    pub donated_items: u64,
    pub active_requests: u64,
    pub total_matches: u64,
}

#[derive(Debug)]
pub struct PendingDonationRow {
    pub id: i32,
    pub title: String,
    pub donor_name: String,
    pub category_name: String,
    pub submitted_on: String,
    pub has_photo: bool,
}

#[derive(Debug)]
pub struct ActiveRequestRow {
    pub id: i32,
    pub title: String,
    pub requester_name: String,
    pub category_name: String,
    pub urgency: &'static str,
    pub submitted_on: String,
}

#[derive(Debug)]
pub struct RecentMatchRow {
    pub id: i32,
    pub donation_title: String,
    pub request_title: String,
    pub matched_on: String,
}

/// An approved donation next to an active request in the same category;
/// one click creates the match.
#[derive(Debug)]
pub struct CandidatePair {
    pub donation_id: i32,
    pub donation_title: String,
    pub request_id: i32,
    pub request_title: String,
    pub requester_name: String,
}

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
struct DashboardTemplate {
    client: ClientCtx,
    stats: DashboardStats,
    pending_donations: Vec<PendingDonationRow>,
    active_requests: Vec<ActiveRequestRow>,
    recent_matches: Vec<RecentMatchRow>,
    candidate_pairs: Vec<CandidatePair>,
}

/// Flash-and-bounce for non-admin access, per the rest of the admin UI.
fn deny_non_admin(client: &ClientCtx, cookies: &actix_session::Session) -> Option<actix_web::HttpResponse> {
    if client.is_admin() {
        return None;
    }
    crate::session::flash(
        cookies,
        "danger",
        "Access denied. Admin privileges required.",
    );
    Some(super::redirect("/"))
}

#[get("/admin")]
pub async fn view_dashboard(
    client: ClientCtx,
    cookies: actix_session::Session,
) -> Result<impl Responder, Error> {
    if let Some(denied) = deny_non_admin(&client, &cookies) {
        return Ok(denied);
    }

    let db = get_db_pool();

    let stats = DashboardStats {
        total_donations: donations::Entity::find()
            .count(db)
            .await
            .map_err(error::ErrorInternalServerError)? as u64,
        pending_donations: count_donations(DonationStatus::Pending).await?,
        approved_donations: count_donations(DonationStatus::Approved).await?,
        donated_items: count_donations(DonationStatus::Donated).await?,
        active_requests: requests::Entity::find()
            .filter(requests::Column::Status.eq(RequestStatus::Active))
            .count(db)
            .await
            .map_err(error::ErrorInternalServerError)? as u64,
        total_matches: matches::Entity::find()
            .count(db)
            .await
            .map_err(error::ErrorInternalServerError)? as u64,
    };

    let category_names: HashMap<i32, String> = categories::Entity::find()
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let usernames: HashMap<i32, String> = users::Entity::find()
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let name_of = |map: &HashMap<i32, String>, id: i32| -> String {
        map.get(&id).cloned().unwrap_or_default()
    };

    let pending = donations::Entity::find()
        .filter(donations::Column::Status.eq(DonationStatus::Pending))
        .order_by_desc(donations::Column::CreatedAt)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let pending_donations = pending
        .iter()
        .map(|d| PendingDonationRow {
            id: d.id,
            title: d.title.clone(),
            donor_name: name_of(&usernames, d.donor_id),
            category_name: name_of(&category_names, d.category_id),
            submitted_on: d.created_at.format("%B %d, %Y").to_string(),
            has_photo: d.photo_filename.is_some(),
        })
        .collect();

    let active = requests::Entity::find()
        .filter(requests::Column::Status.eq(RequestStatus::Active))
        .order_by_desc(requests::Column::CreatedAt)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let active_requests: Vec<ActiveRequestRow> = active
        .iter()
        .map(|r| ActiveRequestRow {
            id: r.id,
            title: r.title.clone(),
            requester_name: name_of(&usernames, r.requester_id),
            category_name: name_of(&category_names, r.category_id),
            urgency: r.urgency.as_str(),
            submitted_on: r.created_at.format("%B %d, %Y").to_string(),
        })
        .collect();

    let approved = donations::Entity::find()
        .filter(donations::Column::Status.eq(DonationStatus::Approved))
        .order_by_desc(donations::Column::ApprovedAt)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    // Cross product of approved donations and same-category active
    // requests; the admin picks from these to create a match.
    let candidate_pairs = approved
        .iter()
        .flat_map(|d| {
            active
                .iter()
                .filter(|r| r.category_id == d.category_id)
                .map(|r| CandidatePair {
                    donation_id: d.id,
                    donation_title: d.title.clone(),
                    request_id: r.id,
                    request_title: r.title.clone(),
                    requester_name: name_of(&usernames, r.requester_id),
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let recent = matches::Entity::find()
        .order_by_desc(matches::Column::CreatedAt)
        .limit(ADMIN_RECENT_MATCHES)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let donation_titles: HashMap<i32, String> = donations::Entity::find()
        .filter(donations::Column::Id.is_in(recent.iter().map(|m| m.donation_id).collect::<Vec<_>>()))
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .into_iter()
        .map(|d| (d.id, d.title))
        .collect();

    let request_titles: HashMap<i32, String> = requests::Entity::find()
        .filter(requests::Column::Id.is_in(recent.iter().map(|m| m.request_id).collect::<Vec<_>>()))
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .into_iter()
        .map(|r| (r.id, r.title))
        .collect();

    let recent_matches = recent
        .iter()
        .map(|m| RecentMatchRow {
            id: m.id,
            donation_title: name_of(&donation_titles, m.donation_id),
            request_title: name_of(&request_titles, m.request_id),
            matched_on: m.created_at.format("%B %d, %Y").to_string(),
        })
        .collect();

    Ok(DashboardTemplate {
        client,
        stats,
        pending_donations,
        active_requests,
        recent_matches,
        candidate_pairs,
    }
    .to_response())
}

async fn count_donations(status: DonationStatus) -> Result<u64, Error> {
    let count = donations::Entity::find()
        .filter(donations::Column::Status.eq(status))
        .count(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(count as u64)
}

#[derive(Deserialize)]
pub struct ApprovalForm {
    status: ReviewDecision,
}

#[post("/approve_donation/{id}")]
pub async fn approve_donation(
    client: ClientCtx,
    cookies: actix_session::Session,
    path: web::Path<i32>,
    form: web::Form<ApprovalForm>,
) -> Result<impl Responder, Error> {
    if let Some(denied) = deny_non_admin(&client, &cookies) {
        return Ok(denied);
    }
    let reviewer_id = client.require_login()?;

    match matching::review_donation(get_db_pool(), *path, form.status, reviewer_id).await {
        Ok(donation) => {
            crate::session::flash(
                &cookies,
                "success",
                &format!("Donation has been {}.", donation.status.as_str()),
            );
        }
        Err(ReviewError::DonationNotFound) => {
            return Err(error::ErrorNotFound("donation not found"));
        }
        Err(ReviewError::NotPending(status)) => {
            crate::session::flash(
                &cookies,
                "warning",
                &format!("Donation was already {}.", status.as_str()),
            );
        }
        Err(ReviewError::Db(e)) => {
            log::error!("donation review failed: {:?}", e);
            return Err(error::ErrorInternalServerError("DB error"));
        }
    }

    Ok(super::redirect("/admin"))
}

#[post("/create_match/{donation_id}/{request_id}")]
pub async fn create_match(
    client: ClientCtx,
    cookies: actix_session::Session,
    path: web::Path<(i32, i32)>,
) -> Result<impl Responder, Error> {
    if let Some(denied) = deny_non_admin(&client, &cookies) {
        return Ok(denied);
    }
    let matched_by_id = client.require_login()?;
    let (donation_id, request_id) = path.into_inner();

    match matching::create_match(get_db_pool(), donation_id, request_id, matched_by_id, None).await
    {
        Ok(_) => {
            crate::session::flash(&cookies, "success", "Match created successfully!");
        }
        Err(MatchError::AlreadyMatched) => {
            crate::session::flash(
                &cookies,
                "warning",
                "Match already exists for these items.",
            );
        }
        Err(MatchError::DonationNotFound | MatchError::RequestNotFound) => {
            return Err(error::ErrorNotFound("donation or request not found"));
        }
        Err(MatchError::DonationNotAvailable(status)) => {
            crate::session::flash(
                &cookies,
                "warning",
                &format!("Donation is {} and cannot be matched.", status.as_str()),
            );
        }
        Err(MatchError::RequestNotActive(_)) => {
            crate::session::flash(&cookies, "warning", "Request is no longer active.");
        }
        Err(MatchError::Db(e)) => {
            log::error!("match creation failed: {:?}", e);
            return Err(error::ErrorInternalServerError("DB error"));
        }
    }

    Ok(super::redirect("/admin"))
}
