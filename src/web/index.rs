/// Public landing page: recent approved donations, the most urgent open
/// requests, and the category list.
use super::browse::DonationCard;
use crate::constants::{FRONT_PAGE_DONATIONS, FRONT_PAGE_URGENT_REQUESTS};
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::{
    categories,
    donations::{self, DonationStatus},
    requests::{self, RequestStatus, Urgency},
};
use actix_web::{error, get, Error, Responder};
use askama::Template;
use askama_actix::TemplateToResponse;
use sea_orm::{entity::*, query::*};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index);
}

#[derive(Debug)]
#[allow(dead_code)]
pub struct UrgentRequestRow {
    pub id: i32,
    pub title: String,
    pub category_name: String,
    pub posted_on: String,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    client: ClientCtx,
    recent_donations: Vec<DonationCard>,
    urgent_requests: Vec<UrgentRequestRow>,
    categories: Vec<categories::Model>,
}

#[get("/")]
pub async fn view_index(client: ClientCtx) -> Result<impl Responder, Error> {
    let db = get_db_pool();

    let recent = donations::Entity::find()
        .filter(donations::Column::Status.eq(DonationStatus::Approved))
        .order_by_desc(donations::Column::ApprovedAt)
        .limit(FRONT_PAGE_DONATIONS)
        .find_also_related(categories::Entity)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let recent_donations = recent
        .into_iter()
        .map(|(donation, category)| {
            let category_name = category.map(|c| c.name).unwrap_or_default();
            DonationCard::new(donation, category_name)
        })
        .collect();

    let urgent = requests::Entity::find()
        .filter(requests::Column::Status.eq(RequestStatus::Active))
        .filter(requests::Column::Urgency.eq(Urgency::Urgent))
        .order_by_desc(requests::Column::CreatedAt)
        .limit(FRONT_PAGE_URGENT_REQUESTS)
        .find_also_related(categories::Entity)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let urgent_requests = urgent
        .into_iter()
        .map(|(request, category)| UrgentRequestRow {
            id: request.id,
            title: request.title,
            category_name: category.map(|c| c.name).unwrap_or_default(),
            posted_on: request.created_at.format("%B %d, %Y").to_string(),
        })
        .collect();

    let categories = categories::Entity::find()
        .order_by_asc(categories::Column::Name)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(IndexTemplate {
        client,
        recent_donations,
        urgent_requests,
        categories,
    }
    .to_response())
}
