/// Donor portal: the signed-in user's own donations and requests.
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::{categories, donations, requests};
use actix_web::{error, get, Error, Responder};
use askama::Template;
use askama_actix::TemplateToResponse;
use sea_orm::{entity::*, query::*};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_portal);
}

#[derive(Debug)]
pub struct MyDonationRow {
    pub id: i32,
    pub title: String,
    pub status: &'static str,
    pub category_name: String,
    pub submitted_on: String,
    pub has_photo: bool,
}

#[derive(Debug)]
#[allow(dead_code)]
pub struct MyRequestRow {
    pub id: i32,
    pub title: String,
    pub status: &'static str,
    pub urgency: &'static str,
    pub category_name: String,
    pub submitted_on: String,
}

#[derive(Template)]
#[template(path = "donor_portal.html")]
struct PortalTemplate {
    client: ClientCtx,
    donations: Vec<MyDonationRow>,
    requests: Vec<MyRequestRow>,
}

#[get("/donor_portal")]
pub async fn view_portal(client: ClientCtx) -> Result<impl Responder, Error> {
    if !client.is_user() {
        return Ok(super::redirect("/login?next=/donor_portal"));
    }
    let user_id = client.require_login()?;

    let db = get_db_pool();

    let my_donations = donations::Entity::find()
        .filter(donations::Column::DonorId.eq(user_id))
        .order_by_desc(donations::Column::CreatedAt)
        .find_also_related(categories::Entity)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let donations = my_donations
        .into_iter()
        .map(|(donation, category)| MyDonationRow {
            id: donation.id,
            title: donation.title,
            status: donation.status.as_str(),
            category_name: category.map(|c| c.name).unwrap_or_default(),
            submitted_on: donation.created_at.format("%B %d, %Y").to_string(),
            has_photo: donation.photo_filename.is_some(),
        })
        .collect();

    let my_requests = requests::Entity::find()
        .filter(requests::Column::RequesterId.eq(user_id))
        .order_by_desc(requests::Column::CreatedAt)
        .find_also_related(categories::Entity)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let requests = my_requests
        .into_iter()
        .map(|(request, category)| MyRequestRow {
            id: request.id,
            title: request.title,
            status: request.status.as_str(),
            urgency: request.urgency.as_str(),
            category_name: category.map(|c| c.name).unwrap_or_default(),
            submitted_on: request.created_at.format("%B %d, %Y").to_string(),
        })
        .collect();

    Ok(PortalTemplate {
        client,
        donations,
        requests,
    }
    .to_response())
}
