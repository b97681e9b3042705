/// Item detail page with visibility gating.
///
/// Approved donations are public. Anything else is visible only to the
/// donor and to admins; everyone else is bounced with a flash message.
use super::browse::DonationCard;
use crate::constants::RELATED_ITEMS;
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::{
    categories,
    donations::{self, DonationStatus},
    users,
};
use actix_web::{error, get, web, Error, Responder};
use askama::Template;
use askama_actix::TemplateToResponse;
use sea_orm::{entity::*, query::*};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_item);
}

#[derive(Template)]
#[template(path = "item_detail.html")]
struct ItemTemplate {
    client: ClientCtx,
    id: i32,
    title: String,
    description: String,
    status: &'static str,
    photo_filename: Option<String>,
    category_name: String,
    donor_name: String,
    submitted_on: String,
    approved_on: String,
    related_items: Vec<DonationCard>,
}

#[get("/item/{id}")]
pub async fn view_item(
    client: ClientCtx,
    cookies: actix_session::Session,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let donation_id = path.into_inner();
    let db = get_db_pool();

    let found = donations::Entity::find_by_id(donation_id)
        .find_also_related(categories::Entity)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let (donation, category) = match found {
        Some(pair) => pair,
        None => return Err(error::ErrorNotFound("item not found")),
    };

    if donation.status != DonationStatus::Approved {
        let is_owner = client.get_id() == Some(donation.donor_id);
        if !client.is_user() {
            crate::session::flash(
                &cookies,
                "warning",
                "This item is not available for viewing.",
            );
            return Ok(super::redirect("/login"));
        } else if !client.is_admin() && !is_owner {
            crate::session::flash(
                &cookies,
                "danger",
                "You do not have permission to view this item.",
            );
            return Ok(super::redirect("/"));
        }
    }

    let donor = users::Entity::find_by_id(donation.donor_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let related = donations::Entity::find()
        .filter(donations::Column::CategoryId.eq(donation.category_id))
        .filter(donations::Column::Id.ne(donation.id))
        .filter(donations::Column::Status.eq(DonationStatus::Approved))
        .order_by_desc(donations::Column::ApprovedAt)
        .limit(RELATED_ITEMS)
        .find_also_related(categories::Entity)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let related_items = related
        .into_iter()
        .map(|(related_donation, related_category)| {
            let category_name = related_category.map(|c| c.name).unwrap_or_default();
            DonationCard::new(related_donation, category_name)
        })
        .collect();

    Ok(ItemTemplate {
        client,
        id: donation.id,
        title: donation.title,
        description: donation.description,
        status: donation.status.as_str(),
        photo_filename: donation.photo_filename,
        category_name: category.map(|c| c.name).unwrap_or_default(),
        donor_name: donor.map(|u| u.username).unwrap_or_default(),
        submitted_on: donation.created_at.format("%B %d, %Y").to_string(),
        approved_on: donation
            .approved_at
            .map(|ts| ts.format("%B %d, %Y").to_string())
            .unwrap_or_default(),
        related_items,
    }
    .to_response())
}
