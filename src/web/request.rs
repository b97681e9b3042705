/// Item request submission.
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::notifications::dispatcher;
use crate::orm::{
    categories,
    requests::{self, RequestStatus, Urgency},
};
use actix_web::{error, get, post, web, Error, Responder};
use askama::Template;
use askama_actix::TemplateToResponse;
use sea_orm::{entity::*, query::*, TransactionTrait};
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_request).service(view_request);
}

#[derive(Template)]
#[template(path = "request_item.html")]
pub struct RequestTemplate {
    pub client: ClientCtx,
    pub categories: Vec<categories::Model>,
    pub errors: Vec<String>,
    pub title: String,
    pub description: String,
    pub selected_category: i32,
    pub selected_urgency: String,
}

#[derive(Deserialize, Validate)]
pub struct FormData {
    #[validate(length(min = 1, max = 100, message = "Item title is required (max 100 characters)."))]
    title: String,
    #[validate(length(min = 1, max = 500, message = "Description is required (max 500 characters)."))]
    description: String,
    category_id: i32,
    urgency: String,
}

#[get("/request")]
pub async fn view_request(client: ClientCtx) -> Result<impl Responder, Error> {
    if !client.is_user() {
        return Ok(super::redirect("/login?next=/request"));
    }

    let categories = all_categories().await?;

    Ok(RequestTemplate {
        client,
        categories,
        errors: Vec::new(),
        title: String::new(),
        description: String::new(),
        selected_category: 0,
        selected_urgency: "normal".to_owned(),
    }
    .to_response())
}

#[post("/request")]
pub async fn post_request(
    client: ClientCtx,
    cookies: actix_session::Session,
    form: web::Form<FormData>,
) -> Result<impl Responder, Error> {
    if !client.is_user() {
        return Ok(super::redirect("/login?next=/request"));
    }
    let user_id = client.require_login()?;
    let requester_name = client.get_name();

    let title = form.title.trim().to_owned();
    let description = form.description.trim().to_owned();
    let categories = all_categories().await?;

    let mut errors: Vec<String> = Vec::new();

    if let Err(validation) = form.validate() {
        for (_, field_errors) in validation.field_errors() {
            for field_error in field_errors {
                if let Some(message) = &field_error.message {
                    errors.push(message.to_string());
                }
            }
        }
    }

    // Urgency comes from a closed set; anything else is a form error.
    let urgency = match Urgency::parse(&form.urgency) {
        Some(urgency) => urgency,
        None => {
            errors.push("Choose an urgency level.".to_owned());
            Urgency::Normal
        }
    };

    if !categories.iter().any(|c| c.id == form.category_id) {
        errors.push("Choose a category.".to_owned());
    }

    if !errors.is_empty() {
        return Ok(RequestTemplate {
            client,
            categories,
            errors,
            title,
            description,
            selected_category: form.category_id,
            selected_urgency: form.urgency.clone(),
        }
        .to_response());
    }

    let db = get_db_pool();
    let txn = db.begin().await.map_err(error::ErrorInternalServerError)?;

    let request = requests::ActiveModel {
        title: Set(title),
        description: Set(description),
        urgency: Set(urgency),
        status: Set(RequestStatus::Active),
        created_at: Set(chrono::Utc::now().naive_utc()),
        requester_id: Set(user_id),
        category_id: Set(form.category_id),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(error::ErrorInternalServerError)?;

    dispatcher::notify_request_submitted(&txn, &request.title, &requester_name)
        .await
        .map_err(error::ErrorInternalServerError)?;

    txn.commit().await.map_err(error::ErrorInternalServerError)?;

    log::info!("request submitted: id={} requester={}", request.id, user_id);

    crate::session::flash(
        &cookies,
        "success",
        "Your request has been submitted successfully!",
    );
    Ok(super::redirect("/donor_portal"))
}

async fn all_categories() -> Result<Vec<categories::Model>, Error> {
    categories::Entity::find()
        .order_by_asc(categories::Column::Name)
        .all(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)
}
