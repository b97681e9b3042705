/// Donation submission: a multipart form with an optional photo.
use crate::db::get_db_pool;
use crate::email::templates;
use crate::middleware::ClientCtx;
use crate::notifications::dispatcher;
use crate::orm::{
    categories,
    donations::{self, DonationStatus},
    users,
};
use crate::outbox;
use crate::storage;
use actix_multipart::Multipart;
use actix_web::{error, get, post, Error, Responder};
use askama::Template;
use askama_actix::TemplateToResponse;
use futures_util::TryStreamExt as _;
use sea_orm::{entity::*, query::*, TransactionTrait};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_donate).service(view_donate);
}

#[derive(Template)]
#[template(path = "donate.html")]
pub struct DonateTemplate {
    pub client: ClientCtx,
    pub categories: Vec<categories::Model>,
    pub errors: Vec<String>,
    pub title: String,
    pub description: String,
    pub selected_category: i32,
}

/// Fields collected from the multipart body.
#[derive(Debug, Default)]
struct DonationUpload {
    title: String,
    description: String,
    category_id: Option<i32>,
    photo_name: Option<String>,
    photo_data: Vec<u8>,
}

async fn read_text_field(field: &mut actix_multipart::Field) -> Result<String, Error> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(error::ErrorBadRequest)? {
        data.extend_from_slice(&chunk);
        if data.len() > 16 * 1024 {
            return Err(error::ErrorBadRequest("form field too large"));
        }
    }
    Ok(String::from_utf8_lossy(&data).trim().to_string())
}

async fn read_upload(mut payload: Multipart) -> Result<DonationUpload, Error> {
    let max_photo_bytes =
        crate::app_config::limits().max_upload_size_mb as usize * 1024 * 1024;
    let mut upload = DonationUpload::default();

    while let Some(mut field) = payload.try_next().await.map_err(error::ErrorBadRequest)? {
        let field_name = field.name().to_owned();
        match field_name.as_str() {
            "title" => upload.title = read_text_field(&mut field).await?,
            "description" => upload.description = read_text_field(&mut field).await?,
            "category_id" => {
                upload.category_id = read_text_field(&mut field).await?.parse::<i32>().ok()
            }
            "photo" => {
                let filename = field
                    .content_disposition()
                    .get_filename()
                    .map(str::to_owned)
                    .filter(|name| !name.is_empty());

                let mut data = Vec::new();
                while let Some(chunk) =
                    field.try_next().await.map_err(error::ErrorBadRequest)?
                {
                    data.extend_from_slice(&chunk);
                    if data.len() > max_photo_bytes {
                        return Err(error::ErrorPayloadTooLarge("photo too large"));
                    }
                }

                // Browsers send an empty photo part when no file is chosen.
                if let Some(filename) = filename {
                    if !data.is_empty() {
                        upload.photo_name = Some(filename);
                        upload.photo_data = data;
                    }
                }
            }
            _ => {
                // Drain unknown fields so the stream can continue.
                while field
                    .try_next()
                    .await
                    .map_err(error::ErrorBadRequest)?
                    .is_some()
                {}
            }
        }
    }

    Ok(upload)
}

fn validate_upload(upload: &DonationUpload, categories: &[categories::Model]) -> Vec<String> {
    let limits = crate::app_config::limits();
    let mut errors = Vec::new();

    if upload.title.is_empty() {
        errors.push("Item title is required.".to_owned());
    } else if upload.title.chars().count() > limits.max_title_length as usize {
        errors.push(format!(
            "Item title must be at most {} characters.",
            limits.max_title_length
        ));
    }

    if upload.description.is_empty() {
        errors.push("Description is required.".to_owned());
    } else if upload.description.chars().count() > limits.max_description_length as usize {
        errors.push(format!(
            "Description must be at most {} characters.",
            limits.max_description_length
        ));
    }

    match upload.category_id {
        Some(id) if categories.iter().any(|c| c.id == id) => {}
        _ => errors.push("Choose a category.".to_owned()),
    }

    if let Some(name) = &upload.photo_name {
        if storage::allowed_extension(name).is_none() {
            errors.push("Images only! Allowed photo types: jpg, jpeg, png, gif.".to_owned());
        }
    }

    errors
}

#[get("/donate")]
pub async fn view_donate(client: ClientCtx) -> Result<impl Responder, Error> {
    if !client.is_user() {
        return Ok(super::redirect("/login?next=/donate"));
    }

    let categories = all_categories().await?;

    Ok(DonateTemplate {
        client,
        categories,
        errors: Vec::new(),
        title: String::new(),
        description: String::new(),
        selected_category: 0,
    }
    .to_response())
}

#[post("/donate")]
pub async fn post_donate(
    client: ClientCtx,
    cookies: actix_session::Session,
    payload: Multipart,
) -> Result<impl Responder, Error> {
    if !client.is_user() {
        return Ok(super::redirect("/login?next=/donate"));
    }
    let user_id = client.require_login()?;
    let donor_name = client.get_name();

    let mut upload = read_upload(payload).await?;
    let categories = all_categories().await?;

    let errors = validate_upload(&upload, &categories);
    if !errors.is_empty() {
        return Ok(DonateTemplate {
            client,
            categories,
            errors,
            title: upload.title,
            description: upload.description,
            selected_category: upload.category_id.unwrap_or(0),
        }
        .to_response());
    }

    let photo_data = std::mem::take(&mut upload.photo_data);
    let photo_filename = match upload.photo_name {
        Some(ref name) => Some(
            storage::save_photo(photo_data, name)
                .await
                .map_err(|e| {
                    log::error!("photo upload failed: {}", e);
                    error::ErrorInternalServerError("Failed to store photo")
                })?,
        ),
        None => None,
    };

    let category_id = upload.category_id.unwrap_or_default();
    let category_name = categories
        .iter()
        .find(|c| c.id == category_id)
        .map(|c| c.name.clone())
        .unwrap_or_default();

    let db = get_db_pool();
    let txn = db.begin().await.map_err(error::ErrorInternalServerError)?;

    let donation = donations::ActiveModel {
        title: Set(upload.title),
        description: Set(upload.description),
        photo_filename: Set(photo_filename),
        status: Set(DonationStatus::Pending),
        created_at: Set(chrono::Utc::now().naive_utc()),
        thank_you_sent: Set(false),
        donor_id: Set(user_id),
        category_id: Set(category_id),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(error::ErrorInternalServerError)?;

    dispatcher::notify_donation_submitted(&txn, &donation.title, &donor_name)
        .await
        .map_err(error::ErrorInternalServerError)?;

    // Alert emails to every admin, delivered by the outbox task.
    let admins = users::Entity::find()
        .filter(users::Column::IsAdmin.eq(true))
        .all(&txn)
        .await
        .map_err(error::ErrorInternalServerError)?;

    for admin in &admins {
        let (subject, body) =
            templates::admin_alert_email(&donor_name, &donation.title, &category_name);
        outbox::enqueue(&txn, &admin.email, subject, body)
            .await
            .map_err(error::ErrorInternalServerError)?;
    }

    txn.commit().await.map_err(error::ErrorInternalServerError)?;

    log::info!(
        "donation submitted: id={} donor={}",
        donation.id,
        user_id
    );

    crate::session::flash(
        &cookies,
        "success",
        "Thank you for your donation! It will be reviewed by our team.",
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
