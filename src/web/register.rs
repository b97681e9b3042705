use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::users;
use crate::session;
use actix_web::{error, get, post, web, Error, Responder};
use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use askama::Template;
use askama_actix::TemplateToResponse;
use sea_orm::{entity::*, query::*, DbErr};
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_register).service(view_register);
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub client: ClientCtx,
    pub errors: Vec<String>,
    pub username: String,
    pub email: String,
}

#[derive(Deserialize, Validate)]
pub struct FormData {
    #[validate(length(min = 4, max = 64, message = "Username must be 4-64 characters."))]
    username: String,
    #[validate(email(message = "Enter a valid email address."))]
    email: String,
    #[validate(length(min = 6, max = 1000, message = "Password must be at least 6 characters."))]
    password: String,
}

/// Insert a user row. The password must already be hashed.
pub async fn insert_new_user(
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<users::Model, DbErr> {
    let db = get_db_pool();

    users::ActiveModel {
        username: Set(username.to_owned()),
        email: Set(email.to_owned()),
        password: Set(password_hash.to_owned()),
        is_admin: Set(false),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Duplicate checks reported inline on the form, per field.
pub async fn uniqueness_errors(username: &str, email: &str) -> Result<Vec<String>, DbErr> {
    let db = get_db_pool();
    let mut errors = Vec::new();

    let username_taken = users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await?
        .is_some();
    if username_taken {
        errors.push("Please use a different username.".to_owned());
    }

    let email_taken = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await?
        .is_some();
    if email_taken {
        errors.push("Please use a different email address.".to_owned());
    }

    Ok(errors)
}

#[get("/register")]
pub async fn view_register(client: ClientCtx) -> Result<impl Responder, Error> {
    if client.is_user() {
        return Ok(super::redirect("/"));
    }

    Ok(RegisterTemplate {
        client,
        errors: Vec::new(),
        username: String::new(),
        email: String::new(),
    }
    .to_response())
}

#[post("/register")]
pub async fn post_register(
    client: ClientCtx,
    cookies: actix_session::Session,
    form: web::Form<FormData>,
) -> Result<impl Responder, Error> {
    if client.is_user() {
        return Ok(super::redirect("/"));
    }

    let username = form.username.trim().to_owned();
    let email = form.email.trim().to_lowercase();

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

    if errors.is_empty() {
        errors = uniqueness_errors(&username, &email).await.map_err(|e| {
            log::error!("registration uniqueness check failed: {:?}", e);
            error::ErrorInternalServerError("DB error")
        })?;
    }

    if !errors.is_empty() {
        return Ok(RegisterTemplate {
            client,
            errors,
            username,
            email,
        }
        .to_response());
    }

    let password_hash = session::get_argon2()
        .hash_password(form.password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map_err(|e| {
            log::error!("failed to hash password: {}", e);
            error::ErrorInternalServerError("Failed to create user")
        })?
        .to_string();

    match insert_new_user(&username, &email, &password_hash).await {
        Ok(user) => {
            log::info!("new user registered: {} (user_id: {})", username, user.id);
            session::flash(&cookies, "success", "Registration successful!");
            Ok(super::redirect("/login"))
        }
        Err(e) => {
            // Unique-constraint backstop for a concurrent registration with
            // the same name or address.
            log::warn!("registration insert failed for {}: {:?}", username, e);
            Ok(RegisterTemplate {
                client,
                errors: vec!["That username or email address is already in use.".to_owned()],
                username,
                email,
            }
            .to_response())
        }
    }
}
