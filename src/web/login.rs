use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::users;
use crate::session;
use actix_web::{error, get, post, web, Error, Responder};
use argon2::password_hash::{PasswordHash, PasswordVerifier};
use askama::Template;
use askama_actix::TemplateToResponse;
use sea_orm::{entity::*, query::*, DbErr};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_login).service(view_login);
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub client: ClientCtx,
    pub next: String,
}

#[derive(Deserialize)]
pub struct FormData {
    username: String,
    password: String,
    next: Option<String>,
}

#[derive(Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

/// Check a username/password pair against the users table.
///
/// Returns the matched user, or None for both unknown-user and bad-password
/// so the caller cannot distinguish them (no username enumeration).
pub async fn verify_credentials(
    username: &str,
    password: &str,
) -> Result<Option<users::Model>, DbErr> {
    let db = get_db_pool();

    let user = users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await?;

    let user = match user {
        Some(user) => user,
        None => return Ok(None),
    };

    let parsed_hash = match PasswordHash::new(&user.password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("unparseable password hash: user_id={} {:?}", user.id, e);
            return Ok(None);
        }
    };

    if session::get_argon2()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
    {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Only same-site relative paths are honored as a post-login destination.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

#[post("/login")]
pub async fn post_login(
    client: ClientCtx,
    cookies: actix_session::Session,
    form: web::Form<FormData>,
) -> Result<impl Responder, Error> {
    if client.is_user() {
        return Ok(super::redirect("/"));
    }

    let user = verify_credentials(&form.username, &form.password)
        .await
        .map_err(|e| {
            log::error!("login query failed: {:?}", e);
            error::ErrorInternalServerError("DB error")
        })?;

    match user {
        Some(user) => {
            session::remember_user(&cookies, user.id)?;
            log::info!("user logged in: user_id={}", user.id);
            Ok(super::redirect(safe_next(form.next.as_deref())))
        }
        None => {
            log::debug!("login failure for {}", form.username);
            session::flash(&cookies, "danger", "Invalid username or password");
            Ok(super::redirect("/login"))
        }
    }
}

#[get("/login")]
pub async fn view_login(
    client: ClientCtx,
    query: web::Query<NextQuery>,
) -> Result<impl Responder, Error> {
    if client.is_user() {
        return Ok(super::redirect("/"));
    }

    let next = query.next.clone().unwrap_or_default();
    Ok(LoginTemplate { client, next }.to_response())
}

#[cfg(test)]
mod tests {
    use super::safe_next;

    #[test]
    fn next_must_be_same_site() {
        assert_eq!(safe_next(Some("/donor_portal")), "/donor_portal");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
