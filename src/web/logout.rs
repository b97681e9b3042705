use crate::session;
use actix_web::{get, Responder};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_logout);
}

#[get("/logout")]
pub async fn view_logout(cookies: actix_session::Session) -> impl Responder {
    session::forget_user(&cookies);
    super::redirect("/")
}
