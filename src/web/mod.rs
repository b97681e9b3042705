pub mod admin;
pub mod browse;
pub mod donate;
pub mod error;
pub mod index;
pub mod item;
pub mod login;
pub mod logout;
pub mod notifications;
pub mod portal;
pub mod register;
pub mod request;

use actix_web::http::header;
use actix_web::HttpResponse;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    index::configure(conf);
    admin::configure(conf);
    browse::configure(conf);
    donate::configure(conf);
    item::configure(conf);
    login::configure(conf);
    logout::configure(conf);
    notifications::configure(conf);
    portal::configure(conf);
    register::configure(conf);
    request::configure(conf);

    // Uploaded donation photos.
    conf.service(actix_files::Files::new(
        "/uploads",
        crate::app_config::storage().uploads_path,
    ));
}

/// 303-style redirect used after form submissions and authorization
/// bounces.
pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, location.to_owned()))
        .finish()
}
