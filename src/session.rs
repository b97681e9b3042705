//! Session state: the process-wide Argon2 hasher, the signed-in user id
//! stored in the cookie session, and flash messages carried between a
//! redirect and the next rendered page.

use crate::db::get_db_pool;
use crate::user::Profile;
use actix_session::Session;
use argon2::{Algorithm, Argon2, Params, Version};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

const USER_KEY: &str = "uid";
const FLASH_KEY: &str = "_flashes";

static ARGON2: OnceCell<Argon2<'static>> = OnceCell::new();

/// Initialize the Argon2 hasher with the SALT secret. Must be called once
/// before any password is hashed or verified.
pub fn init() {
    let secret = std::env::var("SALT").expect("SALT must be set.");
    let secret: &'static [u8] = Box::leak(secret.into_bytes().into_boxed_slice());

    let argon2 = Argon2::new_with_secret(
        secret,
        Algorithm::Argon2id,
        Version::V0x13,
        Params::default(),
    )
    .expect("SALT is not usable as an Argon2 secret.");

    ARGON2
        .set(argon2)
        .ok()
        .expect("session::init() must only be called once.");
}

pub fn get_argon2() -> &'static Argon2<'static> {
    ARGON2.get().expect("session::init() has not been called.")
}

/// Record the signed-in user in the cookie session.
pub fn remember_user(session: &Session, user_id: i32) -> Result<(), actix_web::Error> {
    session
        .insert(USER_KEY, user_id)
        .map_err(actix_web::error::ErrorInternalServerError)
}

/// Drop all session state, signing the user out.
pub fn forget_user(session: &Session) {
    session.purge();
}

/// Resolve the session's user id to a profile, if any. Database errors are
/// logged and treated as a guest request rather than failing the page.
pub async fn authenticate_by_session(session: &Session) -> Option<Profile> {
    let user_id = session.get::<i32>(USER_KEY).ok().flatten()?;

    match Profile::get_by_id(get_db_pool(), user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            log::error!("session user lookup failed: user_id={} {:?}", user_id, e);
            None
        }
    }
}

/// A one-shot message displayed on the next rendered page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Flash {
    /// Alert styling class: info, success, warning, danger.
    pub kind: String,
    pub message: String,
}

pub fn flash(session: &Session, kind: &str, message: &str) {
    let mut flashes: Vec<Flash> = session.get(FLASH_KEY).ok().flatten().unwrap_or_default();
    flashes.push(Flash {
        kind: kind.to_owned(),
        message: message.to_owned(),
    });

    if let Err(e) = session.insert(FLASH_KEY, &flashes) {
        log::warn!("failed to store flash message: {}", e);
    }
}

/// Remove and return any pending flash messages.
pub fn take_flashes(session: &Session) -> Vec<Flash> {
    let flashes: Vec<Flash> = session.get(FLASH_KEY).ok().flatten().unwrap_or_default();
    if !flashes.is_empty() {
        session.remove(FLASH_KEY);
    }
    flashes
}
