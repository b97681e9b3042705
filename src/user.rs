//! Signed-in user read model.

use crate::orm::users;
use sea_orm::{entity::*, DatabaseConnection, DbErr};

/// The slice of a user row the rest of the application cares about.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<users::Model> for Profile {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}

impl Profile {
    pub async fn get_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<Profile>, DbErr> {
        Ok(users::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(Profile::from))
    }
}
