//! Idempotent startup seeding.
//!
//! Every boot converges the database toward the same baseline: the default
//! category set and one admin account. Existing rows are left untouched, so
//! rerunning is always safe.

use crate::orm::{categories, users};
use crate::session::get_argon2;
use anyhow::Context;
use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use rand::{distributions::Alphanumeric, Rng};
use sea_orm::{entity::*, query::*, DatabaseConnection};

const DEFAULT_CATEGORIES: [(&str, &str); 8] = [
    ("Clothing", "Clothes, shoes, accessories"),
    ("Household Items", "Furniture, kitchenware, decorations"),
    ("Electronics", "Phones, computers, appliances"),
    ("Books & Media", "Books, movies, games"),
    ("Toys & Games", "Children's toys and games"),
    ("Personal Care", "Hygiene products, cosmetics"),
    ("Food & Supplies", "Non-perishable food items"),
    ("Other", "Items that don't fit other categories"),
];

const ADMIN_USERNAME: &str = "admin";

/// Bring the database to its seeded baseline. Called once at startup,
/// after the pool and session module are initialized.
pub async fn ensure_defaults(db: &DatabaseConnection) -> anyhow::Result<()> {
    ensure_categories(db).await?;
    ensure_admin_user(db).await?;
    Ok(())
}

async fn ensure_categories(db: &DatabaseConnection) -> anyhow::Result<()> {
    for (name, description) in DEFAULT_CATEGORIES {
        let existing = categories::Entity::find()
            .filter(categories::Column::Name.eq(name))
            .one(db)
            .await
            .context("seed category lookup")?;

        if existing.is_none() {
            categories::ActiveModel {
                name: Set(name.to_owned()),
                description: Set(Some(description.to_owned())),
                created_at: Set(chrono::Utc::now().naive_utc()),
                ..Default::default()
            }
            .insert(db)
            .await
            .context("seed category insert")?;

            log::info!("seeded category: {}", name);
        }
    }

    Ok(())
}

async fn ensure_admin_user(db: &DatabaseConnection) -> anyhow::Result<()> {
    let existing = users::Entity::find()
        .filter(users::Column::Username.eq(ADMIN_USERNAME))
        .one(db)
        .await
        .context("seed admin lookup")?;

    if existing.is_some() {
        return Ok(());
    }

    let email =
        std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@localhost".to_string());

    let password = match std::env::var("ADMIN_PASSWORD") {
        Ok(password) if !password.is_empty() => password,
        _ => {
            let generated: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(24)
                .map(char::from)
                .collect();
            log::warn!(
                "ADMIN_PASSWORD was not set. Generated admin password: {}\r\nSet ADMIN_PASSWORD before first boot to choose your own.",
                generated
            );
            generated
        }
    };

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = get_argon2()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash admin password: {}", e))?
        .to_string();

    users::ActiveModel {
        username: Set(ADMIN_USERNAME.to_owned()),
        email: Set(email),
        password: Set(password_hash),
        is_admin: Set(true),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .context("seed admin insert")?;

    log::info!("seeded admin user: {}", ADMIN_USERNAME);

    Ok(())
}
