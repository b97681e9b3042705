//! Transactional email outbox.
//!
//! State-changing code records the emails it wants sent in the same
//! transaction as the state change. A background task drains pending rows,
//! so delivery failures never roll back or block a committed mutation.

use crate::db::get_db_pool;
use crate::orm::email_outbox::{self, OutboxStatus};
use sea_orm::{entity::*, query::*, sea_query::Expr, ConnectionTrait, DatabaseConnection, DbErr};
use std::time::Duration;

/// Delivery attempts before a row is parked as failed.
pub const MAX_ATTEMPTS: i32 = 5;

/// Rows drained per delivery pass.
const DELIVERY_BATCH: u64 = 20;

/// Seconds between delivery passes.
const DELIVERY_INTERVAL_SECS: u64 = 30;

/// Queue an email for delivery. Joins the caller's transaction.
pub async fn enqueue<'a, C: ConnectionTrait>(
    db: &'a C,
    recipient: &str,
    subject: String,
    body: String,
) -> Result<i32, DbErr> {
    let row = email_outbox::ActiveModel {
        recipient: Set(recipient.to_owned()),
        subject: Set(subject),
        body: Set(body),
        status: Set(OutboxStatus::Pending),
        attempts: Set(0),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };

    let row = row.insert(db).await?;
    Ok(row.id)
}

/// Deliver a batch of pending rows. Returns how many were sent.
///
/// Send failures are caught and recorded on the row; they are retried on a
/// later pass until MAX_ATTEMPTS, then marked failed.
pub async fn deliver_pending(db: &DatabaseConnection) -> Result<usize, DbErr> {
    let pending = email_outbox::Entity::find()
        .filter(email_outbox::Column::Status.eq(OutboxStatus::Pending))
        .order_by_asc(email_outbox::Column::CreatedAt)
        .limit(DELIVERY_BATCH)
        .all(db)
        .await?;

    let mut sent = 0;

    for row in pending {
        match crate::email::send_email(&row.recipient, &row.subject, &row.body).await {
            Ok(()) => {
                let mut update: email_outbox::ActiveModel = row.into();
                update.status = Set(OutboxStatus::Sent);
                update.sent_at = Set(Some(chrono::Utc::now().naive_utc()));
                update.update(db).await?;
                sent += 1;
            }
            Err(e) => {
                let attempts = row.attempts + 1;
                log::warn!(
                    "outbox delivery failed: id={} attempt={} recipient={} error={}",
                    row.id,
                    attempts,
                    row.recipient,
                    e
                );

                let mut update: email_outbox::ActiveModel = row.into();
                update.attempts = Set(attempts);
                update.last_error = Set(Some(e.to_string()));
                if attempts >= MAX_ATTEMPTS {
                    update.status = Set(OutboxStatus::Failed);
                }
                update.update(db).await?;
            }
        }
    }

    Ok(sent)
}

/// Requeue failed rows, clearing their attempt counter. Operator tooling;
/// nothing calls this on a request path.
pub async fn retry_failed(db: &DatabaseConnection) -> Result<u64, DbErr> {
    let result = email_outbox::Entity::update_many()
        .col_expr(
            email_outbox::Column::Status,
            Expr::value(OutboxStatus::Pending),
        )
        .col_expr(email_outbox::Column::Attempts, Expr::value(0))
        .filter(email_outbox::Column::Status.eq(OutboxStatus::Failed))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Spawn the periodic delivery task. Called once from main after the pool
/// is initialized.
pub fn spawn_delivery_task() {
    actix_web::rt::spawn(async {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(DELIVERY_INTERVAL_SECS));
        loop {
            interval.tick().await;
            match deliver_pending(get_db_pool()).await {
                Ok(0) => {}
                Ok(n) => log::debug!("outbox delivered {} email(s)", n),
                Err(e) => log::error!("outbox delivery pass failed: {}", e),
            }
        }
    });
}
