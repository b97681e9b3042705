//! In-app notification system
//!
//! Notification rows are inserted in the same transaction as the lifecycle
//! change that caused them, so a committed state change always has its
//! notification on record.

pub mod dispatcher;

use crate::orm::notifications::{self, NotificationKind};
use sea_orm::{entity::*, query::*, sea_query::Expr, ConnectionTrait, DbErr};

/// Create a notification for a user. Callable inside a transaction.
pub async fn create_notification<'a, C: ConnectionTrait>(
    db: &'a C,
    user_id: i32,
    kind: NotificationKind,
    title: String,
    message: String,
) -> Result<i32, DbErr> {
    let notification = notifications::ActiveModel {
        user_id: Set(user_id),
        kind: Set(kind),
        title: Set(title),
        message: Set(message),
        is_read: Set(false),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };

    let result = notification.insert(db).await?;
    Ok(result.id)
}

/// Count unread notifications for a user
pub async fn count_unread_notifications(user_id: i32) -> Result<i64, DbErr> {
    let db = crate::db::get_db_pool();

    let count = notifications::Entity::find()
        .filter(notifications::Column::UserId.eq(user_id))
        .filter(notifications::Column::IsRead.eq(false))
        .count(db)
        .await?;

    Ok(count as i64)
}

/// Mark a notification as read. The user filter keeps one user from
/// touching another's notifications.
pub async fn mark_notification_read(notification_id: i32, user_id: i32) -> Result<(), DbErr> {
    let db = crate::db::get_db_pool();

    notifications::Entity::update_many()
        .col_expr(notifications::Column::IsRead, Expr::value(true))
        .col_expr(
            notifications::Column::ReadAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
        .filter(notifications::Column::Id.eq(notification_id))
        .filter(notifications::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    Ok(())
}

/// Mark all notifications as read for a user
pub async fn mark_all_read(user_id: i32) -> Result<(), DbErr> {
    let db = crate::db::get_db_pool();

    notifications::Entity::update_many()
        .col_expr(notifications::Column::IsRead, Expr::value(true))
        .col_expr(
            notifications::Column::ReadAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
        .filter(notifications::Column::UserId.eq(user_id))
        .filter(notifications::Column::IsRead.eq(false))
        .exec(db)
        .await?;

    Ok(())
}

/// Fetch recent notifications for a user
pub async fn get_user_notifications(
    user_id: i32,
    limit: u64,
    show_read: bool,
) -> Result<Vec<notifications::Model>, DbErr> {
    let db = crate::db::get_db_pool();

    let mut query = notifications::Entity::find()
        .filter(notifications::Column::UserId.eq(user_id))
        .order_by_desc(notifications::Column::CreatedAt)
        .limit(limit);

    if !show_read {
        query = query.filter(notifications::Column::IsRead.eq(false));
    }

    query.all(db).await
}
