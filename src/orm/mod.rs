//! SeaORM entity definitions, one module per table.

pub mod categories;
pub mod donations;
pub mod email_outbox;
pub mod matches;
pub mod notifications;
pub mod requests;
pub mod users;
