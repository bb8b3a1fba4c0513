//! Thin data-access helpers over the `SeaORM` entities.
//!
//! Every function takes the connection explicitly so the same helpers are usable from
//! command handlers, gateway events and the background stats refresher.

use sea_orm::prelude::DateTimeWithTimeZone;

pub mod auto_role;
pub mod server_stats;
pub mod welcome_settings;

pub(crate) fn now() -> DateTimeWithTimeZone {
    chrono::Utc::now().fixed_offset()
}
