//! `SeaORM` entities for the tables created by the `migration` crate.

pub mod auto_role;
pub mod server_stat;
pub mod welcome_settings;
