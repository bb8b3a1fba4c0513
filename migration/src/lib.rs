pub use sea_orm_migration::prelude::*;

mod m20250101_000001_initial;
mod m20250214_000001_server_stats;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_initial::Migration),
            Box::new(m20250214_000001_server_stats::Migration),
        ]
    }
}
