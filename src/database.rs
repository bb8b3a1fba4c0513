use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use ophelia_bot::infrastructure::environment::{get_data_directory, get_database_url};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

pub async fn init_database() -> Result<DatabaseConnection> {
    ensure_data_dir_created()?;
    let db = create_db_pool().await?;
    init_db(&db).await?;

    Ok(db)
}

fn ensure_data_dir_created() -> Result<()> {
    let path = get_data_directory();
    std::fs::create_dir_all(&path).context(format!("Failed to create data directory {:?}", path))
}

async fn create_db_pool() -> Result<DatabaseConnection> {
    let opt = ConnectOptions::new(get_database_url());
    let backend = opt.get_url().split(':').next().unwrap_or_default().to_string();
    let db = Database::connect(opt)
        .await
        .context("Failed to connect to the database")?;
    info!(backend = %backend, "Connected to database.");
    Ok(db)
}

async fn init_db(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .context("Failed to migrate database to latest")?;
    info!("Database initialized.");
    Ok(())
}
