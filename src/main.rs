mod client;
mod database;
mod logging;
mod shutdown;

use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = logging::init_logger();
    let db = database::init_database().await?;
    let mut client = client::create_serenity_client(db.clone()).await?;
    let shard_manager = client.shard_manager.clone();

    shutdown::run_until_shutdown(client.start(), move || async move {
        shard_manager.shutdown_all().await;
        db.close().await.context("Failed to close database connection")?;
        Ok(())
    })
    .await
}
