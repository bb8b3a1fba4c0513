use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServerStats::Table)
                    .if_not_exists()
                    .col(pk_auto(ServerStats::Id))
                    .col(string(ServerStats::GuildId))
                    .col(string(ServerStats::ChannelId))
                    .col(string_len(ServerStats::StatType, 50))
                    .col(text(ServerStats::TextFormat))
                    .col(boolean(ServerStats::Enabled).default(true))
                    .col(timestamp_with_time_zone(ServerStats::CreatedAt))
                    .col(timestamp_with_time_zone(ServerStats::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                IndexCreateStatement::new()
                    .table(ServerStats::Table)
                    .name("idx-server-stats-guild-channel")
                    .col(ServerStats::GuildId)
                    .col(ServerStats::ChannelId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServerStats::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum ServerStats {
    Table,
    Id,
    GuildId,   // Unique with ChannelId
    ChannelId, // Unique with GuildId
    StatType,
    TextFormat,
    Enabled,
    CreatedAt,
    UpdatedAt,
}
