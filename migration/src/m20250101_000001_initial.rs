use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WelcomeSettings::Table)
                    .if_not_exists()
                    .col(pk_auto(WelcomeSettings::Id))
                    .col(string_uniq(WelcomeSettings::GuildId))
                    .col(string(WelcomeSettings::ChannelId))
                    .col(boolean(WelcomeSettings::Enabled).default(true))
                    .col(text_null(WelcomeSettings::CustomMessage))
                    .col(timestamp_with_time_zone(WelcomeSettings::CreatedAt))
                    .col(timestamp_with_time_zone(WelcomeSettings::UpdatedAt))
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                Table::create()
                    .table(AutoRoles::Table)
                    .if_not_exists()
                    .col(pk_auto(AutoRoles::Id))
                    .col(string_uniq(AutoRoles::GuildId))
                    .col(string(AutoRoles::RoleId))
                    .col(timestamp_with_time_zone(AutoRoles::CreatedAt))
                    .col(timestamp_with_time_zone(AutoRoles::UpdatedAt))
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WelcomeSettings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AutoRoles::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum WelcomeSettings {
    Table,
    Id,
    GuildId, // Unique
    ChannelId,
    Enabled,
    CustomMessage,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AutoRoles {
    Table,
    Id,
    GuildId, // Unique
    RoleId,
    CreatedAt,
    UpdatedAt,
}
