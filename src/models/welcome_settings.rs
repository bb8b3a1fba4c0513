use migration::OnConflict;
use poise::serenity_prelude::{ChannelId, GuildId};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter,
};
use tracing::trace;

use crate::{entities::welcome_settings, infrastructure::ids::id_to_string, models::now};

pub async fn get_welcome_settings(
    db: &DatabaseConnection,
    guild_id: GuildId,
) -> Result<Option<welcome_settings::Model>, DbErr> {
    welcome_settings::Entity::find()
        .filter(welcome_settings::Column::GuildId.eq(id_to_string(guild_id)))
        .one(db)
        .await
}

/// Creates or replaces the welcome configuration of a guild.
///
/// An existing custom message is kept unless a new one is provided.
pub async fn upsert_welcome_settings(
    db: &DatabaseConnection,
    guild_id: GuildId,
    channel_id: ChannelId,
    enabled: bool,
    custom_message: Option<String>,
) -> Result<welcome_settings::Model, DbErr> {
    trace!(guild_id = %guild_id, channel_id = %channel_id, enabled, "upserting welcome settings");
    let mut update_columns = vec![
        welcome_settings::Column::ChannelId,
        welcome_settings::Column::Enabled,
        welcome_settings::Column::UpdatedAt,
    ];
    if custom_message.is_some() {
        update_columns.push(welcome_settings::Column::CustomMessage);
    }

    let timestamp = now();
    welcome_settings::Entity::insert(welcome_settings::ActiveModel {
        guild_id: Set(id_to_string(guild_id)),
        channel_id: Set(id_to_string(channel_id)),
        enabled: Set(enabled),
        custom_message: Set(custom_message),
        created_at: Set(timestamp),
        updated_at: Set(timestamp),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(welcome_settings::Column::GuildId)
            .update_columns(update_columns)
            .to_owned(),
    )
    .exec(db)
    .await?;

    get_welcome_settings(db, guild_id)
        .await?
        .ok_or(DbErr::RecordNotFound(format!(
            "welcome settings for guild {}",
            guild_id
        )))
}

/// Returns `None` when the guild has not been configured yet.
pub async fn update_welcome_enabled(
    db: &DatabaseConnection,
    guild_id: GuildId,
    enabled: bool,
) -> Result<Option<welcome_settings::Model>, DbErr> {
    let Some(existing) = get_welcome_settings(db, guild_id).await? else {
        return Ok(None);
    };
    let mut model = existing.into_active_model();
    model.enabled = Set(enabled);
    model.updated_at = Set(now());
    Ok(Some(model.update(db).await?))
}

/// Returns `None` when the guild has not been configured yet.
pub async fn update_welcome_message(
    db: &DatabaseConnection,
    guild_id: GuildId,
    message: String,
) -> Result<Option<welcome_settings::Model>, DbErr> {
    let Some(existing) = get_welcome_settings(db, guild_id).await? else {
        return Ok(None);
    };
    let mut model = existing.into_active_model();
    model.custom_message = Set(Some(message));
    model.updated_at = Set(now());
    Ok(Some(model.update(db).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::migrated_db;

    #[tokio::test]
    async fn setup_creates_enabled_settings() {
        let db = migrated_db().await;
        let settings =
            upsert_welcome_settings(&db, GuildId::new(1), ChannelId::new(2), true, None)
                .await
                .unwrap();
        assert_eq!(settings.guild_id, "1");
        assert_eq!(settings.channel_id, "2");
        assert!(settings.enabled);
        assert_eq!(settings.custom_message, None);
    }

    #[tokio::test]
    async fn setup_again_moves_channel_and_keeps_message() {
        let db = migrated_db().await;
        let guild = GuildId::new(1);
        upsert_welcome_settings(&db, guild, ChannelId::new(2), true, None)
            .await
            .unwrap();
        update_welcome_message(&db, guild, "hi {user}".into())
            .await
            .unwrap();
        update_welcome_enabled(&db, guild, false).await.unwrap();

        let settings = upsert_welcome_settings(&db, guild, ChannelId::new(3), true, None)
            .await
            .unwrap();
        assert_eq!(settings.channel_id, "3");
        assert!(settings.enabled);
        assert_eq!(settings.custom_message.as_deref(), Some("hi {user}"));
    }

    #[tokio::test]
    async fn updates_on_unconfigured_guild_return_none() {
        let db = migrated_db().await;
        let guild = GuildId::new(9);
        assert!(update_welcome_enabled(&db, guild, true).await.unwrap().is_none());
        assert!(
            update_welcome_message(&db, guild, "hello".into())
                .await
                .unwrap()
                .is_none()
        );
        assert!(get_welcome_settings(&db, guild).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn toggling_enabled_is_persisted() {
        let db = migrated_db().await;
        let guild = GuildId::new(4);
        upsert_welcome_settings(&db, guild, ChannelId::new(5), true, None)
            .await
            .unwrap();

        let disabled = update_welcome_enabled(&db, guild, false).await.unwrap().unwrap();
        assert!(!disabled.enabled);

        let stored = get_welcome_settings(&db, guild).await.unwrap().unwrap();
        assert!(!stored.enabled);
    }
}
