use migration::OnConflict;
use poise::serenity_prelude::{ChannelId, GuildId};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::trace;

use crate::{
    entities::server_stat, events::server_stats::StatKind, infrastructure::ids::id_to_string,
    models::now,
};

fn by_guild_and_channel(guild_id: GuildId, channel_id: ChannelId) -> sea_orm::Condition {
    sea_orm::Condition::all()
        .add(server_stat::Column::GuildId.eq(id_to_string(guild_id)))
        .add(server_stat::Column::ChannelId.eq(id_to_string(channel_id)))
}

/// Enabled stats of a guild.
pub async fn get_all_server_stats(
    db: &DatabaseConnection,
    guild_id: GuildId,
) -> Result<Vec<server_stat::Model>, DbErr> {
    server_stat::Entity::find()
        .filter(server_stat::Column::GuildId.eq(id_to_string(guild_id)))
        .filter(server_stat::Column::Enabled.eq(true))
        .order_by_asc(server_stat::Column::Id)
        .all(db)
        .await
}

/// Every stat of a guild, including disabled ones.
pub async fn list_server_stats(
    db: &DatabaseConnection,
    guild_id: GuildId,
) -> Result<Vec<server_stat::Model>, DbErr> {
    server_stat::Entity::find()
        .filter(server_stat::Column::GuildId.eq(id_to_string(guild_id)))
        .order_by_asc(server_stat::Column::Id)
        .all(db)
        .await
}

pub async fn get_server_stat(
    db: &DatabaseConnection,
    guild_id: GuildId,
    channel_id: ChannelId,
) -> Result<Option<server_stat::Model>, DbErr> {
    server_stat::Entity::find()
        .filter(by_guild_and_channel(guild_id, channel_id))
        .one(db)
        .await
}

pub async fn upsert_server_stat(
    db: &DatabaseConnection,
    guild_id: GuildId,
    channel_id: ChannelId,
    stat_type: StatKind,
    text_format: &str,
    enabled: bool,
) -> Result<server_stat::Model, DbErr> {
    trace!(
        guild_id = %guild_id,
        channel_id = %channel_id,
        stat_type = stat_type.as_str(),
        "upserting server stat"
    );
    let timestamp = now();
    server_stat::Entity::insert(server_stat::ActiveModel {
        guild_id: Set(id_to_string(guild_id)),
        channel_id: Set(id_to_string(channel_id)),
        stat_type: Set(stat_type.as_str().to_string()),
        text_format: Set(text_format.to_string()),
        enabled: Set(enabled),
        created_at: Set(timestamp),
        updated_at: Set(timestamp),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([server_stat::Column::GuildId, server_stat::Column::ChannelId])
            .update_columns([
                server_stat::Column::StatType,
                server_stat::Column::TextFormat,
                server_stat::Column::Enabled,
                server_stat::Column::UpdatedAt,
            ])
            .to_owned(),
    )
    .exec(db)
    .await?;

    get_server_stat(db, guild_id, channel_id)
        .await?
        .ok_or(DbErr::RecordNotFound(format!(
            "server stat for channel {} in guild {}",
            channel_id, guild_id
        )))
}

/// Returns true when a stat existed and was removed.
pub async fn delete_server_stat(
    db: &DatabaseConnection,
    guild_id: GuildId,
    channel_id: ChannelId,
) -> Result<bool, DbErr> {
    let result = server_stat::Entity::delete_many()
        .filter(by_guild_and_channel(guild_id, channel_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Returns `None` when no stat is configured for the channel.
pub async fn update_server_stat_enabled(
    db: &DatabaseConnection,
    guild_id: GuildId,
    channel_id: ChannelId,
    enabled: bool,
) -> Result<Option<server_stat::Model>, DbErr> {
    let Some(existing) = get_server_stat(db, guild_id, channel_id).await? else {
        return Ok(None);
    };
    let mut model = existing.into_active_model();
    model.enabled = Set(enabled);
    model.updated_at = Set(now());
    Ok(Some(model.update(db).await?))
}

/// Distinct guild ids that have at least one enabled stat.
pub async fn guilds_with_enabled_stats(db: &DatabaseConnection) -> Result<Vec<String>, DbErr> {
    server_stat::Entity::find()
        .select_only()
        .column(server_stat::Column::GuildId)
        .filter(server_stat::Column::Enabled.eq(true))
        .distinct()
        .into_tuple::<String>()
        .all(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::migrated_db;

    const GUILD: GuildId = GuildId::new(100);

    #[tokio::test]
    async fn upsert_is_keyed_by_guild_and_channel() {
        let db = migrated_db().await;
        let channel = ChannelId::new(1);

        let first = upsert_server_stat(&db, GUILD, channel, StatKind::AllMembers, "All: {COUNT}", true)
            .await
            .unwrap();
        let second = upsert_server_stat(&db, GUILD, channel, StatKind::Members, "Humans: {COUNT}", true)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.stat_type, "MEMBERS");
        assert_eq!(second.text_format, "Humans: {COUNT}");
        assert_eq!(list_server_stats(&db, GUILD).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn disabled_stats_are_excluded_from_refresh_set() {
        let db = migrated_db().await;
        upsert_server_stat(&db, GUILD, ChannelId::new(1), StatKind::AllMembers, "{COUNT}", true)
            .await
            .unwrap();
        upsert_server_stat(&db, GUILD, ChannelId::new(2), StatKind::ServerBoost, "{COUNT}", true)
            .await
            .unwrap();

        let updated = update_server_stat_enabled(&db, GUILD, ChannelId::new(2), false)
            .await
            .unwrap()
            .unwrap();
        assert!(!updated.enabled);

        let enabled = get_all_server_stats(&db, GUILD).await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].channel_id, "1");
        assert_eq!(list_server_stats(&db, GUILD).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_enabled_on_unknown_channel_is_none() {
        let db = migrated_db().await;
        let result = update_server_stat_enabled(&db, GUILD, ChannelId::new(42), true)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_only_touches_matching_channel() {
        let db = migrated_db().await;
        upsert_server_stat(&db, GUILD, ChannelId::new(1), StatKind::Bots, "{COUNT}", true)
            .await
            .unwrap();
        upsert_server_stat(&db, GUILD, ChannelId::new(2), StatKind::Roles, "{COUNT}", true)
            .await
            .unwrap();

        assert!(delete_server_stat(&db, GUILD, ChannelId::new(1)).await.unwrap());
        assert!(!delete_server_stat(&db, GUILD, ChannelId::new(1)).await.unwrap());
        assert!(get_server_stat(&db, GUILD, ChannelId::new(2)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn guilds_with_enabled_stats_are_distinct() {
        let db = migrated_db().await;
        let other = GuildId::new(200);
        upsert_server_stat(&db, GUILD, ChannelId::new(1), StatKind::AllMembers, "{COUNT}", true)
            .await
            .unwrap();
        upsert_server_stat(&db, GUILD, ChannelId::new(2), StatKind::Members, "{COUNT}", true)
            .await
            .unwrap();
        upsert_server_stat(&db, other, ChannelId::new(3), StatKind::Members, "{COUNT}", false)
            .await
            .unwrap();

        let guilds = guilds_with_enabled_stats(&db).await.unwrap();
        assert_eq!(guilds, vec!["100".to_string()]);
    }
}
