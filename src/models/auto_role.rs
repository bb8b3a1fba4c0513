use migration::OnConflict;
use poise::serenity_prelude::{GuildId, RoleId};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
};
use tracing::trace;

use crate::{entities::auto_role, infrastructure::ids::id_to_string, models::now};

pub async fn get_auto_role(
    db: &DatabaseConnection,
    guild_id: GuildId,
) -> Result<Option<auto_role::Model>, DbErr> {
    auto_role::Entity::find()
        .filter(auto_role::Column::GuildId.eq(id_to_string(guild_id)))
        .one(db)
        .await
}

/// Sets the auto role for a guild, replacing any previously configured role.
pub async fn upsert_auto_role(
    db: &DatabaseConnection,
    guild_id: GuildId,
    role_id: RoleId,
) -> Result<auto_role::Model, DbErr> {
    trace!(guild_id = %guild_id, role_id = %role_id, "upserting auto role");
    let timestamp = now();
    auto_role::Entity::insert(auto_role::ActiveModel {
        guild_id: Set(id_to_string(guild_id)),
        role_id: Set(id_to_string(role_id)),
        created_at: Set(timestamp),
        updated_at: Set(timestamp),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(auto_role::Column::GuildId)
            .update_columns([auto_role::Column::RoleId, auto_role::Column::UpdatedAt])
            .to_owned(),
    )
    .exec(db)
    .await?;

    get_auto_role(db, guild_id)
        .await?
        .ok_or(DbErr::RecordNotFound(format!(
            "auto role for guild {}",
            guild_id
        )))
}

/// Returns true when a configuration existed and was removed.
pub async fn delete_auto_role(db: &DatabaseConnection, guild_id: GuildId) -> Result<bool, DbErr> {
    let result = auto_role::Entity::delete_many()
        .filter(auto_role::Column::GuildId.eq(id_to_string(guild_id)))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::migrated_db;

    #[tokio::test]
    async fn missing_auto_role_is_none() {
        let db = migrated_db().await;
        let role = get_auto_role(&db, GuildId::new(1)).await.unwrap();
        assert!(role.is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_existing_role() {
        let db = migrated_db().await;
        let guild = GuildId::new(10);

        let first = upsert_auto_role(&db, guild, RoleId::new(100)).await.unwrap();
        assert_eq!(first.role_id, "100");

        let second = upsert_auto_role(&db, guild, RoleId::new(200)).await.unwrap();
        assert_eq!(second.role_id, "200");
        assert_eq!(first.id, second.id);

        let all = auto_role::Entity::find().all(&db).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn roles_are_scoped_per_guild() {
        let db = migrated_db().await;
        upsert_auto_role(&db, GuildId::new(1), RoleId::new(11)).await.unwrap();
        upsert_auto_role(&db, GuildId::new(2), RoleId::new(22)).await.unwrap();

        let role = get_auto_role(&db, GuildId::new(2)).await.unwrap().unwrap();
        assert_eq!(role.role_id, "22");
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let db = migrated_db().await;
        let guild = GuildId::new(5);
        assert!(!delete_auto_role(&db, guild).await.unwrap());

        upsert_auto_role(&db, guild, RoleId::new(7)).await.unwrap();
        assert!(delete_auto_role(&db, guild).await.unwrap());
        assert!(get_auto_role(&db, guild).await.unwrap().is_none());
    }
}
