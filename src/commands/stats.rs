use poise::serenity_prelude::{
    ChannelType, CreateChannel, GuildChannel, GuildId, PermissionOverwrite,
    PermissionOverwriteType, Permissions, RoleId,
};
use tracing::{info, warn};

use crate::{
    Context, Error,
    entities::server_stat,
    events::server_stats::{
        COUNT_PLACEHOLDER, StatKind, gather_counts, render_stat_name, update_all_server_stats,
    },
    infrastructure::{
        ids::require_guild_id,
        message_components::component_reply,
        replies::{reply_text, send_component_reply},
        util::defer_or_broadcast,
    },
    models::server_stats::{
        delete_server_stat, get_server_stat, list_server_stats, upsert_server_stat,
        update_server_stat_enabled,
    },
};

fn bot_avatar(ctx: Context<'_>) -> String {
    ctx.cache().current_user().face()
}

/// `@everyone` may see the channel but not join it.
fn locked_voice_channel(guild_id: GuildId, name: &str) -> CreateChannel<'static> {
    CreateChannel::new(name)
        .kind(ChannelType::Voice)
        .permissions(vec![PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::CONNECT,
            kind: PermissionOverwriteType::Role(RoleId::new(guild_id.get())),
        }])
}

pub fn describe_stat(stat: &server_stat::Model) -> String {
    let kind = StatKind::parse(&stat.stat_type)
        .map(|k| k.display_name())
        .unwrap_or_else(|| stat.stat_type.clone());
    let state = if stat.enabled { "✅ Enabled" } else { "❌ Disabled" };
    format!(
        "- **{}** in <#{}>: `{}` ({})",
        kind, stat.channel_id, stat.text_format, state
    )
}

/// Setup auto-updating server stats in voice channels
#[poise::command(
    slash_command,
    rename = "start-listener",
    default_member_permissions = "ADMINISTRATOR",
    required_bot_permissions = "MANAGE_CHANNELS",
    guild_only,
    category = "Admin"
)]
pub async fn start_listener(
    ctx: Context<'_>,
    #[rename = "type"]
    #[description = "Type of stat to track"]
    stat_type: StatKind,
    #[description = "Text format (use {COUNT} placeholder)"] text: String,
    #[description = "Voice channel to update (will create new if not specified)"]
    #[channel_types("Voice")]
    channel: Option<GuildChannel>,
) -> Result<(), Error> {
    let guild_id = require_guild_id(ctx)?;
    if !text.contains(COUNT_PLACEHOLDER) {
        return reply_text(ctx, "❌ Text format must include {COUNT} placeholder!", true).await;
    }

    defer_or_broadcast(ctx, true).await?;

    let channel_id = match channel {
        Some(channel) => channel.id,
        None => {
            let counts = gather_counts(
                ctx.serenity_context(),
                guild_id,
                stat_type.needs_member_breakdown(),
            )
            .await?;
            let name = render_stat_name(&text, stat_type.count(&counts));
            let created = guild_id
                .create_channel(ctx, locked_voice_channel(guild_id, &name))
                .await?;
            info!(guild_id = %guild_id, "Created stat voice channel: {}", created.name);
            created.id
        }
    };

    upsert_server_stat(&ctx.data().db_pool, guild_id, channel_id, stat_type, &text, true).await?;
    update_all_server_stats(ctx.serenity_context(), &ctx.data().db_pool, guild_id).await;

    let content = format!(
        "## Server stats listener started!\n- Type: **{}**\n- Channel: <#{}>\n- Format: **{}**",
        stat_type.display_name(),
        channel_id,
        text
    );
    send_component_reply(ctx, component_reply(content, Some(bot_avatar(ctx).as_str()), true)).await
}

/// Stop updating a server stat channel
#[poise::command(
    slash_command,
    rename = "stop-listener",
    default_member_permissions = "ADMINISTRATOR",
    guild_only,
    category = "Admin"
)]
pub async fn stop_listener(
    ctx: Context<'_>,
    #[description = "Stat voice channel"]
    #[channel_types("Voice")]
    channel: GuildChannel,
    #[description = "Forget the listener instead of disabling it"] remove: Option<bool>,
    #[description = "Also delete the voice channel"] delete_channel: Option<bool>,
) -> Result<(), Error> {
    let guild_id = require_guild_id(ctx)?;
    let db = &ctx.data().db_pool;
    if get_server_stat(db, guild_id, channel.id).await?.is_none() {
        return reply_text(
            ctx,
            "❌ No stat listener is configured for that channel.",
            true,
        )
        .await;
    }

    let mut lines = Vec::new();
    if remove.unwrap_or(false) {
        delete_server_stat(db, guild_id, channel.id).await?;
        lines.push(format!("✅ Stat listener for <#{}> removed.", channel.id));
    } else {
        update_server_stat_enabled(db, guild_id, channel.id, false).await?;
        lines.push(format!("✅ Stat listener for <#{}> disabled.", channel.id));
    }

    if delete_channel.unwrap_or(false) {
        match channel.id.delete(ctx).await {
            Ok(_) => lines.push(format!("Deleted voice channel **{}**.", channel.name)),
            Err(e) => {
                warn!(guild_id = %guild_id, channel_id = %channel.id, "Failed to delete stat channel: {}", e);
                lines.push("❌ The voice channel could not be deleted.".to_string());
            }
        }
    }
    info!(guild_id = %guild_id, channel_id = %channel.id, "Stat listener stopped");

    reply_text(ctx, lines.join("\n"), true).await
}

/// List the server stat channels of this server
#[poise::command(
    slash_command,
    rename = "list-listeners",
    default_member_permissions = "ADMINISTRATOR",
    guild_only,
    category = "Admin"
)]
pub async fn list_listeners(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild_id(ctx)?;
    let stats = list_server_stats(&ctx.data().db_pool, guild_id).await?;
    if stats.is_empty() {
        return reply_text(ctx, "No stat listeners are configured for this server.", true).await;
    }

    let lines: Vec<String> = stats.iter().map(describe_stat).collect();
    reply_text(
        ctx,
        format!("## Server stat listeners\n{}", lines.join("\n")),
        true,
    )
    .await
}

#[cfg(test)]
mod tests {
    use crate::models::now;

    use super::*;

    fn stat(stat_type: &str, enabled: bool) -> server_stat::Model {
        server_stat::Model {
            id: 1,
            guild_id: "1".into(),
            channel_id: "55".into(),
            stat_type: stat_type.into(),
            text_format: "Members: {COUNT}".into(),
            enabled,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn describes_enabled_stats() {
        assert_eq!(
            describe_stat(&stat("ALL_MEMBERS", true)),
            "- **ALL MEMBERS** in <#55>: `Members: {COUNT}` (✅ Enabled)"
        );
    }

    #[test]
    fn describes_unknown_kinds_verbatim() {
        let line = describe_stat(&stat("VOICE", false));
        assert!(line.starts_with("- **VOICE**"));
        assert!(line.ends_with("(❌ Disabled)"));
    }

    #[test]
    fn created_channels_carry_the_everyone_overwrite() {
        let guild_id = GuildId::new(77);
        let value = serde_json::to_value(locked_voice_channel(guild_id, "Members: 3")).unwrap();
        assert_eq!(value["name"], "Members: 3");
        assert_eq!(value["type"], 2);
        assert_eq!(value["permission_overwrites"].as_array().map(Vec::len), Some(1));
    }
}
