use poise::serenity_prelude::{ChannelId, GuildChannel, GuildId};
use tracing::info;

use crate::{
    Context, Error,
    entities::welcome_settings,
    events::{guild_member::guild_name, welcome::welcome_component_for},
    infrastructure::{
        ids::{id_from_string, require_guild_id},
        replies::{reply_text, send_component_message},
    },
    models::welcome_settings::{
        get_welcome_settings, update_welcome_enabled, update_welcome_message,
        upsert_welcome_settings,
    },
};

pub const NOT_CONFIGURED: &str =
    "❌ Welcome system is not configured yet. Use `/welcome setup` first.";

pub fn settings_summary(settings: &welcome_settings::Model, channel_found: bool) -> String {
    let status = if settings.enabled {
        "✅ Enabled"
    } else {
        "❌ Disabled"
    };
    let channel = if channel_found {
        format!("<#{}>", settings.channel_id)
    } else {
        "Not found".to_string()
    };
    let custom_message = settings
        .custom_message
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or("Default message");
    format!(
        "## Welcome Settings\n\n**Status:** {}\n**Channel:** {}\n**Custom Message:**\n{}",
        status, channel, custom_message
    )
}

/// The configured channel, if it still exists in the guild.
async fn configured_channel(
    ctx: Context<'_>,
    guild_id: GuildId,
    settings: &welcome_settings::Model,
) -> Result<Option<GuildChannel>, Error> {
    let channel_id = id_from_string::<ChannelId>(&settings.channel_id)?;
    Ok(guild_id.channels(ctx.http()).await?.remove(&channel_id))
}

/// Configure welcome messages for new members
#[poise::command(
    slash_command,
    default_member_permissions = "ADMINISTRATOR",
    guild_only,
    category = "Admin",
    subcommands(
        "welcome_setup",
        "welcome_disable",
        "welcome_enable",
        "welcome_message",
        "welcome_test",
        "welcome_info"
    ),
    subcommand_required
)]
pub async fn welcome(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Setup welcome channel
#[poise::command(slash_command, rename = "setup", guild_only)]
pub async fn welcome_setup(
    ctx: Context<'_>,
    #[description = "Channel to send welcome messages"]
    #[channel_types("Text", "News")]
    channel: GuildChannel,
) -> Result<(), Error> {
    let guild_id = require_guild_id(ctx)?;
    upsert_welcome_settings(&ctx.data().db_pool, guild_id, channel.id, true, None).await?;
    info!(guild_id = %guild_id, channel_id = %channel.id, "Welcome channel configured");
    reply_text(
        ctx,
        format!("✅ Welcome messages will be sent to <#{}>", channel.id),
        true,
    )
    .await
}

/// Disable welcome messages
#[poise::command(slash_command, rename = "disable", guild_only)]
pub async fn welcome_disable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild_id(ctx)?;
    match update_welcome_enabled(&ctx.data().db_pool, guild_id, false).await? {
        Some(_) => reply_text(ctx, "✅ Welcome messages have been disabled", true).await,
        None => reply_text(ctx, NOT_CONFIGURED, true).await,
    }
}

/// Enable welcome messages
#[poise::command(slash_command, rename = "enable", guild_only)]
pub async fn welcome_enable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild_id(ctx)?;
    match update_welcome_enabled(&ctx.data().db_pool, guild_id, true).await? {
        Some(_) => reply_text(ctx, "✅ Welcome messages have been enabled", true).await,
        None => reply_text(ctx, NOT_CONFIGURED, true).await,
    }
}

/// Set custom welcome message
#[poise::command(slash_command, rename = "message", guild_only)]
pub async fn welcome_message(
    ctx: Context<'_>,
    #[description = "Custom message (use {user}, {server}, {username})"] text: String,
) -> Result<(), Error> {
    let guild_id = require_guild_id(ctx)?;
    match update_welcome_message(&ctx.data().db_pool, guild_id, text.clone()).await? {
        Some(_) => {
            reply_text(
                ctx,
                format!(
                    "✅ Custom welcome message has been set!\n\n**Preview:**\n{}",
                    text
                ),
                true,
            )
            .await
        }
        None => reply_text(ctx, NOT_CONFIGURED, true).await,
    }
}

/// Test welcome message with your account
#[poise::command(slash_command, rename = "test", guild_only)]
pub async fn welcome_test(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild_id(ctx)?;
    let Some(settings) = get_welcome_settings(&ctx.data().db_pool, guild_id).await? else {
        return reply_text(ctx, NOT_CONFIGURED, true).await;
    };
    let Some(channel) = configured_channel(ctx, guild_id, &settings).await? else {
        return reply_text(ctx, "❌ Welcome channel not found!", true).await;
    };

    let server_name = guild_name(ctx.serenity_context(), guild_id).await;
    let payload = welcome_component_for(
        ctx.author(),
        &server_name,
        settings.custom_message.as_deref(),
    );
    send_component_message(ctx.http(), channel.id, payload).await?;

    reply_text(
        ctx,
        format!("✅ Test welcome message sent to <#{}>", channel.id),
        true,
    )
    .await
}

/// Show current welcome settings
#[poise::command(slash_command, rename = "info", guild_only)]
pub async fn welcome_info(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild_id(ctx)?;
    let Some(settings) = get_welcome_settings(&ctx.data().db_pool, guild_id).await? else {
        return reply_text(ctx, NOT_CONFIGURED, true).await;
    };
    let channel_found = configured_channel(ctx, guild_id, &settings).await?.is_some();
    reply_text(ctx, settings_summary(&settings, channel_found), true).await
}

#[cfg(test)]
mod tests {
    use crate::models::now;

    use super::*;

    fn settings(enabled: bool, custom_message: Option<&str>) -> welcome_settings::Model {
        welcome_settings::Model {
            id: 1,
            guild_id: "10".into(),
            channel_id: "20".into(),
            enabled,
            custom_message: custom_message.map(str::to_string),
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn summary_shows_channel_and_default_message() {
        assert_eq!(
            settings_summary(&settings(true, None), true),
            "## Welcome Settings\n\n**Status:** ✅ Enabled\n**Channel:** <#20>\n**Custom Message:**\nDefault message"
        );
    }

    #[test]
    fn summary_reports_missing_channel_and_custom_text() {
        let summary = settings_summary(&settings(false, Some("Hi {user}")), false);
        assert!(summary.contains("**Status:** ❌ Disabled"));
        assert!(summary.contains("**Channel:** Not found"));
        assert!(summary.ends_with("Hi {user}"));
    }
}
