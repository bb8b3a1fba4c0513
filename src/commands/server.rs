use poise::serenity_prelude::{
    ChannelType, GuildChannel, GuildId, Mentionable, Role, Timestamp, UserId,
};

use crate::{
    Context, Error,
    events::server_stats::gather_counts,
    infrastructure::{
        ids::require_guild_id,
        message_components::component_reply,
        replies::{reply_text, send_component_reply},
    },
};

pub const CDN_BASE: &str = "https://cdn.discordapp.com";
pub const CDN_IMAGE_SIZE: u32 = 1024;

/// Animated assets (hash prefixed with `a_`) are served as gif.
pub fn cdn_image_url(kind: &str, id: impl std::fmt::Display, hash: &str) -> String {
    let extension = if hash.starts_with("a_") { "gif" } else { "png" };
    format!(
        "{}/{}/{}/{}.{}?size={}",
        CDN_BASE, kind, id, hash, extension, CDN_IMAGE_SIZE
    )
}

/// Discord timestamp markup, rendered in each viewer's locale.
pub fn discord_timestamp(timestamp: Timestamp) -> String {
    format!("<t:{}:F>", timestamp.unix_timestamp())
}

pub fn hex_colour(value: u32) -> String {
    format!("#{:06x}", value)
}

/// Fields copied out of the cached guild so no cache lock is held across an await.
struct GuildSnapshot {
    id: GuildId,
    name: String,
    owner_id: UserId,
    member_count: u64,
    icon_url: Option<String>,
    banner_url: Option<String>,
}

async fn guild_snapshot(ctx: Context<'_>) -> Result<GuildSnapshot, Error> {
    let guild_id = require_guild_id(ctx)?;
    let cached = ctx.guild().map(|guild| GuildSnapshot {
        id: guild.id,
        name: guild.name.clone(),
        owner_id: guild.owner_id,
        member_count: guild.member_count,
        icon_url: guild
            .icon
            .as_ref()
            .map(|hash| cdn_image_url("icons", guild.id, &hash.to_string())),
        banner_url: guild
            .banner
            .as_ref()
            .map(|hash| cdn_image_url("banners", guild.id, &hash.to_string())),
    });
    if let Some(snapshot) = cached {
        return Ok(snapshot);
    }

    let guild = guild_id.to_partial_guild_with_counts(ctx.http()).await?;
    Ok(GuildSnapshot {
        id: guild.id,
        name: guild.name.clone(),
        owner_id: guild.owner_id,
        member_count: guild.approximate_member_count.unwrap_or(0),
        icon_url: guild
            .icon
            .as_ref()
            .map(|hash| cdn_image_url("icons", guild.id, &hash.to_string())),
        banner_url: guild
            .banner
            .as_ref()
            .map(|hash| cdn_image_url("banners", guild.id, &hash.to_string())),
    })
}

/// Show server information
#[poise::command(slash_command, rename = "server-info", guild_only, category = "Server")]
pub async fn server_info(ctx: Context<'_>) -> Result<(), Error> {
    let guild = guild_snapshot(ctx).await?;
    let content = format!(
        "## Server Info\nName: {}\nID: {}\nOwner: {}\nMembers: {}\nCreated: {}",
        guild.name,
        guild.id,
        guild.owner_id.mention(),
        guild.member_count,
        discord_timestamp(guild.id.created_at())
    );
    send_component_reply(ctx, component_reply(content, guild.icon_url.as_deref(), true)).await
}

/// Show member counts of this server
#[poise::command(
    slash_command,
    rename = "server-members",
    guild_only,
    category = "Server"
)]
pub async fn server_members(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild_id(ctx)?;
    let counts = gather_counts(ctx.serenity_context(), guild_id, true).await?;
    let known = |value: Option<u64>| {
        value
            .map(|v| v.to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    };
    let content = format!(
        "## Server Members\nTotal: {}\nHumans: {}\nBots: {}\nBoosts: {}",
        counts.total,
        known(counts.humans),
        known(counts.bots),
        counts.boosts
    );
    reply_text(ctx, content, true).await
}

/// Show the server icon
#[poise::command(slash_command, rename = "server-icon", guild_only, category = "Server")]
pub async fn server_icon(ctx: Context<'_>) -> Result<(), Error> {
    let guild = guild_snapshot(ctx).await?;
    match guild.icon_url {
        Some(icon) => {
            let content = format!("## Server Icon\nServer: {}", guild.name);
            send_component_reply(ctx, component_reply(content, Some(icon.as_str()), true)).await
        }
        None => reply_text(ctx, "❌ This server has no icon.", true).await,
    }
}

/// Show the server banner
#[poise::command(
    slash_command,
    rename = "server-banner",
    guild_only,
    category = "Server"
)]
pub async fn server_banner(ctx: Context<'_>) -> Result<(), Error> {
    let guild = guild_snapshot(ctx).await?;
    match guild.banner_url {
        Some(banner) => {
            let content = format!("## Server Banner\nServer: {}", guild.name);
            send_component_reply(ctx, component_reply(content, Some(banner.as_str()), true)).await
        }
        None => reply_text(ctx, "❌ This server has no banner.", true).await,
    }
}

pub fn channel_summary(channel: &GuildChannel) -> String {
    let topic = match channel.kind {
        ChannelType::Text | ChannelType::News => {
            channel.topic.clone().unwrap_or_else(|| "None".to_string())
        }
        _ => "N/A".to_string(),
    };
    let is_voice = matches!(channel.kind, ChannelType::Voice | ChannelType::Stage);
    let bitrate = match channel.bitrate {
        Some(bitrate) if is_voice => format!("{} bps", bitrate),
        _ => "N/A".to_string(),
    };
    let user_limit = if is_voice {
        channel.user_limit.unwrap_or(0)
    } else {
        0
    };
    format!(
        "## Channel Info\nName: {}\nID: {}\nType: {:?}\nCreated: {}\nNSFW: {}\nTopic: {}\nBitrate: {}\nUser Limit: {}",
        channel.name,
        channel.id,
        channel.kind,
        discord_timestamp(channel.id.created_at()),
        channel.nsfw,
        topic,
        bitrate,
        user_limit
    )
}

/// Show channel information
#[poise::command(
    slash_command,
    rename = "channel-info",
    guild_only,
    category = "Server"
)]
pub async fn channel_info(
    ctx: Context<'_>,
    #[description = "Channel to inspect (defaults to this one)"] channel: Option<GuildChannel>,
) -> Result<(), Error> {
    let channel = match channel {
        Some(channel) => Some(channel),
        None => ctx.channel_id().to_channel(ctx).await?.guild(),
    };
    match channel {
        Some(channel) => reply_text(ctx, channel_summary(&channel), true).await,
        None => reply_text(ctx, "❌ Channel not found.", true).await,
    }
}

/// Show role information
#[poise::command(
    slash_command,
    rename = "role-info",
    default_member_permissions = "MANAGE_ROLES",
    guild_only,
    category = "Server"
)]
pub async fn role_info(
    ctx: Context<'_>,
    #[description = "Role to inspect"] role: Role,
) -> Result<(), Error> {
    let members_with_role = ctx
        .guild()
        .map(|guild| {
            guild
                .members
                .values()
                .filter(|m| m.roles.contains(&role.id))
                .count()
        })
        .unwrap_or(0);
    let content = format!(
        "## Role Info\nName: {}\nID: {}\nColor: {}\nPosition: {}\nMembers: {}\nMentionable: {}\nHoisted: {}",
        role.name,
        role.id,
        hex_colour(role.colour.0),
        role.position,
        members_with_role,
        role.mentionable,
        role.hoist
    );
    reply_text(ctx, content, true).await
}

/// Show the hex color of a role
#[poise::command(
    slash_command,
    rename = "role-color",
    default_member_permissions = "MANAGE_ROLES",
    guild_only,
    category = "Server"
)]
pub async fn role_color(
    ctx: Context<'_>,
    #[description = "Role to check"] role: Role,
) -> Result<(), Error> {
    let content = format!(
        "## Role Color\nRole: {}\nHex: {}",
        role.name,
        hex_colour(role.colour.0)
    );
    reply_text(ctx, content, true).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_assets_are_png() {
        assert_eq!(
            cdn_image_url("icons", 123, "abcdef"),
            "https://cdn.discordapp.com/icons/123/abcdef.png?size=1024"
        );
    }

    #[test]
    fn animated_assets_are_gif() {
        assert_eq!(
            cdn_image_url("banners", 9, "a_abcdef"),
            "https://cdn.discordapp.com/banners/9/a_abcdef.gif?size=1024"
        );
    }

    #[test]
    fn colours_are_zero_padded_hex() {
        assert_eq!(hex_colour(0), "#000000");
        assert_eq!(hex_colour(0x5865F2), "#5865f2");
    }

    #[test]
    fn timestamps_use_full_date_markup() {
        let timestamp = Timestamp::from_unix_timestamp(1_700_000_000).unwrap();
        assert_eq!(discord_timestamp(timestamp), "<t:1700000000:F>");
    }
}
