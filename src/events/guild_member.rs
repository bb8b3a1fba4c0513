/*
    Handles members joining and leaving the guild.

    New members get the configured auto role and a welcome message; both joins and leaves
    refresh the server stat channels.
*/

use poise::serenity_prelude::{ChannelId, ChannelType, Context, GuildId, Member, RoleId, User};
use tracing::{debug, error, info, trace, warn};

use crate::{
    Error,
    commands::roles::{RoleAssignability, resolve_assignable_role},
    events::{server_stats::update_all_server_stats, welcome::welcome_component_for},
    infrastructure::{
        botdata::Data,
        ids::id_from_string,
        replies::send_component_message,
    },
    models::{auto_role::get_auto_role, welcome_settings::get_welcome_settings},
};

const AUTO_ROLE_REASON: &str = "Auto role assignment";
const FALLBACK_SERVER_NAME: &str = "Server";

/// Guild name from the cache, falling back to a REST fetch.
pub async fn guild_name(ctx: &Context, guild_id: GuildId) -> String {
    if let Some(name) = guild_id.name(&ctx.cache) {
        return name;
    }
    match guild_id.to_partial_guild(&ctx.http).await {
        Ok(guild) => guild.name,
        Err(e) => {
            debug!(guild_id = %guild_id, "Could not fetch guild name: {}", e);
            FALLBACK_SERVER_NAME.to_string()
        }
    }
}

async fn apply_auto_role(ctx: &Context, data: &Data, member: &Member) -> Result<(), Error> {
    let Some(config) = get_auto_role(&data.db_pool, member.guild_id).await? else {
        return Ok(());
    };
    let role_id = id_from_string::<RoleId>(&config.role_id)?;
    if member.roles.contains(&role_id) {
        trace!("{} already has the auto role", member.user.name);
        return Ok(());
    }

    match resolve_assignable_role(ctx, member.guild_id, role_id).await? {
        Some((role, RoleAssignability::Assignable)) => {
            ctx.http
                .add_member_role(member.guild_id, member.user.id, role_id, Some(AUTO_ROLE_REASON))
                .await?;
            info!(
                guild_id = %member.guild_id,
                "Assigned auto role {} to {}",
                role.name,
                member.user.name
            );
        }
        Some((role, reason)) => {
            warn!(
                guild_id = %member.guild_id,
                role_id = %role_id,
                "Auto role {} is not assignable: {:?}",
                role.name,
                reason
            );
        }
        None => {
            warn!(guild_id = %member.guild_id, role_id = %role_id, "Auto role no longer exists");
        }
    }
    Ok(())
}

async fn send_welcome(ctx: &Context, data: &Data, member: &Member) -> Result<(), Error> {
    let settings = match get_welcome_settings(&data.db_pool, member.guild_id).await? {
        Some(settings) if settings.enabled => settings,
        _ => {
            debug!(guild_id = %member.guild_id, "Welcome messages disabled");
            return Ok(());
        }
    };

    let channel_id = id_from_string::<ChannelId>(&settings.channel_id)?;
    let channel = member
        .guild_id
        .channels(&ctx.http)
        .await?
        .remove(&channel_id)
        .filter(|c| matches!(c.kind, ChannelType::Text | ChannelType::News));
    let Some(channel) = channel else {
        info!(guild_id = %member.guild_id, "Welcome channel not found");
        return Ok(());
    };

    let server_name = guild_name(ctx, member.guild_id).await;
    let payload =
        welcome_component_for(&member.user, &server_name, settings.custom_message.as_deref());
    send_component_message(&ctx.http, channel.id, payload).await?;
    info!(
        guild_id = %member.guild_id,
        "Sent welcome message for {}",
        member.user.name
    );
    Ok(())
}

pub async fn guild_member_add(ctx: &Context, data: &Data, new_member: &Member) -> Result<(), Error> {
    info!(
        guild_id = %new_member.guild_id,
        "Member joined: {}",
        new_member.user.name
    );
    if let Err(e) = apply_auto_role(ctx, data, new_member).await {
        error!("Failed to apply auto role to new member: {}", e)
    }
    if let Err(e) = send_welcome(ctx, data, new_member).await {
        error!("Failed to welcome new member: {}", e)
    }
    update_all_server_stats(ctx, &data.db_pool, new_member.guild_id).await;
    Ok(())
}

pub async fn guild_member_remove(
    ctx: &Context,
    data: &Data,
    guild_id: &GuildId,
    user: &User,
) -> Result<(), Error> {
    trace!(guild_id = %guild_id, "Member left: {}", user.name);
    update_all_server_stats(ctx, &data.db_pool, *guild_id).await;
    Ok(())
}
