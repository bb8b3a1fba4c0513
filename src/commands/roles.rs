use poise::serenity_prelude::{self as serenity, GuildId, Role, RoleId};
use tracing::{debug, error, info, warn};

use crate::{
    Context, Error,
    events::server_stats::fetch_all_members,
    infrastructure::{
        ids::require_guild_id,
        message_components::component_reply,
        replies::{reply_text, send_component_reply},
        util::defer_or_broadcast,
    },
    models::auto_role::{delete_auto_role, upsert_auto_role},
};

const ROLE_ALL_REASON: &str = "Role all command";
pub const ROLE_ALL_FAILED: &str = "❌ Failed to assign the role to all members.";
const ROLE_ALL_NOTHING_TO_DO: &str = "All eligible members already have that role.";

/// Whether the bot can hand out a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAssignability {
    Assignable,
    /// Owned by an integration.
    Managed,
    /// Not strictly below the bot's highest role.
    AboveBot,
}

impl RoleAssignability {
    pub fn failure_message(&self) -> Option<&'static str> {
        match self {
            RoleAssignability::Assignable => None,
            RoleAssignability::Managed => {
                Some("❌ That role is managed and cannot be assigned by the bot.")
            }
            RoleAssignability::AboveBot => {
                Some("❌ Move the bot role above the target role so it can assign it.")
            }
        }
    }
}

pub fn role_assignability(managed: bool, bot_highest: u16, role_position: u16) -> RoleAssignability {
    if managed {
        RoleAssignability::Managed
    } else if bot_highest <= role_position {
        RoleAssignability::AboveBot
    } else {
        RoleAssignability::Assignable
    }
}

/// Position of the highest role the bot holds in a guild, 0 when it only has `@everyone`.
pub async fn bot_highest_role_position(
    ctx: &serenity::Context,
    guild_id: GuildId,
) -> Result<u16, Error> {
    let bot_id = ctx.cache.current_user().id;
    let member = guild_id.member(ctx, bot_id).await?;
    let roles = guild_id.roles(&ctx.http).await?;
    Ok(member
        .roles
        .iter()
        .filter_map(|id| roles.get(id))
        .map(|role| role.position)
        .max()
        .unwrap_or(0))
}

/// Looks a role up and checks it against the bot's position. `None` when the role is gone.
pub async fn resolve_assignable_role(
    ctx: &serenity::Context,
    guild_id: GuildId,
    role_id: RoleId,
) -> Result<Option<(Role, RoleAssignability)>, Error> {
    let mut roles = guild_id.roles(&ctx.http).await?;
    let Some(role) = roles.remove(&role_id) else {
        return Ok(None);
    };
    let bot_highest = bot_highest_role_position(ctx, guild_id).await?;
    let assignability = role_assignability(role.managed, bot_highest, role.position);
    Ok(Some((role, assignability)))
}

/// Replies with the reason and returns false when the role cannot be assigned.
async fn ensure_assignable(ctx: Context<'_>, guild_id: GuildId, role: &Role) -> Result<bool, Error> {
    let bot_highest = match bot_highest_role_position(ctx.serenity_context(), guild_id).await {
        Ok(position) => position,
        Err(e) => {
            warn!(guild_id = %guild_id, "Unable to resolve bot member: {}", e);
            reply_text(ctx, "❌ Unable to resolve bot member in this server.", true).await?;
            return Ok(false);
        }
    };
    let assignability = role_assignability(role.managed, bot_highest, role.position);
    match assignability.failure_message() {
        Some(message) => {
            debug!(role_id = %role.id, "Role not assignable: {:?}", assignability);
            reply_text(ctx, message, true).await?;
            Ok(false)
        }
        None => Ok(true),
    }
}

/// Outcome of a role-all run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleAllSummary {
    pub targeted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RoleAllSummary {
    pub fn message(&self, role_id: RoleId) -> String {
        if self.targeted == 0 {
            return ROLE_ALL_NOTHING_TO_DO.to_string();
        }
        format!(
            "## Role assignment completed\nRole: <@&{}>\nTotal targeted: {}\nSuccess: {}\nFailed: {}",
            role_id, self.targeted, self.succeeded, self.failed
        )
    }
}

/// Gives the role to every non-bot member lacking it. Single assignment failures are counted,
/// a failed member fetch is returned.
async fn assign_to_all(
    ctx: Context<'_>,
    guild_id: GuildId,
    role_id: RoleId,
) -> Result<RoleAllSummary, Error> {
    let members = fetch_all_members(ctx.http(), guild_id).await?;
    let targets: Vec<_> = members
        .iter()
        .filter(|m| !m.user.bot && !m.roles.contains(&role_id))
        .collect();

    let mut summary = RoleAllSummary {
        targeted: targets.len(),
        ..Default::default()
    };
    for member in targets {
        match ctx
            .http()
            .add_member_role(guild_id, member.user.id, role_id, Some(ROLE_ALL_REASON))
            .await
        {
            Ok(_) => summary.succeeded += 1,
            Err(e) => {
                summary.failed += 1;
                warn!(
                    guild_id = %guild_id,
                    role_id = %role_id,
                    member_id = %member.user.id,
                    "Role assignment failed: {}",
                    e
                );
            }
        }
    }
    Ok(summary)
}

/// Assign a role to all non-bot members in the server
#[poise::command(
    slash_command,
    rename = "role-all",
    default_member_permissions = "ADMINISTRATOR",
    required_bot_permissions = "MANAGE_ROLES",
    guild_only,
    category = "Admin"
)]
pub async fn role_all(
    ctx: Context<'_>,
    #[description = "Role to assign"] role: Role,
) -> Result<(), Error> {
    let guild_id = require_guild_id(ctx)?;
    if !ensure_assignable(ctx, guild_id, &role).await? {
        return Ok(());
    }

    defer_or_broadcast(ctx, true).await?;

    let summary = match assign_to_all(ctx, guild_id, role.id).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(guild_id = %guild_id, role_id = %role.id, "role-all failed: {}", e);
            return reply_text(ctx, ROLE_ALL_FAILED, true).await;
        }
    };
    info!(
        guild_id = %guild_id,
        role_id = %role.id,
        "role-all assigned {} of {} ({} failed)",
        summary.succeeded,
        summary.targeted,
        summary.failed
    );

    send_component_reply(ctx, component_reply(summary.message(role.id), None, true)).await
}

/// Automatically assign a role to new members
#[poise::command(
    slash_command,
    rename = "auto-role-add",
    default_member_permissions = "ADMINISTRATOR",
    guild_only,
    category = "Admin"
)]
pub async fn auto_role_add(
    ctx: Context<'_>,
    #[description = "Role to assign to new members"] role: Role,
) -> Result<(), Error> {
    let guild_id = require_guild_id(ctx)?;
    if !ensure_assignable(ctx, guild_id, &role).await? {
        return Ok(());
    }

    upsert_auto_role(&ctx.data().db_pool, guild_id, role.id).await?;
    info!(guild_id = %guild_id, role_id = %role.id, "Auto role configured");

    reply_text(
        ctx,
        format!("## Auto role updated!\nRole: <@&{}>", role.id),
        true,
    )
    .await
}

/// Stop assigning a role to new members
#[poise::command(
    slash_command,
    rename = "auto-role-remove",
    default_member_permissions = "ADMINISTRATOR",
    guild_only,
    category = "Admin"
)]
pub async fn auto_role_remove(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild_id(ctx)?;
    let message = if delete_auto_role(&ctx.data().db_pool, guild_id).await? {
        "✅ Auto role removed. New members will no longer receive a role."
    } else {
        "❌ No auto role is configured for this server."
    };
    reply_text(ctx, message, true).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managed_roles_are_never_assignable() {
        assert_eq!(role_assignability(true, 50, 1), RoleAssignability::Managed);
    }

    #[test]
    fn bot_must_be_strictly_above_the_role() {
        assert_eq!(role_assignability(false, 5, 5), RoleAssignability::AboveBot);
        assert_eq!(role_assignability(false, 4, 5), RoleAssignability::AboveBot);
        assert_eq!(role_assignability(false, 6, 5), RoleAssignability::Assignable);
    }

    #[test]
    fn only_failures_carry_a_message() {
        assert!(RoleAssignability::Assignable.failure_message().is_none());
        assert!(
            RoleAssignability::AboveBot
                .failure_message()
                .is_some_and(|m| m.contains("Move the bot role"))
        );
    }

    #[test]
    fn role_all_summary_lists_counts() {
        let summary = RoleAllSummary {
            targeted: 5,
            succeeded: 4,
            failed: 1,
        };
        assert_eq!(
            summary.message(RoleId::new(9)),
            "## Role assignment completed\nRole: <@&9>\nTotal targeted: 5\nSuccess: 4\nFailed: 1"
        );
    }

    #[test]
    fn role_all_without_targets_says_so() {
        assert_eq!(
            RoleAllSummary::default().message(RoleId::new(9)),
            "All eligible members already have that role."
        );
        assert_eq!(ROLE_ALL_FAILED, "❌ Failed to assign the role to all members.");
    }
}
