/*
    Keeps "stat" voice channels renamed to the live counts they track.

    Refreshes are triggered by member joins and leaves, boost changes, the start-listener
    command and a periodic background loop.
*/

use std::time::Duration;

use poise::serenity_prelude::{
    self as serenity, ChannelId, ChannelType, EditChannel, GuildId, Http, Member, UserId,
};
use sea_orm::DatabaseConnection;
use tracing::{debug, error, info, trace, warn};

use crate::{
    Error,
    entities::server_stat,
    infrastructure::{ids::id_from_string, util::truncate_chars},
    models::server_stats::{get_all_server_stats, guilds_with_enabled_stats},
};

pub const COUNT_PLACEHOLDER: &str = "{COUNT}";
pub const MAX_CHANNEL_NAME_CHARS: usize = 100;
const MEMBER_PAGE_SIZE: u64 = 1000;

/// What a stat channel counts. Stored by its upper-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum StatKind {
    #[name = "All Members"]
    AllMembers,
    #[name = "Members (No Bots)"]
    Members,
    #[name = "Bots"]
    Bots,
    #[name = "Server Boosts"]
    ServerBoost,
    #[name = "Roles"]
    Roles,
}

impl StatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::AllMembers => "ALL_MEMBERS",
            StatKind::Members => "MEMBERS",
            StatKind::Bots => "BOTS",
            StatKind::ServerBoost => "SERVER_BOOST",
            StatKind::Roles => "ROLES",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ALL_MEMBERS" => Some(StatKind::AllMembers),
            "MEMBERS" => Some(StatKind::Members),
            "BOTS" => Some(StatKind::Bots),
            "SERVER_BOOST" => Some(StatKind::ServerBoost),
            "ROLES" => Some(StatKind::Roles),
            _ => None,
        }
    }

    /// "ALL_MEMBERS" becomes "ALL MEMBERS".
    pub fn display_name(&self) -> String {
        self.as_str().replace('_', " ")
    }

    /// Whether counting needs the human/bot split, which requires fetching every member.
    pub fn needs_member_breakdown(&self) -> bool {
        matches!(self, StatKind::Members | StatKind::Bots)
    }

    pub fn count(&self, counts: &GuildCounts) -> u64 {
        match self {
            StatKind::AllMembers => counts.total,
            StatKind::Members => counts.humans.unwrap_or_else(|| {
                counts
                    .bots
                    .map(|bots| counts.total.saturating_sub(bots))
                    .unwrap_or(0)
            }),
            StatKind::Bots => counts.bots.unwrap_or_else(|| {
                counts
                    .humans
                    .map(|humans| counts.total.saturating_sub(humans))
                    .unwrap_or(0)
            }),
            StatKind::ServerBoost => counts.boosts,
            StatKind::Roles => counts.roles,
        }
    }
}

/// Snapshot of the numbers a stat channel can display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuildCounts {
    pub total: u64,
    pub humans: Option<u64>,
    pub bots: Option<u64>,
    pub boosts: u64,
    /// Excludes `@everyone`.
    pub roles: u64,
}

/// Fills the first `{COUNT}` and clamps to the channel name limit.
pub fn render_stat_name(format: &str, count: u64) -> String {
    let rendered = format.replacen(COUNT_PLACEHOLDER, &count.to_string(), 1);
    truncate_chars(&rendered, MAX_CHANNEL_NAME_CHARS)
}

/// Pages through the whole member list.
pub async fn fetch_all_members(http: &Http, guild_id: GuildId) -> Result<Vec<Member>, Error> {
    let mut members = Vec::new();
    let mut after: Option<UserId> = None;
    loop {
        let page = guild_id.members(http, Some(MEMBER_PAGE_SIZE), after).await?;
        let page_len = page.len() as u64;
        after = page.last().map(|m| m.user.id);
        members.extend(page);
        if page_len < MEMBER_PAGE_SIZE || after.is_none() {
            break;
        }
    }
    trace!(guild_id = %guild_id, "Fetched {} members", members.len());
    Ok(members)
}

pub async fn gather_counts(
    ctx: &serenity::Context,
    guild_id: GuildId,
    need_member_breakdown: bool,
) -> Result<GuildCounts, Error> {
    // Copy out of the cache before any await; the guild ref holds a lock.
    let cached = ctx.cache.guild(guild_id).map(|guild| GuildCounts {
        total: guild.member_count,
        boosts: guild.premium_subscription_count.unwrap_or(0),
        roles: (guild.roles.len() as u64).saturating_sub(1),
        ..Default::default()
    });

    let mut counts = match cached {
        Some(counts) => counts,
        None => {
            debug!(guild_id = %guild_id, "Guild not cached, fetching counts over REST");
            let guild = guild_id.to_partial_guild_with_counts(&ctx.http).await?;
            GuildCounts {
                total: guild.approximate_member_count.unwrap_or(0),
                boosts: guild.premium_subscription_count.unwrap_or(0),
                roles: (guild.roles.len() as u64).saturating_sub(1),
                ..Default::default()
            }
        }
    };

    if need_member_breakdown {
        match fetch_all_members(&ctx.http, guild_id).await {
            Ok(members) => {
                let bots = members.iter().filter(|m| m.user.bot).count() as u64;
                counts.bots = Some(bots);
                counts.humans = Some(members.len() as u64 - bots);
            }
            Err(e) => {
                warn!(guild_id = %guild_id, "Failed to fetch guild members for stats: {}", e);
            }
        }
    }

    Ok(counts)
}

async fn update_single_stat(
    ctx: &serenity::Context,
    guild_id: GuildId,
    stat: &server_stat::Model,
    kind: StatKind,
    counts: &GuildCounts,
) -> Result<(), Error> {
    let channel_id = id_from_string::<ChannelId>(&stat.channel_id)?;
    let channel = match channel_id.to_channel(ctx).await {
        Ok(channel) => channel.guild(),
        Err(e) => {
            debug!(channel_id = %channel_id, "Stat channel could not be fetched: {}", e);
            None
        }
    };
    let Some(channel) = channel else {
        info!(channel_id = %channel_id, "Stat channel not found, skipping");
        return Ok(());
    };
    if channel.kind != ChannelType::Voice || channel.guild_id != guild_id {
        info!(channel_id = %channel_id, "Stat channel is not a voice channel of this guild, skipping");
        return Ok(());
    }

    let new_name = render_stat_name(&stat.text_format, kind.count(counts));
    if channel.name != new_name {
        channel_id
            .edit(ctx, EditChannel::new().name(new_name.as_str()))
            .await?;
        info!(
            guild_id = %guild_id,
            stat_type = kind.as_str(),
            "Updated stat channel: {}",
            new_name
        );
    }
    Ok(())
}

async fn try_update_all_server_stats(
    ctx: &serenity::Context,
    db: &DatabaseConnection,
    guild_id: GuildId,
) -> Result<(), Error> {
    let stats = get_all_server_stats(db, guild_id).await?;
    if stats.is_empty() {
        return Ok(());
    }

    let kinds: Vec<Option<StatKind>> = stats.iter().map(|s| StatKind::parse(&s.stat_type)).collect();
    let need_member_breakdown = kinds.iter().flatten().any(StatKind::needs_member_breakdown);
    let counts = gather_counts(ctx, guild_id, need_member_breakdown).await?;

    for (stat, kind) in stats.iter().zip(kinds) {
        let Some(kind) = kind else {
            warn!(channel_id = %stat.channel_id, "Unknown stat type '{}', skipping", stat.stat_type);
            continue;
        };
        if let Err(e) = update_single_stat(ctx, guild_id, stat, kind, &counts).await {
            error!(
                guild_id = %guild_id,
                channel_id = %stat.channel_id,
                stat_type = kind.as_str(),
                "Failed to update server stat: {}",
                e
            );
        }
    }
    Ok(())
}

/// Renames every enabled stat channel of a guild. Failures are logged, never returned.
pub async fn update_all_server_stats(
    ctx: &serenity::Context,
    db: &DatabaseConnection,
    guild_id: GuildId,
) {
    if let Err(e) = try_update_all_server_stats(ctx, db, guild_id).await {
        error!(guild_id = %guild_id, "Failed to update server stats: {}", e);
    }
}

/// Refreshes every guild with enabled stats once per `interval`, forever.
pub fn spawn_periodic_refresh(
    ctx: serenity::Context,
    db: DatabaseConnection,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    info!("Refreshing server stats every {:?}", interval);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let guilds = match guilds_with_enabled_stats(&db).await {
                Ok(guilds) => guilds,
                Err(e) => {
                    error!("Failed to load guilds with server stats: {}", e);
                    continue;
                }
            };
            trace!("Periodic stats refresh for {} guilds", guilds.len());
            for guild in guilds {
                match id_from_string::<GuildId>(&guild) {
                    Ok(guild_id) => update_all_server_stats(&ctx, &db, guild_id).await,
                    Err(e) => warn!("Stored guild id '{}' is invalid: {}", guild, e),
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_kinds_round_trip_through_storage_names() {
        for kind in [
            StatKind::AllMembers,
            StatKind::Members,
            StatKind::Bots,
            StatKind::ServerBoost,
            StatKind::Roles,
        ] {
            assert_eq!(StatKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(StatKind::parse("members"), None);
        assert_eq!(StatKind::parse("VOICE"), None);
    }

    #[test]
    fn display_name_spaces_out_underscores() {
        assert_eq!(StatKind::ServerBoost.display_name(), "SERVER BOOST");
        assert_eq!(StatKind::Members.display_name(), "MEMBERS");
    }

    #[test]
    fn only_human_and_bot_counts_need_the_member_list() {
        assert!(StatKind::Members.needs_member_breakdown());
        assert!(StatKind::Bots.needs_member_breakdown());
        assert!(!StatKind::AllMembers.needs_member_breakdown());
        assert!(!StatKind::Roles.needs_member_breakdown());
    }

    #[test]
    fn counts_pick_the_right_number() {
        let counts = GuildCounts {
            total: 120,
            humans: Some(100),
            bots: Some(20),
            boosts: 7,
            roles: 12,
        };
        assert_eq!(StatKind::AllMembers.count(&counts), 120);
        assert_eq!(StatKind::Members.count(&counts), 100);
        assert_eq!(StatKind::Bots.count(&counts), 20);
        assert_eq!(StatKind::ServerBoost.count(&counts), 7);
        assert_eq!(StatKind::Roles.count(&counts), 12);
    }

    #[test]
    fn member_split_falls_back_to_the_other_half_or_zero() {
        let only_bots = GuildCounts {
            total: 50,
            bots: Some(5),
            ..Default::default()
        };
        assert_eq!(StatKind::Members.count(&only_bots), 45);

        let unknown = GuildCounts {
            total: 50,
            ..Default::default()
        };
        assert_eq!(StatKind::Members.count(&unknown), 0);
        assert_eq!(StatKind::Bots.count(&unknown), 0);
    }

    #[test]
    fn render_replaces_only_the_first_placeholder() {
        assert_eq!(render_stat_name("Members: {COUNT}", 42), "Members: 42");
        assert_eq!(render_stat_name("{COUNT}/{COUNT}", 3), "3/{COUNT}");
        assert_eq!(render_stat_name("No placeholder", 3), "No placeholder");
    }

    #[test]
    fn render_clamps_to_channel_name_limit() {
        let format = format!("{}{{COUNT}}", "x".repeat(99));
        let name = render_stat_name(&format, 12345);
        assert_eq!(name.chars().count(), MAX_CHANNEL_NAME_CHARS);
        assert!(name.ends_with('1'));
    }
}
