use std::{sync::atomic::Ordering, time::Duration};

use poise::serenity_prelude::{ActivityData, Context, FullEvent, Interaction, OnlineStatus};
use tracing::{debug, info, warn};

use crate::{
    Error,
    events::{
        components::handle_component_interaction,
        guild_member::{guild_member_add, guild_member_remove},
        server_stats::{spawn_periodic_refresh, update_all_server_stats},
    },
    infrastructure::{botdata::Data, environment},
};

/// Refresh boost stats only when the count moved, or when the previous guild is unknown.
/// The outer `None` is a guild missing from the cache.
pub fn boost_count_changed(old: Option<Option<u64>>, new: Option<u64>) -> bool {
    match old {
        Some(old) => old != new,
        None => true,
    }
}

fn on_ready(ctx: &Context, data: &Data, user_tag: String, guild_count: usize) {
    info!("Bot is ready. Logged in as {}", user_tag);
    info!("Serving {} guilds", guild_count);

    ctx.set_presence(
        Some(ActivityData::playing(environment::get_presence_activity())),
        OnlineStatus::Online,
    );

    // Ready fires again on reconnects.
    if data.stats_refresher_started.swap(true, Ordering::SeqCst) {
        return;
    }
    match environment::get_stats_refresh_interval() {
        Some(interval) => {
            spawn_periodic_refresh(ctx.clone(), data.db_pool.clone(), interval);
        }
        None => info!("Periodic server stats refresh disabled"),
    }
}

pub async fn event_handler(
    ctx: &Context,
    event: &FullEvent,
    framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        FullEvent::Ready { data_about_bot, .. } => {
            on_ready(
                ctx,
                data,
                data_about_bot.user.tag(),
                data_about_bot.guilds.len(),
            );
        }
        FullEvent::GuildMemberAddition { new_member } => {
            let result = guild_member_add(ctx, data, new_member).await;
            if let Err(e) = result {
                warn!("Guild member added handler produced an error: {:?}", e);
            }
        }
        FullEvent::GuildMemberRemoval {
            guild_id,
            user,
            member_data_if_available: _,
        } => {
            let result = guild_member_remove(ctx, data, guild_id, user).await;
            if let Err(e) = result {
                warn!("Guild member removed handler produced an error: {:?}", e);
            }
        }
        FullEvent::GuildUpdate {
            old_data_if_available,
            new_data,
        } => {
            let old_boosts = old_data_if_available
                .as_ref()
                .map(|guild| guild.premium_subscription_count);
            if boost_count_changed(old_boosts, new_data.premium_subscription_count) {
                debug!(guild_id = %new_data.id, "Boost count changed");
                update_all_server_stats(ctx, &data.db_pool, new_data.id).await;
            }
        }
        FullEvent::InteractionCreate { interaction } => {
            let ping = match framework
                .shard_manager
                .runners
                .lock()
                .await
                .get(&ctx.shard_id)
            {
                Some(runner) => runner.latency.unwrap_or(Duration::ZERO),
                None => {
                    tracing::error!(
                        "current shard is not in shard_manager.runners, this shouldn't happen"
                    );
                    Duration::ZERO
                }
            };
            if ping > Duration::default() {
                debug!(
                    "Ping measured for interaction type {:?}: {:?} ",
                    interaction.kind(),
                    ping
                )
            }

            if let Interaction::Component(component) = interaction {
                if let Err(e) = handle_component_interaction(ctx, component).await {
                    warn!("Component interaction handler produced an error: {:?}", e);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boost_refresh_when_count_moves() {
        assert!(boost_count_changed(Some(Some(3)), Some(4)));
        assert!(boost_count_changed(Some(None), Some(1)));
    }

    #[test]
    fn no_boost_refresh_when_count_is_unchanged() {
        assert!(!boost_count_changed(Some(Some(3)), Some(3)));
        assert!(!boost_count_changed(Some(None), None));
    }

    #[test]
    fn boost_refresh_when_previous_guild_is_unknown() {
        assert!(boost_count_changed(None, Some(3)));
        assert!(boost_count_changed(None, None));
    }
}
