use std::{
    collections::HashSet,
    num::ParseIntError,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use ophelia_bot::{
    Error,
    commands::{builtins, info, roles, server, showcase, stats, user, welcome},
    infrastructure::{
        botdata::Data, environment, environment::env_var_with_context, replies::reply_text,
    },
};
use poise::serenity_prelude::{self as serenity, GatewayIntents, UserId};
use sea_orm::DatabaseConnection;
use tracing::{debug, error, info, warn};

pub async fn create_serenity_client(db: DatabaseConnection) -> anyhow::Result<serenity::Client> {
    let token = env_var_with_context(environment::DISCORD_TOKEN)?;
    info!("{} variable found.", environment::DISCORD_TOKEN);
    let intents = GatewayIntents::non_privileged()
        .union(GatewayIntents::GUILD_MEMBERS)
        .union(GatewayIntents::MESSAGE_CONTENT)
        .union(GatewayIntents::GUILD_PRESENCES);
    let framework = create_poise_framework(db);

    serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("Failed to create serenity client")
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(
                command = %ctx.command().qualified_name,
                user_id = %ctx.author().id,
                guild_id = ?ctx.guild_id(),
                "Command failed: {}",
                error
            );
            if let Err(e) = reply_text(
                ctx,
                "❌ There was an error while executing this command!",
                true,
            )
            .await
            {
                error!("Failed to report command error: {}", e);
            }
        }
        poise::FrameworkError::GuildOnly { ctx, .. } => {
            if let Err(e) =
                reply_text(ctx, "❌ This command can only be used in a server!", true).await
            {
                error!("Failed to report guild-only command: {}", e);
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("{:?}", e);
            }
        }
    }
}

fn create_poise_framework(pool: DatabaseConnection) -> poise::Framework<Data, Error> {
    let (initialize_owners, owners) = match std::env::var(environment::OWNERS) {
        Ok(value) => match parse_owners(&value) {
            Ok(owners) => (false, owners),
            Err(e) => {
                warn!("Invalid UserId in {}: {}", environment::OWNERS, e);
                (true, HashSet::new())
            }
        },
        Err(_) => (true, HashSet::new()),
    };

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: get_enabled_commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".into()),
                mention_as_prefix: true,
                edit_tracker: Some(Arc::new(poise::EditTracker::for_timespan(
                    Duration::from_secs(3600),
                ))),
                ..Default::default()
            },
            initialize_owners,
            owners,
            pre_command: |ctx| {
                Box::pin(async move {
                    info!(
                        command = %ctx.command().qualified_name,
                        user_id = %ctx.author().id,
                        guild_id = ?ctx.guild_id(),
                        "Executing command for {}",
                        ctx.author().name,
                    );

                    if let Ok(mut invoc_time) = ctx.data().invoc_time.write() {
                        invoc_time.insert(ctx.id(), Instant::now());
                    }
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    if let Ok(mut invoc_time_map) = ctx.data().invoc_time.write() {
                        match invoc_time_map.remove(&ctx.id()) {
                            Some(start_time) => {
                                debug!(
                                    "Command {} finished in {:?}",
                                    ctx.command().qualified_name,
                                    start_time.elapsed()
                                );
                            }
                            None => {
                                error!(
                                    "Post-command hook called for command without a start-time set."
                                );
                            }
                        }
                    }
                })
            },
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(ophelia_bot::infrastructure::event_handler::event_handler(
                    ctx, event, framework, data,
                ))
            },
            ..Default::default()
        })
        .setup(|_ctx, _ready, _framework| Box::pin(async move { Ok(Data::new(pool)) }))
        .build();

    for cmd in framework.options().commands.iter() {
        info!("Loaded command: {:#?}", cmd.name);
    }

    framework
}

fn all_commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        builtins::help(),
        builtins::register(),
        info::ping(),
        info::uptime(),
        info::status(),
        info::bot_info(),
        server::server_info(),
        server::server_members(),
        server::server_icon(),
        server::server_banner(),
        server::channel_info(),
        server::role_info(),
        server::role_color(),
        user::user_info(),
        user::user_avatar(),
        user::user_banner(),
        showcase::color(),
        showcase::component_demo(),
        showcase::example(),
        stats::start_listener(),
        stats::stop_listener(),
        stats::list_listeners(),
        roles::role_all(),
        roles::auto_role_add(),
        roles::auto_role_remove(),
        welcome::welcome(),
    ]
}

fn get_enabled_commands() -> Vec<poise::Command<Data, Error>> {
    let disable_list = std::env::var(environment::COMMAND_DISABLE_LIST).unwrap_or_default();
    let (enabled, disabled) = split_disabled(all_commands(), &disable_list);
    if disabled.is_empty() {
        info!("Loading default commands");
    } else {
        info!("Disabled commands: {:?}", disabled);
    }
    enabled
}

/// Case-insensitive match on command names. Returns the kept commands and the names removed.
fn split_disabled(
    commands: Vec<poise::Command<Data, Error>>,
    disable_list: &str,
) -> (Vec<poise::Command<Data, Error>>, Vec<String>) {
    let names: HashSet<String> = disable_list
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    let mut removed = Vec::new();
    let kept = commands
        .into_iter()
        .filter(|cmd| {
            let disabled = names.contains(&cmd.name.to_lowercase());
            if disabled {
                removed.push(cmd.name.clone());
            }
            !disabled
        })
        .collect();
    (kept, removed)
}

fn parse_owners(value: &str) -> Result<HashSet<UserId>, ParseIntError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u64>().map(UserId::new))
        .collect()
}
