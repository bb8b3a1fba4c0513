use poise::serenity_prelude::User;
use tracing::trace;

use crate::{
    Context, Error,
    commands::server::{cdn_image_url, discord_timestamp, hex_colour},
    infrastructure::{
        message_components::component_reply,
        replies::{reply_text, send_component_reply},
    },
};

/// Banners are only present on a freshly fetched user.
async fn fetch_user(ctx: Context<'_>, user: &User) -> Result<User, Error> {
    trace!(user_id = %user.id, "Fetching full user");
    Ok(ctx.http().get_user(user.id).await?)
}

fn banner_url(user: &User) -> Option<String> {
    user.banner
        .as_ref()
        .map(|hash| cdn_image_url("banners", user.id, &hash.to_string()))
}

pub fn user_summary(user: &User) -> String {
    let accent = user
        .accent_colour
        .map(|c| hex_colour(c.0))
        .unwrap_or_else(|| "None".to_string());
    format!(
        "## User Info\nUser: {}\nID: {}\nCreated: {}\nAccent: {}",
        user.tag(),
        user.id,
        discord_timestamp(user.id.created_at()),
        accent
    )
}

/// Show user information
#[poise::command(slash_command, prefix_command, rename = "user-info", category = "User")]
pub async fn user_info(
    ctx: Context<'_>,
    #[description = "Target user"] user: Option<User>,
) -> Result<(), Error> {
    let target = user.as_ref().unwrap_or_else(|| ctx.author());
    let fetched = fetch_user(ctx, target).await?;
    let media = banner_url(&fetched).unwrap_or_else(|| fetched.face());
    send_component_reply(
        ctx,
        component_reply(user_summary(&fetched), Some(media.as_str()), true),
    )
    .await
}

/// Show a user avatar
#[poise::command(
    slash_command,
    prefix_command,
    rename = "user-avatar",
    category = "User"
)]
pub async fn user_avatar(
    ctx: Context<'_>,
    #[description = "Target user"] user: Option<User>,
) -> Result<(), Error> {
    let target = user.as_ref().unwrap_or_else(|| ctx.author());
    let content = format!("## User Avatar\nUser: {}", target.tag());
    send_component_reply(
        ctx,
        component_reply(content, Some(target.face().as_str()), true),
    )
    .await
}

/// Show a user banner
#[poise::command(
    slash_command,
    prefix_command,
    rename = "user-banner",
    category = "User"
)]
pub async fn user_banner(
    ctx: Context<'_>,
    #[description = "Target user"] user: Option<User>,
) -> Result<(), Error> {
    let target = user.as_ref().unwrap_or_else(|| ctx.author());
    let fetched = fetch_user(ctx, target).await?;
    match banner_url(&fetched) {
        Some(banner) => {
            let content = format!("## User Banner\nUser: {}", fetched.tag());
            send_component_reply(ctx, component_reply(content, Some(banner.as_str()), true)).await
        }
        None => reply_text(ctx, "❌ Banner not found for that user.", true).await,
    }
}
