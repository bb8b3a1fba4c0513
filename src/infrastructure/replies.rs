//! Sends [`MessagePayload`]s through serenity's raw HTTP client.

use std::sync::atomic::Ordering;

use poise::serenity_prelude::{self as serenity, ChannelId, ComponentInteraction, Http};
use tracing::{debug, trace};

use crate::{
    Context, Error,
    infrastructure::message_components::{MessagePayload, component_reply},
};

/// Discord answers with the created message, which serenity 0.12 cannot always deserialize when
/// it holds V2 components. The message was delivered at that point, so a JSON error is not a
/// failure.
fn delivered(result: Result<serenity::Message, serenity::Error>) -> Result<(), serenity::Error> {
    match result {
        Ok(_) => Ok(()),
        Err(serenity::Error::Json(e)) => {
            debug!("Message sent, response not parseable: {}", e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Answers a command invocation with a component payload.
///
/// For application commands this is the initial interaction response, or a follow-up once
/// something (including a deferral) was already sent. Prefix invocations get a channel message.
pub async fn send_component_reply(ctx: Context<'_>, payload: MessagePayload) -> Result<(), Error> {
    trace!("Sending component reply: {:?}", payload.plain_text());
    match ctx {
        poise::Context::Application(appctx) => {
            let http = &appctx.serenity_context.http;
            let interaction = appctx.interaction;
            if appctx.has_sent_initial_response.swap(true, Ordering::SeqCst) {
                delivered(
                    http.create_followup_message(&interaction.token, &payload, vec![])
                        .await,
                )?;
            } else if let Err(e) = http
                .create_interaction_response(
                    interaction.id,
                    &interaction.token,
                    &payload.into_interaction_response(),
                    vec![],
                )
                .await
            {
                appctx
                    .has_sent_initial_response
                    .store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        }
        poise::Context::Prefix(prefixctx) => {
            send_component_message(
                &prefixctx.serenity_context.http,
                prefixctx.msg.channel_id,
                payload,
            )
            .await?;
        }
    }
    Ok(())
}

/// Replaces the initial response of an application command. Prefix invocations cannot edit, so
/// they get a new message instead.
pub async fn edit_component_reply(ctx: Context<'_>, payload: MessagePayload) -> Result<(), Error> {
    match ctx {
        poise::Context::Application(appctx) => {
            delivered(
                appctx
                    .serenity_context
                    .http
                    .edit_original_interaction_response(
                        &appctx.interaction.token,
                        &payload.without_ephemeral(),
                        vec![],
                    )
                    .await,
            )?;
            Ok(())
        }
        poise::Context::Prefix(_) => send_component_reply(ctx, payload).await,
    }
}

/// Shorthand for a reply holding a single block of text.
pub async fn reply_text(
    ctx: Context<'_>,
    content: impl Into<String>,
    ephemeral: bool,
) -> Result<(), Error> {
    send_component_reply(ctx, component_reply(content, None, ephemeral)).await
}

/// Posts a component payload to a channel. The ephemeral flag is stripped.
pub async fn send_component_message(
    http: &Http,
    channel_id: ChannelId,
    payload: MessagePayload,
) -> Result<(), Error> {
    trace!(channel_id = %channel_id, "Sending component message: {:?}", payload.plain_text());
    delivered(
        http.send_message(channel_id, vec![], &payload.without_ephemeral())
            .await,
    )?;
    Ok(())
}

/// Answers a button or select-menu interaction.
pub async fn respond_to_component(
    http: &Http,
    interaction: &ComponentInteraction,
    payload: MessagePayload,
) -> Result<(), Error> {
    http.create_interaction_response(
        interaction.id,
        &interaction.token,
        &payload.into_interaction_response(),
        vec![],
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparseable_response_counts_as_delivered() {
        let json_error = serde_json::from_str::<u64>("not json").unwrap_err();
        assert!(delivered(Err(serenity::Error::Json(json_error))).is_ok());
    }

    #[test]
    fn other_errors_are_passed_through() {
        let result = delivered(Err(serenity::Error::Other("gateway closed")));
        assert!(matches!(result, Err(serenity::Error::Other("gateway closed"))));
    }
}
