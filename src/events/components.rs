/*
    Answers button and select-menu clicks that are not owned by a running command.
*/

use poise::serenity_prelude::{ComponentInteraction, ComponentInteractionDataKind, Context};
use tracing::{debug, error};

use crate::{
    Error,
    infrastructure::{message_components::component_reply, replies::respond_to_component},
};

pub const EXAMPLE_SELECT_ID: &str = "example_select";
pub const EXAMPLE_BUTTON_IDS: [&str; 3] = ["example_primary", "example_success", "example_danger"];

const ERROR_REPLY: &str = "❌ An error occurred while processing your request";

/// Dotted ids (`register.guild`, ...) are awaited by collectors inside a command.
pub fn is_collector_owned(custom_id: &str) -> bool {
    custom_id.contains('.')
}

pub fn button_response(custom_id: &str) -> String {
    match custom_id {
        "example_primary" => "You clicked Primary button!".to_string(),
        "example_success" => "You clicked Success button!".to_string(),
        "example_danger" => "You clicked Danger button!".to_string(),
        _ => "❌ Unknown button interaction".to_string(),
    }
}

pub fn select_response(custom_id: &str, values: &[String]) -> String {
    match (custom_id, values.first()) {
        (EXAMPLE_SELECT_ID, Some(value)) => format!("You selected: {}", value),
        (EXAMPLE_SELECT_ID, None) => "You selected: nothing".to_string(),
        _ => "❌ Unknown select menu interaction".to_string(),
    }
}

async fn respond(ctx: &Context, interaction: &ComponentInteraction) -> Result<bool, Error> {
    let content = match &interaction.data.kind {
        ComponentInteractionDataKind::Button => button_response(&interaction.data.custom_id),
        ComponentInteractionDataKind::StringSelect { values } => {
            select_response(&interaction.data.custom_id, values)
        }
        other => {
            debug!("Ignoring component interaction of kind {:?}", other);
            return Ok(false);
        }
    };
    respond_to_component(&ctx.http, interaction, component_reply(content, None, true)).await?;
    Ok(true)
}

pub async fn handle_component_interaction(
    ctx: &Context,
    interaction: &ComponentInteraction,
) -> Result<(), Error> {
    if is_collector_owned(&interaction.data.custom_id) {
        return Ok(());
    }
    debug!(
        custom_id = %interaction.data.custom_id,
        "Component interaction from {}",
        interaction.user.name
    );

    if let Err(e) = respond(ctx, interaction).await {
        error!(
            custom_id = %interaction.data.custom_id,
            "Component interaction failed for {}: {}",
            interaction.user.name,
            e
        );
        // Nothing reached Discord, so the interaction token is still unused.
        respond_to_component(
            &ctx.http,
            interaction,
            component_reply(ERROR_REPLY, None, true),
        )
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_buttons_echo_their_style() {
        assert_eq!(button_response("example_primary"), "You clicked Primary button!");
        assert_eq!(button_response("example_danger"), "You clicked Danger button!");
        assert_eq!(button_response("nope"), "❌ Unknown button interaction");
        for id in EXAMPLE_BUTTON_IDS {
            assert!(!button_response(id).starts_with('❌'));
        }
    }

    #[test]
    fn select_reports_the_first_value() {
        let values = vec!["option_2".to_string(), "option_3".to_string()];
        assert_eq!(select_response(EXAMPLE_SELECT_ID, &values), "You selected: option_2");
        assert_eq!(
            select_response("other_select", &values),
            "❌ Unknown select menu interaction"
        );
    }

    #[test]
    fn dotted_ids_are_left_to_collectors() {
        assert!(is_collector_owned("register.guild"));
        assert!(!is_collector_owned("example_primary"));
    }
}
