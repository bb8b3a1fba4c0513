use crate::{Context, Error, infrastructure::replies::reply_text};

/// Registers/unregisters commands for this guild or all guilds.
#[poise::command(
    slash_command,
    prefix_command,
    aliases("refresh"),
    owners_only,
    hide_in_help
)]
pub async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx).await?;
    Ok(())
}

pub fn help_text<'a>(commands: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let listing: Vec<String> = commands
        .into_iter()
        .map(|(name, description)| format!("**/{}**\n{}", name, description))
        .collect();
    format!(
        "## Available Commands\n\nList of all commands available in Ophelia Store Bot\n\n{}",
        listing.join("\n\n")
    )
}

/// List all available commands
#[poise::command(slash_command, prefix_command, category = "General")]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let commands = &ctx.framework().options().commands;
    let text = help_text(
        commands
            .iter()
            .filter(|cmd| !cmd.hide_in_help)
            .map(|cmd| {
                (
                    cmd.name.as_str(),
                    cmd.description.as_deref().unwrap_or("No description"),
                )
            }),
    );
    reply_text(ctx, text, true).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_lists_commands_in_order() {
        let text = help_text([("ping", "Check bot latency"), ("uptime", "Show bot uptime")]);
        assert_eq!(
            text,
            "## Available Commands\n\nList of all commands available in Ophelia Store Bot\n\n\
             **/ping**\nCheck bot latency\n\n**/uptime**\nShow bot uptime"
        );
    }
}
