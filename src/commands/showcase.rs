use poise::{
    CreateReply,
    serenity_prelude::{
        ButtonStyle, CreateActionRow, CreateButton, CreateSelectMenu, CreateSelectMenuKind,
        CreateSelectMenuOption,
    },
};

use crate::{
    Context, Error,
    events::components::EXAMPLE_SELECT_ID,
    infrastructure::{
        colors,
        embeds::{EmbedConfig, create_embed},
        message_components::{
            MessageBuilder, MessagePayload, SectionData, multi_section_message, simple_message,
            titled_message,
        },
        replies::{reply_text, send_component_reply},
    },
    lazy_regex,
};

lazy_regex!(HEX_COLOR, r"(?i)^(?:#|0x)?([0-9a-f]{3}|[0-9a-f]{6})$");

/// Accepts `#rrggbb`, `rrggbb`, `#rgb`, `rgb` and `0xrrggbb`.
pub fn parse_hex_color(input: &str) -> Option<u32> {
    let digits = HEX_COLOR.captures(input.trim())?.get(1)?.as_str();
    let expanded: String = if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    };
    u32::from_str_radix(&expanded, 16).ok()
}

fn color_preview(value: u32) -> MessagePayload {
    let (r, g, b) = ((value >> 16) & 0xFF, (value >> 8) & 0xFF, value & 0xFF);
    MessageBuilder::new()
        .ephemeral(true)
        .add_container(|c| {
            c.accent_color(value).add_text(format!(
                "## Color\nHex: #{:06x}\nDecimal: {}\nRGB: {}, {}, {}",
                value, value, r, g, b
            ))
        })
        .build()
}

/// Show a color preview
#[poise::command(slash_command, prefix_command, category = "General")]
pub async fn color(
    ctx: Context<'_>,
    #[description = "Hex color (e.g., #ff0000)"] hex: String,
) -> Result<(), Error> {
    match parse_hex_color(&hex) {
        Some(value) => send_component_reply(ctx, color_preview(value)).await,
        None => reply_text(ctx, "❌ Invalid color input.", true).await,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum DemoKind {
    #[name = "Simple Message"]
    Simple,
    #[name = "Titled Message"]
    Titled,
    #[name = "Multi Section"]
    Multi,
    #[name = "Custom Build"]
    Custom,
}

pub fn demo_payload(kind: DemoKind, avatar_url: &str) -> MessagePayload {
    match kind {
        DemoKind::Simple => simple_message(
            "This is a simple message with your avatar!",
            Some(avatar_url),
        ),
        DemoKind::Titled => titled_message(
            "Component v2 Demo",
            "This demonstrates a titled message with description and image.",
            Some(avatar_url),
        ),
        DemoKind::Multi => multi_section_message(&[
            SectionData::new(
                "## Section 1\nThis is the first section with your avatar.",
                Some(avatar_url.to_string()),
            ),
            SectionData::new(
                "## Section 2\nThis is the second section without an image.",
                None,
            ),
            SectionData::new(
                "## Section 3\nThis is the third section with your avatar again.",
                Some(avatar_url.to_string()),
            ),
        ]),
        DemoKind::Custom => MessageBuilder::new()
            .add_container(|c| {
                c.accent_color(colors::BLURPLE)
                    .add_section(|s| {
                        s.add_text("## Custom Build\nBuilt manually using builder pattern!")
                            .add_media(avatar_url)
                    })
                    .add_separator()
                    .add_section(|s| {
                        s.add_text("This shows how to build Component v2 messages step by step.")
                    })
            })
            .build(),
    }
}

/// Demonstrate Component v2 message building
#[poise::command(
    slash_command,
    rename = "component-demo",
    category = "General"
)]
pub async fn component_demo(
    ctx: Context<'_>,
    #[rename = "type"]
    #[description = "Type of component demo"]
    kind: DemoKind,
) -> Result<(), Error> {
    let avatar = ctx.author().face();
    send_component_reply(ctx, demo_payload(kind, &avatar)).await
}

pub fn example_rows() -> Vec<CreateActionRow> {
    let buttons = CreateActionRow::Buttons(vec![
        CreateButton::new("example_primary")
            .label("Primary")
            .style(ButtonStyle::Primary),
        CreateButton::new("example_success")
            .label("Success")
            .style(ButtonStyle::Success),
        CreateButton::new("example_danger")
            .label("Danger")
            .style(ButtonStyle::Danger),
    ]);
    let options = [
        ("Option 1", "option_1", "First option"),
        ("Option 2", "option_2", "Second option"),
        ("Option 3", "option_3", "Third option"),
    ]
    .into_iter()
    .map(|(label, value, description)| {
        CreateSelectMenuOption::new(label, value).description(description)
    })
    .collect();
    let select = CreateActionRow::SelectMenu(
        CreateSelectMenu::new(EXAMPLE_SELECT_ID, CreateSelectMenuKind::String { options })
            .placeholder("Choose an option"),
    );
    vec![buttons, select]
}

/// Example command with an embed, buttons and a select menu
#[poise::command(slash_command, prefix_command, category = "General")]
pub async fn example(ctx: Context<'_>) -> Result<(), Error> {
    let embed = create_embed(EmbedConfig {
        title: Some("Component v2 Example".into()),
        description: Some(
            "This is an example showing buttons and a select menu next to a legacy embed".into(),
        ),
        color: Some(colors::blurple()),
        ..Default::default()
    });
    ctx.send(CreateReply::default().embed(embed).components(example_rows()))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::infrastructure::message_components::IS_COMPONENTS_V2;

    #[test]
    fn hex_colors_in_every_accepted_shape() {
        assert_eq!(parse_hex_color("#ff0000"), Some(0xFF0000));
        assert_eq!(parse_hex_color("00FF00"), Some(0x00FF00));
        assert_eq!(parse_hex_color("#abc"), Some(0xAABBCC));
        assert_eq!(parse_hex_color("fff"), Some(0xFFFFFF));
        assert_eq!(parse_hex_color("0x5865F2"), Some(0x5865F2));
        assert_eq!(parse_hex_color("  #5865f2 "), Some(0x5865F2));
    }

    #[test]
    fn malformed_colors_are_rejected() {
        for input in ["", "#", "#ff00", "#gggggg", "ff00000", "red", "##fff"] {
            assert_eq!(parse_hex_color(input), None, "{input}");
        }
    }

    #[test]
    fn color_preview_uses_the_color_as_accent() {
        let value = serde_json::to_value(color_preview(0x102030)).unwrap();
        assert_eq!(value["components"][0]["accent_color"], json!(0x102030));
        assert_eq!(
            value["components"][0]["components"][0]["content"],
            json!("## Color\nHex: #102030\nDecimal: 1056816\nRGB: 16, 32, 48")
        );
    }

    #[test]
    fn multi_demo_has_three_sections_worth_of_text() {
        let payload = demo_payload(DemoKind::Multi, "https://cdn.example/a.png");
        assert_eq!(payload.flags, IS_COMPONENTS_V2);
        let text = payload.plain_text();
        assert!(text.contains("## Section 1"));
        assert!(text.contains("## Section 3"));
        assert_eq!(payload.components[0].components.len(), 3);
    }

    #[test]
    fn example_rows_use_the_routed_ids() {
        let value = serde_json::to_value(example_rows()).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[0]["components"].as_array().map(Vec::len), Some(3));
        assert_eq!(value[1]["components"][0]["custom_id"], json!(EXAMPLE_SELECT_ID));
    }
}
