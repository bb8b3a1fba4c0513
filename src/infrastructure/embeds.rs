//! Legacy embed helpers, used where a message mixes embeds with action rows.

use poise::serenity_prelude::{
    Colour, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, Timestamp,
};

use crate::infrastructure::colors;

pub const DEFAULT_FOOTER: &str = "Ophelia Store Bot";

#[derive(Debug, Clone, Default)]
pub struct EmbedAuthor {
    pub name: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EmbedConfig {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<Colour>,
    pub thumbnail: Option<String>,
    pub image: Option<String>,
    pub footer: Option<String>,
    pub author: Option<EmbedAuthor>,
    /// (name, value, inline)
    pub fields: Vec<(String, String, bool)>,
}

pub fn create_embed(config: EmbedConfig) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .color(config.color.unwrap_or_else(colors::blurple))
        .footer(CreateEmbedFooter::new(
            config.footer.unwrap_or_else(|| DEFAULT_FOOTER.to_string()),
        ))
        .timestamp(Timestamp::now());

    if let Some(title) = config.title {
        embed = embed.title(title);
    }
    if let Some(description) = config.description {
        embed = embed.description(description);
    }
    if let Some(thumbnail) = config.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    if let Some(image) = config.image {
        embed = embed.image(image);
    }
    if let Some(author) = config.author {
        let mut embed_author = CreateEmbedAuthor::new(author.name);
        if let Some(icon) = author.icon_url {
            embed_author = embed_author.icon_url(icon);
        }
        embed = embed.author(embed_author);
    }
    if !config.fields.is_empty() {
        embed = embed.fields(config.fields);
    }
    embed
}

pub fn success_embed(message: impl Into<String>) -> CreateEmbed {
    create_embed(EmbedConfig {
        description: Some(message.into()),
        color: Some(colors::success()),
        ..Default::default()
    })
}

pub fn error_embed(message: impl Into<String>) -> CreateEmbed {
    create_embed(EmbedConfig {
        title: Some("Error".into()),
        description: Some(message.into()),
        color: Some(colors::failure()),
        ..Default::default()
    })
}

pub fn info_embed(message: impl Into<String>) -> CreateEmbed {
    create_embed(EmbedConfig {
        description: Some(message.into()),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults_are_applied() {
        let value = serde_json::to_value(info_embed("hi")).unwrap();
        assert_eq!(value["color"], json!(colors::BLURPLE));
        assert_eq!(value["footer"]["text"], json!(DEFAULT_FOOTER));
        assert_eq!(value["description"], json!("hi"));
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn error_embed_is_titled_and_red() {
        let value = serde_json::to_value(error_embed("boom")).unwrap();
        assert_eq!(value["title"], json!("Error"));
        assert_eq!(value["color"], json!(colors::FAILURE));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let value = serde_json::to_value(create_embed(EmbedConfig {
            footer: Some("custom".into()),
            color: Some(colors::success()),
            fields: vec![("a".into(), "b".into(), true)],
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(value["footer"]["text"], json!("custom"));
        assert_eq!(value["color"], json!(colors::SUCCESS));
        assert_eq!(value["fields"][0]["inline"], json!(true));
    }
}
