/*!

Builders for Discord "Components V2" messages.

A V2 message carries no `content` or `embeds`; everything is a tree of typed nodes:

```text
MessagePayload
└── Container (17)
    ├── Section (9) ── TextDisplay (10) x1..3 + Thumbnail (11) accessory
    ├── TextDisplay (10)
    └── Separator (14)
```

serenity 0.12 has no builders for these node types, so the tree is modelled here with plain
serde types and posted through the raw HTTP client (see [`crate::infrastructure::replies`]).

*/

use serde::{Serialize, Serializer};

/// Message flag marking the payload as a Components V2 message.
pub const IS_COMPONENTS_V2: u64 = 1 << 15;
/// Message flag making an interaction response visible to the invoker only.
pub const EPHEMERAL: u64 = 1 << 6;

/// Interaction callback type for "respond with a message".
const CHANNEL_MESSAGE_WITH_SOURCE: u8 = 4;
/// Discord accepts between one and three text displays per section.
const MAX_SECTION_TEXTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ComponentKind {
    Section = 9,
    TextDisplay = 10,
    Thumbnail = 11,
    Separator = 14,
    Container = 17,
}

impl Serialize for ComponentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextDisplay {
    #[serde(rename = "type")]
    kind: ComponentKind,
    pub content: String,
}

impl TextDisplay {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            kind: ComponentKind::TextDisplay,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnfurledMedia {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thumbnail {
    #[serde(rename = "type")]
    kind: ComponentKind,
    pub media: UnfurledMedia,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Thumbnail {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            kind: ComponentKind::Thumbnail,
            media: UnfurledMedia { url: url.into() },
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    #[serde(rename = "type")]
    kind: ComponentKind,
    pub components: Vec<TextDisplay>,
    pub accessory: Thumbnail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Separator {
    #[serde(rename = "type")]
    kind: ComponentKind,
    pub divider: bool,
    /// 1 = small, 2 = large
    pub spacing: u8,
}

impl Default for Separator {
    fn default() -> Self {
        Self {
            kind: ComponentKind::Separator,
            divider: true,
            spacing: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContainerChild {
    Section(Section),
    Text(TextDisplay),
    Separator(Separator),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Container {
    #[serde(rename = "type")]
    kind: ComponentKind,
    pub components: Vec<ContainerChild>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<u32>,
}

/// Body of a Components V2 message, usable for channel messages, interaction responses and
/// follow-ups alike.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagePayload {
    pub flags: u64,
    pub components: Vec<Container>,
}

impl MessagePayload {
    pub fn is_ephemeral(&self) -> bool {
        self.flags & EPHEMERAL != 0
    }

    /// Channel messages reject the ephemeral flag.
    pub fn without_ephemeral(mut self) -> Self {
        self.flags &= !EPHEMERAL;
        self
    }

    /// All text of the message, in order, joined by newlines.
    pub fn plain_text(&self) -> String {
        let mut texts: Vec<&str> = vec![];
        for container in &self.components {
            for child in &container.components {
                match child {
                    ContainerChild::Section(section) => {
                        texts.extend(section.components.iter().map(|t| t.content.as_str()))
                    }
                    ContainerChild::Text(text) => texts.push(&text.content),
                    ContainerChild::Separator(_) => {}
                }
            }
        }
        texts.join("\n")
    }

    pub fn into_interaction_response(self) -> InteractionCallback {
        InteractionCallback {
            kind: CHANNEL_MESSAGE_WITH_SOURCE,
            data: self,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionCallback {
    #[serde(rename = "type")]
    kind: u8,
    data: MessagePayload,
}

#[derive(Debug, Default)]
pub struct SectionBuilder {
    texts: Vec<String>,
    media: Option<String>,
}

impl SectionBuilder {
    pub fn add_text(mut self, content: impl Into<String>) -> Self {
        self.texts.push(content.into());
        self
    }

    /// Sets the thumbnail accessory. A section holds one accessory; the last call wins.
    pub fn add_media(mut self, url: impl Into<String>) -> Self {
        self.media = Some(url.into());
        self
    }

    /// Sections need an accessory, so a section without media becomes bare text displays.
    /// Media without any text is dropped.
    fn build(mut self) -> Vec<ContainerChild> {
        match self.media {
            Some(url) if !self.texts.is_empty() => {
                if self.texts.len() > MAX_SECTION_TEXTS {
                    let overflow = self.texts.split_off(MAX_SECTION_TEXTS - 1).join("\n");
                    self.texts.push(overflow);
                }
                vec![ContainerChild::Section(Section {
                    kind: ComponentKind::Section,
                    components: self.texts.into_iter().map(TextDisplay::new).collect(),
                    accessory: Thumbnail::new(url),
                })]
            }
            _ => self
                .texts
                .into_iter()
                .map(|t| ContainerChild::Text(TextDisplay::new(t)))
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ContainerBuilder {
    children: Vec<ContainerChild>,
    accent_color: Option<u32>,
}

impl ContainerBuilder {
    pub fn add_section(mut self, f: impl FnOnce(SectionBuilder) -> SectionBuilder) -> Self {
        self.children.extend(f(SectionBuilder::default()).build());
        self
    }

    pub fn add_text(mut self, content: impl Into<String>) -> Self {
        self.children
            .push(ContainerChild::Text(TextDisplay::new(content)));
        self
    }

    pub fn add_separator(mut self) -> Self {
        self.children
            .push(ContainerChild::Separator(Separator::default()));
        self
    }

    pub fn accent_color(mut self, color: u32) -> Self {
        self.accent_color = Some(color);
        self
    }

    fn build(self) -> Container {
        Container {
            kind: ComponentKind::Container,
            components: self.children,
            accent_color: self.accent_color,
        }
    }
}

#[derive(Debug)]
pub struct MessageBuilder {
    flags: u64,
    containers: Vec<Container>,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::with_flags(IS_COMPONENTS_V2)
    }
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flags(flags: u64) -> Self {
        Self {
            flags,
            containers: vec![],
        }
    }

    pub fn add_container(mut self, f: impl FnOnce(ContainerBuilder) -> ContainerBuilder) -> Self {
        self.containers.push(f(ContainerBuilder::default()).build());
        self
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        if ephemeral {
            self.flags |= EPHEMERAL;
        } else {
            self.flags &= !EPHEMERAL;
        }
        self
    }

    pub fn build(self) -> MessagePayload {
        MessagePayload {
            flags: self.flags,
            components: self.containers,
        }
    }
}

/// One section of a [`multi_section_message`].
#[derive(Debug, Clone, Default)]
pub struct SectionData {
    pub content: String,
    pub image_url: Option<String>,
}

impl SectionData {
    pub fn new(content: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            content: content.into(),
            image_url,
        }
    }
}

fn section_with(
    section: SectionBuilder,
    content: impl Into<String>,
    image_url: Option<&str>,
) -> SectionBuilder {
    let section = section.add_text(content);
    match image_url {
        Some(url) => section.add_media(url),
        None => section,
    }
}

pub fn simple_message(content: impl Into<String>, image_url: Option<&str>) -> MessagePayload {
    MessageBuilder::new()
        .add_container(|c| c.add_section(|s| section_with(s, content, image_url)))
        .build()
}

pub fn titled_message(title: &str, description: &str, image_url: Option<&str>) -> MessagePayload {
    simple_message(format!("## {}\n{}", title, description), image_url)
}

pub fn multi_section_message(sections: &[SectionData]) -> MessagePayload {
    MessageBuilder::new()
        .add_container(|container| {
            sections.iter().fold(container, |c, data| {
                c.add_section(|s| section_with(s, data.content.clone(), data.image_url.as_deref()))
            })
        })
        .build()
}

/// The reply shape used by nearly every command: one container, one section, optional image.
pub fn component_reply(
    content: impl Into<String>,
    image_url: Option<&str>,
    ephemeral: bool,
) -> MessagePayload {
    MessageBuilder::new()
        .ephemeral(ephemeral)
        .add_container(|c| c.add_section(|s| section_with(s, content, image_url)))
        .build()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn simple_message_with_image_is_a_section() {
        let payload = simple_message("hello", Some("https://cdn.example/a.png"));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "flags": 32768,
                "components": [{
                    "type": 17,
                    "components": [{
                        "type": 9,
                        "components": [{ "type": 10, "content": "hello" }],
                        "accessory": { "type": 11, "media": { "url": "https://cdn.example/a.png" } }
                    }]
                }]
            })
        );
    }

    #[test]
    fn section_without_media_collapses_to_text() {
        let payload = simple_message("just text", None);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "flags": 32768,
                "components": [{
                    "type": 17,
                    "components": [{ "type": 10, "content": "just text" }]
                }]
            })
        );
    }

    #[test]
    fn ephemeral_flag_is_toggled() {
        let payload = component_reply("x", None, true);
        assert_eq!(payload.flags, IS_COMPONENTS_V2 | EPHEMERAL);
        assert!(payload.is_ephemeral());

        let stripped = payload.without_ephemeral();
        assert_eq!(stripped.flags, IS_COMPONENTS_V2);
        assert!(!component_reply("x", None, false).is_ephemeral());
    }

    #[test]
    fn titled_message_prefixes_heading() {
        let payload = titled_message("Title", "Body", None);
        assert_eq!(payload.plain_text(), "## Title\nBody");
    }

    #[test]
    fn multi_section_keeps_order_and_images() {
        let payload = multi_section_message(&[
            SectionData::new("one", Some("https://a".into())),
            SectionData::new("two", None),
            SectionData::new("three", Some("https://c".into())),
        ]);
        let children = &payload.components[0].components;
        assert_eq!(children.len(), 3);
        assert!(matches!(children[0], ContainerChild::Section(_)));
        assert!(matches!(children[1], ContainerChild::Text(_)));
        assert!(matches!(children[2], ContainerChild::Section(_)));
        assert_eq!(payload.plain_text(), "one\ntwo\nthree");
    }

    #[test]
    fn last_media_wins_and_extra_texts_are_merged() {
        let payload = MessageBuilder::new()
            .add_container(|c| {
                c.add_section(|s| {
                    s.add_text("a")
                        .add_text("b")
                        .add_text("c")
                        .add_text("d")
                        .add_media("https://first")
                        .add_media("https://second")
                })
            })
            .build();
        let ContainerChild::Section(section) = &payload.components[0].components[0] else {
            panic!("expected a section");
        };
        assert_eq!(section.components.len(), 3);
        assert_eq!(section.components[2].content, "c\nd");
        assert_eq!(section.accessory.media.url, "https://second");
    }

    #[test]
    fn media_without_text_is_dropped() {
        let payload = MessageBuilder::new()
            .add_container(|c| c.add_section(|s| s.add_media("https://lonely")))
            .build();
        assert!(payload.components[0].components.is_empty());
    }

    #[test]
    fn container_extras_serialize() {
        let payload = MessageBuilder::new()
            .add_container(|c| c.accent_color(0xFF0000).add_text("a").add_separator().add_text("b"))
            .build();
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["components"][0]["accent_color"], json!(0xFF0000));
        assert_eq!(
            value["components"][0]["components"][1],
            json!({ "type": 14, "divider": true, "spacing": 1 })
        );
    }

    #[test]
    fn interaction_response_wraps_payload() {
        let value =
            serde_json::to_value(component_reply("pong", None, true).into_interaction_response())
                .unwrap();
        assert_eq!(value["type"], json!(4));
        assert_eq!(value["data"]["flags"], json!(32768 | 64));
    }
}
