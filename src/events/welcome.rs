use poise::serenity_prelude::{User, UserId};

use crate::infrastructure::message_components::{MessagePayload, simple_message};

pub fn default_welcome_content(user_id: UserId, server_name: &str) -> String {
    format!(
        "## Welcome!\n<@{}>, you've just joined {}.\nWe're glad to have you here.",
        user_id, server_name
    )
}

/// Fills `{user}`, `{server}` and `{username}` everywhere in a custom welcome message. All
/// other text, braces included, is left as written.
pub fn render_welcome_template(
    template: &str,
    user_id: UserId,
    server_name: &str,
    username: &str,
) -> String {
    let mention = format!("<@{}>", user_id);
    template
        .replace("\\n", "\n")
        .replace("{user}", &mention)
        .replace("{server}", server_name)
        .replace("{username}", username)
}

pub fn create_welcome_component(user: &User, server_name: &str) -> MessagePayload {
    simple_message(
        default_welcome_content(user.id, server_name),
        Some(user.face().as_str()),
    )
}

pub fn create_custom_welcome_component(
    user: &User,
    server_name: &str,
    custom_message: &str,
) -> MessagePayload {
    simple_message(
        render_welcome_template(custom_message, user.id, server_name, &user.name),
        Some(user.face().as_str()),
    )
}

/// Picks the custom message when one is stored and not blank.
pub fn welcome_component_for(
    user: &User,
    server_name: &str,
    custom_message: Option<&str>,
) -> MessagePayload {
    match custom_message.filter(|m| !m.trim().is_empty()) {
        Some(message) => create_custom_welcome_component(user, server_name, message),
        None => create_welcome_component(user, server_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: UserId = UserId::new(42);

    #[test]
    fn default_content_mentions_the_member() {
        assert_eq!(
            default_welcome_content(USER, "Ophelia"),
            "## Welcome!\n<@42>, you've just joined Ophelia.\nWe're glad to have you here."
        );
    }

    #[test]
    fn template_replaces_every_occurrence() {
        let rendered = render_welcome_template(
            "Hi {user}! {username} joined {server}. Again, {user}.",
            USER,
            "Ophelia",
            "alice",
        );
        assert_eq!(rendered, "Hi <@42>! alice joined Ophelia. Again, <@42>.");
    }

    #[test]
    fn template_converts_escaped_newlines() {
        let rendered = render_welcome_template("Line one\\nLine two {user}", USER, "S", "u");
        assert_eq!(rendered, "Line one\nLine two <@42>");
    }

    #[test]
    fn unknown_placeholders_survive() {
        let rendered = render_welcome_template("{user} read {rules} in {server}", USER, "S", "u");
        assert_eq!(rendered, "<@42> read {rules} in S");
    }

    #[test]
    fn unbalanced_braces_still_substitute() {
        let rendered = render_welcome_template("{user} :} {", USER, "S", "u");
        assert_eq!(rendered, "<@42> :} {");
    }

    #[test]
    fn doubled_braces_are_not_escapes() {
        let rendered = render_welcome_template("{{server}} fans welcome {user}", USER, "S", "u");
        assert_eq!(rendered, "{S} fans welcome <@42>");
    }

    #[test]
    fn format_specs_are_plain_text() {
        let rendered = render_welcome_template("Hi {user:>12}! {user}", USER, "S", "u");
        assert_eq!(rendered, "Hi {user:>12}! <@42>");
    }
}
