use poise::serenity_prelude::Typing;

use crate::{Context as OpheliaContext, Error};

/// Creates a lazily initialized static regex variable with a constant regex expression.
#[macro_export]
macro_rules! lazy_regex {
    ($name:ident, $value:expr) => {
        static $name: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($value).expect("Regex contains body"));
    };
}

/// Appropriately indicates to the end user that the bot is working on a response.
/// - For Application (/) commands, this defers the interaction ("Ophelia Store Bot is thinking...").
/// - For prefix commands, this is indicated by the typing hint in the invoking channel.
///
/// Note:
/// When the returned result goes out of scope, is dropped, or Typing.stop() is called, the typing hint will disappear.
pub async fn defer_or_broadcast(
    ctx: OpheliaContext<'_>,
    ephemeral: bool,
) -> Result<Option<Typing>, Error> {
    match ctx {
        poise::Context::Application(appctx) => {
            appctx.defer_response(ephemeral).await?;
            Ok(None)
        }
        poise::Context::Prefix(prefixctx) => Ok(Some(
            prefixctx
                .msg
                .channel_id
                .start_typing(&prefixctx.serenity_context.http),
        )),
    }
}

/// Truncates to at most `max` characters without splitting a character.
pub fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }
}
