use std::num::ParseIntError;

use poise::serenity_prelude::GuildId;
use tracing::trace;

use crate::{Context, Error};

pub fn require_guild_id(ctx: Context<'_>) -> Result<GuildId, Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This function is only available in guilds")?;
    trace!("Found guild_id={:?}", guild_id);
    Ok(guild_id)
}

pub fn id_to_string<T>(value: T) -> String
where
    T: Into<u64>,
{
    let int: u64 = value.into();
    int.to_string()
}

pub fn id_from_string<T>(value: &str) -> Result<T, ParseIntError>
where
    T: From<u64>,
{
    value.parse::<u64>().map(|int| T::from(int))
}

#[cfg(test)]
mod tests {
    use poise::serenity_prelude::{ChannelId, RoleId};

    use super::*;

    #[test]
    fn ids_survive_string_storage() {
        let stored = id_to_string(ChannelId::new(1234567890123));
        assert_eq!(stored, "1234567890123");
        let parsed: ChannelId = id_from_string(&stored).unwrap();
        assert_eq!(parsed, ChannelId::new(1234567890123));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(id_from_string::<RoleId>("not-a-number").is_err());
        assert!(id_from_string::<RoleId>("").is_err());
    }
}
