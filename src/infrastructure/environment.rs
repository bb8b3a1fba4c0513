use std::path::PathBuf;

use anyhow::Context;

macro_rules! const_str {
    ($name:ident) => {
        pub const $name: &str = stringify!($name);
    };
}

const_str!(DATA_DIRECTORY);
const_str!(DATABASE_URL);
const_str!(DISCORD_TOKEN);
const_str!(OWNERS);
const_str!(COMMAND_DISABLE_LIST);
const_str!(STATS_REFRESH_SECONDS);
const_str!(PRESENCE_ACTIVITY);

const_str!(LOG_LEVEL);
const_str!(LOG_STYLE);
const_str!(LOG_PATH);

pub const DEFAULT_STATS_REFRESH_SECONDS: u64 = 600;
pub const DEFAULT_PRESENCE_ACTIVITY: &str = "Ophelia Store";

/// Reads a required environment variable, naming it in the error when missing.
pub fn env_var_with_context(name: &str) -> anyhow::Result<String> {
    std::env::var(name).context(format!("missing environment variable {}", name))
}

pub fn get_data_directory() -> PathBuf {
    std::env::var(DATA_DIRECTORY)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

pub fn get_log_directory() -> PathBuf {
    get_data_directory().join("logs")
}

/// `DATABASE_URL`, or a SQLite file in the data directory.
pub fn get_database_url() -> String {
    std::env::var(DATABASE_URL).unwrap_or_else(|_| default_database_url(&get_data_directory()))
}

fn default_database_url(data_dir: &std::path::Path) -> String {
    format!(
        "sqlite://{}?mode=rwc",
        data_dir.join("ophelia.sqlite").display()
    )
}

/// Interval of the background stats refresh, or `None` when it is disabled with `0`.
pub fn get_stats_refresh_interval() -> Option<std::time::Duration> {
    let seconds = match std::env::var(STATS_REFRESH_SECONDS) {
        Ok(value) => parse_refresh_seconds(&value),
        Err(_) => DEFAULT_STATS_REFRESH_SECONDS,
    };
    (seconds > 0).then(|| std::time::Duration::from_secs(seconds))
}

fn parse_refresh_seconds(value: &str) -> u64 {
    match value.trim().parse::<u64>() {
        Ok(seconds) => seconds,
        Err(e) => {
            tracing::warn!(
                "Invalid {} '{}' ({}), using {}",
                STATS_REFRESH_SECONDS,
                value,
                e,
                DEFAULT_STATS_REFRESH_SECONDS
            );
            DEFAULT_STATS_REFRESH_SECONDS
        }
    }
}

pub fn get_presence_activity() -> String {
    std::env::var(PRESENCE_ACTIVITY)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PRESENCE_ACTIVITY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_database_url_lives_in_data_directory() {
        let url = default_database_url(std::path::Path::new("data"));
        assert_eq!(url, "sqlite://data/ophelia.sqlite?mode=rwc");
    }

    #[test]
    fn refresh_seconds_fall_back_on_garbage() {
        assert_eq!(parse_refresh_seconds(" 30 "), 30);
        assert_eq!(parse_refresh_seconds("0"), 0);
        assert_eq!(
            parse_refresh_seconds("soon"),
            DEFAULT_STATS_REFRESH_SECONDS
        );
    }

    #[test]
    fn variable_names_match_constants() {
        assert_eq!(DISCORD_TOKEN, "DISCORD_TOKEN");
        assert_eq!(STATS_REFRESH_SECONDS, "STATS_REFRESH_SECONDS");
    }
}
