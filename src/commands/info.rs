use std::time::{Duration, Instant};

use tracing::debug;

use crate::{
    Context, Error,
    infrastructure::{
        message_components::component_reply,
        replies::{edit_component_reply, reply_text, send_component_reply},
    },
};

/// `{d}d {h}h {m}m {s}s`
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / 86_400;
    let hours = (total / 3_600) % 24;
    let minutes = (total / 60) % 60;
    let seconds = total % 60;
    format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
}

/// (total, available) in KiB from the contents of `/proc/meminfo`.
pub fn parse_meminfo(contents: &str) -> Option<(u64, u64)> {
    let field = |name: &str| {
        contents
            .lines()
            .find_map(|line| line.strip_prefix(name))
            .and_then(|rest| rest.trim_start_matches(':').split_whitespace().next())
            .and_then(|value| value.parse::<u64>().ok())
    };
    let total = field("MemTotal")?;
    let available = field("MemAvailable").or_else(|| field("MemFree"))?;
    Some((total, available))
}

/// One-minute load average from the contents of `/proc/loadavg`.
pub fn parse_loadavg(contents: &str) -> Option<f64> {
    contents.split_whitespace().next()?.parse().ok()
}

fn read_proc(path: &str) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Some(contents),
        Err(e) => {
            debug!("Could not read {}: {}", path, e);
            None
        }
    }
}

fn status_content(ping: Duration, load: Option<f64>, memory: Option<(u64, u64)>) -> String {
    let load = load
        .map(|l| format!("{:.2}", l))
        .unwrap_or_else(|| "Unavailable".to_string());
    let memory = memory
        .map(|(total, available)| {
            format!(
                "{} MB / {} MB",
                total.saturating_sub(available) / 1024,
                total / 1024
            )
        })
        .unwrap_or_else(|| "Unavailable".to_string());
    format!(
        "## Status\nWS Ping: {}ms\nLoad (1m): {}\nMemory Used: {}",
        ping.as_millis(),
        load,
        memory
    )
}

/// Check bot latency
#[poise::command(slash_command, prefix_command, category = "General")]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let start = Instant::now();
    reply_text(ctx, "Pinging...", true).await?;
    let roundtrip = start.elapsed();
    let websocket = ctx.ping().await;

    let content = format!(
        "## Pong\n\n- **Roundtrip Latency:** {}ms\n- **WebSocket Latency:** {}ms",
        roundtrip.as_millis(),
        websocket.as_millis()
    );
    edit_component_reply(ctx, component_reply(content, None, true)).await
}

/// Show bot uptime
#[poise::command(slash_command, prefix_command, category = "General")]
pub async fn uptime(ctx: Context<'_>) -> Result<(), Error> {
    let uptime = ctx.data().started_at.elapsed();
    reply_text(
        ctx,
        format!("## Uptime\nBot Uptime: {}", format_duration(uptime)),
        true,
    )
    .await
}

/// Show bot and host status
#[poise::command(slash_command, prefix_command, category = "General")]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let load = read_proc("/proc/loadavg").as_deref().and_then(parse_loadavg);
    let memory = read_proc("/proc/meminfo").as_deref().and_then(parse_meminfo);
    let content = status_content(ctx.ping().await, load, memory);
    reply_text(ctx, content, true).await
}

/// Show bot information
#[poise::command(slash_command, prefix_command, rename = "bot-info", category = "General")]
pub async fn bot_info(ctx: Context<'_>) -> Result<(), Error> {
    let (tag, id, avatar) = {
        let me = ctx.cache().current_user();
        (me.tag(), me.id, me.face())
    };
    let content = format!(
        "## Bot Info\nName: {}\nID: {}\nServers: {}\nWS Ping: {}ms",
        tag,
        id,
        ctx.cache().guild_count(),
        ctx.ping().await.as_millis()
    );
    send_component_reply(ctx, component_reply(content, Some(avatar.as_str()), true)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_split_into_units() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0d 0h 0m 0s");
        assert_eq!(
            format_duration(Duration::from_secs(2 * 86_400 + 3 * 3_600 + 4 * 60 + 5)),
            "2d 3h 4m 5s"
        );
        assert_eq!(format_duration(Duration::from_millis(59_999)), "0d 0h 0m 59s");
    }

    #[test]
    fn meminfo_prefers_available_memory() {
        let contents = "MemTotal:       16303428 kB\nMemFree:          512000 kB\nMemAvailable:    8151714 kB\n";
        assert_eq!(parse_meminfo(contents), Some((16303428, 8151714)));
    }

    #[test]
    fn meminfo_falls_back_to_free_memory() {
        let contents = "MemTotal: 2048 kB\nMemFree: 1024 kB\n";
        assert_eq!(parse_meminfo(contents), Some((2048, 1024)));
        assert_eq!(parse_meminfo("garbage"), None);
    }

    #[test]
    fn loadavg_reads_first_field() {
        assert_eq!(parse_loadavg("0.52 0.58 0.59 1/467 12345\n"), Some(0.52));
        assert_eq!(parse_loadavg(""), None);
    }

    #[test]
    fn status_reports_unavailable_values() {
        let content = status_content(Duration::from_millis(42), None, Some((2048 * 1024, 1024 * 1024)));
        assert_eq!(
            content,
            "## Status\nWS Ping: 42ms\nLoad (1m): Unavailable\nMemory Used: 1024 MB / 2048 MB"
        );
    }
}
