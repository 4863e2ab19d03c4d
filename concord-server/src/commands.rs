use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::path::Path;

use concord_core::config as core_config;
use concord_core::ResyncRequest;
use concord_types::{
    AppConfig, DiscordId, GameId, ResultCategory, ResyncStatus, ResyncSummary, Someone, SyncCause,
    SyncKind,
};

use crate::cli::ConfigCommands;
use crate::state::build_engine;

pub fn load_config(path: &Path) -> Result<AppConfig> {
    core_config::load_config_from(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Parse `game:<uuid>`, `discord:<id>`, a bare UUID, or a bare snowflake.
pub fn parse_identity(raw: &str) -> Result<Someone> {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix("game:") {
        let id: GameId = rest.parse().with_context(|| format!("Invalid game UUID: {}", rest))?;
        return Ok(Someone::game(id));
    }
    if let Some(rest) = raw.strip_prefix("discord:") {
        let id: DiscordId = rest.parse().with_context(|| format!("Invalid Discord id: {}", rest))?;
        return Ok(Someone::discord(id));
    }
    if let Ok(id) = raw.parse::<GameId>() {
        return Ok(Someone::game(id));
    }
    if let Ok(id) = raw.parse::<DiscordId>() {
        return Ok(Someone::discord(id));
    }
    anyhow::bail!("Cannot parse identity '{}': expected a game UUID or a Discord id", raw)
}

pub fn parse_kinds(raw: &[String]) -> Result<Option<Vec<SyncKind>>> {
    if raw.is_empty() {
        return Ok(None);
    }
    let kinds = raw
        .iter()
        .map(|k| k.parse::<SyncKind>().map_err(|e| anyhow::anyhow!(e)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(kinds))
}

pub async fn handle_resync(
    config_path: &Path,
    identity: Option<String>,
    kinds: &[String],
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let request = ResyncRequest {
        identities: identity.as_deref().map(parse_identity).transpose()?.map(|who| vec![who]),
        kinds: parse_kinds(kinds)?,
        cause: SyncCause::COMMAND,
    };

    let engine = build_engine(config)?;
    let summary = engine.resync_many(request).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    if summary.status == ResyncStatus::Failure {
        anyhow::bail!("resync failed");
    }
    Ok(())
}

fn print_summary(summary: &ResyncSummary) {
    let status = match summary.status {
        ResyncStatus::Success => "success".green(),
        ResyncStatus::PartialFailure => "partial failure".yellow(),
        ResyncStatus::Failure => "failure".red(),
    };
    println!(
        "{} {} ({} identities, {} results, {} ms)",
        "Resync".cyan().bold(),
        status,
        summary.identities,
        summary.total,
        summary.duration_ms
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Result", "Count"]);
    for (result, count) in &summary.by_result {
        table.add_row(vec![Cell::new(result), Cell::new(count)]);
    }
    println!("{table}");

    if !summary.failures.is_empty() {
        let mut failures = Table::new();
        failures
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Identity", "Kind", "Entry", "Result", "Message"]);
        for failure in &summary.failures {
            failures.add_row(vec![
                Cell::new(failure.identity),
                Cell::new(failure.kind),
                Cell::new(failure.entry.as_deref().unwrap_or("-")),
                Cell::new(failure.result.label()).fg(Color::Red),
                Cell::new(&failure.message),
            ]);
        }
        println!("{failures}");
    }

    let errors = summary.by_category.get(&ResultCategory::Error).copied().unwrap_or(0);
    if errors > 0 {
        println!("{} {} entries need attention", "!".yellow(), errors);
    }
}

pub fn handle_config_command(config_path: &Path, cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show { json } => show_config(config_path, json),
        ConfigCommands::Validate => {
            let config = load_config(config_path)?;
            let enabled: Vec<&str> =
                SyncKind::ALL.iter().filter(|k| config.module_enabled(**k)).map(|k| k.as_str()).collect();
            println!(
                "{} {} is valid (enabled: {})",
                "✓".green(),
                config_path.display(),
                if enabled.is_empty() { "none".to_string() } else { enabled.join(", ") }
            );
            Ok(())
        },
    }
}

fn show_config(config_path: &Path, json: bool) -> Result<()> {
    let mut config = load_config(config_path)?;
    config.discord.token = mask_key(&config.discord.token);
    config.bridge.token = config.bridge.token.as_deref().map(mask_key);
    config.server.api_key = config.server.api_key.as_deref().map(mask_key);

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("{} {}", "Configuration:".cyan().bold(), config_path.display());
    println!(
        "  Guild: {}",
        config.discord.guild_id.map_or_else(|| "not set".to_string(), |g| g.to_string())
    );
    println!("  Discord token: {}", config.discord.token);
    println!("  Bridge: {}", config.bridge.url);
    println!("  API: {}:{}", config.server.host, config.server.port);
    println!(
        "  Timer: {}",
        if config.timer.enabled {
            format!("every {} min", config.timer.interval_minutes)
        } else {
            "off".to_string()
        }
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Module", "Enabled", "Details"]);
    for kind in SyncKind::ALL {
        let enabled = config.module_enabled(kind);
        let details = match kind {
            SyncKind::Ban => format!("{}, tie: {}", config.ban.direction, config.ban.tie_breaker.side()),
            SyncKind::Mute => format!("{}, tie: {}", config.mute.direction, config.mute.tie_breaker.side()),
            SyncKind::Group => format!("{} pairs", config.groups.pairs.len()),
            SyncKind::Nickname => {
                format!("{}, tie: {}", config.nickname.direction, config.nickname.tie_breaker.side())
            },
            SyncKind::OnlineRole => config
                .online_role
                .role_id
                .map_or_else(|| "no role".to_string(), |r| format!("role {}", r)),
        };
        table.add_row(vec![
            Cell::new(kind),
            if enabled { Cell::new("yes").fg(Color::Green) } else { Cell::new("no") },
            Cell::new(details),
        ]);
    }
    println!("{table}");

    for pair in &config.groups.pairs {
        println!("  {} {}", "-".dimmed(), pair.label());
    }
    Ok(())
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identity_forms() {
        let uuid = "0f8fad5b-d9cb-469f-a165-70867728950e";
        let game: GameId = uuid.parse().unwrap();

        assert_eq!(parse_identity(uuid).unwrap(), Someone::game(game));
        assert_eq!(parse_identity(&format!("game:{}", uuid)).unwrap(), Someone::game(game));
        assert_eq!(parse_identity("81384788765712384").unwrap(), Someone::discord(DiscordId(81384788765712384)));
        assert_eq!(parse_identity("discord:7").unwrap(), Someone::discord(DiscordId(7)));
        assert!(parse_identity("steve").is_err());
        assert!(parse_identity("game:123").is_err());
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!(parse_kinds(&[]).unwrap(), None);
        assert_eq!(
            parse_kinds(&["ban".into(), "online-role".into()]).unwrap(),
            Some(vec![SyncKind::Ban, SyncKind::OnlineRole])
        );
        assert!(parse_kinds(&["everything".into()]).is_err());
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("short"), "*****");
        assert_eq!(mask_key("abcdefghijkl"), "abcd...ijkl");
    }

    #[test]
    fn test_validate_reports_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("concord.json");
        std::fs::write(&path, r#"{"ban": {"enabled": true}}"#).unwrap();

        assert!(handle_config_command(&path, ConfigCommands::Validate).is_err());

        std::fs::write(&path, r#"{"discord": {"guild_id": "1"}, "ban": {"enabled": true}}"#)
            .unwrap();
        assert!(handle_config_command(&path, ConfigCommands::Validate).is_ok());
    }
}
