use std::path::Path;

use stripemd::config::{validate_config, Config};
use stripemd::error::Result;
use stripemd::fid::FID_SEQ_NORMAL;

struct DiagnosticCheck {
    name: String,
    status: DiagnosticStatus,
    details: Option<String>,
}

enum DiagnosticStatus {
    Ok,
    Warning,
    Error,
}

impl DiagnosticCheck {
    fn ok(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: DiagnosticStatus::Ok,
            details: Some(details.into()),
        }
    }

    fn warning(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: DiagnosticStatus::Warning,
            details: Some(details.into()),
        }
    }

    fn error(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: DiagnosticStatus::Error,
            details: Some(details.into()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            DiagnosticStatus::Ok => "\u{2713}",
            DiagnosticStatus::Warning => "\u{26a0}",
            DiagnosticStatus::Error => "\u{2717}",
        }
    }
}

/// Returns true when no check failed outright.
pub fn run_doctor(config_path: &Path) -> Result<bool> {
    println!();
    println!("stripemd Diagnostics");
    println!("====================");
    println!();

    let mut checks: Vec<DiagnosticCheck> = Vec::new();
    let mut suggestions: Vec<String> = Vec::new();

    let (config_check, config) = check_config(config_path);
    if matches!(config_check.status, DiagnosticStatus::Warning) {
        suggestions.push(format!(
            "Describe the cluster's shards in {}",
            config_path.display()
        ));
    }
    checks.push(config_check);

    if let Some(config) = &config {
        checks.push(check_shards(config));
        checks.extend(check_sequences(config));
        checks.push(check_allocator(config));
        if config.shards.iter().any(|s| s.address.is_none()) {
            suggestions.push("Set 'address' for every shard so clients can connect".to_string());
        }
    }

    for check in &checks {
        let details = check.details.as_deref().unwrap_or("");
        println!("{} {} - {}", check.symbol(), check.name, details);
    }

    if !suggestions.is_empty() {
        println!();
        println!("Suggestions:");
        for suggestion in &suggestions {
            println!("  -> {}", suggestion);
        }
    }

    println!();

    Ok(!checks
        .iter()
        .any(|c| matches!(c.status, DiagnosticStatus::Error)))
}

fn check_config(config_path: &Path) -> (DiagnosticCheck, Option<Config>) {
    if !config_path.exists() {
        return (
            DiagnosticCheck::warning(
                "Config file",
                format!("not found at {}", config_path.display()),
            ),
            None,
        );
    }

    match std::fs::read_to_string(config_path) {
        Ok(content) => match toml::from_str::<Config>(&content) {
            Ok(config) => {
                let check = match validate_config(&config) {
                    Ok(()) => {
                        DiagnosticCheck::ok("Config file", format!("{} (valid)", config_path.display()))
                    }
                    Err(e) => DiagnosticCheck::error("Config file", format!("invalid: {}", e)),
                };
                (check, Some(config))
            }
            Err(e) => (
                DiagnosticCheck::error("Config file", format!("parse error: {}", e)),
                None,
            ),
        },
        Err(e) => (
            DiagnosticCheck::error("Config file", format!("read error: {}", e)),
            None,
        ),
    }
}

fn check_shards(config: &Config) -> DiagnosticCheck {
    let count = config.shards.len();
    if count == 0 {
        return DiagnosticCheck::warning("Shards", "none configured");
    }
    let offline = config.shards.iter().filter(|s| s.address.is_none()).count();
    if offline > 0 {
        DiagnosticCheck::warning(
            "Shards",
            format!("{} configured, {} without an address", count, offline),
        )
    } else {
        DiagnosticCheck::ok("Shards", format!("{} configured", count))
    }
}

fn check_sequences(config: &Config) -> Vec<DiagnosticCheck> {
    config
        .shards
        .iter()
        .map(|shard| {
            let name = format!("Sequences of #{} ({})", shard.index, shard.get_name());
            if shard.sequences.is_empty() {
                return DiagnosticCheck::warning(name, "no ranges, shard owns no fids");
            }
            if let Some(low) = shard.sequences.iter().find(|r| r.start < FID_SEQ_NORMAL) {
                return DiagnosticCheck::warning(
                    name,
                    format!("range starting at {:#x} is below the normal fid space", low.start),
                );
            }
            let total: u64 = shard
                .sequences
                .iter()
                .map(|r| r.end.saturating_sub(r.start))
                .sum();
            DiagnosticCheck::ok(
                name,
                format!("{} range(s), {} sequences", shard.sequences.len(), total),
            )
        })
        .collect()
}

fn check_allocator(config: &Config) -> DiagnosticCheck {
    DiagnosticCheck::ok(
        "Allocator",
        format!("{:#x} objects per sequence", config.allocator.get_seq_width()),
    )
}
