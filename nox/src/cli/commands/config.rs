//! Config command - configuration management

use crate::cli::{CliContext, OutputFormat, OutputFormatter};
use crate::config::{CredentialSet, Settings};
use crate::models::CredentialKey;
use anyhow::Context;
use clap::Subcommand;
use std::collections::BTreeMap;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (credentials as set/unset only)
    Show,

    /// Write a commented configuration template
    Init {
        /// Output path for the configuration file
        #[arg(short, long, default_value = "nox.toml")]
        output: String,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn execute(ctx: &CliContext, command: ConfigCommand) -> anyhow::Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);

    match command {
        ConfigCommand::Show => show_config(ctx, &formatter),
        ConfigCommand::Init { output, force } => init_config(&output, force, &formatter),
    }
}

/// "set", "placeholder" or "unset"; never the value itself.
pub fn credential_status(credentials: &CredentialSet, key: CredentialKey) -> &'static str {
    match credentials.get(key) {
        _ if credentials.is_usable(key) => "set",
        Some(_) => "placeholder",
        None => "unset",
    }
}

fn show_config(ctx: &CliContext, formatter: &OutputFormatter) -> anyhow::Result<()> {
    let settings = &ctx.settings;
    let config_file = ctx
        .config_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none, using defaults)".to_string());
    let credentials: BTreeMap<&str, &str> = CredentialKey::ALL
        .iter()
        .map(|key| (key.env_var(), credential_status(&settings.credentials, *key)))
        .collect();

    if ctx.output_format == OutputFormat::Json {
        formatter.json(&serde_json::json!({
            "config_file": config_file,
            "credentials": credentials,
            "pipeline": settings.pipeline,
            "search": settings.search,
            "scrape": settings.scrape,
        }));
        return Ok(());
    }

    formatter.section("Configuration");
    formatter.kv("Config file", &config_file);

    formatter.section("Credentials");
    for (name, status) in &credentials {
        formatter.kv(name, status);
    }

    formatter.section("Pipeline");
    let pipeline = &settings.pipeline;
    formatter.kv("Default model", &pipeline.default_model);
    formatter.kv("Threads", &pipeline.threads.to_string());
    formatter.kv("Cache TTL (s)", &pipeline.cache_ttl_secs.to_string());
    formatter.kv("Stream buffer limit", &pipeline.stream_buffer_limit.to_string());
    formatter.kv("Discovery timeout (s)", &pipeline.discovery_timeout_secs.to_string());
    formatter.kv(
        "Stream idle timeout (s)",
        &pipeline.stream_idle_timeout_secs.to_string(),
    );

    formatter.section("Search");
    for engine in &settings.search.engines {
        formatter.list_item(engine);
    }
    formatter.kv("Proxy", settings.search.proxy.as_deref().unwrap_or("(none)"));

    formatter.section("Scrape");
    formatter.kv("Proxy", settings.scrape.proxy.as_deref().unwrap_or("(none)"));
    formatter.kv("Max chars", &settings.scrape.max_chars.to_string());
    Ok(())
}

fn init_config(output: &str, force: bool, formatter: &OutputFormatter) -> anyhow::Result<()> {
    let path = std::path::Path::new(output);

    if path.exists() && !force {
        anyhow::bail!("File already exists: {}. Use --force to overwrite.", output);
    }

    std::fs::write(path, Settings::template())
        .with_context(|| format!("Failed to write config file {}", output))?;

    formatter.success(&format!("Created configuration file: {}", output));
    Ok(())
}
