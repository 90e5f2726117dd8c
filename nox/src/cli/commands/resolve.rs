//! Resolve command - show how a model name turns into a backend

use crate::cli::{CliContext, OutputFormat, OutputFormatter};
use clap::Args;

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Model name (case-insensitive)
    pub name: String,
}

pub async fn execute(ctx: &mut CliContext, args: ResolveArgs) -> anyhow::Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let resolver = ctx.resolver();
    let resolved = resolver.resolve_required(&args.name).await?;

    let missing: Vec<&str> = resolved
        .missing_credentials
        .iter()
        .map(|key| key.env_var())
        .collect();

    if ctx.output_format == OutputFormat::Json {
        formatter.json(&serde_json::json!({
            "id": resolved.id,
            "kind": resolved.kind.as_str(),
            "model": resolved.model,
            "base_url": resolved.base_url,
            "api_key": resolved.api_key.is_some(),
            "missing_credentials": missing,
        }));
        return Ok(());
    }

    formatter.section(&format!("Model {}", resolved.id));
    formatter.kv("Kind", resolved.kind.as_str());
    formatter.kv("Wire model", &resolved.model);
    formatter.kv(
        "Base URL",
        resolved.base_url.as_deref().unwrap_or("(provider default)"),
    );
    formatter.kv(
        "API key",
        if resolved.api_key.is_some() { "set" } else { "not set" },
    );
    for env_var in missing {
        formatter.warning(&format!("{} is missing or still a placeholder", env_var));
    }
    Ok(())
}
