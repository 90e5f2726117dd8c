//! Models command - list the models usable right now

use crate::cli::{CliContext, OutputFormat, OutputFormatter};
use crate::models::ModelResolver;
use clap::Args;
use serde::Serialize;

#[derive(Debug, Args)]
pub struct ModelsArgs {
    /// Only list models found on local inference servers
    #[arg(long)]
    pub local: bool,
}

#[derive(Debug, Serialize)]
struct ModelRow {
    id: String,
    kind: String,
    source: &'static str,
    default: bool,
}

pub async fn execute(ctx: &mut CliContext, args: ModelsArgs) -> anyhow::Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let resolver = ctx.resolver();

    ctx.debug("Probing local inference servers...");
    let visible = resolver.list_visible().await;
    let default = ModelResolver::default_model(&visible, &ctx.settings.pipeline.default_model);

    let rows: Vec<ModelRow> = visible
        .iter()
        .map(|id| {
            let (kind, source) = match resolver.catalog().lookup(id) {
                Some(descriptor) => (descriptor.kind.to_string(), "catalog"),
                None => ("local".to_string(), "discovered"),
            };
            ModelRow {
                id: id.clone(),
                kind,
                source,
                default: default.as_deref() == Some(id.as_str()),
            }
        })
        .filter(|row| !args.local || row.source == "discovered")
        .collect();

    if ctx.output_format == OutputFormat::Json {
        formatter.json(&serde_json::json!({ "models": rows }));
        return Ok(());
    }

    if rows.is_empty() {
        formatter.warning(
            "No models available. Set a provider API key or start a local inference server.",
        );
        return Ok(());
    }

    formatter.section("Available models");
    formatter.table_header(&["MODEL", "KIND", "SOURCE"]);
    for row in &rows {
        let id = if row.default {
            format!("{} (default)", row.id)
        } else {
            row.id.clone()
        };
        formatter.table_row(&[id.as_str(), row.kind.as_str(), row.source]);
    }
    Ok(())
}
