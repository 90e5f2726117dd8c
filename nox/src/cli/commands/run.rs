//! Run command - full investigation from query to report

use super::Reported;
use crate::cli::{CliContext, OutputFormat, OutputFormatter};
use crate::llm::ClientFactory;
use crate::models::ModelResolver;
use crate::pipeline::{
    FailureReason, RunObserver, RunOutcome, RunState, StageFailure, StageRunner,
};
use crate::research::{write_markdown, HttpScraper, HttpSearchEngine, PromptedReasoner};
use crate::streaming::ConsoleSink;
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Dark web search query
    #[arg(short, long)]
    pub query: String,

    /// Model to use (see `nox models`); defaults to the configured default
    #[arg(short, long)]
    pub model: Option<String>,

    /// Concurrency for search and scrape
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Report file name without extension
    #[arg(short, long)]
    pub output: Option<String>,

    /// Directory the report is written to
    #[arg(long, default_value = ".")]
    pub report_dir: PathBuf,
}

pub async fn execute(ctx: &mut CliContext, args: RunArgs) -> anyhow::Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let resolver = ctx.resolver();

    let model = match args.model {
        Some(model) => model,
        None => {
            let visible = resolver.list_visible().await;
            ModelResolver::default_model(&visible, &ctx.settings.pipeline.default_model).context(
                "No models available. Set a provider API key or start a local inference server.",
            )?
        }
    };
    if !ctx.quiet {
        formatter.step(&format!("Initializing with model: {}", model));
    }

    let resolved = resolver.resolve_required(&model).await?;
    let llm = ClientFactory::from_settings(&ctx.settings)
        .with_sinks(vec![Arc::new(summary_sink(ctx.output_format))])
        .build(&resolved)?;
    ctx.debug(&format!("Using {} via {}", resolved.model, llm.provider()));

    let search = Arc::new(HttpSearchEngine::from_config(&ctx.settings.search)?);
    let scraper = Arc::new(HttpScraper::from_config(&ctx.settings.scrape)?);
    let mut runner = StageRunner::new(search, scraper, Arc::new(PromptedReasoner::new()))
        .with_config(&ctx.settings.pipeline)
        .with_threads(args.threads.unwrap_or(ctx.settings.pipeline.threads))
        .with_observer(progress_observer(ctx.output_format, ctx.quiet));

    let outcome = match runner.run(&llm, &args.query).await {
        Ok(outcome) => outcome,
        Err(failure) => {
            report_failure(&formatter, &failure);
            return Err(Reported(failure.to_string()).into());
        }
    };
    formatter.finish_stream();

    let path = write_markdown(&args.report_dir, args.output.as_deref(), &outcome.summary)
        .with_context(|| format!("Failed to write report to {}", args.report_dir.display()))?;

    if ctx.output_format == OutputFormat::Json {
        formatter.json(&outcome_json(&outcome, &resolved.id, &path));
    } else {
        if !ctx.quiet {
            formatter.step(&format!("Refined query: {}", outcome.refined_query));
            formatter.step(&format!(
                "{} raw results, {} kept, {} pages scraped",
                outcome.results.len(),
                outcome.filtered.len(),
                outcome.documents.len()
            ));
        }
        formatter.success(&format!("Final intelligence summary saved to {}", path.display()));
    }
    Ok(())
}

/// The summary streams live to the terminal; under `json` that is stderr so
/// stdout holds only the final document.
fn summary_sink(format: OutputFormat) -> ConsoleSink {
    ConsoleSink::new(format.stream_target())
}

fn progress_observer(format: OutputFormat, quiet: bool) -> Arc<dyn RunObserver> {
    Arc::new(move |state: &RunState| {
        if quiet {
            return;
        }
        if let RunState::Running(stage) = state {
            OutputFormatter::new(format).step(&format!("{}...", stage.progress_label()));
        }
    })
}

fn report_failure(formatter: &OutputFormatter, failure: &StageFailure) {
    let message = match &failure.reason {
        FailureReason::NoSearchResults => {
            "No search results found. Tor may be unstable or the query returned 0 hits."
                .to_string()
        }
        FailureReason::NoScrapableContent => {
            "Failed to scrape any content. Check the Tor connection.".to_string()
        }
        reason => format!("Failed to {}: {}", failure.stage, reason),
    };
    formatter.error(&message);
    for hint in failure.hints() {
        formatter.warning(&hint);
    }
}

fn outcome_json(outcome: &RunOutcome, model: &str, path: &std::path::Path) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "query": outcome.query,
        "refined_query": outcome.refined_query,
        "results": outcome.results.len(),
        "filtered": outcome.filtered,
        "scraped": outcome.documents.len(),
        "report": path.display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::ConsoleTarget;

    #[test]
    fn test_json_runs_keep_streamed_summary_off_stdout() {
        assert_eq!(summary_sink(OutputFormat::Json).target(), ConsoleTarget::Stderr);
        assert_eq!(summary_sink(OutputFormat::Table).target(), ConsoleTarget::Stdout);
        assert_eq!(summary_sink(OutputFormat::Plain).target(), ConsoleTarget::Stdout);
    }
}
