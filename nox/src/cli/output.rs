//! Terminal output for CLI commands
//!
//! Lines are rendered to strings first and printed in one place, so the
//! stdout/stderr split lives here rather than in each command. Results go to
//! stdout; progress, warnings and errors go to stderr. Under `json` stdout
//! carries nothing but JSON documents.

use crate::streaming::ConsoleTarget;
use colored::Colorize;
use serde::Serialize;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Colored, aligned output for people (default)
    #[default]
    Table,
    Json,
    /// Uncolored text with ASCII markers
    Plain,
}

impl OutputFormat {
    const ALL: [OutputFormat; 3] = [OutputFormat::Table, OutputFormat::Json, OutputFormat::Plain];

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Plain => "plain",
        }
    }

    /// Where live model text is streamed. JSON mode keeps it off stdout.
    pub fn stream_target(self) -> ConsoleTarget {
        match self {
            OutputFormat::Json => ConsoleTarget::Stderr,
            OutputFormat::Table | OutputFormat::Plain => ConsoleTarget::Stdout,
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|f| f.name()).collect();
                format!("Unknown output format '{}'. Valid options: {}", s, names.join(", "))
            })
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Success,
    Error,
    Warning,
    Step,
}

impl Status {
    fn key(self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Error => "error",
            Status::Warning => "warning",
            Status::Step => "step",
        }
    }

    fn ascii_marker(self) -> &'static str {
        match self {
            Status::Success => "[OK]",
            Status::Error => "[ERROR]",
            Status::Warning => "[WARN]",
            Status::Step => "-",
        }
    }

    fn colored_marker(self) -> String {
        match self {
            Status::Success => "✓".green().to_string(),
            Status::Error => "✗".red().to_string(),
            Status::Warning => "⚠".yellow().to_string(),
            Status::Step => "🔹".cyan().to_string(),
        }
    }

    fn on_stderr(self) -> bool {
        self != Status::Success
    }
}

/// Prints command output in the selected [`OutputFormat`]
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn success(&self, message: &str) {
        self.status(Status::Success, message);
    }

    pub fn error(&self, message: &str) {
        self.status(Status::Error, message);
    }

    pub fn warning(&self, message: &str) {
        self.status(Status::Warning, message);
    }

    /// Progress line
    pub fn step(&self, message: &str) {
        self.status(Status::Step, message);
    }

    /// End a streamed model reply, which arrives without a trailing newline,
    /// on the same stream it was written to.
    pub fn finish_stream(&self) {
        match self.format.stream_target() {
            ConsoleTarget::Stdout => println!(),
            ConsoleTarget::Stderr => eprintln!(),
        }
    }

    pub fn json<T: Serialize>(&self, data: &T) {
        match serde_json::to_string_pretty(data) {
            Ok(json) => println!("{}", json),
            Err(e) => self.error(&format!("Failed to serialize to JSON: {}", e)),
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        println!("{}", self.kv_line(key, value));
    }

    pub fn table_header(&self, columns: &[&str]) {
        if self.format != OutputFormat::Table {
            return;
        }
        let width: usize = columns.iter().map(|c| c.len() + 2).sum();
        let header: Vec<_> = columns.iter().map(|c| c.bold().to_string()).collect();
        println!("{}\n{}", header.join("  "), "-".repeat(width));
    }

    pub fn table_row(&self, values: &[&str]) {
        if let Some(row) = self.row_line(values) {
            println!("{}", row);
        }
    }

    pub fn section(&self, title: &str) {
        match self.format {
            OutputFormat::Json => {}
            OutputFormat::Table => println!("\n{}\n", title.bold().underline()),
            OutputFormat::Plain => println!("\n{}\n", title),
        }
    }

    pub fn list_item(&self, item: &str) {
        let bullet = match self.format {
            OutputFormat::Table => "•".cyan().to_string(),
            OutputFormat::Json | OutputFormat::Plain => "-".to_string(),
        };
        println!("  {} {}", bullet, item);
    }

    fn status(&self, status: Status, message: &str) {
        let line = self.status_line(status, message);
        if status.on_stderr() {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    fn status_line(&self, status: Status, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::json!({"status": status.key(), "message": message}).to_string()
            }
            OutputFormat::Plain => format!("{} {}", status.ascii_marker(), message),
            OutputFormat::Table => format!("{} {}", status.colored_marker(), message),
        }
    }

    fn kv_line(&self, key: &str, value: &str) -> String {
        match self.format {
            OutputFormat::Json => serde_json::json!({ key: value }).to_string(),
            OutputFormat::Table => format!("{}: {}", key.cyan(), value),
            OutputFormat::Plain => format!("{}: {}", key, value),
        }
    }

    fn row_line(&self, values: &[&str]) -> Option<String> {
        match self.format {
            OutputFormat::Json => None,
            OutputFormat::Table => Some(values.join("  ")),
            OutputFormat::Plain => Some(values.join("\t")),
        }
    }
}
