use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// `<output>.md` when a name is given, else a timestamped file name.
pub fn report_file_name(output: Option<&str>, now: DateTime<Local>) -> String {
    match output.map(str::trim).filter(|o| !o.is_empty()) {
        Some(name) => format!("{}.md", name),
        None => format!("summary_{}.md", now.format("%Y-%m-%d_%H-%M-%S")),
    }
}

/// Write the summary as Markdown under `dir` and return the file path.
pub fn write_markdown(dir: &Path, output: Option<&str>, summary: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(report_file_name(output, Local::now()));
    std::fs::write(&path, summary)?;
    Ok(path)
}
