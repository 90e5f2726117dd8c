//! Streaming delivery of model output
//!
//! Tokens are accumulated by a [`StreamingBuffer`] and flushed to every
//! registered [`StreamSink`]. Sinks are fixed when the buffer is created.

pub mod buffer;

pub use buffer::{StreamingBuffer, DEFAULT_BUFFER_LIMIT};

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/// Receiver of flushed text
pub trait StreamSink: Send + Sync {
    fn emit(&self, text: &str);
}

impl<F> StreamSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn emit(&self, text: &str) {
        self(text)
    }
}

pub type SharedSink = Arc<dyn StreamSink>;

/// Terminal stream a [`ConsoleSink`] writes to
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    /// Keeps stdout clean for machine-readable output
    Stderr,
}

/// Writes flushed text to the terminal as it arrives
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink {
    target: ConsoleTarget,
}

impl ConsoleSink {
    pub fn new(target: ConsoleTarget) -> Self {
        Self { target }
    }

    pub fn stdout() -> Self {
        Self::new(ConsoleTarget::Stdout)
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }
}

impl StreamSink for ConsoleSink {
    fn emit(&self, text: &str) {
        match self.target {
            ConsoleTarget::Stdout => write_through(std::io::stdout().lock(), text),
            ConsoleTarget::Stderr => write_through(std::io::stderr().lock(), text),
        }
    }
}

// A closed terminal must not abort generation.
fn write_through(mut out: impl Write, text: &str) {
    let _ = out.write_all(text.as_bytes());
    let _ = out.flush();
}

/// Records every flush; used by UI-style consumers and tests
#[derive(Debug, Default)]
pub struct CollectingSink {
    flushes: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each flush, in order.
    pub fn flushes(&self) -> Vec<String> {
        self.flushes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// All flushed text concatenated.
    pub fn text(&self) -> String {
        self.flushes().concat()
    }
}

impl StreamSink for CollectingSink {
    fn emit(&self, text: &str) {
        self.flushes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
    }
}
