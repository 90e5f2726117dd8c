use super::SharedSink;

pub const DEFAULT_BUFFER_LIMIT: usize = 60;

/// Accumulates stream chunks and flushes them to sinks.
///
/// A flush happens after a chunk containing a newline, once the buffer holds
/// at least `limit` characters, and on [`finish`](Self::finish) if anything
/// remains. Every sink sees the same text, in the same order, once per flush.
/// Taking `&mut self` keeps appends and flushes from interleaving.
pub struct StreamingBuffer {
    buffer: String,
    buffered_chars: usize,
    limit: usize,
    sinks: Vec<SharedSink>,
}

impl StreamingBuffer {
    pub fn new(limit: usize, sinks: Vec<SharedSink>) -> Self {
        Self {
            buffer: String::new(),
            buffered_chars: 0,
            limit: limit.max(1),
            sinks,
        }
    }

    pub fn push(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        self.buffer.push_str(chunk);
        self.buffered_chars += chunk.chars().count();
        if chunk.contains('\n') || self.buffered_chars >= self.limit {
            self.flush();
        }
    }

    /// End of stream: emit whatever is left.
    pub fn finish(&mut self) {
        if !self.buffer.is_empty() {
            self.flush();
        }
    }

    pub fn pending(&self) -> &str {
        &self.buffer
    }

    fn flush(&mut self) {
        for sink in &self.sinks {
            sink.emit(&self.buffer);
        }
        self.buffer.clear();
        self.buffered_chars = 0;
    }
}

impl Drop for StreamingBuffer {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::CollectingSink;
    use std::sync::Arc;

    fn buffer_with_sinks(
        limit: usize,
    ) -> (StreamingBuffer, Arc<CollectingSink>, Arc<CollectingSink>) {
        let console = Arc::new(CollectingSink::new());
        let ui = Arc::new(CollectingSink::new());
        let buffer = StreamingBuffer::new(limit, vec![console.clone(), ui.clone()]);
        (buffer, console, ui)
    }

    #[test]
    fn test_newline_and_length_triggers() {
        let long = "def".repeat(70);
        let chunks = ["ab", "c\n", long.as_str()];
        let (mut buffer, console, ui) = buffer_with_sinks(DEFAULT_BUFFER_LIMIT);

        buffer.push(chunks[0]);
        assert_eq!(buffer.pending(), "ab");
        assert!(console.flushes().is_empty());

        buffer.push(chunks[1]);
        assert_eq!(console.flushes(), vec!["abc\n"]);

        buffer.push(chunks[2]);
        buffer.finish();

        let flushes = console.flushes();
        assert_eq!(flushes.len(), 2);
        assert_eq!(flushes[1], long);
        assert_eq!(console.text(), chunks.concat());
        assert_eq!(ui.flushes(), flushes);
    }

    #[test]
    fn test_short_tail_flushed_on_finish() {
        let (mut buffer, console, _) = buffer_with_sinks(DEFAULT_BUFFER_LIMIT);
        for token in ["The", " quick", " brown", " fox"] {
            buffer.push(token);
        }
        assert!(console.flushes().is_empty());
        buffer.finish();
        assert_eq!(console.flushes(), vec!["The quick brown fox"]);

        // nothing pending: finishing again emits nothing
        buffer.finish();
        assert_eq!(console.flushes().len(), 1);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let (mut buffer, console, _) = buffer_with_sinks(4);
        buffer.push("éé");
        buffer.push("é");
        assert!(console.flushes().is_empty());
        buffer.push("é");
        assert_eq!(console.flushes(), vec!["éééé"]);
    }

    #[test]
    fn test_many_small_tokens_flush_at_limit() {
        let (mut buffer, console, _) = buffer_with_sinks(10);
        let input: String = "x".repeat(25);
        for c in input.chars() {
            buffer.push(&c.to_string());
        }
        buffer.finish();
        assert_eq!(console.flushes(), vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
        assert_eq!(console.text(), input);
    }

    #[test]
    fn test_drop_flushes_remainder() {
        let sink = Arc::new(CollectingSink::new());
        {
            let mut buffer = StreamingBuffer::new(DEFAULT_BUFFER_LIMIT, vec![sink.clone()]);
            buffer.push("partial");
        }
        assert_eq!(sink.flushes(), vec!["partial"]);
    }

    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(std::sync::Mutex::new(String::new()));
        let captured = seen.clone();
        let sink: SharedSink = Arc::new(move |text: &str| captured.lock().unwrap().push_str(text));
        let mut buffer = StreamingBuffer::new(DEFAULT_BUFFER_LIMIT, vec![sink]);
        buffer.push("line one\n");
        buffer.push("two");
        buffer.finish();
        assert_eq!(*seen.lock().unwrap(), "line one\ntwo");
    }
}
