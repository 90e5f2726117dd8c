use regex::Regex;

/// Regex-based HTML to text reduction. Good enough for feeding a model,
/// not a general-purpose parser.
#[derive(Debug, Clone)]
pub struct HtmlCleaner {
    script: Regex,
    style: Regex,
    tag: Regex,
    whitespace: Regex,
}

impl HtmlCleaner {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            script: Regex::new(r"(?is)<script[^>]*>.*?</script>")?,
            style: Regex::new(r"(?is)<style[^>]*>.*?</style>")?,
            tag: Regex::new(r"<[^>]+>")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    pub fn to_text(&self, html: &str) -> String {
        let text = self.script.replace_all(html, " ");
        let text = self.style.replace_all(&text, " ");
        let text = self.tag.replace_all(&text, " ");
        let text = decode_entities(&text);
        self.whitespace.replace_all(&text, " ").trim().to_string()
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
