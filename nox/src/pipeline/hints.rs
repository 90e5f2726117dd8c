//! Operator-facing hints for backend failures, keyed on error vocabulary.

const GENERIC_HINTS: [&str; 3] = [
    "Confirm the relevant API key is set in your environment or config file before launching nox.",
    "Keys copied from dashboards often include hidden spaces; \
     re-copy if authentication keeps failing.",
    "Restart nox after updating environment variables so the new values are picked up.",
];

/// Generic troubleshooting hints, with at most one provider-specific hint
/// in front when the message mentions that provider.
pub fn failure_hints(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    let mentions = |tokens: &[&str]| tokens.iter().any(|t| lower.contains(t));

    let specific = if mentions(&["anthropic", "x-api-key", "invalid api key", "authentication"]) {
        Some("Claude/Anthropic models require a valid `ANTHROPIC_API_KEY`.")
    } else if mentions(&["openrouter"]) {
        Some("OpenRouter models require `OPENROUTER_API_KEY` and a reachable OpenRouter endpoint.")
    } else if mentions(&["openai", "gpt"]) {
        Some("OpenAI models require `OPENAI_API_KEY` with access to the chosen model.")
    } else if mentions(&["google", "gemini"]) {
        Some("Google Gemini models need `GOOGLE_API_KEY`.")
    } else {
        None
    };

    specific
        .into_iter()
        .chain(GENERIC_HINTS)
        .map(String::from)
        .collect()
}
