use crate::llm::{BackendError, LlmHandle};
use crate::pipeline::{Document, Reasoner, SearchResult};
use async_trait::async_trait;
use itertools::Itertools;
use std::collections::HashSet;

/// Most results kept by the filter step
pub const MAX_FILTERED: usize = 20;
const TITLE_PREVIEW_CHARS: usize = 100;

const REFINE_PROMPT: &str = "You are a cybercrime threat intelligence expert. \
Rewrite the user's query so it works well on dark web search engines. \
Use at most five words and no logical operators. \
Reply with the refined query only.";

const FILTER_PROMPT: &str = "You are a cybercrime threat intelligence expert. \
You are given a search query and a numbered list of dark web search results (title and link). \
Pick the results most relevant to the query, at most 20. \
Reply only with their numbers, comma separated, most relevant first.";

const SUMMARIZE_PROMPT: &str = "You are a cybercrime threat intelligence expert writing an \
investigation report. Using only the scraped dark web content provided, produce a Markdown \
summary with these sections: Input Query, Source Links Referenced, Investigation Artifacts \
(names, emails, crypto addresses, domains, marketplaces, threat actors, malware), Key Insights \
(3 to 5), and Next Steps (further queries to run). \
Be factual and concise; do not invent artifacts that are not in the content.";

/// Fixed-prompt implementation of the three model-backed steps
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptedReasoner;

impl PromptedReasoner {
    pub fn new() -> Self {
        Self
    }

    fn numbered_results(results: &[SearchResult]) -> String {
        results
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let title: String = r.title.chars().take(TITLE_PREVIEW_CHARS).collect();
                format!("{}. {} - {}", i + 1, title, r.link)
            })
            .join("\n")
    }
}

/// 1-based indices mentioned in `reply`, in order, deduplicated and bounded
/// by `len`. Numbers outside the range are ignored.
pub fn parse_selection(reply: &str, len: usize) -> Vec<usize> {
    let mut seen = HashSet::new();
    reply
        .split(|c: char| !c.is_ascii_digit())
        .filter_map(|token| token.parse::<usize>().ok())
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
        .filter(|idx| seen.insert(*idx))
        .take(MAX_FILTERED)
        .collect()
}

#[async_trait]
impl Reasoner for PromptedReasoner {
    async fn refine(&self, llm: &LlmHandle, query: &str) -> Result<String, BackendError> {
        let reply = llm.prompt(REFINE_PROMPT, query).await?;
        Ok(reply.trim().trim_matches('"').trim().to_string())
    }

    async fn filter(
        &self,
        llm: &LlmHandle,
        query: &str,
        results: &[SearchResult],
    ) -> Result<Vec<SearchResult>, BackendError> {
        if results.is_empty() {
            return Ok(Vec::new());
        }
        let user = format!(
            "Search query: {}\n\nSearch results:\n{}",
            query,
            Self::numbered_results(results)
        );
        let reply = llm.prompt(FILTER_PROMPT, &user).await?;
        let picked = parse_selection(&reply, results.len());
        if picked.is_empty() {
            tracing::debug!(
                "filter reply had no usable indices, keeping the first {}",
                MAX_FILTERED
            );
            return Ok(results.iter().take(MAX_FILTERED).cloned().collect());
        }
        Ok(picked.into_iter().map(|idx| results[idx].clone()).collect())
    }

    async fn summarize(
        &self,
        llm: &LlmHandle,
        query: &str,
        documents: &[Document],
    ) -> Result<String, BackendError> {
        let content = documents
            .iter()
            .map(|d| format!("Source: {}\nTitle: {}\n{}", d.link, d.title, d.content))
            .join("\n\n---\n\n");
        let user = format!("Input query: {}\n\nScraped content:\n\n{}", query, content);
        llm.prompt(SUMMARIZE_PROMPT, &user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{GenerationSettings, ScriptedTransport};
    use crate::streaming::CollectingSink;
    use std::sync::Arc;

    fn results(n: usize) -> Vec<SearchResult> {
        (1..=n)
            .map(|i| SearchResult::new(format!("result {}", i), format!("http://site{}.onion", i)))
            .collect()
    }

    fn llm(transport: Arc<ScriptedTransport>) -> LlmHandle {
        LlmHandle::new(
            "m",
            "m",
            transport,
            GenerationSettings::default(),
            vec![Arc::new(CollectingSink::new())],
        )
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("3, 1, 3, 9, 0, 2", 5), vec![2, 0, 1]);
        assert_eq!(parse_selection("none of them", 5), Vec::<usize>::new());
        let many = (1..=40).map(|n| n.to_string()).join(",");
        assert_eq!(parse_selection(&many, 40).len(), MAX_FILTERED);
    }

    #[tokio::test]
    async fn test_filter_picks_indices_from_reply() {
        let transport = Arc::new(ScriptedTransport::new("scripted").reply(&["2, ", "4"]));
        let picked = PromptedReasoner
            .filter(&llm(transport.clone()), "q", &results(5))
            .await
            .unwrap();
        assert_eq!(picked, vec![results(5)[1].clone(), results(5)[3].clone()]);

        let prompt = &transport.requests()[0].messages[1].content;
        assert!(prompt.contains("5. result 5 - http://site5.onion"));
    }

    #[tokio::test]
    async fn test_filter_falls_back_to_first_twenty() {
        let transport = Arc::new(ScriptedTransport::new("scripted").reply(&["I cannot decide."]));
        let picked = PromptedReasoner
            .filter(&llm(transport), "q", &results(30))
            .await
            .unwrap();
        assert_eq!(picked, results(20));
    }

    #[tokio::test]
    async fn test_refine_strips_quotes() {
        let transport =
            Arc::new(ScriptedTransport::new("scripted").reply(&["\"ransomware ", "leak\"\n"]));
        let refined = PromptedReasoner
            .refine(&llm(transport), "find ransomware leak sites")
            .await
            .unwrap();
        assert_eq!(refined, "ransomware leak");
    }
}
