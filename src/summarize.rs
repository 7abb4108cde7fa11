use anyhow::{anyhow, Result};
use awful_aj::{api::ask, config::AwfulJadeConfig, template::ChatTemplate};
use tracing::{debug, info};

use crate::api_types::parse_summary_response;
use crate::budget::{approx_tokens, cap_text};
use crate::models::Summary;
use crate::prompts::user_transcript_summary;

/// Transcripts are cut to this many (approx) tokens before prompting.
pub const MAX_TRANSCRIPT_TOKENS: usize = 12_000;

const OFFLINE_SUMMARY_CHARS: usize = 280;
const POSITIVE_KEYWORDS: &[&str] = &["good", "great", "helpful", "excellent", "fast", "friendly"];
const NEGATIVE_KEYWORDS: &[&str] = &["bad", "slow", "unhelpful", "rude", "long", "wait"];

pub async fn llm_call(cfg: &AwfulJadeConfig, tpl: &ChatTemplate, user: &str) -> Result<String> {
    let start = std::time::Instant::now();

    debug!("LLM call starting - prompt_length={} chars", user.len());

    // Map Box<dyn StdError> -> anyhow::Error *before* `?`
    let answer = ask(cfg, user.to_string(), tpl, None, None, false)
        .await
        .map_err(|e| anyhow!(e.to_string()))?;

    info!(
        "LLM API call completed - duration={:.2}s, response_length={} chars",
        start.elapsed().as_secs_f32(),
        answer.len()
    );

    Ok(answer)
}

/// Where summaries come from: a configured LLM endpoint, or the built-in
/// keyword extractor when none is configured.
pub enum Summarizer {
    Remote {
        cfg: AwfulJadeConfig,
        tpl: ChatTemplate,
    },
    Offline,
}

impl Summarizer {
    pub fn is_remote(&self) -> bool {
        matches!(self, Summarizer::Remote { .. })
    }

    pub async fn summarize(&self, text: &str) -> Result<Summary> {
        match self {
            Summarizer::Remote { cfg, tpl } => {
                let capped = cap_text(text, MAX_TRANSCRIPT_TOKENS);
                if capped.len() < text.len() {
                    debug!(
                        "Transcript capped - tokens={} -> {}",
                        approx_tokens(text),
                        approx_tokens(capped)
                    );
                }
                let answer = llm_call(cfg, tpl, &user_transcript_summary(capped)).await?;
                parse_summary_response(&answer)
            }
            Summarizer::Offline => Ok(offline_summary(text)),
        }
    }
}

/// Keyword-spotting stand-in for the LLM: a leading excerpt as summary and any
/// known sentiment keywords found in the text.
pub fn offline_summary(text: &str) -> Summary {
    let trimmed = text.trim();
    let summary = if trimmed.is_empty() {
        "No text provided".to_string()
    } else {
        trimmed.chars().take(OFFLINE_SUMMARY_CHARS).collect()
    };

    let lower = text.to_lowercase();
    let hits = |words: &[&str]| -> Vec<String> {
        words
            .iter()
            .filter(|w| lower.contains(*w))
            .map(|w| w.to_string())
            .collect()
    };
    let mut positive_feedback = hits(POSITIVE_KEYWORDS);
    let mut negative_feedback = hits(NEGATIVE_KEYWORDS);

    if !trimmed.is_empty() {
        if positive_feedback.is_empty() {
            positive_feedback.push("service was adequate".to_string());
        }
        if negative_feedback.is_empty() {
            negative_feedback.push("no glaring issues found".to_string());
        }
    }

    Summary {
        summary,
        positive_feedback,
        negative_feedback,
    }
}
