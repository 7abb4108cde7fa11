use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use unicode_normalization::UnicodeNormalization;

use crate::models::{Record, Summary};

/// A row of the `analyses` table as it arrives over the wire. Everything except
/// `id` is optional and loosely typed; `into_record` produces the strict shape.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiAnalysis {
    pub id: i64,
    #[serde(default, alias = "transcriptId")]
    pub transcript_id: Option<Value>,
    #[serde(default)]
    pub summary: Option<Value>,
    #[serde(default, alias = "positiveFeedback", alias = "positive_phrases")]
    pub positive_feedback: Option<Value>,
    #[serde(default, alias = "negativeFeedback", alias = "negative_phrases")]
    pub negative_feedback: Option<Value>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<Value>,
}

impl ApiAnalysis {
    pub fn into_record(self) -> Record {
        let created_at = self.created_at.as_ref().and_then(|v| match v {
            Value::String(s) => {
                let parsed = parse_timestamp(s);
                if parsed.is_none() {
                    warn!("Unparsable created_at on analysis {} - value={:?}", self.id, s);
                }
                parsed
            }
            _ => None,
        });

        Record {
            id: self.id,
            transcript_id: self.transcript_id.as_ref().and_then(Value::as_i64),
            summary: self
                .summary
                .as_ref()
                .and_then(Value::as_str)
                .map(|s| s.to_string()),
            positive_phrases: phrase_list(self.positive_feedback.as_ref()),
            negative_phrases: phrase_list(self.negative_feedback.as_ref()),
            created_at,
        }
    }
}

/// JSON the LLM is asked to return. Field names drift between models, so the
/// common spellings are accepted and anything missing defaults to empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSummary {
    #[serde(default)]
    pub summary: Option<Value>,
    #[serde(default, alias = "positiveFeedback", alias = "positive_phrases", alias = "positive")]
    pub positive_feedback: Option<Value>,
    #[serde(default, alias = "negativeFeedback", alias = "negative_phrases", alias = "negative")]
    pub negative_feedback: Option<Value>,
}

impl ApiSummary {
    pub fn into_summary(self) -> Summary {
        Summary {
            summary: self
                .summary
                .as_ref()
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            positive_feedback: phrase_list(self.positive_feedback.as_ref()),
            negative_feedback: phrase_list(self.negative_feedback.as_ref()),
        }
    }
}

/// Parse an LLM answer into a `Summary`, tolerating ```json fences and chatter
/// around the object.
pub fn parse_summary_response(raw: &str) -> Result<Summary> {
    let body = extract_json_object(raw).unwrap_or(raw.trim());
    let api: ApiSummary = serde_json::from_str(body)
        .with_context(|| format!("Decoding summary JSON ({} chars)", raw.len()))?;
    Ok(api.into_summary())
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Strings only; nulls and other JSON types are dropped. A string holding a
/// JSON array (double-encoded jsonb) is unpacked.
fn phrase_list(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(normalize_phrase)
            .collect(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(inner @ Value::Array(_)) => phrase_list(Some(&inner)),
            _ if s.trim().is_empty() => Vec::new(),
            _ => vec![normalize_phrase(s)],
        },
        _ => Vec::new(),
    }
}

fn normalize_phrase(s: &str) -> String {
    s.nfc().collect::<String>()
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Postgres text form, e.g. "2025-10-18 12:30:00.123+00"
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}
