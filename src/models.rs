use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which phrase list of an analysis a term belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn as_str(self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Negative => "negative",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Polarity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "pos" | "+" => Ok(Polarity::Positive),
            "negative" | "neg" | "-" => Ok(Polarity::Negative),
            other => Err(anyhow::anyhow!("unknown polarity {:?}", other)),
        }
    }
}

/// A stored analysis of one transcript. Read-only from the aggregation side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub transcript_id: Option<i64>,
    pub summary: Option<String>,
    #[serde(rename = "positive_feedback", default)]
    pub positive_phrases: Vec<String>,
    #[serde(rename = "negative_feedback", default)]
    pub negative_phrases: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Record {
    pub fn phrases(&self, polarity: Polarity) -> &[String] {
        match polarity {
            Polarity::Positive => &self.positive_phrases,
            Polarity::Negative => &self.negative_phrases,
        }
    }
}

/// An uploaded transcript file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub id: i64,
    pub file_name: String,
    pub file_path: Option<String>,
    pub content_hash: String, // xxh3 of the raw text, hex
    pub created_at: DateTime<Utc>,
}

/// Output of the text-understanding service for one transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
    pub positive_feedback: Vec<String>,
    pub negative_feedback: Vec<String>,
}
