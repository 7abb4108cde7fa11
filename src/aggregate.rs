use serde::Serialize;
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

use crate::models::{Polarity, Record};
use crate::tokenize::{phrase_ngrams, phrase_tokens, DEFAULT_MAX_NGRAM};

/// How many ranked terms each cloud shows by default.
pub const DEFAULT_TOP_N: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CountingMode {
    /// 1..=K word spans, counted once per phrase that contains them.
    #[default]
    Ngram,
    /// Single words, every occurrence counted.
    Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateParams {
    pub max_ngram: usize,
    pub top_n: usize,
    pub mode: CountingMode,
}

impl Default for AggregateParams {
    fn default() -> Self {
        Self {
            max_ngram: DEFAULT_MAX_NGRAM,
            top_n: DEFAULT_TOP_N,
            mode: CountingMode::Ngram,
        }
    }
}

/// Term -> count, remembering the order in which terms were first seen so that
/// ranking ties stay stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyTable(IndexMap<String, u32>);

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&mut self, term: &str) {
        *self.0.entry(term.to_owned()).or_insert(0) += 1;
    }

    pub fn get(&self, term: &str) -> u32 {
        self.0.get(term).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(t, c)| (t.as_str(), *c))
    }

    /// Count every phrase of one polarity class.
    pub fn from_phrases<'a, I>(phrases: I, params: &AggregateParams) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut table = Self::new();
        for phrase in phrases {
            table.add_phrase(phrase, params);
        }
        table
    }

    pub fn add_phrase(&mut self, phrase: &str, params: &AggregateParams) {
        if phrase.trim().is_empty() {
            return;
        }
        match params.mode {
            CountingMode::Ngram => {
                let mut seen = HashSet::new();
                for ng in phrase_ngrams(phrase, params.max_ngram) {
                    if seen.insert(ng.clone()) {
                        self.bump(&ng);
                    }
                }
            }
            CountingMode::Token => {
                for t in phrase_tokens(phrase) {
                    self.bump(&t);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedTerm {
    pub term: String,
    pub count: u32,
}

/// Top `n` entries by count, descending; ties keep discovery order.
pub fn rank_top_n(table: &FrequencyTable, n: usize) -> Vec<RankedTerm> {
    let mut v: Vec<RankedTerm> = table
        .iter()
        .map(|(term, count)| RankedTerm {
            term: term.to_string(),
            count,
        })
        .collect();
    v.sort_by_key(|r| std::cmp::Reverse(r.count));
    v.truncate(n);
    v
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub analyses: usize,
    pub positive_ranked: Vec<RankedTerm>,
    pub negative_ranked: Vec<RankedTerm>,
    pub total_positive_phrases: usize,
    pub total_negative_phrases: usize,
}

impl Aggregate {
    pub fn ranked(&self, polarity: Polarity) -> &[RankedTerm] {
        match polarity {
            Polarity::Positive => &self.positive_ranked,
            Polarity::Negative => &self.negative_ranked,
        }
    }
}

/// Both clouds for a corpus with the reference counting mode.
pub fn aggregate(records: &[Record], max_ngram: usize, top_n: usize) -> Aggregate {
    aggregate_with(
        records,
        &AggregateParams {
            max_ngram,
            top_n,
            mode: CountingMode::Ngram,
        },
    )
}

pub fn aggregate_with(records: &[Record], params: &AggregateParams) -> Aggregate {
    let pos = polarity_table(records, Polarity::Positive, params);
    let neg = polarity_table(records, Polarity::Negative, params);

    let total_positive_phrases = records.iter().map(|r| r.positive_phrases.len()).sum();
    let total_negative_phrases = records.iter().map(|r| r.negative_phrases.len()).sum();

    debug!(
        "Aggregated - analyses={}, positive_terms={}, negative_terms={}, mode={:?}",
        records.len(),
        pos.len(),
        neg.len(),
        params.mode
    );

    Aggregate {
        analyses: records.len(),
        positive_ranked: rank_top_n(&pos, params.top_n),
        negative_ranked: rank_top_n(&neg, params.top_n),
        total_positive_phrases,
        total_negative_phrases,
    }
}

pub fn polarity_table(records: &[Record], polarity: Polarity, params: &AggregateParams) -> FrequencyTable {
    FrequencyTable::from_phrases(
        records
            .iter()
            .flat_map(|r| r.phrases(polarity).iter().map(String::as_str)),
        params,
    )
}
