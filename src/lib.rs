//! Phrase aggregation and word-cloud filtering over transcript feedback.
//!
//! Every stored analysis carries positive and negative feedback phrases.
//! `aggregate` turns them into two ranked term lists, and `filter_by_term`
//! finds the analyses behind a clicked term.

pub mod aggregate;
pub mod api_types;
pub mod blob;
pub mod budget;
pub mod cloud;
pub mod explore;
pub mod fetch;
pub mod highlight;
pub mod ingest;
pub mod layout;
pub mod models;
pub mod prompts;
pub mod render;
pub mod selection;
pub mod store;
pub mod summarize;
pub mod tokenize;
pub mod viz_export;

pub use aggregate::{aggregate, Aggregate, AggregateParams, CountingMode, RankedTerm};
pub use highlight::highlight;
pub use models::{Polarity, Record};
pub use selection::{filter_by_term, ResultsView};
