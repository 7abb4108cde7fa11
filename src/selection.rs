use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::aggregate::{aggregate_with, Aggregate, AggregateParams};
use crate::highlight::contains_ci;
use crate::models::{Polarity, Record};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedTerm {
    pub term: String,
    pub polarity: Polarity,
}

/// The clicked cloud term, if any. Clicking the active term again clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    active: Option<SelectedTerm>,
}

impl Selection {
    pub fn active(&self) -> Option<&SelectedTerm> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn toggle(&mut self, term: &str, polarity: Polarity) -> Option<&SelectedTerm> {
        let same = self
            .active
            .as_ref()
            .is_some_and(|s| s.term == term && s.polarity == polarity);
        self.active = if same {
            None
        } else {
            Some(SelectedTerm {
                term: term.to_string(),
                polarity,
            })
        };
        self.active.as_ref()
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

/// Records whose `polarity` phrases contain `term`, case-insensitively, in
/// corpus order.
pub fn filter_by_term<'a>(records: &'a [Record], term: &str, polarity: Polarity) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|r| r.phrases(polarity).iter().any(|p| contains_ci(p, term)))
        .collect()
}

/// Which matched records are shown in full. Absent means collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashMap<i64, bool>,
}

impl ExpansionState {
    pub fn is_expanded(&self, id: i64) -> bool {
        self.expanded.get(&id).copied().unwrap_or(false)
    }

    /// Flip one record and return its new state.
    pub fn toggle(&mut self, id: i64) -> bool {
        let slot = self.expanded.entry(id).or_insert(false);
        *slot = !*slot;
        *slot
    }

    pub fn set(&mut self, id: i64, expanded: bool) {
        self.expanded.insert(id, expanded);
    }
}

/// Everything one results page owns: the corpus, its clouds and the
/// interactive state. One instance per view; nothing is shared across views.
#[derive(Debug, Clone)]
pub struct ResultsView {
    records: Vec<Record>,
    params: AggregateParams,
    aggregate: Aggregate,
    selection: Selection,
    expansion: ExpansionState,
}

impl ResultsView {
    pub fn new(records: Vec<Record>, params: AggregateParams) -> Self {
        let aggregate = aggregate_with(&records, &params);
        Self {
            records,
            params,
            aggregate,
            selection: Selection::default(),
            expansion: ExpansionState::default(),
        }
    }

    /// Swap in a new corpus; clouds are rebuilt from scratch.
    pub fn set_records(&mut self, records: Vec<Record>) {
        self.aggregate = aggregate_with(&records, &self.params);
        self.records = records;
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    pub fn click(&mut self, term: &str, polarity: Polarity) -> Option<&SelectedTerm> {
        let now = self.selection.toggle(term, polarity);
        debug!("Cloud click - term={:?}, polarity={}, active={}", term, polarity, now.is_some());
        now
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn toggle_expand(&mut self, id: i64) -> bool {
        self.expansion.toggle(id)
    }

    pub fn expand_all_matching(&mut self) {
        let ids: Vec<i64> = self.matching().iter().map(|r| r.id).collect();
        for id in ids {
            self.expansion.set(id, true);
        }
    }

    /// Recomputed on every call from the corpus and the current selection.
    pub fn matching(&self) -> Vec<&Record> {
        match self.selection.active() {
            Some(s) => filter_by_term(&self.records, &s.term, s.polarity),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rec(id: i64, pos: &[&str], neg: &[&str]) -> Record {
        Record {
            id,
            transcript_id: Some(id * 10),
            summary: Some(format!("summary {id}")),
            positive_phrases: pos.iter().map(|s| s.to_string()).collect(),
            negative_phrases: neg.iter().map(|s| s.to_string()).collect(),
            created_at: None,
        }
    }

    fn corpus() -> Vec<Record> {
        vec![
            rec(1, &["Great service", "fast response"], &["long wait"]),
            rec(2, &["friendly"], &["not great at all", "long hold"]),
            rec(3, &[], &[]),
        ]
    }

    fn ids(rs: &[&Record]) -> Vec<i64> {
        rs.iter().map(|r| r.id).collect()
    }

    #[test]
    fn filter_respects_polarity() {
        let c = corpus();
        assert_eq!(ids(&filter_by_term(&c, "great", Polarity::Positive)), vec![1]);
        assert_eq!(ids(&filter_by_term(&c, "great", Polarity::Negative)), vec![2]);
        assert_eq!(ids(&filter_by_term(&c, "LONG", Polarity::Negative)), vec![1, 2]);
        assert!(filter_by_term(&c, "refund", Polarity::Positive).is_empty());
    }

    #[test]
    fn filter_result_is_exact_partition() {
        let c = corpus();
        for term in ["great", "wait", "o", "friendly", "zzz", ""] {
            for pol in [Polarity::Positive, Polarity::Negative] {
                let hit = ids(&filter_by_term(&c, term, pol));
                for r in &c {
                    let has = r
                        .phrases(pol)
                        .iter()
                        .any(|p| p.to_lowercase().contains(&term.to_lowercase()));
                    assert_eq!(hit.contains(&r.id), has, "term={term} pol={pol} id={}", r.id);
                }
            }
        }
    }

    #[test]
    fn toggle_law() {
        let mut s = Selection::default();
        s.toggle("great", Polarity::Positive);
        assert!(s.is_active());
        s.toggle("great", Polarity::Positive);
        assert_eq!(s.active(), None);
    }

    #[test]
    fn switching_terms_stays_active() {
        let mut s = Selection::default();
        s.toggle("great", Polarity::Positive);
        let now = s.toggle("great", Polarity::Negative).cloned();
        assert_eq!(
            now,
            Some(SelectedTerm {
                term: "great".into(),
                polarity: Polarity::Negative
            })
        );
        s.toggle("wait", Polarity::Negative);
        assert_eq!(s.active().map(|a| a.term.as_str()), Some("wait"));
    }

    #[test]
    fn expansion_defaults_collapsed() {
        let mut e = ExpansionState::default();
        assert!(!e.is_expanded(5));
        assert!(e.toggle(5));
        assert!(e.is_expanded(5));
        assert!(!e.toggle(5));
        assert!(!e.is_expanded(99));
    }

    #[test]
    fn view_follows_selection() {
        let mut v = ResultsView::new(corpus(), AggregateParams::default());
        assert!(v.matching().is_empty());
        v.click("great", Polarity::Positive);
        assert_eq!(ids(&v.matching()), vec![1]);
        v.click("long", Polarity::Negative);
        assert_eq!(ids(&v.matching()), vec![1, 2]);
        v.click("long", Polarity::Negative);
        assert!(v.matching().is_empty());
    }

    #[test]
    fn view_rebuilds_on_new_corpus() {
        let mut v = ResultsView::new(Vec::new(), AggregateParams::default());
        assert!(v.aggregate().positive_ranked.is_empty());
        v.set_records(corpus());
        assert_eq!(v.aggregate().analyses, 3);
        assert!(v
            .aggregate()
            .positive_ranked
            .iter()
            .any(|t| t.term == "great service"));
    }

    #[test]
    fn expand_all_only_touches_matches() {
        let mut v = ResultsView::new(corpus(), AggregateParams::default());
        v.click("friendly", Polarity::Positive);
        v.expand_all_matching();
        assert!(v.expansion().is_expanded(2));
        assert!(!v.expansion().is_expanded(1));
    }
}
