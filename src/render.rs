// src/render.rs
use chrono_tz::Tz;

use crate::aggregate::RankedTerm;
use crate::highlight::highlight;
use crate::models::{Polarity, Record};
use crate::selection::{ResultsView, SelectedTerm};

pub fn render_totals(view: &ResultsView) -> String {
    let agg = view.aggregate();
    format!(
        "**Totals:** {} analyses · {} positive phrases · {} negative phrases\n",
        agg.analyses, agg.total_positive_phrases, agg.total_negative_phrases
    )
}

pub fn render_cloud_list(heading: &str, ranked: &[RankedTerm]) -> String {
    let mut out = String::new();
    out.push_str(&format!("## {}\n", heading));
    out.push_str(&format!("{} unique words\n\n", ranked.len()));
    if ranked.is_empty() {
        out.push_str("No words to display.\n");
        return out;
    }
    for r in ranked {
        out.push_str(&format!("- {} ({})\n", r.term, r.count));
    }
    out
}

fn record_meta(r: &Record, tz: &Tz) -> String {
    let mut parts = Vec::new();
    if let Some(t) = r.transcript_id {
        parts.push(format!("Transcript {}", t));
    }
    if let Some(at) = r.created_at {
        parts.push(at.with_timezone(tz).format("%Y-%m-%d %H:%M:%S %Z").to_string());
    }
    parts.join(" · ")
}

fn render_phrases(md: &mut String, label: &str, phrases: &[String], term: &str) {
    md.push_str(&format!("**{}**\n", label));
    if phrases.is_empty() {
        md.push_str("- None\n");
        return;
    }
    for p in phrases {
        md.push_str(&format!("- {}\n", highlight(p, term).to_markdown()));
    }
}

pub fn render_record(r: &Record, selected: &SelectedTerm, expanded: bool, tz: &Tz) -> String {
    let mut md = String::new();
    md.push_str(&format!(
        "### Analysis #{} [{}]\n",
        r.id,
        if expanded { "Collapse" } else { "Expand" }
    ));
    let meta = record_meta(r, tz);
    if !meta.is_empty() {
        md.push_str(&format!("_{}_\n", meta));
    }
    if !expanded {
        return md;
    }

    md.push_str("\n**Summary**\n");
    match r.summary.as_deref() {
        Some(s) if !s.trim().is_empty() => md.push_str(&format!("{}\n\n", s.trim())),
        _ => md.push_str("_No summary_\n\n"),
    }
    render_phrases(&mut md, "Positive phrases", r.phrases(Polarity::Positive), &selected.term);
    md.push('\n');
    render_phrases(&mut md, "Negative phrases", r.phrases(Polarity::Negative), &selected.term);
    md
}

pub fn render_selection(view: &ResultsView, tz: &Tz) -> String {
    let Some(sel) = view.selection().active() else {
        return "Click a word in either cloud to see matching analyses here.\n".to_string();
    };
    let matching = view.matching();
    let mut md = String::new();
    md.push_str(&format!(
        "## Analyses containing \"{}\" ({})\n",
        sel.term, sel.polarity
    ));
    md.push_str(&format!("{} analyses matched\n\n", matching.len()));
    if matching.is_empty() {
        md.push_str("No analyses contain that phrase.\n");
        return md;
    }
    for r in matching {
        md.push_str(&render_record(r, sel, view.expansion().is_expanded(r.id), tz));
        md.push('\n');
    }
    md
}

pub fn render_results_markdown(view: &ResultsView, tz: &Tz) -> String {
    let agg = view.aggregate();
    let mut md = String::new();
    md.push_str("# Feedback Word Clouds\n\n");
    md.push_str(&format!(
        "Aggregated from {} analyses — {} positive phrases, {} negative phrases\n\n",
        agg.analyses, agg.total_positive_phrases, agg.total_negative_phrases
    ));
    md.push_str(&render_totals(view));
    md.push('\n');
    md.push_str(&render_cloud_list("Positive", &agg.positive_ranked));
    md.push('\n');
    md.push_str(&render_cloud_list("Negative", &agg.negative_ranked));
    md.push('\n');
    md.push_str(&render_selection(view, tz));
    md
}
