//! Word cloud rendering contract: how ranked terms become sized, rotated,
//! clickable words, and what a hover must do to them. Actual placement and
//! drawing belong to a backend (`layout` for SVG, `RetainedCloud` in memory).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::aggregate::RankedTerm;
use crate::models::Polarity;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontScale {
    pub min: f32,
    pub max: f32,
}

impl Default for FontScale {
    fn default() -> Self {
        Self { min: 14.0, max: 64.0 }
    }
}

impl FontScale {
    /// Linear in count between the corpus' own min and max counts; a flat
    /// distribution gets the midpoint.
    pub fn size_for(&self, count: u32, min_count: u32, max_count: u32) -> u32 {
        if max_count <= min_count {
            return ((self.min + self.max) / 2.0).round() as u32;
        }
        let t = (count.clamp(min_count, max_count) - min_count) as f32 / (max_count - min_count) as f32;
        (self.min + t * (self.max - self.min)).round() as u32
    }
}

/// Fixed rotation pattern so repeated renders look the same.
pub fn rotation_for(index: usize) -> i32 {
    if index % 6 == 0 {
        -45
    } else if index % 3 == 0 {
        0
    } else {
        -15
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Palette {
    pub positive: String,
    pub positive_hover: String,
    pub negative: String,
    pub negative_hover: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            positive: "#4ade80".into(),
            positive_hover: "#15803d".into(),
            negative: "#f87171".into(),
            negative_hover: "#b91c1c".into(),
        }
    }
}

impl Palette {
    pub fn fill(&self, polarity: Polarity) -> &str {
        match polarity {
            Polarity::Positive => &self.positive,
            Polarity::Negative => &self.negative,
        }
    }

    pub fn hover(&self, polarity: Polarity) -> &str {
        match polarity {
            Polarity::Positive => &self.positive_hover,
            Polarity::Negative => &self.negative_hover,
        }
    }
}

/// What a pointer-over does to a word. Reverted completely on pointer-exit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverEffect {
    pub scale: f32,
    pub duration_ms: u32,
    pub shadow: String,
}

impl Default for HoverEffect {
    fn default() -> Self {
        Self {
            scale: 1.4,
            duration_ms: 200,
            shadow: "drop-shadow(2px 4px 6px rgba(0,0,0,0.15))".into(),
        }
    }
}

impl HoverEffect {
    pub fn transition(&self) -> String {
        format!("all {}ms ease", self.duration_ms)
    }

    /// `transform` with any existing `scale(..)` replaced by the hover scale.
    pub fn scaled_transform(&self, transform: &str) -> String {
        static SCALE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*scale\([^)]*\)").unwrap());
        let base = SCALE.replace_all(transform, "");
        let base = base.trim();
        if base.is_empty() {
            format!("scale({})", self.scale)
        } else {
            format!("{} scale({})", base, self.scale)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloudWord {
    pub text: String,
    pub count: u32,
    pub size: u32,
    pub rotate: i32,
    pub fill: String,
    pub hover_fill: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordCloud {
    pub polarity: Polarity,
    pub words: Vec<CloudWord>,
}

impl WordCloud {
    pub fn new(ranked: &[RankedTerm], polarity: Polarity, palette: &Palette, font: &FontScale) -> Self {
        let min = ranked.iter().map(|r| r.count).min().unwrap_or(0);
        let max = ranked.iter().map(|r| r.count).max().unwrap_or(0);
        let words = ranked
            .iter()
            .enumerate()
            .map(|(i, r)| CloudWord {
                text: r.term.clone(),
                count: r.count,
                size: font.size_for(r.count, min, max),
                rotate: rotation_for(i),
                fill: palette.fill(polarity).to_string(),
                hover_fill: palette.hover(polarity).to_string(),
            })
            .collect();
        Self { polarity, words }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Hand the clicked word's literal text to `on_click`. Toggle semantics are
    /// the caller's business. Returns false for an index with no word.
    pub fn click<F: FnOnce(&str, Polarity)>(&self, index: usize, on_click: F) -> bool {
        match self.words.get(index) {
            Some(w) => {
                on_click(&w.text, self.polarity);
                true
            }
            None => false,
        }
    }

    pub fn position(&self, term: &str) -> Option<usize> {
        self.words.iter().position(|w| w.text == term)
    }
}

/// Backend-side hover hooks. The cloud only says which term; the backend owns
/// the mutation of whatever it draws.
pub trait HoverBackend {
    fn on_hover_enter(&mut self, term: &str);
    fn on_hover_exit(&mut self, term: &str);
}

#[derive(Debug, Clone, PartialEq)]
struct Saved {
    transform: String,
    transition: Option<String>,
}

/// Visual state of one drawn word.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub text: String,
    pub transform: String,
    pub fill: String,
    pub transition: Option<String>,
    pub filter: Option<String>,
    pub cursor: Option<&'static str>,
    base_fill: String,
    hover_fill: String,
    saved: Option<Saved>,
}

/// In-memory retained-mode backend: a list of elements plus a paint order
/// (last painted is on top).
#[derive(Debug, Clone)]
pub struct RetainedCloud {
    elements: Vec<Element>,
    stack: Vec<usize>,
    // paint order from before the current run of overlapping hovers
    base_stack: Option<Vec<usize>>,
    hover: HoverEffect,
}

impl RetainedCloud {
    /// `transforms[i]` is the initial transform for `cloud.words[i]`; missing
    /// entries fall back to a bare rotation.
    pub fn new(cloud: &WordCloud, transforms: &[String], hover: HoverEffect) -> Self {
        let elements: Vec<Element> = cloud
            .words
            .iter()
            .enumerate()
            .map(|(i, w)| Element {
                text: w.text.clone(),
                transform: transforms
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("rotate({})", w.rotate)),
                fill: w.fill.clone(),
                transition: None,
                filter: None,
                cursor: None,
                base_fill: w.fill.clone(),
                hover_fill: w.hover_fill.clone(),
                saved: None,
            })
            .collect();
        let stack = (0..elements.len()).collect();
        Self {
            elements,
            stack,
            base_stack: None,
            hover,
        }
    }

    pub fn element(&self, term: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.text == term)
    }

    /// Terms in paint order, bottom first.
    pub fn paint_order(&self) -> Vec<&str> {
        self.stack.iter().map(|&i| self.elements[i].text.as_str()).collect()
    }

    fn index_of(&self, term: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.text == term)
    }

    /// Unhovered elements return to their original relative order, below the
    /// still-hovered ones, which keep their current order on top.
    fn restack(&mut self) {
        let Some(base) = self.base_stack.as_ref() else {
            return;
        };
        let elements = &self.elements;
        let hovered = |i: &usize| elements[*i].saved.is_some();
        let mut stack: Vec<usize> = base.iter().copied().filter(|i| !hovered(i)).collect();
        stack.extend(self.stack.iter().copied().filter(|i| hovered(i)));
        let any_hovered = elements.iter().any(|e| e.saved.is_some());
        self.stack = stack;
        if !any_hovered {
            self.base_stack = None;
        }
    }
}

impl HoverBackend for RetainedCloud {
    fn on_hover_enter(&mut self, term: &str) {
        let Some(idx) = self.index_of(term) else {
            return;
        };
        let Some(pos) = self.stack.iter().position(|&i| i == idx) else {
            return;
        };
        if self.base_stack.is_none() {
            self.base_stack = Some(self.stack.clone());
        }
        let transition = self.hover.transition();
        let el = &mut self.elements[idx];
        if el.saved.is_none() {
            el.saved = Some(Saved {
                transform: el.transform.clone(),
                transition: el.transition.clone(),
            });
        }
        let original = el.saved.as_ref().map(|s| s.transform.as_str()).unwrap_or("");
        el.transform = self.hover.scaled_transform(original);
        el.transition = Some(transition);
        el.filter = Some(self.hover.shadow.clone());
        el.cursor = Some("pointer");
        el.fill = el.hover_fill.clone();

        self.stack.remove(pos);
        self.stack.push(idx);
    }

    fn on_hover_exit(&mut self, term: &str) {
        let Some(idx) = self.index_of(term) else {
            return;
        };
        let el = &mut self.elements[idx];
        let Some(saved) = el.saved.take() else {
            return;
        };
        el.transform = saved.transform;
        el.transition = saved.transition;
        el.filter = None;
        el.cursor = None;
        el.fill = el.base_fill.clone();

        self.restack();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ranked(pairs: &[(&str, u32)]) -> Vec<RankedTerm> {
        pairs
            .iter()
            .map(|(t, c)| RankedTerm {
                term: t.to_string(),
                count: *c,
            })
            .collect()
    }

    #[test]
    fn font_interpolates_between_bounds() {
        let f = FontScale::default();
        assert_eq!(f.size_for(1, 1, 11), 14);
        assert_eq!(f.size_for(11, 1, 11), 64);
        assert_eq!(f.size_for(6, 1, 11), 39);
    }

    #[test]
    fn flat_distribution_uses_midpoint() {
        let f = FontScale::default();
        assert_eq!(f.size_for(3, 3, 3), 39);
        assert_eq!(f.size_for(0, 0, 0), 39);
    }

    #[test]
    fn rotation_pattern_is_fixed() {
        let r: Vec<i32> = (0..7).map(rotation_for).collect();
        assert_eq!(r, vec![-45, -15, -15, 0, -15, -15, -45]);
    }

    #[test]
    fn cloud_words_carry_style() {
        let cloud = WordCloud::new(
            &ranked(&[("long wait", 4), ("rude", 1)]),
            Polarity::Negative,
            &Palette::default(),
            &FontScale::default(),
        );
        assert_eq!(cloud.words[0].size, 64);
        assert_eq!(cloud.words[1].size, 14);
        assert_eq!(cloud.words[1].fill, "#f87171");
        assert_eq!(cloud.words[1].hover_fill, "#b91c1c");
    }

    #[test]
    fn click_passes_literal_text() {
        let cloud = WordCloud::new(
            &ranked(&[("Fast Reply", 2)]),
            Polarity::Positive,
            &Palette::default(),
            &FontScale::default(),
        );
        let mut got = None;
        assert!(cloud.click(0, |t, p| got = Some((t.to_string(), p))));
        assert_eq!(got, Some(("Fast Reply".to_string(), Polarity::Positive)));
        assert!(!cloud.click(3, |_, _| panic!("no word there")));
    }

    #[test]
    fn scaled_transform_replaces_existing_scale() {
        let h = HoverEffect::default();
        assert_eq!(h.scaled_transform("translate(4,5) rotate(-15)"), "translate(4,5) rotate(-15) scale(1.4)");
        assert_eq!(h.scaled_transform("rotate(0) scale(2)"), "rotate(0) scale(1.4)");
        assert_eq!(h.scaled_transform(""), "scale(1.4)");
    }

    #[test]
    fn hover_round_trip_restores_everything() {
        let cloud = WordCloud::new(
            &ranked(&[("a1", 3), ("b22", 2), ("c333", 1)]),
            Polarity::Positive,
            &Palette::default(),
            &FontScale::default(),
        );
        let mut rc = RetainedCloud::new(&cloud, &[], HoverEffect::default());
        let before = rc.element("a1").cloned().unwrap();
        let order_before: Vec<String> = rc.paint_order().iter().map(|s| s.to_string()).collect();

        rc.on_hover_enter("a1");
        let hot = rc.element("a1").unwrap();
        assert_eq!(hot.transform, "rotate(-45) scale(1.4)");
        assert_eq!(hot.fill, "#15803d");
        assert_eq!(hot.transition.as_deref(), Some("all 200ms ease"));
        assert_eq!(hot.cursor, Some("pointer"));
        assert_eq!(rc.paint_order().last(), Some(&"a1"));

        // re-entering must not overwrite the remembered original
        rc.on_hover_enter("a1");
        rc.on_hover_exit("a1");
        assert_eq!(rc.element("a1"), Some(&before));
        assert_eq!(rc.paint_order(), order_before);
    }

    #[test]
    fn overlapping_hovers_restore_paint_order() {
        let cloud = WordCloud::new(
            &ranked(&[("a1", 3), ("b22", 2), ("c333", 1)]),
            Polarity::Negative,
            &Palette::default(),
            &FontScale::default(),
        );
        let mut rc = RetainedCloud::new(&cloud, &[], HoverEffect::default());
        rc.on_hover_enter("a1");
        rc.on_hover_enter("b22");
        assert_eq!(rc.paint_order(), vec!["c333", "a1", "b22"]);
        rc.on_hover_exit("a1");
        assert_eq!(rc.paint_order(), vec!["a1", "c333", "b22"]);
        rc.on_hover_exit("b22");
        assert_eq!(rc.paint_order(), vec!["a1", "b22", "c333"]);

        // exits in the other order land in the same place
        rc.on_hover_enter("c333");
        rc.on_hover_enter("a1");
        rc.on_hover_exit("a1");
        rc.on_hover_exit("c333");
        assert_eq!(rc.paint_order(), vec!["a1", "b22", "c333"]);
        assert_eq!(rc.element("c333").map(|e| e.fill.as_str()), Some("#f87171"));
    }

    #[test]
    fn hover_unknown_term_is_ignored() {
        let cloud = WordCloud::new(&[], Polarity::Positive, &Palette::default(), &FontScale::default());
        let mut rc = RetainedCloud::new(&cloud, &[], HoverEffect::default());
        rc.on_hover_enter("missing");
        rc.on_hover_exit("missing");
        assert!(rc.paint_order().is_empty());
    }
}
