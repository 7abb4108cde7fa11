// Static SVG backend: deterministic spiral placement of a `WordCloud`.
use serde::Serialize;
use std::fmt::Write as _;

use crate::cloud::{CloudWord, HoverEffect, WordCloud};
use crate::highlight::escape_html;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CloudStyle {
    pub width: u32,
    pub height: u32,
    pub padding: f32,
}

impl Default for CloudStyle {
    fn default() -> Self {
        Self {
            width: 600,
            height: 300,
            padding: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedWord {
    pub word: CloudWord,
    /// centre of the rotated box, canvas coordinates
    pub x: f32,
    pub y: f32,
    pub box_w: f32,
    pub box_h: f32,
}

impl PlacedWord {
    pub fn transform(&self) -> String {
        format!("translate({:.1},{:.1}) rotate({})", self.x, self.y, self.word.rotate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub style: CloudStyle,
    pub placed: Vec<PlacedWord>,
    pub unplaced: Vec<String>,
}

const SPIRAL_STEPS: usize = 6000;
const SPIRAL_DT: f32 = 0.1;
const CHAR_WIDTH: f32 = 0.6; // em per glyph, rough

/// Rotated bounding box of a word's text, before padding.
fn word_box(w: &CloudWord) -> (f32, f32) {
    let tw = CHAR_WIDTH * w.size as f32 * w.text.chars().count() as f32;
    let th = w.size as f32;
    let a = (w.rotate as f32).to_radians();
    let (s, c) = (a.sin().abs(), a.cos().abs());
    (tw * c + th * s, tw * s + th * c)
}

fn overlaps(a: &PlacedWord, x: f32, y: f32, w: f32, h: f32, pad: f32) -> bool {
    (a.x - x).abs() * 2.0 < a.box_w + w + 2.0 * pad && (a.y - y).abs() * 2.0 < a.box_h + h + 2.0 * pad
}

/// Words go down in rank order, each walking an Archimedean spiral out from
/// the centre until it fits inside the canvas without touching earlier words.
pub fn layout(cloud: &WordCloud, style: &CloudStyle) -> Layout {
    let (cw, ch) = (style.width as f32, style.height as f32);
    let (cx, cy) = (cw / 2.0, ch / 2.0);
    let aspect = if ch > 0.0 { cw / ch } else { 1.0 };

    let mut placed: Vec<PlacedWord> = Vec::with_capacity(cloud.words.len());
    let mut unplaced = Vec::new();

    for w in &cloud.words {
        let (bw, bh) = word_box(w);
        let mut spot = None;
        for step in 0..SPIRAL_STEPS {
            let t = step as f32 * SPIRAL_DT;
            let x = cx + aspect * t * t.cos();
            let y = cy + t * t.sin();
            if x - bw / 2.0 < 0.0 || x + bw / 2.0 > cw || y - bh / 2.0 < 0.0 || y + bh / 2.0 > ch {
                continue;
            }
            if placed.iter().any(|p| overlaps(p, x, y, bw, bh, style.padding)) {
                continue;
            }
            spot = Some((x, y));
            break;
        }
        match spot {
            Some((x, y)) => placed.push(PlacedWord {
                word: w.clone(),
                x,
                y,
                box_w: bw,
                box_h: bh,
            }),
            None => unplaced.push(w.text.clone()),
        }
    }

    Layout {
        style: *style,
        placed,
        unplaced,
    }
}

pub fn render_svg(layout: &Layout, hover: &HoverEffect, title: &str) -> String {
    let (w, h) = (layout.style.width, layout.style.height);
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" class="wc" role="img" aria-label="{}">"#,
        escape_html(title)
    );

    let hover_fill = layout
        .placed
        .first()
        .map(|p| p.word.hover_fill.as_str())
        .unwrap_or("currentColor");
    let _ = writeln!(
        svg,
        "<style>.wc text{{cursor:pointer;transition:{t};transform-box:fill-box;transform-origin:center}} \
         .wc text:hover{{transform:scale({s});fill:{f};filter:{sh}}}</style>",
        t = hover.transition(),
        s = hover.scale,
        f = hover_fill,
        sh = hover.shadow
    );

    if layout.placed.is_empty() {
        let _ = writeln!(
            svg,
            r##"<text x="{}" y="{}" text-anchor="middle" fill="#888">No words to display.</text>"##,
            w / 2,
            h / 2
        );
    }

    for p in &layout.placed {
        let text = escape_html(&p.word.text);
        let _ = writeln!(
            svg,
            r#"<g transform="{tr}"><text text-anchor="middle" dominant-baseline="central" font-size="{size}" fill="{fill}" data-term="{text}" data-count="{count}"><title>{text} ({count})</title>{text}</text></g>"#,
            tr = p.transform(),
            size = p.word.size,
            fill = p.word.fill,
            count = p.word.count,
        );
    }
    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::RankedTerm;
    use crate::cloud::{FontScale, Palette};
    use crate::models::Polarity;

    fn cloud(n: usize) -> WordCloud {
        let ranked: Vec<RankedTerm> = (0..n)
            .map(|i| RankedTerm {
                term: format!("term{i}"),
                count: (n - i) as u32,
            })
            .collect();
        WordCloud::new(&ranked, Polarity::Positive, &Palette::default(), &FontScale::default())
    }

    #[test]
    fn layout_is_deterministic() {
        let c = cloud(25);
        let style = CloudStyle::default();
        assert_eq!(layout(&c, &style), layout(&c, &style));
    }

    #[test]
    fn placed_words_fit_and_do_not_collide() {
        let c = cloud(40);
        let style = CloudStyle::default();
        let l = layout(&c, &style);
        assert_eq!(l.placed.len() + l.unplaced.len(), 40);
        assert!(!l.placed.is_empty());
        for (i, a) in l.placed.iter().enumerate() {
            assert!(a.x - a.box_w / 2.0 >= 0.0 && a.x + a.box_w / 2.0 <= 600.0);
            assert!(a.y - a.box_h / 2.0 >= 0.0 && a.y + a.box_h / 2.0 <= 300.0);
            for b in &l.placed[i + 1..] {
                assert!(!overlaps(a, b.x, b.y, b.box_w, b.box_h, 0.0), "{} vs {}", a.word.text, b.word.text);
            }
        }
    }

    #[test]
    fn oversized_word_is_unplaced() {
        let ranked = vec![RankedTerm {
            term: "x".repeat(80),
            count: 1,
        }];
        let c = WordCloud::new(&ranked, Polarity::Negative, &Palette::default(), &FontScale::default());
        let l = layout(&c, &CloudStyle::default());
        assert!(l.placed.is_empty());
        assert_eq!(l.unplaced.len(), 1);
    }

    #[test]
    fn svg_contains_words_and_hover_css() {
        let c = cloud(3);
        let l = layout(&c, &CloudStyle::default());
        let svg = render_svg(&l, &HoverEffect::default(), "Positive");
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("data-term=\"term0\""));
        assert!(svg.contains("transition:all 200ms ease"));
        assert!(svg.contains("scale(1.4)"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn empty_svg_says_so() {
        let l = layout(&cloud(0), &CloudStyle::default());
        let svg = render_svg(&l, &HoverEffect::default(), "Negative");
        assert!(svg.contains("No words to display."));
    }
}
