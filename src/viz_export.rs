// src/viz_export.rs
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::{fs, path::Path};
use tracing::debug;

use crate::aggregate::Aggregate;
use crate::cloud::{FontScale, HoverEffect, Palette, WordCloud};
use crate::layout::{layout, render_svg, CloudStyle, Layout};
use crate::models::Polarity;

/// Everything the exporters need besides the aggregate itself.
#[derive(Debug, Clone, Default)]
pub struct VizOptions {
    pub palette: Palette,
    pub font: FontScale,
    pub hover: HoverEffect,
    pub style: CloudStyle,
    pub svg: bool,
}

/* -------------------------------------------------------------------------- */
/* Entry point                                                                */
/* -------------------------------------------------------------------------- */

/// Write D3-ready cloud JSON (and optionally static SVGs) into `out_dir`.
pub fn write_all_viz(out_dir: &Path, agg: &Aggregate, opts: &VizOptions) -> Result<Vec<String>> {
    fs::create_dir_all(out_dir).with_context(|| format!("create {:?}", out_dir))?;

    let positive = WordCloud::new(&agg.positive_ranked, Polarity::Positive, &opts.palette, &opts.font);
    let negative = WordCloud::new(&agg.negative_ranked, Polarity::Negative, &opts.palette, &opts.font);

    let mut files = vec!["viz.clouds.json".to_string()];
    let clouds = build_clouds(&positive, &negative, opts);
    write_json(out_dir.join("viz.clouds.json"), &clouds)?;

    if opts.svg {
        for (cloud, name, title) in [
            (&positive, "cloud.positive.svg", "Positive"),
            (&negative, "cloud.negative.svg", "Negative"),
        ] {
            let l: Layout = layout(cloud, &opts.style);
            if !l.unplaced.is_empty() {
                debug!("{} - unplaced={} words", name, l.unplaced.len());
            }
            fs::write(out_dir.join(name), render_svg(&l, &opts.hover, title))
                .with_context(|| format!("write {}", name))?;
            files.push(name.to_string());
        }
    }

    let idx = json!({
        "version": 1,
        "counts": {
            "analyses": agg.analyses,
            "positive_phrases": agg.total_positive_phrases,
            "negative_phrases": agg.total_negative_phrases,
            "positive_terms": agg.positive_ranked.len(),
            "negative_terms": agg.negative_ranked.len(),
        },
        "files": files,
    });
    write_json(out_dir.join("viz.index.json"), &idx)?;
    files.push("viz.index.json".to_string());

    Ok(files)
}

fn write_json<P: AsRef<Path>, T: ?Sized + Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, serde_json::to_vec_pretty(value)?).with_context(|| format!("write {:?}", path))
}

/* -------------------------------------------------------------------------- */
/* Word clouds                                                                */
/* -------------------------------------------------------------------------- */

#[derive(Serialize)]
struct VCloudWord<'a> {
    text: &'a str,
    value: u32,
    size: u32,
    rotate: i32,
}

#[derive(Serialize)]
struct VCloud<'a> {
    polarity: Polarity,
    fill: &'a str,
    hover_fill: &'a str,
    words: Vec<VCloudWord<'a>>,
}

#[derive(Serialize)]
struct VClouds<'a> {
    width: u32,
    height: u32,
    padding: f32,
    hover: &'a HoverEffect,
    positive: VCloud<'a>,
    negative: VCloud<'a>,
}

fn build_clouds<'a>(pos: &'a WordCloud, neg: &'a WordCloud, opts: &'a VizOptions) -> VClouds<'a> {
    VClouds {
        width: opts.style.width,
        height: opts.style.height,
        padding: opts.style.padding,
        hover: &opts.hover,
        positive: v_cloud(pos, &opts.palette),
        negative: v_cloud(neg, &opts.palette),
    }
}

fn v_cloud<'a>(c: &'a WordCloud, palette: &'a Palette) -> VCloud<'a> {
    VCloud {
        polarity: c.polarity,
        fill: palette.fill(c.polarity),
        hover_fill: palette.hover(c.polarity),
        words: c
            .words
            .iter()
            .map(|w| VCloudWord {
                text: &w.text,
                value: w.count,
                size: w.size,
                rotate: w.rotate,
            })
            .collect(),
    }
}
