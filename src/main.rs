use anyhow::{anyhow, Context, Result};
use awful_aj::{config, template};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use feedback_clouds::aggregate::{AggregateParams, CountingMode, DEFAULT_TOP_N};
use feedback_clouds::blob::BlobStore;
use feedback_clouds::explore::run_explore;
use feedback_clouds::fetch::fetch_analyses;
use feedback_clouds::ingest::{run_ingest, IngestOptions};
use feedback_clouds::models::{Polarity, Record};
use feedback_clouds::render::{render_results_markdown, render_selection, render_totals};
use feedback_clouds::selection::ResultsView;
use feedback_clouds::store::JsonStore;
use feedback_clouds::summarize::Summarizer;
use feedback_clouds::tokenize::DEFAULT_MAX_NGRAM;
use feedback_clouds::viz_export::{write_all_viz, VizOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

/// Feedback word clouds - aggregate transcript feedback and drill into it
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding store.json and uploaded transcripts
    #[arg(long, env = "FEEDBACK_CLOUDS_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Remote REST store to read analyses from instead of the local store
    #[arg(long, env = "FEEDBACK_CLOUDS_STORE_URL")]
    store_url: Option<String>,

    /// API key for the remote store
    #[arg(long, env = "FEEDBACK_CLOUDS_STORE_KEY", hide_env_values = true)]
    store_key: Option<String>,

    /// Time zone used when printing timestamps (IANA name)
    #[arg(long, default_value = "UTC")]
    tz: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload, summarise and store transcript files
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Path to config file (overrides AJ_CONFIG environment variable)
        #[arg(short, long)]
        config: Option<String>,

        /// Use the built-in keyword summariser instead of an LLM
        #[arg(long)]
        offline: bool,

        /// Ingest files even if their content is already stored
        #[arg(long)]
        force: bool,
    },
    /// Write both clouds as D3-ready JSON (and optionally SVG)
    Clouds {
        #[arg(short, long, default_value = "out")]
        out: PathBuf,

        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top_n: usize,

        #[arg(long, default_value_t = DEFAULT_MAX_NGRAM)]
        max_ngram: usize,

        #[arg(long, value_enum, default_value_t = CountingMode::Ngram)]
        mode: CountingMode,

        #[arg(long)]
        svg: bool,
    },
    /// List analyses whose phrases contain a term
    Filter {
        #[arg(long)]
        term: String,

        #[arg(long, value_enum)]
        polarity: Polarity,

        /// Show every match in full
        #[arg(long)]
        expand_all: bool,
    },
    /// Print the whole results page as markdown
    Report {
        #[arg(long, requires = "polarity")]
        term: Option<String>,

        #[arg(long, value_enum, requires = "term")]
        polarity: Option<Polarity>,
    },
    /// Click through the clouds from the terminal
    Explore,
}

fn resolve_paths() -> Result<(PathBuf, PathBuf, PathBuf)> {
    // 1) Base config dir: env override, else awful_aj::config_dir()
    let base_dir = if let Ok(dir) = std::env::var("AJ_CONFIG_DIR") {
        PathBuf::from(dir)
    } else {
        awful_aj::config_dir().map_err(|e| anyhow!(e.to_string()))?
    };

    // 2) Config file: AJ_CONFIG, else <base>/config.yaml
    let cfg_path = if let Ok(p) = std::env::var("AJ_CONFIG") {
        PathBuf::from(p)
    } else {
        base_dir.join("config.yaml")
    };

    // 3) Template dir: AJ_TEMPLATE_DIR, else <base>/templates
    let tpl_dir = if let Ok(p) = std::env::var("AJ_TEMPLATE_DIR") {
        PathBuf::from(p)
    } else {
        let d = base_dir.join("templates");
        // the awful_aj template loader reads this
        std::env::set_var("AJ_TEMPLATE_DIR", &d);
        d
    };

    Ok((base_dir, cfg_path, tpl_dir))
}

async fn build_summarizer(config_arg: Option<&str>, offline: bool) -> Result<Summarizer> {
    if offline {
        info!("Summarizer - offline keyword extraction (--offline)");
        return Ok(Summarizer::Offline);
    }

    let (_base_dir, env_cfg_path, tpl_dir) = resolve_paths()?;
    let cfg_path = match config_arg {
        Some(p) => {
            debug!("Using config file from --config argument: {}", p);
            PathBuf::from(p)
        }
        None => {
            debug!("Using config file from environment/default: {}", env_cfg_path.display());
            env_cfg_path
        }
    };

    if !cfg_path.exists() {
        warn!(
            "awful_aj config not found at {} - falling back to offline summaries. \
             Use --config or AJ_CONFIG to point at one.",
            cfg_path.display()
        );
        return Ok(Summarizer::Offline);
    }

    let cfg = config::load_config(
        cfg_path
            .to_str()
            .ok_or_else(|| anyhow!("invalid config path"))?,
    )
    .map_err(|e| anyhow!(e.to_string()))?;

    let tpl_name = std::env::var("AJ_TEMPLATE_SUMMARY").unwrap_or_else(|_| "transcript_summary".to_string());
    debug!("Loading template {} from {}", tpl_name, tpl_dir.display());
    let tpl = template::load_template(&tpl_name)
        .await
        .map_err(|e| anyhow!(e.to_string()))?;

    info!("Summarizer - remote, config={}, template={}", cfg_path.display(), tpl_name);
    Ok(Summarizer::Remote { cfg, tpl })
}

fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join("store.json")
}

async fn load_records(args: &Args) -> Result<Vec<Record>> {
    match &args.store_url {
        Some(raw) => {
            let base = Url::parse(raw).with_context(|| format!("invalid store URL {}", raw))?;
            let client = reqwest::Client::new();
            fetch_analyses(&client, &base, args.store_key.as_deref()).await
        }
        None => {
            let store = JsonStore::open(store_path(&args.data_dir))?;
            let records = store.list_analyses();
            debug!("Local store - path={}, analyses={}", store.path().display(), records.len());
            Ok(records)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        // stdout carries the markdown reports
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let tz: Tz = args
        .tz
        .parse()
        .map_err(|e| anyhow!("unknown time zone {}: {}", args.tz, e))?;

    info!("Starting feedback-clouds - data_dir={}", args.data_dir.display());

    match &args.command {
        Command::Ingest {
            files,
            config,
            offline,
            force,
        } => {
            if args.store_url.is_some() {
                warn!("--store-url is read-only here; ingesting into the local store");
            }
            let summarizer = build_summarizer(config.as_deref(), *offline).await?;
            let mut store = JsonStore::open(store_path(&args.data_dir))?;
            let blobs = BlobStore::new(args.data_dir.join("uploads"), None);

            let report = run_ingest(files, &mut store, &blobs, &summarizer, &IngestOptions { force: *force }).await?;
            for f in &report.ingested {
                println!(
                    "{} -> analysis #{} ({} positive, {} negative)",
                    f.file_name,
                    f.analysis_id,
                    f.summary.positive_feedback.len(),
                    f.summary.negative_feedback.len()
                );
            }
            if report.failed > 0 {
                warn!("{} transcripts could not be summarised", report.failed);
            }
        }
        Command::Clouds {
            out,
            top_n,
            max_ngram,
            mode,
            svg,
        } => {
            let records = load_records(&args).await?;
            let params = AggregateParams {
                max_ngram: *max_ngram,
                top_n: *top_n,
                mode: *mode,
            };
            let view = ResultsView::new(records, params);
            let opts = VizOptions {
                svg: *svg,
                ..VizOptions::default()
            };
            let files = write_all_viz(out, view.aggregate(), &opts)?;
            info!("Wrote {} files to {}", files.len(), out.display());
            print!("{}", render_totals(&view));
        }
        Command::Filter {
            term,
            polarity,
            expand_all,
        } => {
            let records = load_records(&args).await?;
            let mut view = ResultsView::new(records, AggregateParams::default());
            view.click(term, *polarity);
            if *expand_all {
                view.expand_all_matching();
            }
            print!("{}", render_selection(&view, &tz));
        }
        Command::Report { term, polarity } => {
            let records = load_records(&args).await?;
            let mut view = ResultsView::new(records, AggregateParams::default());
            if let (Some(term), Some(polarity)) = (term, polarity) {
                view.click(term, *polarity);
                view.expand_all_matching();
            }
            print!("{}", render_results_markdown(&view, &tz));
        }
        Command::Explore => {
            let records = load_records(&args).await?;
            let mut view = ResultsView::new(records, AggregateParams::default());
            let stdin = std::io::stdin();
            run_explore(&mut view, &tz, stdin.lock(), std::io::stdout())?;
        }
    }

    Ok(())
}
