use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::blob::BlobStore;
use crate::models::Summary;
use crate::store::JsonStore;
use crate::summarize::Summarizer;

const BATCH_SIZE: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Re-ingest transcripts whose content is already stored.
    pub force: bool,
}

#[derive(Debug, Clone)]
pub struct IngestedFile {
    pub file_name: String,
    pub transcript_id: i64,
    pub analysis_id: i64,
    pub summary: Summary,
}

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub ingested: Vec<IngestedFile>,
    pub duplicates: usize,
    pub failed: usize,
}

struct Pending {
    file_name: String,
    text: String,
    transcript_id: i64,
}

pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:016x}", xxh3_64(bytes))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown.txt".to_string())
}

/// Upload -> transcript row -> summarise -> analysis row, for every file.
/// A failed summary is logged and skipped; the transcript row stays.
pub async fn run_ingest(
    paths: &[PathBuf],
    store: &mut JsonStore,
    blobs: &BlobStore,
    summarizer: &Summarizer,
    opts: &IngestOptions,
) -> Result<IngestReport> {
    let pipeline_start = std::time::Instant::now();
    info!(
        "Ingest started - files={}, summarizer={}",
        paths.len(),
        if summarizer.is_remote() { "remote" } else { "offline" }
    );
    if paths.is_empty() {
        bail!("No transcript files given.");
    }

    let mut report = IngestReport::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut pending: Vec<Pending> = Vec::new();

    // 1) read, dedupe, upload, transcript rows
    for path in paths {
        let bytes = std::fs::read(path).with_context(|| format!("read transcript {:?}", path))?;
        let hash = content_hash(&bytes);
        let file_name = file_name_of(path);

        let already = store.find_transcript_by_hash(&hash).is_some();
        if !seen.insert(hash.clone()) || (already && !opts.force) {
            debug!("Duplicate transcript skipped - file={}, hash={}", file_name, hash);
            report.duplicates += 1;
            continue;
        }

        let url = blobs.put(&file_name, &bytes)?;
        let transcript_id = store.insert_transcript(&file_name, Some(url), &hash)?;
        debug!("Transcript stored - id={}, file={}", transcript_id, file_name);

        pending.push(Pending {
            file_name,
            text: String::from_utf8_lossy(&bytes).into_owned(),
            transcript_id,
        });
    }

    if report.duplicates > 0 {
        info!("Deduplication - skipped={} transcripts already stored", report.duplicates);
    }

    // 2) summarise in concurrent batches, persist analyses
    let total = pending.len();
    let mut completed = 0usize;
    for batch in pending.chunks(BATCH_SIZE) {
        let batch_start = std::time::Instant::now();
        let tasks = batch.iter().map(|p| summarizer.summarize(&p.text));
        let results = futures::future::join_all(tasks).await;

        for (p, result) in batch.iter().zip(results) {
            match result {
                Ok(summary) => {
                    let analysis_id = store.insert_analysis(Some(p.transcript_id), summary.clone())?;
                    report.ingested.push(IngestedFile {
                        file_name: p.file_name.clone(),
                        transcript_id: p.transcript_id,
                        analysis_id,
                        summary,
                    });
                }
                Err(e) => {
                    warn!("Summary failed - file={}, error={:#}", p.file_name, e);
                    report.failed += 1;
                }
            }
        }

        completed += batch.len();
        info!(
            "Summary progress: {}/{} | Batch of {}: {:.1}s",
            completed,
            total,
            batch.len(),
            batch_start.elapsed().as_secs_f32()
        );
    }

    info!(
        "Ingest completed - duration={:.2}s, ingested={}, duplicates={}, failed={}",
        pipeline_start.elapsed().as_secs_f32(),
        report.ingested.len(),
        report.duplicates,
        report.failed
    );
    Ok(report)
}
