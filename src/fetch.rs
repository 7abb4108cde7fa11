use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::api_types::ApiAnalysis;
use crate::models::Record;

const ANALYSIS_COLUMNS: &str = "id,transcript_id,summary,positive_feedback,negative_feedback,created_at";

/// `{base}/rest/v1/analyses?select=..&order=created_at.desc`
pub fn analyses_url(base: &Url) -> Result<Url> {
    let mut url = base
        .join("rest/v1/analyses")
        .with_context(|| format!("Building analyses URL from {}", base))?;
    url.query_pairs_mut()
        .append_pair("select", ANALYSIS_COLUMNS)
        .append_pair("order", "created_at.desc");
    Ok(url)
}

/// Read every stored analysis from a remote REST store, newest first.
pub async fn fetch_analyses(client: &Client, base: &Url, api_key: Option<&str>) -> Result<Vec<Record>> {
    let url = analyses_url(base)?;
    let start = std::time::Instant::now();
    debug!("Fetching analyses - url={}", url);

    let mut req = client.get(url.clone());
    if let Some(key) = api_key {
        req = req.header("apikey", key).bearer_auth(key);
    }
    let resp = req
        .send()
        .await
        .with_context(|| format!("Request failed for {}", url))?;

    let resp = resp
        .error_for_status()
        .with_context(|| format!("HTTP error for {}", url))?;

    let rows: Vec<Value> = resp
        .json()
        .await
        .with_context(|| format!("Decoding JSON for {}", url))?;

    let records = records_from_rows(rows);

    info!(
        "Analyses fetch completed - duration={:.2}s, analyses={}",
        start.elapsed().as_secs_f32(),
        records.len()
    );
    Ok(records)
}

/// Decode rows one at a time; a row that doesn't fit `ApiAnalysis` is logged
/// and skipped.
pub fn records_from_rows(rows: Vec<Value>) -> Vec<Record> {
    let total = rows.len();
    let records: Vec<Record> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(i, row)| match serde_json::from_value::<ApiAnalysis>(row) {
            Ok(api) => Some(api.into_record()),
            Err(e) => {
                warn!("Malformed analysis row skipped - index={}, error={}", i, e);
                None
            }
        })
        .collect();
    if records.len() < total {
        warn!("Analyses decoded - kept={}, skipped={}", records.len(), total - records.len());
    }
    records
}
