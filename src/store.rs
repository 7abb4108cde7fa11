use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::{Record, Summary, Transcript};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDoc {
    #[serde(default)]
    transcripts: Vec<Transcript>,
    #[serde(default)]
    analyses: Vec<Record>,
}

/// Local record store: one JSON document, rewritten atomically on every insert.
/// Ids start at 1 and only grow.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    doc: StoreDoc,
}

impl JsonStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let doc = if path.exists() {
            let bytes = fs::read(&path).with_context(|| format!("read store {:?}", path))?;
            serde_json::from_slice(&bytes).with_context(|| format!("decode store {:?}", path))?
        } else {
            StoreDoc::default()
        };
        debug!(
            "Store opened - path={}, transcripts={}, analyses={}",
            path.display(),
            doc.transcripts.len(),
            doc.analyses.len()
        );
        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn find_transcript_by_hash(&self, content_hash: &str) -> Option<&Transcript> {
        self.doc.transcripts.iter().find(|t| t.content_hash == content_hash)
    }

    pub fn insert_transcript(
        &mut self,
        file_name: &str,
        file_path: Option<String>,
        content_hash: &str,
    ) -> Result<i64> {
        let id = self.doc.transcripts.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        self.doc.transcripts.push(Transcript {
            id,
            file_name: file_name.to_string(),
            file_path,
            content_hash: content_hash.to_string(),
            created_at: Utc::now(),
        });
        self.save()?;
        Ok(id)
    }

    pub fn insert_analysis(&mut self, transcript_id: Option<i64>, summary: Summary) -> Result<i64> {
        self.insert_analysis_at(transcript_id, summary, Utc::now())
    }

    pub fn insert_analysis_at(
        &mut self,
        transcript_id: Option<i64>,
        summary: Summary,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        let id = self.doc.analyses.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        self.doc.analyses.push(Record {
            id,
            transcript_id,
            summary: Some(summary.summary),
            positive_phrases: summary.positive_feedback,
            negative_phrases: summary.negative_feedback,
            created_at: Some(created_at),
        });
        self.save()?;
        Ok(id)
    }

    /// Newest first; rows without a timestamp go last, ties by id descending.
    pub fn list_analyses(&self) -> Vec<Record> {
        let mut v = self.doc.analyses.clone();
        v.sort_by_key(|r| (r.created_at.is_none(), Reverse(r.created_at), Reverse(r.id)));
        v
    }

    fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).with_context(|| format!("create {:?}", dir))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&serde_json::to_vec_pretty(&self.doc)?)?;
        tmp.persist(&self.path)
            .with_context(|| format!("persist store {:?}", self.path))?;
        Ok(())
    }
}
