use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use tracing::debug;
use url::Url;

/// Filesystem bucket for uploaded transcripts.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
    public_base: Option<Url>,
}

pub fn sanitize_name(name: &str) -> String {
    static UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9._-]").unwrap());
    UNSAFE.replace_all(name, "_").into_owned()
}

impl BlobStore {
    /// With a `public_base`, returned URLs are `<base>/<stored name>`;
    /// otherwise they are `file://` URLs into `root`.
    pub fn new(root: impl Into<PathBuf>, public_base: Option<Url>) -> Self {
        Self {
            root: root.into(),
            public_base,
        }
    }

    /// Store `bytes` under a timestamped, sanitised name and return its URL.
    pub fn put(&self, name: &str, bytes: &[u8]) -> Result<String> {
        let millis = chrono::Utc::now().timestamp_millis();
        self.put_as(&format!("{}_{}", millis, sanitize_name(name)), bytes)
    }

    fn put_as(&self, stored: &str, bytes: &[u8]) -> Result<String> {
        fs::create_dir_all(&self.root).with_context(|| format!("create {:?}", self.root))?;
        let path = self.root.join(stored);
        fs::write(&path, bytes).with_context(|| format!("write blob {:?}", path))?;
        debug!("Blob stored - path={}, bytes={}", path.display(), bytes.len());

        let url = match &self.public_base {
            Some(base) => base
                .join(stored)
                .with_context(|| format!("join {} onto {}", stored, base))?,
            None => {
                let abs = fs::canonicalize(&path).with_context(|| format!("canonicalize {:?}", path))?;
                Url::from_file_path(&abs).map_err(|_| anyhow!("not an absolute path: {:?}", abs))?
            }
        };
        Ok(url.to_string())
    }
}
