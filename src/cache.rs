//! Memoization of resolved document structure.
//!
//! Locating the TOC, structuring it and resolving the offset are the expensive
//! steps of analysing a book and depend only on the document. Their result is
//! stored under a SHA-256 fingerprint of the document content.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::document::PageSource;
use crate::error::{Error, Result};
use crate::offset::PageOffset;
use crate::toc::TocStructure;

/// Fingerprint of a raw document file.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Fingerprint of an extracted document: page count, width and every page's text.
pub fn fingerprint_pages(source: &dyn PageSource) -> Result<String> {
    let mut hasher = Sha256::new();
    let count = source.page_count();
    hasher.update((count as u64).to_le_bytes());
    hasher.update(source.page_width().to_le_bytes());
    for index in 0..count {
        let text = source.page_text(index)?;
        hasher.update((text.len() as u64).to_le_bytes());
        hasher.update(text.as_bytes());
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Everything learned about a document before any chapter is extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStructure {
    /// Physical indices of the TOC pages
    pub toc_pages: Vec<usize>,
    /// Structured TOC
    pub structure: TocStructure,
    /// Printed-to-physical page offset
    pub offset: PageOffset,
}

/// Storage for resolved structures keyed by fingerprint.
pub trait StructureCache: Send + Sync {
    /// Cached structure for `fingerprint`, if any.
    fn get(&self, fingerprint: &str) -> Result<Option<ResolvedStructure>>;

    /// Store `resolved` under `fingerprint`, replacing any previous entry.
    fn put(&self, fingerprint: &str, resolved: &ResolvedStructure) -> Result<()>;
}

/// In-process cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, ResolvedStructure>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ResolvedStructure>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl StructureCache for MemoryCache {
    fn get(&self, fingerprint: &str) -> Result<Option<ResolvedStructure>> {
        Ok(self.lock().get(fingerprint).cloned())
    }

    fn put(&self, fingerprint: &str, resolved: &ResolvedStructure) -> Result<()> {
        self.lock().insert(fingerprint.to_string(), resolved.clone());
        Ok(())
    }
}

/// One `<fingerprint>.json` file per document in a directory.
#[derive(Debug, Clone)]
pub struct JsonDirCache {
    dir: PathBuf,
}

impl JsonDirCache {
    /// Use `dir`, creating it if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, fingerprint: &str) -> Result<PathBuf> {
        if fingerprint.is_empty() || !fingerprint.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidConfig(format!(
                "invalid cache fingerprint {:?}",
                fingerprint
            )));
        }
        Ok(self.dir.join(format!("{}.json", fingerprint)))
    }
}

impl StructureCache for JsonDirCache {
    fn get(&self, fingerprint: &str) -> Result<Option<ResolvedStructure>> {
        let path = self.path(fingerprint)?;
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&json) {
            Ok(resolved) => Ok(Some(resolved)),
            Err(e) => {
                log::warn!("Ignoring corrupt cache entry {}: {}", path.display(), e);
                Ok(None)
            },
        }
    }

    fn put(&self, fingerprint: &str, resolved: &ResolvedStructure) -> Result<()> {
        let path = self.path(fingerprint)?;
        std::fs::write(&path, serde_json::to_string_pretty(resolved)?)?;
        log::debug!("Cached structure at {}", path.display());
        Ok(())
    }
}
