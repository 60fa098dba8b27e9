//! Durable, traversal-proof storage of web clips.
//!
//! Layout: `<root>/<subdir>/<YYYY-MM-DD>/<title>[_vN]/<title>.md`, plus an
//! `assets/` directory when the clip carries files.

mod error;
mod locks;
mod observer;
mod sanitizer;
mod writer;

pub use error::{ErrorKind, VaultError, VaultResult};
pub use observer::{SaveObserver, TracingObserver};
pub use sanitizer::{Sanitizer, MAX_FILENAME_LEN, MAX_TITLE_LEN};
pub use writer::{VaultWriter, ASSETS_DIR, MAX_VERSIONS, STAGING_SUFFIX};

#[cfg(test)]
pub(crate) use sanitizer::{is_illegal, TRAVERSAL_PATTERNS};
#[cfg(test)]
pub(crate) use locks::TargetLocks;
#[cfg(test)]
pub(crate) use writer::resolve_date;

use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct SaveRequest {
    pub title: String,
    pub saved_at: String,
    pub tags: Vec<String>,
    /// Already rendered; written byte for byte.
    pub markdown: String,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Default)]
pub struct Asset {
    pub filename: String,
    /// Base64 (standard alphabet, padded).
    pub payload: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub saved_path: PathBuf,
    pub article_dir: String,
    pub assets_count: usize,
}
