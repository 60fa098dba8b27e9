use super::{
    error::{ErrorKind, VaultError, VaultResult},
    locks::TargetLocks,
    observer::{SaveObserver, TracingObserver},
    sanitizer::Sanitizer,
    Asset, SaveOutcome, SaveRequest,
};
use base64::Engine;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use std::{
    fs, io,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Highest version suffix tried: `title`, `title_v2`, ..., `title_v100`.
pub const MAX_VERSIONS: u32 = 100;
pub const STAGING_SUFFIX: &str = ".tmp";
pub const ASSETS_DIR: &str = "assets";

/// Writes one clip per [`VaultWriter::save`] call. The article directory is
/// filled under a `.tmp` sibling and renamed into place, so readers of the
/// vault see either the whole article or nothing.
///
/// Saves of the same title on the same date are not serialized unless
/// [`VaultWriter::serialize_saves`] is enabled: version probing is a plain
/// existence check and two concurrent writers can pick the same name. A name
/// whose `.tmp` sibling exists counts as taken.
pub struct VaultWriter {
    base: PathBuf,
    sanitizer: Sanitizer,
    observer: Arc<dyn SaveObserver>,
    locks: Option<TargetLocks>,
}

impl VaultWriter {
    pub fn new(root: impl AsRef<Path>, subdir: &str) -> Self {
        Self {
            base: root.as_ref().join(subdir),
            sanitizer: Sanitizer::default(),
            observer: Arc::new(TracingObserver),
            locks: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SaveObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Holds a per `date/title` mutex from version probing through commit.
    pub fn serialize_saves(mut self, enabled: bool) -> Self {
        self.locks = enabled.then(TargetLocks::default);
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    #[cfg(test)]
    pub(crate) fn held_lock_slots(&self) -> usize {
        self.locks.as_ref().map_or(0, TargetLocks::len)
    }

    pub fn save(&self, req: &SaveRequest) -> VaultResult<SaveOutcome> {
        let result = self.try_save(req);
        match &result {
            Ok(outcome) => self.observer.committed(outcome),
            Err(err) => self.observer.rejected(err),
        }
        result
    }

    fn try_save(&self, req: &SaveRequest) -> VaultResult<SaveOutcome> {
        // every title rejection is reported as a security failure
        let title = self.sanitizer.sanitize_title(&req.title).map_err(|e| {
            VaultError::security(format!("invalid title: {}", e.message)).with_field(&req.title)
        })?;
        let date = resolve_date(&req.saved_at).format("%Y-%m-%d").to_string();

        let slot = self.locks.as_ref().map(|l| l.acquire(&self.base.join(&date).join(&title)));
        let _guard = slot.as_ref().map(|s| s.lock());

        let (target, article_dir) = self.resolve_target(&date, &title)?;
        let staging = Staging::create(staging_path(&target), self.observer.as_ref())?;

        let assets_count = self.write_assets(staging.path(), &req.assets)?;

        let doc_name = format!("{title}.md");
        write_file(&staging.path().join(&doc_name), req.markdown.as_bytes())
            .map_err(|e| VaultError::io(ErrorKind::MarkdownWrite, "failed to write markdown file", e))?;

        staging.commit(&target)?;

        Ok(SaveOutcome { saved_path: target.join(doc_name), article_dir, assets_count })
    }

    fn resolve_target(&self, date: &str, title: &str) -> VaultResult<(PathBuf, String)> {
        let date_dir = self.sanitizer.build_safe_path(&self.base, &[date])?;
        dir_builder(true).create(&date_dir).map_err(|e| {
            VaultError::io(
                ErrorKind::DirectoryCreate,
                format_args!("failed to create date directory: {}", date_dir.display()),
                e,
            )
        })?;

        for version in 1..=MAX_VERSIONS {
            let name = if version == 1 { title.to_string() } else { format!("{title}_v{version}") };
            let candidate = self.sanitizer.build_safe_path(&self.base, &[date, &name])?;
            // a leftover staging dir from a crashed save keeps its name taken
            if is_absent(&candidate) && is_absent(&staging_path(&candidate)) {
                return Ok((candidate, name));
            }
        }
        Err(VaultError::new(
            ErrorKind::DirectoryCreate,
            format!("too many versions exist for this article (max {MAX_VERSIONS})"),
        )
        .with_field(title))
    }

    fn write_assets(&self, staging: &Path, assets: &[Asset]) -> VaultResult<usize> {
        if assets.is_empty() {
            return Ok(0);
        }
        let dir = staging.join(ASSETS_DIR);
        dir_builder(false)
            .create(&dir)
            .map_err(|e| VaultError::io(ErrorKind::DirectoryCreate, "failed to create assets directory", e))?;

        // duplicate filenames overwrite each other in list order
        for asset in assets {
            self.sanitizer.validate_asset_filename(&asset.filename)?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(asset.payload.as_bytes())
                .map_err(|_| {
                    VaultError::new(
                        ErrorKind::AssetWrite,
                        format!("failed to decode asset '{}': invalid base64 encoding", asset.filename),
                    )
                    .with_field(&asset.filename)
                })?;
            write_file(&dir.join(&asset.filename), &bytes).map_err(|e| {
                VaultError::io(
                    ErrorKind::AssetWrite,
                    format_args!("failed to write asset '{}'", asset.filename),
                    e,
                )
                .with_field(&asset.filename)
            })?;
            self.observer.asset_written(asset, bytes.len());
        }
        Ok(assets.len())
    }
}

/// Calendar date of `saved_at`, tried as RFC 3339, then `...THH:MM:SSZ`, then
/// a bare date. Anything else falls back to today so a bad timestamp never
/// blocks a save.
pub(crate) fn resolve_date(saved_at: &str) -> NaiveDate {
    if let Ok(ts) = DateTime::parse_from_rfc3339(saved_at) {
        return ts.date_naive();
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(saved_at, "%Y-%m-%dT%H:%M:%SZ") {
        return ts.date();
    }
    if let Ok(date) = NaiveDate::parse_from_str(saved_at, "%Y-%m-%d") {
        return date;
    }
    Local::now().date_naive()
}

/// Staging directory that removes itself on drop unless committed.
struct Staging<'a> {
    path: PathBuf,
    observer: &'a dyn SaveObserver,
    committed: bool,
}

impl<'a> Staging<'a> {
    fn create(path: PathBuf, observer: &'a dyn SaveObserver) -> VaultResult<Self> {
        // exclusive: a concurrent save that picked the same name fails here
        dir_builder(false).create(&path).map_err(|e| {
            VaultError::io(
                ErrorKind::DirectoryCreate,
                format_args!("failed to create directory: {}", path.display()),
                e,
            )
        })?;
        Ok(Self { path, observer, committed: false })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn commit(mut self, target: &Path) -> VaultResult<()> {
        fs::rename(&self.path, target)
            .map_err(|e| VaultError::io(ErrorKind::DirectoryCreate, "failed to finalize save", e))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Staging<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(err) = fs::remove_dir_all(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                self.observer.rollback_failed(&self.path, &err);
            }
        }
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}

fn is_absent(path: &Path) -> bool {
    matches!(fs::symlink_metadata(path), Err(e) if e.kind() == io::ErrorKind::NotFound)
}

fn dir_builder(recursive: bool) -> fs::DirBuilder {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(recursive);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder
}

fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o644);
    }
    let mut file = opts.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
