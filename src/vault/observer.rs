use super::{error::VaultError, Asset, SaveOutcome};
use std::{io, path::Path};
use tracing::{debug, error, info, warn};

/// Logging capability handed to [`super::VaultWriter`]. Every hook has a
/// no-op default so callers only implement what they care about.
pub trait SaveObserver: Send + Sync {
    fn asset_written(&self, _asset: &Asset, _bytes: usize) {}

    fn committed(&self, _outcome: &SaveOutcome) {}

    fn rejected(&self, _err: &VaultError) {}

    /// Rollback is best-effort: the caller still receives the original error,
    /// this hook is the only place a failed cleanup shows up.
    fn rollback_failed(&self, _staging: &Path, _err: &io::Error) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SaveObserver for TracingObserver {
    fn asset_written(&self, asset: &Asset, bytes: usize) {
        debug!(filename = %asset.filename, mime_type = %asset.mime_type, bytes, "asset staged");
    }

    fn committed(&self, outcome: &SaveOutcome) {
        info!(
            saved_path = %outcome.saved_path.display(),
            article_dir = %outcome.article_dir,
            assets = outcome.assets_count,
            "article committed"
        );
    }

    fn rejected(&self, err: &VaultError) {
        if err.is_security() {
            warn!(kind = err.kind.as_str(), field = ?err.field, error = %err, "security rejection");
        } else {
            error!(kind = err.kind.as_str(), field = ?err.field, error = %err, "save failed");
        }
    }

    fn rollback_failed(&self, staging: &Path, err: &io::Error) {
        error!(staging = %staging.display(), error = %err, "rollback could not remove staging directory");
    }
}
