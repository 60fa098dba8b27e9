use parking_lot::{Mutex, MutexGuard};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

/// One mutex per resolved `date/title` key, alive only while some save
/// holds or waits for it.
#[derive(Debug, Default)]
pub(crate) struct TargetLocks {
    slots: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl TargetLocks {
    pub(crate) fn acquire(&self, key: &Path) -> Slot<'_> {
        let mutex = self.slots.lock().entry(key.to_path_buf()).or_default().clone();
        Slot { locks: self, key: key.to_path_buf(), mutex }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

/// Claim on one key. Dropping the last claim evicts the key.
pub(crate) struct Slot<'a> {
    locks: &'a TargetLocks,
    key: PathBuf,
    mutex: Arc<Mutex<()>>,
}

impl Slot<'_> {
    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        self.mutex.lock()
    }
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        // new claims clone under the map lock, so the count is stable here
        let mut slots = self.locks.slots.lock();
        if Arc::strong_count(&self.mutex) == 2 {
            slots.remove(&self.key);
        }
    }
}
