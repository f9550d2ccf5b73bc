use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::slot::SlotName;
use crate::traits::SlotStore;

/// Filesystem slot store: one file per slot inside `dir`.
///
/// Writes go to a temporary file in the same directory, which is synced and
/// then renamed over the slot file. A failed write therefore never leaves a
/// half-written blob behind, and the temporary handle is dropped (and the
/// file removed) on every error path.
#[derive(Debug, Clone)]
pub struct FsSlotStore {
    dir: PathBuf,
}

impl FsSlotStore {
    /// Open an existing data directory.
    ///
    /// A missing directory is an I/O error; use [`FsSlotStore::create`] to
    /// make one.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref();
        let meta = fs::metadata(dir).map_err(|e| StoreError::io(dir.display(), e))?;
        if !meta.is_dir() {
            return Err(StoreError::io(
                dir.display(),
                io::Error::other("data path is not a directory"),
            ));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Create the data directory (and parents) if needed, then open it.
    pub fn create(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir.display(), e))?;
        debug!(dir = %dir.display(), "data directory ready");
        Self::open(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `slot`. The name is used verbatim, with no extension.
    pub fn slot_path(&self, slot: &SlotName) -> PathBuf {
        self.dir.join(slot.as_str())
    }
}

impl SlotStore for FsSlotStore {
    fn put_raw(&self, slot: &SlotName, blob: &[u8]) -> StoreResult<()> {
        let path = self.slot_path(slot);
        let io_err = |e: io::Error| StoreError::io(format_args!("slot {slot}"), e);

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(blob).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;

        debug!(slot = %slot, bytes = blob.len(), path = %path.display(), "slot written");
        Ok(())
    }

    fn get_raw(&self, slot: &SlotName) -> StoreResult<Vec<u8>> {
        let path = self.slot_path(slot);
        match fs::read(&path) {
            Ok(blob) => {
                debug!(slot = %slot, bytes = blob.len(), "slot read");
                Ok(blob)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound { slot: slot.clone() })
            }
            Err(e) => Err(StoreError::io(format_args!("slot {slot}"), e)),
        }
    }

    fn contains(&self, slot: &SlotName) -> StoreResult<bool> {
        match fs::metadata(self.slot_path(slot)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(format_args!("slot {slot}"), e)),
        }
    }

    fn list(&self) -> StoreResult<Vec<SlotName>> {
        let dir_err = |e: io::Error| StoreError::io(self.dir.display(), e);
        let mut slots = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(dir_err)? {
            let entry = entry.map_err(dir_err)?;
            if !entry.file_type().map_err(dir_err)?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                warn!(name = ?name, "skipping non-UTF-8 file in data directory");
                continue;
            };
            // Temporary files from in-flight writes start with '.' and fail
            // validation along with any other stray file.
            if let Ok(slot) = SlotName::new(name) {
                slots.push(slot);
            }
        }
        slots.sort();
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotjar_value::{Record, Value};

    fn slot(name: &str) -> SlotName {
        SlotName::new(name).unwrap()
    }

    fn temp_store() -> (tempfile::TempDir, FsSlotStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSlotStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn put_then_get() {
        let (_dir, store) = temp_store();
        let v = Value::tuple([Value::Int(1), Value::Float(2.0), Value::from("Test")]);
        store.put(&slot("test1"), &v).unwrap();
        assert_eq!(store.get(&slot("test1")).unwrap(), v);
    }

    #[test]
    fn file_name_equals_slot_name() {
        let (dir, store) = temp_store();
        store.put(&slot("test1"), &Value::None).unwrap();
        assert!(dir.path().join("test1").is_file());
        assert_eq!(store.list().unwrap(), vec![slot("test1")]);
    }

    #[test]
    fn overwrite_keeps_latest() {
        let (_dir, store) = temp_store();
        store.put(&slot("s"), &Value::Int(1)).unwrap();
        store.put(&slot("s"), &Value::from("second")).unwrap();
        assert_eq!(store.get(&slot("s")).unwrap(), Value::from("second"));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn slots_are_isolated() {
        let (_dir, store) = temp_store();
        store.put(&slot("a"), &Value::Int(1)).unwrap();
        store.put(&slot("b"), &Value::Int(2)).unwrap();
        store.put(&slot("a"), &Value::Int(3)).unwrap();
        assert_eq!(store.get(&slot("b")).unwrap(), Value::Int(2));
    }

    #[test]
    fn missing_slot_is_not_found() {
        let (_dir, store) = temp_store();
        let err = store.get(&slot("never")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(err.slot(), Some(&slot("never")));
        assert!(!store.contains(&slot("never")).unwrap());
    }

    #[test]
    fn open_missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsSlotStore::open(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn write_after_dir_removed_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let store = FsSlotStore::create(&data).unwrap();
        fs::remove_dir(&data).unwrap();
        let err = store.put(&slot("t"), &Value::Int(1)).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn create_makes_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("x").join("data");
        let store = FsSlotStore::create(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.dir(), nested.as_path());
    }

    #[test]
    fn garbage_file_is_corrupt() {
        let (dir, store) = temp_store();
        fs::write(dir.path().join("junk"), b"not a blob at all").unwrap();
        let err = store.get(&slot("junk")).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn empty_file_is_corrupt() {
        let (dir, store) = temp_store();
        fs::write(dir.path().join("empty"), b"").unwrap();
        assert!(matches!(
            store.get(&slot("empty")).unwrap_err(),
            StoreError::Corrupt { .. }
        ));
    }

    #[test]
    fn unencodable_value_leaves_slot_untouched() {
        let (_dir, store) = temp_store();
        store.put(&slot("s"), &Value::Int(7)).unwrap();
        let bad = Value::Dict(vec![(Value::list([1]), Value::None)]);
        let err = store.put(&slot("s"), &bad).unwrap_err();
        assert!(matches!(err, StoreError::Serialization { .. }));
        assert_eq!(store.get(&slot("s")).unwrap(), Value::Int(7));
    }

    #[test]
    fn list_skips_stray_files() {
        let (dir, store) = temp_store();
        store.put(&slot("b"), &Value::None).unwrap();
        store.put(&slot("a"), &Value::None).unwrap();
        fs::write(dir.path().join(".hidden"), b"x").unwrap();
        fs::write(dir.path().join("bad name"), b"x").unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        assert_eq!(store.list().unwrap(), vec![slot("a"), slot("b")]);
    }

    #[test]
    fn record_field_attached_late_survives() {
        let (_dir, store) = temp_store();
        let mut record = Record::new("Sample").with_field("name", "alpha").unwrap();
        record.set_field("extra", Value::list([1, 2])).unwrap();
        store.put(&slot("rec"), &Value::Record(record)).unwrap();

        let back = store.get(&slot("rec")).unwrap();
        let back = back.as_record().unwrap();
        assert_eq!(back.field("extra"), Some(&Value::list([1, 2])));
    }
}
