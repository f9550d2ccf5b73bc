use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::slot::SlotName;
use crate::traits::SlotStore;

/// In-memory slot store.
///
/// Holds sealed blobs, not values, so reads go through the same decoding
/// path as the filesystem backend.
#[derive(Default)]
pub struct InMemorySlotStore {
    blobs: RwLock<BTreeMap<SlotName, Vec<u8>>>,
}

impl InMemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }
}

impl SlotStore for InMemorySlotStore {
    fn put_raw(&self, slot: &SlotName, blob: &[u8]) -> StoreResult<()> {
        let mut map = self.blobs.write().expect("lock poisoned");
        map.insert(slot.clone(), blob.to_vec());
        Ok(())
    }

    fn get_raw(&self, slot: &SlotName) -> StoreResult<Vec<u8>> {
        let map = self.blobs.read().expect("lock poisoned");
        map.get(slot)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { slot: slot.clone() })
    }

    fn contains(&self, slot: &SlotName) -> StoreResult<bool> {
        Ok(self.blobs.read().expect("lock poisoned").contains_key(slot))
    }

    fn list(&self) -> StoreResult<Vec<SlotName>> {
        Ok(self.blobs.read().expect("lock poisoned").keys().cloned().collect())
    }
}

impl std::fmt::Debug for InMemorySlotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySlotStore")
            .field("slot_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotjar_value::Value;

    fn slot(name: &str) -> SlotName {
        SlotName::new(name).unwrap()
    }

    #[test]
    fn put_get_list() {
        let store = InMemorySlotStore::new();
        assert!(store.is_empty());
        store.put(&slot("z"), &Value::Bool(true)).unwrap();
        store.put(&slot("a"), &Value::Int(1)).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&slot("a")).unwrap(), Value::Int(1));
        assert_eq!(store.list().unwrap(), vec![slot("a"), slot("z")]);
    }

    #[test]
    fn raw_corruption_is_detected() {
        let store = InMemorySlotStore::new();
        store.put(&slot("s"), &Value::from("hello")).unwrap();
        let mut blob = store.get_raw(&slot("s")).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xFF;
        store.put_raw(&slot("s"), &blob).unwrap();
        assert!(matches!(
            store.get(&slot("s")).unwrap_err(),
            StoreError::Corrupt { .. }
        ));
    }

    #[test]
    fn missing_slot() {
        let store = InMemorySlotStore::new();
        assert!(matches!(
            store.get(&slot("nope")).unwrap_err(),
            StoreError::NotFound { .. }
        ));
        assert!(!store.contains(&slot("nope")).unwrap());
    }
}
