use slotjar_value::Value;

use crate::error::{StoreError, StoreResult};
use crate::slot::SlotName;

/// Storage for sealed blobs addressed by slot name.
///
/// All implementations must satisfy these invariants:
/// - `put_raw` replaces whatever the slot held before; no other slot changes.
/// - `get_raw` of a slot never written returns [`StoreError::NotFound`].
/// - `list` returns slot names in ascending order.
pub trait SlotStore: Send + Sync {
    /// Store raw blob bytes under `slot`.
    fn put_raw(&self, slot: &SlotName, blob: &[u8]) -> StoreResult<()>;

    /// Load the raw blob bytes held by `slot`.
    fn get_raw(&self, slot: &SlotName) -> StoreResult<Vec<u8>>;

    /// Check whether `slot` holds a blob.
    fn contains(&self, slot: &SlotName) -> StoreResult<bool>;

    /// All occupied slots, sorted.
    fn list(&self) -> StoreResult<Vec<SlotName>>;

    /// Seal `value` and store it. Returns the blob size in bytes.
    fn put(&self, slot: &SlotName, value: &Value) -> StoreResult<usize> {
        let blob = slotjar_codec::seal(value).map_err(|e| StoreError::codec(slot, e))?;
        self.put_raw(slot, &blob)?;
        Ok(blob.len())
    }

    /// Load and open the blob held by `slot`.
    fn get(&self, slot: &SlotName) -> StoreResult<Value> {
        let blob = self.get_raw(slot)?;
        slotjar_codec::open(&blob).map_err(|e| StoreError::codec(slot, e))
    }
}
