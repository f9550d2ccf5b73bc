//! Named slot storage for slotjar.
//!
//! A slot is a validated name that maps to exactly one sealed blob. The
//! filesystem backend keeps one file per slot, named after the slot with no
//! extension, inside a single data directory.
//!
//! # Storage Backends
//!
//! All backends implement the [`SlotStore`] trait:
//!
//! - [`FsSlotStore`] -- one file per slot, atomic replace on write
//! - [`InMemorySlotStore`] -- `BTreeMap`-based store for tests
//!
//! # Rules
//!
//! 1. Writing a slot replaces its previous blob entirely; other slots are
//!    never touched.
//! 2. File handles are scoped and released on every exit path.
//! 3. Reading a slot that was never written is [`StoreError::NotFound`].
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod slot;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsSlotStore;
pub use memory::InMemorySlotStore;
pub use slot::SlotName;
pub use traits::SlotStore;
