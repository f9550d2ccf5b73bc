//! Sample value model for slotjar.
//!
//! A [`Value`] is a closed tagged variant covering the kinds the round-trip
//! harness persists: scalars, fixed tuples, growable lists, insertion-ordered
//! mappings, and open [`Record`]s whose field set can grow after
//! construction.
//!
//! # Equality
//!
//! Equality is structural and kind-sensitive: `Bool(true)` never equals
//! `Int(1)`, `Int(1)` never equals `Float(1.0)`, and a `Tuple` never equals
//! a `List` with the same members.
//!
//! # Rendering
//!
//! `Display` produces the familiar printed form (`(1, 'Test', [2, 4])`,
//! `{'a': True}`, `Sample(name='x')`) used by the harness for visual
//! inspection.

pub mod error;
pub mod record;
pub mod render;
pub mod value;

pub use error::{ValueError, ValueResult};
pub use record::Record;
pub use value::{Value, ValueKind};
