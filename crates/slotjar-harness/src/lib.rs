//! Round-trip harness for slotjar.
//!
//! Builds a fixed, ordered set of sample values, writes each one to its
//! named slot, then reads every written slot back in the same order and
//! renders it for inspection. Any failure aborts the run: nothing is
//! retried or recovered locally.

pub mod config;
pub mod error;
pub mod harness;
pub mod render;
pub mod samples;

pub use config::HarnessConfig;
pub use error::{HarnessError, HarnessResult};
pub use harness::{Harness, RunEntry, RunReport};
pub use render::{CollectingRenderer, JsonRenderer, Renderer, TextRenderer};
pub use samples::{samples, Sample};
