use slotjar_store::{SlotName, SlotStore};
use slotjar_value::Value;
use tracing::{debug, info};

use crate::error::{HarnessError, HarnessResult};
use crate::render::Renderer;
use crate::samples::Sample;

/// One completed round-trip.
#[derive(Clone, Debug, PartialEq)]
pub struct RunEntry {
    pub slot: SlotName,
    /// Size of the stored blob in bytes.
    pub bytes: usize,
    /// The value as read back.
    pub value: Value,
    /// Whether `value` is identical to the value written, floats compared
    /// bit for bit.
    pub matched: bool,
}

/// Outcome of [`Harness::run`], in read order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReport {
    pub entries: Vec<RunEntry>,
}

impl RunReport {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.bytes).sum()
    }

    pub fn mismatches(&self) -> usize {
        self.entries.iter().filter(|e| !e.matched).count()
    }
}

/// Writes values to slots, reads them back, and hands them to a renderer.
pub struct Harness<S, R> {
    store: S,
    renderer: R,
    verify: bool,
}

impl<S: SlotStore, R: Renderer> Harness<S, R> {
    pub fn new(store: S, renderer: R) -> Self {
        Self {
            store,
            renderer,
            verify: true,
        }
    }

    /// Compare every reloaded value with the value written (on by default).
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Persist `value` under `slot`, replacing any earlier blob there.
    /// Returns the blob size in bytes.
    pub fn write(&self, slot: &SlotName, value: &Value) -> HarnessResult<usize> {
        let bytes = self.store.put(slot, value)?;
        debug!(slot = %slot, kind = %value.kind(), bytes, "wrote sample");
        Ok(bytes)
    }

    /// Load the value held by `slot`, render it, and return it.
    pub fn read(&mut self, slot: &SlotName) -> HarnessResult<Value> {
        let value = self.store.get(slot)?;
        debug!(slot = %slot, kind = %value.kind(), "read sample");
        self.renderer.render(slot, &value)?;
        Ok(value)
    }

    /// Write every sample in order, then read every written slot in the
    /// same order. The first failure aborts the run.
    pub fn run(&mut self, samples: &[Sample]) -> HarnessResult<RunReport> {
        let mut sizes = Vec::with_capacity(samples.len());
        for sample in samples {
            sizes.push(self.write(&sample.slot, &sample.value)?);
        }

        let mut report = RunReport::default();
        for (sample, bytes) in samples.iter().zip(sizes) {
            let value = self.read(&sample.slot)?;
            let matched = value.same_as(&sample.value);
            if self.verify && !matched {
                return Err(HarnessError::Mismatch {
                    slot: sample.slot.clone(),
                    written: sample.value.to_string(),
                    read: value.to_string(),
                });
            }
            report.entries.push(RunEntry {
                slot: sample.slot.clone(),
                bytes,
                value,
                matched,
            });
        }

        info!(
            slots = report.len(),
            bytes = report.total_bytes(),
            verified = self.verify,
            mismatches = report.mismatches(),
            "round-trip run complete"
        );
        Ok(report)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_parts(self) -> (S, R) {
        (self.store, self.renderer)
    }
}
