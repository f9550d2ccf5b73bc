use std::io::Write;

use colored::Colorize;
use slotjar_harness::{HarnessError, HarnessResult, Renderer};
use slotjar_store::SlotName;
use slotjar_value::Value;

/// Text output for full runs: a colored `slot:` label, then the value.
pub struct ConsoleRenderer<W: Write> {
    out: W,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for ConsoleRenderer<W> {
    fn render(&mut self, slot: &SlotName, value: &Value) -> HarnessResult<()> {
        let label = format!("{slot}:");
        writeln!(self.out, "{} {value}", label.yellow()).map_err(|e| HarnessError::Render {
            slot: slot.clone(),
            reason: e.to_string(),
        })
    }
}
