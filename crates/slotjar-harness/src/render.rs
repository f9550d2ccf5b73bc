use std::io::Write;

use slotjar_store::SlotName;
use slotjar_value::Value;

use crate::error::{HarnessError, HarnessResult};

/// Destination for reloaded values.
pub trait Renderer {
    fn render(&mut self, slot: &SlotName, value: &Value) -> HarnessResult<()>;
}

/// Writes the printed representation of each value, one per line.
pub struct TextRenderer<W: Write> {
    out: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, slot: &SlotName, value: &Value) -> HarnessResult<()> {
        writeln!(self.out, "{value}").map_err(|e| render_error(slot, e))
    }
}

/// Writes one JSON object per line: `{"slot": ..., "value": ...}`.
pub struct JsonRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render(&mut self, slot: &SlotName, value: &Value) -> HarnessResult<()> {
        let line = serde_json::json!({ "slot": slot.as_str(), "value": value });
        serde_json::to_writer(&mut self.out, &line).map_err(|e| render_error(slot, e))?;
        writeln!(self.out).map_err(|e| render_error(slot, e))
    }
}

/// Keeps rendered values in memory.
#[derive(Debug, Default)]
pub struct CollectingRenderer {
    pub rendered: Vec<(SlotName, Value)>,
}

impl Renderer for CollectingRenderer {
    fn render(&mut self, slot: &SlotName, value: &Value) -> HarnessResult<()> {
        self.rendered.push((slot.clone(), value.clone()));
        Ok(())
    }
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn render(&mut self, slot: &SlotName, value: &Value) -> HarnessResult<()> {
        (**self).render(slot, value)
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&mut self, slot: &SlotName, value: &Value) -> HarnessResult<()> {
        (**self).render(slot, value)
    }
}

fn render_error(slot: &SlotName, e: impl std::fmt::Display) -> HarnessError {
    HarnessError::Render {
        slot: slot.clone(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(name: &str) -> SlotName {
        SlotName::new(name).unwrap()
    }

    #[test]
    fn text_plain() {
        let mut r = TextRenderer::new(Vec::new());
        r.render(&slot("t1"), &Value::tuple([5, 6, 7])).unwrap();
        r.render(&slot("t2"), &Value::from("x")).unwrap();
        let out = String::from_utf8(r.into_inner()).unwrap();
        assert_eq!(out, "(5, 6, 7)\n'x'\n");
    }

    #[test]
    fn json_line_per_value() {
        let mut r = JsonRenderer::new(Vec::new());
        r.render(&slot("t1"), &Value::Int(3)).unwrap();
        let out = String::from_utf8(r.into_inner()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(parsed["slot"], "t1");
        assert_eq!(parsed["value"]["Int"], 3);
    }

    #[test]
    fn broken_sink_names_slot() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("sink closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let err = TextRenderer::new(Broken)
            .render(&slot("t9"), &Value::None)
            .unwrap_err();
        assert_eq!(err.slot(), Some(&slot("t9")));
    }
}
