//! Clipboard sink for copied results.

use super::ExportResult;

/// Destination for "copy to clipboard" actions.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> ExportResult<()>;
}

/// Clipboard that keeps the last copied text, for embedding shells and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    contents: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> ExportResult<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}
