//! The intermediate cell representation shared by both formats.

use serde_json::Value;

/// A code cell: fenced block in Markdown, code cell in a notebook.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeCell {
    /// Language tag, never empty.
    pub language: String,
    /// Source text without a trailing newline.
    pub source: String,
    /// Notebook outputs, kept verbatim.
    pub outputs: Vec<Value>,
    pub execution_count: Option<u64>,
}

impl CodeCell {
    pub fn new(language: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            source: source.into(),
            outputs: Vec::new(),
            execution_count: None,
        }
    }
}

/// One element of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Narrative text.
    Prose(String),
    Code(CodeCell),
}

impl Cell {
    /// Creates a prose cell.
    pub fn prose(text: impl Into<String>) -> Self {
        Cell::Prose(text.into())
    }

    /// Creates a code cell without outputs.
    pub fn code(language: impl Into<String>, source: impl Into<String>) -> Self {
        Cell::Code(CodeCell::new(language, source))
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Cell::Code(_))
    }
}
