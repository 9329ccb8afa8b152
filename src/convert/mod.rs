//! Bidirectional conversion between Markdown documents and notebooks.
//!
//! Both formats are mapped onto an ordered sequence of [`Cell`]s: fenced
//! code blocks become code cells, everything else becomes prose. The
//! conversion is pure; reading and writing files is left to callers.

mod markdown;
mod notebook;
mod outputs;

use crate::errors::Result;
use crate::model::{Cell, Notebook};

pub use markdown::{cells_to_document, document_to_cells};
pub use notebook::{cells_to_notebook, notebook_to_cells};

/// Options controlling both directions of conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Language of untagged fences and of fresh notebooks.
    pub default_language: String,
    /// Keep outputs when reading and writing notebooks.
    pub preserve_output: bool,
    /// Keep execution counts (only when outputs are preserved).
    pub execution_count: bool,
    /// Render code in the default language with an untagged fence.
    pub omit_default_language: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            default_language: "python".to_string(),
            preserve_output: true,
            execution_count: true,
            omit_default_language: false,
        }
    }
}

/// Result of decoding notebook text.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedNotebook {
    pub cells: Vec<Cell>,
    /// The parsed notebook, when the text was valid.
    pub notebook: Option<Notebook>,
    /// Human-readable parse error, when the text was not.
    pub diagnostic: Option<String>,
}

/// Stateless converter configured once with [`ConvertOptions`].
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn document_to_cells(&self, markdown: &str) -> Vec<Cell> {
        document_to_cells(markdown, &self.options)
    }

    pub fn cells_to_document(&self, cells: &[Cell]) -> String {
        cells_to_document(cells, &self.options)
    }

    pub fn notebook_to_cells(&self, notebook: &Notebook) -> Vec<Cell> {
        notebook_to_cells(notebook, &self.options)
    }

    pub fn cells_to_notebook(&self, cells: &[Cell], preserve_output: bool) -> Notebook {
        cells_to_notebook(cells, preserve_output, None, &self.options)
    }

    /// Like [`Converter::cells_to_notebook`], keeping what it can from `base`.
    pub fn cells_to_notebook_over(
        &self,
        cells: &[Cell],
        preserve_output: bool,
        base: Option<&Notebook>,
    ) -> Notebook {
        cells_to_notebook(cells, preserve_output, base, &self.options)
    }

    /// Decodes raw notebook JSON.
    ///
    /// Empty or whitespace-only text is an empty notebook. Malformed text
    /// yields a single prose cell describing the error, followed by the
    /// offending text indented so it can never be read back as a fence.
    pub fn notebook_text_to_cells(&self, text: &str) -> DecodedNotebook {
        if text.trim().is_empty() {
            return DecodedNotebook {
                cells: Vec::new(),
                notebook: None,
                diagnostic: None,
            };
        }

        match Notebook::from_json(text) {
            Ok(notebook) => DecodedNotebook {
                cells: self.notebook_to_cells(&notebook),
                notebook: Some(notebook),
                diagnostic: None,
            },
            Err(err) => {
                let diagnostic = err.to_string();
                DecodedNotebook {
                    cells: vec![Cell::prose(error_block(&diagnostic, text))],
                    notebook: None,
                    diagnostic: Some(diagnostic),
                }
            }
        }
    }

    /// Converts Markdown straight to notebook JSON.
    pub fn document_to_notebook_json(&self, markdown: &str, base: Option<&Notebook>) -> Result<String> {
        let cells = self.document_to_cells(markdown);
        self.cells_to_notebook_over(&cells, self.options.preserve_output, base)
            .to_json()
    }
}

fn error_block(diagnostic: &str, raw: &str) -> String {
    let mut block = format!("**Notebook parse error**: {diagnostic}\n");
    for line in raw.lines() {
        block.push('\n');
        if !line.trim().is_empty() {
            block.push_str("    ");
            block.push_str(line);
        }
    }
    block.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_markdown_notebook_markdown() {
        let converter = Converter::default();
        let markdown = "# Title\n\n```python\nprint(1)\n```\n";

        let notebook = converter.cells_to_notebook(&converter.document_to_cells(markdown), true);
        assert_eq!(notebook.cells.len(), 2);

        let json = notebook.to_json().unwrap();
        let decoded = converter.notebook_text_to_cells(&json);
        assert_eq!(decoded.diagnostic, None);
        assert_eq!(converter.cells_to_document(&decoded.cells), markdown);
    }

    #[test]
    fn test_empty_both_ways() {
        let converter = Converter::default();
        let notebook = converter.cells_to_notebook(&converter.document_to_cells(""), true);
        assert!(notebook.cells.is_empty());

        let decoded = converter.notebook_text_to_cells("  \n");
        assert!(decoded.cells.is_empty());
        assert_eq!(decoded.diagnostic, None);
        assert_eq!(converter.cells_to_document(&decoded.cells), "");
    }

    #[test]
    fn test_invalid_notebook_becomes_diagnostic() {
        let converter = Converter::default();
        let raw = "{\"cells\": [\n```python\nbroken";
        let decoded = converter.notebook_text_to_cells(raw);

        assert!(decoded.diagnostic.is_some());
        assert_eq!(decoded.cells.len(), 1);

        let markdown = converter.cells_to_document(&decoded.cells);
        assert!(markdown.starts_with("**Notebook parse error**: "));
        assert!(markdown.contains("\n    ```python\n"));

        let reread = converter.document_to_cells(&markdown);
        assert_eq!(reread.len(), 1);
        assert!(!reread[0].is_code());
    }

    #[test]
    fn test_document_to_notebook_json() {
        let converter = Converter::default();
        let json = converter
            .document_to_notebook_json("```r\nx\n```\n", None)
            .unwrap();
        let notebook = Notebook::from_json(&json).unwrap();
        assert_eq!(notebook.cells[0].metadata()["language"], "r");
    }
}
