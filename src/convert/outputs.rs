//! Carrying notebook outputs across a Markdown-driven rewrite.

use serde_json::{Map, Value};

use crate::model::{Notebook, NotebookCell};

/// State of a code cell in the notebook being replaced.
#[derive(Debug, Clone)]
pub(super) struct PreviousCode {
    pub language: String,
    pub source: String,
    pub id: Option<String>,
    pub metadata: Map<String, Value>,
    pub outputs: Vec<Value>,
    pub execution_count: Option<u64>,
}

/// Hands out previous code cells to new ones with identical language and source.
///
/// Matching is greedy and in order: once a previous cell is taken, no earlier
/// previous cell can be matched again, so reordered cells lose their outputs.
pub(super) struct OutputCarrier {
    previous: Vec<PreviousCode>,
    cursor: usize,
}

impl OutputCarrier {
    pub fn new(notebook: &Notebook, notebook_language: &str) -> Self {
        let previous = notebook
            .cells
            .iter()
            .filter_map(|cell| match cell {
                NotebookCell::Code {
                    execution_count,
                    id,
                    metadata,
                    outputs,
                    source,
                } => Some(PreviousCode {
                    language: metadata
                        .get("language")
                        .and_then(Value::as_str)
                        .unwrap_or(notebook_language)
                        .to_string(),
                    source: source.as_str().to_string(),
                    id: id.clone(),
                    metadata: metadata.clone(),
                    outputs: outputs.clone(),
                    execution_count: *execution_count,
                }),
                _ => None,
            })
            .collect();

        Self {
            previous,
            cursor: 0,
        }
    }

    /// Takes the next unmatched previous cell with this language and source.
    pub fn take(&mut self, language: &str, source: &str) -> Option<PreviousCode> {
        let offset = self.previous[self.cursor..]
            .iter()
            .position(|p| p.language == language && p.source == source)?;
        let index = self.cursor + offset;
        self.cursor = index + 1;
        Some(self.previous[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notebook(sources: &[&str]) -> Notebook {
        Notebook {
            cells: sources.iter().map(|s| NotebookCell::code(s)).collect(),
            ..Notebook::default()
        }
    }

    #[test]
    fn test_in_order_matching() {
        let nb = notebook(&["a", "b", "a"]);
        let mut carrier = OutputCarrier::new(&nb, "python");

        assert!(carrier.take("python", "a").is_some());
        assert!(carrier.take("python", "a").is_some());
        assert!(carrier.take("python", "b").is_none());
    }

    #[test]
    fn test_language_must_match() {
        let nb = notebook(&["x"]);
        let mut carrier = OutputCarrier::new(&nb, "python");
        assert!(carrier.take("r", "x").is_none());
        assert!(carrier.take("python", "x").is_some());
    }
}
