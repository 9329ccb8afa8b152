//! Notebook side of the converter.

use serde_json::{json, Map, Value};

use crate::model::{Cell, CodeCell, Notebook, NotebookCell};

use super::outputs::OutputCarrier;
use super::ConvertOptions;

const LANGUAGE_KEY: &str = "language";

/// Reads cells out of a notebook.
///
/// Raw cells become prose. A code cell's language is its own
/// `metadata.language`, else the notebook's language, else the default.
pub fn notebook_to_cells(notebook: &Notebook, options: &ConvertOptions) -> Vec<Cell> {
    let notebook_language = notebook
        .language()
        .unwrap_or_else(|| options.default_language.clone());

    notebook
        .cells
        .iter()
        .map(|cell| match cell {
            NotebookCell::Markdown { source, .. } | NotebookCell::Raw { source, .. } => {
                Cell::prose(source.as_str())
            }
            NotebookCell::Code {
                source,
                metadata,
                outputs,
                execution_count,
                ..
            } => {
                let language = metadata
                    .get(LANGUAGE_KEY)
                    .and_then(Value::as_str)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| notebook_language.clone());
                let mut code = CodeCell::new(language, source.as_str());
                if options.preserve_output {
                    code.outputs = outputs.clone();
                    if options.execution_count {
                        code.execution_count = *execution_count;
                    }
                }
                Cell::Code(code)
            }
        })
        .collect()
}

/// Builds a notebook from cells, optionally on top of an existing notebook.
///
/// With a `base`, the notebook-level metadata is kept and code cells whose
/// language and source are unchanged get their outputs, execution count and
/// cell metadata back. Without `preserve_output`, every output is cleared
/// and every execution count reset.
pub fn cells_to_notebook(
    cells: &[Cell],
    preserve_output: bool,
    base: Option<&Notebook>,
    options: &ConvertOptions,
) -> Notebook {
    let mut metadata = base.map(|nb| nb.metadata.clone()).unwrap_or_default();
    let language = base
        .and_then(Notebook::language)
        .unwrap_or_else(|| options.default_language.clone());
    ensure_language_metadata(&mut metadata, &language);

    let mut carrier = base.map(|nb| OutputCarrier::new(nb, &language));
    let keep_count = preserve_output && options.execution_count;

    let notebook_cells = cells
        .iter()
        .map(|cell| match cell {
            Cell::Prose(text) => NotebookCell::markdown(text),
            Cell::Code(code) => {
                let carried = carrier
                    .as_mut()
                    .and_then(|c| c.take(&code.language, &code.source));

                let mut cell_metadata = Map::new();
                let mut outputs = code.outputs.clone();
                let mut execution_count = code.execution_count;
                let mut id = None;

                if let Some(previous) = carried {
                    cell_metadata = previous.metadata;
                    id = previous.id;
                    if outputs.is_empty() && execution_count.is_none() {
                        outputs = previous.outputs;
                        execution_count = previous.execution_count;
                    }
                }

                cell_metadata.remove(LANGUAGE_KEY);
                if code.language != language {
                    cell_metadata.insert(LANGUAGE_KEY.to_string(), json!(code.language));
                }
                if !preserve_output {
                    outputs.clear();
                }
                if !keep_count {
                    execution_count = None;
                }

                NotebookCell::Code {
                    execution_count,
                    id,
                    metadata: cell_metadata,
                    outputs,
                    source: code.source.as_str().into(),
                }
            }
        })
        .collect();

    Notebook {
        cells: notebook_cells,
        metadata,
        ..Notebook::default()
    }
}

/// Fills in `kernelspec` and `language_info` when the notebook lacks them.
fn ensure_language_metadata(metadata: &mut Map<String, Value>, language: &str) {
    if !metadata.contains_key("kernelspec") {
        let kernelspec = if language == "python" {
            json!({
                "display_name": "Python 3",
                "language": "python",
                "name": "python3"
            })
        } else {
            json!({
                "display_name": language,
                "language": language,
                "name": language
            })
        };
        metadata.insert("kernelspec".to_string(), kernelspec);
    }
    if !metadata.contains_key("language_info") {
        metadata.insert("language_info".to_string(), json!({ "name": language }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::code_with_output;
    use pretty_assertions::assert_eq;

    fn options() -> ConvertOptions {
        ConvertOptions::default()
    }

    #[test]
    fn test_title_and_code_cells() {
        let cells = vec![Cell::prose("# Title"), Cell::code("python", "print(1)")];
        let notebook = cells_to_notebook(&cells, true, None, &options());

        assert_eq!(notebook.cells.len(), 2);
        assert!(matches!(notebook.cells[0], NotebookCell::Markdown { .. }));
        assert_eq!(notebook.cells[1].source(), "print(1)");
        assert!(notebook.cells[1].metadata().is_empty());
        assert_eq!(notebook.language().as_deref(), Some("python"));
        assert_eq!(
            notebook.metadata["kernelspec"]["name"],
            json!("python3")
        );
    }

    #[test]
    fn test_roundtrip() {
        let cells = vec![
            Cell::prose("intro\n\nmore"),
            code_with_output("python", "1 + 1", json!({"output_type": "execute_result"}), 3),
            Cell::code("bash", "ls"),
            Cell::prose(""),
        ];
        let notebook = cells_to_notebook(&cells, true, None, &options());
        assert_eq!(notebook_to_cells(&notebook, &options()), cells);

        let text = notebook.to_json().unwrap();
        let reparsed = Notebook::from_json(&text).unwrap();
        assert_eq!(notebook_to_cells(&reparsed, &options()), cells);
    }

    #[test]
    fn test_foreign_language_tagged() {
        let cells = vec![Cell::code("r", "x <- 1")];
        let notebook = cells_to_notebook(&cells, true, None, &options());
        assert_eq!(notebook.cells[0].metadata()["language"], json!("r"));
    }

    #[test]
    fn test_no_preserve_clears_outputs() {
        let cells = vec![code_with_output("python", "x", json!({"text": "1"}), 1)];
        let notebook = cells_to_notebook(&cells, false, None, &options());
        match &notebook.cells[0] {
            NotebookCell::Code {
                outputs,
                execution_count,
                ..
            } => {
                assert!(outputs.is_empty());
                assert_eq!(*execution_count, None);
            }
            other => panic!("Expected code cell, got {:?}", other),
        }
    }

    #[test]
    fn test_notebook_language_from_kernelspec() {
        let mut notebook = Notebook::default();
        notebook
            .metadata
            .insert("kernelspec".into(), json!({"language": "julia", "name": "julia-1.9"}));
        notebook.cells.push(NotebookCell::code("println(1)"));
        notebook.cells.push(NotebookCell::Raw {
            id: None,
            metadata: Map::new(),
            source: "raw text".into(),
        });

        let cells = notebook_to_cells(&notebook, &options());
        assert_eq!(
            cells,
            vec![Cell::code("julia", "println(1)"), Cell::prose("raw text")]
        );
    }

    #[test]
    fn test_outputs_dropped_when_not_preserved() {
        let opts = ConvertOptions {
            preserve_output: false,
            ..options()
        };
        let cells = vec![code_with_output("python", "x", json!({"text": "1"}), 1)];
        let notebook = cells_to_notebook(&cells, true, None, &options());
        assert_eq!(
            notebook_to_cells(&notebook, &opts),
            vec![Cell::code("python", "x")]
        );
    }

    #[test]
    fn test_base_metadata_and_outputs_carried() {
        let mut base = Notebook::default();
        base.metadata
            .insert("kernelspec".into(), json!({"language": "python", "name": "venv"}));
        base.cells.push(NotebookCell::Code {
            execution_count: Some(7),
            id: Some("abc".into()),
            metadata: Map::from_iter([("tags".to_string(), json!(["keep"]))]),
            outputs: vec![json!({"output_type": "stream", "text": ["2\n"]})],
            source: "print(2)".into(),
        });

        let cells = vec![
            Cell::prose("new"),
            Cell::code("python", "print(1)"),
            Cell::code("python", "print(2)"),
        ];
        let notebook = cells_to_notebook(&cells, true, Some(&base), &options());

        assert_eq!(notebook.metadata["kernelspec"]["name"], json!("venv"));
        match &notebook.cells[2] {
            NotebookCell::Code {
                execution_count,
                id,
                metadata,
                outputs,
                ..
            } => {
                assert_eq!(*execution_count, Some(7));
                assert_eq!(id.as_deref(), Some("abc"));
                assert_eq!(metadata["tags"], json!(["keep"]));
                assert_eq!(outputs.len(), 1);
            }
            other => panic!("Expected code cell, got {:?}", other),
        }
        match &notebook.cells[1] {
            NotebookCell::Code { outputs, .. } => assert!(outputs.is_empty()),
            other => panic!("Expected code cell, got {:?}", other),
        }
    }
}
