//! Markdown side of the converter.

use crate::model::Cell;
use crate::readers::{info_language, read_markdown, InputToken};

use super::ConvertOptions;

/// Parses a Markdown document into cells.
pub fn document_to_cells(markdown: &str, options: &ConvertOptions) -> Vec<Cell> {
    read_markdown(markdown)
        .into_iter()
        .filter_map(|token| match token {
            InputToken::CodeBlock { info, content, .. } => {
                let language =
                    info_language(&info).unwrap_or_else(|| options.default_language.clone());
                Some(Cell::code(language, content))
            }
            InputToken::Markdown { content, .. } => {
                let text = trim_blank_lines(&content);
                (!text.is_empty()).then(|| Cell::prose(text))
            }
        })
        .collect()
}

/// Renders cells as a Markdown document.
///
/// Blocks are separated by one blank line and the document ends with a
/// newline unless it is empty. Outputs are not rendered.
pub fn cells_to_document(cells: &[Cell], options: &ConvertOptions) -> String {
    let blocks: Vec<String> = cells
        .iter()
        .filter_map(|cell| match cell {
            Cell::Prose(text) => {
                let text = trim_blank_lines(text);
                (!text.is_empty()).then(|| text.to_string())
            }
            Cell::Code(code) => {
                let tag = if options.omit_default_language
                    && code.language == options.default_language
                {
                    ""
                } else {
                    code.language.as_str()
                };
                Some(render_fence(tag, &code.source))
            }
        })
        .collect();

    if blocks.is_empty() {
        String::new()
    } else {
        let mut document = blocks.join("\n\n");
        document.push('\n');
        document
    }
}

fn render_fence(tag: &str, source: &str) -> String {
    let fence = "`".repeat(fence_length(source));
    if source.is_empty() {
        format!("{fence}{tag}\n{fence}")
    } else {
        format!("{fence}{tag}\n{source}\n{fence}")
    }
}

/// Shortest backtick fence that no backtick run in `source` can close.
fn fence_length(source: &str) -> usize {
    let mut longest = 0;
    let mut run = 0;
    for c in source.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    (longest + 1).max(3)
}

/// Strips whitespace-only lines from both ends of `text`.
fn trim_blank_lines(text: &str) -> &str {
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }
    let rest = &text[start..];

    let mut end = rest.len();
    for line in rest.rsplit('\n') {
        if !line.trim().is_empty() {
            break;
        }
        end = end.saturating_sub(line.len() + 1);
    }
    if end == 0 {
        ""
    } else {
        &rest[..end.min(rest.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn options() -> ConvertOptions {
        ConvertOptions::default()
    }

    #[test]
    fn test_title_and_code() {
        let markdown = "# Title\n\n```python\nprint(1)\n```\n";
        let cells = document_to_cells(markdown, &options());
        assert_eq!(
            cells,
            vec![Cell::prose("# Title"), Cell::code("python", "print(1)")]
        );
        assert_eq!(cells_to_document(&cells, &options()), markdown);
    }

    #[test]
    fn test_untagged_fence_gets_default_language() {
        let cells = document_to_cells("```\nx\n```", &options());
        assert_eq!(cells, vec![Cell::code("python", "x")]);
    }

    #[test]
    fn test_omit_default_language() {
        let opts = ConvertOptions {
            omit_default_language: true,
            ..options()
        };
        let cells = vec![Cell::code("python", "x"), Cell::code("r", "y")];
        let rendered = cells_to_document(&cells, &opts);
        assert_eq!(rendered, "```\nx\n```\n\n```r\ny\n```\n");
        assert_eq!(document_to_cells(&rendered, &opts), cells);
    }

    #[test]
    fn test_empty_document() {
        assert!(document_to_cells("", &options()).is_empty());
        assert!(document_to_cells("\n\n  \n", &options()).is_empty());
        assert_eq!(cells_to_document(&[], &options()), "");
    }

    #[test]
    fn test_fence_grows_around_backticks() {
        let cells = vec![Cell::code("markdown", "```python\nx\n```")];
        let rendered = cells_to_document(&cells, &options());
        assert!(rendered.starts_with("````markdown\n"));
        assert_eq!(document_to_cells(&rendered, &options()), cells);
    }

    #[test]
    fn test_code_roundtrip_edge_sources() {
        let cells = vec![
            Cell::code("python", ""),
            Cell::prose("between"),
            Cell::code("python", "x = 1\n"),
            Cell::code("bash", "  indented"),
        ];
        let rendered = cells_to_document(&cells, &options());
        assert_eq!(document_to_cells(&rendered, &options()), cells);
    }

    #[test]
    fn test_crlf_in_code_source_survives() {
        let source = "a = 1\r\nb = 2\r";
        let cells = vec![Cell::code("python", source)];
        let markdown = cells_to_document(&cells, &options());
        assert_eq!(document_to_cells(&markdown, &options()), cells);
    }

    #[test]
    fn test_crlf_fences_recognized() {
        let markdown = "```python\r\nx = 1\r\n```\r\n";
        assert_eq!(
            document_to_cells(markdown, &options()),
            vec![Cell::code("python", "x = 1\r")]
        );
    }

    #[test]
    fn test_prose_internal_blank_lines_kept() {
        let cells = document_to_cells("\n\npara one\n\npara two\n\n\n", &options());
        assert_eq!(cells, vec![Cell::prose("para one\n\npara two")]);
    }

    #[test]
    fn test_unclosed_fence() {
        let cells = document_to_cells("intro\n\n```julia\nx = 1", &options());
        assert_eq!(cells, vec![Cell::prose("intro"), Cell::code("julia", "x = 1")]);
    }

    #[test]
    fn test_trim_blank_lines() {
        assert_eq!(trim_blank_lines("\n \na\nb\n\n"), "a\nb");
        assert_eq!(trim_blank_lines("a"), "a");
        assert_eq!(trim_blank_lines("\n\n"), "");
        assert_eq!(trim_blank_lines(""), "");
    }
}
