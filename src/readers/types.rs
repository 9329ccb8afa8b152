//! Type definitions for readers.

/// A token from the Markdown input stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputToken {
    /// A fenced code block with its info string and content.
    CodeBlock {
        /// The info string (language and attributes).
        info: String,
        /// The code content, without the fences.
        content: String,
        /// Line of the opening fence (1-indexed).
        line: usize,
    },

    /// A run of lines outside any code block.
    Markdown {
        /// The lines, joined with newlines.
        content: String,
        /// Line of the first line of the run (1-indexed).
        line: usize,
    },
}

impl InputToken {
    /// Creates a code block token.
    pub fn code_block(info: String, content: String, line: usize) -> Self {
        Self::CodeBlock {
            info,
            content,
            line,
        }
    }

    /// Creates a markdown token.
    pub fn markdown(content: String, line: usize) -> Self {
        Self::Markdown { content, line }
    }
}
