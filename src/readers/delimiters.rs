//! Fenced code block extraction.

use once_cell::sync::Lazy;
use regex::Regex;

/// Pattern for matching code fence openings (at most three spaces of indent).
static FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<indent> {0,3})(?P<fence>`{3,}|~{3,})(?P<info>.*)$").unwrap());

/// A fenced block extracted from input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedToken {
    /// The info string from the opening fence, trimmed.
    pub info: String,
    /// The content between the fences.
    pub content: String,
    /// Line of the opening fence (1-indexed).
    pub line: usize,
}

/// Result of attempting to extract a delimited token.
#[derive(Debug)]
pub enum ExtractResult {
    /// Successfully extracted a token.
    Token(DelimitedToken),
    /// No opening fence found, returns the line.
    NotDelimited(String),
    /// Opening fence without a closing one; the block runs to end of input.
    Unclosed(DelimitedToken),
}

struct Fence {
    ch: char,
    len: usize,
    indent: usize,
}

impl Fence {
    fn closes(&self, line: &str) -> bool {
        let trimmed = line.trim_start_matches(' ');
        if line.len() - trimmed.len() > 3 {
            return false;
        }
        let run = trimmed.chars().take_while(|&c| c == self.ch).count();
        run >= self.len && trimmed[run * self.ch.len_utf8()..].trim().is_empty()
    }

    /// Removes up to `indent` leading spaces, as the opening fence had.
    fn dedent<'a>(&self, line: &'a str) -> &'a str {
        let spaces = line
            .chars()
            .take(self.indent)
            .take_while(|&c| c == ' ')
            .count();
        &line[spaces..]
    }
}

/// Extracts delimited tokens (code blocks) from lines.
pub struct DelimitedTokenGetter {
    /// Current line number (1-indexed).
    line_number: usize,
}

impl DelimitedTokenGetter {
    /// Creates a new getter.
    pub fn new() -> Self {
        Self { line_number: 1 }
    }

    /// Line number of the next line to be read.
    pub fn line(&self) -> usize {
        self.line_number
    }

    /// Extracts the next token from the line iterator.
    pub fn extract<'a, I>(&mut self, lines: &mut I) -> Option<ExtractResult>
    where
        I: Iterator<Item = &'a str>,
    {
        let line = lines.next()?;
        let start_line = self.line_number;
        self.line_number += 1;

        let Some((fence, info)) = open_fence(line) else {
            return Some(ExtractResult::NotDelimited(line.to_string()));
        };

        let mut content_lines = Vec::new();

        loop {
            match lines.next() {
                Some(content_line) => {
                    self.line_number += 1;

                    if fence.closes(content_line) {
                        return Some(ExtractResult::Token(DelimitedToken {
                            info,
                            content: content_lines.join("\n"),
                            line: start_line,
                        }));
                    }
                    content_lines.push(fence.dedent(content_line));
                }
                None => {
                    return Some(ExtractResult::Unclosed(DelimitedToken {
                        info,
                        content: content_lines.join("\n"),
                        line: start_line,
                    }));
                }
            }
        }
    }
}

impl Default for DelimitedTokenGetter {
    fn default() -> Self {
        Self::new()
    }
}

fn open_fence(line: &str) -> Option<(Fence, String)> {
    let caps = FENCE_OPEN.captures(line)?;
    let fence = &caps["fence"];
    let info = caps["info"].trim();
    let ch = fence.chars().next()?;

    // Backtick fences may not carry backticks in their info string.
    if ch == '`' && info.contains('`') {
        return None;
    }

    Some((
        Fence {
            ch,
            len: fence.len(),
            indent: caps["indent"].len(),
        },
        info.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_all_tokens(input: &str) -> Vec<ExtractResult> {
        let mut getter = DelimitedTokenGetter::new();
        let mut lines = input.lines().peekable();
        let mut results = Vec::new();
        while lines.peek().is_some() {
            if let Some(result) = getter.extract(&mut lines) {
                results.push(result);
            }
        }
        results
    }

    fn single_token(input: &str) -> DelimitedToken {
        let mut results = extract_all_tokens(input);
        assert_eq!(results.len(), 1);
        match results.remove(0) {
            ExtractResult::Token(token) => token,
            other => panic!("Expected Token, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_code_block() {
        let token = single_token("```python\nprint('hello')\n```");
        assert_eq!(token.info, "python");
        assert_eq!(token.content, "print('hello')");
        assert_eq!(token.line, 1);
    }

    #[test]
    fn test_tilde_fence() {
        let token = single_token("~~~rust\nfn main() {}\n~~~");
        assert_eq!(token.info, "rust");
        assert_eq!(token.content, "fn main() {}");
    }

    #[test]
    fn test_longer_fence() {
        let token = single_token("````python\n```\nnot a fence\n```\n````");
        assert_eq!(token.content, "```\nnot a fence\n```");
    }

    #[test]
    fn test_mismatched_closing_char() {
        let token = single_token("~~~\n```\n~~~");
        assert_eq!(token.content, "```");
    }

    #[test]
    fn test_indented_fence() {
        let token = single_token("  ```sh\n  ls\n    cd\n  ```");
        assert_eq!(token.content, "ls\n  cd");
    }

    #[test]
    fn test_four_space_indent_is_not_fence() {
        let results = extract_all_tokens("    ```\n    code\n    ```");
        assert!(results
            .iter()
            .all(|r| matches!(r, ExtractResult::NotDelimited(_))));
    }

    #[test]
    fn test_inline_backticks_not_fence() {
        let results = extract_all_tokens("```a` b```");
        assert!(matches!(results[0], ExtractResult::NotDelimited(_)));
    }

    #[test]
    fn test_unclosed() {
        let results = extract_all_tokens("text\n```python\nx = 1");
        assert_eq!(results.len(), 2);
        match &results[1] {
            ExtractResult::Unclosed(token) => {
                assert_eq!(token.content, "x = 1");
                assert_eq!(token.line, 2);
            }
            other => panic!("Expected Unclosed, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_block() {
        let token = single_token("```\n```");
        assert_eq!(token.info, "");
        assert_eq!(token.content, "");
    }
}
