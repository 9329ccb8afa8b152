//! Markdown tokenization into prose runs and fenced code blocks.

use super::delimiters::{DelimitedTokenGetter, ExtractResult};
use super::types::InputToken;

/// Splits a Markdown document into prose runs and code blocks, in order.
///
/// Consecutive non-fence lines are grouped into one `Markdown` token. An
/// unclosed fence yields a code block running to end of input. Lines are
/// split on `\n` only; a `\r` before it stays part of the line.
pub fn read_markdown(input: &str) -> Vec<InputToken> {
    let mut getter = DelimitedTokenGetter::new();
    let mut lines = input.split_terminator('\n').peekable();
    let mut tokens = Vec::new();
    let mut prose: Vec<String> = Vec::new();
    let mut prose_start = 1;

    while lines.peek().is_some() {
        let line = getter.line();
        let Some(result) = getter.extract(&mut lines) else {
            break;
        };
        match result {
            ExtractResult::NotDelimited(text) => {
                if prose.is_empty() {
                    prose_start = line;
                }
                prose.push(text);
            }
            ExtractResult::Token(token) | ExtractResult::Unclosed(token) => {
                flush_prose(&mut prose, prose_start, &mut tokens);
                tokens.push(InputToken::code_block(token.info, token.content, token.line));
            }
        }
    }
    flush_prose(&mut prose, prose_start, &mut tokens);

    tokens
}

fn flush_prose(prose: &mut Vec<String>, start: usize, tokens: &mut Vec<InputToken>) {
    if !prose.is_empty() {
        tokens.push(InputToken::markdown(prose.join("\n"), start));
        prose.clear();
    }
}

/// Extracts the language tag from a fence info string.
///
/// Takes the first word and strips attribute syntax, so `{python}`,
/// `{.python}` and `python,` all yield `python`. Returns `None` when the
/// info string carries no language.
pub fn info_language(info: &str) -> Option<String> {
    let word = info.split_whitespace().next()?;
    let word = word.trim_start_matches('{').trim_end_matches('}');
    let word = word.trim_start_matches('.').trim_end_matches(',');
    if word.is_empty() {
        None
    } else {
        Some(word.to_string())
    }
}
