//! Readers for Markdown input.

mod delimiters;
mod markdown;
mod types;

pub use delimiters::{DelimitedToken, DelimitedTokenGetter, ExtractResult};
pub use markdown::{info_language, read_markdown};
pub use types::InputToken;
