//! nbformat 4 notebook document.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::errors::Result;

pub const NBFORMAT: u32 = 4;
pub const NBFORMAT_MINOR: u32 = 4;

/// Multi-line text stored either as one string or as a list of lines.
///
/// Always written as a list of lines, each keeping its trailing newline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultilineText(pub String);

impl MultilineText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MultilineText {
    fn from(text: &str) -> Self {
        MultilineText(text.to_string())
    }
}

impl Serialize for MultilineText {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.split_inclusive('\n'))
    }
}

impl<'de> Deserialize<'de> for MultilineText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            One(String),
            Lines(Vec<String>),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::One(text) => MultilineText(text),
            Repr::Lines(lines) => MultilineText(lines.concat()),
        })
    }
}

/// One notebook cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum NotebookCell {
    Markdown {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        metadata: Map<String, Value>,
        #[serde(default)]
        source: MultilineText,
    },
    Code {
        #[serde(default)]
        execution_count: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        metadata: Map<String, Value>,
        #[serde(default)]
        outputs: Vec<Value>,
        #[serde(default)]
        source: MultilineText,
    },
    Raw {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        metadata: Map<String, Value>,
        #[serde(default)]
        source: MultilineText,
    },
}

impl NotebookCell {
    pub fn markdown(source: &str) -> Self {
        NotebookCell::Markdown {
            id: None,
            metadata: Map::new(),
            source: source.into(),
        }
    }

    pub fn code(source: &str) -> Self {
        NotebookCell::Code {
            execution_count: None,
            id: None,
            metadata: Map::new(),
            outputs: Vec::new(),
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        match self {
            NotebookCell::Markdown { source, .. }
            | NotebookCell::Code { source, .. }
            | NotebookCell::Raw { source, .. } => source.as_str(),
        }
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        match self {
            NotebookCell::Markdown { metadata, .. }
            | NotebookCell::Code { metadata, .. }
            | NotebookCell::Raw { metadata, .. } => metadata,
        }
    }
}

/// A notebook in nbformat 4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<NotebookCell>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default = "default_nbformat")]
    pub nbformat: u32,
    #[serde(default = "default_nbformat_minor")]
    pub nbformat_minor: u32,
}

fn default_nbformat() -> u32 {
    NBFORMAT
}

fn default_nbformat_minor() -> u32 {
    NBFORMAT_MINOR
}

impl Default for Notebook {
    fn default() -> Self {
        Self {
            cells: Vec::new(),
            metadata: Map::new(),
            nbformat: NBFORMAT,
            nbformat_minor: NBFORMAT_MINOR,
        }
    }
}

impl Notebook {
    /// Parses notebook JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Writes notebook JSON the way Jupyter does: one-space indent, trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)?;
        buffer.push(b'\n');
        // serde_json only ever emits UTF-8.
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// The notebook's kernel language, if recorded.
    ///
    /// `language_info.name` takes precedence over `kernelspec.language`.
    pub fn language(&self) -> Option<String> {
        let from = |section: &str, key: &str| {
            self.metadata
                .get(section)
                .and_then(|v| v.get(key))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(normalize_language)
        };
        from("language_info", "name").or_else(|| from("kernelspec", "language"))
    }
}

/// Maps kernel language names onto fence tags.
pub fn normalize_language(name: &str) -> String {
    match name.to_ascii_lowercase().as_str() {
        "c++" => "cpp".to_string(),
        other => other.to_string(),
    }
}
