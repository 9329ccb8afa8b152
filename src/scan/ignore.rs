//! Ignore rules for paths below a root.

use std::path::{Component, Path};

use glob::Pattern;

use crate::errors::Result;
use crate::io::STAGING_PREFIX;

/// Compiled ignore patterns.
///
/// A pattern without `/` is matched against every component of a relative
/// path, so `.*` hides any dotfile or dot-directory at any depth. A pattern
/// with `/` is matched against the whole relative path.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    names: Vec<Pattern>,
    paths: Vec<Pattern>,
}

impl IgnoreSet {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut set = IgnoreSet::default();
        for pattern in patterns {
            let compiled = Pattern::new(pattern)?;
            if pattern.contains('/') {
                set.paths.push(compiled);
            } else {
                set.names.push(compiled);
            }
        }
        Ok(set)
    }

    /// True if `rel` (relative to a root) should be skipped.
    pub fn is_ignored(&self, rel: &Path) -> bool {
        let names = rel.components().filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        });
        for name in names {
            if name.starts_with(STAGING_PREFIX) {
                return true;
            }
            if self.names.iter().any(|p| p.matches(name)) {
                return true;
            }
        }
        self.paths.iter().any(|p| p.matches_path(rel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> IgnoreSet {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        IgnoreSet::new(&patterns).unwrap()
    }

    #[test]
    fn test_component_match() {
        let ignore = set(&[".*", "__pycache__"]);
        assert!(ignore.is_ignored(Path::new(".git/config")));
        assert!(ignore.is_ignored(Path::new("a/.ipynb_checkpoints/x-checkpoint.ipynb")));
        assert!(ignore.is_ignored(Path::new("pkg/__pycache__")));
        assert!(!ignore.is_ignored(Path::new("a/notes.md")));
    }

    #[test]
    fn test_path_match() {
        let ignore = set(&["drafts/*.md"]);
        assert!(ignore.is_ignored(Path::new("drafts/x.md")));
        assert!(!ignore.is_ignored(Path::new("x.md")));
    }

    #[test]
    fn test_staging_files_always_ignored() {
        let ignore = IgnoreSet::default();
        assert!(ignore.is_ignored(Path::new("a/.nbsync-tmp-12-3")));
        assert!(!ignore.is_ignored(Path::new("a/b.md")));
    }
}
