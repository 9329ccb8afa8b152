//! Ordered map of logical documents.

use indexmap::IndexMap;

use super::document::{DocState, DocumentKey, LogicalDocument};

/// All logical documents, keyed by document key, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CorrespondenceTable {
    docs: IndexMap<DocumentKey, LogicalDocument>,
}

impl CorrespondenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &DocumentKey) -> Option<&LogicalDocument> {
        self.docs.get(key)
    }

    pub fn get_mut(&mut self, key: &DocumentKey) -> Option<&mut LogicalDocument> {
        self.docs.get_mut(key)
    }

    pub fn contains(&self, key: &DocumentKey) -> bool {
        self.docs.contains_key(key)
    }

    /// Returns the document for `key`, creating an unsynced one if needed.
    pub fn get_or_insert(&mut self, key: &DocumentKey) -> &mut LogicalDocument {
        self.docs
            .entry(key.clone())
            .or_insert_with(|| LogicalDocument::new(key.clone()))
    }

    pub fn insert(&mut self, doc: LogicalDocument) {
        self.docs.insert(doc.key.clone(), doc);
    }

    pub fn remove(&mut self, key: &DocumentKey) -> Option<LogicalDocument> {
        self.docs.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogicalDocument> {
        self.docs.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &DocumentKey> {
        self.docs.keys()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Number of documents currently in `state`.
    pub fn count(&self, state: DocState) -> usize {
        self.docs.values().filter(|d| d.state == state).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_insert_is_unique() {
        let mut table = CorrespondenceTable::new();
        let key = DocumentKey::file("a");

        table.get_or_insert(&key).state = DocState::Synced;
        table.get_or_insert(&key);

        assert_eq!(table.len(), 1);
        assert_eq!(table.count(DocState::Synced), 1);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut table = CorrespondenceTable::new();
        for stem in ["a", "b", "c"] {
            table.get_or_insert(&DocumentKey::file(stem));
        }
        table.remove(&DocumentKey::file("b"));

        let stems: Vec<_> = table.keys().map(|k| k.to_string()).collect();
        assert_eq!(stems, vec!["a", "c"]);
    }
}
