//! Core data model: cells, notebooks, logical documents and change events.

mod cell;
mod document;
mod event;
pub mod notebook;
mod table;

pub use cell::{Cell, CodeCell};
pub use document::{
    DocState, DocumentKey, DocumentKind, LogicalDocument, Resolution, SideRecord,
};
pub use event::{ChangeEvent, ChangeKind, Side};
pub use notebook::{MultilineText, Notebook, NotebookCell};
pub use table::CorrespondenceTable;
