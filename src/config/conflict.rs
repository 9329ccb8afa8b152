//! Conflict strategy, sync direction and watch backend selection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Side;

/// How to pick a winner when both sides of a document changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    /// The side with the later modification time wins.
    #[default]
    Newer,

    /// The Markdown side always wins.
    #[serde(rename = "md", alias = "source", alias = "prefer-source")]
    PreferSource,

    /// The notebook side always wins.
    #[serde(rename = "ipynb", alias = "target", alias = "prefer-target")]
    PreferTarget,
}

impl ConflictStrategy {
    /// Returns the side this strategy always prefers, if it is a fixed preference.
    pub fn fixed_side(&self) -> Option<Side> {
        match self {
            ConflictStrategy::Newer => None,
            ConflictStrategy::PreferSource => Some(Side::Source),
            ConflictStrategy::PreferTarget => Some(Side::Target),
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictStrategy::Newer => write!(f, "newer"),
            ConflictStrategy::PreferSource => write!(f, "prefer-source"),
            ConflictStrategy::PreferTarget => write!(f, "prefer-target"),
        }
    }
}

/// Authoritative direction used when bidirectional sync is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    /// Markdown is authoritative.
    #[default]
    #[serde(alias = "source_to_target")]
    MdToIpynb,

    /// Notebooks are authoritative.
    #[serde(alias = "target_to_source")]
    IpynbToMd,
}

impl SyncDirection {
    /// The side whose changes are propagated.
    pub fn authority(&self) -> Side {
        match self {
            SyncDirection::MdToIpynb => Side::Source,
            SyncDirection::IpynbToMd => Side::Target,
        }
    }
}

/// Mechanism used to observe one root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchBackend {
    /// OS change notifications.
    #[default]
    Native,

    /// Periodic re-stat of the whole tree.
    Poll,
}
