//! Conflict resolution.

use chrono::{DateTime, Utc};

use crate::config::SyncPolicy;
use crate::io::is_newer;
use crate::model::{Resolution, Side};

/// Picks the side whose content wins when both sides changed.
///
/// In one-way mode the authoritative side always wins. Otherwise a fixed
/// preference wins, or for `newer` the later modification time, with times
/// inside the threshold going to the source side.
pub fn resolve(
    policy: &SyncPolicy,
    source_mtime: DateTime<Utc>,
    target_mtime: DateTime<Utc>,
) -> Resolution {
    let winner = policy
        .authority
        .or_else(|| policy.conflict.fixed_side())
        .unwrap_or_else(|| {
            if is_newer(target_mtime, source_mtime, policy.time_threshold) {
                Side::Target
            } else {
                Side::Source
            }
        });

    Resolution {
        winner,
        strategy: policy.conflict,
        source_mtime: Some(source_mtime),
        target_mtime: Some(target_mtime),
    }
}
