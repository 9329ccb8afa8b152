//! File statistics, hashing and modification-time handling.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

/// File statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    /// Modification time.
    pub mtime: DateTime<Utc>,
    /// File size in bytes.
    pub size: u64,
    pub is_dir: bool,
}

impl Stat {
    /// Gets the stat for a file or directory.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let mtime = metadata.modified()?.into();
        Ok(Self {
            mtime,
            size: metadata.len(),
            is_dir: metadata.is_dir(),
        })
    }
}

/// Computes SHA256 hash of a string, returning hex-encoded digest.
pub fn hexdigest_str(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Computes SHA256 hash of a file, returning hex-encoded digest.
pub fn hexdigest_file(path: &Path) -> io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Sets the modification time of a file.
pub fn set_mtime(path: &Path, mtime: DateTime<Utc>) -> io::Result<()> {
    let file = fs::File::options().write(true).open(path)?;
    file.set_modified(SystemTime::from(mtime))
}

/// True if `candidate` is later than `reference` by more than `threshold`.
pub fn is_newer(candidate: DateTime<Utc>, reference: DateTime<Utc>, threshold: Duration) -> bool {
    candidate - reference > threshold
}

/// True if the two instants differ by at most `threshold`.
pub fn within_threshold(a: DateTime<Utc>, b: DateTime<Utc>, threshold: Duration) -> bool {
    (a - b).abs() <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{at, base_time};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_hexdigest_str() {
        let hash = hexdigest_str("hello world");
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_hexdigest_file_matches_str() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.md");

        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"hello world").unwrap();

        assert_eq!(hexdigest_file(&path).unwrap(), hexdigest_str("hello world"));
    }

    #[test]
    fn test_set_mtime() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "x").unwrap();

        set_mtime(&path, base_time()).unwrap();
        let stat = Stat::from_path(&path).unwrap();
        assert_eq!(stat.mtime, base_time());
        assert_eq!(stat.size, 1);
        assert!(!stat.is_dir);
    }

    #[test]
    fn test_is_newer_threshold_boundaries() {
        let threshold = Duration::seconds(3);
        let reference = base_time();
        let ms = Duration::milliseconds;

        assert!(!is_newer(reference + threshold - ms(1), reference, threshold));
        assert!(!is_newer(reference + threshold, reference, threshold));
        assert!(is_newer(reference + threshold + ms(1), reference, threshold));
        assert!(!is_newer(reference, reference + threshold + ms(1), threshold));
    }

    #[test]
    fn test_within_threshold() {
        let threshold = Duration::seconds(3);
        assert!(within_threshold(at(0), at(3), threshold));
        assert!(within_threshold(at(3), at(0), threshold));
        assert!(!within_threshold(at(0), at(4), threshold));
    }
}
