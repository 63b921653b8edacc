//! Local completion check for idempotent reruns.

use std::path::Path;

use tracing::trace;

/// Returns true when `path` is an existing regular file of exactly `expected_size` bytes.
///
/// A missing file, a directory or an unreadable entry all count as incomplete.
pub async fn is_complete(path: &Path, expected_size: u64) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            let complete = metadata.is_file() && metadata.len() == expected_size;
            trace!(
                path = %path.display(),
                local_size = metadata.len(),
                expected_size,
                complete,
                "completion check"
            );
            complete
        }
        Err(_) => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_is_complete_exact_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.dat");
        std::fs::write(&path, vec![0_u8; 100]).unwrap();
        assert!(is_complete(&path, 100).await);
    }

    #[tokio::test]
    async fn test_is_complete_size_off_by_one() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.dat");
        std::fs::write(&path, vec![0_u8; 99]).unwrap();
        assert!(!is_complete(&path, 100).await);
        assert!(!is_complete(&path, 98).await);
    }

    #[tokio::test]
    async fn test_is_complete_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(!is_complete(&dir.path().join("absent.dat"), 0).await);
    }

    #[tokio::test]
    async fn test_is_complete_directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("a.dat");
        std::fs::create_dir(&sub).unwrap();
        assert!(!is_complete(&sub, 0).await);
    }

    #[test]
    fn test_is_complete_empty_file_of_zero_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.dat");
        std::fs::write(&path, b"").unwrap();
        assert!(tokio_test::block_on(is_complete(&path, 0)));
    }
}
