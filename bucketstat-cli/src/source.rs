//! File-backed log source
//!
//! Reads a local access log file and hands it to the pipeline as raw bytes.
//! Stands in for an object-store client in local / batch usage.

use bytes::Bytes;

use bucketstat_core::error::{BucketstatError, SourceError};
use bucketstat_core::pipeline::LogSource;

/// [`LogSource`] implementation backed by the local filesystem.
///
/// The `key` passed to [`LogSource::fetch`] is interpreted as a file path.
pub struct FileLogSource;

impl FileLogSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileLogSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSource for FileLogSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self, key: &str) -> Result<Bytes, BucketstatError> {
        let content = tokio::fs::read(key).await.map_err(|e| {
            BucketstatError::Source(SourceError::Unavailable {
                key: key.to_owned(),
                reason: e.to_string(),
            })
        })?;
        Ok(Bytes::from(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_fetch_reads_file_contents() {
        let mut file = tempfile::NamedTempFile::new().expect("should create temp file");
        write!(file, "line one\nline two\n").expect("should write");

        let source = FileLogSource::new();
        let bytes = source
            .fetch(file.path().to_str().expect("utf-8 path"))
            .await
            .expect("fetch should succeed");

        assert_eq!(&bytes[..], b"line one\nline two\n");
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_source_error() {
        let source = FileLogSource::new();
        let result = source.fetch("/nonexistent/access.log").await;
        assert!(matches!(
            result,
            Err(BucketstatError::Source(SourceError::Unavailable { .. }))
        ));
    }
}
