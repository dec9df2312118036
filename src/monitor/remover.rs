//! Part removal seam

use async_trait::async_trait;
use std::path::Path;

/// Removes a consumed part from disk
///
/// The default [`FsPartRemover`] deletes the file. Alternative implementations
/// can move parts to a trash folder, or inject failures in tests.
#[async_trait]
pub trait PartRemover: Send + Sync {
    /// Remove the part at `path`
    async fn remove(&self, path: &Path) -> std::io::Result<()>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Deletes parts with `tokio::fs::remove_file`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsPartRemover;

#[async_trait]
impl PartRemover for FsPartRemover {
    async fn remove(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}
