//! Filesystem utilities for thumbnail output.

use std::io::Write;
use std::path::Path;

use crate::error::{MediaError, MediaResult};

/// Create `dir` (and parents) if it does not exist and check it is a directory.
pub async fn ensure_dir(dir: impl AsRef<Path>) -> MediaResult<()> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;

    let metadata = tokio::fs::metadata(dir).await?;
    if !metadata.is_dir() {
        return Err(MediaError::InvalidArgument(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    Ok(())
}

/// Write `bytes` to `dst` through a temp file in the same directory.
///
/// Readers never observe a half-written file; the temp file is removed if
/// the final rename fails.
pub fn write_atomic(dst: &Path, bytes: &[u8]) -> MediaResult<()> {
    let tmp_dst = dst.with_extension("tmp");

    {
        let mut file = std::fs::File::create(&tmp_dst)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    std::fs::rename(&tmp_dst, dst).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_dst);
        tracing::error!(
            "Failed to rename temp file: {} -> {}: {}",
            tmp_dst.display(),
            dst.display(),
            e
        );
        MediaError::from(e)
    })
}
