//! Scoped access to the backing file.
//!
//! Every function opens its own handle and drops it before returning, on the
//! success path and on every error path alike. No descriptor is held across
//! calls.

use std::io::SeekFrom;
use std::path::Path;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use super::error::{FileError, FileResult};
use super::{OpenMode, PageId, PagerConfig};

/// Open (creating if needed) the file and return its length in bytes
pub(super) async fn probe_length(path: &Path, mode: OpenMode) -> FileResult<u64> {
    let open_err = |source| FileError::Open {
        path: path.to_path_buf(),
        source,
    };

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(mode == OpenMode::Truncate)
        .open(path)
        .await
        .map_err(open_err)?;

    let metadata = file.metadata().await.map_err(open_err)?;
    Ok(metadata.len())
}

/// Read up to one page into `buffer`, returning the number of bytes read.
///
/// Bytes past a short read are left untouched, so callers hand in a
/// zero-filled buffer.
pub(super) async fn read_page(
    path: &Path,
    config: &PagerConfig,
    page_id: PageId,
    buffer: &mut [u8],
) -> FileResult<usize> {
    let read_err = |source| FileError::Read { page_id, source };

    let offset = config.page_offset(page_id)?;
    let mut file = File::open(path).await.map_err(read_err)?;
    file.seek(SeekFrom::Start(offset)).await.map_err(read_err)?;

    let mut filled = 0;
    while filled < buffer.len() {
        let n = file.read(&mut buffer[filled..]).await.map_err(read_err)?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    Ok(filled)
}

/// Write exactly one page at its offset
pub(super) async fn write_page(
    path: &Path,
    config: &PagerConfig,
    page_id: PageId,
    buffer: &[u8],
) -> FileResult<()> {
    if buffer.len() != config.page_size {
        return Err(FileError::Internal(format!(
            "page {} buffer is {} bytes, expected {}",
            page_id,
            buffer.len(),
            config.page_size
        )));
    }

    let offset = config.page_offset(page_id)?;
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .open(path)
        .await
        .map_err(|source| FileError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let write_err = |source| FileError::Write { page_id, source };
    file.seek(SeekFrom::Start(offset)).await.map_err(write_err)?;
    file.write_all(buffer).await.map_err(write_err)?;
    // tokio completes file writes in the background; wait for them before the
    // handle is dropped so failures surface here
    file.flush().await.map_err(write_err)?;

    Ok(())
}
