use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::disk;
use super::error::{FileError, FileResult};
use super::{PageId, PagerConfig};

/// A resident page
struct Frame {
    /// The page bytes, always `page_size` long
    data: Box<[u8]>,
    /// Whether the page changed since it was loaded or last flushed
    dirty: bool,
}

/// Bounded page cache over a single database file.
///
/// Slots are indexed by page number and never evicted. The file is opened
/// only for the duration of each load or flush.
///
/// All operations take `&mut self`, so at most one operation is in flight
/// per pager.
pub struct Pager {
    path: PathBuf,
    config: PagerConfig,
    /// File length as of open, extended by each successful flush
    file_length: u64,
    pages: Vec<Option<Frame>>,
}

impl Pager {
    /// Open the database file at `path` and set up an empty cache
    pub async fn open<P: AsRef<Path>>(path: P, config: PagerConfig) -> FileResult<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();

        let file_length = disk::probe_length(&path, config.open_mode).await?;
        info!(
            path = %path.display(),
            file_length,
            mode = ?config.open_mode,
            "opened database file"
        );

        let mut pages = Vec::with_capacity(config.max_pages);
        pages.resize_with(config.max_pages, || None);

        Ok(Self {
            path,
            config,
            file_length,
            pages,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &PagerConfig {
        &self.config
    }

    /// Length of the backing file in bytes
    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    /// Number of complete or partial pages present on disk
    pub fn page_count_on_disk(&self) -> usize {
        self.config.pages_in(self.file_length)
    }

    /// Get a page, loading it from disk on first access.
    ///
    /// Pages past the end of the file come back zero-filled without any I/O.
    pub async fn get_page(&mut self, page_id: PageId) -> FileResult<&mut [u8]> {
        if page_id >= self.config.max_pages {
            return Err(FileError::TableFull {
                page_id,
                max_pages: self.config.max_pages,
            });
        }

        if self.pages[page_id].is_none() {
            let frame = self.load_page(page_id).await?;
            self.pages[page_id] = Some(frame);
        }

        let frame = self.pages[page_id]
            .as_mut()
            .ok_or_else(|| FileError::Internal(format!("page {} vanished after load", page_id)))?;
        Ok(&mut frame.data)
    }

    /// Mark a resident page as modified
    pub fn mark_dirty(&mut self, page_id: PageId) -> FileResult<()> {
        let frame = self
            .pages
            .get_mut(page_id)
            .and_then(Option::as_mut)
            .ok_or_else(|| FileError::Internal(format!("page {} is not resident", page_id)))?;

        frame.dirty = true;
        Ok(())
    }

    /// Write a resident page to disk
    pub async fn flush(&mut self, page_id: PageId) -> FileResult<()> {
        let frame = self
            .pages
            .get(page_id)
            .and_then(Option::as_ref)
            .ok_or_else(|| {
                FileError::Internal(format!("flush of page {} which was never loaded", page_id))
            })?;

        let end = self.config.page_offset(page_id + 1)?;
        disk::write_page(&self.path, &self.config, page_id, &frame.data).await?;
        debug!(page_id, "flushed page");

        self.file_length = self.file_length.max(end);
        if let Some(frame) = self.pages[page_id].as_mut() {
            frame.dirty = false;
        }
        Ok(())
    }

    /// Write every dirty resident page to disk, lowest page first
    pub async fn flush_all(&mut self) -> FileResult<()> {
        let dirty: Vec<PageId> = self
            .pages
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.as_ref().is_some_and(|f| f.dirty))
            .map(|(page_id, _)| page_id)
            .collect();

        for page_id in dirty {
            self.flush(page_id).await?;
        }
        Ok(())
    }

    /// Check if a page is in the cache
    pub fn is_resident(&self, page_id: PageId) -> bool {
        self.pages.get(page_id).is_some_and(Option::is_some)
    }

    /// Number of pages currently in the cache
    pub fn resident_count(&self) -> usize {
        self.pages.iter().filter(|slot| slot.is_some()).count()
    }

    /// Number of resident pages with unflushed changes
    pub fn dirty_count(&self) -> usize {
        self.pages
            .iter()
            .filter(|slot| slot.as_ref().is_some_and(|f| f.dirty))
            .count()
    }

    async fn load_page(&self, page_id: PageId) -> FileResult<Frame> {
        let mut data = vec![0u8; self.config.page_size].into_boxed_slice();

        if page_id < self.page_count_on_disk() {
            let n = disk::read_page(&self.path, &self.config, page_id, &mut data).await?;
            debug!(page_id, bytes = n, "loaded page from disk");
        } else {
            debug!(page_id, "allocated new page");
        }

        Ok(Frame { data, dirty: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::OpenMode;
    use tempfile::TempDir;

    fn small_config() -> PagerConfig {
        PagerConfig {
            page_size: 64,
            max_pages: 4,
            open_mode: OpenMode::Preserve,
        }
    }

    async fn setup_test_env() -> (TempDir, Pager) {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("test.db");
        let pager = Pager::open(&path, small_config()).await.unwrap();
        (temp_dir, pager)
    }

    #[tokio::test]
    async fn test_open_nonexistent_creates_empty_file() {
        let (temp_dir, pager) = setup_test_env().await;

        assert_eq!(pager.file_length(), 0);
        assert_eq!(pager.page_count_on_disk(), 0);
        assert_eq!(pager.resident_count(), 0);
        assert!(temp_dir.path().join("test.db").exists());
    }

    #[tokio::test]
    async fn test_open_rejects_zero_page_size() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = PagerConfig {
            page_size: 0,
            ..small_config()
        };

        let result = Pager::open(temp_dir.path().join("test.db"), config).await;
        assert!(matches!(result, Err(FileError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_open_rejects_oversized_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("test.db");

        for config in [
            PagerConfig {
                max_pages: usize::MAX,
                ..small_config()
            },
            PagerConfig {
                page_size: usize::MAX / 2,
                ..small_config()
            },
        ] {
            let result = Pager::open(&path, config).await;
            assert!(matches!(result, Err(FileError::InvalidConfig(_))));
        }
        // Rejected before the file is touched
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_open_failure_is_ioerr_open() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("no_such_dir").join("test.db");

        let err = Pager::open(&path, small_config()).await.err().unwrap();
        assert_eq!(err.code(), "IOERR_OPEN");
    }

    #[tokio::test]
    async fn test_get_page_new_is_zeroed() {
        let (_temp_dir, mut pager) = setup_test_env().await;

        let page = pager.get_page(2).await.unwrap();
        assert_eq!(page.len(), 64);
        assert!(page.iter().all(|&b| b == 0));
        assert!(pager.is_resident(2));
        assert!(!pager.is_resident(0));
    }

    #[tokio::test]
    async fn test_get_page_cached() {
        let (_temp_dir, mut pager) = setup_test_env().await;

        pager.get_page(0).await.unwrap()[5] = 42;
        let first = pager.get_page(0).await.unwrap().to_vec();
        let second = pager.get_page(0).await.unwrap().to_vec();

        assert_eq!(first, second);
        assert_eq!(first[5], 42);
        assert_eq!(pager.resident_count(), 1);
    }

    #[tokio::test]
    async fn test_get_page_table_full() {
        let (temp_dir, mut pager) = setup_test_env().await;

        for page_id in [4, 5, 1000] {
            let err = pager.get_page(page_id).await.err().unwrap();
            assert!(matches!(err, FileError::TableFull { max_pages: 4, .. }));
            assert_eq!(err.code(), "TABLE_FULL");
        }
        assert_eq!(pager.resident_count(), 0);
        assert_eq!(
            std::fs::metadata(temp_dir.path().join("test.db")).unwrap().len(),
            0
        );
    }

    #[tokio::test]
    async fn test_flush_unloaded_page_is_internal() {
        let (temp_dir, mut pager) = setup_test_env().await;

        let err = pager.flush(1).await.err().unwrap();
        assert!(matches!(err, FileError::Internal(_)));
        assert_eq!(err.code(), "CYBERLITE_INTERNAL");
        assert_eq!(
            std::fs::metadata(temp_dir.path().join("test.db")).unwrap().len(),
            0
        );

        // Out of range page numbers have nothing resident either
        let err = pager.flush(99).await.err().unwrap();
        assert!(matches!(err, FileError::Internal(_)));
    }

    #[tokio::test]
    async fn test_flush_zero_page_writes_exact_length() {
        let (temp_dir, mut pager) = setup_test_env().await;
        let path = temp_dir.path().join("test.db");

        pager.get_page(0).await.unwrap();
        pager.flush(0).await.unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 64);
        assert_eq!(pager.file_length(), 64);

        let mut reopened = Pager::open(&path, small_config()).await.unwrap();
        let page = reopened.get_page(0).await.unwrap();
        assert_eq!(page, &[0u8; 64][..]);
    }

    #[tokio::test]
    async fn test_flush_persists_across_instances() {
        let (temp_dir, mut pager) = setup_test_env().await;
        let path = temp_dir.path().join("test.db");

        {
            let page = pager.get_page(1).await.unwrap();
            page[0] = 11;
            page[63] = 22;
        }
        pager.flush(1).await.unwrap();
        assert_eq!(pager.page_count_on_disk(), 2);

        let mut reopened = Pager::open(&path, small_config()).await.unwrap();
        assert_eq!(reopened.file_length(), 128);
        let page = reopened.get_page(1).await.unwrap();
        assert_eq!(page[0], 11);
        assert_eq!(page[63], 22);
        assert!(reopened.get_page(0).await.unwrap().iter().all(|&b| b == 0));
    }

    #[tokio::test]
    async fn test_truncate_mode_discards_content() {
        let (temp_dir, mut pager) = setup_test_env().await;
        let path = temp_dir.path().join("test.db");

        pager.get_page(0).await.unwrap()[0] = 1;
        pager.flush(0).await.unwrap();

        let config = PagerConfig {
            open_mode: OpenMode::Truncate,
            ..small_config()
        };
        let mut fresh = Pager::open(&path, config).await.unwrap();
        assert_eq!(fresh.file_length(), 0);
        assert_eq!(fresh.get_page(0).await.unwrap()[0], 0);
    }

    #[tokio::test]
    async fn test_mark_dirty_and_flush_all() {
        let (_temp_dir, mut pager) = setup_test_env().await;

        assert!(matches!(pager.mark_dirty(0), Err(FileError::Internal(_))));

        for page_id in 0..3 {
            pager.get_page(page_id).await.unwrap()[0] = page_id as u8 + 1;
        }
        pager.mark_dirty(0).unwrap();
        pager.mark_dirty(2).unwrap();
        assert_eq!(pager.dirty_count(), 2);

        pager.flush_all().await.unwrap();
        assert_eq!(pager.dirty_count(), 0);
        assert_eq!(pager.file_length(), 3 * 64);

        let mut reopened = Pager::open(pager.path(), small_config()).await.unwrap();
        assert_eq!(reopened.get_page(0).await.unwrap()[0], 1);
        // Page 1 was never marked dirty, so only its hole exists on disk
        assert_eq!(reopened.get_page(1).await.unwrap()[0], 0);
        assert_eq!(reopened.get_page(2).await.unwrap()[0], 3);
    }

    #[tokio::test]
    async fn test_partial_trailing_page_counts_as_on_disk() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("test.db");
        std::fs::write(&path, [5u8; 70]).unwrap();

        let mut pager = Pager::open(&path, small_config()).await.unwrap();
        assert_eq!(pager.page_count_on_disk(), 2);

        let page = pager.get_page(1).await.unwrap();
        assert_eq!(&page[..6], &[5u8; 6]);
        assert!(page[6..].iter().all(|&b| b == 0));
    }
}
