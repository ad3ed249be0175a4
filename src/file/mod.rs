mod disk;
mod error;
mod pager;

pub use error::{FileError, FileResult};
pub use pager::Pager;

/// Page size in bytes (4KB)
pub const PAGE_SIZE: usize = 4096;

/// Maximum number of pages a single table file can address
pub const TABLE_MAX_PAGES: usize = 100;

/// Largest accepted page size (64MB)
pub const MAX_PAGE_SIZE: usize = 1 << 26;

/// Largest accepted page count for a single table file
pub const MAX_TABLE_PAGES: usize = 1 << 20;

/// Page number type
pub type PageId = usize;

/// What `Pager::open` does with an existing database file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Keep existing content (reopen a persisted store)
    #[default]
    Preserve,
    /// Discard existing content (fresh store)
    Truncate,
}

/// Page store configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerConfig {
    pub page_size: usize,
    pub max_pages: usize,
    pub open_mode: OpenMode,
}

impl PagerConfig {
    /// Byte offset of a page within the backing file
    pub fn page_offset(&self, page_id: PageId) -> FileResult<u64> {
        (page_id as u64)
            .checked_mul(self.page_size as u64)
            .ok_or_else(|| FileError::Internal(format!("offset of page {} overflows", page_id)))
    }

    /// Number of complete or partial pages in a file of `file_length` bytes
    pub fn pages_in(&self, file_length: u64) -> usize {
        file_length.div_ceil(self.page_size as u64) as usize
    }

    pub(crate) fn validate(&self) -> FileResult<()> {
        if self.page_size == 0 {
            return Err(FileError::InvalidConfig("page_size must be non-zero".to_string()));
        }
        if self.max_pages == 0 {
            return Err(FileError::InvalidConfig("max_pages must be non-zero".to_string()));
        }
        if self.page_size > MAX_PAGE_SIZE {
            return Err(FileError::InvalidConfig(format!(
                "page_size {} exceeds {}",
                self.page_size, MAX_PAGE_SIZE
            )));
        }
        if self.max_pages > MAX_TABLE_PAGES {
            return Err(FileError::InvalidConfig(format!(
                "max_pages {} exceeds {}",
                self.max_pages, MAX_TABLE_PAGES
            )));
        }
        // The end offset of the last page must be addressable
        if (self.max_pages as u64)
            .checked_mul(self.page_size as u64)
            .is_none_or(|end| end > i64::MAX as u64)
        {
            return Err(FileError::InvalidConfig(format!(
                "{} pages of {} bytes overflow the file offset range",
                self.max_pages, self.page_size
            )));
        }
        Ok(())
    }
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            max_pages: TABLE_MAX_PAGES,
            open_mode: OpenMode::default(),
        }
    }
}
