use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::PageId;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("Cannot open database file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot read page {page_id}: {source}")]
    Read {
        page_id: PageId,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write page {page_id}: {source}")]
    Write {
        page_id: PageId,
        #[source]
        source: io::Error,
    },

    #[error("Table full: page_id={page_id}, max_pages={max_pages}")]
    TableFull { page_id: PageId, max_pages: usize },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FileError {
    /// Stable status code reported by the shell
    pub fn code(&self) -> &'static str {
        match self {
            FileError::Open { .. } => "IOERR_OPEN",
            FileError::Read { .. } => "IOERR_READ",
            FileError::Write { .. } => "IOERR_WRITE",
            FileError::TableFull { .. } => "TABLE_FULL",
            FileError::Internal(_) => "CYBERLITE_INTERNAL",
            FileError::InvalidConfig(_) => "CYBERLITE_CONFIG",
        }
    }
}

pub type FileResult<T> = Result<T, FileError>;
