use crate::file::FileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Column {column} is {actual} bytes, max is {max}")]
    StringTooLong {
        column: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("Column {0} contains a NUL byte")]
    EmbeddedNul(&'static str),

    #[error("Row encodes to all zero bytes")]
    EmptyRow,

    #[error("Table full: max_rows={0}")]
    TableFull(usize),

    #[error("Row out of range: row={row}, num_rows={num_rows}")]
    RowOutOfRange { row: usize, num_rows: usize },

    #[error("Invalid row layout: {0}")]
    InvalidLayout(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl RecordError {
    /// Errors from the page store leave the cache in an unknown state
    pub fn is_fatal(&self) -> bool {
        matches!(self, RecordError::File(_))
    }
}

pub type RecordResult<T> = Result<T, RecordError>;
