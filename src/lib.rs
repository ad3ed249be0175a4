pub mod file;
pub mod record;
pub mod statement;

pub use file::{
    FileError, FileResult, MAX_PAGE_SIZE, MAX_TABLE_PAGES, OpenMode, PAGE_SIZE, PageId, Pager,
    PagerConfig, TABLE_MAX_PAGES,
};
pub use record::{
    EMAIL_SIZE, ID_SIZE, RecordError, RecordResult, Row, RowLayout, RowSlot, Table, USERNAME_SIZE,
};
pub use statement::{Input, MetaCommand, Outcome, PrepareError, Statement};
