mod error;
mod row;
mod table;

pub use error::{RecordError, RecordResult};
pub use row::{EMAIL_SIZE, ID_SIZE, Row, RowLayout, USERNAME_SIZE};
pub use table::{RowSlot, Table};
