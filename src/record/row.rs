use std::fmt;

use super::error::{RecordError, RecordResult};

/// Width of the id column in bytes
pub const ID_SIZE: usize = size_of::<u32>();
/// Default width of the username column in bytes
pub const USERNAME_SIZE: usize = 32;
/// Default width of the email column in bytes
pub const EMAIL_SIZE: usize = 255;

/// Fixed byte layout of a row: `[id][username][email]`, strings zero-padded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    pub username_size: usize,
    pub email_size: usize,
}

impl RowLayout {
    pub fn new(username_size: usize, email_size: usize) -> Self {
        Self {
            username_size,
            email_size,
        }
    }

    pub fn id_offset(&self) -> usize {
        0
    }

    pub fn username_offset(&self) -> usize {
        self.id_offset() + ID_SIZE
    }

    pub fn email_offset(&self) -> usize {
        self.username_offset() + self.username_size
    }

    /// Total bytes occupied by one row
    pub fn row_size(&self) -> usize {
        ID_SIZE + self.username_size + self.email_size
    }
}

impl Default for RowLayout {
    fn default() -> Self {
        Self::new(USERNAME_SIZE, EMAIL_SIZE)
    }
}

/// A single row of the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u32,
    pub username: String,
    pub email: String,
}

impl Row {
    pub fn new(id: u32, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
        }
    }

    /// Check the row fits the layout and can be told apart from an empty slot
    pub fn validate(&self, layout: &RowLayout) -> RecordResult<()> {
        check_column("username", &self.username, layout.username_size)?;
        check_column("email", &self.email, layout.email_size)?;

        if self.id == 0 && self.username.is_empty() && self.email.is_empty() {
            return Err(RecordError::EmptyRow);
        }
        Ok(())
    }

    /// Encode the row into `dest`, which must be exactly `row_size` bytes
    pub fn serialize_into(&self, layout: &RowLayout, dest: &mut [u8]) -> RecordResult<()> {
        self.validate(layout)?;
        if dest.len() != layout.row_size() {
            return Err(RecordError::InvalidLayout(format!(
                "row slot is {} bytes, expected {}",
                dest.len(),
                layout.row_size()
            )));
        }

        let id_off = layout.id_offset();
        let username_off = layout.username_offset();
        let email_off = layout.email_offset();

        dest[id_off..id_off + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());
        write_padded(&mut dest[username_off..email_off], &self.username);
        write_padded(&mut dest[email_off..], &self.email);
        Ok(())
    }

    /// Decode a row from exactly `row_size` bytes
    pub fn deserialize(data: &[u8], layout: &RowLayout) -> RecordResult<Self> {
        if data.len() != layout.row_size() {
            return Err(RecordError::Deserialization(format!(
                "Expected {} bytes, got {}",
                layout.row_size(),
                data.len()
            )));
        }

        let id_off = layout.id_offset();
        let username_off = layout.username_offset();
        let email_off = layout.email_offset();

        let id = u32::from_le_bytes([
            data[id_off],
            data[id_off + 1],
            data[id_off + 2],
            data[id_off + 3],
        ]);

        Ok(Self {
            id,
            username: read_padded("username", &data[username_off..email_off])?,
            email: read_padded("email", &data[email_off..])?,
        })
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

fn check_column(column: &'static str, value: &str, max: usize) -> RecordResult<()> {
    if value.len() > max {
        return Err(RecordError::StringTooLong {
            column,
            max,
            actual: value.len(),
        });
    }
    // A NUL would end the string early on decode
    if value.as_bytes().contains(&0) {
        return Err(RecordError::EmbeddedNul(column));
    }
    Ok(())
}

fn write_padded(dest: &mut [u8], value: &str) {
    let bytes = value.as_bytes();
    dest[..bytes.len()].copy_from_slice(bytes);
    dest[bytes.len()..].fill(0);
}

fn read_padded(column: &str, bytes: &[u8]) -> RecordResult<String> {
    // Find the first null byte (string terminator)
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8(bytes[..end].to_vec())
        .map_err(|e| RecordError::Deserialization(format!("Invalid UTF-8 in {}: {}", column, e)))
}
