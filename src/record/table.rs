use tracing::debug;

use super::error::{RecordError, RecordResult};
use super::row::{ID_SIZE, Row, RowLayout};
use crate::file::{PageId, Pager};

/// Location of a row inside the page store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowSlot {
    pub page_id: PageId,
    pub byte_offset: usize,
}

/// A single table of fixed-width rows stored back to back.
///
/// Row `n` lives on page `n / rows_per_page` at byte offset
/// `(n % rows_per_page) * row_size`. The table keeps no page buffers of its
/// own; every access goes through the pager.
pub struct Table {
    pager: Pager,
    layout: RowLayout,
    rows_per_page: usize,
    max_rows: usize,
    num_rows: usize,
}

impl Table {
    /// Create an empty table over `pager`
    pub fn new(pager: Pager, layout: RowLayout) -> RecordResult<Self> {
        let page_size = pager.config().page_size;
        if layout
            .username_size
            .checked_add(layout.email_size)
            .and_then(|n| n.checked_add(ID_SIZE))
            .is_none()
        {
            return Err(RecordError::InvalidLayout(format!(
                "column widths {} + {} overflow",
                layout.username_size, layout.email_size
            )));
        }

        let rows_per_page = page_size / layout.row_size();
        if rows_per_page == 0 {
            return Err(RecordError::InvalidLayout(format!(
                "row size {} is too large for page size {}",
                layout.row_size(),
                page_size
            )));
        }

        let max_rows = rows_per_page
            .checked_mul(pager.config().max_pages)
            .ok_or_else(|| {
                RecordError::InvalidLayout(format!(
                    "{} rows per page over {} pages overflows",
                    rows_per_page,
                    pager.config().max_pages
                ))
            })?;

        Ok(Self {
            pager,
            layout,
            rows_per_page,
            max_rows,
            num_rows: 0,
        })
    }

    /// Open a table over a pager whose file may already hold rows.
    ///
    /// The row count is recovered by scanning on-disk slots up to the first
    /// all-zero one. Rows are only found if every page before them was
    /// persisted too, which [`Table::flush`] guarantees by writing all dirty
    /// pages together. A file whose earlier pages were never written (only a
    /// later page flushed through the pager directly) loads with its rows cut
    /// off at the first unwritten page.
    pub async fn load(pager: Pager, layout: RowLayout) -> RecordResult<Self> {
        let mut table = Self::new(pager, layout)?;

        let pages_on_disk = table.pager.page_count_on_disk();
        let limit = pages_on_disk
            .min(table.pager.config().max_pages)
            .saturating_mul(table.rows_per_page)
            .min(table.max_rows);
        let row_size = table.layout.row_size();

        let mut num_rows = 0;
        while num_rows < limit {
            let slot = table.row_slot(num_rows);
            let page = table.pager.get_page(slot.page_id).await?;
            let bytes = &page[slot.byte_offset..slot.byte_offset + row_size];
            if bytes.iter().all(|&b| b == 0) {
                break;
            }
            num_rows += 1;
        }

        debug!(num_rows, pages_on_disk, "loaded table");
        table.num_rows = num_rows;
        Ok(table)
    }

    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    /// Number of rows currently in the table
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Capacity of the table across all addressable pages
    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Page and byte offset where row `row_num` is stored
    pub fn row_slot(&self, row_num: usize) -> RowSlot {
        RowSlot {
            page_id: row_num / self.rows_per_page,
            byte_offset: (row_num % self.rows_per_page) * self.layout.row_size(),
        }
    }

    /// Append a row, returning its row number.
    ///
    /// The page is left dirty in the cache; nothing reaches disk until a
    /// flush.
    pub async fn insert_row(&mut self, row: &Row) -> RecordResult<usize> {
        row.validate(&self.layout)?;
        if self.num_rows >= self.max_rows {
            return Err(RecordError::TableFull(self.max_rows));
        }

        let row_num = self.num_rows;
        let slot = self.row_slot(row_num);
        let row_size = self.layout.row_size();

        let page = self.pager.get_page(slot.page_id).await?;
        row.serialize_into(
            &self.layout,
            &mut page[slot.byte_offset..slot.byte_offset + row_size],
        )?;
        self.pager.mark_dirty(slot.page_id)?;

        self.num_rows += 1;
        Ok(row_num)
    }

    /// Read back row `row_num`
    pub async fn read_row(&mut self, row_num: usize) -> RecordResult<Row> {
        if row_num >= self.num_rows {
            return Err(RecordError::RowOutOfRange {
                row: row_num,
                num_rows: self.num_rows,
            });
        }

        let slot = self.row_slot(row_num);
        let row_size = self.layout.row_size();
        let page = self.pager.get_page(slot.page_id).await?;
        Row::deserialize(
            &page[slot.byte_offset..slot.byte_offset + row_size],
            &self.layout,
        )
    }

    /// All rows in insertion order
    pub async fn rows(&mut self) -> RecordResult<Vec<Row>> {
        let mut rows = Vec::with_capacity(self.num_rows);
        for row_num in 0..self.num_rows {
            rows.push(self.read_row(row_num).await?);
        }
        Ok(rows)
    }

    /// Persist every modified page.
    ///
    /// This is the only way the table writes to disk, so the persisted pages
    /// always form a prefix without holes that [`Table::load`] can scan.
    pub async fn flush(&mut self) -> RecordResult<()> {
        self.pager.flush_all().await?;
        Ok(())
    }
}
