//! Table - a dense array of fixed-size rows laid over the pager.
//!
//! Row `i` lives on page `i / ROWS_PER_PAGE` at byte offset
//! `(i % ROWS_PER_PAGE) * ROW_SIZE`. Rows `[0, num_rows)` are always
//! populated; there are no gaps and no deletes.

use std::ops::Range;
use std::path::Path;

use tracing::{debug, trace};

use crate::error::{ExecuteError, Result};
use crate::pager::Pager;
use crate::row::Row;
use crate::{PAGE_SIZE, ROW_SIZE, ROWS_PER_PAGE, TABLE_MAX_ROWS};

/// Where a logical row index is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowSlot {
    pub page_num: usize,
    pub byte_offset: usize,
}

impl RowSlot {
    pub const fn for_row(row_num: usize) -> Self {
        Self {
            page_num: row_num / ROWS_PER_PAGE,
            byte_offset: (row_num % ROWS_PER_PAGE) * ROW_SIZE,
        }
    }

    /// Byte range of the slot inside its page.
    pub const fn range(&self) -> Range<usize> {
        self.byte_offset..self.byte_offset + ROW_SIZE
    }
}

pub struct Table {
    pager: Pager,
    num_rows: usize,
}

impl Table {
    /// Open the table stored at `path`, creating an empty one if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let pager = Pager::open(path)?;
        let num_rows = rows_in_file(pager.file_length());

        debug!(num_rows, "opened table");
        Ok(Self { pager, num_rows })
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.num_rows >= TABLE_MAX_ROWS
    }

    /// Borrow the bytes backing `row_num`, loading its page if necessary.
    pub fn row_slot(&mut self, row_num: usize) -> Result<&mut [u8]> {
        let slot = RowSlot::for_row(row_num);
        trace!(
            row_num,
            page_num = slot.page_num,
            byte_offset = slot.byte_offset,
            "resolved row slot"
        );

        let page = self.pager.get_page(slot.page_num)?;
        Ok(&mut page.as_mut_slice()[slot.range()])
    }

    /// Append a row. Fails with `TableFull` before touching any page.
    pub fn insert_row(&mut self, row: &Row) -> std::result::Result<(), ExecuteError> {
        if self.is_full() {
            return Err(ExecuteError::TableFull);
        }

        row.serialize(self.row_slot(self.num_rows)?);
        self.num_rows += 1;
        Ok(())
    }

    /// Iterate over every stored row in insertion order.
    pub fn rows(&mut self) -> Rows<'_> {
        Rows {
            table: self,
            next: 0,
        }
    }

    /// Write every populated page back to disk and close the file.
    ///
    /// Full pages are written whole; the trailing partial page only up to
    /// its last row.
    pub fn close(mut self) -> Result<()> {
        let num_full_pages = self.num_rows / ROWS_PER_PAGE;

        for page_num in 0..num_full_pages {
            if !self.pager.is_loaded(page_num) {
                continue;
            }
            self.pager.flush(page_num, PAGE_SIZE)?;
            self.pager.release(page_num);
        }

        let num_additional_rows = self.num_rows % ROWS_PER_PAGE;
        if num_additional_rows > 0 && self.pager.is_loaded(num_full_pages) {
            self.pager.flush(num_full_pages, num_additional_rows * ROW_SIZE)?;
            self.pager.release(num_full_pages);
        }

        debug!(num_rows = self.num_rows, "closing table");
        self.pager.close()
    }
}

/// Number of rows a file of `file_length` bytes holds.
///
/// Full pages are flushed as `PAGE_SIZE` bytes, so the slack at the end of
/// each full page must not be counted as a row.
fn rows_in_file(file_length: u64) -> usize {
    let file_length = file_length as usize;
    let full_pages = file_length / PAGE_SIZE;
    let tail_rows = ((file_length % PAGE_SIZE) / ROW_SIZE).min(ROWS_PER_PAGE);

    (full_pages * ROWS_PER_PAGE + tail_rows).min(TABLE_MAX_ROWS)
}

/// Lazy scan over a table's rows.
pub struct Rows<'a> {
    table: &'a mut Table,
    next: usize,
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.table.num_rows {
            return None;
        }

        let row_num = self.next;
        self.next += 1;
        Some(self.table.row_slot(row_num).map(|slot| Row::deserialize(slot)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table.num_rows.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}
