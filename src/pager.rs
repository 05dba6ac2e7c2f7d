//! Pager - owns the database file and its in-memory page cache.
//!
//! The cache is a direct-mapped array of [`TABLE_MAX_PAGES`] slots, one per
//! page number. A slot is empty until the page is first requested, then holds
//! the page until the pager is closed. Nothing is ever evicted.
//!
//! # File Layout
//! ```text
//! ┌─────────┬─────────┬─────────┬─────────┐
//! │ Page 0  │ Page 1  │  ...    │ Page N  │
//! │ (4KB)   │ (4KB)   │         │ (≤4KB)  │
//! └─────────┴─────────┴─────────┴─────────┘
//! Offset:  0      4096   ...     N×4096
//! ```
//!
//! There is no header. The last page may be short on disk.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{DbError, Result};
use crate::{PAGE_SIZE, TABLE_MAX_PAGES};

/// A zero-initialised 4KB buffer.
pub struct Page {
    data: Box<[u8; PAGE_SIZE]>,
}

impl Page {
    pub fn new() -> Self {
        Self {
            data: Box::new([0u8; PAGE_SIZE]),
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..]
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Pager {
    file: File,
    /// Length of the file when it was opened.
    file_length: u64,
    pages: Vec<Option<Page>>,
}

impl Pager {
    /// Open `path` for reading and writing, creating it if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let file_length = file.seek(SeekFrom::End(0))?;

        debug!(path = %path.display(), file_length, "opened database file");

        Ok(Self {
            file,
            file_length,
            pages: (0..TABLE_MAX_PAGES).map(|_| None).collect(),
        })
    }

    #[inline]
    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    /// Whether `page_num` currently sits in the cache.
    pub fn is_loaded(&self, page_num: usize) -> bool {
        self.pages.get(page_num).is_some_and(Option::is_some)
    }

    /// Return the page for `page_num`, reading it from disk on first access.
    ///
    /// Bytes past the end of the file are left zeroed, so a short trailing
    /// page comes back partially filled.
    pub fn get_page(&mut self, page_num: usize) -> Result<&mut Page> {
        if page_num >= TABLE_MAX_PAGES {
            return Err(DbError::PageOutOfBounds {
                page_num,
                max: TABLE_MAX_PAGES,
            });
        }

        if self.pages[page_num].is_none() {
            let page = self.load_page(page_num)?;
            self.pages[page_num] = Some(page);
        }

        Ok(self.pages[page_num].get_or_insert_with(Page::new))
    }

    fn load_page(&mut self, page_num: usize) -> Result<Page> {
        let mut page = Page::new();
        let offset = (page_num * PAGE_SIZE) as u64;

        if offset < self.file_length {
            let available = (self.file_length - offset).min(PAGE_SIZE as u64) as usize;
            self.file.seek(SeekFrom::Start(offset))?;
            self.file.read_exact(&mut page.as_mut_slice()[..available])?;
            debug!(page_num, bytes = available, "loaded page from disk");
        } else {
            debug!(page_num, "allocated fresh page");
        }

        Ok(page)
    }

    /// Write the first `size` bytes of a cached page back to its slot in the file.
    pub fn flush(&mut self, page_num: usize, size: usize) -> Result<()> {
        let page = match self.pages.get(page_num) {
            Some(Some(page)) => page,
            _ => return Err(DbError::FlushUnloadedPage(page_num)),
        };
        let size = size.min(PAGE_SIZE);

        self.file.seek(SeekFrom::Start((page_num * PAGE_SIZE) as u64))?;
        self.file.write_all(&page.as_slice()[..size])?;

        debug!(page_num, bytes = size, "flushed page");
        Ok(())
    }

    /// Drop a page from the cache.
    pub fn release(&mut self, page_num: usize) {
        if let Some(slot) = self.pages.get_mut(page_num) {
            *slot = None;
        }
    }

    /// Sync the file and release every cached page.
    pub fn close(mut self) -> Result<()> {
        self.file.sync_all()?;
        self.pages.clear();
        debug!("closed database file");
        Ok(())
    }
}
