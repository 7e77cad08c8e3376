//! Text-mode screen (80x25 cells at physical 0xB8000).
//!
//! Each cell is a character byte plus an attribute byte. Output wraps to the
//! top-left corner when the last row is exhausted; there is no scrolling.

use core::sync::atomic::{AtomicU64, Ordering};

use spin::Mutex;

use crate::config::SCREEN_ATTRIBUTE;

pub const COLUMNS: usize = 80;
pub const ROWS: usize = 25;
pub const CELLS: usize = COLUMNS * ROWS;

const TEXT_BUFFER_PHYS: u64 = 0xB8000;

/// Printed in place of bytes outside printable ASCII.
const REPLACEMENT: u8 = 0xFE;

/// Virtual address of the text buffer, 0 until `init` runs.
static TEXT_BUFFER: AtomicU64 = AtomicU64::new(0);

static WRITER: Mutex<ScreenWriter<TextBuffer>> =
    Mutex::new(ScreenWriter::new(TextBuffer, SCREEN_ATTRIBUTE));

/// Pack a character and attribute into one cell.
pub const fn cell(ch: u8, attribute: u8) -> u16 {
    (attribute as u16) << 8 | ch as u16
}

/// Destination for character cells, indexed row-major.
pub trait CellSink {
    fn put(&mut self, index: usize, cell: u16);
}

/// The memory-mapped text buffer. Writes are dropped until `init` has run.
pub struct TextBuffer;

impl CellSink for TextBuffer {
    fn put(&mut self, index: usize, cell: u16) {
        let base = TEXT_BUFFER.load(Ordering::Relaxed);
        if base == 0 || index >= CELLS {
            return;
        }
        let ptr = (base as *mut u16).wrapping_add(index);
        unsafe { core::ptr::write_volatile(ptr, cell) }
    }
}

/// Cursor-tracking writer over a cell sink.
pub struct ScreenWriter<S: CellSink> {
    sink: S,
    row: usize,
    column: usize,
    attribute: u8,
}

impl<S: CellSink> ScreenWriter<S> {
    pub const fn new(sink: S, attribute: u8) -> Self {
        Self {
            sink,
            row: 0,
            column: 0,
            attribute,
        }
    }

    /// Current (row, column) of the cursor.
    pub fn position(&self) -> (usize, usize) {
        (self.row, self.column)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.write_byte(b);
        }
    }

    pub fn write_byte(&mut self, b: u8) {
        match b {
            b'\n' => self.new_line(),
            0x20..=0x7E => self.put_char(b),
            _ => self.put_char(REPLACEMENT),
        }
    }

    /// Blank every cell and home the cursor.
    pub fn clear(&mut self) {
        for index in 0..CELLS {
            self.sink.put(index, cell(b' ', self.attribute));
        }
        self.row = 0;
        self.column = 0;
    }

    fn put_char(&mut self, ch: u8) {
        let index = self.row * COLUMNS + self.column;
        self.sink.put(index, cell(ch, self.attribute));
        self.column += 1;
        if self.column == COLUMNS {
            self.new_line();
        }
    }

    fn new_line(&mut self) {
        self.column = 0;
        self.row = (self.row + 1) % ROWS;
    }
}

impl<S: CellSink> core::fmt::Write for ScreenWriter<S> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

/// Map the text buffer through the bootloader's physical memory window.
///
/// Without a window the buffer is assumed to be identity mapped.
pub fn init(physical_memory_offset: Option<u64>) {
    let base = physical_memory_offset.unwrap_or(0) + TEXT_BUFFER_PHYS;
    TEXT_BUFFER.store(base, Ordering::Relaxed);
    WRITER.lock().clear();
    log::debug!("text buffer at {:#x}", base);
}

/// Write bytes at the cursor. Fire-and-forget.
pub fn write_screen_text(bytes: &[u8]) {
    WRITER.lock().write_bytes(bytes);
}

/// Write bytes at a fixed position without touching the cursor or its lock.
///
/// Used from the fault path, which may have interrupted a `write_screen_text`.
pub fn write_at(row: usize, column: usize, bytes: &[u8], attribute: u8) {
    let start = row * COLUMNS + column;
    let mut buffer = TextBuffer;
    for (offset, &b) in bytes.iter().enumerate() {
        buffer.put(start + offset, cell(b, attribute));
    }
}
