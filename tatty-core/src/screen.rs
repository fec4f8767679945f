//! The screen buffer - a fixed-size grid of single-byte cells
//!
//! Bytes from the child arrive one at a time through
//! [`ScreenBuffer::ingest`], which is the only mutation path. Rendering
//! reads the cells and cursor through the accessors and never re-derives
//! wrap or scroll state itself.

use log::trace;

use crate::cursor::Cursor;

/// A character grid with a cursor.
///
/// The grid is a flat, contiguous array of `cols * rows` bytes, allocated
/// once and never resized. A cell holds either a printable byte or 0,
/// which renders as blank.
#[derive(Debug, Clone)]
pub struct ScreenBuffer {
    /// Number of columns
    cols: usize,
    /// Number of rows
    rows: usize,
    /// Cell contents, row-major
    cells: Vec<u8>,
    /// Position of the next write
    cursor: Cursor,
    /// Whether the previous byte filled the last column and wrapped.
    /// A line feed that follows an implicit wrap is swallowed, so a line
    /// of exactly `cols` bytes does not advance two rows.
    wrapped: bool,
}

impl ScreenBuffer {
    /// Create a zero-filled buffer with the given geometry.
    ///
    /// Both dimensions must be non-zero; the geometry is fixed for the
    /// buffer's lifetime.
    pub fn new(cols: usize, rows: usize) -> Self {
        assert!(cols > 0 && rows > 0, "screen dimensions must be non-zero");
        Self {
            cols,
            rows,
            cells: vec![0; cols * rows],
            cursor: Cursor::new(),
            wrapped: false,
        }
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Current cursor position
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Byte stored at the given cell
    ///
    /// # Panics
    /// Panics if the position is outside the grid.
    pub fn cell(&self, col: usize, row: usize) -> u8 {
        assert!(col < self.cols && row < self.rows);
        self.cells[row * self.cols + col]
    }

    /// One row of cells, as a contiguous byte slice
    pub fn row_bytes(&self, row: usize) -> &[u8] {
        let start = row * self.cols;
        &self.cells[start..start + self.cols]
    }

    /// Lossy text dump: zero and non-printable cells become spaces,
    /// trailing blanks are trimmed, rows are joined with newlines.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for row in 0..self.rows {
            let line: String = self
                .row_bytes(row)
                .iter()
                .map(|&b| if b.is_ascii_graphic() { b as char } else { ' ' })
                .collect();
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }

    /// Apply one byte from the terminal channel.
    ///
    /// Exactly one of three rules fires:
    /// - `\r` moves the cursor to column 0.
    /// - `\n` advances one row, unless the previous byte just wrapped
    ///   implicitly, in which case it is swallowed.
    /// - anything else is stored at the cursor cell and the cursor
    ///   advances, wrapping to the next row after the last column.
    ///
    /// If the cursor has moved past the last row, the grid scrolls up by
    /// one and the cursor stays on the last row.
    pub fn ingest(&mut self, byte: u8) {
        match byte {
            b'\r' => {
                self.cursor.col = 0;
                self.wrapped = false;
            }
            b'\n' => {
                if self.wrapped {
                    // The previous byte already moved us to a fresh row;
                    // honoring this newline too would skip a row.
                    self.wrapped = false;
                } else {
                    self.cursor.row += 1;
                }
            }
            _ => {
                self.cells[self.cursor.row * self.cols + self.cursor.col] = byte;
                self.cursor.col += 1;
                if self.cursor.col == self.cols {
                    self.cursor.col = 0;
                    self.cursor.row += 1;
                    self.wrapped = true;
                } else {
                    self.wrapped = false;
                }
            }
        }

        if self.cursor.row == self.rows {
            self.scroll_up();
            self.cursor.row = self.rows - 1;
        }
    }

    /// Shift every row up by one, discarding row 0 and clearing the last
    /// row. The cell array is contiguous, so this is a single bulk move.
    fn scroll_up(&mut self) {
        self.cells.copy_within(self.cols.., 0);
        let last = self.cols * (self.rows - 1);
        self.cells[last..].fill(0);
        trace!("scrolled one row");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn feed(screen: &mut ScreenBuffer, bytes: &[u8]) {
        for &b in bytes {
            screen.ingest(b);
        }
    }

    #[test]
    fn plain_text_lands_in_row_zero() {
        let mut screen = ScreenBuffer::new(80, 25);
        feed(&mut screen, b"hello");

        assert_eq!(screen.row_bytes(0)[..5], *b"hello");
        assert_eq!(screen.cursor().col, 5);
        assert_eq!(screen.cursor().row, 0);
        // Every other cell is still blank.
        assert!(screen.row_bytes(0)[5..].iter().all(|&b| b == 0));
        for row in 1..25 {
            assert!(screen.row_bytes(row).iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn wrap_at_exact_width_lands_on_next_row() {
        let mut screen = ScreenBuffer::new(10, 5);
        feed(&mut screen, &[b'x'; 10]);

        assert_eq!(screen.cursor().col, 0);
        assert_eq!(screen.cursor().row, 1);
    }

    #[test]
    fn wrap_advances_one_row_per_full_width() {
        let width = 10;
        for len in 0..30 {
            let mut screen = ScreenBuffer::new(width, 5);
            feed(&mut screen, &vec![b'a'; len]);

            assert_eq!(screen.cursor().col, len % width, "len {len}");
            assert_eq!(screen.cursor().row, len / width, "len {len}");
        }
    }

    #[test]
    fn newline_after_full_line_is_swallowed() {
        let mut full = ScreenBuffer::new(10, 5);
        feed(&mut full, &[b'x'; 10]);
        let row_after_wrap = full.cursor().row;
        full.ingest(b'\n');
        assert_eq!(full.cursor().row, row_after_wrap);

        // One byte short of the width: the newline must advance.
        let mut short = ScreenBuffer::new(10, 5);
        feed(&mut short, &[b'x'; 9]);
        short.ingest(b'\n');
        assert_eq!(short.cursor().row, row_after_wrap);
        assert_eq!(full.cursor().row, short.cursor().row);
    }

    #[test]
    fn second_newline_after_wrap_advances() {
        let mut screen = ScreenBuffer::new(10, 5);
        feed(&mut screen, &[b'x'; 10]);
        screen.ingest(b'\n');
        screen.ingest(b'\n');
        assert_eq!(screen.cursor().row, 2);
    }

    #[test]
    fn carriage_return_resets_column_only() {
        let mut screen = ScreenBuffer::new(10, 5);
        feed(&mut screen, b"abc\ndef");
        let before: Vec<u8> = (0..5).flat_map(|r| screen.row_bytes(r).to_vec()).collect();

        screen.ingest(b'\r');

        assert_eq!(screen.cursor().col, 0);
        assert_eq!(screen.cursor().row, 1);
        let after: Vec<u8> = (0..5).flat_map(|r| screen.row_bytes(r).to_vec()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn carriage_return_clears_pending_wrap() {
        // A CR between an implicit wrap and a newline drops the wrap
        // flag, so the newline advances normally.
        let mut screen = ScreenBuffer::new(10, 5);
        feed(&mut screen, &[b'x'; 10]);
        screen.ingest(b'\r');
        screen.ingest(b'\n');
        assert_eq!(screen.cursor().row, 2);
    }

    #[test]
    fn scroll_discards_top_row_and_clears_bottom() {
        let mut screen = ScreenBuffer::new(10, 3);
        feed(&mut screen, b"aa\r\nbb\r\ncc\r\n");
        // The cursor was on the last row; the newline pushed it past the
        // end and scrolled "aa" out.
        assert_eq!(screen.cursor().row, 2);
        assert_eq!(screen.row_bytes(0)[..2], *b"bb");
        assert_eq!(screen.row_bytes(1)[..2], *b"cc");
        assert!(screen.row_bytes(2).iter().all(|&b| b == 0));
    }

    #[test]
    fn text_dump_reflects_rows() {
        let mut screen = ScreenBuffer::new(10, 3);
        feed(&mut screen, b"one\r\ntwo");
        assert_eq!(screen.text(), "one\ntwo\n\n");
    }

    #[test]
    fn cursor_row_stabilizes_under_repeated_overflow() {
        let mut screen = ScreenBuffer::new(10, 3);
        for i in 0..20 {
            feed(&mut screen, format!("line{i}\r\n").as_bytes());
            assert!(screen.cursor().row < 3);
        }
        assert_eq!(screen.cursor().row, 2);
        assert_eq!(screen.row_bytes(0)[..6], *b"line18");
        assert_eq!(screen.row_bytes(1)[..6], *b"line19");
    }

    #[test]
    fn overflow_from_wrap_also_scrolls() {
        let mut screen = ScreenBuffer::new(4, 2);
        feed(&mut screen, b"aaaabbbbcccc");
        // Each group of four wraps; the third wrap overflows the grid.
        assert_eq!(screen.row_bytes(0), b"cccc");
        assert!(screen.row_bytes(1).iter().all(|&b| b == 0));
        assert_eq!(screen.cursor().row, 1);
        assert_eq!(screen.cursor().col, 0);
    }

    proptest! {
        #[test]
        fn wrap_invariant_holds_for_any_run_length(
            width in 2usize..120,
            len in 0usize..500,
        ) {
            let rows = 25;
            // Stay short of overflow so scroll does not clamp the row.
            let len = len.min(width * (rows - 1));
            let mut screen = ScreenBuffer::new(width, rows);
            for _ in 0..len {
                screen.ingest(b'w');
            }
            prop_assert_eq!(screen.cursor().col, len % width);
            prop_assert_eq!(screen.cursor().row, len / width);
        }

        #[test]
        fn ingest_never_moves_cursor_out_of_bounds(bytes in proptest::collection::vec(any::<u8>(), 0..2000)) {
            let mut screen = ScreenBuffer::new(10, 5);
            for b in bytes {
                screen.ingest(b);
                prop_assert!(screen.cursor().col < 10);
                prop_assert!(screen.cursor().row < 5);
            }
        }
    }
}
