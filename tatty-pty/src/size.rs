//! Window size record for the PTY driver

/// Terminal window size in character cells and (optionally) pixels.
///
/// This mirrors the kernel's winsize record: the driver keeps it so the
/// slave side can query the geometry, and a later change would raise
/// SIGWINCH in the child. It does not size anything by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    /// Number of rows (character cells)
    pub rows: u16,
    /// Number of columns (character cells)
    pub cols: u16,
    /// Width in pixels, 0 if unknown
    pub pixel_width: u16,
    /// Height in pixels, 0 if unknown
    pub pixel_height: u16,
}

impl WindowSize {
    /// Create a window size without pixel dimensions
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        }
    }

    /// Convert to the libc winsize structure
    pub fn to_winsize(self) -> libc::winsize {
        libc::winsize {
            ws_row: self.rows,
            ws_col: self.cols,
            ws_xpixel: self.pixel_width,
            ws_ypixel: self.pixel_height,
        }
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl From<libc::winsize> for WindowSize {
    fn from(ws: libc::winsize) -> Self {
        Self {
            rows: ws.ws_row,
            cols: ws.ws_col,
            pixel_width: ws.ws_xpixel,
            pixel_height: ws.ws_ypixel,
        }
    }
}
