//! Display surface - the windowed consumer of the screen buffer
//!
//! The event loop talks to the display through the [`Surface`] trait: a
//! pollable file descriptor, a queue of already-decoded events, and a
//! redraw entry point that reads the buffer and repaints. The surface
//! never calls back into the core; it only reacts to redraw requests.
//!
//! [`X11Surface`] is the real implementation. Tests substitute a stub,
//! which is the point of the trait.

use std::os::fd::RawFd;
use std::os::unix::io::AsRawFd;

use log::debug;
use tatty_core::ScreenBuffer;
use thiserror::Error;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    AtomEnum, ChangeGCAux, ConnectionExt, CreateGCAux, CreateWindowAux, EventMask, Gcontext,
    PropMode, Rectangle, Window, WindowClass,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::COPY_DEPTH_FROM_PARENT;

use crate::keymap::Keymap;

/// Display setup or rendering failure. All of these are fatal: the
/// session cannot start without a surface, and a broken connection
/// cannot be repainted.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("cannot open display: {0}")]
    Connect(#[from] x11rb::errors::ConnectError),

    #[error("display connection lost: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),

    #[error("display request failed: {0}")]
    Reply(#[from] x11rb::errors::ReplyError),

    #[error("display id allocation failed: {0}")]
    Id(#[from] x11rb::errors::ReplyOrIdError),
}

/// A display event, decoded as far as the event loop cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The window needs repainting
    Expose,
    /// A key press, already decoded to the bytes it feeds the shell
    KeyBytes(Vec<u8>),
    /// A resize request; accepted but deliberately not acted on
    ResizeRequest { width: u16, height: u16 },
}

/// The display collaborator contract consumed by the event loop.
pub trait Surface {
    /// Descriptor to include in the readiness wait
    fn fd(&self) -> RawFd;

    /// Drain every event the connection has buffered, in order.
    ///
    /// Must not block: returns an empty vec when nothing is pending.
    fn drain_events(&mut self) -> Result<Vec<SurfaceEvent>, SurfaceError>;

    /// Repaint from the current cells and cursor.
    fn redraw(&mut self, screen: &ScreenBuffer) -> Result<(), SurfaceError>;
}

// A server-side font every X installation carries.
const FONT_NAME: &[u8] = b"fixed";

// 16-bit RGB triplets for the allocated colors.
const COLOR_BG: (u16, u16, u16) = (0x0000, 0x4444, 0x0000);
const COLOR_FG: (u16, u16, u16) = (0xffff, 0xffff, 0xcccc);
const COLOR_CURSOR: (u16, u16, u16) = (0xffff, 0x0000, 0x0000);

/// An X11 window sized to the cell grid, with a core font and three
/// allocated colors.
pub struct X11Surface {
    conn: RustConnection,
    window: Window,
    gc: Gcontext,
    keymap: Keymap,
    bg: u32,
    fg: u32,
    cursor: u32,
    cell_width: u16,
    cell_height: u16,
    ascent: u16,
    pixel_width: u16,
    pixel_height: u16,
}

impl X11Surface {
    /// Connect to the display and build the window, font, colors, and
    /// graphics context for a `cols` x `rows` cell grid.
    pub fn open(title: &str, cols: usize, rows: usize) -> Result<Self, SurfaceError> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let screen = &conn.setup().roots[screen_num];

        let font = conn.generate_id()?;
        conn.open_font(font, FONT_NAME)?.check()?;
        let metrics = conn.query_font(font)?.reply()?;
        let cell_width = metrics.max_bounds.character_width as u16;
        let cell_height = (metrics.font_ascent + metrics.font_descent) as u16;
        let ascent = metrics.font_ascent as u16;

        let cmap = screen.default_colormap;
        let alloc = |(r, g, b)| -> Result<u32, SurfaceError> {
            Ok(conn.alloc_color(cmap, r, g, b)?.reply()?.pixel)
        };
        let bg = alloc(COLOR_BG)?;
        let fg = alloc(COLOR_FG)?;
        let cursor = alloc(COLOR_CURSOR)?;

        let pixel_width = cols as u16 * cell_width;
        let pixel_height = rows as u16 * cell_height;

        let window = conn.generate_id()?;
        conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            window,
            screen.root,
            0,
            0,
            pixel_width,
            pixel_height,
            0,
            WindowClass::INPUT_OUTPUT,
            screen.root_visual,
            &CreateWindowAux::new().background_pixel(bg).event_mask(
                EventMask::EXPOSURE | EventMask::KEY_PRESS | EventMask::RESIZE_REDIRECT,
            ),
        )?
        .check()?;
        conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            title.as_bytes(),
        )?;

        let gc = conn.generate_id()?;
        conn.create_gc(
            gc,
            window,
            &CreateGCAux::new().foreground(fg).background(bg).font(font),
        )?
        .check()?;

        let keymap = Keymap::fetch(&conn)?;

        conn.map_window(window)?;
        conn.flush()?;

        debug!(
            "surface up: {}x{} cells, {}x{} px, font {:?}",
            cols,
            rows,
            pixel_width,
            pixel_height,
            String::from_utf8_lossy(FONT_NAME)
        );

        Ok(Self {
            conn,
            window,
            gc,
            keymap,
            bg,
            fg,
            cursor,
            cell_width,
            cell_height,
            ascent,
            pixel_width,
            pixel_height,
        })
    }

    fn set_foreground(&self, pixel: u32) -> Result<(), SurfaceError> {
        self.conn
            .change_gc(self.gc, &ChangeGCAux::new().foreground(pixel))?;
        Ok(())
    }
}

impl Surface for X11Surface {
    fn fd(&self) -> RawFd {
        self.conn.stream().as_raw_fd()
    }

    fn drain_events(&mut self) -> Result<Vec<SurfaceEvent>, SurfaceError> {
        let mut out = Vec::new();
        while let Some(event) = self.conn.poll_for_event()? {
            match event {
                Event::Expose(_) => out.push(SurfaceEvent::Expose),
                Event::KeyPress(key) => {
                    let bytes = self.keymap.decode(key.detail, key.state);
                    if !bytes.is_empty() {
                        out.push(SurfaceEvent::KeyBytes(bytes));
                    }
                }
                Event::ResizeRequest(req) => out.push(SurfaceEvent::ResizeRequest {
                    width: req.width,
                    height: req.height,
                }),
                _ => {}
            }
        }
        Ok(out)
    }

    fn redraw(&mut self, screen: &ScreenBuffer) -> Result<(), SurfaceError> {
        self.set_foreground(self.bg)?;
        self.conn.poly_fill_rectangle(
            self.window,
            self.gc,
            &[Rectangle {
                x: 0,
                y: 0,
                width: self.pixel_width,
                height: self.pixel_height,
            }],
        )?;

        // Each row is contiguous in the buffer, so it goes out as one
        // request; non-printable cells become blanks.
        self.set_foreground(self.fg)?;
        let mut line = vec![b' '; screen.cols()];
        for row in 0..screen.rows() {
            for (cell, byte) in line.iter_mut().zip(screen.row_bytes(row)) {
                *cell = if byte.is_ascii_graphic() { *byte } else { b' ' };
            }
            self.conn.image_text8(
                self.window,
                self.gc,
                0,
                (row as u16 * self.cell_height + self.ascent) as i16,
                &line,
            )?;
        }

        let cur = screen.cursor();
        self.set_foreground(self.cursor)?;
        self.conn.poly_fill_rectangle(
            self.window,
            self.gc,
            &[Rectangle {
                x: (cur.col as u16 * self.cell_width) as i16,
                y: (cur.row as u16 * self.cell_height) as i16,
                width: self.cell_width,
                height: self.cell_height,
            }],
        )?;

        self.conn.flush()?;
        Ok(())
    }
}
