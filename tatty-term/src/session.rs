//! Session wiring
//!
//! One PTY, one screen buffer, one display surface: created together at
//! startup, torn down together, passed as a unit through the event loop.
//! There is deliberately no process-global state behind this struct.

use log::{info, warn};
use tatty_core::ScreenBuffer;
use tatty_pty::{Pty, PtyPair, WindowSize};

use crate::error::Error;
use crate::surface::X11Surface;

// Fixed for the life of the process: resizing is not supported, and the
// geometry and shell are constants rather than configuration.
pub const GRID_COLS: usize = 80;
pub const GRID_ROWS: usize = 25;

// dash keeps startup side effects to a minimum compared to bash.
const SHELL: &str = "/bin/dash";
const TITLE: &str = "tatty";

/// The 1:1:1 pairing of terminal, buffer, and display.
pub struct Session<S> {
    pub pty: Pty,
    pub screen: ScreenBuffer,
    pub surface: S,
}

impl Session<X11Surface> {
    /// Bring up the whole session: surface first (so a missing display
    /// fails before a shell is forked), then the PTY pair, the window
    /// size record, and the shell itself.
    pub fn create() -> Result<Self, Error> {
        let surface = X11Surface::open(TITLE, GRID_COLS, GRID_ROWS)?;

        let pair = PtyPair::open()?;
        let size = WindowSize::new(GRID_COLS as u16, GRID_ROWS as u16);
        if let Err(e) = pair.set_window_size(size) {
            // The driver just won't have a size on record; the session
            // still works.
            warn!("could not record window size on the PTY: {e}");
        }
        let pty = pair.spawn(SHELL)?;

        info!(
            "session started: {}x{} cells, shell {}, child pid {}",
            GRID_COLS,
            GRID_ROWS,
            SHELL,
            pty.child_pid()
        );

        Ok(Self {
            pty,
            screen: ScreenBuffer::new(GRID_COLS, GRID_ROWS),
            surface,
        })
    }
}
