//! The readiness-multiplexing loop
//!
//! Single-threaded and fully blocking: one poll(2) over exactly two
//! descriptors, the PTY master and the display connection, with no
//! timeout. One byte is consumed per terminal wakeup (the wrap and
//! scroll rules depend on that granularity) and all pending display
//! events are drained per display wakeup. The only exits are stream end
//! and fatal I/O errors; there is no shutdown command.

use std::os::fd::BorrowedFd;

use log::{debug, info};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

use crate::error::Error;
use crate::session::Session;
use crate::surface::{Surface, SurfaceEvent};

/// Drive the session until its terminal channel ends.
///
/// Always returns an `Err`: a closed channel is [`Error::ChildEof`], and
/// everything else is the failure that stopped the loop. The caller
/// turns either into a non-zero exit.
pub fn run<S: Surface>(session: &mut Session<S>) -> Result<(), Error> {
    loop {
        // The surface buffers socket data internally, so events can be
        // pending even when its fd shows nothing new. Drain before
        // blocking or those events would stall until the next wakeup.
        for event in session.surface.drain_events()? {
            match event {
                SurfaceEvent::Expose => session.surface.redraw(&session.screen)?,
                SurfaceEvent::KeyBytes(bytes) => session.pty.write_all(&bytes)?,
                SurfaceEvent::ResizeRequest { width, height } => {
                    debug!("ignoring resize request to {}x{}", width, height);
                }
            }
        }

        // SAFETY: both fds outlive the poll call; the session owns them
        let pty_fd = unsafe { BorrowedFd::borrow_raw(session.pty.master_fd()) };
        let surface_fd = unsafe { BorrowedFd::borrow_raw(session.surface.fd()) };
        let mut fds = [
            PollFd::new(pty_fd, PollFlags::POLLIN),
            PollFd::new(surface_fd, PollFlags::POLLIN),
        ];
        poll(&mut fds, PollTimeout::NONE).map_err(Error::Poll)?;

        // POLLHUP/POLLERR also mean "go read": that is how the master
        // reports a vanished child.
        let terminal_ready = fds[0].revents().is_some_and(|r| {
            r.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR)
        });

        if terminal_ready {
            match session.pty.read_byte()? {
                Some(byte) => {
                    session.screen.ingest(byte);
                    session.surface.redraw(&session.screen)?;
                }
                None => {
                    info!("terminal channel closed");
                    return Err(Error::ChildEof);
                }
            }
        }
        // Display readiness needs no arm of its own: the next
        // iteration's drain pass picks up whatever arrived.
    }
}
