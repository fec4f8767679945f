//! PTY allocation
//!
//! Opens the master multiplexing device in no-controlling-terminal mode,
//! runs the grant/unlock housekeeping, resolves the slave path and opens
//! it. Unlike pipe(2), the two descriptors do not arrive together: the
//! slave is a regular open(2) on the path the master hands back.

use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use log::debug;
use nix::fcntl::OFlag;
use nix::pty::{grantpt, posix_openpt, ptsname, unlockpt, PtyMaster};

use crate::error::{Error, Result};
use crate::size::WindowSize;

/// An allocated master/slave descriptor pair, before any child exists.
///
/// The caller owns both handles. [`PtyPair::spawn`] consumes the pair:
/// the slave moves to the child's standard streams and the parent keeps
/// only the master, as a [`crate::Pty`].
pub struct PtyPair {
    pub(crate) master: PtyMaster,
    pub(crate) slave: OwnedFd,
    pub(crate) slave_path: String,
}

impl PtyPair {
    /// Allocate a fresh master/slave pair.
    ///
    /// Every step here is one-shot: a failure means PTY setup is broken
    /// on this system and the caller must abort startup, not retry.
    pub fn open() -> Result<Self> {
        let master =
            posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).map_err(Error::OpenMaster)?;
        grantpt(&master).map_err(Error::Grant)?;
        unlockpt(&master).map_err(Error::Unlock)?;

        // SAFETY: ptsname is not thread-safe; it is called here once,
        // before the pair is shared anywhere.
        let slave_path = unsafe { ptsname(&master) }.map_err(Error::SlaveName)?;
        let slave = open_slave(&slave_path)?;

        debug!("allocated PTY pair, slave {}", slave_path);
        Ok(Self {
            master,
            slave,
            slave_path,
        })
    }

    /// Path of the slave device under /dev/pts
    pub fn slave_path(&self) -> &str {
        &self.slave_path
    }

    /// Raw master descriptor
    pub fn master_fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }

    /// Record the window geometry with the PTY driver (TIOCSWINSZ).
    ///
    /// Informational: the driver only stores it for the slave side to
    /// query. A failure leaves the session usable, so callers surface it
    /// without aborting.
    pub fn set_window_size(&self, size: WindowSize) -> Result<()> {
        set_window_size(self.master.as_raw_fd(), size)
    }

    /// Read the driver's window geometry back (TIOCGWINSZ)
    pub fn window_size(&self) -> Result<WindowSize> {
        // SAFETY: the master fd is valid for the lifetime of self
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        let rc = unsafe {
            libc::ioctl(
                self.master.as_raw_fd(),
                libc::TIOCGWINSZ as libc::c_ulong,
                &mut ws,
            )
        };
        if rc == -1 {
            Err(Error::SetWindowSize(io::Error::last_os_error()))
        } else {
            Ok(WindowSize::from(ws))
        }
    }
}

fn open_slave(path: &str) -> Result<OwnedFd> {
    let path_cstr = CString::new(path)
        .map_err(|e| Error::OpenSlave(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
    // Keep O_NOCTTY: the slave must not become *our* controlling
    // terminal; the child claims it explicitly after setsid.
    let fd = unsafe { libc::open(path_cstr.as_ptr(), libc::O_RDWR | libc::O_NOCTTY) };
    if fd < 0 {
        return Err(Error::OpenSlave(io::Error::last_os_error()));
    }
    // SAFETY: fd was just returned by open and is not owned elsewhere
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

fn set_window_size(fd: RawFd, size: WindowSize) -> Result<()> {
    let ws = size.to_winsize();
    let rc = unsafe { libc::ioctl(fd, libc::TIOCSWINSZ as libc::c_ulong, &ws) };
    if rc == -1 {
        Err(Error::SetWindowSize(io::Error::last_os_error()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_yields_pts_slave() {
        let pair = PtyPair::open().expect("PTY allocation failed");
        assert!(pair.slave_path().starts_with("/dev/pts/"));
        assert!(pair.master_fd() >= 0);
    }

    #[test]
    fn window_size_round_trips_through_driver() {
        let pair = PtyPair::open().unwrap();
        pair.set_window_size(WindowSize::new(80, 25)).unwrap();
        let size = pair.window_size().unwrap();
        assert_eq!(size.cols, 80);
        assert_eq!(size.rows, 25);
    }
}
