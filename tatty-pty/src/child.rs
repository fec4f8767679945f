//! Shell spawn and the post-spawn master handle
//!
//! The child branch runs between fork and exec, so it sticks to
//! async-signal-safe calls and bails out with _exit: a child that cannot
//! attach its controlling terminal or wire up its stdio has nothing
//! useful left to do, and the parent sees the failure as end-of-stream.

use std::ffi::CString;
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, RawFd};

use log::debug;
use nix::pty::PtyMaster;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{dup2, execve, fork, setsid, ForkResult, Pid};

use crate::error::{Error, Result};
use crate::pty::PtyPair;

impl PtyPair {
    /// Fork and replace the child's image with `shell`.
    ///
    /// The child closes its copy of the master, starts a new session,
    /// claims the slave as its controlling terminal, duplicates it onto
    /// stdin/stdout/stderr, and execs the shell with a minimal
    /// environment (`TERM=dumb` only) and a dash-prefixed argv[0], the
    /// convention for requesting a login shell. The parent closes its
    /// slave handle and keeps only the master.
    pub fn spawn(self, shell: &str) -> Result<Pty> {
        let invalid = |e: std::ffi::NulError| {
            Error::ShellPath(io::Error::new(io::ErrorKind::InvalidInput, e))
        };
        let shell_cstr = CString::new(shell).map_err(invalid)?;
        let base = shell.rsplit('/').next().unwrap_or(shell);
        let argv0 = CString::new(format!("-{base}")).map_err(invalid)?;
        let env = [CString::new("TERM=dumb").map_err(invalid)?];

        let PtyPair { master, slave, .. } = self;

        // SAFETY: the child branch below only performs async-signal-safe
        // work (close, setsid, ioctl, dup2, execve, _exit)
        match unsafe { fork() }.map_err(Error::Fork)? {
            ForkResult::Child => {
                drop(master);

                // New session; the shell inherits session leadership.
                if setsid().is_err() {
                    unsafe { libc::_exit(1) }
                }

                let slave_raw = slave.as_raw_fd();

                // Make the slave our controlling terminal. Without one
                // the shell cannot do job control, so this is fatal to
                // the child.
                // SAFETY: TIOCSCTTY on a freshly opened slave fd
                unsafe {
                    if libc::ioctl(slave_raw, libc::TIOCSCTTY as libc::c_ulong, 0) < 0 {
                        libc::_exit(1);
                    }
                }

                if dup2(slave_raw, libc::STDIN_FILENO).is_err()
                    || dup2(slave_raw, libc::STDOUT_FILENO).is_err()
                    || dup2(slave_raw, libc::STDERR_FILENO).is_err()
                {
                    unsafe { libc::_exit(1) }
                }
                if slave_raw > libc::STDERR_FILENO {
                    drop(slave);
                }

                let _ = execve(&shell_cstr, &[&argv0], &env);

                // execve only returns on failure
                unsafe { libc::_exit(127) }
            }
            ForkResult::Parent { child } => {
                // The slave now belongs solely to the child's duplicated
                // descriptors.
                drop(slave);
                // SAFETY: dup of a fd we own; the File takes ownership
                // of the duplicate
                let file = unsafe { File::from_raw_fd(libc::dup(master.as_raw_fd())) };
                debug!("spawned {} as pid {}", shell, child);
                Ok(Pty {
                    master,
                    file,
                    child,
                })
            }
        }
    }
}

/// The parent's side of a running session: the PTY master plus the
/// child's pid. Reads and writes go to the master; once the child exits
/// the stream ends.
pub struct Pty {
    /// Keeps the master fd alive
    master: PtyMaster,
    /// File wrapper over a dup of the master, for blocking I/O
    file: File,
    /// The shell's pid
    child: Pid,
}

impl Pty {
    /// Raw master descriptor, for readiness polling
    pub fn master_fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }

    /// Pid of the spawned shell
    pub fn child_pid(&self) -> Pid {
        self.child
    }

    /// Blocking single-byte read from the master.
    ///
    /// `Ok(None)` means the stream is over: either a zero-length read or
    /// EIO, which is how Linux reports a hung-up slave side once the
    /// child is gone. Callers treat both the same way and end the
    /// session.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.file.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.raw_os_error() == Some(libc::EIO) => Ok(None),
            Err(e) => Err(Error::Read(e)),
        }
    }

    /// Forward raw bytes to the shell. Echo is the shell's business, not
    /// ours.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.write_all(bytes).map_err(Error::Write)
    }

    /// Whether the child is still running (reaps it if it just exited)
    pub fn is_alive(&self) -> bool {
        matches!(
            waitpid(self.child, Some(WaitPidFlag::WNOHANG)),
            Ok(WaitStatus::StillAlive)
        )
    }

    /// Block until the child exits
    pub fn wait(&self) -> Result<WaitStatus> {
        waitpid(self.child, None).map_err(Error::Wait)
    }

    /// Send a signal to the child
    pub fn signal(&self, signal: Signal) -> Result<()> {
        kill(self.child, signal).map_err(Error::Signal)
    }
}

impl AsRawFd for Pty {
    fn as_raw_fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }
}

impl AsFd for Pty {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.master.as_fd()
    }
}

impl Drop for Pty {
    fn drop(&mut self) {
        let _ = kill(self.child, Signal::SIGHUP);
        let _ = waitpid(self.child, Some(WaitPidFlag::WNOHANG));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pty::PtyPair;
    use crate::size::WindowSize;

    fn read_until_eof(pty: &mut Pty) -> Vec<u8> {
        let mut out = Vec::new();
        while let Ok(Some(b)) = pty.read_byte() {
            out.push(b);
        }
        out
    }

    #[test]
    fn spawned_child_output_then_eof() {
        let pair = PtyPair::open().unwrap();
        pair.set_window_size(WindowSize::new(80, 25)).unwrap();
        let mut pty = pair.spawn("/bin/echo").unwrap();

        // echo prints its (empty) argument list and exits; after that
        // every read reports end-of-stream.
        let output = read_until_eof(&mut pty);
        assert_eq!(output, b"\r\n");
        assert!(matches!(pty.read_byte(), Ok(None)));
        let _ = pty.wait();
    }

    #[test]
    fn cat_echoes_written_bytes() {
        let pair = PtyPair::open().unwrap();
        let mut pty = pair.spawn("/bin/cat").unwrap();

        pty.write_all(b"hi\n").unwrap();

        // The line discipline echoes input before cat even sees it, so
        // the written bytes come straight back.
        let mut seen = Vec::new();
        while seen.len() < 2 {
            match pty.read_byte().unwrap() {
                Some(b) => seen.push(b),
                None => break,
            }
        }
        assert_eq!(&seen[..2], b"hi");

        pty.signal(Signal::SIGTERM).unwrap();
        let _ = pty.wait();
    }

    #[test]
    fn child_exit_is_observed() {
        let pair = PtyPair::open().unwrap();
        let mut pty = pair.spawn("/bin/true").unwrap();

        // Drain whatever the child produced (nothing, for true) until
        // the stream ends, then the child must be reapable.
        let _ = read_until_eof(&mut pty);
        let status = pty.wait().unwrap();
        assert!(matches!(status, WaitStatus::Exited(_, 0)));
        assert!(!pty.is_alive());
    }
}
