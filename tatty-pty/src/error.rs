//! Error types for PTY operations

use std::io;

use thiserror::Error;

/// PTY error type, one variant per failing step.
///
/// Allocation and fork failures are fatal to startup; window-size
/// failures are surfaced but survivable. A child that cannot attach its
/// controlling terminal has no variant here: it exits before exec and
/// the parent observes the end of the stream instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Opening the master multiplexing device failed
    #[error("failed to open PTY master: {0}")]
    OpenMaster(#[source] nix::Error),

    /// grantpt(3) failed
    #[error("failed to grant slave access: {0}")]
    Grant(#[source] nix::Error),

    /// unlockpt(3) failed
    #[error("failed to unlock slave: {0}")]
    Unlock(#[source] nix::Error),

    /// ptsname(3) failed
    #[error("failed to resolve slave path: {0}")]
    SlaveName(#[source] nix::Error),

    /// Opening the resolved slave path failed
    #[error("failed to open PTY slave: {0}")]
    OpenSlave(#[source] io::Error),

    /// The shell path or environment could not be converted for exec
    #[error("invalid shell path: {0}")]
    ShellPath(#[source] io::Error),

    /// fork(2) failed
    #[error("failed to fork: {0}")]
    Fork(#[source] nix::Error),

    /// The TIOCSWINSZ ioctl failed
    #[error("failed to set window size: {0}")]
    SetWindowSize(#[source] io::Error),

    /// Reading from the master failed (end-of-stream is not an error)
    #[error("failed to read from PTY master: {0}")]
    Read(#[source] io::Error),

    /// Writing to the master failed
    #[error("failed to write to PTY master: {0}")]
    Write(#[source] io::Error),

    /// waitpid(2) on the child failed
    #[error("failed to wait for child: {0}")]
    Wait(#[source] nix::Error),

    /// Signalling the child failed
    #[error("failed to signal child: {0}")]
    Signal(#[source] nix::Error),
}

/// Result type for PTY operations
pub type Result<T> = std::result::Result<T, Error>;
