//! Top-level error type for the terminal application

use thiserror::Error;

use crate::surface::SurfaceError;

/// Everything that can end a session.
///
/// `ChildEof` is the ordinary ending: the shell exited and the terminal
/// channel closed. It is kept distinct from read errors for diagnostics,
/// but both take the same path out: the loop stops and the process exits
/// with a failure status.
#[derive(Debug, Error)]
pub enum Error {
    /// The terminal channel ended (the child exited or hung up)
    #[error("terminal channel closed (shell exited)")]
    ChildEof,

    /// A PTY operation failed
    #[error(transparent)]
    Pty(#[from] tatty_pty::Error),

    /// A display surface operation failed
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// The readiness wait itself failed
    #[error("poll failed: {0}")]
    Poll(#[source] nix::Error),
}
