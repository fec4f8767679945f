//! Pseudo-terminal management for a minimal terminal emulator
//!
//! This crate owns the two hard lifecycle steps of driving a shell
//! through a PTY:
//! - allocation: open the master multiplexing device, run the grant and
//!   unlock housekeeping, resolve and open the slave side
//! - spawn: fork, give the child a fresh session with the slave as its
//!   controlling terminal, wire the slave onto the child's stdio, and
//!   replace the child image with the shell
//!
//! Ownership is encoded in the types: [`PtyPair`] holds both descriptors
//! and exists only between allocation and spawn; [`Pty`] is what the
//! parent keeps afterwards, a master-side duplex byte channel plus the
//! child's pid.
//!
//! Reference: https://www.man7.org/linux/man-pages/man3/posix_openpt.3.html

mod child;
mod error;
mod pty;
mod size;

pub use child::Pty;
pub use error::{Error, Result};
pub use pty::PtyPair;
pub use size::WindowSize;
