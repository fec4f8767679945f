//! Screen model for a minimal terminal emulator
//!
//! This crate holds the in-memory character grid that the shell's output
//! stream is rendered into. It is deliberately small: a fixed-size buffer
//! of single-byte cells, a cursor, and one ingestion routine that applies
//! carriage-return, line-feed, wrap, and scroll rules one byte at a time.
//!
//! The crate is platform-independent and deterministic: the same byte
//! sequence always produces the same grid state, which is what the tests
//! rely on.

mod cursor;
mod screen;

pub use cursor::Cursor;
pub use screen::ScreenBuffer;
