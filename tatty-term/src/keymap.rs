//! Keycode-to-bytes decoding
//!
//! Fetches the server's keyboard mapping once at startup and reproduces
//! the classic core-protocol lookup: Latin-1 keysyms decode to their own
//! byte, shift selects the second keysym column, control folds letters
//! and a handful of punctuation into C0 bytes. Keys with no byte
//! representation (arrows, function keys, bare modifiers) decode to
//! nothing, which the caller treats as a valid result.

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ConnectionExt, KeyButMask, Keysym};
use x11rb::rust_connection::RustConnection;

use crate::surface::SurfaceError;

// Keysym values from X11/keysymdef.h
const XK_BACKSPACE: Keysym = 0xff08;
const XK_TAB: Keysym = 0xff09;
const XK_RETURN: Keysym = 0xff0d;
const XK_ESCAPE: Keysym = 0xff1b;
const XK_KP_ENTER: Keysym = 0xff8d;
const XK_DELETE: Keysym = 0xffff;

/// The server's keycode-to-keysym table.
pub struct Keymap {
    first_keycode: u8,
    keysyms_per_keycode: u8,
    keysyms: Vec<Keysym>,
}

impl Keymap {
    /// Fetch the full mapping for the server's keycode range.
    pub fn fetch(conn: &RustConnection) -> Result<Self, SurfaceError> {
        let setup = conn.setup();
        let first_keycode = setup.min_keycode;
        let count = setup.max_keycode - setup.min_keycode + 1;
        let reply = conn.get_keyboard_mapping(first_keycode, count)?.reply()?;
        Ok(Self {
            first_keycode,
            keysyms_per_keycode: reply.keysyms_per_keycode,
            keysyms: reply.keysyms,
        })
    }

    fn keysym(&self, keycode: u8, column: usize) -> Keysym {
        if keycode < self.first_keycode || column >= self.keysyms_per_keycode as usize {
            return 0;
        }
        let row = (keycode - self.first_keycode) as usize;
        self.keysyms
            .get(row * self.keysyms_per_keycode as usize + column)
            .copied()
            .unwrap_or(0)
    }

    /// Decode one key press into the bytes it feeds the shell.
    ///
    /// An empty result is a normal outcome, not an error: most keycodes
    /// (modifiers, arrows, function keys) have no byte form here.
    pub fn decode(&self, keycode: u8, state: KeyButMask) -> Vec<u8> {
        let shift = state.contains(KeyButMask::SHIFT);
        let mut sym = self.keysym(keycode, usize::from(shift));
        if sym == 0 && shift {
            // Keys without a shifted column fall back to the plain one.
            sym = self.keysym(keycode, 0);
        }

        match sym {
            XK_RETURN | XK_KP_ENTER => vec![b'\r'],
            XK_BACKSPACE => vec![0x08],
            XK_TAB => vec![b'\t'],
            XK_ESCAPE => vec![0x1b],
            XK_DELETE => vec![0x7f],
            // Latin-1 keysyms are their own byte value.
            0x20..=0x7e | 0xa0..=0xff => {
                let byte = sym as u8;
                if state.contains(KeyButMask::CONTROL) {
                    ctrl_fold(byte)
                } else {
                    vec![byte]
                }
            }
            _ => Vec::new(),
        }
    }
}

/// Fold a printable byte under Control into its C0 form.
fn ctrl_fold(byte: u8) -> Vec<u8> {
    if byte.is_ascii_alphabetic() {
        return vec![byte.to_ascii_uppercase() - b'A' + 1];
    }
    match byte {
        b'@' | b' ' => vec![0x00],
        b'[' => vec![0x1b],
        b'\\' => vec![0x1c],
        b']' => vec![0x1d],
        b'^' => vec![0x1e],
        b'_' => vec![0x1f],
        b'?' => vec![0x7f],
        _ => vec![byte],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A two-keycode map: keycode 10 is 'a'/'A', keycode 11 is Return.
    fn test_map() -> Keymap {
        Keymap {
            first_keycode: 10,
            keysyms_per_keycode: 2,
            keysyms: vec![0x61, 0x41, XK_RETURN, 0],
        }
    }

    #[test]
    fn plain_letter_decodes_to_itself() {
        let map = test_map();
        assert_eq!(map.decode(10, KeyButMask::default()), b"a");
    }

    #[test]
    fn shift_selects_second_column() {
        let map = test_map();
        assert_eq!(map.decode(10, KeyButMask::SHIFT), b"A");
    }

    #[test]
    fn return_decodes_to_carriage_return() {
        let map = test_map();
        assert_eq!(map.decode(11, KeyButMask::default()), b"\r");
        // Return has no shifted column; shift falls back to column 0.
        assert_eq!(map.decode(11, KeyButMask::SHIFT), b"\r");
    }

    #[test]
    fn control_folds_letters_to_c0() {
        let map = test_map();
        assert_eq!(map.decode(10, KeyButMask::CONTROL), vec![0x01]);
    }

    #[test]
    fn unknown_keycode_decodes_to_nothing() {
        let map = test_map();
        assert!(map.decode(9, KeyButMask::default()).is_empty());
        assert!(map.decode(200, KeyButMask::default()).is_empty());
    }

    #[test]
    fn ctrl_punctuation_table() {
        assert_eq!(ctrl_fold(b'['), vec![0x1b]);
        assert_eq!(ctrl_fold(b'?'), vec![0x7f]);
        assert_eq!(ctrl_fold(b' '), vec![0x00]);
        assert_eq!(ctrl_fold(b'3'), vec![b'3']);
    }
}
