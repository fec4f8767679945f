//! tatty - a minimal terminal emulator
//!
//! Spawns a shell on a pseudo-terminal, renders its byte stream into a
//! fixed 80x25 character grid, and paints the grid into an X11 window.
//! Keyboard input flows back to the shell; carriage return and line feed
//! are the only control bytes interpreted. No resizing, no scrollback,
//! no escape sequences.

mod error;
mod event_loop;
mod keymap;
mod session;
mod surface;

use std::process::ExitCode;

use session::Session;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut session = match Session::create() {
        Ok(session) => session,
        Err(e) => {
            log::error!("startup failed: {e}");
            eprintln!("tatty: {e}");
            return ExitCode::FAILURE;
        }
    };

    // The loop only returns when the stream ends or an I/O error stops
    // it; either way the session is over.
    match event_loop::run(&mut session) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::info!("session ended: {e}");
            eprintln!("tatty: {e}");
            ExitCode::FAILURE
        }
    }
}
