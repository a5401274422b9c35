// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Byte acquisition from the terminal.
//
// The key decoder consumes bytes one at a time through the `ByteSource`
// trait. The production implementation reads the raw stdin descriptor,
// where raw mode's VMIN=0 / VTIME=1 makes every read a bounded wait:
// a keypress byte arrives immediately, or the read returns empty after
// ~100 ms. That timeout is the decoder's disambiguation signal for a
// lone Escape, so it is reported as `Ok(None)`, never as an error.
//
// Reading happens on the calling thread. There is no background reader:
// the session loop has nothing to do between keys, and the VTIME bound
// already keeps the process off the CPU while it waits.

use std::io;

use crate::error::{Error, Result};

/// A source of single bytes with timeout-bounded reads.
///
/// `Ok(Some(byte))` — a byte arrived. `Ok(None)` — the read timed out with
/// no data (normal flow control, not an error). `Err` — the underlying read
/// failed and the session must terminate.
pub trait ByteSource {
    /// Read one byte, waiting at most the source's configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the read fails for any reason other than
    /// timing out with no data.
    fn read_byte(&mut self) -> Result<Option<u8>>;
}

/// Byte source over the process's controlling terminal (stdin).
///
/// Only meaningful after raw mode is entered: in canonical mode the
/// descriptor delivers whole lines, not keystrokes.
pub struct TtyReader {
    #[cfg(unix)]
    fd: libc::c_int,
}

impl TtyReader {
    /// A reader over the standard input descriptor.
    #[must_use]
    pub const fn stdin() -> Self {
        Self {
            #[cfg(unix)]
            fd: libc::STDIN_FILENO,
        }
    }
}

#[cfg(unix)]
impl ByteSource for TtyReader {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte: u8 = 0;
        // One-byte raw read. With VMIN=0/VTIME=1 the kernel returns 0 when
        // the decisecond window closes with no input.
        let n = unsafe { libc::read(self.fd, (&raw mut byte).cast::<libc::c_void>(), 1) };
        match n {
            1 => Ok(Some(byte)),
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::WouldBlock {
                    Ok(None)
                } else {
                    Err(Error::Io(err))
                }
            }
        }
    }
}

/// Non-unix fallback: blocking one-byte reads from stdin.
///
/// No read timeout exists here, so a lone ESC cannot be distinguished from
/// a sequence prefix until the next byte arrives. Degraded but functional.
#[cfg(not(unix))]
impl ByteSource for TtyReader {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        use std::io::Read;

        let mut byte = [0u8; 1];
        match io::stdin().lock().read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(err) => Err(Error::Io(err)),
        }
    }
}

// ─── Test support ────────────────────────────────────────────────────────────

/// A byte source driven by a fixed script, for decoder and geometry tests.
///
/// Each script entry is either `Some(byte)` or `None` for one timed-out
/// read. An exhausted script keeps timing out.
#[cfg(test)]
pub(crate) struct ScriptedSource {
    script: std::collections::VecDeque<Option<u8>>,
}

#[cfg(test)]
impl ScriptedSource {
    pub(crate) fn new(script: &[Option<u8>]) -> Self {
        Self {
            script: script.iter().copied().collect(),
        }
    }

    /// Convenience: a script of bytes with no timeouts.
    pub(crate) fn bytes(bytes: &[u8]) -> Self {
        Self {
            script: bytes.iter().map(|&b| Some(b)).collect(),
        }
    }

    /// Script entries not yet consumed.
    pub(crate) fn remaining(&self) -> usize {
        self.script.len()
    }
}

#[cfg(test)]
impl ByteSource for ScriptedSource {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.script.pop_front().flatten())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_source_replays_in_order() {
        let mut src = ScriptedSource::bytes(b"ab");
        assert_eq!(src.read_byte().unwrap(), Some(b'a'));
        assert_eq!(src.read_byte().unwrap(), Some(b'b'));
        assert_eq!(src.read_byte().unwrap(), None);
    }

    #[test]
    fn scripted_source_replays_timeouts() {
        let mut src = ScriptedSource::new(&[Some(0x1B), None, Some(b'x')]);
        assert_eq!(src.read_byte().unwrap(), Some(0x1B));
        assert_eq!(src.read_byte().unwrap(), None);
        assert_eq!(src.read_byte().unwrap(), Some(b'x'));
    }

    #[test]
    fn scripted_source_tracks_remaining() {
        let mut src = ScriptedSource::bytes(b"xyz");
        assert_eq!(src.remaining(), 3);
        let _ = src.read_byte();
        assert_eq!(src.remaining(), 2);
    }

    #[test]
    fn tty_reader_construction_does_not_touch_the_terminal() {
        // Construction must be free of side effects; reading is what blocks.
        let _ = TtyReader::stdin();
    }
}
