// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Window geometry — how big is the screen we own?
//
// Two strategies, tried in order:
//
//   1. `ioctl(TIOCGWINSZ)` — the direct kernel query. Instant, no terminal
//      round-trip, works on every modern Unix.
//
//   2. The escape-sequence round-trip: park the cursor at the bottom-right
//      corner with oversized moves (terminals clamp at their edges), then
//      ask the terminal where the cursor is (`ESC[6n`) and parse the reply
//      `ESC[<rows>;<cols>R` byte by byte.
//
// The fallback exists because some terminal paths (serial lines, odd
// emulators) do not answer the ioctl. If both strategies fail there is no
// sane default — geometry failure is fatal at startup.
//
// The reply read is bounded twice over: each byte read is timeout-bounded
// by raw mode's VTIME, and the total reply length is capped so a terminal
// that never sends `R` cannot grow the buffer without limit.

use std::io::Write;

use crate::ansi;
use crate::error::{Error, Result};
use crate::reader::ByteSource;

/// Terminal dimensions in character cells. Both fields are positive for
/// any value produced by this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

/// Longest cursor-position reply we will buffer before giving up.
///
/// `ESC [ 65535 ; 65535 R` is 13 bytes; 32 leaves generous slack.
const MAX_REPORT_LEN: usize = 32;

/// Query the window size: direct ioctl first, probe round-trip second.
///
/// `out` must be the terminal the probe sequences should reach (stdout);
/// `input` must deliver the terminal's reply bytes (stdin in raw mode).
///
/// # Errors
///
/// Returns [`Error::Geometry`] if the ioctl is unavailable and the probe
/// fails, and [`Error::Io`] if reading the reply fails outright.
pub fn window_size(out: &mut impl Write, input: &mut impl ByteSource) -> Result<Size> {
    if let Some(size) = ioctl_size() {
        return Ok(size);
    }
    probe(out, input)
}

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
fn ioctl_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
fn ioctl_size() -> Option<Size> {
    None
}

/// Measure the screen by cursor-report round-trip.
///
/// # Errors
///
/// Returns [`Error::Geometry`] if the query writes fail, the reply never
/// terminates in `R` within the length cap, or the reply is unparsable.
pub fn probe(out: &mut impl Write, input: &mut impl ByteSource) -> Result<Size> {
    send_query(out).map_err(|_| Error::Geometry("query write failed"))?;

    let mut reply = Vec::with_capacity(MAX_REPORT_LEN);
    let mut terminated = false;
    while reply.len() < MAX_REPORT_LEN {
        match input.read_byte()? {
            // Timeout mid-reply: the terminal is not answering.
            None => break,
            Some(b'R') => {
                terminated = true;
                break;
            }
            Some(byte) => reply.push(byte),
        }
    }
    if !terminated {
        return Err(Error::Geometry("cursor report missing terminator"));
    }

    parse_cursor_report(&reply).ok_or(Error::Geometry("cursor report unparsable"))
}

/// Emit the probe's query: park the cursor, then ask where it landed.
fn send_query(out: &mut impl Write) -> std::io::Result<()> {
    ansi::cursor_force_bottom_right(out)?;
    ansi::request_cursor_position(out)?;
    out.flush()
}

/// Parse a cursor-position report body: `ESC [ <rows> ; <cols>` (the `R`
/// terminator is consumed by the read loop, not passed in).
///
/// Both fields must be positive; anything else is malformed.
fn parse_cursor_report(reply: &[u8]) -> Option<Size> {
    let rest = reply.strip_prefix(b"\x1b[")?;
    let (rows, rest) = parse_u16(rest)?;
    let rest = rest.strip_prefix(b";")?;
    let (cols, rest) = parse_u16(rest)?;
    if !rest.is_empty() || rows == 0 || cols == 0 {
        return None;
    }
    Some(Size { cols, rows })
}

/// Parse a decimal `u16` from the front of a byte slice.
///
/// Returns the value and the remaining bytes; `None` when the slice does
/// not start with a digit or the value overflows.
fn parse_u16(buf: &[u8]) -> Option<(u16, &[u8])> {
    let mut val: u16 = 0;
    let mut pos = 0;
    while pos < buf.len() && buf[pos].is_ascii_digit() {
        val = val
            .checked_mul(10)?
            .checked_add(u16::from(buf[pos] - b'0'))?;
        pos += 1;
    }
    if pos == 0 {
        return None;
    }
    Some((val, &buf[pos..]))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
