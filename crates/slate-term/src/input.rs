// SPDX-License-Identifier: MIT
//
// Terminal key decoder.
//
// Turns the raw stdin byte stream into logical keys. The stream is
// ambiguous at its prefix: a 0x1B byte is either a standalone Escape
// keypress or the start of a multi-byte sequence (`ESC [ A` for arrow-up,
// `ESC [ 5 ~` for page-up, `ESC O H` for Home on some terminals). The
// sequences are variable length and self-terminating only by a fixed
// alphabet of final bytes, so the decoder runs as a byte-at-a-time state
// machine with bounded lookahead — at most 3 bytes beyond the ESC.
//
// The timeout is the disambiguator. Every read is bounded (~100 ms under
// raw mode's VTIME); when ESC is followed by silence, the user pressed
// Escape. When it is followed by `[` or `O`, a sequence is in flight and
// the remaining bytes are already in the terminal's output buffer, so the
// follow-up reads return immediately in practice.
//
// Decoding one key:
//
//   Start ── ESC ──► Escape1 ── '[' ──► Bracket1 ── 'A'..'F'  ──► arrow/Home/End
//     │                │                  │
//     │                │                  └── '0'..'9' ──► BracketDigit ── '~' ──► vt key
//     │                └── 'O' ──► O1 ── 'H'/'F' ──► Home/End
//     │
//     └── control byte ──► Ctrl, printable byte ──► Char
//
// Every dangling edge (timeout, unknown byte) collapses to a bare Escape,
// mirroring how terminals expect unrecognized sequences to be dropped.

use crate::error::Result;
use crate::reader::ByteSource;

/// The escape byte that introduces every sequence.
const ESC: u8 = 0x1B;

/// A decoded logical key.
///
/// Closed set: the session loop matches exhaustively, so adding a variant
/// is a compile-visible change at every dispatch site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable byte (0x20..=0x7E and high bytes).
    Char(u8),
    /// A control byte (0x00..=0x1F or 0x7F), carried raw so dispatch can
    /// compare against [`ctrl`] chords.
    Ctrl(u8),
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    // ── Editing ─────────────────────────────────────────────────
    Delete,
    /// A standalone Escape keypress, or an unrecognized escape sequence.
    Escape,
}

/// The control chord for a letter: `ctrl(b'q')` is what Ctrl-Q delivers.
///
/// Terminals transmit Ctrl-letter as the letter with the top three bits
/// stripped, so Ctrl-Q is 0x11 and Ctrl-A is 0x01.
#[must_use]
pub const fn ctrl(c: u8) -> u8 {
    c & 0x1F
}

/// Whether a byte is a control byte rather than a printable character.
const fn is_control(byte: u8) -> bool {
    byte < 0x20 || byte == 0x7F
}

/// Read and decode one logical key, blocking until a key arrives.
///
/// Timeouts before the first byte are retried indefinitely — that wait is
/// the session's idle state. Timeouts *inside* a sequence resolve the
/// prefix ambiguity instead (see module docs).
///
/// # Errors
///
/// Returns [`crate::Error::Io`] if the source fails for any reason other
/// than a timeout.
pub fn read_key(src: &mut impl ByteSource) -> Result<Key> {
    loop {
        let Some(byte) = src.read_byte()? else {
            // No key yet. Re-enter the bounded read.
            continue;
        };
        return Ok(match byte {
            ESC => read_escape(src)?,
            b if is_control(b) => Key::Ctrl(b),
            b => Key::Char(b),
        });
    }
}

/// Decode the byte after ESC: sequence introducer, or nothing.
fn read_escape(src: &mut impl ByteSource) -> Result<Key> {
    Ok(match src.read_byte()? {
        // Silence after ESC: the user pressed the Escape key itself.
        None => Key::Escape,
        Some(b'[') => read_bracket(src)?,
        Some(b'O') => read_ss3(src)?,
        Some(_) => Key::Escape,
    })
}

/// Decode the byte after `ESC [`.
fn read_bracket(src: &mut impl ByteSource) -> Result<Key> {
    Ok(match src.read_byte()? {
        Some(b'A') => Key::Up,
        Some(b'B') => Key::Down,
        Some(b'C') => Key::Right,
        Some(b'D') => Key::Left,
        Some(b'H') => Key::Home,
        Some(b'F') => Key::End,
        Some(digit @ b'0'..=b'9') => read_vt_key(src, digit)?,
        None | Some(_) => Key::Escape,
    })
}

/// Decode the terminator after `ESC [ <digit>` — VT-style keys end in `~`.
fn read_vt_key(src: &mut impl ByteSource, digit: u8) -> Result<Key> {
    Ok(match src.read_byte()? {
        Some(b'~') => match digit {
            b'1' | b'7' => Key::Home,
            b'3' => Key::Delete,
            b'4' | b'8' => Key::End,
            b'5' => Key::PageUp,
            b'6' => Key::PageDown,
            // 0, 2, 9 have no binding here; drop the sequence.
            _ => Key::Escape,
        },
        // Unrecognized terminator (or none): the whole sequence collapses.
        None | Some(_) => Key::Escape,
    })
}

/// Decode the byte after `ESC O` (SS3 sequences from some terminals).
fn read_ss3(src: &mut impl ByteSource) -> Result<Key> {
    Ok(match src.read_byte()? {
        Some(b'H') => Key::Home,
        Some(b'F') => Key::End,
        None | Some(_) => Key::Escape,
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::Error;
    use crate::reader::ScriptedSource;

    /// Helper: decode one key from a plain byte script.
    fn decode(bytes: &[u8]) -> Key {
        read_key(&mut ScriptedSource::bytes(bytes)).unwrap()
    }

    /// Helper: decode one key and assert the script was fully consumed —
    /// the decoder must take exactly the sequence's bytes, no more, no less.
    fn decode_exact(bytes: &[u8]) -> Key {
        let mut src = ScriptedSource::bytes(bytes);
        let key = read_key(&mut src).unwrap();
        assert_eq!(src.remaining(), 0, "decoder left bytes unconsumed");
        key
    }

    // ── Printable and control bytes ─────────────────────────────────────

    #[test]
    fn printable_ascii() {
        assert_eq!(decode_exact(b"a"), Key::Char(b'a'));
        assert_eq!(decode_exact(b" "), Key::Char(b' '));
        assert_eq!(decode_exact(b"~"), Key::Char(b'~'));
    }

    #[test]
    fn control_bytes() {
        assert_eq!(decode_exact(b"\x01"), Key::Ctrl(0x01));
        assert_eq!(decode_exact(b"\x11"), Key::Ctrl(ctrl(b'q')));
        assert_eq!(decode_exact(b"\x7f"), Key::Ctrl(0x7F));
        assert_eq!(decode_exact(b"\x00"), Key::Ctrl(0x00));
    }

    #[test]
    fn carriage_return_is_a_control_byte() {
        assert_eq!(decode_exact(b"\r"), Key::Ctrl(b'\r'));
    }

    #[test]
    fn ctrl_chord_values() {
        assert_eq!(ctrl(b'q'), 0x11);
        assert_eq!(ctrl(b'a'), 0x01);
        assert_eq!(ctrl(b'z'), 0x1A);
    }

    // ── Arrow keys and CSI letter finals ────────────────────────────────

    #[test]
    fn arrow_up() {
        assert_eq!(decode_exact(b"\x1b[A"), Key::Up);
    }

    #[test]
    fn arrow_down() {
        assert_eq!(decode_exact(b"\x1b[B"), Key::Down);
    }

    #[test]
    fn arrow_right() {
        assert_eq!(decode_exact(b"\x1b[C"), Key::Right);
    }

    #[test]
    fn arrow_left() {
        assert_eq!(decode_exact(b"\x1b[D"), Key::Left);
    }

    #[test]
    fn home_csi_h() {
        assert_eq!(decode_exact(b"\x1b[H"), Key::Home);
    }

    #[test]
    fn end_csi_f() {
        assert_eq!(decode_exact(b"\x1b[F"), Key::End);
    }

    // ── VT tilde sequences ──────────────────────────────────────────────

    #[test]
    fn home_vt_1() {
        assert_eq!(decode_exact(b"\x1b[1~"), Key::Home);
    }

    #[test]
    fn delete_vt_3() {
        assert_eq!(decode_exact(b"\x1b[3~"), Key::Delete);
    }

    #[test]
    fn end_vt_4() {
        assert_eq!(decode_exact(b"\x1b[4~"), Key::End);
    }

    #[test]
    fn page_up_vt_5() {
        assert_eq!(decode_exact(b"\x1b[5~"), Key::PageUp);
    }

    #[test]
    fn page_down_vt_6() {
        assert_eq!(decode_exact(b"\x1b[6~"), Key::PageDown);
    }

    #[test]
    fn home_vt_7() {
        assert_eq!(decode_exact(b"\x1b[7~"), Key::Home);
    }

    #[test]
    fn end_vt_8() {
        assert_eq!(decode_exact(b"\x1b[8~"), Key::End);
    }

    #[test]
    fn unbound_vt_digits_collapse_to_escape() {
        assert_eq!(decode_exact(b"\x1b[0~"), Key::Escape);
        assert_eq!(decode_exact(b"\x1b[2~"), Key::Escape);
        assert_eq!(decode_exact(b"\x1b[9~"), Key::Escape);
    }

    #[test]
    fn vt_sequence_with_wrong_terminator_collapses() {
        assert_eq!(decode_exact(b"\x1b[5x"), Key::Escape);
    }

    // ── SS3 sequences ───────────────────────────────────────────────────

    #[test]
    fn ss3_home() {
        assert_eq!(decode_exact(b"\x1bOH"), Key::Home);
    }

    #[test]
    fn ss3_end() {
        assert_eq!(decode_exact(b"\x1bOF"), Key::End);
    }

    #[test]
    fn ss3_unknown_collapses_to_escape() {
        assert_eq!(decode_exact(b"\x1bOZ"), Key::Escape);
    }

    // ── Escape disambiguation ───────────────────────────────────────────

    #[test]
    fn lone_escape_resolves_on_timeout() {
        let mut src = ScriptedSource::new(&[Some(ESC), None]);
        assert_eq!(read_key(&mut src).unwrap(), Key::Escape);
    }

    #[test]
    fn lone_escape_does_not_swallow_a_later_byte() {
        // ESC, silence, then an unrelated keypress: two distinct keys.
        let mut src = ScriptedSource::new(&[Some(ESC), None, Some(b'x')]);
        assert_eq!(read_key(&mut src).unwrap(), Key::Escape);
        assert_eq!(read_key(&mut src).unwrap(), Key::Char(b'x'));
        assert_eq!(src.remaining(), 0);
    }

    #[test]
    fn escape_then_unknown_byte_is_escape() {
        assert_eq!(decode(b"\x1bq"), Key::Escape);
    }

    #[test]
    fn bracket_then_timeout_is_escape() {
        let mut src = ScriptedSource::new(&[Some(ESC), Some(b'['), None]);
        assert_eq!(read_key(&mut src).unwrap(), Key::Escape);
    }

    #[test]
    fn digit_then_timeout_is_escape() {
        let mut src = ScriptedSource::new(&[Some(ESC), Some(b'['), Some(b'5'), None]);
        assert_eq!(read_key(&mut src).unwrap(), Key::Escape);
    }

    #[test]
    fn ss3_then_timeout_is_escape() {
        let mut src = ScriptedSource::new(&[Some(ESC), Some(b'O'), None]);
        assert_eq!(read_key(&mut src).unwrap(), Key::Escape);
    }

    #[test]
    fn bracket_with_unknown_final_is_escape() {
        assert_eq!(decode_exact(b"\x1b[Z"), Key::Escape);
    }

    // ── Timeout retry at the start state ────────────────────────────────

    #[test]
    fn leading_timeouts_are_retried() {
        let mut src = ScriptedSource::new(&[None, None, None, Some(b'k')]);
        assert_eq!(read_key(&mut src).unwrap(), Key::Char(b'k'));
    }

    // ── Sequential decoding ─────────────────────────────────────────────

    #[test]
    fn sequences_and_plain_bytes_interleave() {
        let mut src = ScriptedSource::bytes(b"\x1b[Aq\x1b[6~\x11");
        assert_eq!(read_key(&mut src).unwrap(), Key::Up);
        assert_eq!(read_key(&mut src).unwrap(), Key::Char(b'q'));
        assert_eq!(read_key(&mut src).unwrap(), Key::PageDown);
        assert_eq!(read_key(&mut src).unwrap(), Key::Ctrl(ctrl(b'q')));
        assert_eq!(src.remaining(), 0);
    }

    #[test]
    fn every_terminator_sequence_maps_to_its_key() {
        let table: &[(&[u8], Key)] = &[
            (b"\x1b[A", Key::Up),
            (b"\x1b[B", Key::Down),
            (b"\x1b[C", Key::Right),
            (b"\x1b[D", Key::Left),
            (b"\x1b[H", Key::Home),
            (b"\x1b[F", Key::End),
            (b"\x1b[1~", Key::Home),
            (b"\x1b[3~", Key::Delete),
            (b"\x1b[4~", Key::End),
            (b"\x1b[5~", Key::PageUp),
            (b"\x1b[6~", Key::PageDown),
            (b"\x1b[7~", Key::Home),
            (b"\x1b[8~", Key::End),
            (b"\x1bOH", Key::Home),
            (b"\x1bOF", Key::End),
        ];
        for &(bytes, expected) in table {
            assert_eq!(decode_exact(bytes), expected, "sequence {bytes:?}");
        }
    }

    // ── Error propagation ───────────────────────────────────────────────

    struct FailingSource;

    impl ByteSource for FailingSource {
        fn read_byte(&mut self) -> Result<Option<u8>> {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "terminal gone",
            )))
        }
    }

    #[test]
    fn read_error_is_fatal() {
        let err = read_key(&mut FailingSource).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
