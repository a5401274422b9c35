// SPDX-License-Identifier: MIT
//
// slate — a minimal terminal screen editor.
//
// This is the binary that wires the session together on top of slate-term:
//
//   slate-term → raw mode, key decoding, frame buffering, geometry
//
// Each iteration of the session loop flows:
//
//   session state → RenderFrame → one write to stdout
//   stdin bytes → read_key → dispatch → session state
//
// Layout:
//
//   ┌──────────────────────────────┐
//   │ text rows / tilde fillers    │  ← rows - 1 lines
//   │   (centered banner when no   │
//   │    text is loaded)           │
//   ├──────────────────────────────┤
//   │ final tilde row, no CRLF     │  ← 1 line
//   └──────────────────────────────┘
//
// The terminal itself is the only resource. Raw mode is entered before the
// first read and released on every exit path: the quit chord, a fatal
// error (via the Drop guard), or a panic (via slate-term's hook).

use std::io::{self, Write};
use std::process;

use slate_term::ansi;
use slate_term::error::Result;
use slate_term::frame::RenderFrame;
use slate_term::geometry::{self, Size};
use slate_term::input::{self, Key, ctrl};
use slate_term::reader::TtyReader;
use slate_term::terminal::Terminal;

/// Welcome banner shown centered when no text is loaded.
const BANNER: &str = concat!("slate -- version ", env!("CARGO_PKG_VERSION"));

// ─── Text rows ──────────────────────────────────────────────────────────────

/// One displayed row of text, stored as raw bytes.
///
/// Rows are rendered with byte-based truncation; multi-byte characters are
/// out of scope for this core.
struct TextRow {
    bytes: Vec<u8>,
}

// ─── Cursor ─────────────────────────────────────────────────────────────────

/// Zero-based cursor position, clamped to the window after every move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct CursorPos {
    /// Column, in `[0, cols - 1]`.
    x: u16,
    /// Row, in `[0, rows - 1]`.
    y: u16,
}

// ─── Dispatch result ────────────────────────────────────────────────────────

/// What the session tells the loop to do after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Keep running.
    Continue,
    /// Exit the session cleanly.
    Quit,
}

// ─── Session ────────────────────────────────────────────────────────────────

/// The editor session state: window geometry, cursor, and visible text.
///
/// Passed explicitly through the loop and its callees — there is no
/// process-wide editor singleton.
struct Session {
    /// Window geometry, probed once at startup. Both fields are positive.
    size: Size,
    /// Current cursor position.
    cursor: CursorPos,
    /// Loaded text rows. The demo session holds exactly one.
    text: Vec<TextRow>,
}

impl Session {
    /// A session with no text, cursor at the origin.
    const fn new(size: Size) -> Self {
        Self {
            size,
            cursor: CursorPos { x: 0, y: 0 },
            text: Vec::new(),
        }
    }

    /// Load the compiled-in demo line. A real editor would hand this to a
    /// text-buffer component and feed it decoded keys instead.
    fn open_demo(&mut self) {
        self.text.push(TextRow {
            bytes: b"Hello world!".to_vec(),
        });
    }

    // ── Key dispatch ────────────────────────────────────────────────

    /// Apply one decoded key to the session state.
    ///
    /// Movement clamps the cursor to `[0, cols-1] × [0, rows-1]`. The quit
    /// chord is Ctrl-Q. Everything else is a no-op at this stage.
    fn dispatch(&mut self, key: Key) -> Action {
        match key {
            Key::Ctrl(c) if c == ctrl(b'q') => return Action::Quit,
            Key::Up => {
                if self.cursor.y > 0 {
                    self.cursor.y -= 1;
                }
            }
            Key::Down => {
                if self.cursor.y + 1 < self.size.rows {
                    self.cursor.y += 1;
                }
            }
            Key::Left => {
                if self.cursor.x > 0 {
                    self.cursor.x -= 1;
                }
            }
            Key::Right => {
                if self.cursor.x + 1 < self.size.cols {
                    self.cursor.x += 1;
                }
            }
            Key::PageUp => {
                self.cursor.y = self.cursor.y.saturating_sub(self.size.rows);
            }
            Key::PageDown => {
                // Bounded by the screen height, mirroring the page-up
                // clamp; a full buffer implementation would bound by
                // content length instead.
                self.cursor.y = self
                    .cursor
                    .y
                    .saturating_add(self.size.rows)
                    .min(self.size.rows - 1);
            }
            Key::Home => self.cursor.x = 0,
            Key::End => self.cursor.x = self.size.cols - 1,
            Key::Char(_) | Key::Ctrl(_) | Key::Delete | Key::Escape => {}
        }
        Action::Continue
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Assemble one complete frame for the current state.
    ///
    /// Identical state renders to byte-identical frames.
    fn render(&self) -> Result<RenderFrame> {
        let mut frame = RenderFrame::new();
        ansi::cursor_hide(&mut frame)?;
        ansi::cursor_home(&mut frame)?;
        self.draw_rows(&mut frame)?;
        ansi::cursor_to(&mut frame, self.cursor.x, self.cursor.y)?;
        ansi::cursor_show(&mut frame)?;
        Ok(frame)
    }

    /// Draw the visible rows: text, tilde fillers, and the banner.
    ///
    /// The final row gets its tilde and clear-line but no CRLF, so the
    /// cursor-position sequence can follow without opening a blank line.
    fn draw_rows(&self, frame: &mut RenderFrame) -> Result<()> {
        for r in 0..self.size.rows - 1 {
            if let Some(row) = self.text.get(usize::from(r)) {
                let len = row.bytes.len().min(usize::from(self.size.cols));
                frame.append(&row.bytes[..len])?;
            } else if r == self.size.rows / 2 && self.text.is_empty() {
                self.draw_banner(frame)?;
            } else {
                frame.append(b"~")?;
                ansi::clear_line(frame)?;
                frame.append(b"\r\n")?;
            }
        }
        frame.append(b"~")?;
        ansi::clear_line(frame)?;
        Ok(())
    }

    /// Draw the centered version banner, clamped to the window width.
    /// The first padding column renders as the row's tilde.
    fn draw_banner(&self, frame: &mut RenderFrame) -> Result<()> {
        let banner = BANNER.as_bytes();
        let len = banner.len().min(usize::from(self.size.cols));
        let mut padding = (usize::from(self.size.cols) - len) / 2;
        if padding > 0 {
            frame.append(b"~")?;
            padding -= 1;
        }
        for _ in 0..padding {
            frame.append(b" ")?;
        }
        frame.append(&banner[..len])?;
        ansi::clear_line(frame)?;
        frame.append(b"\r\n")?;
        Ok(())
    }

    /// Render the current state and push it to the terminal in one write.
    fn draw(&self, out: &mut impl Write) -> Result<()> {
        let mut frame = self.render()?;
        frame.flush_to(out)
    }
}

// ─── Entry ──────────────────────────────────────────────────────────────────

/// Clear the screen and home the cursor. Run on exit so the shell prompt
/// starts on a clean display.
fn reset_screen(out: &mut impl Write) -> Result<()> {
    ansi::clear_screen(out)?;
    ansi::cursor_home(out)?;
    out.flush()?;
    Ok(())
}

/// Set up the terminal, then loop: draw, read one key, dispatch.
fn run() -> Result<()> {
    let mut terminal = Terminal::new();
    terminal.enter()?;

    let mut keys = TtyReader::stdin();
    let mut stdout = io::stdout();

    // Geometry needs raw mode: the probe's reply arrives unbuffered on
    // stdin. Failure here is fatal — there is no sane default size.
    let size = geometry::window_size(&mut stdout, &mut keys)?;

    let mut session = Session::new(size);
    session.open_demo();

    loop {
        session.draw(&mut stdout)?;
        let key = input::read_key(&mut keys)?;
        if session.dispatch(key) == Action::Quit {
            reset_screen(&mut stdout)?;
            terminal.leave()?;
            return Ok(());
        }
    }
}

fn main() {
    if let Err(err) = run() {
        // Raw mode has already been released by the Drop guard by the
        // time the error reaches us; clear whatever the failed frame
        // left behind so the message is readable.
        let _ = reset_screen(&mut io::stdout());
        eprintln!("slate: {err}");
        process::exit(1);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
