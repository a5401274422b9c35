// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode and guaranteed restoration.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), isatty, and raw fd writes. These are the standard POSIX
// interfaces for terminal control — there is no safe alternative. Each
// unsafe block is minimal.
#![allow(unsafe_code)]
//
// This module owns the terminal's mode. It captures the original termios
// once, installs the raw configuration, and restores the capture on every
// exit path: normal `leave()`, the `Drop` guard, or the panic hook.
//
// The panic hook deserves special mention: it bypasses Rust's stdout lock
// entirely, writing a pre-built restore sequence directly to fd 1. This
// prevents deadlock if the panic happened while holding the stdout lock
// (possible during a frame flush). One raw write, termios restored, then
// the original panic handler prints its message to a working terminal.
//
// Raw mode here also configures the read behavior the key decoder relies
// on: VMIN=0 / VTIME=1 turns every stdin read into a bounded ~100 ms wait,
// which is what lets a lone Escape be told apart from a sequence prefix.

use std::io;
#[cfg(unix)]
use std::sync::Mutex;
use std::sync::Once;

use crate::error::{Error, Result};

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Panic-Safe Restore ─────────────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// The [`Terminal`] struct owns its own copy, but the panic hook can't
/// access it. This global backup — behind a [`Mutex`], not `static mut` —
/// lets the hook restore cooked mode without the struct.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original);
            }
        }
    }
}

/// Screen restore sequence for emergency use: clear the display, home the
/// cursor, and make the cursor visible again so the panic message lands on
/// a readable screen.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[2J\x1b[H\x1b[?25h";

/// Panic hook guard — the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
///
/// Without this, a panic in raw mode leaves the user's terminal broken:
/// no echo, no line editing, no way to read the error message. The hook
/// writes [`EMERGENCY_RESTORE`] directly to fd 1 (bypassing Rust's stdout
/// lock to avoid deadlock), restores termios, then delegates to the
/// original panic handler.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the screen restore sequence directly to stdout's file descriptor.
#[cfg(unix)]
fn emergency_restore() {
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }
}

#[cfg(not(unix))]
fn emergency_restore() {
    use std::io::Write;

    let _ = io::stdout().write_all(EMERGENCY_RESTORE);
    let _ = io::stdout().flush();
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Raw-mode handle with guaranteed cleanup.
///
/// Call [`enter`](Self::enter) to take the terminal into raw mode. The
/// original attributes are restored when [`leave`](Self::leave) is called
/// or the handle is dropped — even on panic.
///
/// At most one attribute snapshot exists per process lifetime: the handle
/// clears its capture (and the panic backup) after a successful restore,
/// so the restore cannot run twice.
///
/// # Example
///
/// ```no_run
/// use slate_term::terminal::Terminal;
///
/// let mut term = Terminal::new();
/// term.enter()?;
/// // ... render frames, decode keys ...
/// term.leave()?;
/// # Ok::<(), slate_term::Error>(())
/// ```
pub struct Terminal {
    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// Whether raw mode is currently installed.
    active: bool,
}

impl Terminal {
    /// Create an inactive handle. Does not touch the terminal.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            #[cfg(unix)]
            original_termios: None,
            active: false,
        }
    }

    /// Whether raw mode is currently installed.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter raw mode.
    ///
    /// Captures the current attributes, then disables input translation,
    /// signal generation, echo, and canonical input; disables output
    /// post-processing; and sets VMIN=0 / VTIME=1 so reads are bounded
    /// ~100 ms waits instead of blocking indefinitely.
    ///
    /// Installs the panic hook (once per process). When stdin is not a
    /// TTY the attribute change is skipped — there is no terminal to
    /// configure — but the handle still activates so the call sequence
    /// works in tests and pipelines.
    ///
    /// Idempotent: calling `enter()` while active is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalConfig`] naming `tcgetattr` or `tcsetattr`
    /// if the attribute query or installation fails.
    pub fn enter(&mut self) -> Result<()> {
        if self.active {
            return Ok(());
        }

        install_panic_hook();
        self.enable_raw_mode()?;
        self.active = true;
        Ok(())
    }

    /// Leave raw mode and restore the captured attributes.
    ///
    /// Idempotent: calling `leave()` while inactive is a no-op, and the
    /// restore itself runs at most once per capture.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalConfig`] if the restore syscall fails.
    pub fn leave(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }

        self.disable_raw_mode()?;
        self.active = false;
        Ok(())
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> Result<()> {
        if !is_tty() {
            return Ok(());
        }

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) != 0 {
                return Err(Error::TerminalConfig {
                    op: "tcgetattr",
                    source: io::Error::last_os_error(),
                });
            }

            // Save original for restore.
            self.original_termios = Some(termios);

            // Also save to the global backup for the panic hook.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            // No break-to-interrupt, no CR→NL translation, no parity
            // check, no bit stripping, no flow control.
            termios.c_iflag &=
                !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
            // No output post-processing: `\n` stays `\n`, frames carry
            // their own `\r\n`.
            termios.c_oflag &= !libc::OPOST;
            termios.c_cflag |= libc::CS8;
            // No echo, no line buffering, no Ctrl-V, no signal keys.
            termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);

            // VMIN=0, VTIME=1: read() returns after at most one
            // decisecond, possibly with nothing. The key decoder's
            // timeout semantics depend on exactly this.
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = 1;

            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(Error::TerminalConfig {
                    op: "tcsetattr",
                    source: io::Error::last_os_error(),
                });
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> Result<()> {
        if let Some(ref original) = self.original_termios {
            unsafe {
                if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original) != 0 {
                    return Err(Error::TerminalConfig {
                        op: "tcsetattr",
                        source: io::Error::last_os_error(),
                    });
                }
            }

            // Clear both copies — the snapshot is restored, a second
            // restore must be impossible.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }
            self.original_termios = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
