// SPDX-License-Identifier: MIT
//
// Error types for the terminal layer.
//
// Every variant here is fatal at the point it occurs: there is no retry
// policy anywhere in this crate. The one condition that is explicitly NOT
// an error is a read timing out with no data — the key decoder treats that
// as flow control and tries again.

use std::io;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// A fatal terminal-layer error.
#[derive(Debug, Error)]
pub enum Error {
    /// Getting or setting terminal attributes failed. `op` names the
    /// syscall so the exit message identifies the failing operation.
    #[error("terminal configuration failed in {op}: {source}")]
    TerminalConfig {
        /// The termios call that failed (`tcgetattr` or `tcsetattr`).
        op: &'static str,
        /// The underlying OS error.
        source: io::Error,
    },

    /// A read or write syscall failed for a reason other than timeout.
    #[error("terminal I/O failed: {0}")]
    Io(io::Error),

    /// The window-size probe failed or returned unparsable data.
    #[error("window size probe failed: {0}")]
    Geometry(&'static str),

    /// Growing the render frame failed. The frame's existing content is
    /// untouched when this is reported.
    #[error("render frame allocation failed")]
    OutOfMemory,
}

impl From<io::Error> for Error {
    /// Fold `io::Error` into the crate error, preserving the out-of-memory
    /// kind that [`crate::frame::RenderFrame`]'s `Write` impl reports.
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::OutOfMemory {
            Self::OutOfMemory
        } else {
            Self::Io(err)
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
