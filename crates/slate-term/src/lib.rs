// SPDX-License-Identifier: MIT
//
// slate-term — terminal control layer for slate.
//
// Everything the editor needs to own a terminal lives here: raw-mode
// configuration with guaranteed restoration, a byte-at-a-time key
// decoder for escape sequences, an append-only frame buffer flushed
// with a single write per redraw, and a window-size probe that falls
// back to a cursor-report round-trip when the direct query fails.
//
// This crate intentionally avoids external TUI frameworks (ratatui,
// crossterm) in favor of direct terminal control via ANSI escape
// sequences and raw termios. Every byte sent to the terminal is
// accounted for, and every byte read from it is decoded explicitly.

pub mod ansi;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod input;
pub mod reader;
pub mod terminal;

pub use error::{Error, Result};
