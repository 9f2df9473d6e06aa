// ABOUTME: Terminal surface backed by the controlling tty
// Writes session output straight to stdout and reads geometry from crossterm

use crate::bridge::{Geometry, TerminalSurface};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{self, Write};
use tracing::{debug, warn};

/// Puts the terminal in raw mode for as long as it is alive.
pub struct RawModeGuard(());

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self(()))
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to leave raw mode: {}", e);
        }
    }
}

/// Viewport size of the controlling terminal, if it can be read.
pub fn viewport_size() -> Option<Geometry> {
    match crossterm::terminal::size() {
        Ok((cols, rows)) if cols > 0 && rows > 0 => Some(Geometry::new(cols, rows)),
        Ok(_) => None,
        Err(e) => {
            debug!("Cannot read terminal size: {}", e);
            None
        }
    }
}

/// Terminal surface writing to `W`.
pub struct TtySurface<W: Write> {
    out: W,
    geometry: Geometry,
    viewport: fn() -> Option<Geometry>,

    /// Translate a bare LF into CRLF, as raw mode no longer does it.
    convert_eol: bool,
    last_was_cr: bool,
}

impl TtySurface<io::Stdout> {
    pub fn stdout(convert_eol: bool) -> Self {
        Self::new(io::stdout(), viewport_size, convert_eol)
    }
}

impl<W: Write> TtySurface<W> {
    pub fn new(out: W, viewport: fn() -> Option<Geometry>, convert_eol: bool) -> Self {
        Self {
            out,
            geometry: viewport().unwrap_or_default(),
            viewport,
            convert_eol,
            last_was_cr: false,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn translate(&mut self, bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(bytes.len() + bytes.len() / 8);
        for &b in bytes {
            if b == b'\n' && !self.last_was_cr {
                out.push(b'\r');
            }
            out.push(b);
            self.last_was_cr = b == b'\r';
        }
        out
    }
}

impl<W: Write> TerminalSurface for TtySurface<W> {
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn fit(&mut self) -> Geometry {
        if let Some(geometry) = (self.viewport)() {
            self.geometry = geometry;
        }
        self.geometry
    }

    fn write(&mut self, bytes: &[u8]) {
        let result = if self.convert_eol {
            let translated = self.translate(bytes);
            self.out.write_all(&translated)
        } else {
            self.out.write_all(bytes)
        };

        if let Err(e) = result.and_then(|()| self.out.flush()) {
            debug!("Failed to write {} bytes to terminal: {}", bytes.len(), e);
        }
    }
}
