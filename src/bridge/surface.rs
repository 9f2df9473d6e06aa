// ABOUTME: Terminal surface abstraction rendered by the session bridge
// A grid of fixed geometry that accepts raw bytes including control sequences

/// Column/row count of a terminal surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub cols: u16,
    pub rows: u16,
}

impl Geometry {
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait TerminalSurface {
    /// Current grid size.
    fn geometry(&self) -> Geometry;

    /// Recompute the grid size from the viewport and return it.
    fn fit(&mut self) -> Geometry;

    /// Render raw bytes.
    fn write(&mut self, bytes: &[u8]);

    /// Render text. Must look the same as writing its UTF-8 bytes.
    fn write_str(&mut self, text: &str) {
        self.write(text.as_bytes());
    }
}
