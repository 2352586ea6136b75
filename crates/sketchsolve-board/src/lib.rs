//! The drawing side of Sketchsolve: a raster board with pen/eraser tools,
//! PNG snapshotting for upload, and the result panel that displays whatever
//! the model sent back.

pub mod board;
pub mod palette;
pub mod panel;
pub mod snapshot;

pub use board::{Board, DrawState, Point};
pub use palette::{Color, PALETTE, Theme, Tool};
pub use panel::{AnalysisOutcome, RequestToken, ResultPanel};

use sketchsolve_core::Result;

/// A board plus its result panel, wired together so reset and theme toggling
/// keep the two consistent.
pub struct Sketchpad {
    pub board: Board,
    pub panel: ResultPanel,
}

impl Sketchpad {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            board: Board::new(width, height),
            panel: ResultPanel::new(),
        }
    }

    /// Clear the drawing and the displayed result. In-flight analyses are
    /// invalidated.
    pub fn reset(&mut self) {
        self.board.reset();
        self.panel.clear();
    }

    /// Swap light/dark. Clears drawing and result like a reset.
    pub fn toggle_theme(&mut self) {
        self.board.toggle_theme();
        self.panel.clear();
    }

    /// Flatten the board for analysis: downscale to `max_dim` and encode as
    /// base64 PNG.
    pub fn snapshot(&self, max_dim: u32) -> Result<String> {
        let scaled = snapshot::downscale_to_fit(self.board.raster(), max_dim);
        snapshot::encode_base64_png(&scaled)
    }
}
