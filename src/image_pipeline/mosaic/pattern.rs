//! The fixed 2x2 color filter layout.

/// Number of color channels a pattern cell can select from.
pub const CHANNEL_COUNT: usize = 3;

/// Maps pixel parity to the channel (0 = R, 1 = G, 2 = B) the sensor records there.
///
/// Indexed as `cells[x % 2][y % 2]`. Only the RGGB layout exists; the type is kept
/// opaque so the layout travels through the configuration instead of living in a global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BayerPattern {
    cells: [[usize; 2]; 2],
}

impl BayerPattern {
    /// R G
    /// G B
    pub const RGGB: BayerPattern = BayerPattern {
        cells: [[0, 1], [1, 2]],
    };

    #[inline]
    pub fn channel_at(&self, x: usize, y: usize) -> usize {
        self.cells[x % 2][y % 2]
    }
}

impl Default for BayerPattern {
    fn default() -> Self {
        Self::RGGB
    }
}
