//! Line clear: remove full rows bottom-up and award doubling points per row.

use crate::arena::Grid;

/// Points for the first row cleared in one sweep; each further row doubles it.
pub const BASE_LINE_POINTS: u32 = 10;

impl Grid {
    /// Clear every full row except row 0, adding points to `score`.
    /// Returns the number of rows cleared.
    ///
    /// Each row cleared within this call is worth twice the previous one
    /// (10, 20, 40, ...). The multiplier starts over on the next call.
    pub fn sweep(&mut self, score: &mut u32) -> u32 {
        let mut multiplier = 1u32;
        let mut cleared = 0;
        let mut y = self.height().saturating_sub(1);
        while y > 0 {
            if self.is_row_full(y) {
                // Rows above dropped into `y`; look at it again.
                self.collapse_row(y);
                *score = score.saturating_add(multiplier.saturating_mul(BASE_LINE_POINTS));
                multiplier = multiplier.saturating_mul(2);
                cleared += 1;
            } else {
                y -= 1;
            }
        }
        cleared
    }
}
