use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::*;

/// Uniform placement by rejection sampling: draw a random cell, keep it unless it already holds a mine.
///
/// Gives no first-click guarantee, any cell including the first one revealed may be mined.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomMinefieldGenerator<R> {
    rng: R,
}

impl<R: Rng> RandomMinefieldGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomMinefieldGenerator<SmallRng> {
    /// Reproducible generator, the same seed always yields the same layout.
    pub fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MinefieldGenerator for RandomMinefieldGenerator<R> {
    fn generate(mut self, config: GameConfig) -> MineLayout {
        let size = config.size();
        let mut mine_mask: Array2<bool> = Array2::default((size, size).to_nd_index());
        let mut mines_placed: CellCount = 0;
        let mut draws: u32 = 0;

        if config.mines() > config.total_cells() / 2 {
            log::warn!(
                "Dense minefield requested, {} mines on {} cells, expect many redraws",
                config.mines(),
                config.total_cells()
            );
        }

        // GameConfig guarantees at least one free cell, so this terminates
        while mines_placed < config.mines() {
            let coords: Coord2 = (
                self.rng.random_range(0..size),
                self.rng.random_range(0..size),
            );
            draws += 1;

            let cell = &mut mine_mask[coords.to_nd_index()];
            if !*cell {
                *cell = true;
                mines_placed += 1;
            }
        }

        log::debug!(
            "Placed {} mines on a {}x{} board in {} draws",
            mines_placed,
            size,
            size,
            draws
        );
        MineLayout::from_parts(mine_mask, mines_placed)
    }
}
