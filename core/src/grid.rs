//! Encrypted density grid
//!
//! A cubic array of ciphertext accumulators. Coordinates are folded
//! into range by modulus (wrap-around binning), never bounds-checked.
//! The grid is either empty or fully allocated with resolution³ cells;
//! allocation always starts from fresh encrypted zeros.

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};
use ciphergrid_ahe::{Ciphertext, CiphertextHandle};

/// Largest allowed grid resolution per axis
pub const MAX_RESOLUTION: u32 = 100;

/// 3-dimensional grid of encrypted accumulators
///
/// `revealed` is monotone: once set it is never cleared, not even by a
/// full rebuild.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DensityGrid {
    /// Row-major cells: x outer, y middle, z inner. Empty until allocated.
    cells: Vec<Ciphertext>,
    resolution: u32,
    revealed: bool,
}

impl Default for DensityGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl DensityGrid {
    /// Create an unallocated grid
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            resolution: 0,
            revealed: false,
        }
    }

    /// Rebuild from persisted state
    pub fn restore(resolution: u32, revealed: bool, cells: Vec<Ciphertext>) -> Self {
        Self {
            cells,
            resolution,
            revealed,
        }
    }

    /// Check a resolution against the allowed range
    pub fn validate_resolution(resolution: u32) -> CoreResult<()> {
        if resolution == 0 || resolution > MAX_RESOLUTION {
            return Err(CoreError::InvalidResolution(resolution));
        }
        Ok(())
    }

    /// Replace the grid with resolution³ encrypted-zero cells
    ///
    /// Prior contents are discarded, not merged. The revealed flag is
    /// left untouched.
    pub fn allocate(&mut self, resolution: u32) -> CoreResult<()> {
        Self::validate_resolution(resolution)?;

        let cell_count = (resolution as usize).pow(3);
        self.cells = vec![Ciphertext::zero(); cell_count];
        self.resolution = resolution;
        Ok(())
    }

    /// Add a value into the cell at the binned coordinates
    ///
    /// Indices are taken modulo the resolution; any u32 coordinate is
    /// accepted. The grid must be allocated.
    pub fn accumulate(&mut self, x: u32, y: u32, z: u32, value: &Ciphertext) {
        debug_assert!(self.is_populated(), "accumulate on unallocated grid");
        let index = self.index(x, y, z);
        self.cells[index] += value;
    }

    /// True iff the grid has been allocated
    pub fn is_populated(&self) -> bool {
        !self.cells.is_empty()
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Latch the revealed flag; idempotent, never cleared
    pub fn mark_revealed(&mut self) {
        self.revealed = true;
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// The cell a coordinate triple bins into, if allocated
    pub fn cell(&self, x: u32, y: u32, z: u32) -> Option<&Ciphertext> {
        if !self.is_populated() {
            return None;
        }
        Some(&self.cells[self.index(x, y, z)])
    }

    /// Raw cells in flatten order, for persistence
    pub fn cells(&self) -> &[Ciphertext] {
        &self.cells
    }

    /// All cell values as transport handles in a fixed traversal order
    ///
    /// Outer x, middle y, inner z: the handle at position
    /// `(x * r + y) * r + z` is cell (x, y, z), so a decrypted reply
    /// can be mapped back positionally.
    pub fn flatten_for_reveal(&self) -> CoreResult<Vec<CiphertextHandle>> {
        self.cells
            .iter()
            .map(|cell| cell.to_handle().map_err(CoreError::from))
            .collect()
    }

    fn index(&self, x: u32, y: u32, z: u32) -> usize {
        let r = self.resolution as usize;
        let (x, y, z) = (x as usize % r, y as usize % r, z as usize % r);
        (x * r + y) * r + z
    }
}
