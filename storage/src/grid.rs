//! Density grid persistence
//!
//! The grid is stored as a single metadata row plus one cell row per
//! linear index. A rebuild replaces metadata and every cell in one
//! write transaction, so readers never observe a half-replaced grid.

use crate::{StorageError, StorageResult};
use ciphergrid_ahe::Ciphertext;
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Table for the grid metadata singleton
const GRID_META: TableDefinition<&str, &[u8]> = TableDefinition::new("grid_meta");

/// Table for grid cells by linear index
const GRID_CELLS: TableDefinition<u32, &[u8]> = TableDefinition::new("grid_cells");

const META_KEY: &str = "grid";

/// Grid metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMeta {
    /// Resolution of the stored cells; 0 = never built
    pub resolution: u32,
    /// Whether the one-shot reveal has completed
    pub revealed: bool,
    /// Resolution the next grid-build callback will allocate
    pub target_resolution: u32,
}

impl Default for GridMeta {
    fn default() -> Self {
        Self {
            resolution: 0,
            revealed: false,
            target_resolution: 0,
        }
    }
}

/// Grid storage interface
pub struct GridStore {
    db: Arc<Database>,
}

impl GridStore {
    /// Create new grid store
    pub fn new(db: Arc<Database>) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(GRID_META)?;
            let _ = write_txn.open_table(GRID_CELLS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Replace the stored grid atomically
    pub fn save(&self, meta: &GridMeta, cells: &[Ciphertext]) -> StorageResult<()> {
        let meta_encoded = bincode::serialize(meta)?;
        let mut cell_rows = Vec::with_capacity(cells.len());
        for cell in cells {
            cell_rows.push(bincode::serialize(cell)?);
        }

        let write_txn = self.db.begin_write()?;
        {
            let mut meta_table = write_txn.open_table(GRID_META)?;
            meta_table.insert(META_KEY, meta_encoded.as_slice())?;

            let mut cell_table = write_txn.open_table(GRID_CELLS)?;
            let old_len = cell_table.len()?;
            for (index, row) in cell_rows.iter().enumerate() {
                cell_table.insert(index as u32, row.as_slice())?;
            }
            for stale in cell_rows.len() as u64..old_len {
                cell_table.remove(stale as u32)?;
            }
        }
        write_txn.commit()?;

        Ok(())
    }

    /// Update metadata without touching cells
    pub fn save_meta(&self, meta: &GridMeta) -> StorageResult<()> {
        let encoded = bincode::serialize(meta)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(GRID_META)?;
            table.insert(META_KEY, encoded.as_slice())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    /// Get stored metadata
    pub fn meta(&self) -> StorageResult<Option<GridMeta>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(GRID_META)?;

        let result = match table.get(META_KEY)? {
            Some(data) => {
                let bytes = data.value().to_vec();
                Some(bincode::deserialize(&bytes)?)
            }
            None => None,
        };

        Ok(result)
    }

    /// Load metadata and cells, checking they agree
    pub fn load(&self) -> StorageResult<Option<(GridMeta, Vec<Ciphertext>)>> {
        let meta = match self.meta()? {
            Some(meta) => meta,
            None => return Ok(None),
        };

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(GRID_CELLS)?;
        let rows: Vec<(u32, Vec<u8>)> = table
            .iter()?
            .filter_map(|r| r.ok())
            .map(|(k, v)| (k.value(), v.value().to_vec()))
            .collect();
        drop(table);
        drop(read_txn);

        let expected = if meta.resolution == 0 {
            0
        } else {
            (meta.resolution as usize).pow(3)
        };
        if rows.len() != expected {
            return Err(StorageError::Corruption(format!(
                "grid has {} cells, resolution {} implies {}",
                rows.len(),
                meta.resolution,
                expected
            )));
        }

        let mut cells = Vec::with_capacity(rows.len());
        for (position, (key, bytes)) in rows.into_iter().enumerate() {
            if key as usize != position {
                return Err(StorageError::Corruption(format!(
                    "grid cell index {key} out of place at position {position}"
                )));
            }
            cells.push(bincode::deserialize(&bytes)?);
        }

        Ok(Some((meta, cells)))
    }

    /// Get stored cell count
    pub fn cell_count(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(GRID_CELLS)?;
        let len = table.len()?;
        Ok(len)
    }
}
