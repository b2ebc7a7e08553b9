//! Observation storage

use crate::{StorageError, StorageResult};
use ciphergrid_core::Observation;
use redb::{Database, ReadableTable, TableDefinition};
use std::sync::Arc;

/// Table for observations by sequential id
const OBSERVATIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("observations");

/// Observation storage interface
pub struct ObservationStore {
    db: Arc<Database>,
}

impl ObservationStore {
    /// Create new observation store
    pub fn new(db: Arc<Database>) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(OBSERVATIONS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Save an observation under its id
    pub fn put(&self, observation: &Observation) -> StorageResult<()> {
        let encoded = bincode::serialize(observation)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(OBSERVATIONS)?;
            table.insert(observation.id, encoded.as_slice())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    /// Get observation by id
    pub fn get(&self, id: u64) -> StorageResult<Option<Observation>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OBSERVATIONS)?;

        let result = match table.get(id)? {
            Some(data) => {
                let bytes = data.value().to_vec();
                Some(bincode::deserialize(&bytes)?)
            }
            None => None,
        };

        Ok(result)
    }

    /// All observations in ascending id order
    pub fn all(&self) -> StorageResult<Vec<Observation>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OBSERVATIONS)?;
        let bytes_list: Vec<Vec<u8>> = table
            .iter()?
            .filter_map(|r| r.ok())
            .map(|(_, data)| data.value().to_vec())
            .collect();
        drop(table);
        drop(read_txn);

        let mut observations = Vec::with_capacity(bytes_list.len());
        for bytes in bytes_list {
            let obs: Observation = bincode::deserialize(&bytes)?;
            observations.push(obs);
        }

        Ok(observations)
    }

    /// Highest stored id, if any
    pub fn latest_id(&self) -> StorageResult<Option<u64>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OBSERVATIONS)?;
        let mut iter = table.iter()?;
        let last = iter.next_back();
        let id_opt = last.transpose()?.map(|(key, _)| key.value());
        Ok(id_opt)
    }

    /// Get total observation count
    pub fn count(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OBSERVATIONS)?;
        let len = table.len()?;
        Ok(len)
    }

    /// Check stored ids are contiguous from 1
    pub fn check_contiguous(&self) -> StorageResult<()> {
        let count = self.count()?;
        let latest = self.latest_id()?.unwrap_or(0);
        if latest != count {
            return Err(StorageError::Corruption(format!(
                "observation ids not contiguous: count={count} latest={latest}"
            )));
        }
        Ok(())
    }
}
