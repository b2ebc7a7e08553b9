//! Authorized provider persistence

use crate::{StorageError, StorageResult};
use ciphergrid_core::ProviderId;
use redb::{Database, ReadableTable, TableDefinition};
use std::sync::Arc;

/// Table for granted provider identities
const PROVIDERS: TableDefinition<&[u8], u8> = TableDefinition::new("providers");

/// Provider set storage interface
pub struct ProviderStore {
    db: Arc<Database>,
}

impl ProviderStore {
    /// Create new provider store
    pub fn new(db: Arc<Database>) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PROVIDERS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Record a grant; idempotent
    pub fn grant(&self, identity: &ProviderId) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PROVIDERS)?;
            table.insert(identity.as_bytes().as_slice(), 1u8)?;
        }
        write_txn.commit()?;

        Ok(())
    }

    /// Check whether an identity has been granted
    pub fn contains(&self, identity: &ProviderId) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROVIDERS)?;
        let present = table.get(identity.as_bytes().as_slice())?.is_some();
        Ok(present)
    }

    /// All granted identities
    pub fn all(&self) -> StorageResult<Vec<ProviderId>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROVIDERS)?;

        let mut identities = Vec::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            let bytes: [u8; 32] = key.value().try_into().map_err(|_| {
                StorageError::InvalidData("provider key is not 32 bytes".into())
            })?;
            identities.push(ProviderId::from_bytes(bytes));
        }

        Ok(identities)
    }

    /// Get total provider count
    pub fn count(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROVIDERS)?;
        let len = table.len()?;
        Ok(len)
    }
}
