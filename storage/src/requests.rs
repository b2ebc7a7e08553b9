//! Pending decryption request persistence

use crate::StorageResult;
use ciphergrid_core::PendingRequest;
use ciphergrid_oracle::RequestId;
use redb::{Database, ReadableTable, TableDefinition};
use std::sync::Arc;

/// Table for pending requests by id
const REQUESTS: TableDefinition<u64, &[u8]> = TableDefinition::new("pending_requests");

/// Pending request storage interface
pub struct RequestStore {
    db: Arc<Database>,
}

impl RequestStore {
    /// Create new request store
    pub fn new(db: Arc<Database>) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(REQUESTS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Record a pending request
    pub fn put(&self, request: &PendingRequest) -> StorageResult<()> {
        let encoded = bincode::serialize(request)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(REQUESTS)?;
            table.insert(request.request_id.value(), encoded.as_slice())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    /// Drop a consumed request; reports whether it was present
    pub fn remove(&self, request_id: RequestId) -> StorageResult<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(REQUESTS)?;
            let was_present = table.remove(request_id.value())?.is_some();
            was_present
        };
        write_txn.commit()?;

        Ok(removed)
    }

    /// Get a pending request by id
    pub fn get(&self, request_id: RequestId) -> StorageResult<Option<PendingRequest>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REQUESTS)?;

        let result = match table.get(request_id.value())? {
            Some(data) => {
                let bytes = data.value().to_vec();
                Some(bincode::deserialize(&bytes)?)
            }
            None => None,
        };

        Ok(result)
    }

    /// All pending requests in ascending id order
    pub fn all(&self) -> StorageResult<Vec<PendingRequest>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REQUESTS)?;
        let bytes_list: Vec<Vec<u8>> = table
            .iter()?
            .filter_map(|r| r.ok())
            .map(|(_, data)| data.value().to_vec())
            .collect();
        drop(table);
        drop(read_txn);

        let mut requests = Vec::with_capacity(bytes_list.len());
        for bytes in bytes_list {
            let request: PendingRequest = bincode::deserialize(&bytes)?;
            requests.push(request);
        }

        Ok(requests)
    }

    /// Get total pending count
    pub fn count(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REQUESTS)?;
        let len = table.len()?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ciphergrid_core::{ProviderId, RequestKind};
    use tempfile::tempdir;

    fn request(id: u64, kind: RequestKind) -> PendingRequest {
        PendingRequest {
            request_id: RequestId::new(id),
            kind,
            initiator: ProviderId::from_bytes([id as u8; 32]),
        }
    }

    #[test]
    fn test_put_get_remove() {
        let dir = tempdir().unwrap();
        let db = Database::create(dir.path().join("test.db")).unwrap();
        let store = RequestStore::new(Arc::new(db)).unwrap();

        let pending = request(1, RequestKind::GridBuild);
        store.put(&pending).unwrap();

        assert_eq!(store.get(RequestId::new(1)).unwrap(), Some(pending));
        assert!(store.remove(RequestId::new(1)).unwrap());
        assert!(store.get(RequestId::new(1)).unwrap().is_none());
        assert!(!store.remove(RequestId::new(1)).unwrap());
    }

    #[test]
    fn test_all_in_id_order() {
        let dir = tempdir().unwrap();
        let db = Database::create(dir.path().join("test.db")).unwrap();
        let store = RequestStore::new(Arc::new(db)).unwrap();

        store.put(&request(3, RequestKind::Reveal)).unwrap();
        store.put(&request(1, RequestKind::GridBuild)).unwrap();
        store.put(&request(2, RequestKind::GridBuild)).unwrap();

        let all = store.all().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(
            all.iter().map(|r| r.request_id.value()).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(store.count().unwrap(), 3);
    }
}
