// Durable ID sequence over a counter key
// IDs are reserved in chunks so a single allocation does not touch disk

use dray_core::error::{BackendError, Result};

/// Chunked monotonic allocator.
///
/// `acquire` persists a reservation of `bandwidth` IDs up front; `next`
/// hands them out from memory and re-reserves when the chunk runs dry.
/// The reservation write is flushed before any reserved ID is handed out,
/// so a crash can skip IDs (gaps) but never reissue one.
#[derive(Debug)]
pub(crate) struct Sequence {
    db: sled::Db,
    key: Vec<u8>,
    bandwidth: u64,
    next: u64,
    leased: u64,
}

impl Sequence {
    /// Reserve the first chunk starting at the stored high-water mark.
    pub fn acquire(db: sled::Db, key: impl Into<Vec<u8>>, bandwidth: u64) -> Result<Self> {
        if bandwidth == 0 {
            return Err(BackendError::Config(
                "sequence bandwidth must be at least 1".into(),
            ));
        }
        let key = key.into();
        let stored = read_counter(&db, &key)?;
        write_counter(&db, &key, stored + bandwidth)?;
        Ok(Self {
            db,
            key,
            bandwidth,
            next: stored,
            leased: stored + bandwidth,
        })
    }

    /// Next ID, reserving a new chunk when the current one is exhausted.
    pub fn next(&mut self) -> Result<u64> {
        if self.next == self.leased {
            write_counter(&self.db, &self.key, self.leased + self.bandwidth)?;
            self.leased += self.bandwidth;
        }
        let num = self.next;
        self.next += 1;
        Ok(num)
    }

    /// Persist the first unused ID so the rest of the chunk is not wasted
    /// on the next acquire.
    pub fn release(&mut self) -> Result<()> {
        write_counter(&self.db, &self.key, self.next).map(|_| ())
    }
}

fn read_counter(db: &sled::Db, key: &[u8]) -> Result<u64> {
    match db
        .get(key)
        .map_err(|e| BackendError::Storage(e.to_string()))?
    {
        Some(v) => {
            let bytes: [u8; 8] = v
                .as_ref()
                .try_into()
                .map_err(|_| BackendError::Storage("corrupt sequence counter".into()))?;
            Ok(u64::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

fn write_counter(db: &sled::Db, key: &[u8], value: u64) -> Result<u64> {
    db.insert(key, &value.to_be_bytes())
        .map_err(|e| BackendError::Storage(e.to_string()))?;
    db.flush()
        .map_err(|e| BackendError::Storage(e.to_string()))?;
    Ok(value)
}
