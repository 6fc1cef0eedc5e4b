use crate::domain::history::{HistoryFilter, HistoryPage, RemitHistory, TxnStep};
use crate::domain::ports::{HistoryStore, StoreResult};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Column Family holding rows keyed by insertion sequence.
pub const CF_HISTORY: &str = "remit_history";
/// Column Family mapping `(txn_id, step)` to the row's sequence.
pub const CF_TXN_INDEX: &str = "txn_index";

const STEPS: [TxnStep; 2] = [TxnStep::Stage, TxnStep::Confirm];

/// A persistent remit history backed by RocksDB.
///
/// Rows live in an append-only column family keyed by a big-endian
/// sequence number, so iteration yields insertion order. A second column
/// family indexes `(txn_id, step)` and enforces uniqueness.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbHistoryStore {
    db: Arc<DB>,
    /// Next sequence number; also serializes the check-then-insert path.
    next_seq: Arc<Mutex<u64>>,
}

impl RocksDbHistoryStore {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_HISTORY, Options::default()),
            ColumnFamilyDescriptor::new(CF_TXN_INDEX, Options::default()),
        ];
        let db = DB::open_cf_descriptors(&opts, path.as_ref(), cfs)?;

        let next_seq = {
            let cf = db
                .cf_handle(CF_HISTORY)
                .ok_or_else(|| missing_cf(CF_HISTORY))?;
            match db.iterator_cf(cf, IteratorMode::End).next() {
                Some(item) => decode_seq(&item?.0)? + 1,
                None => 0,
            }
        };
        tracing::info!(path = %path.as_ref().display(), next_seq, "opened remit history");

        Ok(Self {
            db: Arc::new(db),
            next_seq: Arc::new(Mutex::new(next_seq)),
        })
    }

    fn cf(&self, name: &'static str) -> StoreResult<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| missing_cf(name))
    }

    fn seq_of(&self, txn_id: Uuid, step: TxnStep) -> StoreResult<Option<u64>> {
        let index = self.cf(CF_TXN_INDEX)?;
        self.db
            .get_cf(index, index_key(txn_id, step))?
            .map(|bytes| decode_seq(&bytes))
            .transpose()
    }

    fn row_at(&self, seq: u64) -> StoreResult<Option<RemitHistory>> {
        let history = self.cf(CF_HISTORY)?;
        match self.db.get_cf(history, seq.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

fn missing_cf(name: &str) -> StoreError {
    StoreError::Backend(format!("column family {name} not found"))
}

fn index_key(txn_id: Uuid, step: TxnStep) -> Vec<u8> {
    let mut key = txn_id.as_bytes().to_vec();
    key.push(match step {
        TxnStep::Stage => 0,
        TxnStep::Confirm => 1,
    });
    key
}

fn decode_seq(bytes: &[u8]) -> StoreResult<u64> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| {
        StoreError::Backend(format!("corrupt sequence key of {} bytes", bytes.len()))
    })?;
    Ok(u64::from_be_bytes(raw))
}

#[async_trait]
impl HistoryStore for RocksDbHistoryStore {
    async fn create_remit_history(&self, row: RemitHistory) -> StoreResult<()> {
        let mut next_seq = self.next_seq.lock().await;
        if self.seq_of(row.txn_id, row.txn_step)?.is_some() {
            return Err(StoreError::AlreadyExists {
                txn_id: row.txn_id,
                step: row.txn_step,
            });
        }

        let seq = *next_seq;
        let value = serde_json::to_vec(&row)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_HISTORY)?, seq.to_be_bytes(), value);
        batch.put_cf(
            self.cf(CF_TXN_INDEX)?,
            index_key(row.txn_id, row.txn_step),
            seq.to_be_bytes(),
        );
        self.db.write(batch)?;

        *next_seq += 1;
        Ok(())
    }

    async fn list_remit_history(&self, filter: &HistoryFilter) -> StoreResult<HistoryPage> {
        let history = self.cf(CF_HISTORY)?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(history, IteratorMode::Start) {
            let (_key, value) = item?;
            rows.push(serde_json::from_slice::<RemitHistory>(&value)?);
        }
        Ok(filter.apply(rows))
    }

    async fn get_remit_history(
        &self,
        txn_id: Uuid,
        step: TxnStep,
    ) -> StoreResult<Option<RemitHistory>> {
        match self.seq_of(txn_id, step)? {
            Some(seq) => self.row_at(seq),
            None => Ok(None),
        }
    }

    async fn update_remit_history_date(
        &self,
        txn_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let _writer = self.next_seq.lock().await;
        let mut batch = WriteBatch::default();
        let mut touched = false;
        for step in STEPS {
            let Some(seq) = self.seq_of(txn_id, step)? else {
                continue;
            };
            let Some(mut row) = self.row_at(seq)? else {
                continue;
            };
            row.txn_completed_time = Some(at);
            row.updated = at;
            batch.put_cf(self.cf(CF_HISTORY)?, seq.to_be_bytes(), serde_json::to_vec(&row)?);
            touched = true;
        }
        if !touched {
            return Err(StoreError::NotFound(txn_id));
        }
        self.db.write(batch)?;
        Ok(())
    }
}
