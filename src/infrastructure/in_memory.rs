use crate::domain::history::{HistoryFilter, HistoryPage, RemitHistory, TxnStep};
use crate::domain::ports::{HistoryStore, StoreResult};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Rows {
    /// Insertion order.
    log: Vec<RemitHistory>,
    index: HashMap<(Uuid, TxnStep), usize>,
}

/// A thread-safe in-memory remit history.
///
/// Rows are kept in insertion order behind an `Arc<RwLock<..>>` with a
/// `(txn_id, step)` index enforcing uniqueness. Ideal for testing or for
/// runs where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryHistoryStore {
    rows: Arc<RwLock<Rows>>,
}

impl InMemoryHistoryStore {
    /// Creates a new, empty history.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn create_remit_history(&self, row: RemitHistory) -> StoreResult<()> {
        let mut rows = self.rows.write().await;
        let key = (row.txn_id, row.txn_step);
        if rows.index.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                txn_id: row.txn_id,
                step: row.txn_step,
            });
        }
        let position = rows.log.len();
        rows.index.insert(key, position);
        rows.log.push(row);
        Ok(())
    }

    async fn list_remit_history(&self, filter: &HistoryFilter) -> StoreResult<HistoryPage> {
        let rows = self.rows.read().await;
        Ok(filter.apply(rows.log.iter().cloned()))
    }

    async fn get_remit_history(
        &self,
        txn_id: Uuid,
        step: TxnStep,
    ) -> StoreResult<Option<RemitHistory>> {
        let rows = self.rows.read().await;
        Ok(rows
            .index
            .get(&(txn_id, step))
            .map(|&position| rows.log[position].clone()))
    }

    async fn update_remit_history_date(
        &self,
        txn_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut rows = self.rows.write().await;
        let mut touched = false;
        for row in rows.log.iter_mut().filter(|r| r.txn_id == txn_id) {
            row.txn_completed_time = Some(at);
            row.updated = at;
            touched = true;
        }
        if touched {
            Ok(())
        } else {
            Err(StoreError::NotFound(txn_id))
        }
    }
}
