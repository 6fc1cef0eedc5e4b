use super::history::{HistoryFilter, HistoryPage, RemitHistory, TxnStep};
use super::remittance::{
    ProcessRemit, ProcessedRemit, Remittance, SearchRemit, SearchResult, StageReply,
};
use crate::error::{AdapterError, GatewayError, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// The upstream gateway multiplexing every partner integration.
#[async_trait]
pub trait PartnerGateway: Send + Sync {
    async fn send(&self, partner: &str, remit: &Remittance) -> Result<StageReply, GatewayError>;
    async fn disburse(&self, partner: &str, remit: &Remittance)
    -> Result<Remittance, GatewayError>;
    async fn confirm(&self, partner: &str, req: &ProcessRemit)
    -> Result<ProcessedRemit, GatewayError>;
    async fn search(&self, partner: &str, req: &SearchRemit) -> Result<SearchResult, GatewayError>;
}

/// Per-partner translation between normalized requests and the gateway.
///
/// Implementations never mutate caller-owned values: every method borrows
/// its input and returns a fresh result.
#[async_trait]
pub trait PartnerAdapter: Send + Sync {
    /// The partner code this adapter is registered under.
    fn kind(&self) -> &str;
    async fn stage_create_remit(&self, remit: &Remittance) -> Result<StageReply, AdapterError>;
    async fn stage_disburse_remit(&self, remit: &Remittance) -> Result<Remittance, AdapterError>;
    async fn process_remit(&self, req: &ProcessRemit) -> Result<ProcessedRemit, AdapterError>;
    async fn search_remit(&self, req: &SearchRemit) -> Result<SearchResult, AdapterError>;
}

/// Durable audit log of transaction steps.
///
/// Inserts are append-only and unique on `(txn_id, txn_step)`.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn create_remit_history(&self, row: RemitHistory) -> StoreResult<()>;
    async fn list_remit_history(&self, filter: &HistoryFilter) -> StoreResult<HistoryPage>;
    async fn get_remit_history(
        &self,
        txn_id: Uuid,
        step: TxnStep,
    ) -> StoreResult<Option<RemitHistory>>;
    /// Rewrites the completion time of every row of a transaction. Meant for
    /// backfills and for exercising date filters.
    async fn update_remit_history_date(&self, txn_id: Uuid, at: DateTime<Utc>)
    -> StoreResult<()>;
}

pub type HistoryStoreBox = Box<dyn HistoryStore>;
pub type SharedHistoryStore = Arc<dyn HistoryStore>;
pub type SharedGateway = Arc<dyn PartnerGateway>;
pub type SharedAdapter = Arc<dyn PartnerAdapter>;
