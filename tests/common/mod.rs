#![allow(dead_code)]

use async_trait::async_trait;
use remitgw::application::orchestrator::RemitCore;
use remitgw::application::registry::AdapterRegistry;
use chrono::{DateTime, Utc};
use remitgw::domain::history::{HistoryFilter, HistoryPage, RemitHistory, TxnStep};
use remitgw::domain::money::{Currency, Money};
use remitgw::domain::partner::PartnerError;
use remitgw::domain::ports::{HistoryStore, PartnerGateway, SharedGateway, StoreResult};
use remitgw::domain::remittance::{
    ProcessRemit, ProcessedRemit, Remittance, SearchRemit, SearchResult, StageReply,
    TransactionDetails, UserKyc,
};
use remitgw::error::{GatewayError, StoreError};
use remitgw::infrastructure::in_memory::InMemoryHistoryStore;
use remitgw::infrastructure::sandbox::SandboxGateway;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

pub fn remittance(partner: &str, order: &str, amount: &str) -> Remittance {
    let mut remitter = UserKyc::default();
    remitter.name.first = "Maria".into();
    remitter.name.last = "Santos".into();
    let mut receiver = UserKyc::default();
    receiver.name.first = "Jose".into();
    receiver.name.last = "Rizal".into();
    Remittance {
        remitter,
        receiver,
        source_amt: Money::parse_minor(amount, "PHP").unwrap(),
        dest_amt: Money::parse_minor(amount, "PHP").unwrap(),
        txn: TransactionDetails {
            source_country: "PH".into(),
            dest_country: "PH".into(),
            is_domestic: true,
            purpose: String::new(),
        },
        agent: Default::default(),
        control_no: String::new(),
        dsa_id: "DSA1".into(),
        dsa_order_id: order.into(),
        user_id: "user-1".into(),
        remit_partner: partner.into(),
        send_remit_type: Default::default(),
    }
}

pub fn core_with(gateway: SharedGateway) -> (RemitCore, Arc<InMemoryHistoryStore>) {
    let store = Arc::new(InMemoryHistoryStore::new());
    let registry = AdapterRegistry::with_gateway(gateway);
    (RemitCore::new(Arc::new(registry), store.clone()), store)
}

pub async fn all_rows(store: &InMemoryHistoryStore) -> Vec<RemitHistory> {
    store
        .list_remit_history(&HistoryFilter::default())
        .await
        .unwrap()
        .rows
}

pub fn php(minor: u64) -> Money {
    Money::from_minor(minor, Currency::new("PHP").unwrap())
}

/// Gateway that fails every call with the same error.
pub struct FailingGateway {
    error: GatewayError,
    calls: AtomicUsize,
}

impl FailingGateway {
    pub fn new(error: GatewayError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

#[async_trait]
impl PartnerGateway for FailingGateway {
    async fn send(
        &self,
        _partner: &str,
        _remit: &Remittance,
    ) -> Result<StageReply, GatewayError> {
        self.fail()
    }

    async fn disburse(
        &self,
        _partner: &str,
        _remit: &Remittance,
    ) -> Result<Remittance, GatewayError> {
        self.fail()
    }

    async fn confirm(
        &self,
        _partner: &str,
        _req: &ProcessRemit,
    ) -> Result<ProcessedRemit, GatewayError> {
        self.fail()
    }

    async fn search(
        &self,
        _partner: &str,
        _req: &SearchRemit,
    ) -> Result<SearchResult, GatewayError> {
        self.fail()
    }
}

/// Gateway whose calls never complete.
pub struct StalledGateway;

#[async_trait]
impl PartnerGateway for StalledGateway {
    async fn send(
        &self,
        _partner: &str,
        _remit: &Remittance,
    ) -> Result<StageReply, GatewayError> {
        std::future::pending().await
    }

    async fn disburse(
        &self,
        _partner: &str,
        _remit: &Remittance,
    ) -> Result<Remittance, GatewayError> {
        std::future::pending().await
    }

    async fn confirm(
        &self,
        _partner: &str,
        _req: &ProcessRemit,
    ) -> Result<ProcessedRemit, GatewayError> {
        std::future::pending().await
    }

    async fn search(
        &self,
        _partner: &str,
        _req: &SearchRemit,
    ) -> Result<SearchResult, GatewayError> {
        std::future::pending().await
    }
}

/// Sandbox gateway whose first confirmation is rejected by the partner.
pub struct RejectFirstConfirm {
    inner: SandboxGateway,
    rejected: AtomicBool,
    confirms: AtomicUsize,
}

impl RejectFirstConfirm {
    pub fn new() -> Self {
        Self {
            inner: SandboxGateway::default(),
            rejected: AtomicBool::new(false),
            confirms: AtomicUsize::new(0),
        }
    }

    pub fn confirms(&self) -> usize {
        self.confirms.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PartnerGateway for RejectFirstConfirm {
    async fn send(&self, partner: &str, remit: &Remittance) -> Result<StageReply, GatewayError> {
        self.inner.send(partner, remit).await
    }

    async fn disburse(
        &self,
        partner: &str,
        remit: &Remittance,
    ) -> Result<Remittance, GatewayError> {
        self.inner.disburse(partner, remit).await
    }

    async fn confirm(
        &self,
        partner: &str,
        req: &ProcessRemit,
    ) -> Result<ProcessedRemit, GatewayError> {
        self.confirms.fetch_add(1, Ordering::SeqCst);
        if !self.rejected.swap(true, Ordering::SeqCst) {
            return Err(GatewayError::Partner(PartnerError::new(
                "E-CONF",
                "payout window closed",
            )));
        }
        self.inner.confirm(partner, req).await
    }

    async fn search(
        &self,
        partner: &str,
        req: &SearchRemit,
    ) -> Result<SearchResult, GatewayError> {
        self.inner.search(partner, req).await
    }
}

/// History store whose backend refuses every write.
pub struct FailingStore;

#[async_trait]
impl HistoryStore for FailingStore {
    async fn create_remit_history(&self, _row: RemitHistory) -> StoreResult<()> {
        Err(StoreError::Backend("disk full".into()))
    }

    async fn list_remit_history(&self, _filter: &HistoryFilter) -> StoreResult<HistoryPage> {
        Ok(HistoryPage {
            rows: Vec::new(),
            total: 0,
        })
    }

    async fn get_remit_history(
        &self,
        _txn_id: Uuid,
        _step: TxnStep,
    ) -> StoreResult<Option<RemitHistory>> {
        Ok(None)
    }

    async fn update_remit_history_date(
        &self,
        _txn_id: Uuid,
        _at: DateTime<Utc>,
    ) -> StoreResult<()> {
        Ok(())
    }
}
