use super::query::{FilterList, ListRemitResponse, QueryFacade};
use super::registry::AdapterRegistry;
use crate::domain::history::{
    ErrorType, RemType, RemitHistory, RemitSnapshot, TxnStatus, TxnStep,
};
use crate::domain::money::Money;
use crate::domain::partner::{ControlNoSource, Partner, generate_control_no};
use crate::domain::ports::SharedHistoryStore;
use crate::domain::remittance::{
    ProcessRemit, Remittance, SearchRemit, SearchResult, StageReply,
};
use crate::error::{AdapterError, MoneyError, RemitError, Result, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Result of a successful `stage_create_remit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedRemit {
    pub txn_id: Uuid,
    pub control_no: String,
    pub principal: Money,
    pub charges: Money,
    pub taxes: Money,
    pub gross_total: Money,
}

/// Result of a successful `stage_disburse_remit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedDisburse {
    pub txn_id: Uuid,
    pub control_no: String,
    pub remittance: Remittance,
}

/// Result of a successful `process_remit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedRemit {
    pub txn_id: Uuid,
    pub rem_type: RemType,
    /// The partner's final control number.
    pub control_no: String,
    pub status: String,
}

/// How a step ended, as recorded in its history row.
struct StepOutcome {
    status: TxnStatus,
    error_type: Option<ErrorType>,
    error_code: String,
    error_msg: String,
}

impl StepOutcome {
    fn success() -> Self {
        Self {
            status: TxnStatus::Success,
            error_type: None,
            error_code: String::new(),
            error_msg: String::new(),
        }
    }

    fn failed(error_type: ErrorType, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status: TxnStatus::Fail,
            error_type: Some(error_type),
            error_code: code.into(),
            error_msg: msg.into(),
        }
    }

    fn from_adapter(err: &AdapterError) -> Self {
        match err {
            AdapterError::Partner(pe) => Self::failed(ErrorType::Partner, &pe.code, &pe.message),
            AdapterError::NotAvailable(msg) => Self::failed(ErrorType::Unsupported, "", *msg),
            AdapterError::Transport(msg) => Self::failed(ErrorType::Transport, "", msg),
        }
    }

    /// The single place where the failure policy is applied: failed steps
    /// never persist amounts or remitter identity.
    fn snapshot(&self, snapshot: RemitSnapshot) -> RemitSnapshot {
        match self.status {
            TxnStatus::Success => snapshot,
            TxnStatus::Fail => snapshot.redacted(),
        }
    }
}

/// Fields shared by the Stage and Confirm rows of one transaction.
struct TxnIdentity {
    txn_id: Uuid,
    remco_id: String,
    remco_control_no: String,
    partner_txn_id: String,
    dsa_id: String,
    user_id: String,
    dsa_order_id: String,
    rem_type: RemType,
}

impl TxnIdentity {
    fn new(remit: &Remittance, partner: &str, control_no: String, rem_type: RemType) -> Self {
        Self {
            txn_id: Uuid::new_v4(),
            remco_id: partner.to_string(),
            remco_control_no: control_no,
            partner_txn_id: String::new(),
            dsa_id: remit.dsa_id.clone(),
            user_id: remit.user_id.clone(),
            dsa_order_id: remit.dsa_order_id.clone(),
            rem_type,
        }
    }

    /// Carries the stage row's identifiers forward unchanged.
    fn of(stage: &RemitHistory) -> Self {
        Self {
            txn_id: stage.txn_id,
            remco_id: stage.remco_id.clone(),
            remco_control_no: stage.remco_control_no.clone(),
            partner_txn_id: stage.partner_txn_id.clone(),
            dsa_id: stage.dsa_id.clone(),
            user_id: stage.user_id.clone(),
            dsa_order_id: stage.dsa_order_id.clone(),
            rem_type: stage.rem_type,
        }
    }

    fn row(
        self,
        step: TxnStep,
        outcome: StepOutcome,
        snapshot: RemitSnapshot,
        staged_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> RemitHistory {
        RemitHistory {
            txn_id: self.txn_id,
            remco_id: self.remco_id,
            remco_control_no: self.remco_control_no,
            partner_txn_id: self.partner_txn_id,
            dsa_id: self.dsa_id,
            user_id: self.user_id,
            dsa_order_id: self.dsa_order_id,
            rem_type: self.rem_type,
            txn_step: step,
            txn_status: outcome.status,
            remittance: outcome.snapshot(snapshot),
            error_code: outcome.error_code,
            error_msg: outcome.error_msg,
            error_type: outcome.error_type,
            txn_staged_time: staged_at,
            txn_completed_time: completed_at,
            updated: completed_at.unwrap_or(staged_at),
        }
    }
}

fn gross_total(principal: &Money, reply: &StageReply) -> std::result::Result<Money, MoneyError> {
    principal.checked_add(&reply.charges)?.checked_add(&reply.taxes)
}

fn new_control_no(partner: &str) -> String {
    let prefix = Partner::from_code(partner).map_or(partner, |p| p.profile().prefix);
    generate_control_no(prefix, Utc::now().date_naive(), &mut rand::thread_rng())
}

/// The remit core: drives stage → confirm flows against partner adapters
/// and records every step in the remit history.
///
/// Each step writes its history row only after the partner call resolved,
/// so dropping an operation's future mid-call leaves no row behind.
#[derive(Clone)]
pub struct RemitCore {
    registry: Arc<AdapterRegistry>,
    store: SharedHistoryStore,
    query: QueryFacade,
}

impl RemitCore {
    pub fn new(registry: Arc<AdapterRegistry>, store: SharedHistoryStore) -> Self {
        let query = QueryFacade::new(registry.clone(), store.clone());
        Self {
            registry,
            store,
            query,
        }
    }

    pub fn query(&self) -> &QueryFacade {
        &self.query
    }

    /// Stages a send with the partner.
    #[tracing::instrument(skip_all, fields(partner = %partner, dsa_order_id = %remit.dsa_order_id))]
    pub async fn stage_create_remit(
        &self,
        remit: &Remittance,
        partner: &str,
    ) -> Result<StagedRemit> {
        let adapter = self.registry.resolve(partner)?;
        let partner = adapter.kind();
        let staged_at = Utc::now();

        let result = adapter.stage_create_remit(remit).await;
        let (identity, outcome, snapshot, response) = match result {
            Ok(reply) => match gross_total(&remit.source_amt, &reply) {
                Ok(gross) => {
                    let control_no = reply
                        .control_no
                        .clone()
                        .unwrap_or_else(|| new_control_no(partner));
                    let mut identity =
                        TxnIdentity::new(remit, partner, control_no.clone(), RemType::Send);
                    identity.partner_txn_id = reply.partner_txn_id.clone().unwrap_or_default();
                    let snapshot = RemitSnapshot::new(
                        remit,
                        reply.charges.clone(),
                        reply.taxes.clone(),
                        gross.clone(),
                    );
                    let staged = StagedRemit {
                        txn_id: identity.txn_id,
                        control_no,
                        principal: remit.source_amt.clone(),
                        charges: reply.charges,
                        taxes: reply.taxes,
                        gross_total: gross,
                    };
                    (identity, StepOutcome::success(), snapshot, Ok(staged))
                }
                Err(e) => {
                    tracing::error!(error = %e, "cannot compute gross total");
                    let identity =
                        TxnIdentity::new(remit, partner, remit.control_no.clone(), RemType::Send);
                    (
                        identity,
                        StepOutcome::failed(ErrorType::Internal, "", e.to_string()),
                        RemitSnapshot::without_charges(remit),
                        Err(RemitError::Internal("failed to compute remit charges".into())),
                    )
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "partner rejected send");
                let identity =
                    TxnIdentity::new(remit, partner, remit.control_no.clone(), RemType::Send);
                (
                    identity,
                    StepOutcome::from_adapter(&e),
                    RemitSnapshot::without_charges(remit),
                    Err(RemitError::from_adapter("stage remit", &e)),
                )
            }
        };

        let row = identity.row(TxnStep::Stage, outcome, snapshot, staged_at, None);
        self.record(row).await?;
        response
    }

    /// Stages a payout with the partner.
    #[tracing::instrument(skip_all, fields(partner = %partner, dsa_order_id = %remit.dsa_order_id))]
    pub async fn stage_disburse_remit(
        &self,
        remit: &Remittance,
        partner: &str,
    ) -> Result<StagedDisburse> {
        let adapter = self.registry.resolve(partner)?;
        let partner = adapter.kind();

        let source = Partner::from_code(partner).map(|p| p.profile().disburse_control_no);
        let control_no = match source {
            Some(ControlNoSource::Generated) => new_control_no(partner),
            _ if remit.control_no.trim().is_empty() => {
                return Err(RemitError::InvalidArgument(
                    "control number is required to disburse".into(),
                ));
            }
            _ => remit.control_no.trim().to_string(),
        };
        let mut request = remit.clone();
        request.control_no = control_no.clone();
        request.remit_partner = partner.to_string();

        let staged_at = Utc::now();
        let identity = TxnIdentity::new(&request, partner, control_no.clone(), RemType::Disburse);
        let txn_id = identity.txn_id;

        let (outcome, snapshot, response) = match adapter.stage_disburse_remit(&request).await {
            Ok(disbursed) => (
                StepOutcome::success(),
                RemitSnapshot::without_charges(&disbursed),
                Ok(StagedDisburse {
                    txn_id,
                    control_no,
                    remittance: disbursed,
                }),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "partner rejected disburse");
                (
                    StepOutcome::from_adapter(&e),
                    RemitSnapshot::without_charges(&request),
                    Err(RemitError::from_adapter("stage disburse remit", &e)),
                )
            }
        };

        let row = identity.row(TxnStep::Stage, outcome, snapshot, staged_at, None);
        self.record(row).await?;
        response
    }

    /// Confirms a staged transaction with its partner.
    ///
    /// A failed confirmation is final. Confirming again after a successful
    /// one calls the partner again and keeps the first recorded Confirm row.
    #[tracing::instrument(skip_all, fields(txn_id = %req.transaction_id))]
    pub async fn process_remit(&self, req: &ProcessRemit) -> Result<ConfirmedRemit> {
        let stage = self
            .store
            .get_remit_history(req.transaction_id, TxnStep::Stage)
            .await
            .map_err(|e| RemitError::storage("get remit history", e))?
            .ok_or_else(|| {
                RemitError::NotFound(format!("transaction {} not found", req.transaction_id))
            })?;
        if stage.txn_status == TxnStatus::Fail {
            return Err(RemitError::FailedPrecondition(format!(
                "transaction {} failed at stage",
                stage.txn_id
            )));
        }
        self.ensure_not_failed(stage.txn_id).await?;
        let adapter = self.registry.resolve(&stage.remco_id)?;

        let mut confirm = req.clone();
        confirm.control_no = stage.remco_control_no.clone();
        confirm.partner_txn_id = stage.partner_txn_id.clone();
        confirm.rem_type = Some(stage.rem_type);

        let result = adapter.process_remit(&confirm).await;
        let completed_at = Utc::now();
        let identity = TxnIdentity::of(&stage);

        let (outcome, response) = match result {
            Ok(processed) => {
                let control_no = if processed.control_no.is_empty() {
                    stage.remco_control_no.clone()
                } else {
                    processed.control_no
                };
                let confirmed = ConfirmedRemit {
                    txn_id: stage.txn_id,
                    rem_type: stage.rem_type,
                    control_no,
                    status: processed.status,
                };
                (StepOutcome::success(), Ok(confirmed))
            }
            Err(e) => {
                tracing::warn!(error = %e, "partner rejected confirm");
                (
                    StepOutcome::from_adapter(&e),
                    Err(RemitError::from_adapter("confirm remit", &e)),
                )
            }
        };

        let row = identity.row(
            TxnStep::Confirm,
            outcome,
            stage.remittance.clone(),
            stage.txn_staged_time,
            Some(completed_at),
        );
        match self.record(row).await {
            Err(RemitError::Storage {
                source: StoreError::AlreadyExists { .. },
                ..
            }) => {
                // A concurrent confirmation won; its row decides the outcome.
                tracing::info!(txn_id = %stage.txn_id, "keeping first confirm row");
                self.ensure_not_failed(stage.txn_id).await?;
            }
            other => other?,
        }
        response
    }

    async fn ensure_not_failed(&self, txn_id: Uuid) -> Result<()> {
        let confirmed = self
            .store
            .get_remit_history(txn_id, TxnStep::Confirm)
            .await
            .map_err(|e| RemitError::storage("get remit history", e))?;
        match confirmed {
            Some(row) if row.txn_status == TxnStatus::Fail => Err(RemitError::FailedPrecondition(
                format!("transaction {txn_id} failed at confirm"),
            )),
            _ => Ok(()),
        }
    }

    /// Partner-side status lookup.
    #[tracing::instrument(skip_all, fields(partner = %partner, control_no = %req.control_no))]
    pub async fn search_remit(&self, partner: &str, req: &SearchRemit) -> Result<SearchResult> {
        let adapter = self.registry.resolve(partner)?;
        adapter.search_remit(req).await.map_err(|e| {
            tracing::warn!(error = %e, "partner search failed");
            RemitError::from_adapter("search remit", &e)
        })
    }

    pub async fn list_remit(&self, filter: &FilterList) -> Result<ListRemitResponse> {
        self.query.list_remit(filter).await
    }

    async fn record(&self, row: RemitHistory) -> Result<()> {
        let (txn_id, step, status) = (row.txn_id, row.txn_step, row.txn_status);
        match self.store.create_remit_history(row).await {
            Ok(()) => {
                tracing::info!(%txn_id, %step, %status, "recorded remit history");
                Ok(())
            }
            Err(e) => {
                if !matches!(e, StoreError::AlreadyExists { .. }) {
                    tracing::error!(%txn_id, %step, error = %e, "cannot record remit history");
                }
                Err(RemitError::storage("record remit history", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::history::tests::remittance;
    use crate::domain::ports::HistoryStore;
    use crate::error::Code;
    use crate::infrastructure::in_memory::InMemoryHistoryStore;
    use crate::infrastructure::sandbox::SandboxGateway;

    fn core(gateway: SandboxGateway) -> (RemitCore, Arc<InMemoryHistoryStore>) {
        let store = Arc::new(InMemoryHistoryStore::new());
        let registry = AdapterRegistry::with_gateway(Arc::new(gateway));
        (RemitCore::new(Arc::new(registry), store.clone()), store)
    }

    #[tokio::test]
    async fn test_stage_computes_gross_total() {
        let (core, _) = core(SandboxGateway::new(100, 1200));
        let staged = core
            .stage_create_remit(&remittance("WU", "O1"), "WU")
            .await
            .unwrap();

        assert_eq!(staged.principal.minor_units(), 100000);
        assert_eq!(staged.charges.minor_units(), 1000);
        assert_eq!(staged.taxes.minor_units(), 120);
        assert_eq!(staged.gross_total.minor_units(), 101120);
    }

    #[tokio::test]
    async fn test_stage_synthesises_missing_control_no() {
        let (core, _) = core(SandboxGateway::default());
        let staged = core
            .stage_create_remit(&remittance("PRH", "O1"), "PRH")
            .await
            .unwrap();

        let date = Utc::now().format("%Y%m%d").to_string();
        assert!(staged.control_no.starts_with(&format!("{date}PH")));
        assert_eq!(staged.control_no.len(), 19);
    }

    #[tokio::test]
    async fn test_disburse_requires_control_no() {
        let (core, store) = core(SandboxGateway::default());
        let err = core
            .stage_disburse_remit(&remittance("WU", "O1"), "WU")
            .await
            .unwrap_err();

        assert_eq!(err.code(), Code::InvalidArgument);
        let page = store
            .list_remit_history(&Default::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_confirm_after_failed_stage_is_rejected() {
        let (core, _) = core(SandboxGateway::default().reject_partner("CEB"));
        let remit = remittance("CEB", "O1");
        assert!(core.stage_create_remit(&remit, "CEB").await.is_err());

        let page = core
            .store
            .list_remit_history(&Default::default())
            .await
            .unwrap();
        let stage = &page.rows[0];
        let err = core
            .process_remit(&ProcessRemit::new(stage.txn_id, "terminal", ""))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::FailedPrecondition);
    }
}
