use super::registry::AdapterRegistry;
use crate::domain::history::{
    HistoryFilter, RemType, RemitHistory, SortColumn, SortOrder, TxnStatus, TxnStep,
};
use crate::domain::money::Money;
use crate::domain::partner::Partner;
use crate::domain::ports::SharedHistoryStore;
use crate::domain::remittance::{Address, Name, PhoneNumber, SearchRemit, SearchResult, UserKyc};
use crate::error::{RemitError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Listing parameters for completed transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterList {
    pub from: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub limit: Option<usize>,
    pub offset: usize,
    pub sort_by_column: Option<SortColumn>,
    pub sort_order: SortOrder,
    pub control_numbers: Vec<String>,
    pub exclude_partners: Vec<String>,
    pub exclude_types: Vec<RemType>,
}

impl FilterList {
    /// Parses a `YYYY-MM-DD` bound.
    pub fn parse_date(value: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map_err(|_| RemitError::InvalidArgument(format!("invalid date {value:?}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySummary {
    pub name: Name,
    pub address: Address,
    pub phone: PhoneNumber,
    pub mobile: PhoneNumber,
    pub email: String,
}

impl From<&UserKyc> for PartySummary {
    fn from(kyc: &UserKyc) -> Self {
        Self {
            name: kyc.name.clone(),
            address: kyc.address.clone(),
            phone: kyc.phone.clone(),
            mobile: kyc.mobile.clone(),
            email: kyc.email.clone(),
        }
    }
}

/// Partner-agnostic view of a completed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemitSummary {
    pub txn_id: Uuid,
    pub partner: String,
    pub control_no: String,
    pub dsa_order_id: String,
    pub rem_type: RemType,
    pub remitter: PartySummary,
    pub receiver: PartySummary,
    pub source_amt: Money,
    pub dest_amt: Money,
    pub charges: Money,
    pub taxes: Money,
    pub gross_total: Money,
    pub staged_time: DateTime<Utc>,
    pub completed_time: DateTime<Utc>,
}

impl From<RemitHistory> for RemitSummary {
    fn from(row: RemitHistory) -> Self {
        let completed_time = row.effective_time();
        let snapshot = row.remittance;
        Self {
            txn_id: row.txn_id,
            partner: row.remco_id,
            control_no: row.remco_control_no,
            dsa_order_id: row.dsa_order_id,
            rem_type: row.rem_type,
            remitter: PartySummary::from(&snapshot.remitter),
            receiver: PartySummary::from(&snapshot.receiver),
            source_amt: snapshot.source_amt,
            dest_amt: snapshot.dest_amt,
            charges: snapshot.charges,
            taxes: snapshot.taxes,
            gross_total: snapshot.gross_total,
            staged_time: row.txn_staged_time,
            completed_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRemitResponse {
    pub remittances: Vec<RemitSummary>,
    /// Offset of the next page.
    pub next: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: Name,
    pub address: Address,
    pub phone: PhoneNumber,
    pub mobile: PhoneNumber,
    pub email: String,
}

impl From<Option<UserKyc>> for ContactDetails {
    fn from(kyc: Option<UserKyc>) -> Self {
        kyc.map(|k| Self {
            name: k.name,
            address: k.address,
            phone: k.phone,
            mobile: k.mobile,
            email: k.email,
        })
        .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LookupAmounts {
    pub principal: Option<Money>,
    pub charges: Option<Money>,
    pub gross_total: Option<Money>,
    pub dest_amt: Option<Money>,
}

/// Western Union lookups keep their original, richer shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WuLookup {
    pub status: String,
    pub control_no: String,
    pub remitter: ContactDetails,
    pub receiver: ContactDetails,
    pub amounts: LookupAmounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericLookup {
    pub status: String,
    pub amounts: LookupAmounts,
    pub other_info: serde_json::Value,
}

/// `LookupRemit` answers in two shapes depending on the partner: WU predates
/// the generic form and its consumers rely on the contact breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum LookupRemitResponse {
    WesternUnion(WuLookup),
    Generic(GenericLookup),
}

impl LookupRemitResponse {
    fn build(partner: &str, result: SearchResult) -> Self {
        let amounts = LookupAmounts {
            principal: result.principal,
            charges: result.charges,
            gross_total: result.gross_total,
            dest_amt: result.dest_amt,
        };
        if partner == Partner::WesternUnion.code() {
            LookupRemitResponse::WesternUnion(WuLookup {
                status: result.status,
                control_no: result.control_no,
                remitter: result.remitter.into(),
                receiver: result.receiver.into(),
                amounts,
            })
        } else {
            LookupRemitResponse::Generic(GenericLookup {
                status: result.status,
                amounts,
                other_info: result.other_info,
            })
        }
    }
}

/// Read paths over the remit history and partner-side lookups.
#[derive(Clone)]
pub struct QueryFacade {
    registry: Arc<AdapterRegistry>,
    store: SharedHistoryStore,
}

impl QueryFacade {
    pub fn new(registry: Arc<AdapterRegistry>, store: SharedHistoryStore) -> Self {
        Self { registry, store }
    }

    /// Pages through successfully confirmed transactions.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn list_remit(&self, filter: &FilterList) -> Result<ListRemitResponse> {
        if let (Some(from), Some(until)) = (filter.from, filter.until)
            && from > until
        {
            return Err(RemitError::InvalidArgument(format!(
                "from {from} is after until {until}"
            )));
        }

        let query = HistoryFilter {
            control_numbers: filter.control_numbers.clone(),
            txn_step: Some(TxnStep::Confirm),
            txn_status: Some(TxnStatus::Success),
            from: filter.from,
            until: filter.until,
            exclude_partners: filter.exclude_partners.clone(),
            exclude_types: filter.exclude_types.clone(),
            sort: filter.sort_by_column.map(|c| (c, filter.sort_order)),
            limit: filter.limit,
            offset: filter.offset,
            ..Default::default()
        };
        let page = self
            .store
            .list_remit_history(&query)
            .await
            .map_err(|e| RemitError::storage("list remit history", e))?;

        let remittances: Vec<RemitSummary> = page.rows.into_iter().map(Into::into).collect();
        Ok(ListRemitResponse {
            next: filter.offset + remittances.len(),
            total: page.total,
            remittances,
        })
    }

    /// Asks the partner for the current state of a transaction.
    #[tracing::instrument(skip(self, req), fields(control_no = %req.control_no))]
    pub async fn lookup_remit(
        &self,
        partner: &str,
        req: &SearchRemit,
    ) -> Result<LookupRemitResponse> {
        let adapter = self.registry.resolve(partner)?;
        let result = adapter.search_remit(req).await.map_err(|e| {
            tracing::warn!(error = %e, "partner lookup failed");
            RemitError::from_adapter("lookup remit", &e)
        })?;
        Ok(LookupRemitResponse::build(adapter.kind(), result))
    }

    pub async fn get_partner_by_txn_id(&self, txn_id: Uuid) -> Result<String> {
        let stage = self
            .store
            .get_remit_history(txn_id, TxnStep::Stage)
            .await
            .map_err(|e| RemitError::storage("get remit history", e))?;
        match stage {
            Some(row) if !row.remco_id.is_empty() => Ok(row.remco_id),
            _ => Err(RemitError::NotFound(format!("no partner for transaction {txn_id}"))),
        }
    }
}
