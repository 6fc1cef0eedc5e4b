use super::money::Money;
use super::remittance::{Remittance, SendRemitType, UserKyc};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemType {
    Send,
    Disburse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnStep {
    Stage,
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnStatus {
    Success,
    Fail,
}

/// Origin of a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Partner,
    Transport,
    Unsupported,
    Internal,
}

macro_rules! display_as_str {
    ($ty:ty { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

display_as_str!(RemType { Send => "send", Disburse => "disburse" });
display_as_str!(TxnStep { Stage => "stage", Confirm => "confirm" });
display_as_str!(TxnStatus { Success => "success", Fail => "fail" });
display_as_str!(ErrorType {
    Partner => "partner",
    Transport => "transport",
    Unsupported => "unsupported",
    Internal => "internal",
});

/// Denormalized copy of the parties and amounts at the time of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemitSnapshot {
    pub remitter: UserKyc,
    pub receiver: UserKyc,
    pub source_amt: Money,
    pub dest_amt: Money,
    pub charges: Money,
    pub taxes: Money,
    pub gross_total: Money,
    pub source_country: String,
    pub dest_country: String,
    pub send_remit_type: SendRemitType,
}

impl RemitSnapshot {
    pub fn new(remit: &Remittance, charges: Money, taxes: Money, gross_total: Money) -> Self {
        Self {
            remitter: remit.remitter.clone(),
            receiver: remit.receiver.clone(),
            source_amt: remit.source_amt.clone(),
            dest_amt: remit.dest_amt.clone(),
            charges,
            taxes,
            gross_total,
            source_country: remit.txn.source_country.clone(),
            dest_country: remit.txn.dest_country.clone(),
            send_remit_type: remit.send_remit_type,
        }
    }

    /// Snapshot without fees, for legs where the partner reports none.
    pub fn without_charges(remit: &Remittance) -> Self {
        let zero = Money::zero(remit.source_amt.currency().clone());
        Self::new(remit, zero.clone(), zero, remit.source_amt.clone())
    }

    /// The copy persisted for failed steps: every amount collapses to zero
    /// in its own currency and the remitter's identity is dropped.
    pub fn redacted(&self) -> Self {
        let zero = |m: &Money| Money::zero(m.currency().clone());
        Self {
            remitter: UserKyc::default(),
            receiver: self.receiver.clone(),
            source_amt: zero(&self.source_amt),
            dest_amt: zero(&self.dest_amt),
            charges: zero(&self.charges),
            taxes: zero(&self.taxes),
            gross_total: zero(&self.gross_total),
            source_country: self.source_country.clone(),
            dest_country: self.dest_country.clone(),
            send_remit_type: self.send_remit_type,
        }
    }
}

/// One audit row per (transaction, step).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemitHistory {
    pub txn_id: Uuid,
    pub remco_id: String,
    pub remco_control_no: String,
    #[serde(default)]
    pub partner_txn_id: String,
    pub dsa_id: String,
    pub user_id: String,
    pub dsa_order_id: String,
    pub rem_type: RemType,
    pub txn_step: TxnStep,
    pub txn_status: TxnStatus,
    pub error_code: String,
    pub error_msg: String,
    pub error_type: Option<ErrorType>,
    pub remittance: RemitSnapshot,
    pub txn_staged_time: DateTime<Utc>,
    pub txn_completed_time: Option<DateTime<Utc>>,
    pub updated: DateTime<Utc>,
}

impl RemitHistory {
    /// Time used by date-range filters.
    pub fn effective_time(&self) -> DateTime<Utc> {
        self.txn_completed_time.unwrap_or(self.txn_staged_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Partner,
    StagedTime,
    CompletedTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Store-level query. Empty/`None` fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub control_numbers: Vec<String>,
    pub partner: Option<String>,
    pub rem_type: Option<RemType>,
    pub txn_step: Option<TxnStep>,
    pub txn_status: Option<TxnStatus>,
    pub from: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub exclude_partners: Vec<String>,
    pub exclude_types: Vec<RemType>,
    pub sort: Option<(SortColumn, SortOrder)>,
    pub limit: Option<usize>,
    pub offset: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPage {
    pub rows: Vec<RemitHistory>,
    /// Matching rows before pagination.
    pub total: usize,
}

impl HistoryFilter {
    pub fn matches(&self, row: &RemitHistory) -> bool {
        if !self.control_numbers.is_empty()
            && !self.control_numbers.iter().any(|c| *c == row.remco_control_no)
        {
            return false;
        }
        if let Some(partner) = &self.partner
            && !partner.eq_ignore_ascii_case(&row.remco_id)
        {
            return false;
        }
        if self.rem_type.is_some_and(|t| t != row.rem_type)
            || self.txn_step.is_some_and(|s| s != row.txn_step)
            || self.txn_status.is_some_and(|s| s != row.txn_status)
        {
            return false;
        }
        if self
            .exclude_partners
            .iter()
            .any(|p| p.eq_ignore_ascii_case(&row.remco_id))
            || self.exclude_types.contains(&row.rem_type)
        {
            return false;
        }

        let at = row.effective_time();
        if let Some(from) = self.from
            && at < from.and_time(NaiveTime::MIN).and_utc()
        {
            return false;
        }
        if let Some(until) = self.until
            && at.date_naive() > until
        {
            return false;
        }
        true
    }

    /// Filters, sorts and paginates rows given in storage order. Sorting is
    /// stable so equal keys keep insertion order.
    pub fn apply<I>(&self, rows: I) -> HistoryPage
    where
        I: IntoIterator<Item = RemitHistory>,
    {
        let mut rows: Vec<_> = rows.into_iter().filter(|r| self.matches(r)).collect();

        if let Some((column, order)) = self.sort {
            rows.sort_by(|a, b| {
                let ord = match column {
                    SortColumn::Partner => a.remco_id.cmp(&b.remco_id),
                    SortColumn::StagedTime => a.txn_staged_time.cmp(&b.txn_staged_time),
                    SortColumn::CompletedTime => a.effective_time().cmp(&b.effective_time()),
                };
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        let total = rows.len();
        let rows = rows
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect();
        HistoryPage { rows, total }
    }
}
