use super::history::RemType;
use super::money::{Currency, Money};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Name {
    pub first: String,
    pub middle: String,
    pub last: String,
}

impl Name {
    pub fn full(&self) -> String {
        [&self.first, &self.middle, &self.last]
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub province: String,
    pub zip_code: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub country_code: String,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Identification {
    pub id_type: String,
    pub number: String,
    pub country: String,
    pub expiry: Option<NaiveDate>,
}

/// Know-your-customer details of a remitter or receiver.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserKyc {
    pub partner_member_id: String,
    pub name: Name,
    pub address: Address,
    pub phone: PhoneNumber,
    pub mobile: PhoneNumber,
    pub email: String,
    pub birth_date: Option<NaiveDate>,
    pub nationality: String,
    pub occupation: String,
    pub identification: Option<Identification>,
    pub source_funds: String,
    pub relationship: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub source_country: String,
    pub dest_country: String,
    pub is_domestic: bool,
    pub purpose: String,
}

/// The operator and terminal a request originates from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Agent {
    pub user_id: String,
    pub operator_id: String,
    pub ip_address: String,
    pub device_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendRemitType {
    #[default]
    CashPickup,
    AccountDeposit,
    MobileWallet,
    HomeDelivery,
}

/// The normalized envelope handed to the remit core for one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remittance {
    pub remitter: UserKyc,
    pub receiver: UserKyc,
    pub source_amt: Money,
    pub dest_amt: Money,
    pub txn: TransactionDetails,
    pub agent: Agent,
    pub control_no: String,
    pub dsa_id: String,
    pub dsa_order_id: String,
    pub user_id: String,
    pub remit_partner: String,
    pub send_remit_type: SendRemitType,
}

/// Partner answer to a send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReply {
    /// `None` when the partner leaves numbering to us.
    pub control_no: Option<String>,
    pub partner_txn_id: Option<String>,
    pub charges: Money,
    pub taxes: Money,
}

/// Confirmation of a staged transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRemit {
    pub transaction_id: Uuid,
    pub auth_source: String,
    pub auth_code: String,
    /// Filled in by the core from the staged row before reaching a partner.
    #[serde(default)]
    pub control_no: String,
    /// The partner's own reference from the stage reply, when it gave one.
    #[serde(default)]
    pub partner_txn_id: String,
    #[serde(default)]
    pub rem_type: Option<RemType>,
}

impl ProcessRemit {
    pub fn new(
        transaction_id: Uuid,
        auth_source: impl Into<String>,
        auth_code: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id,
            auth_source: auth_source.into(),
            auth_code: auth_code.into(),
            control_no: String::new(),
            partner_txn_id: String::new(),
            rem_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedRemit {
    pub control_no: String,
    pub status: String,
}

/// Partner-side status lookup keys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchRemit {
    pub control_no: String,
    pub ptnr_user_id: String,
    pub device_id: String,
    pub dest_currency: Option<Currency>,
    pub agent: Agent,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub status: String,
    pub control_no: String,
    pub remitter: Option<UserKyc>,
    pub receiver: Option<UserKyc>,
    pub principal: Option<Money>,
    pub charges: Option<Money>,
    pub gross_total: Option<Money>,
    pub dest_amt: Option<Money>,
    /// Partner-specific payload passed through untouched.
    pub other_info: serde_json::Value,
}
