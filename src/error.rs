use crate::domain::history::TxnStep;
use crate::domain::partner::PartnerError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, RemitError>;

/// Status class surfaced to callers. The subset of the gRPC code space the
/// core produces, so the transport layer can map it one-to-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    InvalidArgument,
    NotFound,
    FailedPrecondition,
    Unimplemented,
    #[default]
    Internal,
}

/// The displayable part of a partner rejection handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerFailure {
    pub code: String,
    pub message: String,
}

/// Errors returned by the remit core. Every operation yields either a
/// fully populated result or exactly one of these.
#[derive(Error, Debug)]
pub enum RemitError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),
    #[error("{0}")]
    Unimplemented(&'static str),
    #[error("{message}")]
    Partner {
        message: String,
        grpc_code: Code,
        details: PartnerFailure,
    },
    #[error("{0}")]
    Internal(String),
    #[error("failed to {op}")]
    Storage {
        op: &'static str,
        #[source]
        source: StoreError,
    },
}

impl RemitError {
    pub fn code(&self) -> Code {
        match self {
            RemitError::InvalidArgument(_) => Code::InvalidArgument,
            RemitError::NotFound(_) => Code::NotFound,
            RemitError::FailedPrecondition(_) => Code::FailedPrecondition,
            RemitError::Unimplemented(_) => Code::Unimplemented,
            RemitError::Partner { grpc_code, .. } => *grpc_code,
            RemitError::Internal(_) | RemitError::Storage { .. } => Code::Internal,
        }
    }

    /// Only partner rejections carry a display payload.
    pub fn partner_details(&self) -> Option<&PartnerFailure> {
        match self {
            RemitError::Partner { details, .. } => Some(details),
            _ => None,
        }
    }

    pub(crate) fn storage(op: &'static str, source: StoreError) -> Self {
        RemitError::Storage { op, source }
    }

    /// Classifies an adapter failure for the caller. `op` completes the
    /// sentence "failed to ...".
    pub(crate) fn from_adapter(op: &'static str, err: &AdapterError) -> Self {
        match err {
            AdapterError::Partner(pe) => RemitError::Partner {
                message: format!("failed to {op}"),
                grpc_code: pe.grpc_code,
                details: PartnerFailure {
                    code: pe.code.clone(),
                    message: pe.message.clone(),
                },
            },
            AdapterError::NotAvailable(msg) => RemitError::Unimplemented(*msg),
            AdapterError::Transport(_) => RemitError::Internal(format!("failed to {op}")),
        }
    }
}

/// Failure reported by a partner gateway call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("partner rejected request: {0}")]
    Partner(PartnerError),
    #[error("gateway transport error: {0}")]
    Transport(String),
}

/// Failure classified by a partner adapter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    #[error("partner rejected request: {0}")]
    Partner(PartnerError),
    #[error("{0}")]
    NotAvailable(&'static str),
    #[error("gateway transport error: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("remit history {txn_id} ({step}) already exists")]
    AlreadyExists { txn_id: Uuid, step: TxnStep },
    #[error("remit history {0} not found")]
    NotFound(Uuid),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("invalid currency code {0:?}")]
    InvalidCurrency(String),
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),
    #[error("amount {amount:?} has more than {exponent} decimal places")]
    Precision { amount: String, exponent: u32 },
    #[error("amount overflow")]
    Overflow,
    #[error("amount would be negative")]
    Negative,
    #[error("currency mismatch: {0} and {1}")]
    CurrencyMismatch(String, String),
}
