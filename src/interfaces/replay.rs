use super::csv::request_reader::{Action, RemitRequestRecord};
use crate::application::orchestrator::RemitCore;
use crate::domain::remittance::ProcessRemit;
use crate::error::{MoneyError, RemitError};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("invalid amount: {0}")]
    Money(#[from] MoneyError),
    #[error(transparent)]
    Remit(#[from] RemitError),
    #[error("no staged transaction for order {0:?}")]
    UnknownOrder(String),
}

/// What a replayed line produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOutcome {
    Staged { txn_id: Uuid, control_no: String },
    Confirmed { txn_id: Uuid, control_no: String },
}

/// Feeds request records into the remit core in file order, remembering
/// which transaction each order was staged as so later `confirm` lines can
/// find it.
pub struct Replayer {
    core: RemitCore,
    staged: HashMap<String, Uuid>,
}

impl Replayer {
    pub fn new(core: RemitCore) -> Self {
        Self {
            core,
            staged: HashMap::new(),
        }
    }

    pub async fn apply(
        &mut self,
        record: &RemitRequestRecord,
    ) -> Result<ReplayOutcome, ReplayError> {
        match record.action {
            Action::StageSend => {
                let remit = record.to_remittance()?;
                let staged = self.core.stage_create_remit(&remit, &record.partner).await?;
                self.staged.insert(record.dsa_order_id.clone(), staged.txn_id);
                Ok(ReplayOutcome::Staged {
                    txn_id: staged.txn_id,
                    control_no: staged.control_no,
                })
            }
            Action::StageDisburse => {
                let remit = record.to_remittance()?;
                let staged = self.core.stage_disburse_remit(&remit, &record.partner).await?;
                self.staged.insert(record.dsa_order_id.clone(), staged.txn_id);
                Ok(ReplayOutcome::Staged {
                    txn_id: staged.txn_id,
                    control_no: staged.control_no,
                })
            }
            Action::Confirm => {
                let txn_id = *self
                    .staged
                    .get(&record.dsa_order_id)
                    .ok_or_else(|| ReplayError::UnknownOrder(record.dsa_order_id.clone()))?;
                let confirmed = self
                    .core
                    .process_remit(&ProcessRemit::new(txn_id, "replay", ""))
                    .await?;
                Ok(ReplayOutcome::Confirmed {
                    txn_id,
                    control_no: confirmed.control_no,
                })
            }
        }
    }
}
