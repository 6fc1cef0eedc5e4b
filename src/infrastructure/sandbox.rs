use crate::domain::money::Money;
use crate::domain::partner::{ControlNoSource, Partner, PartnerError};
use crate::domain::ports::PartnerGateway;
use crate::domain::remittance::{
    ProcessRemit, ProcessedRemit, Remittance, SearchRemit, SearchResult, StageReply,
};
use crate::error::{Code, GatewayError};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

pub const STATUS_STAGED: &str = "STAGED";
pub const STATUS_COMPLETED: &str = "COMPLETED";

struct SandboxRemit {
    partner: String,
    status: &'static str,
    remit: Remittance,
    charges: Money,
    taxes: Money,
}

#[derive(Default)]
struct SandboxState {
    calls: usize,
    sequence: u64,
    remits: HashMap<String, SandboxRemit>,
}

/// Deterministic in-process partner gateway.
///
/// Approves everything except partners it was told to reject, charges a
/// flat basis-point fee on the principal and remembers staged transactions
/// by control number so they can be confirmed and searched.
#[derive(Default)]
pub struct SandboxGateway {
    fee_bps: u64,
    tax_bps: u64,
    rejected: HashSet<String>,
    state: RwLock<SandboxState>,
}

impl SandboxGateway {
    pub fn new(fee_bps: u64, tax_bps: u64) -> Self {
        Self {
            fee_bps,
            tax_bps,
            ..Self::default()
        }
    }

    pub fn reject_partner(mut self, code: &str) -> Self {
        self.rejected.insert(code.trim().to_ascii_uppercase());
        self
    }

    /// Number of calls that reached the gateway.
    pub async fn calls(&self) -> usize {
        self.state.read().await.calls
    }

    fn check_partner(&self, partner: &str) -> Result<(), GatewayError> {
        if self.rejected.contains(partner) {
            return Err(GatewayError::Partner(PartnerError::new(
                "SBX-REJECT",
                format!("{partner} declined the transaction"),
            )));
        }
        Ok(())
    }

    fn basis_points(amount: &Money, bps: u64) -> Result<Money, GatewayError> {
        let minor = u128::from(amount.minor_units()) * u128::from(bps) / 10_000;
        let minor = u64::try_from(minor).map_err(|_| {
            GatewayError::Transport(format!("{bps} bps of {amount} overflows"))
        })?;
        Ok(Money::from_minor(minor, amount.currency().clone()))
    }
}

fn not_found(control_no: &str) -> GatewayError {
    GatewayError::Partner(
        PartnerError::new("SBX-404", format!("transaction {control_no} not found"))
            .with_grpc_code(Code::NotFound),
    )
}

#[async_trait]
impl PartnerGateway for SandboxGateway {
    async fn send(&self, partner: &str, remit: &Remittance) -> Result<StageReply, GatewayError> {
        let mut state = self.state.write().await;
        state.calls += 1;
        self.check_partner(partner)?;

        let charges = Self::basis_points(&remit.source_amt, self.fee_bps)?;
        let taxes = Self::basis_points(&charges, self.tax_bps)?;
        state.sequence += 1;
        let control_no = format!("SBX{:010}", state.sequence);
        state.remits.insert(
            control_no.clone(),
            SandboxRemit {
                partner: partner.to_string(),
                status: STATUS_STAGED,
                remit: remit.clone(),
                charges: charges.clone(),
                taxes: taxes.clone(),
            },
        );

        // Partners that leave numbering to the caller do not echo one back.
        let supplies_control_no = Partner::from_code(partner)
            .is_none_or(|p| p.profile().disburse_control_no == ControlNoSource::Request);
        Ok(StageReply {
            control_no: supplies_control_no.then_some(control_no.clone()),
            partner_txn_id: Some(control_no),
            charges,
            taxes,
        })
    }

    async fn disburse(
        &self,
        partner: &str,
        remit: &Remittance,
    ) -> Result<Remittance, GatewayError> {
        let mut state = self.state.write().await;
        state.calls += 1;
        self.check_partner(partner)?;

        if let Some(existing) = state.remits.get(&remit.control_no)
            && existing.status == STATUS_COMPLETED
        {
            return Err(GatewayError::Partner(
                PartnerError::new("SBX-PAID", "transaction already paid out")
                    .with_grpc_code(Code::FailedPrecondition),
            ));
        }
        let zero = Money::zero(remit.source_amt.currency().clone());
        state.remits.insert(
            remit.control_no.clone(),
            SandboxRemit {
                partner: partner.to_string(),
                status: STATUS_STAGED,
                remit: remit.clone(),
                charges: zero.clone(),
                taxes: zero,
            },
        );
        Ok(remit.clone())
    }

    async fn confirm(
        &self,
        partner: &str,
        req: &ProcessRemit,
    ) -> Result<ProcessedRemit, GatewayError> {
        let mut state = self.state.write().await;
        state.calls += 1;
        self.check_partner(partner)?;

        // Our own reference wins over a control number the caller made up.
        let reference = if req.partner_txn_id.is_empty() {
            &req.control_no
        } else {
            &req.partner_txn_id
        };
        let record = state
            .remits
            .get_mut(reference)
            .filter(|r| r.partner == partner)
            .ok_or_else(|| not_found(reference))?;
        record.status = STATUS_COMPLETED;
        Ok(ProcessedRemit {
            control_no: req.control_no.clone(),
            status: STATUS_COMPLETED.to_string(),
        })
    }

    async fn search(&self, partner: &str, req: &SearchRemit) -> Result<SearchResult, GatewayError> {
        let mut state = self.state.write().await;
        state.calls += 1;
        self.check_partner(partner)?;

        let record = state
            .remits
            .get(&req.control_no)
            .filter(|r| r.partner == partner)
            .ok_or_else(|| not_found(&req.control_no))?;
        let gross_total = record
            .remit
            .source_amt
            .checked_add(&record.charges)
            .and_then(|m| m.checked_add(&record.taxes))
            .ok();
        Ok(SearchResult {
            status: record.status.to_string(),
            control_no: req.control_no.clone(),
            remitter: Some(record.remit.remitter.clone()),
            receiver: Some(record.remit.receiver.clone()),
            principal: Some(record.remit.source_amt.clone()),
            charges: Some(record.charges.clone()),
            gross_total,
            dest_amt: Some(record.remit.dest_amt.clone()),
            other_info: json!({
                "gateway": "sandbox",
                "partner": partner,
                "dsa_order_id": record.remit.dsa_order_id,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::history::tests::remittance;

    #[tokio::test]
    async fn test_send_charges_basis_points() {
        let gateway = SandboxGateway::new(150, 1200);
        let reply = gateway.send("WU", &remittance("WU", "O1")).await.unwrap();

        // 1.5% of 1,000.00 is 15.00; 12% of that is 1.80
        assert_eq!(reply.charges.minor_units(), 1500);
        assert_eq!(reply.taxes.minor_units(), 180);
        assert_eq!(reply.control_no.as_deref(), Some("SBX0000000001"));
    }

    #[tokio::test]
    async fn test_generated_numbering_partner_gets_no_control_no() {
        let gateway = SandboxGateway::default();
        let reply = gateway.send("PRH", &remittance("PRH", "O1")).await.unwrap();
        assert!(reply.control_no.is_none());
    }

    #[tokio::test]
    async fn test_fee_overflow_is_a_transport_error() {
        let gateway = SandboxGateway::new(20_000, 0);
        let mut remit = remittance("WU", "O1");
        remit.source_amt = Money::from_minor(u64::MAX, remit.source_amt.currency().clone());

        let err = gateway.send("WU", &remit).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_confirm_by_partner_reference() {
        let gateway = SandboxGateway::default();
        let reply = gateway.send("PRH", &remittance("PRH", "O1")).await.unwrap();
        let reference = reply.partner_txn_id.unwrap();

        let mut req = ProcessRemit::new(uuid::Uuid::new_v4(), "terminal", "");
        req.control_no = "20261019PH000000001".into();
        req.partner_txn_id = reference;

        let processed = gateway.confirm("PRH", &req).await.unwrap();
        assert_eq!(processed.control_no, "20261019PH000000001");
    }

    #[tokio::test]
    async fn test_confirm_unknown_control_no() {
        let gateway = SandboxGateway::default();
        let mut req = ProcessRemit::new(uuid::Uuid::new_v4(), "terminal", "");
        req.control_no = "NOPE".into();

        let err = gateway.confirm("WU", &req).await.unwrap_err();
        match err {
            GatewayError::Partner(pe) => assert_eq!(pe.grpc_code, Code::NotFound),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(gateway.calls().await, 1);
    }

    #[tokio::test]
    async fn test_disburse_twice_after_payout_is_rejected() {
        let gateway = SandboxGateway::default();
        let mut remit = remittance("WU", "O1");
        remit.control_no = "CTRL1".into();
        gateway.disburse("WU", &remit).await.unwrap();

        let mut req = ProcessRemit::new(uuid::Uuid::new_v4(), "terminal", "");
        req.control_no = "CTRL1".into();
        gateway.confirm("WU", &req).await.unwrap();

        assert!(gateway.disburse("WU", &remit).await.is_err());
    }
}
