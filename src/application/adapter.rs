use crate::domain::partner::{Partner, PartnerProfile};
use crate::domain::ports::{PartnerAdapter, SharedGateway};
use crate::domain::remittance::{
    ProcessRemit, ProcessedRemit, Remittance, SearchRemit, SearchResult, StageReply,
};
use crate::error::{AdapterError, GatewayError};
use async_trait::async_trait;

const SEND_NOT_AVAILABLE: &str = "send remit is not available for this partner";
const DISBURSE_NOT_AVAILABLE: &str = "disburse remit is not available for this partner";

/// Adapter for one partner, driven by its [`PartnerProfile`].
///
/// Every partner reaches the same upstream gateway, so the per-partner
/// differences are captured as data rather than as separate types. Legs the
/// profile marks unavailable fail with a static error before any call is made.
pub struct GatewayAdapter {
    profile: PartnerProfile,
    gateway: SharedGateway,
}

impl GatewayAdapter {
    pub fn new(partner: Partner, gateway: SharedGateway) -> Self {
        Self {
            profile: partner.profile(),
            gateway,
        }
    }
}

/// A rejection without a partner code cannot be attributed to the partner.
fn classify(err: GatewayError) -> AdapterError {
    match err {
        GatewayError::Partner(pe) if pe.code.trim().is_empty() => {
            AdapterError::Transport(format!("unclassified partner rejection: {}", pe.message))
        }
        GatewayError::Partner(pe) => AdapterError::Partner(pe),
        GatewayError::Transport(msg) => AdapterError::Transport(msg),
    }
}

#[async_trait]
impl PartnerAdapter for GatewayAdapter {
    fn kind(&self) -> &str {
        self.profile.code
    }

    async fn stage_create_remit(&self, remit: &Remittance) -> Result<StageReply, AdapterError> {
        if !self.profile.send {
            return Err(AdapterError::NotAvailable(SEND_NOT_AVAILABLE));
        }
        tracing::debug!(partner = self.profile.code, "calling gateway send");
        let mut reply = self
            .gateway
            .send(self.profile.code, remit)
            .await
            .map_err(classify)?;
        if reply.control_no.as_deref().is_some_and(|c| c.trim().is_empty()) {
            reply.control_no = None;
        }
        Ok(reply)
    }

    async fn stage_disburse_remit(&self, remit: &Remittance) -> Result<Remittance, AdapterError> {
        if !self.profile.disburse {
            return Err(AdapterError::NotAvailable(DISBURSE_NOT_AVAILABLE));
        }
        tracing::debug!(partner = self.profile.code, "calling gateway disburse");
        self.gateway
            .disburse(self.profile.code, remit)
            .await
            .map_err(classify)
    }

    async fn process_remit(&self, req: &ProcessRemit) -> Result<ProcessedRemit, AdapterError> {
        tracing::debug!(partner = self.profile.code, "calling gateway confirm");
        self.gateway
            .confirm(self.profile.code, req)
            .await
            .map_err(classify)
    }

    async fn search_remit(&self, req: &SearchRemit) -> Result<SearchResult, AdapterError> {
        self.gateway
            .search(self.profile.code, req)
            .await
            .map_err(classify)
    }
}
