use super::adapter::GatewayAdapter;
use crate::domain::partner::Partner;
use crate::domain::ports::{SharedAdapter, SharedGateway};
use crate::error::{RemitError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable partner code → adapter table, built once at startup and shared
/// by reference.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, SharedAdapter>,
}

impl AdapterRegistry {
    /// One [`GatewayAdapter`] for each known partner.
    pub fn with_gateway(gateway: SharedGateway) -> Self {
        Partner::ALL
            .into_iter()
            .fold(RegistryBuilder::default(), |builder, partner| {
                builder.register(Arc::new(GatewayAdapter::new(partner, gateway.clone())))
            })
            .build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn resolve(&self, partner: &str) -> Result<&SharedAdapter> {
        self.adapters
            .get(&normalize(partner))
            .ok_or_else(|| {
                RemitError::InvalidArgument(format!("unknown remit partner {partner:?}"))
            })
    }

    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<_> = self.adapters.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    adapters: HashMap<String, SharedAdapter>,
}

impl RegistryBuilder {
    /// Registers under the adapter's own `kind()`, replacing any previous
    /// adapter with that code.
    pub fn register(mut self, adapter: SharedAdapter) -> Self {
        self.adapters.insert(normalize(adapter.kind()), adapter);
        self
    }

    pub fn build(self) -> AdapterRegistry {
        AdapterRegistry {
            adapters: self.adapters,
        }
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
