use crate::domain::money::Amount;
use crate::domain::payment::{ApiKey, PaymentProvider, SettlementResult};
use crate::domain::ports::{PaymentGateway, PaymentGatewayRef};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// A gateway that approves every settlement after a fixed delay.
///
/// Stands in when no live provider adapter is configured and in development
/// and tests. References look like the real thing (`pay_<id>`), but no money
/// moves anywhere.
pub struct SimulatedGateway {
    provider: PaymentProvider,
    delay: Duration,
}

impl SimulatedGateway {
    pub fn new(provider: PaymentProvider, delay: Duration) -> Self {
        Self { provider, delay }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(PaymentProvider::Stripe, Duration::from_millis(50))
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn settle(
        &self,
        _amount: Amount,
        _currency: &str,
        _credential: &ApiKey,
    ) -> Result<SettlementResult> {
        tokio::time::sleep(self.delay).await;
        Ok(SettlementResult::Approved {
            reference: format!("pay_{}", Uuid::new_v4().simple()),
        })
    }

    fn provider(&self) -> PaymentProvider {
        self.provider
    }
}

/// Maps each provider to its adapter, selected by configuration.
///
/// Providers with no registered live adapter settle through the simulated
/// fallback, so a shop configured for a provider this deployment does not
/// integrate with still resolves to a working gateway.
pub struct GatewayRegistry {
    gateways: HashMap<PaymentProvider, PaymentGatewayRef>,
    fallback: PaymentGatewayRef,
}

impl GatewayRegistry {
    pub fn new(fallback: PaymentGatewayRef) -> Self {
        Self {
            gateways: HashMap::new(),
            fallback,
        }
    }

    /// A registry that settles everything through [`SimulatedGateway`]s.
    pub fn simulated(delay: Duration) -> Self {
        Self::new(std::sync::Arc::new(SimulatedGateway::new(
            PaymentProvider::Stripe,
            delay,
        )))
    }

    pub fn register(&mut self, gateway: PaymentGatewayRef) {
        self.gateways.insert(gateway.provider(), gateway);
    }

    pub fn resolve(&self, provider: PaymentProvider) -> PaymentGatewayRef {
        self.gateways
            .get(&provider)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for GatewayRegistry {
    fn default() -> Self {
        Self::simulated(Duration::from_millis(50))
    }
}
