use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The payment providers a vendor can settle through.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Stripe,
    FedaPay,
    PayPal,
    MoneyFusion,
    SolestePay,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::FedaPay => "fedapay",
            Self::PayPal => "paypal",
            Self::MoneyFusion => "moneyfusion",
            Self::SolestePay => "solestepay",
        }
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentProvider {
    type Err = crate::error::CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stripe" => Ok(Self::Stripe),
            "fedapay" => Ok(Self::FedaPay),
            "paypal" => Ok(Self::PayPal),
            "moneyfusion" => Ok(Self::MoneyFusion),
            "solestepay" => Ok(Self::SolestePay),
            other => Err(crate::error::CheckoutError::Validation(format!(
                "unknown payment provider: {other}"
            ))),
        }
    }
}

/// The provider's authoritative answer for one settlement attempt.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SettlementResult {
    Approved { reference: String },
    Declined { reason: String },
    ProviderUnavailable,
}

/// A vendor's stored provider credential.
///
/// Only the ciphertext ever reaches storage; the plaintext lives inside the
/// vault boundary. Superseded rows are deactivated rather than deleted so the
/// configuration history stays auditable.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct VendorPaymentSetting {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub provider: PaymentProvider,
    /// nonce-prefixed AES-256-GCM ciphertext of the provider API key.
    pub api_key_ciphertext: Vec<u8>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl VendorPaymentSetting {
    pub fn new(shop_id: Uuid, provider: PaymentProvider, api_key_ciphertext: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            shop_id,
            provider,
            api_key_ciphertext,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// A decrypted provider API key.
///
/// Debug and Display are redacted so the secret cannot leak through logs or
/// error messages; the raw value is only reachable via `expose`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(plaintext: impl Into<String>) -> Self {
        Self(plaintext.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(REDACTED)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("REDACTED")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_round_trip() {
        for provider in [
            PaymentProvider::Stripe,
            PaymentProvider::FedaPay,
            PaymentProvider::PayPal,
            PaymentProvider::MoneyFusion,
            PaymentProvider::SolestePay,
        ] {
            assert_eq!(provider.as_str().parse::<PaymentProvider>().unwrap(), provider);
        }
        assert!("venmo".parse::<PaymentProvider>().is_err());
    }

    #[test]
    fn test_provider_serde_lowercase() {
        let json = serde_json::to_string(&PaymentProvider::FedaPay).unwrap();
        assert_eq!(json, "\"fedapay\"");
    }

    #[test]
    fn test_api_key_is_redacted() {
        let key = ApiKey::new("sk_live_12345");
        assert_eq!(format!("{key:?}"), "ApiKey(REDACTED)");
        assert_eq!(key.to_string(), "REDACTED");
        assert_eq!(key.expose(), "sk_live_12345");
    }
}
