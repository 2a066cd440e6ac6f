use crate::domain::payment::PaymentProvider;
use crate::error::{CheckoutError, Result};
use serde::Deserialize;
use std::io::Read;
use uuid::Uuid;

/// One vendor payment configuration row: the plaintext key goes straight to
/// the vault and is never persisted as-is.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct SettingRecord {
    pub shop_id: Uuid,
    pub provider: PaymentProvider,
    pub api_key: String,
}

/// Reads vendor payment settings from a CSV source.
pub struct SettingsReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> SettingsReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn settings(self) -> impl Iterator<Item = Result<SettingRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(CheckoutError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_valid_stream() {
        let data = "\
shop_id, provider, api_key
5a0a5aaa-0000-4000-8000-00000000000a, stripe, sk_test_123
5a0a5aaa-0000-4000-8000-00000000000b, fedapay, fp_live_456";
        let reader = SettingsReader::new(data.as_bytes());
        let rows: Vec<Result<SettingRecord>> = reader.settings().collect();

        assert_eq!(rows.len(), 2);
        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.provider, PaymentProvider::Stripe);
        assert_eq!(first.api_key, "sk_test_123");
    }

    #[test]
    fn test_unknown_provider_is_an_error() {
        let data = "shop_id, provider, api_key\n5a0a5aaa-0000-4000-8000-00000000000a, venmo, k";
        let reader = SettingsReader::new(data.as_bytes());
        let rows: Vec<Result<SettingRecord>> = reader.settings().collect();
        assert!(rows[0].is_err());
    }
}
