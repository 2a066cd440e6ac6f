use crate::application::checkout::PurchaseRequest;
use crate::error::{CheckoutError, Result};
use std::io::Read;

/// Reads purchase requests from a CSV source.
///
/// Streams lazily so large request files never sit in memory whole.
pub struct PurchaseReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> PurchaseReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn purchases(self) -> impl Iterator<Item = Result<PurchaseRequest>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(CheckoutError::from))
    }
}
