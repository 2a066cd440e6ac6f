//! Inbound/outbound adapters around the application core.

pub mod csv;
