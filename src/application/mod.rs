//! Application layer containing the checkout orchestration.
//!
//! `CheckoutEngine` is the single entry point for placing orders; it leans
//! on `StockLedger` for reservation semantics and `CredentialVault` for
//! vendor credentials.

pub mod checkout;
pub mod ledger;
pub mod vault;
