//! Client-side facade over the Reclaim contracts of one ledger.
//!
//! [`VaultService`] is built once from the deployed contract addresses and
//! reused for every call. It checks a [`VaultConfig`] locally before anything
//! is submitted and turns contract error codes into [`ServiceError`]s whose
//! `Display` text can be shown to a user as is.

pub mod config;
pub mod error;
pub mod service;


pub use config::{ConfigProblem, VaultConfig};
pub use error::{Result, ServiceError};
pub use service::{ContractAddresses, RecoveryTicket, VaultService, VaultStatus};
