//! Shared wire types and contract interfaces for the Reclaim vault suite.
//!
//! This crate provides:
//! - [`CommonError`] — standardised error codes shared by every contract.
//! - [`message`] — the cross-chain [`RecoveryMessage`] and its binary codec.
//! - [`messaging`] — omnichain endpoint types (fees, receipts, packets) and the
//!   client interfaces for the endpoint, the message receiver and the guardian
//!   stake ledger.
//! - [`identity`] — the zero-identity sentinel used by read-only views.
//! - [`ttl`] — persistent-storage TTL policy.
//!
//! Contract-specific errors can extend the range starting at code **100** and
//! above, ensuring no collisions with the common set.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

use soroban_sdk::contracterror;

// ── Modules ──────────────────────────────────────────────────────────────────

pub mod identity;
pub mod message;
pub mod messaging;
pub mod ttl;

pub use identity::*;
pub use message::*;
pub use messaging::*;

// ── Shared error enum ────────────────────────────────────────────────────────

/// Standardised error codes shared by every contract in the suite.
///
/// # Code ranges
/// | Range   | Purpose                        |
/// |---------|--------------------------------|
/// | 1 – 9   | Lifecycle / initialisation     |
/// | 10 – 19 | Authentication & authorisation |
/// | 20 – 29 | Resource not found             |
/// | 30 – 39 | Validation / input             |
/// | 40 – 49 | Contract state                 |
/// | 50 – 59 | Cross-chain messaging          |
/// | 100+    | Reserved for contract-specific |
#[contracterror]
#[derive(Clone, Debug, Eq, PartialEq, Copy)]
#[repr(u32)]
pub enum CommonError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    AccessDenied = 10,
    RecordNotFound = 20,
    InvalidInput = 30,
    InvalidAmount = 31,
    InvalidTransition = 40,
    MessageDeliveryFailed = 50,
    MalformedMessage = 51,
}

impl CommonError {
    /// Range a contract error code falls in, per the table above.
    pub fn category(code: u32) -> &'static str {
        match code {
            1..=9 => "lifecycle",
            10..=19 => "authorization",
            20..=29 => "not found",
            30..=39 => "validation",
            40..=49 => "state",
            50..=59 => "messaging",
            _ => "contract-specific",
        }
    }
}
