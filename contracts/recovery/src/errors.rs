use soroban_sdk::contracterror;

/// Error codes of the recovery vault contract.
///
/// Codes follow the suite-wide ranges: 1–9 lifecycle, 10–19 authorisation,
/// 20–29 lookup, 30–39 validation, 40–49 state, 50–59 messaging.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum RecoveryError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    /// The configured stake ledger failed a call it should always answer.
    StakeLedgerUnavailable = 3,

    NotOwner = 10,
    NotGuardian = 11,
    Unauthorized = 12,
    UntrustedPeer = 13,

    VaultNotFound = 20,
    UnknownPeer = 21,

    InvalidThreshold = 30,
    DuplicateGuardian = 31,
    TooManyGuardians = 32,
    InvalidBackupWallet = 33,
    InvalidIdentity = 34,
    InvalidAmount = 35,
    InvalidConfig = 36,

    StaleRecovery = 40,
    AlreadyApproved = 41,
    RecoveryNotPending = 42,
    QuorumNotReached = 43,
    TimelockActive = 44,
    NotInactiveYet = 45,
    NotApproved = 46,
    AlreadyFlagged = 47,
    InsufficientStake = 48,

    MessageDeliveryFailed = 50,
    MalformedMessage = 51,
}
