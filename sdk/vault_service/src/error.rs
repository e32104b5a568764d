use common::CommonError;
use endpoint::EndpointError;
use recovery::RecoveryError;
use staking::StakingError;
use thiserror::Error;

use crate::config::ConfigProblem;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("vault configuration rejected: {}", join(.0))]
    InvalidConfig(Vec<ConfigProblem>),

    #[error("{}", describe_recovery(.0))]
    Recovery(RecoveryError),

    #[error("{}", describe_staking(.0))]
    Staking(StakingError),

    #[error("{}", describe_endpoint(.0))]
    Endpoint(EndpointError),

    #[error("the contract rejected the call ({} error {0})", category(.0))]
    Contract(u32),

    #[error("a fee of {required} is needed but only {available} is available")]
    InsufficientFunds { required: i128, available: i128 },

    #[error("the contract aborted without an error code")]
    Aborted,

    #[error("the contract returned a value this client cannot decode")]
    Decode,
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl From<RecoveryError> for ServiceError {
    fn from(err: RecoveryError) -> Self {
        ServiceError::Recovery(err)
    }
}

impl From<StakingError> for ServiceError {
    fn from(err: StakingError) -> Self {
        ServiceError::Staking(err)
    }
}

impl From<EndpointError> for ServiceError {
    fn from(err: EndpointError) -> Self {
        ServiceError::Endpoint(err)
    }
}

fn join(problems: &[ConfigProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn category(code: &u32) -> &'static str {
    CommonError::category(*code)
}

fn describe_recovery(err: &RecoveryError) -> &'static str {
    match err {
        RecoveryError::NotInitialized => "the vault contract has not been initialized",
        RecoveryError::AlreadyInitialized => "the vault contract is already initialized",
        RecoveryError::StakeLedgerUnavailable => {
            "the vault's stake ledger did not answer; check the contract configuration"
        }
        RecoveryError::NotOwner => "only the vault owner can do this",
        RecoveryError::NotGuardian => "only a guardian of this vault can do this",
        RecoveryError::Unauthorized => "you are not allowed to perform this action",
        RecoveryError::UntrustedPeer => "the message came from an untrusted peer",
        RecoveryError::VaultNotFound => "no vault exists with this id",
        RecoveryError::UnknownPeer => "no peer vault is configured for that destination",
        RecoveryError::InvalidThreshold => {
            "threshold must be between 1 and the number of guardians"
        }
        RecoveryError::DuplicateGuardian => "each guardian may only be listed once",
        RecoveryError::TooManyGuardians => "too many guardians for one vault",
        RecoveryError::InvalidBackupWallet => {
            "backup wallet must be set and differ from the owner"
        }
        RecoveryError::InvalidIdentity => {
            "the new owner must be a real address other than the current owner"
        }
        RecoveryError::InvalidAmount => "amounts cannot be negative",
        RecoveryError::InvalidConfig => {
            "invalid configuration: the inactivity period must be greater than 0 \
             and endpoint ids must be non-zero and differ from this ledger's"
        }
        RecoveryError::StaleRecovery => "this recovery attempt is no longer current",
        RecoveryError::AlreadyApproved => "you have already approved this recovery",
        RecoveryError::RecoveryNotPending => "there is no pending recovery to act on",
        RecoveryError::QuorumNotReached => "not enough guardians have approved yet",
        RecoveryError::TimelockActive => "the timelock has not elapsed yet",
        RecoveryError::NotInactiveYet => "the owner has been active too recently",
        RecoveryError::NotApproved => "that guardian has not approved this recovery",
        RecoveryError::AlreadyFlagged => "that guardian is already flagged as malicious",
        RecoveryError::InsufficientStake => "guardian stake is below the vault's requirement",
        RecoveryError::MessageDeliveryFailed => {
            "the cross-chain message could not be sent; check the fee balance"
        }
        RecoveryError::MalformedMessage => "the cross-chain message could not be decoded",
    }
}

fn describe_staking(err: &StakingError) -> &'static str {
    match err {
        StakingError::NotInitialized => "the stake ledger has not been initialized",
        StakingError::AlreadyInitialized => "the stake ledger is already initialized",
        StakingError::Unauthorized => "you are not allowed to manage stake here",
        StakingError::InvalidAmount => "stake amounts must be greater than 0",
        StakingError::InsufficientStake => "you cannot unstake more than your staked balance",
    }
}

fn describe_endpoint(err: &EndpointError) -> &'static str {
    match err {
        EndpointError::NotInitialized => "the messaging endpoint has not been initialized",
        EndpointError::AlreadyInitialized => "the messaging endpoint is already initialized",
        EndpointError::Unauthorized => "you are not an authorized executor",
        EndpointError::PacketNotFound => "no such message packet",
        EndpointError::InvalidDestination => "invalid destination endpoint",
        EndpointError::InsufficientFee => "the fee paid is below the quote",
        EndpointError::AltFeeUnavailable => "this endpoint does not accept the alternate fee token",
        EndpointError::InvalidFeeConfig => "fees cannot be negative",
        EndpointError::AlreadyDelivered => "this message was already delivered",
        EndpointError::NonceGap => "an earlier message on this path has not been delivered",
    }
}
