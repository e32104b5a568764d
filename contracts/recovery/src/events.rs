//! Events published by the recovery vault contract.
//!
//! Every event is topic-prefixed with its short name and the vault id so an
//! indexer can follow one vault across both ledgers.

#![allow(deprecated)] // events().publish migration tracked separately

use common::RecoveryAction;
use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env};

// ── Event payloads ───────────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VaultInitializedEvent {
    pub owner: Address,
    pub guardians: u32,
    pub threshold: u32,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecoveryInitiatedEvent {
    pub recovery_id: u64,
    pub new_owner: Address,
    pub initiated_by: Address,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecoveryApprovedEvent {
    pub recovery_id: u64,
    pub guardian: Address,
    pub effective_approvals: u32,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecoveryCompletedEvent {
    pub recovery_id: u64,
    pub old_owner: Address,
    pub new_owner: Address,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GuardianFlaggedEvent {
    pub recovery_id: u64,
    pub guardian: Address,
    pub slashed: i128,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CrossChainEvent {
    pub eid: u32,
    pub recovery_id: u64,
    pub action: RecoveryAction,
}

// ── Publishers ───────────────────────────────────────────────────────────────

pub fn emit_vault_initialized(
    env: &Env,
    vault_id: BytesN<32>,
    owner: Address,
    guardians: u32,
    threshold: u32,
) {
    env.events().publish(
        (symbol_short!("VLT_INIT"), vault_id),
        VaultInitializedEvent {
            owner,
            guardians,
            threshold,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn emit_recovery_initiated(
    env: &Env,
    vault_id: BytesN<32>,
    recovery_id: u64,
    new_owner: Address,
    initiated_by: Address,
) {
    env.events().publish(
        (symbol_short!("REC_INIT"), vault_id),
        RecoveryInitiatedEvent {
            recovery_id,
            new_owner,
            initiated_by,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn emit_recovery_approved(
    env: &Env,
    vault_id: BytesN<32>,
    recovery_id: u64,
    guardian: Address,
    effective_approvals: u32,
) {
    env.events().publish(
        (symbol_short!("REC_APPR"), vault_id),
        RecoveryApprovedEvent {
            recovery_id,
            guardian,
            effective_approvals,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn emit_recovery_completed(
    env: &Env,
    vault_id: BytesN<32>,
    recovery_id: u64,
    old_owner: Address,
    new_owner: Address,
) {
    env.events().publish(
        (symbol_short!("REC_DONE"), vault_id),
        RecoveryCompletedEvent {
            recovery_id,
            old_owner,
            new_owner,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn emit_recovery_cancelled(env: &Env, vault_id: BytesN<32>, recovery_id: u64) {
    env.events()
        .publish((symbol_short!("REC_CNCL"), vault_id), recovery_id);
}

pub fn emit_guardian_flagged(
    env: &Env,
    vault_id: BytesN<32>,
    recovery_id: u64,
    guardian: Address,
    slashed: i128,
) {
    env.events().publish(
        (symbol_short!("FLAGGED"), vault_id),
        GuardianFlaggedEvent {
            recovery_id,
            guardian,
            slashed,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn emit_heartbeat(env: &Env, vault_id: BytesN<32>, owner: Address) {
    env.events()
        .publish((symbol_short!("HEARTBT"), vault_id), owner);
}

pub fn emit_inactivity_claimed(
    env: &Env,
    vault_id: BytesN<32>,
    recovery_id: u64,
    backup_wallet: Address,
) {
    env.events().publish(
        (symbol_short!("INACTIVE"), vault_id),
        (recovery_id, backup_wallet),
    );
}

/// `CrossChainMessageSent(destination, vault, recovery)`.
pub fn emit_message_sent(
    env: &Env,
    vault_id: BytesN<32>,
    dst_eid: u32,
    recovery_id: u64,
    action: RecoveryAction,
) {
    env.events().publish(
        (symbol_short!("XC_SENT"), vault_id),
        CrossChainEvent {
            eid: dst_eid,
            recovery_id,
            action,
        },
    );
}

pub fn emit_message_received(
    env: &Env,
    vault_id: BytesN<32>,
    src_eid: u32,
    recovery_id: u64,
    action: RecoveryAction,
) {
    env.events().publish(
        (symbol_short!("XC_RECV"), vault_id),
        CrossChainEvent {
            eid: src_eid,
            recovery_id,
            action,
        },
    );
}

/// An inbound message was stale and ignored.
pub fn emit_message_dropped(
    env: &Env,
    vault_id: BytesN<32>,
    src_eid: u32,
    recovery_id: u64,
    action: RecoveryAction,
) {
    env.events().publish(
        (symbol_short!("MSG_DROP"), vault_id),
        CrossChainEvent {
            eid: src_eid,
            recovery_id,
            action,
        },
    );
}
