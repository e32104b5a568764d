//! Recovery state machine.
//!
//! ```text
//!            initiate                 quorum + timelock
//!   None ─────────────► Pending ─────────────────────────► Completed
//!    ▲                    │  ▲                                  │
//!    └──── cancel ────────┘  └────────── initiate ──────────────┘
//! ```
//!
//! Only the vault's current attempt (`recovery_id`) can be approved, flagged,
//! finalised or cancelled. Earlier attempts stay in storage for audit.

use common::{is_zero_address, RecoveryMessage};
use soroban_sdk::{log, Address, Bytes, BytesN, Env};

use crate::coordinator;
use crate::errors::RecoveryError;
use crate::events;
use crate::storage;
use crate::types::{AttemptOrigin, RecoveryAttempt, RecoveryState, VaultRecord};
use crate::vault;

/// Loads the vault and its current attempt, checking that `recovery_id` is
/// current and still pending.
fn load_pending(
    env: &Env,
    vault_id: &BytesN<32>,
    recovery_id: u64,
) -> Result<(VaultRecord, RecoveryAttempt), RecoveryError> {
    let vault = storage::load_vault(env, vault_id)?;
    check_pending(env, vault, recovery_id)
}

fn check_pending(
    env: &Env,
    vault: VaultRecord,
    recovery_id: u64,
) -> Result<(VaultRecord, RecoveryAttempt), RecoveryError> {
    if recovery_id == 0 || recovery_id != vault.recovery_id {
        return Err(RecoveryError::StaleRecovery);
    }
    let attempt = storage::load_attempt(env, &vault.id, recovery_id)
        .ok_or(RecoveryError::StaleRecovery)?;
    if vault.recovery_state != RecoveryState::Pending || !attempt.is_open() {
        return Err(RecoveryError::RecoveryNotPending);
    }
    Ok((vault, attempt))
}

pub fn initiate_recovery(
    env: &Env,
    caller: &Address,
    vault_id: &BytesN<32>,
    new_owner: &Address,
    dst_eid: u32,
    options: &Bytes,
) -> Result<u64, RecoveryError> {
    let mut vault = storage::load_vault(env, vault_id)?;
    if !vault.is_owner_or_guardian(caller) {
        return Err(RecoveryError::NotGuardian);
    }
    if *new_owner == vault.owner || is_zero_address(env, new_owner) {
        return Err(RecoveryError::InvalidIdentity);
    }
    if dst_eid != 0 {
        coordinator::trusted_peer(env, dst_eid)?;
    }

    let now = env.ledger().timestamp();
    let recovery_id = vault.recovery_id + 1;
    let attempt = RecoveryAttempt::new(env, new_owner.clone(), AttemptOrigin::Guardians, dst_eid);
    storage::save_attempt(env, vault_id, recovery_id, &attempt);

    vault.recovery_id = recovery_id;
    vault.recovery_state = RecoveryState::Pending;
    if *caller == vault.owner {
        vault.last_active = now;
    }
    storage::save_vault(env, &vault);

    log!(env, "recovery {} initiated", recovery_id);
    events::emit_recovery_initiated(
        env,
        vault_id.clone(),
        recovery_id,
        new_owner.clone(),
        caller.clone(),
    );

    if dst_eid != 0 {
        let message = RecoveryMessage::initiate(vault_id.clone(), recovery_id, new_owner.clone());
        coordinator::dispatch(env, caller, dst_eid, &message, options)?;
    }
    Ok(recovery_id)
}

/// Records `guardian`'s approval. Returns `true` if the call also finalised
/// the attempt because the timelock had already elapsed.
pub fn approve_recovery(
    env: &Env,
    guardian: &Address,
    vault_id: &BytesN<32>,
    recovery_id: u64,
) -> Result<bool, RecoveryError> {
    let vault = storage::load_vault(env, vault_id)?;
    if !vault.is_guardian(guardian) {
        return Err(RecoveryError::NotGuardian);
    }
    let (vault, mut attempt) = check_pending(env, vault, recovery_id)?;
    if attempt.approvals.contains(guardian) {
        return Err(RecoveryError::AlreadyApproved);
    }
    if vault.stake_amount > 0 && coordinator::staked_balance(env, guardian)? < vault.stake_amount {
        return Err(RecoveryError::InsufficientStake);
    }

    let now = env.ledger().timestamp();
    attempt.approvals.push_back(guardian.clone());
    attempt.refresh_quorum(vault.threshold, now);

    events::emit_recovery_approved(
        env,
        vault_id.clone(),
        recovery_id,
        guardian.clone(),
        attempt.effective_approvals(),
    );

    match attempt.unlocks_at(vault.timelock) {
        Some(unlocks_at) if now >= unlocks_at => {
            finalize(env, guardian, vault, attempt, recovery_id)?;
            Ok(true)
        }
        _ => {
            storage::save_attempt(env, vault_id, recovery_id, &attempt);
            Ok(false)
        }
    }
}

/// Keeper entry point once quorum has held for `timelock` seconds.
pub fn finalize_recovery(
    env: &Env,
    caller: &Address,
    vault_id: &BytesN<32>,
    recovery_id: u64,
) -> Result<(), RecoveryError> {
    let (vault, attempt) = load_pending(env, vault_id, recovery_id)?;
    let unlocks_at = attempt
        .unlocks_at(vault.timelock)
        .ok_or(RecoveryError::QuorumNotReached)?;
    if env.ledger().timestamp() < unlocks_at {
        return Err(RecoveryError::TimelockActive);
    }
    finalize(env, caller, vault, attempt, recovery_id)
}

fn finalize(
    env: &Env,
    payer: &Address,
    mut vault: VaultRecord,
    mut attempt: RecoveryAttempt,
    recovery_id: u64,
) -> Result<(), RecoveryError> {
    attempt.completed = true;
    storage::save_attempt(env, &vault.id, recovery_id, &attempt);

    let old_owner = vault.owner.clone();
    vault::hand_over(env, &mut vault, &attempt.new_owner);
    storage::save_vault(env, &vault);

    log!(env, "recovery {} completed", recovery_id);
    events::emit_recovery_completed(
        env,
        vault.id.clone(),
        recovery_id,
        old_owner,
        attempt.new_owner.clone(),
    );

    if attempt.peer_eid != 0 {
        let (wire_id, mirrored) = attempt.wire_id(recovery_id);
        let message = RecoveryMessage::approval_complete(vault.id.clone(), wire_id, attempt.new_owner)
            .from_mirror(mirrored);
        coordinator::dispatch(env, payer, attempt.peer_eid, &message, &Bytes::new(env))?;
    }
    Ok(())
}

/// Flags an approving guardian and slashes the vault's `stake_amount` from
/// their stake. Returns the amount slashed.
pub fn mark_malicious(
    env: &Env,
    caller: &Address,
    vault_id: &BytesN<32>,
    recovery_id: u64,
    guardian: &Address,
) -> Result<i128, RecoveryError> {
    let vault = storage::load_vault(env, vault_id)?;
    if !vault.is_owner_or_guardian(caller) {
        return Err(RecoveryError::NotGuardian);
    }
    let (vault, mut attempt) = check_pending(env, vault, recovery_id)?;
    if !attempt.approvals.contains(guardian) {
        return Err(RecoveryError::NotApproved);
    }
    if attempt.malicious.contains(guardian) {
        return Err(RecoveryError::AlreadyFlagged);
    }

    attempt.malicious.push_back(guardian.clone());
    attempt.refresh_quorum(vault.threshold, env.ledger().timestamp());
    storage::save_attempt(env, vault_id, recovery_id, &attempt);

    let slashed = coordinator::slash(env, guardian, vault.stake_amount)?;
    events::emit_guardian_flagged(env, vault_id.clone(), recovery_id, guardian.clone(), slashed);

    if attempt.peer_eid != 0 {
        let (wire_id, mirrored) = attempt.wire_id(recovery_id);
        let message = RecoveryMessage::mark_malicious(vault_id.clone(), wire_id, guardian.clone())
            .from_mirror(mirrored);
        coordinator::dispatch(env, caller, attempt.peer_eid, &message, &Bytes::new(env))?;
    }
    Ok(slashed)
}

/// Owner objection while an attempt is pending.
pub fn cancel_recovery(
    env: &Env,
    owner: &Address,
    vault_id: &BytesN<32>,
    recovery_id: u64,
) -> Result<(), RecoveryError> {
    let vault = storage::load_vault(env, vault_id)?;
    if vault.owner != *owner {
        return Err(RecoveryError::NotOwner);
    }
    let (mut vault, mut attempt) = check_pending(env, vault, recovery_id)?;

    attempt.cancelled = true;
    storage::save_attempt(env, vault_id, recovery_id, &attempt);
    vault.recovery_state = RecoveryState::None;
    vault.last_active = env.ledger().timestamp();
    storage::save_vault(env, &vault);

    events::emit_recovery_cancelled(env, vault_id.clone(), recovery_id);

    if attempt.peer_eid != 0 {
        let (wire_id, mirrored) = attempt.wire_id(recovery_id);
        let message = RecoveryMessage::cancel(vault_id.clone(), wire_id).from_mirror(mirrored);
        coordinator::dispatch(env, owner, attempt.peer_eid, &message, &Bytes::new(env))?;
    }
    Ok(())
}

pub fn get_recovery(env: &Env, vault_id: &BytesN<32>, recovery_id: u64) -> Option<RecoveryAttempt> {
    storage::load_attempt(env, vault_id, recovery_id)
}

pub fn effective_approvals(env: &Env, vault_id: &BytesN<32>, recovery_id: u64) -> u32 {
    storage::load_attempt(env, vault_id, recovery_id)
        .map(|attempt| attempt.effective_approvals())
        .unwrap_or(0)
}
