use common::RecoveryMessage;
use soroban_sdk::{log, Address, Bytes, BytesN, Env};

use crate::coordinator;
use crate::errors::RecoveryError;
use crate::events;
use crate::storage;
use crate::types::{AttemptOrigin, RecoveryAttempt, VaultRecord};
use crate::vault;

pub fn is_inactive(vault: &VaultRecord, now: u64) -> bool {
    now >= vault.last_active.saturating_add(vault.inactivity_period)
}

/// Dead-man's switch: hands the vault to its backup wallet once the owner has
/// been silent for `inactivity_period`.
///
/// Returns `false` without effect while the backup wallet already holds the
/// vault.
pub fn check_inactivity(
    env: &Env,
    caller: &Address,
    vault_id: &BytesN<32>,
) -> Result<bool, RecoveryError> {
    let config = storage::config(env)?;
    let mut vault = storage::load_vault(env, vault_id)?;
    if vault.backup_claimed {
        return Ok(false);
    }
    let now = env.ledger().timestamp();
    if !is_inactive(&vault, now) {
        return Err(RecoveryError::NotInactiveYet);
    }

    let peer_eid = config.default_peer_eid;
    let backup = vault.backup_wallet.clone();
    let recovery_id = vault.recovery_id + 1;

    let mut attempt = RecoveryAttempt::new(env, backup.clone(), AttemptOrigin::Inactivity, peer_eid);
    attempt.quorum_at = Some(now);
    attempt.completed = true;
    storage::save_attempt(env, vault_id, recovery_id, &attempt);

    let old_owner = vault.owner.clone();
    vault.recovery_id = recovery_id;
    vault::hand_over(env, &mut vault, &backup);
    storage::save_vault(env, &vault);

    log!(env, "owner inactive, vault handed to backup wallet");
    events::emit_inactivity_claimed(env, vault_id.clone(), recovery_id, backup.clone());
    events::emit_recovery_completed(env, vault_id.clone(), recovery_id, old_owner, backup.clone());

    if peer_eid != 0 {
        let message = RecoveryMessage::approval_complete(vault_id.clone(), recovery_id, backup);
        coordinator::dispatch(env, caller, peer_eid, &message, &Bytes::new(env))?;
    }
    Ok(true)
}

/// Seconds left before the vault becomes eligible for backup recovery.
pub fn time_until_inactive(env: &Env, vault_id: &BytesN<32>) -> Result<u64, RecoveryError> {
    let vault = storage::load_vault(env, vault_id)?;
    let deadline = vault.last_active.saturating_add(vault.inactivity_period);
    Ok(deadline.saturating_sub(env.ledger().timestamp()))
}
