use common::{is_zero_address, zero_address};
use soroban_sdk::{log, Address, BytesN, Env, Vec};

use crate::errors::RecoveryError;
use crate::events;
use crate::storage;
use crate::types::{Asset, RecoveryState, VaultRecord, MAX_GUARDIANS};

/// Checks a vault configuration before anything is written.
#[allow(clippy::too_many_arguments)]
pub fn validate_terms(
    env: &Env,
    owner: &Address,
    guardians: &Vec<Address>,
    threshold: u32,
    inactivity_period: u64,
    backup_wallet: &Address,
    stake_amount: i128,
    assets: &Vec<Asset>,
) -> Result<(), RecoveryError> {
    let count = guardians.len();
    if count == 0 || threshold == 0 || threshold > count {
        return Err(RecoveryError::InvalidThreshold);
    }
    if count > MAX_GUARDIANS {
        return Err(RecoveryError::TooManyGuardians);
    }
    for (i, guardian) in guardians.iter().enumerate() {
        if guardians.first_index_of(&guardian) != Some(i as u32) {
            return Err(RecoveryError::DuplicateGuardian);
        }
    }
    if backup_wallet == owner || is_zero_address(env, backup_wallet) {
        return Err(RecoveryError::InvalidBackupWallet);
    }
    if stake_amount < 0 || assets.iter().any(|asset| asset.amount < 0) {
        return Err(RecoveryError::InvalidAmount);
    }
    if inactivity_period == 0 {
        return Err(RecoveryError::InvalidConfig);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn initialize_vault(
    env: &Env,
    owner: Address,
    guardians: Vec<Address>,
    threshold: u32,
    timelock: u64,
    inactivity_period: u64,
    backup_wallet: Address,
    stake_amount: i128,
    assets: Vec<Asset>,
) -> Result<BytesN<32>, RecoveryError> {
    storage::config(env)?;
    validate_terms(
        env,
        &owner,
        &guardians,
        threshold,
        inactivity_period,
        &backup_wallet,
        stake_amount,
        &assets,
    )?;

    let now = env.ledger().timestamp();
    let id = storage::next_vault_id(env, &owner);
    let vault = VaultRecord {
        id: id.clone(),
        owner: owner.clone(),
        guardians,
        threshold,
        timelock,
        inactivity_period,
        backup_wallet,
        stake_amount,
        assets,
        recovery_state: RecoveryState::None,
        recovery_id: 0,
        last_active: now,
        backup_claimed: false,
        created_at: now,
    };
    storage::save_vault(env, &vault);
    storage::index_vault(env, &owner, &id);

    log!(env, "vault created with {} guardians", vault.guardians.len());
    events::emit_vault_initialized(env, id.clone(), owner, vault.guardians.len(), threshold);
    Ok(id)
}

pub fn update_last_active(env: &Env, caller: &Address, vault_id: &BytesN<32>) -> Result<(), RecoveryError> {
    let mut vault = storage::load_vault(env, vault_id)?;
    if vault.owner != *caller {
        return Err(RecoveryError::NotOwner);
    }
    vault.last_active = env.ledger().timestamp();
    storage::save_vault(env, &vault);
    events::emit_heartbeat(env, vault_id.clone(), caller.clone());
    Ok(())
}

/// The stored record, or a blank one owned by the zero identity.
pub fn get_vault(env: &Env, vault_id: &BytesN<32>) -> VaultRecord {
    storage::load_vault(env, vault_id).unwrap_or_else(|_| blank_vault(env, vault_id))
}

fn blank_vault(env: &Env, vault_id: &BytesN<32>) -> VaultRecord {
    let zero = zero_address(env);
    VaultRecord {
        id: vault_id.clone(),
        owner: zero.clone(),
        guardians: Vec::new(env),
        threshold: 0,
        timelock: 0,
        inactivity_period: 0,
        backup_wallet: zero,
        stake_amount: 0,
        assets: Vec::new(env),
        recovery_state: RecoveryState::None,
        recovery_id: 0,
        last_active: 0,
        backup_claimed: false,
        created_at: 0,
    }
}

/// Moves ownership to `new_owner` and marks the vault recovered.
///
/// `backup_claimed` tracks whether the backup wallet currently holds the
/// vault, so a later owner can lose it to inactivity again.
pub fn hand_over(env: &Env, vault: &mut VaultRecord, new_owner: &Address) {
    if vault.owner != *new_owner {
        storage::unindex_vault(env, &vault.owner, &vault.id);
        storage::index_vault(env, new_owner, &vault.id);
    }
    vault.owner = new_owner.clone();
    vault.last_active = env.ledger().timestamp();
    vault.recovery_state = RecoveryState::Completed;
    vault.backup_claimed = *new_owner == vault.backup_wallet;
}
