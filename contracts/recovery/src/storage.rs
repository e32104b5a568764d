use common::ttl::{extend_instance, extend_persistent};
use soroban_sdk::{symbol_short, xdr::ToXdr, Address, Bytes, BytesN, Env, Symbol, Vec};

use crate::errors::RecoveryError;
use crate::types::{Config, RecoveryAttempt, VaultRecord};

// ── Storage keys ─────────────────────────────────────────────────────────────

const CONFIG: Symbol = symbol_short!("CONFIG");
const VAULT: Symbol = symbol_short!("VAULT");
const ATTEMPT: Symbol = symbol_short!("ATTEMPT");
const OWNER_NONCE: Symbol = symbol_short!("OWN_NNC");
const OWNED: Symbol = symbol_short!("OWNED");
const PEER: Symbol = symbol_short!("PEER");
const APPLIED: Symbol = symbol_short!("APPLIED");
const INBOUND: Symbol = symbol_short!("INBOUND");
const REMOTE: Symbol = symbol_short!("REMOTE");

fn vault_key(id: &BytesN<32>) -> (Symbol, BytesN<32>) {
    (VAULT, id.clone())
}

fn attempt_key(id: &BytesN<32>, recovery_id: u64) -> (Symbol, BytesN<32>, u64) {
    (ATTEMPT, id.clone(), recovery_id)
}

// ── Config ───────────────────────────────────────────────────────────────────

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&CONFIG)
}

pub fn config(env: &Env) -> Result<Config, RecoveryError> {
    let config = env
        .storage()
        .instance()
        .get(&CONFIG)
        .ok_or(RecoveryError::NotInitialized)?;
    extend_instance(env);
    Ok(config)
}

pub fn set_config(env: &Env, config: &Config) {
    env.storage().instance().set(&CONFIG, config);
    extend_instance(env);
}

// ── Vaults ───────────────────────────────────────────────────────────────────

/// `sha256(xdr(owner) ‖ nonce)` where `nonce` counts the owner's vaults on
/// this ledger. Consumes the nonce.
pub fn next_vault_id(env: &Env, owner: &Address) -> BytesN<32> {
    let key = (OWNER_NONCE, owner.clone());
    let nonce: u64 = env.storage().persistent().get(&key).unwrap_or(0);
    env.storage().persistent().set(&key, &(nonce + 1));
    extend_persistent(env, &key);

    let mut preimage = Bytes::new(env);
    preimage.append(&owner.clone().to_xdr(env));
    preimage.extend_from_array(&nonce.to_be_bytes());
    env.crypto().sha256(&preimage).to_bytes()
}

pub fn has_vault(env: &Env, id: &BytesN<32>) -> bool {
    env.storage().persistent().has(&vault_key(id))
}

pub fn load_vault(env: &Env, id: &BytesN<32>) -> Result<VaultRecord, RecoveryError> {
    let key = vault_key(id);
    let vault = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(RecoveryError::VaultNotFound)?;
    extend_persistent(env, &key);
    Ok(vault)
}

pub fn save_vault(env: &Env, vault: &VaultRecord) {
    let key = vault_key(&vault.id);
    env.storage().persistent().set(&key, vault);
    extend_persistent(env, &key);
}

pub fn vaults_of(env: &Env, owner: &Address) -> Vec<BytesN<32>> {
    env.storage()
        .persistent()
        .get(&(OWNED, owner.clone()))
        .unwrap_or(Vec::new(env))
}

fn write_owned(env: &Env, owner: &Address, ids: &Vec<BytesN<32>>) {
    let key = (OWNED, owner.clone());
    if ids.is_empty() {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, ids);
        extend_persistent(env, &key);
    }
}

pub fn index_vault(env: &Env, owner: &Address, id: &BytesN<32>) {
    let mut ids = vaults_of(env, owner);
    if !ids.contains(id) {
        ids.push_back(id.clone());
    }
    write_owned(env, owner, &ids);
}

pub fn unindex_vault(env: &Env, owner: &Address, id: &BytesN<32>) {
    let mut ids = vaults_of(env, owner);
    if let Some(pos) = ids.first_index_of(id) {
        ids.remove(pos);
        write_owned(env, owner, &ids);
    }
}

// ── Recovery attempts ────────────────────────────────────────────────────────

pub fn load_attempt(env: &Env, id: &BytesN<32>, recovery_id: u64) -> Option<RecoveryAttempt> {
    let key = attempt_key(id, recovery_id);
    let attempt = env.storage().persistent().get(&key);
    if attempt.is_some() {
        extend_persistent(env, &key);
    }
    attempt
}

pub fn save_attempt(env: &Env, id: &BytesN<32>, recovery_id: u64, attempt: &RecoveryAttempt) {
    let key = attempt_key(id, recovery_id);
    env.storage().persistent().set(&key, attempt);
    extend_persistent(env, &key);
}

// ── Peers ────────────────────────────────────────────────────────────────────

pub fn peer(env: &Env, eid: u32) -> Option<Address> {
    env.storage().persistent().get(&(PEER, eid))
}

pub fn set_peer(env: &Env, eid: u32, peer: &Address) {
    let key = (PEER, eid);
    env.storage().persistent().set(&key, peer);
    extend_persistent(env, &key);
}

pub fn remove_peer(env: &Env, eid: u32) {
    env.storage().persistent().remove(&(PEER, eid));
}

// ── Inbound bookkeeping ──────────────────────────────────────────────────────

pub fn is_applied(env: &Env, src_eid: u32, key: &BytesN<32>) -> bool {
    env.storage().persistent().has(&(APPLIED, src_eid, key.clone()))
}

pub fn mark_applied(env: &Env, src_eid: u32, key: &BytesN<32>) {
    let key = (APPLIED, src_eid, key.clone());
    env.storage().persistent().set(&key, &true);
    extend_persistent(env, &key);
}

/// Highest recovery id `src_eid` has opened for the vault and this ledger
/// has mirrored.
pub fn inbound_watermark(env: &Env, id: &BytesN<32>, src_eid: u32) -> u64 {
    env.storage()
        .persistent()
        .get(&(INBOUND, id.clone(), src_eid))
        .unwrap_or(0)
}

pub fn set_inbound_watermark(env: &Env, id: &BytesN<32>, src_eid: u32, recovery_id: u64) {
    let key = (INBOUND, id.clone(), src_eid);
    env.storage().persistent().set(&key, &recovery_id);
    extend_persistent(env, &key);
}

/// Local id of the attempt `src_eid` numbers `remote_id`.
pub fn remote_attempt(env: &Env, id: &BytesN<32>, src_eid: u32, remote_id: u64) -> Option<u64> {
    let key = (REMOTE, id.clone(), src_eid, remote_id);
    let local = env.storage().persistent().get(&key);
    if local.is_some() {
        extend_persistent(env, &key);
    }
    local
}

pub fn map_remote_attempt(env: &Env, id: &BytesN<32>, src_eid: u32, remote_id: u64, local_id: u64) {
    let key = (REMOTE, id.clone(), src_eid, remote_id);
    env.storage().persistent().set(&key, &local_id);
    extend_persistent(env, &key);
}
