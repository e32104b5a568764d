//! # Reclaim Recovery Vault
//!
//! Social-recovery vaults mirrored across two ledgers.
//!
//! An owner registers a vault with a guardian set, an approval threshold, a
//! timelock, an inactivity period and a backup wallet. Ownership can move in
//! two ways:
//!
//! - **Guardian recovery**: an owner or guardian opens an attempt naming a new
//!   owner, guardians approve it, and once `threshold` effective approvals
//!   have held for `timelock` seconds the attempt is finalised. Guardians that
//!   are flagged malicious stop counting and lose stake.
//! - **Inactivity**: once the owner has been silent for `inactivity_period`
//!   anyone may hand the vault to the backup wallet.
//!
//! Every transition that the peer ledger must learn about is sent through the
//! omnichain endpoint as a [`common::RecoveryMessage`] and replayed there by
//! `lz_receive`.
//!
//! ## Modules
//! | Module          | Responsibility                                  |
//! |-----------------|-------------------------------------------------|
//! | [`vault`]       | vault creation, heartbeat, reads                |
//! | [`recovery`]    | attempt state machine                           |
//! | [`coordinator`] | outbound dispatch, inbound replay, peer registry |
//! | [`inactivity`]  | dead-man's switch                               |
#![no_std]
#![allow(clippy::too_many_arguments)]

pub mod coordinator;
pub mod errors;
pub mod events;
pub mod inactivity;
pub mod recovery;
pub mod storage;
pub mod types;
pub mod vault;


pub use errors::RecoveryError;
pub use types::{
    Asset, AssetKind, AttemptOrigin, Config, RecoveryAttempt, RecoveryState, VaultRecord,
    MAX_GUARDIANS,
};

use common::{MessagingFee, Origin, RecoveryAction};
use soroban_sdk::{contract, contractimpl, Address, Bytes, BytesN, Env, Vec};

#[contract]
pub struct RecoveryVaultContract;

#[contractimpl]
impl RecoveryVaultContract {
    // ── Configuration ────────────────────────────────────────────────────────

    /// Wire the vault to this ledger's messaging endpoint and stake ledger.
    ///
    /// The contract must also be registered as a slasher on the stake ledger.
    pub fn initialize(
        env: Env,
        admin: Address,
        endpoint: Address,
        stake_ledger: Address,
        eid: u32,
        default_options: Bytes,
    ) -> Result<(), RecoveryError> {
        if storage::has_config(&env) {
            return Err(RecoveryError::AlreadyInitialized);
        }
        admin.require_auth();
        if eid == 0 {
            return Err(RecoveryError::InvalidConfig);
        }
        storage::set_config(
            &env,
            &Config {
                admin,
                endpoint,
                stake_ledger,
                eid,
                default_peer_eid: 0,
                default_options,
            },
        );
        Ok(())
    }

    pub fn get_config(env: Env) -> Result<Config, RecoveryError> {
        storage::config(&env)
    }

    pub fn set_peer(
        env: Env,
        admin: Address,
        eid: u32,
        peer: Address,
    ) -> Result<(), RecoveryError> {
        Self::require_admin(&env, &admin)?;
        coordinator::set_peer(&env, eid, &peer)
    }

    pub fn remove_peer(env: Env, admin: Address, eid: u32) -> Result<(), RecoveryError> {
        Self::require_admin(&env, &admin)?;
        coordinator::remove_peer(&env, eid)
    }

    pub fn get_peer(env: Env, eid: u32) -> Option<Address> {
        storage::peer(&env, eid)
    }

    /// Peer that inactivity hand-overs are mirrored to. `0` disables mirroring.
    pub fn set_default_peer(env: Env, admin: Address, eid: u32) -> Result<(), RecoveryError> {
        Self::require_admin(&env, &admin)?;
        if eid != 0 {
            coordinator::trusted_peer(&env, eid)?;
        }
        let mut config = storage::config(&env)?;
        config.default_peer_eid = eid;
        storage::set_config(&env, &config);
        Ok(())
    }

    // ── Vault store ──────────────────────────────────────────────────────────

    pub fn initialize_vault(
        env: Env,
        owner: Address,
        guardians: Vec<Address>,
        threshold: u32,
        timelock: u64,
        inactivity_period: u64,
        backup_wallet: Address,
        stake_amount: i128,
        assets: Vec<Asset>,
    ) -> Result<BytesN<32>, RecoveryError> {
        owner.require_auth();
        vault::initialize_vault(
            &env,
            owner,
            guardians,
            threshold,
            timelock,
            inactivity_period,
            backup_wallet,
            stake_amount,
            assets,
        )
    }

    /// Owner heartbeat; resets the inactivity countdown.
    pub fn update_last_active(
        env: Env,
        caller: Address,
        vault_id: BytesN<32>,
    ) -> Result<(), RecoveryError> {
        caller.require_auth();
        vault::update_last_active(&env, &caller, &vault_id)
    }

    /// Never fails: unknown ids yield a blank record owned by the zero
    /// identity.
    pub fn get_vault(env: Env, vault_id: BytesN<32>) -> VaultRecord {
        vault::get_vault(&env, &vault_id)
    }

    pub fn vault_exists(env: Env, vault_id: BytesN<32>) -> bool {
        storage::has_vault(&env, &vault_id)
    }

    pub fn vaults_of(env: Env, owner: Address) -> Vec<BytesN<32>> {
        storage::vaults_of(&env, &owner)
    }

    // ── Recovery state machine ───────────────────────────────────────────────

    /// Open a new attempt. `dst_eid == 0` keeps it local; otherwise the
    /// caller pays for an `Initiate` message to that ledger's peer.
    pub fn initiate_recovery(
        env: Env,
        caller: Address,
        vault_id: BytesN<32>,
        new_owner: Address,
        dst_eid: u32,
        options: Bytes,
    ) -> Result<u64, RecoveryError> {
        caller.require_auth();
        recovery::initiate_recovery(&env, &caller, &vault_id, &new_owner, dst_eid, &options)
    }

    pub fn approve_recovery(
        env: Env,
        guardian: Address,
        vault_id: BytesN<32>,
        recovery_id: u64,
    ) -> Result<bool, RecoveryError> {
        guardian.require_auth();
        recovery::approve_recovery(&env, &guardian, &vault_id, recovery_id)
    }

    pub fn finalize_recovery(
        env: Env,
        caller: Address,
        vault_id: BytesN<32>,
        recovery_id: u64,
    ) -> Result<(), RecoveryError> {
        caller.require_auth();
        recovery::finalize_recovery(&env, &caller, &vault_id, recovery_id)
    }

    pub fn mark_malicious(
        env: Env,
        caller: Address,
        vault_id: BytesN<32>,
        recovery_id: u64,
        guardian: Address,
    ) -> Result<i128, RecoveryError> {
        caller.require_auth();
        recovery::mark_malicious(&env, &caller, &vault_id, recovery_id, &guardian)
    }

    pub fn cancel_recovery(
        env: Env,
        owner: Address,
        vault_id: BytesN<32>,
        recovery_id: u64,
    ) -> Result<(), RecoveryError> {
        owner.require_auth();
        recovery::cancel_recovery(&env, &owner, &vault_id, recovery_id)
    }

    pub fn get_recovery(
        env: Env,
        vault_id: BytesN<32>,
        recovery_id: u64,
    ) -> Option<RecoveryAttempt> {
        recovery::get_recovery(&env, &vault_id, recovery_id)
    }

    pub fn effective_approvals(env: Env, vault_id: BytesN<32>, recovery_id: u64) -> u32 {
        recovery::effective_approvals(&env, &vault_id, recovery_id)
    }

    // ── Inactivity monitor ───────────────────────────────────────────────────

    pub fn check_inactivity(
        env: Env,
        caller: Address,
        vault_id: BytesN<32>,
    ) -> Result<bool, RecoveryError> {
        caller.require_auth();
        inactivity::check_inactivity(&env, &caller, &vault_id)
    }

    pub fn time_until_inactive(env: Env, vault_id: BytesN<32>) -> Result<u64, RecoveryError> {
        inactivity::time_until_inactive(&env, &vault_id)
    }

    // ── Cross-chain coordinator ──────────────────────────────────────────────

    pub fn quote(
        env: Env,
        dst_eid: u32,
        message: Bytes,
        options: Bytes,
        pay_in_alt: bool,
    ) -> Result<MessagingFee, RecoveryError> {
        coordinator::quote(&env, dst_eid, &message, &options, pay_in_alt)
    }

    /// `party` is the identity the message would carry: the new owner for
    /// `Initiate` and `ApprovalComplete`, the guardian for `MarkMalicious`.
    pub fn quote_action(
        env: Env,
        vault_id: BytesN<32>,
        action: RecoveryAction,
        dst_eid: u32,
        party: Address,
    ) -> Result<MessagingFee, RecoveryError> {
        coordinator::quote_action(&env, &vault_id, action, dst_eid, &party)
    }

    /// Inbound message from the endpoint. Returns `true` when it changed
    /// local state.
    pub fn lz_receive(
        env: Env,
        origin: Origin,
        _guid: BytesN<32>,
        message: Bytes,
    ) -> Result<bool, RecoveryError> {
        coordinator::lz_receive(&env, &origin, &message)
    }
}

impl RecoveryVaultContract {
    fn require_admin(env: &Env, caller: &Address) -> Result<(), RecoveryError> {
        caller.require_auth();
        if storage::config(env)?.admin != *caller {
            return Err(RecoveryError::Unauthorized);
        }
        Ok(())
    }
}
