//! Cross-chain message coordination.
//!
//! Outbound: local transitions are encoded as [`RecoveryMessage`]s and handed to
//! the messaging endpoint together with the quoted fee. A failed send fails the
//! surrounding call, which reverts the transition.
//!
//! Inbound: the endpoint calls `lz_receive`. Each message is applied at most
//! once per peer, keyed by [`RecoveryMessage::idempotency_key`].
//!
//! Recovery ids on the wire are the ones the opening ledger assigned. An
//! attempt mirrored from a peer gets the next local id, and the mapping from
//! the peer's id is kept, so local-only activity on either side never makes an
//! in-order message look stale. A message is stale only when it names an
//! attempt this ledger does not know and the peer has since opened a newer
//! one; such messages are dropped, not buffered.

use common::{
    EndpointClient, MessagingFee, MessagingReceipt, Origin, RecoveryAction, RecoveryMessage,
    StakeLedgerClient,
};
use soroban_sdk::{log, Address, Bytes, BytesN, Env};

use crate::errors::RecoveryError;
use crate::events;
use crate::storage;
use crate::types::{AttemptOrigin, RecoveryAttempt, RecoveryState, VaultRecord};
use crate::vault;

// ── Peers ────────────────────────────────────────────────────────────────────

pub fn set_peer(env: &Env, eid: u32, peer: &Address) -> Result<(), RecoveryError> {
    let config = storage::config(env)?;
    if eid == 0 || eid == config.eid {
        return Err(RecoveryError::InvalidConfig);
    }
    storage::set_peer(env, eid, peer);
    Ok(())
}

pub fn remove_peer(env: &Env, eid: u32) -> Result<(), RecoveryError> {
    let mut config = storage::config(env)?;
    storage::remove_peer(env, eid);
    if config.default_peer_eid == eid {
        config.default_peer_eid = 0;
        storage::set_config(env, &config);
    }
    Ok(())
}

pub fn trusted_peer(env: &Env, eid: u32) -> Result<Address, RecoveryError> {
    storage::peer(env, eid).ok_or(RecoveryError::UnknownPeer)
}

// ── Outbound ─────────────────────────────────────────────────────────────────

pub fn quote(
    env: &Env,
    dst_eid: u32,
    message: &Bytes,
    options: &Bytes,
    pay_in_alt: bool,
) -> Result<MessagingFee, RecoveryError> {
    let config = storage::config(env)?;
    let endpoint = EndpointClient::new(env, &config.endpoint);
    match endpoint.try_quote(
        &env.current_contract_address(),
        &dst_eid,
        message,
        options,
        &pay_in_alt,
    ) {
        Ok(Ok(fee)) => Ok(fee),
        _ => Err(RecoveryError::MessageDeliveryFailed),
    }
}

/// Fee for the message a local operation on `vault_id` would send, with
/// `party` as the identity it carries. `Cancel` carries none.
pub fn quote_action(
    env: &Env,
    vault_id: &BytesN<32>,
    action: RecoveryAction,
    dst_eid: u32,
    party: &Address,
) -> Result<MessagingFee, RecoveryError> {
    let config = storage::config(env)?;
    trusted_peer(env, dst_eid)?;
    let vault = storage::load_vault(env, vault_id)?;
    let rid = vault.recovery_id.saturating_add(1);
    let party = party.clone();
    let message = match action {
        RecoveryAction::Initiate => RecoveryMessage::initiate(vault.id, rid, party),
        RecoveryAction::ApprovalComplete => RecoveryMessage::approval_complete(vault.id, rid, party),
        RecoveryAction::MarkMalicious => RecoveryMessage::mark_malicious(vault.id, rid, party),
        RecoveryAction::Cancel => RecoveryMessage::cancel(vault.id, rid),
    };
    quote(env, dst_eid, &message.encode(env), &config.default_options, false)
}

/// Send `message` to the trusted peer on `dst_eid`, charging `payer`.
///
/// Empty `options` fall back to the configured default.
pub fn dispatch(
    env: &Env,
    payer: &Address,
    dst_eid: u32,
    message: &RecoveryMessage,
    options: &Bytes,
) -> Result<MessagingReceipt, RecoveryError> {
    let config = storage::config(env)?;
    let peer = trusted_peer(env, dst_eid)?;
    let options = if options.is_empty() {
        config.default_options.clone()
    } else {
        options.clone()
    };

    let payload = message.encode(env);
    let fee = quote(env, dst_eid, &payload, &options, false)?;
    let endpoint = EndpointClient::new(env, &config.endpoint);
    let receipt = match endpoint.try_send(
        &env.current_contract_address(),
        payer,
        &dst_eid,
        &peer,
        &payload,
        &options,
        &fee,
    ) {
        Ok(Ok(receipt)) => receipt,
        _ => {
            log!(env, "send to eid {} failed", dst_eid);
            return Err(RecoveryError::MessageDeliveryFailed);
        }
    };

    events::emit_message_sent(
        env,
        message.vault_id.clone(),
        dst_eid,
        message.recovery_id,
        message.action,
    );
    Ok(receipt)
}

/// Stake ledger code for a caller that is not an authorised slasher.
const STAKE_LEDGER_UNAUTHORIZED: u32 = 10;

/// Slash `amount` from `guardian` through the stake ledger.
pub fn slash(env: &Env, guardian: &Address, amount: i128) -> Result<i128, RecoveryError> {
    if amount <= 0 {
        return Ok(0);
    }
    let config = storage::config(env)?;
    let ledger = StakeLedgerClient::new(env, &config.stake_ledger);
    match ledger.try_slash(&env.current_contract_address(), guardian, &amount) {
        Ok(Ok(slashed)) => Ok(slashed),
        Err(Ok(e)) if e == soroban_sdk::Error::from_contract_error(STAKE_LEDGER_UNAUTHORIZED) => {
            Err(RecoveryError::Unauthorized)
        }
        _ => {
            log!(env, "stake ledger rejected slash");
            Err(RecoveryError::StakeLedgerUnavailable)
        }
    }
}

pub fn staked_balance(env: &Env, guardian: &Address) -> Result<i128, RecoveryError> {
    let config = storage::config(env)?;
    let ledger = StakeLedgerClient::new(env, &config.stake_ledger);
    match ledger.try_get_staked_balance(guardian) {
        Ok(Ok(balance)) => Ok(balance),
        _ => Err(RecoveryError::StakeLedgerUnavailable),
    }
}

// ── Inbound ──────────────────────────────────────────────────────────────────

enum Outcome {
    Applied,
    /// Already reflected locally; recorded so the key is not evaluated again.
    AlreadyInEffect,
    Stale,
}

pub fn lz_receive(
    env: &Env,
    origin: &Origin,
    payload: &Bytes,
) -> Result<bool, RecoveryError> {
    let config = storage::config(env)?;
    config.endpoint.require_auth();

    match storage::peer(env, origin.src_eid) {
        Some(peer) if peer == origin.sender => {}
        _ => return Err(RecoveryError::UntrustedPeer),
    }

    let message =
        RecoveryMessage::decode(env, payload).map_err(|_| RecoveryError::MalformedMessage)?;
    let mut vault = storage::load_vault(env, &message.vault_id)?;

    let key = message.idempotency_key(env);
    if storage::is_applied(env, origin.src_eid, &key) {
        return Ok(false);
    }

    let src_eid = origin.src_eid;
    let outcome = match message.action {
        RecoveryAction::Initiate => apply_initiate(env, &mut vault, &message, src_eid),
        RecoveryAction::ApprovalComplete => {
            apply_approval_complete(env, &mut vault, &message, src_eid)
        }
        RecoveryAction::MarkMalicious => apply_mark_malicious(env, &vault, &message, src_eid)?,
        RecoveryAction::Cancel => apply_cancel(env, &mut vault, &message, src_eid),
    };

    match outcome {
        Outcome::Stale => {
            log!(env, "dropped stale message for recovery {}", message.recovery_id);
            events::emit_message_dropped(
                env,
                message.vault_id.clone(),
                src_eid,
                message.recovery_id,
                message.action,
            );
            Ok(false)
        }
        Outcome::AlreadyInEffect => {
            storage::mark_applied(env, src_eid, &key);
            Ok(false)
        }
        Outcome::Applied => {
            storage::mark_applied(env, src_eid, &key);
            events::emit_message_received(
                env,
                message.vault_id.clone(),
                src_eid,
                message.recovery_id,
                message.action,
            );
            Ok(true)
        }
    }
}

/// The local attempt `message` names, with its local id.
///
/// A mirrored message names an attempt this ledger opened and mirrored to
/// `src_eid`; any other message names one `src_eid` opened.
fn resolve(
    env: &Env,
    vault: &VaultRecord,
    message: &RecoveryMessage,
    src_eid: u32,
) -> Option<(u64, RecoveryAttempt)> {
    let local_id = if message.mirrored {
        message.recovery_id
    } else {
        storage::remote_attempt(env, &vault.id, src_eid, message.recovery_id)?
    };
    let attempt = storage::load_attempt(env, &vault.id, local_id)?;
    if message.mirrored
        && (attempt.peer_eid != src_eid || matches!(attempt.origin, AttemptOrigin::Remote(_)))
    {
        return None;
    }
    Some((local_id, attempt))
}

/// Whether `message` names an attempt `src_eid` opened that this ledger has
/// not mirrored yet. Ids a peer assigns only grow, so anything at or below
/// the watermark was overtaken in transit.
fn is_unseen(env: &Env, vault: &VaultRecord, message: &RecoveryMessage, src_eid: u32) -> bool {
    !message.mirrored && message.recovery_id > storage::inbound_watermark(env, &vault.id, src_eid)
}

/// Mirrors an attempt `src_eid` opened under the next local id, which
/// becomes the vault's current attempt.
fn adopt(
    env: &Env,
    vault: &mut VaultRecord,
    message: &RecoveryMessage,
    src_eid: u32,
    new_owner: Address,
) -> (u64, RecoveryAttempt) {
    let local_id = vault.recovery_id + 1;
    let mut attempt = RecoveryAttempt::new(env, new_owner, AttemptOrigin::Remote(src_eid), src_eid);
    attempt.remote_id = message.recovery_id;

    storage::map_remote_attempt(env, &vault.id, src_eid, message.recovery_id, local_id);
    storage::set_inbound_watermark(env, &vault.id, src_eid, message.recovery_id);
    vault.recovery_id = local_id;
    (local_id, attempt)
}

fn apply_initiate(
    env: &Env,
    vault: &mut VaultRecord,
    message: &RecoveryMessage,
    src_eid: u32,
) -> Outcome {
    if !is_unseen(env, vault, message, src_eid) {
        return Outcome::Stale;
    }
    let Some(new_owner) = message.new_owner.clone() else {
        return Outcome::Stale;
    };

    let (local_id, attempt) = adopt(env, vault, message, src_eid, new_owner.clone());
    storage::save_attempt(env, &vault.id, local_id, &attempt);
    vault.recovery_state = RecoveryState::Pending;
    storage::save_vault(env, vault);

    events::emit_recovery_initiated(env, vault.id.clone(), local_id, new_owner, vault.owner.clone());
    Outcome::Applied
}

/// Completion wins over a local cancellation of the same attempt, so both
/// ledgers converge on the recovered owner. A completion that arrives after
/// a newer local completion is stale.
fn apply_approval_complete(
    env: &Env,
    vault: &mut VaultRecord,
    message: &RecoveryMessage,
    src_eid: u32,
) -> Outcome {
    let Some(new_owner) = message.new_owner.clone() else {
        return Outcome::Stale;
    };

    let (local_id, mut attempt) = match resolve(env, vault, message, src_eid) {
        Some((_, attempt)) if attempt.completed => return Outcome::AlreadyInEffect,
        Some(found) => found,
        None if is_unseen(env, vault, message, src_eid) => {
            adopt(env, vault, message, src_eid, new_owner.clone())
        }
        None => return Outcome::Stale,
    };

    let is_current = local_id == vault.recovery_id;
    if !is_current {
        let newer_completed = storage::load_attempt(env, &vault.id, vault.recovery_id)
            .map(|current| current.completed)
            .unwrap_or(false);
        if newer_completed {
            return Outcome::Stale;
        }
    }

    let now = env.ledger().timestamp();
    attempt.new_owner = new_owner.clone();
    attempt.completed = true;
    attempt.cancelled = false;
    if attempt.quorum_at.is_none() {
        attempt.quorum_at = Some(now);
    }
    storage::save_attempt(env, &vault.id, local_id, &attempt);

    let old_owner = vault.owner.clone();
    let state = vault.recovery_state;
    vault::hand_over(env, vault, &new_owner);
    if !is_current {
        // The newer local attempt keeps driving the vault's state.
        vault.recovery_state = state;
    }
    storage::save_vault(env, vault);

    events::emit_recovery_completed(env, vault.id.clone(), local_id, old_owner, new_owner);
    Outcome::Applied
}

fn apply_mark_malicious(
    env: &Env,
    vault: &VaultRecord,
    message: &RecoveryMessage,
    src_eid: u32,
) -> Result<Outcome, RecoveryError> {
    let Some(guardian) = message.guardian.clone() else {
        return Ok(Outcome::Stale);
    };
    let Some((local_id, mut attempt)) = resolve(env, vault, message, src_eid) else {
        return Ok(Outcome::Stale);
    };
    if attempt.malicious.contains(&guardian) {
        return Ok(Outcome::AlreadyInEffect);
    }

    attempt.malicious.push_back(guardian.clone());
    if attempt.is_open() {
        attempt.refresh_quorum(vault.threshold, env.ledger().timestamp());
    }
    storage::save_attempt(env, &vault.id, local_id, &attempt);

    let slashed = slash(env, &guardian, vault.stake_amount)?;
    events::emit_guardian_flagged(env, vault.id.clone(), local_id, guardian, slashed);
    Ok(Outcome::Applied)
}

fn apply_cancel(
    env: &Env,
    vault: &mut VaultRecord,
    message: &RecoveryMessage,
    src_eid: u32,
) -> Outcome {
    let Some((local_id, mut attempt)) = resolve(env, vault, message, src_eid) else {
        return Outcome::Stale;
    };
    if attempt.completed {
        return Outcome::Stale;
    }
    if attempt.cancelled {
        return Outcome::AlreadyInEffect;
    }

    attempt.cancelled = true;
    storage::save_attempt(env, &vault.id, local_id, &attempt);
    if local_id == vault.recovery_id {
        vault.recovery_state = RecoveryState::None;
        storage::save_vault(env, vault);
    }

    events::emit_recovery_cancelled(env, vault.id.clone(), local_id);
    Outcome::Applied
}
