//! # Property-Based Test Generators
//!
//! Composable `proptest` strategies for vault terms, stake amounts and
//! sequences of protocol actions.
//!
//! Generators produce *semantic* values so tests reach real contract paths;
//! roughly a fifth of scalar values are boundary cases.

extern crate std;

use proptest::prelude::*;
use std::vec::Vec;

// ── Scalar Generators ────────────────────────────────────────────────────────

/// Token amounts biased toward 0, 1 and a large realistic supply.
pub fn amount_strategy() -> impl Strategy<Value = i128> {
    prop_oneof![
        1 => Just(0i128),
        1 => Just(1i128),
        1 => Just(1_000_000_000_000_000i128),
        7 => (1i128..=1_000_000_000_000_000i128),
    ]
}

pub fn positive_amount_strategy() -> impl Strategy<Value = i128> {
    prop_oneof![
        1 => Just(1i128),
        1 => Just(1_000_000_000_000_000i128),
        8 => (1i128..=1_000_000_000_000_000i128),
    ]
}

/// Amounts the stake ledger must refuse.
pub fn invalid_amount_strategy() -> impl Strategy<Value = i128> {
    prop_oneof![
        5 => Just(0i128),
        3 => (-1_000_000i128..=-1i128),
        2 => Just(i128::MIN),
    ]
}

/// Time deltas in seconds, up to a year.
pub fn duration_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![
        1 => Just(0u64),
        1 => Just(1u64),
        2 => (1u64..=3_600u64),
        3 => (1u64..=86_400u64),
        2 => (1u64..=604_800u64),
        1 => Just(31_536_000u64),
    ]
}

// ── Vault Terms ──────────────────────────────────────────────────────────────

/// Shape of a vault, independent of addresses.
#[derive(Debug, Clone)]
pub struct VaultTerms {
    pub guardians: usize,
    pub threshold: u32,
    pub timelock: u64,
    pub inactivity_period: u64,
    pub stake_amount: i128,
}

impl VaultTerms {
    /// Whether the vault store should accept these terms.
    pub fn is_valid(&self) -> bool {
        self.guardians >= 1
            && self.guardians <= recovery::MAX_GUARDIANS as usize
            && self.threshold >= 1
            && self.threshold as usize <= self.guardians
            && self.inactivity_period > 0
            && self.stake_amount >= 0
    }
}

/// Terms that always pass validation.
pub fn valid_terms_strategy() -> impl Strategy<Value = VaultTerms> {
    (1usize..=recovery::MAX_GUARDIANS as usize).prop_flat_map(|guardians| {
        (
            1u32..=guardians as u32,
            prop_oneof![Just(0u64), 1u64..=86_400u64],
            1u64..=2_592_000u64,
            prop_oneof![Just(0i128), 1i128..=10_000i128],
        )
            .prop_map(move |(threshold, timelock, inactivity_period, stake_amount)| VaultTerms {
                guardians,
                threshold,
                timelock,
                inactivity_period,
                stake_amount,
            })
    })
}

/// Terms that may be valid or not, each field drawn near its boundary.
pub fn any_terms_strategy() -> impl Strategy<Value = VaultTerms> {
    (
        0usize..=recovery::MAX_GUARDIANS as usize + 2,
        0u32..=14u32,
        0u64..=86_400u64,
        prop_oneof![Just(0u64), 1u64..=604_800u64],
        prop_oneof![Just(-1i128), Just(0i128), 1i128..=10_000i128],
    )
        .prop_map(
            |(guardians, threshold, timelock, inactivity_period, stake_amount)| VaultTerms {
                guardians,
                threshold,
                timelock,
                inactivity_period,
                stake_amount,
            },
        )
}

// ── Action Generators ────────────────────────────────────────────────────────

/// One step of protocol activity against the source ledger.
///
/// `actor` and `guardian` index into the explorer's participant pool and
/// guardian list respectively (modular indexing). The pool is the original
/// owner, then the guardians, then one outsider.
#[derive(Debug, Clone)]
pub enum ProtocolAction {
    Stake { guardian: usize, amount: i128 },
    Unstake { guardian: usize, amount: i128 },
    /// Open a mirrored attempt naming participant `new_owner` as recipient.
    Initiate { actor: usize, new_owner: usize },
    Approve { guardian: usize },
    Finalize,
    /// The owner flags an approving guardian.
    Flag { guardian: usize },
    Cancel,
    Heartbeat,
    CheckInactivity,
    AdvanceTime { delta: u64 },
    /// Deliver everything in flight.
    Relay,
}

/// Weights favour approvals and relays so that quorum is regularly reached.
pub fn protocol_action_strategy(guardians: usize) -> impl Strategy<Value = ProtocolAction> {
    let g = 0..guardians;
    let pool = 0..guardians + 2;

    prop_oneof![
        8 => (g.clone(), 1i128..=5_000i128).prop_map(|(guardian, amount)| ProtocolAction::Stake { guardian, amount }),
        3 => (g.clone(), 1i128..=5_000i128).prop_map(|(guardian, amount)| ProtocolAction::Unstake { guardian, amount }),
        8 => (pool.clone(), pool).prop_map(|(actor, new_owner)| ProtocolAction::Initiate { actor, new_owner }),
        20 => g.clone().prop_map(|guardian| ProtocolAction::Approve { guardian }),
        6 => Just(ProtocolAction::Finalize),
        4 => g.prop_map(|guardian| ProtocolAction::Flag { guardian }),
        3 => Just(ProtocolAction::Cancel),
        4 => Just(ProtocolAction::Heartbeat),
        3 => Just(ProtocolAction::CheckInactivity),
        12 => duration_strategy().prop_map(|delta| ProtocolAction::AdvanceTime { delta }),
        10 => Just(ProtocolAction::Relay),
    ]
}

pub fn protocol_action_sequence(
    guardians: usize,
    max_len: usize,
) -> impl Strategy<Value = Vec<ProtocolAction>> {
    prop::collection::vec(protocol_action_strategy(guardians), 1..=max_len)
}

// ── Recovery Patterns ────────────────────────────────────────────────────────

/// Hand-shaped action sequences for the flows users actually go through.
#[derive(Debug, Clone)]
pub enum RecoveryPattern {
    /// Initiate, reach quorum, wait out the timelock, finalize, relay.
    HappyPath,
    /// A guardian approves and is flagged before quorum settles.
    MaliciousGuardian,
    /// The owner cancels an attempt they did not start.
    OwnerObjects,
    /// The owner goes silent and the backup wallet claims the vault.
    Abandoned,
    /// A second attempt replaces the first mid-flight.
    SupersededAttempt,
}

/// Expand a pattern into concrete actions for a vault with `guardians`
/// guardians and the given timelock and inactivity period.
pub fn pattern_to_actions(
    pattern: &RecoveryPattern,
    guardians: usize,
    timelock: u64,
    inactivity_period: u64,
) -> Vec<ProtocolAction> {
    let stake_all = (0..guardians).map(|guardian| ProtocolAction::Stake {
        guardian,
        amount: 1_000,
    });
    let approve_all = (0..guardians).map(|guardian| ProtocolAction::Approve { guardian });
    let heir = guardians + 1;

    let mut actions: Vec<ProtocolAction> = stake_all.collect();
    match pattern {
        RecoveryPattern::HappyPath => {
            actions.push(ProtocolAction::Initiate { actor: 1, new_owner: heir });
            actions.push(ProtocolAction::Relay);
            actions.extend(approve_all);
            actions.push(ProtocolAction::AdvanceTime { delta: timelock });
            actions.push(ProtocolAction::Finalize);
            actions.push(ProtocolAction::Relay);
        }
        RecoveryPattern::MaliciousGuardian => {
            actions.push(ProtocolAction::Initiate { actor: 1, new_owner: 1 });
            actions.push(ProtocolAction::Approve { guardian: 0 });
            actions.push(ProtocolAction::Flag { guardian: 0 });
            actions.push(ProtocolAction::Relay);
            actions.extend(approve_all);
            actions.push(ProtocolAction::AdvanceTime { delta: timelock });
            actions.push(ProtocolAction::Finalize);
            actions.push(ProtocolAction::Relay);
        }
        RecoveryPattern::OwnerObjects => {
            actions.push(ProtocolAction::Initiate { actor: 1, new_owner: 1 });
            actions.push(ProtocolAction::Approve { guardian: 0 });
            actions.push(ProtocolAction::Cancel);
            actions.push(ProtocolAction::Relay);
            actions.push(ProtocolAction::Finalize);
        }
        RecoveryPattern::Abandoned => {
            actions.push(ProtocolAction::AdvanceTime { delta: inactivity_period / 2 });
            actions.push(ProtocolAction::Heartbeat);
            actions.push(ProtocolAction::AdvanceTime { delta: inactivity_period });
            actions.push(ProtocolAction::CheckInactivity);
            actions.push(ProtocolAction::Relay);
            actions.push(ProtocolAction::CheckInactivity);
        }
        RecoveryPattern::SupersededAttempt => {
            actions.push(ProtocolAction::Initiate { actor: 1, new_owner: 1 });
            actions.push(ProtocolAction::Approve { guardian: 0 });
            actions.push(ProtocolAction::Initiate { actor: 0, new_owner: heir });
            actions.push(ProtocolAction::Relay);
            actions.extend(approve_all);
            actions.push(ProtocolAction::AdvanceTime { delta: timelock });
            actions.push(ProtocolAction::Finalize);
            actions.push(ProtocolAction::Relay);
        }
    }
    actions
}

pub fn recovery_pattern_strategy() -> impl Strategy<Value = RecoveryPattern> {
    prop_oneof![
        Just(RecoveryPattern::HappyPath),
        Just(RecoveryPattern::MaliciousGuardian),
        Just(RecoveryPattern::OwnerObjects),
        Just(RecoveryPattern::Abandoned),
        Just(RecoveryPattern::SupersededAttempt),
    ]
}

// ── Wire Payloads ────────────────────────────────────────────────────────────

/// One length-prefixed identity field: arbitrary bytes, or a well-formed
/// account or contract address.
fn identity_field_strategy() -> impl Strategy<Value = Vec<u8>> {
    let body = prop_oneof![
        2 => prop::collection::vec(any::<u8>(), 0..=48),
        1 => prop::collection::vec(any::<u8>(), 32..=32).prop_map(|key| {
            let mut out = std::vec![0, 0, 0, 18, 0, 0, 0, 0, 0, 0, 0, 0];
            out.extend_from_slice(&key);
            out
        }),
        1 => prop::collection::vec(any::<u8>(), 32..=32).prop_map(|hash| {
            let mut out = std::vec![0, 0, 0, 18, 0, 0, 0, 1];
            out.extend_from_slice(&hash);
            out
        }),
    ];
    (body, any::<bool>()).prop_map(|(body, honest_len)| {
        let len = if honest_len { body.len() as u16 } else { body.len() as u16 ^ 0x04 };
        let mut out = len.to_be_bytes().to_vec();
        out.extend_from_slice(&body);
        out
    })
}

/// Raw payloads for the envelope decoder: short garbage, or a well-formed
/// header with any flag bits followed by identity fields and stray bytes.
pub fn wire_bytes_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        2 => prop::collection::vec(any::<u8>(), 0..=42),
        3 => (
            0u8..=4u8,
            prop::collection::vec(any::<u8>(), 32..=32),
            any::<u64>(),
            any::<u8>(),
            prop::collection::vec(identity_field_strategy(), 0..=2),
            prop::collection::vec(any::<u8>(), 0..4),
        )
            .prop_map(|(tag, vault_id, recovery_id, flags, identities, tail)| {
                let mut out = std::vec![common::WIRE_VERSION, tag];
                out.extend_from_slice(&vault_id);
                out.extend_from_slice(&recovery_id.to_be_bytes());
                out.push(flags % 16);
                for identity in identities {
                    out.extend_from_slice(&identity);
                }
                if tail.len() % 2 == 0 {
                    out.extend_from_slice(&tail);
                }
                out
            }),
    ]
}
