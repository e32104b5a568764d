//! # State Space Explorer
//!
//! Drives one mirrored vault through a sequence of [`ProtocolAction`]s on the
//! source ledger, checking snapshot and transition invariants after every
//! step. Rejected actions are expected; only host failures and invariant
//! violations fail a run.
//!
//! ## Complexity
//!
//! - Time: O(S × (I + G)) for S steps, I invariants and G guardians.
//! - Space: O(S × G) when snapshots are recorded.

extern crate std;

use soroban_sdk::{Address, Bytes, BytesN};
use std::string::String;
use std::vec::Vec;

use super::generators::ProtocolAction;
use super::invariants::{InvariantSet, TransitionInvariantSet};
use super::{ActionOutcome, ProtocolSnapshot, Side, TestRunSummary, TwoChainHarness};

/// Maps a `try_*` client result onto an [`ActionOutcome`].
macro_rules! outcome {
    ($call:expr) => {
        match $call {
            Ok(_) => ActionOutcome::Ok,
            Err(Ok(e)) => ActionOutcome::ExpectedError(e as u32),
            Err(Err(e)) => ActionOutcome::UnexpectedError(std::format!("{:?}", e)),
        }
    };
}

// ── Explorer Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub max_steps: usize,
    /// Halt on the first invariant violation.
    pub fail_fast: bool,
    pub record_snapshots: bool,
    /// Deliver everything still in flight after the last action and check
    /// once more, so convergence is always exercised.
    pub settle: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_steps: 100,
            fail_fast: true,
            record_snapshots: false,
            settle: true,
        }
    }
}

// ── Exploration Result ───────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ExplorationResult {
    pub summary: TestRunSummary,
    pub snapshots: Vec<ProtocolSnapshot>,
    pub action_log: Vec<(ProtocolAction, ActionOutcome)>,
}

impl ExplorationResult {
    pub fn passed(&self) -> bool {
        self.summary.passed()
    }

    /// Host-level failures, which the protocol should never produce.
    pub fn unexpected(&self) -> Vec<&(ProtocolAction, ActionOutcome)> {
        self.action_log
            .iter()
            .filter(|(_, outcome)| outcome.is_unexpected())
            .collect()
    }
}

// ── State Space Explorer ─────────────────────────────────────────────────────

pub struct StateExplorer<'a> {
    harness: &'a TwoChainHarness,
    vault_id: BytesN<32>,
    invariants: InvariantSet,
    transitions: TransitionInvariantSet,
    config: ExplorerConfig,
    /// Original owner, the guardians, then a funded outsider (the heir).
    participants: Vec<Address>,
    guardians: Vec<Address>,
}

impl<'a> StateExplorer<'a> {
    pub fn new(
        harness: &'a TwoChainHarness,
        vault_id: BytesN<32>,
        owner: Address,
        guardians: Vec<Address>,
        invariants: InvariantSet,
        config: ExplorerConfig,
    ) -> Self {
        let mut participants = std::vec![owner];
        participants.extend(guardians.iter().cloned());
        participants.push(harness.funded_address());
        Self {
            harness,
            vault_id,
            invariants,
            transitions: TransitionInvariantSet::protocol_defaults(),
            config,
            participants,
            guardians,
        }
    }

    /// Built-in invariants and default configuration.
    pub fn with_defaults(
        harness: &'a TwoChainHarness,
        vault_id: BytesN<32>,
        owner: Address,
        guardians: Vec<Address>,
    ) -> Self {
        Self::new(
            harness,
            vault_id,
            owner,
            guardians,
            InvariantSet::protocol_defaults(),
            ExplorerConfig::default(),
        )
    }

    fn snapshot(&self) -> ProtocolSnapshot {
        self.harness.snapshot(&self.vault_id, &self.guardians)
    }

    pub fn explore(&mut self, actions: &[ProtocolAction]) -> ExplorationResult {
        let mut summary = TestRunSummary::new();
        let mut snapshots = Vec::new();
        let mut action_log = Vec::new();

        let mut previous = self.snapshot();
        if self.config.record_snapshots {
            snapshots.push(previous.clone());
        }

        let steps = actions.len().min(self.config.max_steps);
        let tail = self.config.settle.then_some(ProtocolAction::Relay);
        let sequence = actions.iter().take(steps).chain(tail.iter());

        for action in sequence {
            let outcome = self.execute_action(action);
            summary.entry_points_hit.insert(action_entry_point(action));
            summary.actions_executed += 1;
            action_log.push((action.clone(), outcome));

            let snapshot = self.snapshot();
            summary.invariant_checks += 1;
            let mut violations = self.invariants.check_all(&snapshot);
            violations.extend(self.transitions.check_all(&previous, &snapshot));
            if snapshot.source.vault != previous.source.vault {
                summary.transitions_observed += 1;
            }

            let failed = !violations.is_empty();
            for (name, msg) in violations {
                summary.invariant_violations.push(std::format!(
                    "after action #{} ({:?}): [{}] {}",
                    summary.actions_executed,
                    action,
                    name,
                    msg
                ));
            }
            if self.config.record_snapshots {
                snapshots.push(snapshot.clone());
            }
            if failed && self.config.fail_fast {
                break;
            }
            previous = snapshot;
        }

        ExplorationResult {
            summary,
            snapshots,
            action_log,
        }
    }

    /// The participant that is neither the original owner nor a guardian.
    pub fn heir(&self) -> &Address {
        &self.participants[self.participants.len() - 1]
    }

    fn guardian(&self, index: usize) -> &Address {
        &self.guardians[index % self.guardians.len()]
    }

    fn participant(&self, index: usize) -> &Address {
        &self.participants[index % self.participants.len()]
    }

    fn execute_action(&self, action: &ProtocolAction) -> ActionOutcome {
        let h = self.harness;
        let source = h.deployment(Side::Source);
        let vault = source.vault.get_vault(&self.vault_id);
        let id = &self.vault_id;

        match action {
            ProtocolAction::Stake { guardian, amount } => {
                let guardian = self.guardian(*guardian);
                h.env.mint_tokens(&h.token, guardian, *amount);
                outcome!(source.staking.try_stake(guardian, amount))
            }
            ProtocolAction::Unstake { guardian, amount } => {
                outcome!(source.staking.try_unstake(self.guardian(*guardian), amount))
            }
            ProtocolAction::Initiate { actor, new_owner } => {
                let options = Bytes::new(&h.env.env);
                outcome!(source.vault.try_initiate_recovery(
                    self.participant(*actor),
                    id,
                    self.participant(*new_owner),
                    &h.mirror.eid,
                    &options,
                ))
            }
            ProtocolAction::Approve { guardian } => outcome!(source
                .vault
                .try_approve_recovery(self.guardian(*guardian), id, &vault.recovery_id)),
            ProtocolAction::Finalize => outcome!(source.vault.try_finalize_recovery(
                self.guardian(0),
                id,
                &vault.recovery_id
            )),
            ProtocolAction::Flag { guardian } => outcome!(source.vault.try_mark_malicious(
                &vault.owner,
                id,
                &vault.recovery_id,
                self.guardian(*guardian),
            )),
            ProtocolAction::Cancel => {
                outcome!(source.vault.try_cancel_recovery(&vault.owner, id, &vault.recovery_id))
            }
            ProtocolAction::Heartbeat => {
                outcome!(source.vault.try_update_last_active(&vault.owner, id))
            }
            ProtocolAction::CheckInactivity => {
                outcome!(source.vault.try_check_inactivity(self.guardian(0), id))
            }
            ProtocolAction::AdvanceTime { delta } => {
                h.env.advance_time(*delta);
                ActionOutcome::Ok
            }
            ProtocolAction::Relay => {
                h.relay_all();
                ActionOutcome::Ok
            }
        }
    }
}

fn action_entry_point(action: &ProtocolAction) -> String {
    match action {
        ProtocolAction::Stake { .. } => "stake".into(),
        ProtocolAction::Unstake { .. } => "unstake".into(),
        ProtocolAction::Initiate { .. } => "initiate_recovery".into(),
        ProtocolAction::Approve { .. } => "approve_recovery".into(),
        ProtocolAction::Finalize => "finalize_recovery".into(),
        ProtocolAction::Flag { .. } => "mark_malicious".into(),
        ProtocolAction::Cancel => "cancel_recovery".into(),
        ProtocolAction::Heartbeat => "update_last_active".into(),
        ProtocolAction::CheckInactivity => "check_inactivity".into(),
        ProtocolAction::AdvanceTime { .. } => "advance_time".into(),
        ProtocolAction::Relay => "lz_receive".into(),
    }
}

/// State-changing entry points reachable from [`ProtocolAction`].
pub const PROTOCOL_ENTRY_POINTS: &[&str] = &[
    "stake",
    "unstake",
    "initiate_recovery",
    "approve_recovery",
    "finalize_recovery",
    "mark_malicious",
    "cancel_recovery",
    "update_last_active",
    "check_inactivity",
    "lz_receive",
];
