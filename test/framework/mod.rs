//! # Reclaim Contract Testing Framework
//!
//! A reusable harness for the vault suite: two ledgers deployed in one `Env`,
//! a relayer that moves packets between their endpoints, invariant checking,
//! state exploration and a Given-When-Then scenario DSL.
//!
//! ## Architecture
//!
//! ```text
//! test/framework/
//! ├── mod.rs             — TestEnv, TwoChainHarness, snapshots
//! ├── generators.rs      — proptest strategies for terms and action sequences
//! ├── invariants.rs      — protocol invariants and transition checks
//! ├── state_explorer.rs  — runs action sequences, checking after each step
//! └── scenario_dsl.rs    — declarative scenario builder
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use test_framework::{Side, TwoChainHarness};
//!
//! let harness = TwoChainHarness::new();
//! let owner = harness.funded_address();
//! let guardians = harness.funded_addresses(3);
//! let id = harness.create_mirrored_vault(&owner, &guardians, 2, 0);
//!
//! harness.source.vault.initiate_recovery(&guardians[0], &id, &new_owner, &harness.mirror.eid, &Bytes::new(&harness.env.env));
//! harness.relay(Side::Source);
//! ```

extern crate std;

pub mod generators;
pub mod state_explorer;

use std::cell::Cell;
use std::string::String;
use std::vec::Vec;

use endpoint::{EndpointContract, EndpointContractClient};
use recovery::{RecoveryAttempt, RecoveryVaultContract, RecoveryVaultContractClient, VaultRecord};
use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    token::StellarAssetClient,
    Address, Bytes, BytesN, Env, Vec as SorobanVec,
};
use staking::{SlashDestination, StakingContract, StakingContractClient};

/// Endpoint id of the ledger where vault actions originate.
pub const SOURCE_EID: u32 = 30101;
/// Endpoint id of the ledger that mirrors them.
pub const MIRROR_EID: u32 = 40168;
pub const BASE_FEE: i128 = 10;
pub const FEE_PER_BYTE: i128 = 1;
pub const DEFAULT_TIMELOCK: u64 = 3_600;
pub const DEFAULT_INACTIVITY: u64 = 604_800;
/// Fee-token balance given to every funded address.
pub const FUNDING: i128 = 1_000_000_000;

// ── Core Test Environment ────────────────────────────────────────────────────

/// Wraps the Soroban `Env` with time control and token helpers.
pub struct TestEnv {
    pub env: Env,
}

impl TestEnv {
    /// Create a new test environment with all auth mocked.
    pub fn new() -> Self {
        let env = Env::default();
        env.mock_all_auths();
        env.ledger().set_timestamp(1_000);
        Self { env }
    }

    pub fn generate_address(&self) -> Address {
        Address::generate(&self.env)
    }

    pub fn generate_addresses(&self, n: usize) -> Vec<Address> {
        (0..n).map(|_| self.generate_address()).collect()
    }

    pub fn set_timestamp(&self, ts: u64) {
        self.env.ledger().set_timestamp(ts);
    }

    /// Advance the ledger timestamp by `delta` seconds.
    pub fn advance_time(&self, delta: u64) {
        let current = self.env.ledger().timestamp();
        self.env.ledger().set_timestamp(current.saturating_add(delta));
    }

    pub fn timestamp(&self) -> u64 {
        self.env.ledger().timestamp()
    }

    /// Deploy a Stellar Asset Contract and return its address.
    pub fn deploy_token(&self) -> Address {
        self.env
            .register_stellar_asset_contract_v2(Address::generate(&self.env))
            .address()
    }

    pub fn mint_tokens(&self, token: &Address, recipient: &Address, amount: i128) {
        StellarAssetClient::new(&self.env, token).mint(recipient, &amount);
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

// ── Two-Ledger Harness ───────────────────────────────────────────────────────

/// Which deployment of the harness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Source,
    Mirror,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Source => Side::Mirror,
            Side::Mirror => Side::Source,
        }
    }
}

/// Endpoint, stake ledger and vault contract of one ledger.
pub struct Deployment {
    pub eid: u32,
    pub endpoint: EndpointContractClient<'static>,
    pub staking: StakingContractClient<'static>,
    pub vault: RecoveryVaultContractClient<'static>,
    relayed: Cell<u64>,
}

impl Deployment {
    fn deploy(env: &Env, admin: &Address, token: &Address, executor: &Address, eid: u32) -> Self {
        let endpoint = EndpointContractClient::new(env, &env.register(EndpointContract, ()));
        endpoint.initialize(admin, &eid, token, &BASE_FEE, &FEE_PER_BYTE);
        endpoint.set_executor(admin, executor, &true);

        let staking = StakingContractClient::new(env, &env.register(StakingContract, ()));
        staking.initialize(admin, token, &SlashDestination::Burn);

        let vault = RecoveryVaultContractClient::new(env, &env.register(RecoveryVaultContract, ()));
        vault.initialize(admin, &endpoint.address, &staking.address, &eid, &Bytes::new(env));
        staking.set_slasher(admin, &vault.address, &true);

        Self {
            eid,
            endpoint,
            staking,
            vault,
            relayed: Cell::new(0),
        }
    }

    /// Packets sent by this ledger that the relayer has not picked up yet.
    pub fn undelivered(&self) -> u64 {
        self.endpoint.outbound_count() - self.relayed.get()
    }
}

/// Two fully wired ledgers sharing one fee/stake token, linked as each
/// other's trusted peer and default inactivity peer.
pub struct TwoChainHarness {
    pub env: TestEnv,
    pub admin: Address,
    pub token: Address,
    pub executor: Address,
    pub source: Deployment,
    pub mirror: Deployment,
}

impl TwoChainHarness {
    pub fn new() -> Self {
        let env = TestEnv::new();
        let admin = env.generate_address();
        let executor = env.generate_address();
        let token = env.deploy_token();

        let source = Deployment::deploy(&env.env, &admin, &token, &executor, SOURCE_EID);
        let mirror = Deployment::deploy(&env.env, &admin, &token, &executor, MIRROR_EID);
        source.vault.set_peer(&admin, &MIRROR_EID, &mirror.vault.address);
        mirror.vault.set_peer(&admin, &SOURCE_EID, &source.vault.address);
        source.vault.set_default_peer(&admin, &MIRROR_EID);
        mirror.vault.set_default_peer(&admin, &SOURCE_EID);

        Self {
            env,
            admin,
            token,
            executor,
            source,
            mirror,
        }
    }

    pub fn deployment(&self, side: Side) -> &Deployment {
        match side {
            Side::Source => &self.source,
            Side::Mirror => &self.mirror,
        }
    }

    /// A fresh address holding [`FUNDING`] tokens.
    pub fn funded_address(&self) -> Address {
        let addr = self.env.generate_address();
        self.env.mint_tokens(&self.token, &addr, FUNDING);
        addr
    }

    pub fn funded_addresses(&self, n: usize) -> Vec<Address> {
        (0..n).map(|_| self.funded_address()).collect()
    }

    /// Register the same vault on both ledgers with default timelock and
    /// inactivity period. Panics if the ids differ.
    pub fn create_mirrored_vault(
        &self,
        owner: &Address,
        guardians: &[Address],
        threshold: u32,
        stake_amount: i128,
    ) -> BytesN<32> {
        let backup = self.env.generate_address();
        self.create_mirrored_vault_with(
            owner,
            guardians,
            threshold,
            DEFAULT_TIMELOCK,
            DEFAULT_INACTIVITY,
            &backup,
            stake_amount,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_mirrored_vault_with(
        &self,
        owner: &Address,
        guardians: &[Address],
        threshold: u32,
        timelock: u64,
        inactivity_period: u64,
        backup: &Address,
        stake_amount: i128,
    ) -> BytesN<32> {
        let env = &self.env.env;
        let guardians = SorobanVec::from_slice(env, guardians);
        let assets = SorobanVec::new(env);
        let ids: Vec<BytesN<32>> = [&self.source, &self.mirror]
            .iter()
            .map(|deployment| {
                deployment.vault.initialize_vault(
                    owner,
                    &guardians,
                    &threshold,
                    &timelock,
                    &inactivity_period,
                    backup,
                    &stake_amount,
                    &assets,
                )
            })
            .collect();
        assert_eq!(ids[0], ids[1], "vault ids diverged between ledgers");
        ids[0].clone()
    }

    /// Stake `amount` for `guardian` on both ledgers, minting it first.
    pub fn stake_everywhere(&self, guardian: &Address, amount: i128) {
        for deployment in [&self.source, &self.mirror] {
            self.env.mint_tokens(&self.token, guardian, amount);
            deployment.staking.stake(guardian, &amount);
        }
    }

    /// Deliver every packet `from` has sent since the last relay to the other
    /// ledger, in order. Returns the per-packet delivery results.
    pub fn relay(&self, from: Side) -> Vec<bool> {
        let src = self.deployment(from);
        let dst = self.deployment(from.other());
        let count = src.endpoint.outbound_count();
        let mut results = Vec::new();
        for seq in src.relayed.get()..count {
            let packet = src.endpoint.outbound(&seq);
            results.push(dst.endpoint.deliver(&self.executor, &packet));
        }
        src.relayed.set(count);
        results
    }

    /// Relay in both directions until no packets are outstanding.
    pub fn relay_all(&self) -> usize {
        let mut delivered = 0;
        while self.source.undelivered() > 0 || self.mirror.undelivered() > 0 {
            delivered += self.relay(Side::Source).len();
            delivered += self.relay(Side::Mirror).len();
        }
        delivered
    }

    pub fn ledger_snapshot(&self, side: Side, vault_id: &BytesN<32>, stakers: &[Address]) -> LedgerSnapshot {
        let deployment = self.deployment(side);
        let vault = deployment.vault.get_vault(vault_id);
        let current_attempt = match vault.recovery_id {
            0 => None,
            id => deployment.vault.get_recovery(vault_id, &id),
        };
        let stakes = stakers
            .iter()
            .map(|s| (s.clone(), deployment.staking.get_staked_balance(s)))
            .collect();
        LedgerSnapshot {
            eid: deployment.eid,
            timestamp: self.env.timestamp(),
            vault,
            current_attempt,
            total_staked: deployment.staking.get_total_staked(),
            stakes,
            undelivered: deployment.undelivered(),
        }
    }

    pub fn snapshot(&self, vault_id: &BytesN<32>, stakers: &[Address]) -> ProtocolSnapshot {
        ProtocolSnapshot {
            source: self.ledger_snapshot(Side::Source, vault_id, stakers),
            mirror: self.ledger_snapshot(Side::Mirror, vault_id, stakers),
        }
    }
}

impl Default for TwoChainHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ── Snapshots ────────────────────────────────────────────────────────────────

/// Observable state of one vault and its stake ledger on one ledger.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    pub eid: u32,
    pub timestamp: u64,
    pub vault: VaultRecord,
    pub current_attempt: Option<RecoveryAttempt>,
    pub total_staked: i128,
    pub stakes: Vec<(Address, i128)>,
    /// Outbound packets not yet relayed.
    pub undelivered: u64,
}

impl LedgerSnapshot {
    pub fn sum_stakes(&self) -> i128 {
        self.stakes.iter().map(|(_, s)| s).sum()
    }
}

/// Both ledgers' view of the same vault at one instant.
#[derive(Debug, Clone)]
pub struct ProtocolSnapshot {
    pub source: LedgerSnapshot,
    pub mirror: LedgerSnapshot,
}

impl ProtocolSnapshot {
    pub fn ledgers(&self) -> [&LedgerSnapshot; 2] {
        [&self.source, &self.mirror]
    }

    /// No packet is in flight in either direction.
    pub fn quiescent(&self) -> bool {
        self.source.undelivered == 0 && self.mirror.undelivered == 0
    }
}

// ── Test Outcome Tracking ────────────────────────────────────────────────────

/// Result of a single test action, used by the state explorer.
#[derive(Debug, Clone)]
pub enum ActionOutcome {
    Ok,
    /// The contract rejected the action with this error code.
    ExpectedError(u32),
    /// The host failed the call without a contract error.
    UnexpectedError(String),
}

impl ActionOutcome {
    pub fn is_unexpected(&self) -> bool {
        matches!(self, ActionOutcome::UnexpectedError(_))
    }
}

/// Summary of a test run with coverage metrics.
#[derive(Debug, Clone)]
pub struct TestRunSummary {
    pub actions_executed: usize,
    pub invariant_checks: usize,
    pub invariant_violations: Vec<String>,
    pub entry_points_hit: std::collections::HashSet<String>,
    pub transitions_observed: usize,
}

impl TestRunSummary {
    pub fn new() -> Self {
        Self {
            actions_executed: 0,
            invariant_checks: 0,
            invariant_violations: Vec::new(),
            entry_points_hit: std::collections::HashSet::new(),
            transitions_observed: 0,
        }
    }

    pub fn passed(&self) -> bool {
        self.invariant_violations.is_empty()
    }

    /// Entry points hit / total known entry points.
    pub fn entry_point_coverage(&self, total_entry_points: usize) -> f64 {
        if total_entry_points == 0 {
            return 0.0;
        }
        self.entry_points_hit.len() as f64 / total_entry_points as f64
    }
}

impl Default for TestRunSummary {
    fn default() -> Self {
        Self::new()
    }
}
