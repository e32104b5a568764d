use soroban_sdk::{contracttype, Address, Bytes, BytesN, Env, Vec};

/// Upper bound on the guardian set of one vault.
pub const MAX_GUARDIANS: u32 = 10;

/// Contract configuration, written once by `initialize`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub admin: Address,
    /// Messaging endpoint of this ledger; the only caller of `lz_receive`.
    pub endpoint: Address,
    pub stake_ledger: Address,
    /// Endpoint id of this ledger.
    pub eid: u32,
    /// Peer that inactivity hand-overs are mirrored to (0 = none).
    pub default_peer_eid: u32,
    pub default_options: Bytes,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum RecoveryState {
    None = 0,
    Pending = 1,
    Completed = 2,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum AssetKind {
    Token = 0,
    Nft = 1,
}

/// A protected asset. Recorded with the vault, not held in custody.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Asset {
    pub kind: AssetKind,
    pub token: Address,
    /// Token amount, or the token id for an NFT.
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VaultRecord {
    pub id: BytesN<32>,
    pub owner: Address,
    pub guardians: Vec<Address>,
    pub threshold: u32,
    /// Seconds between quorum and finalisation.
    pub timelock: u64,
    /// Seconds of owner silence before the backup wallet may take over.
    pub inactivity_period: u64,
    pub backup_wallet: Address,
    /// Minimum stake per approving guardian and the slashing penalty.
    pub stake_amount: i128,
    pub assets: Vec<Asset>,
    pub recovery_state: RecoveryState,
    pub recovery_id: u64,
    pub last_active: u64,
    pub backup_claimed: bool,
    pub created_at: u64,
}

impl VaultRecord {
    pub fn is_guardian(&self, addr: &Address) -> bool {
        self.guardians.contains(addr)
    }

    pub fn is_owner_or_guardian(&self, addr: &Address) -> bool {
        self.owner == *addr || self.is_guardian(addr)
    }
}

/// How an attempt came to exist on this ledger.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttemptOrigin {
    Guardians,
    Inactivity,
    /// Mirrored from the peer at this endpoint id.
    Remote(u32),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecoveryAttempt {
    pub new_owner: Address,
    pub approvals: Vec<Address>,
    pub malicious: Vec<Address>,
    pub started_at: u64,
    pub quorum_at: Option<u64>,
    pub completed: bool,
    pub cancelled: bool,
    pub origin: AttemptOrigin,
    /// Ledger this attempt is mirrored to (0 = local only).
    pub peer_eid: u32,
    /// Id the originating ledger assigned, for an attempt mirrored from a
    /// peer. 0 for attempts opened here.
    pub remote_id: u64,
}

impl RecoveryAttempt {
    pub fn new(env: &Env, new_owner: Address, origin: AttemptOrigin, peer_eid: u32) -> Self {
        Self {
            new_owner,
            approvals: Vec::new(env),
            malicious: Vec::new(env),
            started_at: env.ledger().timestamp(),
            quorum_at: None,
            completed: false,
            cancelled: false,
            origin,
            peer_eid,
            remote_id: 0,
        }
    }

    /// Recovery id and `mirrored` bit this attempt travels under on the wire,
    /// given its id on this ledger.
    pub fn wire_id(&self, local_id: u64) -> (u64, bool) {
        match self.origin {
            AttemptOrigin::Remote(_) => (self.remote_id, true),
            _ => (local_id, false),
        }
    }

    pub fn is_open(&self) -> bool {
        !self.completed && !self.cancelled
    }

    /// Approvals that have not been flagged malicious.
    pub fn effective_approvals(&self) -> u32 {
        self.approvals
            .iter()
            .filter(|guardian| !self.malicious.contains(guardian))
            .count() as u32
    }

    /// Re-evaluate quorum after approvals or flags changed.
    ///
    /// `quorum_at` keeps the time quorum was first reached and is cleared when
    /// flags push the effective count back under `threshold`.
    pub fn refresh_quorum(&mut self, threshold: u32, now: u64) {
        if self.effective_approvals() >= threshold {
            if self.quorum_at.is_none() {
                self.quorum_at = Some(now);
            }
        } else {
            self.quorum_at = None;
        }
    }

    /// Earliest time the attempt may be finalised, if quorum holds.
    pub fn unlocks_at(&self, timelock: u64) -> Option<u64> {
        self.quorum_at.map(|at| at.saturating_add(timelock))
    }
}
