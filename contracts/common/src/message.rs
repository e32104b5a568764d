//! # Cross-Chain Recovery Message
//!
//! The payload carried between the vault contracts of two ledgers.  It is
//! encoded with a fixed, language-neutral layout so that a non-Soroban peer can
//! produce and parse it without an XDR library for the envelope:
//!
//! ```text
//!  offset  size  field
//!  ──────  ────  ─────────────────────────────────────────────
//!  0       1     wire version (currently 1)
//!  1       1     action tag   (0 Initiate, 1 ApprovalComplete,
//!                              2 MarkMalicious, 3 Cancel)
//!  2       32    vault id
//!  34      8     recovery id  (big-endian u64)
//!  42      1     flags (bit 0 new_owner, bit 1 guardian, bit 2 mirrored)
//!  43      ..    for each present identity: u16 BE length ‖ XDR(Address)
//! ```
//!
//! A recovery id is always the one assigned by the ledger that opened the
//! attempt. The `mirrored` bit marks messages sent by a ledger that only
//! mirrors the attempt, so the receiver reads the id in its own numbering.
//!
//! Decoding validates the envelope structurally and returns a
//! [`MessageError`]. Identity bytes must match one of the two
//! `ScVal::Address` layouts before they reach the host's XDR decoder:
//!
//! ```text
//!  account   00000012 00000000 00000000 ‖ ed25519 key (32)   44 bytes
//!  contract  00000012 00000001 ‖ contract hash (32)           40 bytes
//! ```

use soroban_sdk::{
    contracttype,
    xdr::{FromXdr, ToXdr},
    Address, Bytes, BytesN, Env,
};

pub const WIRE_VERSION: u8 = 1;

const FLAG_NEW_OWNER: u8 = 0b01;
const FLAG_GUARDIAN: u8 = 0b10;
const FLAG_MIRRORED: u8 = 0b100;
const KNOWN_FLAGS: u8 = FLAG_NEW_OWNER | FLAG_GUARDIAN | FLAG_MIRRORED;

const ACCOUNT_IDENTITY_HEADER: [u8; 12] = [0, 0, 0, 18, 0, 0, 0, 0, 0, 0, 0, 0];
const CONTRACT_IDENTITY_HEADER: [u8; 8] = [0, 0, 0, 18, 0, 0, 0, 1];

/// Transition carried by a [`RecoveryMessage`].
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum RecoveryAction {
    Initiate = 0,
    ApprovalComplete = 1,
    MarkMalicious = 2,
    Cancel = 3,
}

impl RecoveryAction {
    pub fn tag(&self) -> u8 {
        *self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(RecoveryAction::Initiate),
            1 => Some(RecoveryAction::ApprovalComplete),
            2 => Some(RecoveryAction::MarkMalicious),
            3 => Some(RecoveryAction::Cancel),
            _ => None,
        }
    }
}

/// Structural decoding failures.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageError {
    UnsupportedVersion,
    UnknownAction,
    Truncated,
    TrailingBytes,
    /// Flag bits this version does not define.
    UnknownFlags,
    /// A field the action requires is absent.
    MissingField,
    /// The identity bytes are not an account or contract address.
    InvalidIdentity,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecoveryMessage {
    pub vault_id: BytesN<32>,
    pub recovery_id: u64,
    pub action: RecoveryAction,
    pub new_owner: Option<Address>,
    pub guardian: Option<Address>,
    /// Sent by a mirror of the attempt; `recovery_id` is the receiver's id.
    pub mirrored: bool,
}

impl RecoveryMessage {
    pub fn initiate(vault_id: BytesN<32>, recovery_id: u64, new_owner: Address) -> Self {
        Self {
            vault_id,
            recovery_id,
            action: RecoveryAction::Initiate,
            new_owner: Some(new_owner),
            guardian: None,
            mirrored: false,
        }
    }

    pub fn approval_complete(vault_id: BytesN<32>, recovery_id: u64, new_owner: Address) -> Self {
        Self {
            vault_id,
            recovery_id,
            action: RecoveryAction::ApprovalComplete,
            new_owner: Some(new_owner),
            guardian: None,
            mirrored: false,
        }
    }

    pub fn mark_malicious(vault_id: BytesN<32>, recovery_id: u64, guardian: Address) -> Self {
        Self {
            vault_id,
            recovery_id,
            action: RecoveryAction::MarkMalicious,
            new_owner: None,
            guardian: Some(guardian),
            mirrored: false,
        }
    }

    pub fn cancel(vault_id: BytesN<32>, recovery_id: u64) -> Self {
        Self {
            vault_id,
            recovery_id,
            action: RecoveryAction::Cancel,
            new_owner: None,
            guardian: None,
            mirrored: false,
        }
    }

    /// Marks the message as sent by a ledger mirroring the attempt.
    pub fn from_mirror(mut self, mirrored: bool) -> Self {
        self.mirrored = mirrored;
        self
    }

    pub fn encode(&self, env: &Env) -> Bytes {
        let mut out = Bytes::new(env);
        out.push_back(WIRE_VERSION);
        out.push_back(self.action.tag());
        out.extend_from_array(&self.vault_id.to_array());
        out.extend_from_array(&self.recovery_id.to_be_bytes());

        let mut flags = 0u8;
        if self.new_owner.is_some() {
            flags |= FLAG_NEW_OWNER;
        }
        if self.guardian.is_some() {
            flags |= FLAG_GUARDIAN;
        }
        if self.mirrored {
            flags |= FLAG_MIRRORED;
        }
        out.push_back(flags);

        if let Some(owner) = &self.new_owner {
            write_identity(env, &mut out, owner);
        }
        if let Some(guardian) = &self.guardian {
            write_identity(env, &mut out, guardian);
        }
        out
    }

    pub fn decode(env: &Env, bytes: &Bytes) -> Result<Self, MessageError> {
        let mut reader = Reader::new(bytes);

        if reader.u8()? != WIRE_VERSION {
            return Err(MessageError::UnsupportedVersion);
        }
        let action = RecoveryAction::from_tag(reader.u8()?).ok_or(MessageError::UnknownAction)?;
        let vault_id = BytesN::from_array(env, &reader.array::<32>()?);
        let recovery_id = u64::from_be_bytes(reader.array::<8>()?);
        let flags = reader.u8()?;
        if flags & !KNOWN_FLAGS != 0 {
            return Err(MessageError::UnknownFlags);
        }

        let new_owner = if flags & FLAG_NEW_OWNER != 0 {
            Some(reader.identity(env)?)
        } else {
            None
        };
        let guardian = if flags & FLAG_GUARDIAN != 0 {
            Some(reader.identity(env)?)
        } else {
            None
        };

        if !reader.is_exhausted() {
            return Err(MessageError::TrailingBytes);
        }

        let message = Self {
            vault_id,
            recovery_id,
            action,
            new_owner,
            guardian,
            mirrored: flags & FLAG_MIRRORED != 0,
        };
        message.validate()?;
        Ok(message)
    }

    /// Checks that every field the action depends on is present.
    pub fn validate(&self) -> Result<(), MessageError> {
        let complete = match self.action {
            RecoveryAction::Initiate | RecoveryAction::ApprovalComplete => self.new_owner.is_some(),
            RecoveryAction::MarkMalicious => self.guardian.is_some(),
            RecoveryAction::Cancel => true,
        };
        if complete {
            Ok(())
        } else {
            Err(MessageError::MissingField)
        }
    }

    /// Replay key:
    /// `sha256(action ‖ mirrored ‖ vault_id ‖ recovery_id ‖ XDR(guardian)?)`.
    ///
    /// The guardian is part of the key so that several guardians flagged within
    /// one attempt are each applied exactly once.
    pub fn idempotency_key(&self, env: &Env) -> BytesN<32> {
        let mut buf = Bytes::new(env);
        buf.push_back(self.action.tag());
        buf.push_back(self.mirrored as u8);
        buf.extend_from_array(&self.vault_id.to_array());
        buf.extend_from_array(&self.recovery_id.to_be_bytes());
        if let Some(guardian) = &self.guardian {
            buf.append(&guardian.clone().to_xdr(env));
        }
        env.crypto().sha256(&buf).to_bytes()
    }
}

fn write_identity(env: &Env, out: &mut Bytes, address: &Address) {
    let encoded = address.clone().to_xdr(env);
    out.extend_from_array(&(encoded.len() as u16).to_be_bytes());
    out.append(&encoded);
}

struct Reader<'a> {
    bytes: &'a Bytes,
    pos: u32,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a Bytes) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: u32) -> Result<Bytes, MessageError> {
        let end = self.pos.checked_add(len).ok_or(MessageError::Truncated)?;
        if end > self.bytes.len() {
            return Err(MessageError::Truncated);
        }
        let out = self.bytes.slice(self.pos..end);
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, MessageError> {
        self.take(1)?.get(0).ok_or(MessageError::Truncated)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], MessageError> {
        let chunk = self.take(N as u32)?;
        let mut out = [0u8; N];
        chunk.copy_into_slice(&mut out);
        Ok(out)
    }

    fn identity(&mut self, env: &Env) -> Result<Address, MessageError> {
        let len = u16::from_be_bytes(self.array::<2>()?);
        let raw = self.take(len as u32)?;
        let well_formed = match len {
            44 => has_prefix(&raw, &ACCOUNT_IDENTITY_HEADER),
            40 => has_prefix(&raw, &CONTRACT_IDENTITY_HEADER),
            _ => false,
        };
        if !well_formed {
            return Err(MessageError::InvalidIdentity);
        }
        Address::from_xdr(env, &raw).map_err(|_| MessageError::InvalidIdentity)
    }

    fn is_exhausted(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

fn has_prefix(raw: &Bytes, prefix: &[u8]) -> bool {
    prefix
        .iter()
        .enumerate()
        .all(|(i, byte)| raw.get(i as u32) == Some(*byte))
}
