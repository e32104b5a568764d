//! Omnichain messaging types and the contract interfaces the vault talks to.
//!
//! The endpoint, receiver and stake-ledger traits only describe the ABI; the
//! concrete contracts live in their own crates. Callers use the generated
//! `try_*` methods so a failing callee surfaces as an error in the caller's own
//! taxonomy instead of trapping the whole transaction.

use soroban_sdk::{contractclient, contracttype, xdr::ToXdr, Address, Bytes, BytesN, Env};

/// Fee quoted by an endpoint for one message, in its native and alternative
/// fee tokens.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MessagingFee {
    pub native_fee: i128,
    pub alt_fee: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MessagingReceipt {
    pub guid: BytesN<32>,
    pub nonce: u64,
    pub fee: MessagingFee,
}

/// Where an inbound message came from.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Origin {
    pub src_eid: u32,
    pub sender: Address,
    pub nonce: u64,
}

/// A message accepted by a source endpoint and awaiting delivery.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutboundPacket {
    pub nonce: u64,
    pub guid: BytesN<32>,
    pub src_eid: u32,
    pub sender: Address,
    pub dst_eid: u32,
    pub receiver: Address,
    pub message: Bytes,
    pub options: Bytes,
}

impl OutboundPacket {
    pub fn origin(&self) -> Origin {
        Origin {
            src_eid: self.src_eid,
            sender: self.sender.clone(),
            nonce: self.nonce,
        }
    }
}

/// Globally unique packet id:
/// `sha256(nonce ‖ src_eid ‖ xdr(sender) ‖ dst_eid ‖ xdr(receiver))`.
pub fn compute_guid(
    env: &Env,
    nonce: u64,
    src_eid: u32,
    sender: &Address,
    dst_eid: u32,
    receiver: &Address,
) -> BytesN<32> {
    let mut buf = Bytes::new(env);
    buf.extend_from_array(&nonce.to_be_bytes());
    buf.extend_from_array(&src_eid.to_be_bytes());
    buf.append(&sender.clone().to_xdr(env));
    buf.extend_from_array(&dst_eid.to_be_bytes());
    buf.append(&receiver.clone().to_xdr(env));
    env.crypto().sha256(&buf).to_bytes()
}

#[contractclient(name = "EndpointClient")]
pub trait MessagingEndpoint {
    fn quote(
        env: Env,
        sender: Address,
        dst_eid: u32,
        message: Bytes,
        options: Bytes,
        pay_in_alt: bool,
    ) -> MessagingFee;

    #[allow(clippy::too_many_arguments)]
    fn send(
        env: Env,
        sender: Address,
        payer: Address,
        dst_eid: u32,
        receiver: Address,
        message: Bytes,
        options: Bytes,
        fee: MessagingFee,
    ) -> MessagingReceipt;
}

#[contractclient(name = "ReceiverClient")]
pub trait MessageReceiver {
    /// Returns `true` when the message changed local state.
    fn lz_receive(env: Env, origin: Origin, guid: BytesN<32>, message: Bytes) -> bool;
}

#[contractclient(name = "StakeLedgerClient")]
pub trait StakeLedger {
    fn get_staked_balance(env: Env, guardian: Address) -> i128;

    /// Returns the amount actually removed from the guardian's stake.
    fn slash(env: Env, authority: Address, guardian: Address, amount: i128) -> i128;
}
