//! # Loopback Omnichain Endpoint
//!
//! A reference messaging endpoint with the same surface the vault contract
//! expects from a production omnichain endpoint.  Each deployment represents
//! one ledger, identified by its endpoint id (EID).  Outbound messages are
//! charged a size-based fee and stored as [`OutboundPacket`]s; an authorised
//! executor (the relayer) reads them from the source endpoint and calls
//! [`deliver`](EndpointContract::deliver) on the destination endpoint.
//!
//! ## Delivery rules
//! - Packets are delivered exactly once, in nonce order, per path
//!   `(src_eid, sender, receiver)`.
//! - The nonce is consumed before the receiver runs. If the receiver fails its
//!   state is rolled back by the host, the packet is parked and can be
//!   re-driven with [`retry`](EndpointContract::retry).
//!
//! ## Fee
//! ```text
//! fee = base_fee + fee_per_byte * (|message| + |options|)
//! ```
#![no_std]

mod events;


use common::{
    compute_guid,
    ttl::{extend_instance, extend_persistent},
    MessagingFee, MessagingReceipt, OutboundPacket, ReceiverClient,
};
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, log, symbol_short, token, Address, Bytes,
    BytesN, Env, Symbol, Vec,
};

// ── Storage keys ─────────────────────────────────────────────────────────────

const ADMIN: Symbol = symbol_short!("ADMIN");
const INITIALIZED: Symbol = symbol_short!("INIT");
const EID: Symbol = symbol_short!("EID");
const NATIVE_FEE: Symbol = symbol_short!("FEE");
const ALT_FEE: Symbol = symbol_short!("ALT_FEE");
const OUT_COUNT: Symbol = symbol_short!("OUT_CNT");
const OUT_NONCE: Symbol = symbol_short!("OUT_NNC");
const IN_NONCE: Symbol = symbol_short!("IN_NNC");
const PACKET: Symbol = symbol_short!("PACKET");
const PARKED: Symbol = symbol_short!("PARKED");
const EXECUTOR: Symbol = symbol_short!("EXEC");

// ── Types ────────────────────────────────────────────────────────────────────

/// Pricing for one fee token.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeeConfig {
    pub token: Address,
    pub base_fee: i128,
    pub fee_per_byte: i128,
}

impl FeeConfig {
    fn price(&self, payload_len: u32) -> i128 {
        self.fee_per_byte
            .saturating_mul(payload_len as i128)
            .saturating_add(self.base_fee)
    }
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum EndpointError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 10,
    PacketNotFound = 20,
    InvalidDestination = 30,
    InsufficientFee = 31,
    AltFeeUnavailable = 32,
    InvalidFeeConfig = 33,
    AlreadyDelivered = 40,
    NonceGap = 41,
}

fn out_nonce_key(sender: &Address, dst_eid: u32, receiver: &Address) -> (Symbol, Address, u32, Address) {
    (OUT_NONCE, sender.clone(), dst_eid, receiver.clone())
}

fn in_nonce_key(src_eid: u32, sender: &Address, receiver: &Address) -> (Symbol, u32, Address, Address) {
    (IN_NONCE, src_eid, sender.clone(), receiver.clone())
}

fn validate_fee_config(config: &FeeConfig) -> Result<(), EndpointError> {
    if config.base_fee < 0 || config.fee_per_byte < 0 {
        return Err(EndpointError::InvalidFeeConfig);
    }
    Ok(())
}

// ── Contract ─────────────────────────────────────────────────────────────────

#[contract]
pub struct EndpointContract;

#[contractimpl]
impl EndpointContract {
    pub fn initialize(
        env: Env,
        admin: Address,
        eid: u32,
        fee_token: Address,
        base_fee: i128,
        fee_per_byte: i128,
    ) -> Result<(), EndpointError> {
        if env.storage().instance().has(&INITIALIZED) {
            return Err(EndpointError::AlreadyInitialized);
        }
        admin.require_auth();
        if eid == 0 {
            return Err(EndpointError::InvalidDestination);
        }
        let fee = FeeConfig {
            token: fee_token,
            base_fee,
            fee_per_byte,
        };
        validate_fee_config(&fee)?;

        let storage = env.storage().instance();
        storage.set(&ADMIN, &admin);
        storage.set(&EID, &eid);
        storage.set(&NATIVE_FEE, &fee);
        storage.set(&OUT_COUNT, &0u64);
        storage.set(&INITIALIZED, &true);
        extend_instance(&env);

        Ok(())
    }

    pub fn set_alt_fee(
        env: Env,
        admin: Address,
        token: Address,
        base_fee: i128,
        fee_per_byte: i128,
    ) -> Result<(), EndpointError> {
        Self::require_admin(&env, &admin)?;
        let fee = FeeConfig {
            token,
            base_fee,
            fee_per_byte,
        };
        validate_fee_config(&fee)?;
        env.storage().instance().set(&ALT_FEE, &fee);
        extend_instance(&env);
        Ok(())
    }

    pub fn set_executor(
        env: Env,
        admin: Address,
        executor: Address,
        enabled: bool,
    ) -> Result<(), EndpointError> {
        Self::require_admin(&env, &admin)?;
        let key = (EXECUTOR, executor.clone());
        if enabled {
            env.storage().persistent().set(&key, &true);
            extend_persistent(&env, &key);
        } else {
            env.storage().persistent().remove(&key);
        }
        events::publish_executor_changed(&env, executor, enabled);
        Ok(())
    }

    // ── Outbound ─────────────────────────────────────────────────────────────

    pub fn quote(
        env: Env,
        _sender: Address,
        dst_eid: u32,
        message: Bytes,
        options: Bytes,
        pay_in_alt: bool,
    ) -> Result<MessagingFee, EndpointError> {
        Self::require_initialized(&env)?;
        if dst_eid == 0 {
            return Err(EndpointError::InvalidDestination);
        }

        let payload_len = message.len().saturating_add(options.len());
        if pay_in_alt {
            let alt: FeeConfig = env
                .storage()
                .instance()
                .get(&ALT_FEE)
                .ok_or(EndpointError::AltFeeUnavailable)?;
            Ok(MessagingFee {
                native_fee: 0,
                alt_fee: alt.price(payload_len),
            })
        } else {
            Ok(MessagingFee {
                native_fee: Self::native_fee_config(&env)?.price(payload_len),
                alt_fee: 0,
            })
        }
    }

    /// Accept a message for delivery to `receiver` on `dst_eid`.
    ///
    /// A fee with a non-zero `alt_fee` and zero `native_fee` is charged in the
    /// alternative token, otherwise in the native one. Only the quoted amount is
    /// collected from `payer`.
    #[allow(clippy::too_many_arguments)]
    pub fn send(
        env: Env,
        sender: Address,
        payer: Address,
        dst_eid: u32,
        receiver: Address,
        message: Bytes,
        options: Bytes,
        fee: MessagingFee,
    ) -> Result<MessagingReceipt, EndpointError> {
        sender.require_auth();
        payer.require_auth();

        let pay_in_alt = fee.native_fee == 0 && fee.alt_fee > 0;
        let required = Self::quote(
            env.clone(),
            sender.clone(),
            dst_eid,
            message.clone(),
            options.clone(),
            pay_in_alt,
        )?;
        if fee.native_fee < required.native_fee || fee.alt_fee < required.alt_fee {
            return Err(EndpointError::InsufficientFee);
        }

        let this = env.current_contract_address();
        if required.native_fee > 0 {
            let cfg = Self::native_fee_config(&env)?;
            token::Client::new(&env, &cfg.token).transfer(&payer, &this, &required.native_fee);
        }
        if required.alt_fee > 0 {
            let cfg: FeeConfig = env
                .storage()
                .instance()
                .get(&ALT_FEE)
                .ok_or(EndpointError::AltFeeUnavailable)?;
            token::Client::new(&env, &cfg.token).transfer(&payer, &this, &required.alt_fee);
        }

        let src_eid = Self::get_eid(env.clone())?;
        let nonce_key = out_nonce_key(&sender, dst_eid, &receiver);
        let nonce = env.storage().persistent().get::<_, u64>(&nonce_key).unwrap_or(0) + 1;
        env.storage().persistent().set(&nonce_key, &nonce);
        extend_persistent(&env, &nonce_key);

        let guid = compute_guid(&env, nonce, src_eid, &sender, dst_eid, &receiver);
        let packet = OutboundPacket {
            nonce,
            guid: guid.clone(),
            src_eid,
            sender,
            dst_eid,
            receiver,
            message,
            options,
        };

        let seq = Self::outbound_count(env.clone());
        let packet_key = (PACKET, seq);
        env.storage().persistent().set(&packet_key, &packet);
        extend_persistent(&env, &packet_key);
        env.storage().instance().set(&OUT_COUNT, &(seq + 1));
        extend_instance(&env);

        events::publish_packet_sent(&env, seq, &packet);
        Ok(MessagingReceipt {
            guid,
            nonce,
            fee: required,
        })
    }

    pub fn outbound(env: Env, seq: u64) -> Result<OutboundPacket, EndpointError> {
        let key = (PACKET, seq);
        let packet = env
            .storage()
            .persistent()
            .get(&key)
            .ok_or(EndpointError::PacketNotFound)?;
        extend_persistent(&env, &key);
        Ok(packet)
    }

    pub fn outbound_count(env: Env) -> u64 {
        env.storage().instance().get(&OUT_COUNT).unwrap_or(0)
    }

    pub fn outbound_nonce(env: Env, sender: Address, dst_eid: u32, receiver: Address) -> u64 {
        env.storage()
            .persistent()
            .get(&out_nonce_key(&sender, dst_eid, &receiver))
            .unwrap_or(0)
    }

    // ── Inbound ──────────────────────────────────────────────────────────────

    /// Deliver one packet addressed to this endpoint.
    ///
    /// Returns `true` when the receiver accepted the message and `false` when
    /// it failed and the packet was parked for [`retry`](Self::retry).
    pub fn deliver(env: Env, executor: Address, packet: OutboundPacket) -> Result<bool, EndpointError> {
        Self::require_executor(&env, &executor)?;
        Self::deliver_packet(&env, packet)
    }

    /// Deliver several packets; an error on one packet does not affect the
    /// others and is reported as `false` in its slot.
    pub fn deliver_batch(
        env: Env,
        executor: Address,
        packets: Vec<OutboundPacket>,
    ) -> Result<Vec<bool>, EndpointError> {
        Self::require_executor(&env, &executor)?;
        let mut results = Vec::new(&env);
        for packet in packets.iter() {
            results.push_back(Self::deliver_packet(&env, packet).unwrap_or(false));
        }
        Ok(results)
    }

    /// Re-drive a parked packet. Returns `true` once the receiver accepts it.
    pub fn retry(env: Env, executor: Address, guid: BytesN<32>) -> Result<bool, EndpointError> {
        Self::require_executor(&env, &executor)?;
        let key = (PARKED, guid);
        let packet: OutboundPacket = env
            .storage()
            .persistent()
            .get(&key)
            .ok_or(EndpointError::PacketNotFound)?;

        if Self::invoke_receiver(&env, &packet) {
            env.storage().persistent().remove(&key);
            events::publish_packet_delivered(&env, &packet);
            Ok(true)
        } else {
            extend_persistent(&env, &key);
            Ok(false)
        }
    }

    pub fn is_parked(env: Env, guid: BytesN<32>) -> bool {
        env.storage().persistent().has(&(PARKED, guid))
    }

    pub fn inbound_nonce(env: Env, src_eid: u32, sender: Address, receiver: Address) -> u64 {
        env.storage()
            .persistent()
            .get(&in_nonce_key(src_eid, &sender, &receiver))
            .unwrap_or(0)
    }

    // ── Views ────────────────────────────────────────────────────────────────

    pub fn get_eid(env: Env) -> Result<u32, EndpointError> {
        env.storage()
            .instance()
            .get(&EID)
            .ok_or(EndpointError::NotInitialized)
    }

    /// Native fee token and pricing.
    pub fn get_fee_config(env: Env) -> Result<FeeConfig, EndpointError> {
        Self::native_fee_config(&env)
    }

    pub fn is_executor(env: Env, addr: Address) -> bool {
        env.storage()
            .persistent()
            .get(&(EXECUTOR, addr))
            .unwrap_or(false)
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn deliver_packet(env: &Env, packet: OutboundPacket) -> Result<bool, EndpointError> {
        if packet.dst_eid != Self::get_eid(env.clone())? {
            return Err(EndpointError::InvalidDestination);
        }

        let nonce_key = in_nonce_key(packet.src_eid, &packet.sender, &packet.receiver);
        let inbound = env.storage().persistent().get::<_, u64>(&nonce_key).unwrap_or(0);
        if packet.nonce <= inbound {
            return Err(EndpointError::AlreadyDelivered);
        }
        if packet.nonce != inbound + 1 {
            return Err(EndpointError::NonceGap);
        }
        env.storage().persistent().set(&nonce_key, &packet.nonce);
        extend_persistent(env, &nonce_key);

        if Self::invoke_receiver(env, &packet) {
            events::publish_packet_delivered(env, &packet);
            Ok(true)
        } else {
            log!(env, "receiver rejected packet nonce {}", packet.nonce);
            let key = (PARKED, packet.guid.clone());
            env.storage().persistent().set(&key, &packet);
            extend_persistent(env, &key);
            events::publish_packet_parked(env, &packet);
            Ok(false)
        }
    }

    fn invoke_receiver(env: &Env, packet: &OutboundPacket) -> bool {
        let receiver = ReceiverClient::new(env, &packet.receiver);
        matches!(
            receiver.try_lz_receive(&packet.origin(), &packet.guid, &packet.message),
            Ok(Ok(_))
        )
    }

    fn native_fee_config(env: &Env) -> Result<FeeConfig, EndpointError> {
        env.storage()
            .instance()
            .get(&NATIVE_FEE)
            .ok_or(EndpointError::NotInitialized)
    }

    fn require_initialized(env: &Env) -> Result<(), EndpointError> {
        if !env.storage().instance().has(&INITIALIZED) {
            return Err(EndpointError::NotInitialized);
        }
        Ok(())
    }

    fn require_admin(env: &Env, caller: &Address) -> Result<(), EndpointError> {
        caller.require_auth();
        let admin: Address = env
            .storage()
            .instance()
            .get(&ADMIN)
            .ok_or(EndpointError::NotInitialized)?;
        if *caller != admin {
            return Err(EndpointError::Unauthorized);
        }
        Ok(())
    }

    fn require_executor(env: &Env, executor: &Address) -> Result<(), EndpointError> {
        Self::require_initialized(env)?;
        executor.require_auth();
        if !Self::is_executor(env.clone(), executor.clone()) {
            return Err(EndpointError::Unauthorized);
        }
        Ok(())
    }
}
