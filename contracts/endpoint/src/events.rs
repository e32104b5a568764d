#![allow(deprecated)] // events().publish migration tracked separately

use common::OutboundPacket;
use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PacketEvent {
    pub guid: BytesN<32>,
    pub src_eid: u32,
    pub dst_eid: u32,
    pub nonce: u64,
    pub receiver: Address,
}

impl PacketEvent {
    fn from_packet(packet: &OutboundPacket) -> Self {
        Self {
            guid: packet.guid.clone(),
            src_eid: packet.src_eid,
            dst_eid: packet.dst_eid,
            nonce: packet.nonce,
            receiver: packet.receiver.clone(),
        }
    }
}

pub fn publish_packet_sent(env: &Env, seq: u64, packet: &OutboundPacket) {
    env.events().publish(
        (symbol_short!("PKT_SENT"), seq),
        PacketEvent::from_packet(packet),
    );
}

pub fn publish_packet_delivered(env: &Env, packet: &OutboundPacket) {
    env.events().publish(
        (symbol_short!("PKT_DLVR"), packet.src_eid),
        PacketEvent::from_packet(packet),
    );
}

/// The receiver failed; the packet waits for a retry.
pub fn publish_packet_parked(env: &Env, packet: &OutboundPacket) {
    env.events().publish(
        (symbol_short!("PKT_PARK"), packet.src_eid),
        PacketEvent::from_packet(packet),
    );
}

pub fn publish_executor_changed(env: &Env, executor: Address, enabled: bool) {
    env.events()
        .publish((symbol_short!("EXECUTOR"), executor), enabled);
}
