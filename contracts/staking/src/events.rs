#![allow(deprecated)] // events().publish migration tracked separately

use soroban_sdk::{contracttype, symbol_short, Address, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakeChangedEvent {
    pub guardian: Address,
    pub amount: i128,
    pub balance: i128,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlashedEvent {
    pub authority: Address,
    pub guardian: Address,
    pub requested: i128,
    pub slashed: i128,
    pub timestamp: u64,
}

pub fn publish_staked(env: &Env, guardian: Address, amount: i128, balance: i128) {
    env.events().publish(
        (symbol_short!("STAKED"), guardian.clone()),
        StakeChangedEvent {
            guardian,
            amount,
            balance,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_unstaked(env: &Env, guardian: Address, amount: i128, balance: i128) {
    env.events().publish(
        (symbol_short!("UNSTAKED"), guardian.clone()),
        StakeChangedEvent {
            guardian,
            amount,
            balance,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_slashed(
    env: &Env,
    authority: Address,
    guardian: Address,
    requested: i128,
    slashed: i128,
) {
    env.events().publish(
        (symbol_short!("SLASHED"), guardian.clone()),
        SlashedEvent {
            authority,
            guardian,
            requested,
            slashed,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_slasher_changed(env: &Env, slasher: Address, enabled: bool) {
    env.events()
        .publish((symbol_short!("SLASHER"), slasher), enabled);
}
