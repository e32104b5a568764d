use soroban_sdk::{Env, IntoVal, Val};

/// Persistent-storage TTL threshold in ledgers (~1 day at 5 s/ledger).
pub const TTL_THRESHOLD: u32 = 17_280;

/// Persistent-storage TTL extension target in ledgers (~30 days).
pub const TTL_EXTEND_TO: u32 = 518_400;

/// Extend the TTL of a persistent entry that is known to exist.
pub fn extend_persistent<K>(env: &Env, key: &K)
where
    K: IntoVal<Env, Val>,
{
    env.storage()
        .persistent()
        .extend_ttl(key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

/// Extend the TTL of the calling contract's instance storage.
pub fn extend_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}
