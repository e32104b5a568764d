use soroban_sdk::{Address, Env, String};

/// Strkey of the all-zero ed25519 account.
///
/// Nothing can sign for it, so it doubles as the "no identity" sentinel that
/// read-only views return for records that do not exist.
pub const ZERO_ACCOUNT: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

pub fn zero_address(env: &Env) -> Address {
    Address::from_string(&String::from_str(env, ZERO_ACCOUNT))
}

pub fn is_zero_address(env: &Env, address: &Address) -> bool {
    *address == zero_address(env)
}
