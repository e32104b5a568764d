//! # Guardian Stake Ledger
//!
//! Holds the collateral guardians post for the vaults they protect.  Stake is
//! deposited in a single SEP-41 token and can be withdrawn at any time up to the
//! guardian's balance.  Authorised slashers (normally the recovery vault
//! contract of the same ledger) may confiscate stake from a guardian that was
//! flagged malicious; confiscated tokens are burned or sent to a treasury
//! according to the configured [`SlashDestination`].
//!
//! ## Accounting
//! ```text
//! total_staked == Σ staked_balance(guardian)
//! token.balance(ledger) >= total_staked
//! ```
#![no_std]

mod events;


use common::ttl::{extend_instance, extend_persistent};
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, log, symbol_short, token, Address, Env,
    Symbol,
};

// ── Storage keys ─────────────────────────────────────────────────────────────

const ADMIN: Symbol = symbol_short!("ADMIN");
const INITIALIZED: Symbol = symbol_short!("INIT");
const STAKE_TOKEN: Symbol = symbol_short!("TOKEN");
const SLASH_DEST: Symbol = symbol_short!("SLSH_DST");
const TOTAL_STAKED: Symbol = symbol_short!("TOTAL");
const STAKE: Symbol = symbol_short!("STAKE");
const SLASHER: Symbol = symbol_short!("SLASHER");

// ── Types ────────────────────────────────────────────────────────────────────

/// Where confiscated stake ends up.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SlashDestination {
    Burn,
    Treasury(Address),
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum StakingError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 10,
    InvalidAmount = 30,
    InsufficientStake = 40,
}

fn stake_key(guardian: &Address) -> (Symbol, Address) {
    (STAKE, guardian.clone())
}

fn slasher_key(addr: &Address) -> (Symbol, Address) {
    (SLASHER, addr.clone())
}

// ── Contract ─────────────────────────────────────────────────────────────────

#[contract]
pub struct StakingContract;

#[contractimpl]
impl StakingContract {
    pub fn initialize(
        env: Env,
        admin: Address,
        token: Address,
        slash_destination: SlashDestination,
    ) -> Result<(), StakingError> {
        if env.storage().instance().has(&INITIALIZED) {
            return Err(StakingError::AlreadyInitialized);
        }
        admin.require_auth();

        let storage = env.storage().instance();
        storage.set(&ADMIN, &admin);
        storage.set(&STAKE_TOKEN, &token);
        storage.set(&SLASH_DEST, &slash_destination);
        storage.set(&TOTAL_STAKED, &0i128);
        storage.set(&INITIALIZED, &true);
        extend_instance(&env);

        Ok(())
    }

    // ── Guardian operations ──────────────────────────────────────────────────

    /// Deposit `amount` stake tokens. Returns the guardian's new balance.
    pub fn stake(env: Env, guardian: Address, amount: i128) -> Result<i128, StakingError> {
        let token = Self::stake_token(&env)?;
        guardian.require_auth();
        if amount <= 0 {
            return Err(StakingError::InvalidAmount);
        }

        token::Client::new(&env, &token).transfer(
            &guardian,
            &env.current_contract_address(),
            &amount,
        );

        let balance = Self::get_staked_balance(env.clone(), guardian.clone())
            .checked_add(amount)
            .ok_or(StakingError::InvalidAmount)?;
        let total = Self::get_total_staked(env.clone())
            .checked_add(amount)
            .ok_or(StakingError::InvalidAmount)?;
        Self::write_balance(&env, &guardian, balance);
        env.storage().instance().set(&TOTAL_STAKED, &total);
        extend_instance(&env);

        events::publish_staked(&env, guardian, amount, balance);
        Ok(balance)
    }

    /// Withdraw `amount` stake tokens. Returns the guardian's remaining balance.
    pub fn unstake(env: Env, guardian: Address, amount: i128) -> Result<i128, StakingError> {
        let token = Self::stake_token(&env)?;
        guardian.require_auth();
        if amount <= 0 {
            return Err(StakingError::InvalidAmount);
        }

        let balance = Self::get_staked_balance(env.clone(), guardian.clone());
        if amount > balance {
            return Err(StakingError::InsufficientStake);
        }
        let remaining = balance - amount;
        Self::write_balance(&env, &guardian, remaining);
        let total = Self::get_total_staked(env.clone()) - amount;
        env.storage().instance().set(&TOTAL_STAKED, &total);

        token::Client::new(&env, &token).transfer(
            &env.current_contract_address(),
            &guardian,
            &amount,
        );

        events::publish_unstaked(&env, guardian, amount, remaining);
        Ok(remaining)
    }

    // ── Slashing ─────────────────────────────────────────────────────────────

    /// Confiscate up to `amount` from `guardian`.
    ///
    /// Only addresses registered with [`set_slasher`](Self::set_slasher) may
    /// call this. The slashed amount is `min(amount, balance)`; slashing a
    /// guardian without stake succeeds and returns 0.
    pub fn slash(
        env: Env,
        authority: Address,
        guardian: Address,
        amount: i128,
    ) -> Result<i128, StakingError> {
        let token = Self::stake_token(&env)?;
        authority.require_auth();
        if !Self::is_slasher(env.clone(), authority.clone()) {
            return Err(StakingError::Unauthorized);
        }
        if amount <= 0 {
            return Err(StakingError::InvalidAmount);
        }

        let balance = Self::get_staked_balance(env.clone(), guardian.clone());
        let slashed = amount.min(balance);
        if slashed > 0 {
            Self::write_balance(&env, &guardian, balance - slashed);
            let total = Self::get_total_staked(env.clone()) - slashed;
            env.storage().instance().set(&TOTAL_STAKED, &total);

            let token_client = token::Client::new(&env, &token);
            let ledger = env.current_contract_address();
            match Self::get_slash_destination(env.clone())? {
                SlashDestination::Burn => token_client.burn(&ledger, &slashed),
                SlashDestination::Treasury(treasury) => {
                    token_client.transfer(&ledger, &treasury, &slashed)
                }
            }
        }

        log!(&env, "slashed {} of {} requested", slashed, amount);
        events::publish_slashed(&env, authority, guardian, amount, slashed);
        Ok(slashed)
    }

    // ── Admin ────────────────────────────────────────────────────────────────

    pub fn set_slasher(
        env: Env,
        admin: Address,
        slasher: Address,
        enabled: bool,
    ) -> Result<(), StakingError> {
        Self::require_admin(&env, &admin)?;

        let key = slasher_key(&slasher);
        if enabled {
            env.storage().persistent().set(&key, &true);
            extend_persistent(&env, &key);
        } else {
            env.storage().persistent().remove(&key);
        }

        events::publish_slasher_changed(&env, slasher, enabled);
        Ok(())
    }

    pub fn set_slash_destination(
        env: Env,
        admin: Address,
        destination: SlashDestination,
    ) -> Result<(), StakingError> {
        Self::require_admin(&env, &admin)?;
        env.storage().instance().set(&SLASH_DEST, &destination);
        extend_instance(&env);
        Ok(())
    }

    // ── Views ────────────────────────────────────────────────────────────────

    pub fn is_slasher(env: Env, addr: Address) -> bool {
        let key = slasher_key(&addr);
        let enabled = env.storage().persistent().get(&key).unwrap_or(false);
        if enabled {
            extend_persistent(&env, &key);
        }
        enabled
    }

    pub fn get_staked_balance(env: Env, guardian: Address) -> i128 {
        let key = stake_key(&guardian);
        match env.storage().persistent().get::<_, i128>(&key) {
            Some(balance) => {
                extend_persistent(&env, &key);
                balance
            }
            None => 0,
        }
    }

    pub fn get_total_staked(env: Env) -> i128 {
        env.storage().instance().get(&TOTAL_STAKED).unwrap_or(0)
    }

    /// Wallet balance of `id` in the stake token.
    pub fn balance_of(env: Env, id: Address) -> Result<i128, StakingError> {
        let token = Self::stake_token(&env)?;
        Ok(token::Client::new(&env, &token).balance(&id))
    }

    pub fn get_token(env: Env) -> Result<Address, StakingError> {
        Self::stake_token(&env)
    }

    pub fn get_admin(env: Env) -> Result<Address, StakingError> {
        env.storage()
            .instance()
            .get(&ADMIN)
            .ok_or(StakingError::NotInitialized)
    }

    pub fn get_slash_destination(env: Env) -> Result<SlashDestination, StakingError> {
        env.storage()
            .instance()
            .get(&SLASH_DEST)
            .ok_or(StakingError::NotInitialized)
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn stake_token(env: &Env) -> Result<Address, StakingError> {
        env.storage()
            .instance()
            .get(&STAKE_TOKEN)
            .ok_or(StakingError::NotInitialized)
    }

    fn require_admin(env: &Env, caller: &Address) -> Result<(), StakingError> {
        caller.require_auth();
        let admin = Self::get_admin(env.clone())?;
        if *caller != admin {
            return Err(StakingError::Unauthorized);
        }
        Ok(())
    }

    fn write_balance(env: &Env, guardian: &Address, balance: i128) {
        let key = stake_key(guardian);
        env.storage().persistent().set(&key, &balance);
        extend_persistent(env, &key);
    }
}
