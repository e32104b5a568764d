#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    token::{StellarAssetClient, TokenClient},
    Address, Env,
};
use staking::{SlashDestination, StakingContract, StakingContractClient};

/// Guardian and slasher entry points of the stake ledger.
#[derive(Arbitrary, Debug)]
pub enum FuzzAction {
    Stake { amount: u64 },
    Unstake { amount: u64 },
    Slash { amount: u64 },
    /// Slash attempted by an address that was never registered.
    RogueSlash { amount: u64 },
    ToggleTreasury,
    AdvanceTime { delta: u16 },
}

fuzz_target!(|actions: Vec<FuzzAction>| {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let slasher = Address::generate(&env);
    let rogue = Address::generate(&env);
    let treasury = Address::generate(&env);
    let token = env
        .register_stellar_asset_contract_v2(Address::generate(&env))
        .address();

    let contract_id = env.register(StakingContract, ());
    let client = StakingContractClient::new(&env, &contract_id);
    if client
        .try_initialize(&admin, &token, &SlashDestination::Burn)
        .is_err()
    {
        return;
    }
    client.set_slasher(&admin, &slasher, &true);

    let mut guardians = Vec::new();
    for _ in 0..4 {
        let g = Address::generate(&env);
        StellarAssetClient::new(&env, &token).mint(&g, &1_000_000_000_000i128);
        guardians.push(g);
    }
    let token_client = TokenClient::new(&env, &token);
    let mut to_treasury = false;

    for (i, action) in actions.into_iter().enumerate() {
        let guardian = &guardians[i % guardians.len()];
        match action {
            FuzzAction::Stake { amount } => {
                let _ = client.try_stake(guardian, &(amount as i128));
            }
            FuzzAction::Unstake { amount } => {
                let _ = client.try_unstake(guardian, &(amount as i128));
            }
            FuzzAction::Slash { amount } => {
                let before = client.get_staked_balance(guardian);
                if let Ok(Ok(slashed)) = client.try_slash(&slasher, guardian, &(amount as i128)) {
                    assert_eq!(slashed, before.min(amount as i128), "slash took the wrong amount");
                }
            }
            FuzzAction::RogueSlash { amount } => {
                let before = client.get_staked_balance(guardian);
                assert!(
                    client.try_slash(&rogue, guardian, &(amount as i128)).is_err(),
                    "unregistered address slashed stake"
                );
                assert_eq!(client.get_staked_balance(guardian), before);
            }
            FuzzAction::ToggleTreasury => {
                to_treasury = !to_treasury;
                let destination = if to_treasury {
                    SlashDestination::Treasury(treasury.clone())
                } else {
                    SlashDestination::Burn
                };
                let _ = client.try_set_slash_destination(&admin, &destination);
            }
            FuzzAction::AdvanceTime { delta } => {
                let ts = env.ledger().timestamp().saturating_add(delta as u64);
                env.ledger().set_timestamp(ts);
            }
        }

        // ── Post-action invariant checks ──
        let total = client.get_total_staked();
        let sum: i128 = guardians.iter().map(|g| client.get_staked_balance(g)).sum();
        assert!(total >= 0, "total_staked went negative: {}", total);
        assert_eq!(total, sum, "total_staked diverged from the sum of stakes");
        assert_eq!(
            token_client.balance(&contract_id),
            total,
            "ledger custody differs from total_staked"
        );
    }
});
