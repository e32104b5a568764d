#![no_main]

use arbitrary::Arbitrary;
use common::{Origin, RecoveryAction, RecoveryMessage};
use endpoint::{EndpointContract, EndpointContractClient};
use libfuzzer_sys::fuzz_target;
use recovery::{RecoveryState, RecoveryVaultContract, RecoveryVaultContractClient};
use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    token::StellarAssetClient,
    Address, Bytes, BytesN, Env, Vec as SorobanVec,
};
use staking::{SlashDestination, StakingContract, StakingContractClient};

const LOCAL_EID: u32 = 30101;
const PEER_EID: u32 = 40168;

/// Local vault operations interleaved with inbound messages from the trusted
/// peer, either well-formed or raw bytes.
#[derive(Arbitrary, Debug)]
pub enum FuzzAction {
    Stake { who: u8, amount: u16 },
    Initiate { who: u8, heir: u8 },
    Approve { who: u8 },
    Finalize,
    Flag { who: u8 },
    Cancel,
    Heartbeat,
    CheckInactivity,
    AdvanceTime { delta: u32 },
    Inbound { action: u8, recovery_delta: i8, party: u8, mirrored: bool },
    RawInbound { payload: Vec<u8> },
}

fuzz_target!(|actions: Vec<FuzzAction>| {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(1_000);

    let admin = Address::generate(&env);
    let token = env
        .register_stellar_asset_contract_v2(Address::generate(&env))
        .address();

    let endpoint = EndpointContractClient::new(&env, &env.register(EndpointContract, ()));
    endpoint.initialize(&admin, &LOCAL_EID, &token, &10, &1);
    let staking = StakingContractClient::new(&env, &env.register(StakingContract, ()));
    staking.initialize(&admin, &token, &SlashDestination::Burn);
    let vault = RecoveryVaultContractClient::new(&env, &env.register(RecoveryVaultContract, ()));
    vault.initialize(&admin, &endpoint.address, &staking.address, &LOCAL_EID, &Bytes::new(&env));
    staking.set_slasher(&admin, &vault.address, &true);
    let peer = Address::generate(&env);
    vault.set_peer(&admin, &PEER_EID, &peer);

    // Owner, three guardians, two outsiders.
    let parties: Vec<Address> = (0..6)
        .map(|_| {
            let a = Address::generate(&env);
            StellarAssetClient::new(&env, &token).mint(&a, &1_000_000_000i128);
            a
        })
        .collect();
    let guardians = SorobanVec::from_slice(&env, &parties[1..4]);
    let id = vault.initialize_vault(
        &parties[0],
        &guardians,
        &2,
        &600,
        &86_400,
        &parties[5],
        &50,
        &SorobanVec::new(&env),
    );

    let party = |i: u8| parties[i as usize % parties.len()].clone();
    let guardian = |i: u8| parties[1 + i as usize % 3].clone();
    let mut inbound_nonce = 0u64;
    let mut last_recovery_id = 0u64;

    for action in actions {
        let record = vault.get_vault(&id);
        let rid = record.recovery_id;
        let none = Bytes::new(&env);
        match action {
            FuzzAction::Stake { who, amount } => {
                let _ = staking.try_stake(&guardian(who), &(amount as i128));
            }
            FuzzAction::Initiate { who, heir } => {
                let _ = vault.try_initiate_recovery(&party(who), &id, &party(heir), &0, &none);
            }
            FuzzAction::Approve { who } => {
                let _ = vault.try_approve_recovery(&guardian(who), &id, &rid);
            }
            FuzzAction::Finalize => {
                let _ = vault.try_finalize_recovery(&parties[4], &id, &rid);
            }
            FuzzAction::Flag { who } => {
                let _ = vault.try_mark_malicious(&record.owner, &id, &rid, &guardian(who));
            }
            FuzzAction::Cancel => {
                let _ = vault.try_cancel_recovery(&record.owner, &id, &rid);
            }
            FuzzAction::Heartbeat => {
                let _ = vault.try_update_last_active(&record.owner, &id);
            }
            FuzzAction::CheckInactivity => {
                let _ = vault.try_check_inactivity(&parties[4], &id);
            }
            FuzzAction::AdvanceTime { delta } => {
                let ts = env.ledger().timestamp().saturating_add(delta as u64);
                env.ledger().set_timestamp(ts);
            }
            FuzzAction::Inbound { action, recovery_delta, party: p, mirrored } => {
                let target = (rid as i64 + recovery_delta as i64).max(0) as u64;
                let message = match RecoveryAction::from_tag(action % 4) {
                    Some(RecoveryAction::Initiate) => RecoveryMessage::initiate(id.clone(), target, party(p)),
                    Some(RecoveryAction::ApprovalComplete) => {
                        RecoveryMessage::approval_complete(id.clone(), target, party(p))
                    }
                    Some(RecoveryAction::MarkMalicious) => {
                        RecoveryMessage::mark_malicious(id.clone(), target, guardian(p))
                    }
                    _ => RecoveryMessage::cancel(id.clone(), target),
                }
                .from_mirror(mirrored);
                inbound_nonce += 1;
                let origin = Origin { src_eid: PEER_EID, sender: peer.clone(), nonce: inbound_nonce };
                let guid = BytesN::from_array(&env, &[inbound_nonce as u8; 32]);
                let _ = vault.try_lz_receive(&origin, &guid, &message.encode(&env));
            }
            FuzzAction::RawInbound { payload } => {
                inbound_nonce += 1;
                let origin = Origin { src_eid: PEER_EID, sender: peer.clone(), nonce: inbound_nonce };
                let guid = BytesN::from_array(&env, &[inbound_nonce as u8; 32]);
                let _ = vault.try_lz_receive(&origin, &guid, &Bytes::from_slice(&env, &payload));
            }
        }

        // ── Post-action invariant checks ──
        let record = vault.get_vault(&id);
        assert!(record.recovery_id >= last_recovery_id, "recovery id went backwards");
        last_recovery_id = record.recovery_id;
        assert_eq!(
            record.backup_claimed,
            record.owner == record.backup_wallet,
            "backup_claimed out of sync with ownership"
        );

        let attempt = match record.recovery_id {
            0 => None,
            rid => vault.get_recovery(&id, &rid),
        };
        match (record.recovery_state, attempt) {
            (RecoveryState::None, None) => {}
            (RecoveryState::None, Some(a)) => assert!(a.cancelled, "idle vault with a live attempt"),
            (RecoveryState::Pending, Some(a)) => {
                assert!(a.is_open(), "pending vault with a closed attempt");
                let reached = a.effective_approvals() >= record.threshold;
                assert_eq!(reached, a.quorum_at.is_some(), "quorum flag out of sync");
            }
            (RecoveryState::Completed, Some(a)) => {
                assert!(a.completed, "completed vault with an open attempt");
                assert_eq!(a.new_owner, record.owner, "completed attempt names another owner");
            }
            (state, attempt) => panic!("state {:?} with attempt {:?}", state, attempt),
        }
    }
});
