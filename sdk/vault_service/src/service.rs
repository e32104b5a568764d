use common::{is_zero_address, MessagingFee, RecoveryAction};
use endpoint::EndpointContractClient;
use recovery::{RecoveryAttempt, RecoveryVaultContractClient, VaultRecord};
use soroban_sdk::{token::TokenClient, Address, Bytes, BytesN, Env, InvokeError, Vec as SorobanVec};
use staking::StakingContractClient;

use crate::config::VaultConfig;
use crate::error::{Result, ServiceError};

/// Deployed contracts of one ledger.
#[derive(Clone, Debug)]
pub struct ContractAddresses {
    pub vault: Address,
    pub stake_ledger: Address,
    pub endpoint: Address,
}

/// Outcome of a successful `initiate_recovery`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoveryTicket {
    pub recovery_id: u64,
    /// Fee charged for the cross-chain message; zero for local attempts.
    pub fee: MessagingFee,
}

/// Snapshot of a vault for display.
#[derive(Clone, Debug)]
pub struct VaultStatus {
    pub vault: VaultRecord,
    pub current_recovery: Option<RecoveryAttempt>,
    pub seconds_until_inactive: u64,
}

pub struct VaultService<'a> {
    env: Env,
    vault: RecoveryVaultContractClient<'a>,
    staking: StakingContractClient<'a>,
    endpoint: EndpointContractClient<'a>,
}

type Attempt<T, C, E> = std::result::Result<std::result::Result<T, C>, std::result::Result<E, InvokeError>>;

/// Collapse a `try_*` client result into a [`ServiceError`].
fn settle<T, C, E>(attempt: Attempt<T, C, E>) -> Result<T>
where
    ServiceError: From<E>,
{
    match attempt {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(_)) => Err(ServiceError::Decode),
        Err(Ok(err)) => Err(err.into()),
        Err(Err(InvokeError::Contract(code))) => Err(ServiceError::Contract(code)),
        Err(Err(InvokeError::Abort)) => Err(ServiceError::Aborted),
    }
}

impl<'a> VaultService<'a> {
    pub fn new(env: &Env, contracts: &ContractAddresses) -> Self {
        Self {
            env: env.clone(),
            vault: RecoveryVaultContractClient::new(env, &contracts.vault),
            staking: StakingContractClient::new(env, &contracts.stake_ledger),
            endpoint: EndpointContractClient::new(env, &contracts.endpoint),
        }
    }

    // ── Vaults ───────────────────────────────────────────────────────────────

    /// Validate `config` locally, then register the vault. Nothing is
    /// submitted if any check fails.
    pub fn create_vault(&self, owner: &Address, config: &VaultConfig) -> Result<BytesN<32>> {
        config.validate(&self.env, owner)?;
        let guardians = SorobanVec::from_slice(&self.env, &config.guardians);
        let assets = SorobanVec::from_slice(&self.env, &config.assets);
        settle(self.vault.try_initialize_vault(
            owner,
            &guardians,
            &config.threshold,
            &config.timelock,
            &config.inactivity_period,
            &config.backup_wallet,
            &config.stake_amount,
            &assets,
        ))
    }

    /// `None` when no vault exists under `vault_id`.
    pub fn vault_info(&self, vault_id: &BytesN<32>) -> Option<VaultRecord> {
        let vault = self.vault.get_vault(vault_id);
        if is_zero_address(&self.env, &vault.owner) {
            None
        } else {
            Some(vault)
        }
    }

    pub fn recovery_info(&self, vault_id: &BytesN<32>, recovery_id: u64) -> Option<RecoveryAttempt> {
        self.vault.get_recovery(vault_id, &recovery_id)
    }

    pub fn status(&self, vault_id: &BytesN<32>) -> Result<VaultStatus> {
        let vault = self
            .vault_info(vault_id)
            .ok_or(ServiceError::Recovery(recovery::RecoveryError::VaultNotFound))?;
        let current_recovery = match vault.recovery_id {
            0 => None,
            id => self.recovery_info(vault_id, id),
        };
        let seconds_until_inactive = settle(self.vault.try_time_until_inactive(vault_id))?;
        Ok(VaultStatus {
            vault,
            current_recovery,
            seconds_until_inactive,
        })
    }

    pub fn vaults_of(&self, owner: &Address) -> Vec<BytesN<32>> {
        self.vault.vaults_of(owner).iter().collect()
    }

    pub fn heartbeat(&self, owner: &Address, vault_id: &BytesN<32>) -> Result<()> {
        settle(self.vault.try_update_last_active(owner, vault_id))
    }

    // ── Recovery ─────────────────────────────────────────────────────────────

    /// Fee for mirroring a new attempt naming `new_owner` to `dst_eid`; zero
    /// for local attempts.
    pub fn quote_recovery(
        &self,
        vault_id: &BytesN<32>,
        new_owner: &Address,
        dst_eid: u32,
    ) -> Result<MessagingFee> {
        if dst_eid == 0 {
            return Ok(MessagingFee::default());
        }
        settle(self.vault.try_quote_action(
            vault_id,
            &RecoveryAction::Initiate,
            &dst_eid,
            new_owner,
        ))
    }

    /// Quote, check that `caller` can cover the fee, then initiate.
    pub fn initiate_recovery(
        &self,
        caller: &Address,
        vault_id: &BytesN<32>,
        new_owner: &Address,
        dst_eid: u32,
    ) -> Result<RecoveryTicket> {
        let fee = self.quote_recovery(vault_id, new_owner, dst_eid)?;
        if fee.native_fee > 0 {
            let available = self.fee_balance(caller)?;
            if available < fee.native_fee {
                return Err(ServiceError::InsufficientFunds {
                    required: fee.native_fee,
                    available,
                });
            }
        }
        let recovery_id = settle(self.vault.try_initiate_recovery(
            caller,
            vault_id,
            new_owner,
            &dst_eid,
            &Bytes::new(&self.env),
        ))?;
        Ok(RecoveryTicket { recovery_id, fee })
    }

    /// Returns `true` if this approval also completed the recovery.
    pub fn approve(&self, guardian: &Address, vault_id: &BytesN<32>, recovery_id: u64) -> Result<bool> {
        settle(self.vault.try_approve_recovery(guardian, vault_id, &recovery_id))
    }

    pub fn finalize(&self, caller: &Address, vault_id: &BytesN<32>, recovery_id: u64) -> Result<()> {
        settle(self.vault.try_finalize_recovery(caller, vault_id, &recovery_id))
    }

    /// Flag an approving guardian. Returns the stake slashed from them.
    pub fn flag_guardian(
        &self,
        caller: &Address,
        vault_id: &BytesN<32>,
        recovery_id: u64,
        guardian: &Address,
    ) -> Result<i128> {
        settle(
            self.vault
                .try_mark_malicious(caller, vault_id, &recovery_id, guardian),
        )
    }

    pub fn cancel(&self, owner: &Address, vault_id: &BytesN<32>, recovery_id: u64) -> Result<()> {
        settle(self.vault.try_cancel_recovery(owner, vault_id, &recovery_id))
    }

    /// Returns `true` if the vault was handed to its backup wallet.
    pub fn check_inactivity(&self, caller: &Address, vault_id: &BytesN<32>) -> Result<bool> {
        settle(self.vault.try_check_inactivity(caller, vault_id))
    }

    // ── Stake ────────────────────────────────────────────────────────────────

    pub fn stake(&self, guardian: &Address, amount: i128) -> Result<i128> {
        settle(self.staking.try_stake(guardian, &amount))
    }

    pub fn unstake(&self, guardian: &Address, amount: i128) -> Result<i128> {
        settle(self.staking.try_unstake(guardian, &amount))
    }

    pub fn staked_balance(&self, guardian: &Address) -> i128 {
        self.staking.get_staked_balance(guardian)
    }

    // ── Messaging ────────────────────────────────────────────────────────────

    /// Whether a cross-chain message is waiting for a retry on this ledger.
    pub fn is_message_parked(&self, guid: &BytesN<32>) -> bool {
        self.endpoint.is_parked(guid)
    }

    fn fee_balance(&self, payer: &Address) -> Result<i128> {
        let config = settle(self.endpoint.try_get_fee_config())?;
        Ok(TokenClient::new(&self.env, &config.token).balance(payer))
    }
}
