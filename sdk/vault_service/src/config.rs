use common::is_zero_address;
use recovery::{Asset, MAX_GUARDIANS};
use soroban_sdk::{Address, Env};
use thiserror::Error;

use crate::error::ServiceError;

/// Terms of a new vault as entered by its owner.
#[derive(Clone, Debug)]
pub struct VaultConfig {
    pub guardians: Vec<Address>,
    pub threshold: u32,
    /// Seconds between quorum and finalisation.
    pub timelock: u64,
    /// Seconds of owner silence before the backup wallet may claim the vault.
    pub inactivity_period: u64,
    pub backup_wallet: Address,
    pub stake_amount: i128,
    pub assets: Vec<Asset>,
}

/// One reason a [`VaultConfig`] would be rejected. Guardian and asset
/// positions are 1-based.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigProblem {
    #[error("at least one guardian is required")]
    NoGuardians,
    #[error("at most {max} guardians are allowed, got {count}")]
    TooManyGuardians { count: usize, max: u32 },
    #[error("guardian {0} is listed more than once")]
    DuplicateGuardian(usize),
    #[error("threshold must be greater than 0")]
    ZeroThreshold,
    #[error("threshold {threshold} cannot be greater than the number of guardians ({guardians})")]
    ThresholdTooHigh { threshold: u32, guardians: usize },
    #[error("inactivity period must be greater than 0")]
    ZeroInactivity,
    #[error("stake amount cannot be negative")]
    NegativeStake,
    #[error("backup wallet must differ from the owner")]
    BackupIsOwner,
    #[error("backup wallet cannot be the zero identity")]
    ZeroBackup,
    #[error("asset {0} has a negative amount")]
    NegativeAssetAmount(usize),
}

impl VaultConfig {
    /// Every problem with this configuration, in field order.
    pub fn problems(&self, env: &Env, owner: &Address) -> Vec<ConfigProblem> {
        let mut problems = Vec::new();

        if self.guardians.is_empty() {
            problems.push(ConfigProblem::NoGuardians);
        }
        if self.guardians.len() > MAX_GUARDIANS as usize {
            problems.push(ConfigProblem::TooManyGuardians {
                count: self.guardians.len(),
                max: MAX_GUARDIANS,
            });
        }
        for (i, guardian) in self.guardians.iter().enumerate() {
            if self.guardians[..i].contains(guardian) {
                problems.push(ConfigProblem::DuplicateGuardian(i + 1));
            }
        }

        if self.threshold == 0 {
            problems.push(ConfigProblem::ZeroThreshold);
        } else if self.threshold as usize > self.guardians.len() {
            problems.push(ConfigProblem::ThresholdTooHigh {
                threshold: self.threshold,
                guardians: self.guardians.len(),
            });
        }

        if self.inactivity_period == 0 {
            problems.push(ConfigProblem::ZeroInactivity);
        }
        if self.stake_amount < 0 {
            problems.push(ConfigProblem::NegativeStake);
        }
        if self.backup_wallet == *owner {
            problems.push(ConfigProblem::BackupIsOwner);
        }
        if is_zero_address(env, &self.backup_wallet) {
            problems.push(ConfigProblem::ZeroBackup);
        }
        for (i, asset) in self.assets.iter().enumerate() {
            if asset.amount < 0 {
                problems.push(ConfigProblem::NegativeAssetAmount(i + 1));
            }
        }

        problems
    }

    pub fn validate(&self, env: &Env, owner: &Address) -> Result<(), ServiceError> {
        let problems = self.problems(env, owner);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::InvalidConfig(problems))
        }
    }
}
