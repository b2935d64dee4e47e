//! Wire types for the subset of the beacon REST API this indexer
//! consumes (spec.md §6). Every integer wider than a handful of bits
//! travels as a JSON string on the wire; the `#[serde(deserialize_with
//! = ...)]` attributes below convert those back to real numbers
//! before any arithmetic touches them.
use crate::{
    chain::{
        epoch::Epoch,
        slot::{slot_from_string, Slot},
    },
    json_codecs::{aggregation_bits_from_hex, gwei_from_string, i32_from_string},
    units::GweiNewtype,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CommitteeAssignment {
    #[serde(deserialize_with = "slot_from_string")]
    pub slot: Slot,
    #[serde(deserialize_with = "i32_from_string")]
    pub index: i32,
    #[serde(deserialize_with = "deserialize_validator_indices")]
    pub validators: Vec<i32>,
}

fn deserialize_validator_indices<'de, D>(deserializer: D) -> Result<Vec<i32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;
    raw.into_iter()
        .map(|s| s.parse().map_err(serde::de::Error::custom))
        .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncCommitteeAssignment {
    #[serde(deserialize_with = "deserialize_validator_indices")]
    pub validators: Vec<i32>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Attestation {
    #[serde(deserialize_with = "aggregation_bits_from_hex")]
    pub aggregation_bits: Vec<bool>,
    pub data: AttestationData,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AttestationData {
    #[serde(deserialize_with = "slot_from_string")]
    pub slot: Slot,
    #[serde(deserialize_with = "i32_from_string")]
    pub index: i32,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BeaconBlockBody {
    pub attestations: Vec<Attestation>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BeaconBlock {
    #[serde(deserialize_with = "slot_from_string")]
    pub slot: Slot,
    #[serde(deserialize_with = "i32_from_string")]
    pub proposer_index: i32,
    pub body: BeaconBlockBody,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ValidatorInfo {
    #[serde(deserialize_with = "i32_from_string")]
    pub index: i32,
    pub status: String,
    pub validator: ValidatorDetail,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ValidatorDetail {
    #[serde(deserialize_with = "gwei_from_string")]
    pub effective_balance: GweiNewtype,
    pub withdrawal_credentials: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ValidatorBalanceInfo {
    #[serde(deserialize_with = "i32_from_string")]
    pub index: i32,
    #[serde(deserialize_with = "gwei_from_string")]
    pub balance: GweiNewtype,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct RewardComponents {
    #[serde(deserialize_with = "gwei_from_string")]
    pub head: GweiNewtype,
    #[serde(deserialize_with = "gwei_from_string")]
    pub target: GweiNewtype,
    #[serde(deserialize_with = "gwei_from_string")]
    pub source: GweiNewtype,
    #[serde(deserialize_with = "gwei_from_string")]
    pub inactivity: GweiNewtype,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct IdealReward {
    #[serde(deserialize_with = "gwei_from_string")]
    pub effective_balance: GweiNewtype,
    #[serde(flatten)]
    pub reward: RewardComponents,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TotalReward {
    #[serde(deserialize_with = "i32_from_string")]
    pub validator_index: i32,
    #[serde(flatten)]
    pub reward: RewardComponents,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AttestationRewards {
    pub ideal_rewards: Vec<IdealReward>,
    pub total_rewards: Vec<TotalReward>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BlockRewards {
    #[serde(deserialize_with = "i32_from_string")]
    pub proposer_index: i32,
    #[serde(deserialize_with = "gwei_from_string")]
    pub total: GweiNewtype,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SyncCommitteeReward {
    #[serde(deserialize_with = "i32_from_string")]
    pub validator_index: i32,
    #[serde(deserialize_with = "gwei_from_string")]
    pub reward: GweiNewtype,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ProposerDuty {
    #[serde(deserialize_with = "i32_from_string")]
    pub validator_index: i32,
    #[serde(deserialize_with = "slot_from_string")]
    pub slot: Slot,
}

#[derive(Debug, Serialize)]
pub struct StatusFilter(pub Vec<&'static str>);

pub fn epoch_last_slot(epoch: Epoch, profile: &crate::chain::ChainProfile) -> Slot {
    Slot((epoch.0 + 1) * profile.slots_per_epoch - 1)
}
