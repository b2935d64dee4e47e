//! Typed façade over the beacon REST API (spec.md §4.3, §6).
//!
//! Every method here resolves its own pool via
//! [`crate::reliable_client::pool::resolve_pool`] before dispatching
//! through [`ReliableClient::reliable_request`], and every slot-
//! addressed method returns [`SlotAddressed`] instead of an `Option`
//! so a missed slot reads as a first-class outcome at every call site,
//! not a value a caller can forget to check (spec.md §9 redesign
//! flag). Mirrors the shape of the teacher's `BeaconNode` trait.
pub mod types;

use crate::{
    chain::{epoch::Epoch, slot::Slot, CHAIN_PROFILE},
    reliable_client::{
        pool::{resolve_pool, Pool},
        ReliableClient,
    },
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Mutex;
use tokio::time::Instant;
use types::*;

/// The outcome of any call addressed to a specific slot: the chain
/// either produced a block there or it didn't. `Missed` is not an
/// error — a missed slot is exactly as meaningful to the indexer as a
/// filled one (spec.md §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAddressed<T> {
    Found(T),
    Missed,
}

impl<T> SlotAddressed<T> {
    pub fn found(self) -> Option<T> {
        match self {
            SlotAddressed::Found(value) => Some(value),
            SlotAddressed::Missed => None,
        }
    }

    pub fn is_missed(&self) -> bool {
        matches!(self, SlotAddressed::Missed)
    }
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait BeaconClient: Send + Sync {
    async fn head_slot(&self) -> Result<Slot>;
    async fn committees(&self, epoch: Epoch) -> Result<Vec<CommitteeAssignment>>;
    async fn sync_committee(&self, epoch: Epoch) -> Result<SyncCommitteeAssignment>;
    async fn block(&self, slot: Slot) -> Result<SlotAddressed<BeaconBlock>>;
    async fn attestations(&self, slot: Slot) -> Result<SlotAddressed<Vec<Attestation>>>;
    async fn validators(
        &self,
        state_id: &str,
        ids: Option<&[i32]>,
        statuses: Option<&[&str]>,
    ) -> Result<Vec<ValidatorInfo>>;
    async fn validator_balances(
        &self,
        state_id: &str,
        ids: &[i32],
    ) -> Result<Vec<ValidatorBalanceInfo>>;
    async fn attestation_rewards(&self, epoch: Epoch, ids: &[i32]) -> Result<AttestationRewards>;
    async fn block_rewards(&self, slot: Slot) -> Result<SlotAddressed<BlockRewards>>;
    async fn sync_committee_rewards(
        &self,
        slot: Slot,
        ids: &[i32],
    ) -> Result<SlotAddressed<Vec<SyncCommitteeReward>>>;
    async fn proposer_duties(&self, epoch: Epoch) -> Result<Vec<ProposerDuty>>;
}

pub struct BeaconClientHttp {
    reliable: ReliableClient,
    head_cache: Mutex<Option<(Instant, Slot)>>,
}

/// How long a cached head slot is trusted before `resolve_pool`'s
/// proximity checks ask the node again. Short enough that the
/// head-proximity heuristic (spec.md §4.2) never acts on stale data
/// across more than a handful of slots.
const HEAD_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(6);

#[derive(Debug)]
struct HttpStatusError(StatusCode);

impl std::fmt::Display for HttpStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "beacon node responded {}", self.0)
    }
}
impl std::error::Error for HttpStatusError {}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<HttpStatusError>()
        .map(|e| e.0 == StatusCode::NOT_FOUND)
        .unwrap_or(false)
}

async fn fetch_json<T: serde::de::DeserializeOwned>(res: reqwest::Response) -> Result<T> {
    match res.status() {
        StatusCode::OK => Ok(res.json::<T>().await?),
        StatusCode::NOT_FOUND => Err(anyhow!(HttpStatusError(StatusCode::NOT_FOUND))),
        status => {
            let body = res.text().await.unwrap_or_default();
            Err(anyhow!("beacon node responded {status}: {body}"))
        }
    }
}

impl BeaconClientHttp {
    pub fn new(reliable: ReliableClient) -> Self {
        Self {
            reliable,
            head_cache: Mutex::new(None),
        }
    }

    fn http(&self) -> reqwest::Client {
        self.reliable.http.clone()
    }

    async fn cached_head_slot(&self) -> Slot {
        {
            let cache = self.head_cache.lock().expect("head cache poisoned");
            if let Some((fetched_at, slot)) = *cache {
                if fetched_at.elapsed() < HEAD_CACHE_TTL {
                    return slot;
                }
            }
        }

        match self.head_slot().await {
            Ok(slot) => {
                *self.head_cache.lock().expect("head cache poisoned") =
                    Some((Instant::now(), slot));
                slot
            }
            // head fetch is best-effort here; fall back to whatever was
            // cached (even if stale) rather than fail the whole call
            // over a pool-selection heuristic.
            Err(_) => self
                .head_cache
                .lock()
                .expect("head cache poisoned")
                .map(|(_, slot)| slot)
                .unwrap_or(Slot(0)),
        }
    }

    async fn resolve(&self, preferred: Pool, requested_slot: Slot, is_attestation: bool) -> Pool {
        let head = self.cached_head_slot().await;
        resolve_pool(preferred, requested_slot, head, is_attestation)
    }
}

#[async_trait]
impl BeaconClient for BeaconClientHttp {
    async fn head_slot(&self) -> Result<Slot> {
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: HeaderData,
        }
        #[derive(serde::Deserialize)]
        struct HeaderData {
            header: SignedHeader,
        }
        #[derive(serde::Deserialize)]
        struct SignedHeader {
            message: HeaderMessage,
        }
        #[derive(serde::Deserialize)]
        struct HeaderMessage {
            #[serde(deserialize_with = "crate::chain::slot::slot_from_string")]
            slot: Slot,
        }

        let http = self.http();
        let envelope: Envelope = self
            .reliable
            .reliable_request(
                Pool::Full,
                move |base_url| {
                    let http = http.clone();
                    async move {
                        let res = http
                            .get(format!("{base_url}/eth/v1/beacon/headers/head"))
                            .send()
                            .await?;
                        fetch_json(res).await
                    }
                },
                None,
            )
            .await?;

        Ok(envelope.data.header.message.slot)
    }

    async fn committees(&self, epoch: Epoch) -> Result<Vec<CommitteeAssignment>> {
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: Vec<CommitteeAssignment>,
        }

        let requested_slot = epoch_last_slot(epoch, &CHAIN_PROFILE);
        let pool = self.resolve(Pool::Full, requested_slot, false).await;
        let http = self.http();

        let envelope: Envelope = self
            .reliable
            .reliable_request(
                pool,
                move |base_url| {
                    let http = http.clone();
                    async move {
                        let res = http
                            .get(format!(
                                "{base_url}/eth/v1/beacon/states/head/committees?epoch={}",
                                epoch.0
                            ))
                            .send()
                            .await?;
                        fetch_json(res).await
                    }
                },
                None,
            )
            .await?;

        Ok(envelope.data)
    }

    async fn sync_committee(&self, epoch: Epoch) -> Result<SyncCommitteeAssignment> {
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: SyncCommitteeAssignment,
        }

        let requested_slot = epoch_last_slot(epoch, &CHAIN_PROFILE);
        let pool = self.resolve(Pool::Full, requested_slot, false).await;
        let http = self.http();

        let envelope: Envelope = self
            .reliable
            .reliable_request(
                pool,
                move |base_url| {
                    let http = http.clone();
                    async move {
                        let res = http
                            .get(format!(
                                "{base_url}/eth/v1/beacon/states/head/sync_committees?epoch={}",
                                epoch.0
                            ))
                            .send()
                            .await?;
                        fetch_json(res).await
                    }
                },
                None,
            )
            .await?;

        Ok(envelope.data)
    }

    async fn block(&self, slot: Slot) -> Result<SlotAddressed<BeaconBlock>> {
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: BlockEnvelopeData,
        }
        #[derive(serde::Deserialize)]
        struct BlockEnvelopeData {
            message: BeaconBlock,
        }

        let pool = self.resolve(Pool::Full, slot, false).await;
        let http = self.http();

        let handler = |err: &anyhow::Error| -> Option<SlotAddressed<BeaconBlock>> {
            if is_not_found(err) {
                Some(SlotAddressed::Missed)
            } else {
                None
            }
        };

        self.reliable
            .reliable_request(
                pool,
                move |base_url| {
                    let http = http.clone();
                    async move {
                        let res = http
                            .get(format!("{base_url}/eth/v2/beacon/blocks/{}", slot.0))
                            .send()
                            .await?;
                        let envelope: Envelope = fetch_json(res).await?;
                        Ok(SlotAddressed::Found(envelope.data.message))
                    }
                },
                Some(&handler),
            )
            .await
    }

    async fn attestations(&self, slot: Slot) -> Result<SlotAddressed<Vec<Attestation>>> {
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: Vec<Attestation>,
        }

        let pool = self.resolve(Pool::Full, slot, true).await;
        let http = self.http();

        let handler = |err: &anyhow::Error| -> Option<SlotAddressed<Vec<Attestation>>> {
            if is_not_found(err) {
                Some(SlotAddressed::Missed)
            } else {
                None
            }
        };

        self.reliable
            .reliable_request(
                pool,
                move |base_url| {
                    let http = http.clone();
                    async move {
                        let res = http
                            .get(format!(
                                "{base_url}/eth/v1/beacon/blocks/{}/attestations",
                                slot.0
                            ))
                            .send()
                            .await?;
                        let envelope: Envelope = fetch_json(res).await?;
                        Ok(SlotAddressed::Found(envelope.data))
                    }
                },
                Some(&handler),
            )
            .await
    }

    async fn validators(
        &self,
        state_id: &str,
        ids: Option<&[i32]>,
        statuses: Option<&[&str]>,
    ) -> Result<Vec<ValidatorInfo>> {
        #[derive(serde::Serialize)]
        struct Body {
            #[serde(skip_serializing_if = "Option::is_none")]
            ids: Option<Vec<String>>,
            #[serde(skip_serializing_if = "Option::is_none")]
            statuses: Option<Vec<String>>,
        }
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: Vec<ValidatorInfo>,
        }

        let state_id = state_id.to_string();
        let body = Body {
            ids: ids.map(|ids| ids.iter().map(|id| id.to_string()).collect()),
            statuses: statuses.map(|statuses| statuses.iter().map(|s| s.to_string()).collect()),
        };
        let head = self.cached_head_slot().await;
        let pool = resolve_pool(Pool::Archive, head, head, false);
        let http = self.http();

        let envelope: Envelope = self
            .reliable
            .reliable_request(
                pool,
                move |base_url| {
                    let http = http.clone();
                    let state_id = state_id.clone();
                    let body = Body {
                        ids: body.ids.clone(),
                        statuses: body.statuses.clone(),
                    };
                    async move {
                        let res = http
                            .post(format!(
                                "{base_url}/eth/v1/beacon/states/{state_id}/validators"
                            ))
                            .json(&body)
                            .send()
                            .await?;
                        fetch_json(res).await
                    }
                },
                None,
            )
            .await?;

        Ok(envelope.data)
    }

    async fn validator_balances(
        &self,
        state_id: &str,
        ids: &[i32],
    ) -> Result<Vec<ValidatorBalanceInfo>> {
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: Vec<ValidatorBalanceInfo>,
        }

        let state_id = state_id.to_string();
        let id_query = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let head = self.cached_head_slot().await;
        let pool = resolve_pool(Pool::Archive, head, head, false);
        let http = self.http();

        let envelope: Envelope = self
            .reliable
            .reliable_request(
                pool,
                move |base_url| {
                    let http = http.clone();
                    let state_id = state_id.clone();
                    let id_query = id_query.clone();
                    async move {
                        let res = http
                            .get(format!(
                                "{base_url}/eth/v1/beacon/states/{state_id}/validator_balances?id={id_query}"
                            ))
                            .send()
                            .await?;
                        fetch_json(res).await
                    }
                },
                None,
            )
            .await?;

        Ok(envelope.data)
    }

    async fn attestation_rewards(&self, epoch: Epoch, ids: &[i32]) -> Result<AttestationRewards> {
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: AttestationRewards,
        }

        let requested_slot = epoch_last_slot(epoch, &CHAIN_PROFILE);
        let pool = self.resolve(Pool::Archive, requested_slot, false).await;
        let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let http = self.http();

        self.reliable
            .reliable_request(
                pool,
                move |base_url| {
                    let http = http.clone();
                    let ids = ids.clone();
                    async move {
                        let res = http
                            .post(format!(
                                "{base_url}/eth/v1/beacon/rewards/attestations/{}",
                                epoch.0
                            ))
                            .json(&ids)
                            .send()
                            .await?;
                        let envelope: Envelope = fetch_json(res).await?;
                        Ok(envelope.data)
                    }
                },
                None,
            )
            .await
    }

    async fn block_rewards(&self, slot: Slot) -> Result<SlotAddressed<BlockRewards>> {
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: BlockRewards,
        }

        let pool = self.resolve(Pool::Full, slot, false).await;
        let http = self.http();

        let handler = |err: &anyhow::Error| -> Option<SlotAddressed<BlockRewards>> {
            if is_not_found(err) {
                Some(SlotAddressed::Missed)
            } else {
                None
            }
        };

        self.reliable
            .reliable_request(
                pool,
                move |base_url| {
                    let http = http.clone();
                    async move {
                        let res = http
                            .get(format!("{base_url}/eth/v1/beacon/rewards/blocks/{}", slot.0))
                            .send()
                            .await?;
                        let envelope: Envelope = fetch_json(res).await?;
                        Ok(SlotAddressed::Found(envelope.data))
                    }
                },
                Some(&handler),
            )
            .await
    }

    async fn sync_committee_rewards(
        &self,
        slot: Slot,
        ids: &[i32],
    ) -> Result<SlotAddressed<Vec<SyncCommitteeReward>>> {
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: Vec<SyncCommitteeReward>,
        }

        let pool = self.resolve(Pool::Full, slot, false).await;
        let http = self.http();
        let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();

        let handler = |err: &anyhow::Error| -> Option<SlotAddressed<Vec<SyncCommitteeReward>>> {
            if is_not_found(err) {
                Some(SlotAddressed::Missed)
            } else {
                None
            }
        };

        self.reliable
            .reliable_request(
                pool,
                move |base_url| {
                    let http = http.clone();
                    let ids = ids.clone();
                    async move {
                        let res = http
                            .post(format!(
                                "{base_url}/eth/v1/beacon/rewards/sync_committee/{}",
                                slot.0
                            ))
                            .json(&ids)
                            .send()
                            .await?;
                        let envelope: Envelope = fetch_json(res).await?;
                        Ok(SlotAddressed::Found(envelope.data))
                    }
                },
                Some(&handler),
            )
            .await
    }

    async fn proposer_duties(&self, epoch: Epoch) -> Result<Vec<ProposerDuty>> {
        #[derive(serde::Deserialize)]
        struct Envelope {
            data: Vec<ProposerDuty>,
        }

        let requested_slot = epoch_last_slot(epoch, &CHAIN_PROFILE);
        let pool = self.resolve(Pool::Full, requested_slot, false).await;
        let http = self.http();

        let envelope: Envelope = self
            .reliable
            .reliable_request(
                pool,
                move |base_url| {
                    let http = http.clone();
                    async move {
                        let res = http
                            .get(format!(
                                "{base_url}/eth/v1/validator/duties/proposer/{}",
                                epoch.0
                            ))
                            .send()
                            .await?;
                        fetch_json(res).await
                    }
                },
                None,
            )
            .await?;

        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(server: &mockito::ServerGuard) -> BeaconClientHttp {
        BeaconClientHttp::new(ReliableClient::new(server.url(), server.url(), 2, 2, 1000))
    }

    #[tokio::test]
    async fn head_slot_parses_header_envelope_test() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/eth/v1/beacon/headers/head")
            .with_status(200)
            .with_body(r#"{"data":{"header":{"message":{"slot":"12345"}}}}"#)
            .create_async()
            .await;

        let client = test_client(&server);
        let slot = client.head_slot().await.unwrap();
        assert_eq!(slot, Slot(12345));
    }

    #[tokio::test]
    async fn block_missing_slot_is_missed_not_error_test() {
        let mut server = mockito::Server::new_async().await;
        let _head = server
            .mock("GET", "/eth/v1/beacon/headers/head")
            .with_status(200)
            .with_body(r#"{"data":{"header":{"message":{"slot":"1009"}}}}"#)
            .create_async()
            .await;
        let _m = server
            .mock(
                "GET",
                mockito::Matcher::Regex(r"^/eth/v2/beacon/blocks/\d+$".into()),
            )
            .with_status(404)
            .create_async()
            .await;

        let client = test_client(&server);
        let result = client.block(Slot(999)).await.unwrap();
        assert!(result.is_missed());
    }

    #[tokio::test]
    async fn attestations_decode_bits_test() {
        let mut server = mockito::Server::new_async().await;
        let _head = server
            .mock("GET", "/eth/v1/beacon/headers/head")
            .with_status(200)
            .with_body(r#"{"data":{"header":{"message":{"slot":"15"}}}}"#)
            .create_async()
            .await;
        let _m = server
            .mock(
                "GET",
                mockito::Matcher::Regex(r"^/eth/v1/beacon/blocks/\d+/attestations$".into()),
            )
            .with_status(200)
            .with_body(r#"{"data":[{"aggregation_bits":"0x0d","data":{"slot":"5","index":"0"}}]}"#)
            .create_async()
            .await;

        let client = test_client(&server);
        let result = client.attestations(Slot(5)).await.unwrap();
        let attestations = result.found().unwrap();
        assert_eq!(attestations.len(), 1);
        assert_eq!(attestations[0].aggregation_bits, vec![true, false, true]);
    }
}
