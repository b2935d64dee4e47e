//! Idempotent forward-progress fetchers (spec.md §4.4): one module per
//! beacon feed, each a function of shape `(db_pool, beacon_client) ->
//! Result<()>` that reads a watermark, computes the next target,
//! checks prerequisite flags, fetches, and writes back in a single
//! transaction that also flips the completion flag.
//!
//! None of these return an error for "nothing to do yet" —
//! `PreconditionNotMet` (spec.md §7) is logged at info and the
//! function returns `Ok(())`, to be re-evaluated on the scheduler's
//! next tick. A returned `Err` means upstream-unavailable or
//! data-integrity, which the scheduler's job wrapper logs and moves on
//! from without crashing the process (spec.md §4.6).
pub mod attestation_rewards;
pub mod attestations;
pub mod block_and_sync_rewards;
pub mod committees;
pub mod epoch_creator;
pub mod sync_committees;
pub mod validator_balances;

use crate::chain::{epoch::Epoch, slot::Slot, CHAIN_PROFILE};
use chrono::Utc;

/// The newest slot/epoch it is currently safe to fetch, resolved once
/// per fetcher invocation against "now" (spec.md §4.1).
pub(crate) fn max_slot_to_fetch() -> Slot {
    crate::chain::time::max_slot_to_fetch(Utc::now(), &CHAIN_PROFILE)
}

pub(crate) fn max_epoch_to_fetch() -> Epoch {
    max_slot_to_fetch().epoch(&CHAIN_PROFILE)
}
