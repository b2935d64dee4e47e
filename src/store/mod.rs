//! Store gateway (spec.md §3, §4.4's step 5): typed persistence
//! operations over the entities a fetcher or summarizer reads and
//! writes. Every write that also flips a monotonic flag does so in the
//! same transaction as the rows it depends on (spec.md invariant I5),
//! mirroring the teacher's `beacon_chain::states`/`blocks` modules'
//! one-function-per-query shape but keyed to this indexer's own
//! entities rather than the teacher's beacon-state sync model.
pub mod committees;
pub mod daily_stats;
pub mod epoch_rewards_temp;
pub mod epochs;
pub mod hourly_stats;
pub mod slots;
pub mod sync_committees;
pub mod validators;
pub mod watermark;
