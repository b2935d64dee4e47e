//! The error taxonomy a fetcher or summarizer can surface.
//!
//! `ConfigInvalid` has no variant here: config is validated once, at
//! startup, in [`crate::env`], and a bad value panics before the
//! scheduler is ever constructed — there is no runtime path that
//! produces it.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    /// The upstream beacon node returned a transient failure (5xx,
    /// network error, timeout) and every retry was exhausted. The
    /// scheduled job logs this and tries again next tick.
    #[error("upstream beacon node unavailable: {0}")]
    UpstreamUnavailable(#[source] anyhow::Error),

    /// A prerequisite for this unit of work has not yet been met —
    /// committees not fetched for the epoch, the slot is too close to
    /// head, fewer than 24h of hourly stats have accumulated, etc.
    /// Not a failure: the job returns successfully and is re-evaluated
    /// on the next tick.
    #[error("precondition not met: {0}")]
    PreconditionNotMet(String),

    /// Something the store gateway expected to find was absent, or a
    /// bulk write affected zero rows when at least one was expected.
    /// Surfaced as an error; no watermark advances.
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),
}

pub type IndexerResult<T> = Result<T, IndexerError>;
