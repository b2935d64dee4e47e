//! Hourly and daily summarization (spec.md §4.5): both read their own
//! watermark, verify upstream flags have advanced past the window
//! under summary, aggregate, and advance the watermark inside the same
//! transaction as the rows it gates (invariant I5).
pub mod daily;
pub mod hourly;
