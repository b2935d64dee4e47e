//! Priority selection (spec.md §4.2, "Priority selection").
//!
//! Pure functions so they're trivial to unit test in isolation from
//! any actual HTTP dispatch; [`crate::beacon_client`] calls these to
//! resolve a caller's preferred pool into the pool it will actually
//! dispatch on.
use crate::chain::slot::Slot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pool {
    Full,
    Archive,
}

/// Slots of lag behind head past which the full node is assumed not
/// to hold the requested state any more (spec.md §4.2,
/// "indexer-is-delayed").
const DELAYED_INDEXER_THRESHOLD_SLOTS: i32 = 250;

/// Slots from head within which an attestation's body is still
/// volatile on the full node and should be read from archive instead
/// (spec.md §4.2, "head-proximity").
const ATTESTATION_HEAD_PROXIMITY_SLOTS: i32 = 5;

/// Resolves a caller's preferred pool against the two override
/// heuristics. `requested_slot` is the slot (or the last slot of the
/// epoch, for epoch-addressed calls) the request concerns;
/// `head_slot` is the chain head at resolution time.
pub fn resolve_pool(
    preferred: Pool,
    requested_slot: Slot,
    head_slot: Slot,
    is_attestation_request: bool,
) -> Pool {
    let lag = head_slot.0 - requested_slot.0;

    if lag > DELAYED_INDEXER_THRESHOLD_SLOTS {
        return Pool::Archive;
    }

    if is_attestation_request {
        return if lag <= ATTESTATION_HEAD_PROXIMITY_SLOTS {
            Pool::Archive
        } else {
            Pool::Full
        };
    }

    preferred
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delayed_indexer_forces_archive_test() {
        let resolved = resolve_pool(Pool::Full, Slot(100), Slot(100 + 251), false);
        assert_eq!(resolved, Pool::Archive);
    }

    #[test]
    fn not_delayed_keeps_preferred_test() {
        let resolved = resolve_pool(Pool::Full, Slot(100), Slot(100 + 10), false);
        assert_eq!(resolved, Pool::Full);
    }

    #[test]
    fn attestation_near_head_uses_archive_test() {
        // spec.md concrete scenario 3: head-3 uses archive.
        let head = Slot(1000);
        let resolved = resolve_pool(Pool::Full, head - 3, head, true);
        assert_eq!(resolved, Pool::Archive);
    }

    #[test]
    fn attestation_away_from_head_uses_full_test() {
        // spec.md concrete scenario 3: head-6 uses full.
        let head = Slot(1000);
        let resolved = resolve_pool(Pool::Archive, head - 6, head, true);
        assert_eq!(resolved, Pool::Full);
    }
}
