//! Victim selection for capacity eviction
//!
//! Kept as a pure function over the store's entries so the ordering can be
//! tested without a store instance.

use chrono::{DateTime, Utc};

use aether_core::BundleId;

use crate::memory::StoredBundle;

/// Eviction preference class, lower evicts first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum VictimClass {
    /// Past its lifetime, worthless regardless of status
    PastLifetime,
    /// Terminal status: delivered, failed, or marked expired
    Terminal,
    /// Still pending or in transit
    InFlight,
}

fn classify(stored: &StoredBundle, now: DateTime<Utc>) -> VictimClass {
    if stored.bundle.is_expired(now) {
        VictimClass::PastLifetime
    } else if stored.status.is_terminal() {
        VictimClass::Terminal
    } else {
        VictimClass::InFlight
    }
}

/// Choose the next bundle to evict, or `None` if the store is empty
///
/// Within a class, the lowest-priority bundle goes first; among equals, the
/// oldest by creation time; the ID breaks any remaining tie so the choice is
/// deterministic.
pub(crate) fn select_victim<'a>(
    entries: impl Iterator<Item = (&'a BundleId, &'a StoredBundle)>,
    now: DateTime<Utc>,
) -> Option<BundleId> {
    entries
        .min_by_key(|(id, stored)| {
            (
                classify(stored, now),
                stored.bundle.priority,
                stored.bundle.created_at,
                **id,
            )
        })
        .map(|(id, _)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use aether_core::{Bundle, BundleStatus, Priority};

    fn stored(priority: Priority, status: BundleStatus, lifetime: Duration) -> StoredBundle {
        let mut bundle =
            Bundle::with_priority("dtn://a", "dtn://b", b"x".to_vec(), priority);
        bundle.set_lifetime(lifetime);
        StoredBundle {
            bundle,
            status,
            stored_at: Utc::now(),
        }
    }

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn expired_bundle_evicted_before_terminal() {
        let now = Utc::now() + chrono::Duration::seconds(10);
        let mut map = HashMap::new();
        let past = stored(Priority::Expedited, BundleStatus::Pending, Duration::from_secs(1));
        let past_id = past.bundle.id;
        map.insert(past_id, past);
        map.insert(
            BundleId::generate(),
            stored(Priority::Bulk, BundleStatus::Delivered, HOUR),
        );

        assert_eq!(select_victim(map.iter(), now), Some(past_id));
    }

    #[test]
    fn terminal_evicted_before_in_flight() {
        let now = Utc::now();
        let mut map = HashMap::new();
        let delivered = stored(Priority::Expedited, BundleStatus::Delivered, HOUR);
        let delivered_id = delivered.bundle.id;
        map.insert(delivered_id, delivered);
        map.insert(
            BundleId::generate(),
            stored(Priority::Bulk, BundleStatus::Pending, HOUR),
        );
        map.insert(
            BundleId::generate(),
            stored(Priority::Bulk, BundleStatus::InTransit, HOUR),
        );

        assert_eq!(select_victim(map.iter(), now), Some(delivered_id));
    }

    #[test]
    fn lowest_priority_in_flight_goes_first() {
        let now = Utc::now();
        let mut map = HashMap::new();
        let bulk = stored(Priority::Bulk, BundleStatus::Pending, HOUR);
        let bulk_id = bulk.bundle.id;
        map.insert(bulk_id, bulk);
        map.insert(
            BundleId::generate(),
            stored(Priority::Expedited, BundleStatus::Pending, HOUR),
        );
        map.insert(
            BundleId::generate(),
            stored(Priority::Normal, BundleStatus::InTransit, HOUR),
        );

        assert_eq!(select_victim(map.iter(), now), Some(bulk_id));
    }

    #[test]
    fn oldest_breaks_priority_tie() {
        let now = Utc::now();
        let mut older = stored(Priority::Normal, BundleStatus::Pending, HOUR);
        older.bundle.created_at = now - chrono::Duration::hours(2);
        // Keep it unexpired despite the backdated creation time.
        older.bundle.set_lifetime(Duration::from_secs(4 * 3600));
        let older_id = older.bundle.id;

        let mut map = HashMap::new();
        map.insert(older_id, older);
        map.insert(
            BundleId::generate(),
            stored(Priority::Normal, BundleStatus::Pending, HOUR),
        );

        assert_eq!(select_victim(map.iter(), now), Some(older_id));
    }

    #[test]
    fn empty_store_has_no_victim() {
        let map: HashMap<BundleId, StoredBundle> = HashMap::new();
        assert_eq!(select_victim(map.iter(), Utc::now()), None);
    }
}
