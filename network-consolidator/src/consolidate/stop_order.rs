//! A single stop order per route.
//!
//! Each trip only knows its own stop sequence. Timetables list a route's
//! stops once, in an order consistent with every trip, so the sequences are
//! folded into one running order.

use std::collections::BTreeMap;

use crate::domain::{LineNumber, StopKey, Trip};
use crate::pipeline::NetworkDatabase;

/// Fold stop sequences into one global order.
///
/// Stops already in the order keep their relative positions. Stops new to
/// the order are inserted just before the next stop the sequence shares
/// with it, or appended if there is none. A sequence visiting shared stops
/// in a different order than the running order does not reorder them.
///
/// # Examples
///
/// ```
/// use network_consolidator::consolidate::global_stop_order;
/// use network_consolidator::domain::StopKey;
///
/// let s = |n| StopKey::new(n, 1);
/// let order = global_stop_order([
///     vec![s(1), s(3), s(4)],
///     vec![s(1), s(2), s(3)],
///     vec![s(4), s(5)],
/// ]);
/// assert_eq!(order, vec![s(1), s(2), s(3), s(4), s(5)]);
/// ```
pub fn global_stop_order<I, S>(sequences: I) -> Vec<StopKey>
where
    I: IntoIterator<Item = S>,
    S: IntoIterator<Item = StopKey>,
{
    let mut order: Vec<StopKey> = Vec::new();

    for sequence in sequences {
        let mut to_insert: Vec<StopKey> = sequence.into_iter().collect();
        let mut merged = Vec::with_capacity(order.len() + to_insert.len());

        for &stop in &order {
            match to_insert.iter().position(|&s| s == stop) {
                Some(pos) => {
                    // Everything before the shared stop goes in front of it,
                    // except stops the order already places later.
                    for s in to_insert.drain(..=pos) {
                        if s == stop || !order.contains(&s) {
                            merged.push(s);
                        }
                    }
                }
                None => merged.push(stop),
            }
        }

        merged.extend(to_insert);
        order = merged;
    }

    order
}

/// Global stop order of every route, from its stored trips.
///
/// Trips are folded in key order so the result does not depend on storage
/// order.
pub fn route_stop_orders(db: &NetworkDatabase) -> BTreeMap<LineNumber, Vec<StopKey>> {
    let mut by_route: BTreeMap<LineNumber, Vec<&Trip>> = BTreeMap::new();
    for (_, versions) in db.trips.iter() {
        for version in versions {
            by_route
                .entry(version.value.route)
                .or_default()
                .push(&version.value);
        }
    }

    by_route
        .into_iter()
        .map(|(line, mut trips)| {
            trips.sort_by_key(|t| t.key);
            let order = global_stop_order(trips.iter().map(|t| t.stop_keys()));
            (line, order)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(n: u32) -> StopKey {
        StopKey::new(n, 1)
    }

    #[test]
    fn single_sequence_is_kept() {
        assert_eq!(global_stop_order([vec![s(3), s(1), s(2)]]), vec![s(3), s(1), s(2)]);
    }

    #[test]
    fn empty_input() {
        assert!(global_stop_order(Vec::<Vec<StopKey>>::new()).is_empty());
    }

    #[test]
    fn new_stops_go_before_next_shared_stop() {
        let order = global_stop_order([vec![s(1), s(4)], vec![s(1), s(2), s(3), s(4)]]);
        assert_eq!(order, vec![s(1), s(2), s(3), s(4)]);
    }

    #[test]
    fn branch_stops_are_appended() {
        let order = global_stop_order([vec![s(1), s(2)], vec![s(2), s(7), s(8)]]);
        assert_eq!(order, vec![s(1), s(2), s(7), s(8)]);
    }

    #[test]
    fn disjoint_sequence_goes_after() {
        let order = global_stop_order([vec![s(1), s(2)], vec![s(5), s(6)]]);
        assert_eq!(order, vec![s(1), s(2), s(5), s(6)]);
    }

    #[test]
    fn contradicting_sequence_keeps_existing_order() {
        let order = global_stop_order([vec![s(1), s(2), s(3)], vec![s(3), s(2), s(1)]]);
        assert_eq!(order, vec![s(1), s(2), s(3)]);
    }

    #[test]
    fn loop_visits_stay() {
        let order = global_stop_order([vec![s(1), s(2), s(1)], vec![s(1), s(2)]]);
        assert_eq!(order, vec![s(1), s(2), s(1)]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn sequences() -> impl Strategy<Value = Vec<Vec<StopKey>>> {
        let sequence = prop::collection::hash_set(0u32..12, 0..8)
            .prop_map(|set| set.into_iter().map(|n| StopKey::new(n, 1)).collect::<Vec<_>>());
        prop::collection::vec(sequence, 0..6)
    }

    proptest! {
        /// Every stop appears exactly once when no sequence repeats a stop
        #[test]
        fn every_stop_once(seqs in sequences()) {
            let order = global_stop_order(seqs.clone());
            let mut expected: Vec<StopKey> = seqs.iter().flatten().copied().collect();
            expected.sort();
            expected.dedup();
            let mut got = order.clone();
            got.sort();
            prop_assert_eq!(got, expected);
        }

        /// Folding one more sequence never reorders stops already placed
        #[test]
        fn existing_order_is_stable(seqs in sequences()) {
            let mut order: Vec<StopKey> = Vec::new();
            for seq in seqs {
                let next = global_stop_order([order.clone(), seq]);
                let kept: Vec<StopKey> = next.iter().copied().filter(|s| order.contains(s)).collect();
                prop_assert_eq!(&kept, &order);
                order = next;
            }
        }
    }
}
