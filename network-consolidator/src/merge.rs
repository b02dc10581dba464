//! Folding identical records into one survivor.
//!
//! Used wherever several source records describe the same thing and only
//! differ in fields that can be combined, typically their validity. The
//! caller supplies both the identity test and the fold.

use std::collections::VecDeque;

/// Group `items` by `are_identical` and fold each group into one record.
///
/// The first remaining item becomes the representative of the next group;
/// every later item for which `are_identical(&representative, &item)` holds is
/// removed from the working set and folded in with
/// `merge_into(&mut representative, item)`. Items keep their relative order,
/// both as group representatives and as merge order within a group.
///
/// Groups are produced lazily. The predicate is only ever evaluated against
/// a group's representative, so with a non-transitive predicate the result
/// depends on input order: the grouping is greedy first-fit.
///
/// # Examples
///
/// ```
/// use network_consolidator::merge::group_and_merge;
///
/// let merged: Vec<(char, u32)> = group_and_merge(
///     vec![('a', 1), ('b', 10), ('a', 2)],
///     |x, y| x.0 == y.0,
///     |x, y| x.1 += y.1,
/// )
/// .collect();
///
/// assert_eq!(merged, vec![('a', 3), ('b', 10)]);
/// ```
pub fn group_and_merge<T, F, M>(
    items: Vec<T>,
    are_identical: F,
    merge_into: M,
) -> IdenticalGroups<T, F, M>
where
    F: FnMut(&T, &T) -> bool,
    M: FnMut(&mut T, T),
{
    IdenticalGroups {
        remaining: items.into(),
        are_identical,
        merge_into,
    }
}

/// Iterator returned by [`group_and_merge`].
pub struct IdenticalGroups<T, F, M> {
    remaining: VecDeque<T>,
    are_identical: F,
    merge_into: M,
}

impl<T, F, M> Iterator for IdenticalGroups<T, F, M>
where
    F: FnMut(&T, &T) -> bool,
    M: FnMut(&mut T, T),
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let mut representative = self.remaining.pop_front()?;

        let mut rest = VecDeque::with_capacity(self.remaining.len());
        while let Some(candidate) = self.remaining.pop_front() {
            if (self.are_identical)(&representative, &candidate) {
                (self.merge_into)(&mut representative, candidate);
            } else {
                rest.push_back(candidate);
            }
        }
        self.remaining = rest;

        Some(representative)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.remaining.len();
        (usize::from(len > 0), Some(len))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// With an equivalence relation, one group per distinct key
        #[test]
        fn one_group_per_key(keys in prop::collection::vec(0u8..6, 0..30)) {
            let items: Vec<(u8, usize)> = keys.iter().map(|&k| (k, 1)).collect();

            let groups: Vec<_> =
                group_and_merge(items, |a, b| a.0 == b.0, |a, b| a.1 += b.1).collect();

            let mut distinct = keys.clone();
            distinct.sort();
            distinct.dedup();
            prop_assert_eq!(groups.len(), distinct.len());
            prop_assert_eq!(groups.iter().map(|g| g.1).sum::<usize>(), keys.len());
        }
    }
}
