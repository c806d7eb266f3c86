//! Typed identity access for entities.
//!
//! Entities expose their identifier through `Identified` so callers can
//! gather and index ids without reflection or per-type helpers.

use std::collections::HashMap;
use std::hash::Hash;

/// Entity marker + minimal interface.
pub trait Identified {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + Hash + core::fmt::Debug;

    fn id(&self) -> Self::Id;
}

/// Collect the distinct ids of a slice of entities, preserving first-seen
/// order.
pub fn collect_ids<T: Identified>(items: &[T]) -> Vec<T::Id> {
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        if seen.insert(item.id()) {
            ids.push(item.id());
        }
    }
    ids
}

/// Index entities by id for O(1) joins in memory.
pub fn index_by<T: Identified>(items: &[T]) -> HashMap<T::Id, &T> {
    items.iter().map(|item| (item.id(), item)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Thing {
        id: u32,
    }

    impl Identified for Thing {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }
    }

    #[test]
    fn collect_ids_dedups_preserving_order() {
        let things = [Thing { id: 2 }, Thing { id: 1 }, Thing { id: 2 }];
        assert_eq!(collect_ids(&things), vec![2, 1]);
    }

    #[test]
    fn index_by_maps_id_to_entity() {
        let things = [Thing { id: 7 }];
        let index = index_by(&things);
        assert_eq!(index[&7].id, 7);
    }
}
