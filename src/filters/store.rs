//! Process-wide active filter set.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::filters::FilterSet;
use crate::observability::metrics;

/// Holds the active [`FilterSet`] behind an atomically swappable pointer.
///
/// Readers take a snapshot with [`FilterStore::snapshot`] and keep it for the
/// whole classification; a concurrent [`FilterStore::replace`] only affects
/// later snapshots.
#[derive(Debug)]
pub struct FilterStore {
    current: ArcSwap<FilterSet>,
}

impl FilterStore {
    pub fn new(initial: FilterSet) -> Self {
        metrics::record_active_filters(initial.len());
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<FilterSet> {
        self.current.load_full()
    }

    /// Swap in a new set, returning the previous one.
    pub fn replace(&self, next: FilterSet) -> Arc<FilterSet> {
        let count = next.len();
        let previous = self.current.swap(Arc::new(next));
        metrics::record_active_filters(count);
        tracing::info!(previous = previous.len(), active = count, "Filter set replaced");
        previous
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new(FilterSet::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::AgentFilter;

    fn set_of(names: &[&str]) -> FilterSet {
        FilterSet::new(
            names
                .iter()
                .map(|n| AgentFilter::new(*n, vec![], vec![n.to_string()], vec![]).unwrap())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let store = FilterStore::new(set_of(&["openai", "google"]));
        let before = store.snapshot();

        let previous = store.replace(set_of(&["bing"]));

        assert_eq!(before.len(), 2);
        assert_eq!(previous.len(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot().filters()[0].name(), "bing");
    }

    #[test]
    fn test_concurrent_readers_see_whole_sets() {
        let store = Arc::new(FilterStore::new(set_of(&["a", "b", "c"])));
        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    if i % 2 == 0 {
                        store.replace(set_of(&["x"]));
                    } else {
                        store.replace(set_of(&["a", "b", "c"]));
                    }
                }
            })
        };

        for _ in 0..2000 {
            let snap = store.snapshot();
            let names: Vec<_> = snap.filters().iter().map(|f| f.name().to_string()).collect();
            assert!(names == ["x"] || names == ["a", "b", "c"], "partial set observed: {:?}", names);
        }
        writer.join().unwrap();
    }
}
