//! Reasoning cache with the dirty-flag / freeze protocol
//!
//! Full closure recomputation is expensive. Classification happens once per
//! run start and once per manual relink, never per step: during an active
//! run the cached view is reused unconditionally, a deliberate staleness
//! window rather than a synchronization device.

use crate::graph::closure::{expand_closure, ReasonedView};
use crate::graph::store::KnowledgeGraph;

#[derive(Debug, Default)]
pub struct ReasonerCache {
    cache: Option<ReasonedView>,
    dirty: bool,
}

impl ReasonerCache {
    pub fn new() -> Self {
        Self {
            cache: None,
            dirty: true,
        }
    }

    /// Flag the cached view as out of date. While the reasoner is frozen
    /// this only schedules a recomputation for after the run.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return the reasoned view of `graph`.
    ///
    /// With `frozen` set, the cached view is reused unconditionally and only
    /// computed on first use. Otherwise a dirty cache is recomputed and the
    /// flag cleared.
    pub fn reasoned_view(&mut self, graph: &KnowledgeGraph, frozen: bool) -> &ReasonedView {
        if self.dirty && !frozen {
            self.cache = None;
        }
        let Self { cache, dirty } = self;
        cache.get_or_insert_with(|| {
            *dirty = false;
            expand_closure(graph)
        })
    }
}
