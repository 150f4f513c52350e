//! Batch deductive closure over merged base and overlay facts
//!
//! Produces a `ReasonedView`: the subclass hierarchy with reflexive self
//! edges materialized, and the full entailed type set of every individual
//! (each asserted type plus all of its superclasses). Expensive by contract;
//! call it only through the `ReasonerCache`.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::types::{ClassId, IndividualId};
use crate::graph::store::KnowledgeGraph;

/// Fully expanded view of the merged graph
#[derive(Debug, Clone, Default)]
pub struct ReasonedView {
    superclasses: BTreeMap<ClassId, BTreeSet<ClassId>>,
    entailed_types: BTreeMap<IndividualId, Vec<ClassId>>,
}

impl ReasonedView {
    /// Direct superclasses of `class`, including its materialized self edge
    pub fn superclasses_of(&self, class: &ClassId) -> impl Iterator<Item = &ClassId> {
        self.superclasses.get(class).into_iter().flatten()
    }

    /// Entailed types of `id`, sorted and deduplicated.
    ///
    /// The sorted order is what makes the most-specific tie-break
    /// deterministic downstream.
    pub fn types_of(&self, id: IndividualId) -> &[ClassId] {
        self.entailed_types
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Expand base + overlay into a `ReasonedView`
pub fn expand_closure(graph: &KnowledgeGraph) -> ReasonedView {
    // Every class gains a reflexive self edge on top of its direct edges,
    // so reachability over the view finds a class as its own ancestor.
    let mut superclasses: BTreeMap<ClassId, BTreeSet<ClassId>> = BTreeMap::new();
    for class in graph.classes() {
        let entry = superclasses.entry(class.clone()).or_default();
        entry.insert(class.clone());
        entry.extend(graph.superclasses_of(class).cloned());
    }

    // Type propagation: an individual typed C is also typed every class
    // reachable from C over the base hierarchy.
    let mut entailed_types: BTreeMap<IndividualId, Vec<ClassId>> = BTreeMap::new();
    for id in graph.individuals() {
        let mut seen: BTreeSet<ClassId> = BTreeSet::new();
        for asserted in graph.types_of(id) {
            let mut stack = vec![asserted.clone()];
            while let Some(class) = stack.pop() {
                if !seen.insert(class.clone()) {
                    continue;
                }
                for sup in graph.superclasses_of(&class) {
                    if !seen.contains(sup) {
                        stack.push(sup.clone());
                    }
                }
            }
        }
        entailed_types.insert(id, seen.into_iter().collect());
    }

    ReasonedView {
        superclasses,
        entailed_types,
    }
}
