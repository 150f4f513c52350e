//! Class-level predation rules compiled to per-species prey lists

use ahash::AHashMap;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::types::ClassId;
use crate::graph::closure::ReasonedView;
use crate::graph::store::{KnowledgeGraph, RestrictionRule};
use crate::taxonomy::resolver::is_subclass_of;

/// Predator species mapped to its sorted, deduplicated prey species
pub type PredationRules = BTreeMap<ClassId, Vec<ClassId>>;

/// Cache of the class-level eats restrictions.
///
/// The base taxonomy never changes, so the structural query runs at most
/// once per cache instance.
#[derive(Debug, Default)]
pub struct EatsRulesCache {
    rules: Option<Vec<RestrictionRule>>,
}

impl EatsRulesCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class_level_rules(&mut self, graph: &KnowledgeGraph) -> &[RestrictionRule] {
        self.rules
            .get_or_insert_with(|| graph.class_restriction_rules().to_vec())
    }
}

/// Memoized subclass test for the duration of one compilation pass.
/// The same (species, class) pair recurs across the species x rules grid.
struct SubclassMemo<'a> {
    view: &'a ReasonedView,
    hits: AHashMap<(ClassId, ClassId), bool>,
}

impl<'a> SubclassMemo<'a> {
    fn new(view: &'a ReasonedView) -> Self {
        Self {
            view,
            hits: AHashMap::new(),
        }
    }

    fn is_sub(&mut self, class: &ClassId, ancestor: &ClassId) -> bool {
        let key = (class.clone(), ancestor.clone());
        if let Some(&hit) = self.hits.get(&key) {
            return hit;
        }
        let result = is_subclass_of(self.view, class, ancestor);
        self.hits.insert(key, result);
        result
    }
}

/// Derive, for each species present, the prey species licensed by the
/// class-level restrictions: every other present species that falls under
/// the prey class of a rule whose predator class the species falls under.
/// A species never lists itself as prey.
pub fn compile_predation_rules(
    view: &ReasonedView,
    rules: &[RestrictionRule],
    present: &BTreeSet<ClassId>,
) -> PredationRules {
    let mut memo = SubclassMemo::new(view);
    let mut compiled = PredationRules::new();

    for predator in present {
        let mut prey: BTreeSet<ClassId> = BTreeSet::new();
        for (predator_class, prey_class) in rules {
            if !memo.is_sub(predator, predator_class) {
                continue;
            }
            for candidate in present {
                if candidate == predator {
                    continue;
                }
                if memo.is_sub(candidate, prey_class) {
                    prey.insert(candidate.clone());
                }
            }
        }
        compiled.insert(predator.clone(), prey.into_iter().collect());
    }

    compiled
}
