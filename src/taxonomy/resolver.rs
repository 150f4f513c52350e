//! Most-specific species resolution over the reasoned taxonomy

use ahash::AHashMap;
use std::collections::BTreeSet;

use crate::core::types::{ClassId, IndividualId, SpeciesTraits};
use crate::graph::closure::ReasonedView;
use crate::graph::store::{KnowledgeGraph, RestrictionRule};
use crate::taxonomy::rules::{compile_predation_rules, PredationRules};
use crate::taxonomy::{BIOLOGICAL_SPECIES, CARNIVORE, HERBIVORE, PLANT};

/// Reachability test over the subclass relation of the reasoned view.
///
/// Iterative with a visited set, so cycles terminate. Not reflexive on the
/// starting node unless the graph carries an explicit self edge; the
/// reasoned view materializes one per class, so over a reasoned view every
/// class counts as its own ancestor.
pub fn is_subclass_of(view: &ReasonedView, class: &ClassId, ancestor: &ClassId) -> bool {
    let mut visited: BTreeSet<&ClassId> = BTreeSet::new();
    visited.insert(class);
    let mut stack = vec![class];
    while let Some(c) = stack.pop() {
        for sup in view.superclasses_of(c) {
            if sup == ancestor {
                return true;
            }
            if visited.insert(sup) {
                stack.push(sup);
            }
        }
    }
    false
}

/// Number of distinct superclasses reachable from `class`.
///
/// A proxy for specificity, not true taxonomic depth when the hierarchy is
/// not a tree. Every class in a reasoned view also reaches itself through
/// its self edge, which cancels out in comparisons.
pub fn class_depth(view: &ReasonedView, class: &ClassId) -> usize {
    let mut seen: BTreeSet<&ClassId> = BTreeSet::new();
    let mut stack = vec![class];
    while let Some(c) = stack.pop() {
        for sup in view.superclasses_of(c) {
            if seen.insert(sup) {
                stack.push(sup);
            }
        }
    }
    seen.len()
}

/// The most-specific species class of `id`: the deepest entailed type under
/// one of the species roots, or `None` if no type qualifies.
///
/// Ties on depth keep the first candidate in the (sorted) entailed-type
/// enumeration, i.e. the lexicographically smallest among the deepest.
pub fn most_specific_species(view: &ReasonedView, id: IndividualId) -> Option<ClassId> {
    let bio = ClassId::new(BIOLOGICAL_SPECIES);
    let plant = ClassId::new(PLANT);

    let mut best: Option<(&ClassId, usize)> = None;
    for candidate in view.types_of(id) {
        if !is_subclass_of(view, candidate, &bio) && !is_subclass_of(view, candidate, &plant) {
            continue;
        }
        let depth = class_depth(view, candidate);
        match best {
            Some((_, d)) if depth <= d => {}
            _ => best = Some((candidate, depth)),
        }
    }
    best.map(|(class, _)| class.clone())
}

/// Every class in the base taxonomy that is (reflexively) under one of the
/// species roots, sorted. This is the catalogue of admissible species.
pub fn list_species(graph: &KnowledgeGraph) -> Vec<ClassId> {
    let bio = ClassId::new(BIOLOGICAL_SPECIES);
    let plant = ClassId::new(PLANT);
    graph
        .classes()
        .filter(|class| {
            **class == bio
                || **class == plant
                || graph.is_subclass_of(class, &bio)
                || graph.is_subclass_of(class, &plant)
        })
        .cloned()
        .collect()
}

/// Feeding traits of one species, derived from the trait classes
pub fn species_traits(view: &ReasonedView, species: &ClassId) -> SpeciesTraits {
    SpeciesTraits {
        is_plant: is_subclass_of(view, species, &ClassId::new(PLANT)),
        is_herbivore: is_subclass_of(view, species, &ClassId::new(HERBIVORE)),
        is_carnivore: is_subclass_of(view, species, &ClassId::new(CARNIVORE)),
    }
}

/// Per-species knowledge derived by one classification pass
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub traits: AHashMap<ClassId, SpeciesTraits>,
    pub prey: PredationRules,
}

impl Classification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Traits of `species`; unclassified species have no traits at all
    pub fn traits_of(&self, species: &ClassId) -> SpeciesTraits {
        self.traits.get(species).copied().unwrap_or_default()
    }

    /// Compiled prey species of `species`, sorted and deduplicated
    pub fn prey_of(&self, species: &ClassId) -> &[ClassId] {
        self.prey.get(species).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn species(&self) -> impl Iterator<Item = &ClassId> {
        self.traits.keys()
    }
}

/// One classification pass over the active population.
///
/// Returns the individual-to-species assignment plus the derived per-species
/// traits and predation rules. Individuals with no qualifying type are left
/// out of the assignment: they stay active but join no species-keyed
/// computation.
pub fn classify_population(
    view: &ReasonedView,
    rules: &[RestrictionRule],
    active: &BTreeSet<IndividualId>,
) -> (AHashMap<IndividualId, ClassId>, Classification) {
    let mut species_of: AHashMap<IndividualId, ClassId> = AHashMap::new();
    for &id in active {
        if let Some(species) = most_specific_species(view, id) {
            species_of.insert(id, species);
        }
    }

    let present: BTreeSet<ClassId> = species_of.values().cloned().collect();

    let mut traits: AHashMap<ClassId, SpeciesTraits> = AHashMap::new();
    for species in &present {
        traits.insert(species.clone(), species_traits(view, species));
    }

    let prey = compile_predation_rules(view, rules, &present);

    (species_of, Classification { traits, prey })
}
