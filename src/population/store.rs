//! The live set of individuals: active set, energy, species assignment
//!
//! Every operation leaves the overlay graph and all three indices mutually
//! consistent: an energy or species entry never outlives its individual, and
//! a removed individual leaves no relation edge behind.

use ahash::AHashMap;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::types::{ClassId, IndividualId};
use crate::graph::store::KnowledgeGraph;
use crate::taxonomy::rules::PredationRules;

#[derive(Debug, Default)]
pub struct PopulationStore {
    active: BTreeSet<IndividualId>,
    energy: AHashMap<IndividualId, i32>,
    species_of: AHashMap<IndividualId, ClassId>,
    next_id: u64,
}

impl PopulationStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn active(&self) -> &BTreeSet<IndividualId> {
        &self.active
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn is_active(&self, id: IndividualId) -> bool {
        self.active.contains(&id)
    }

    pub fn species_of(&self, id: IndividualId) -> Option<&ClassId> {
        self.species_of.get(&id)
    }

    /// Replace the whole species assignment (classification pass output)
    pub fn set_species_map(&mut self, species_of: AHashMap<IndividualId, ClassId>) {
        self.species_of = species_of;
    }

    /// Energy of `id`, defaulting to `fallback` for a missing entry
    pub fn energy(&self, id: IndividualId, fallback: i32) -> i32 {
        self.energy.get(&id).copied().unwrap_or(fallback)
    }

    pub fn energy_of(&self, id: IndividualId) -> Option<i32> {
        self.energy.get(&id).copied()
    }

    /// Subtract `cost`, materializing a missing entry at `fallback` first.
    /// No lower clamp: energy may go negative within a step.
    pub fn drain_energy(&mut self, id: IndividualId, cost: i32, fallback: i32) {
        let e = self.energy.entry(id).or_insert(fallback);
        *e -= cost;
    }

    /// Add `gain`, clamped so energy never exceeds `e_max`
    pub fn gain_energy(&mut self, id: IndividualId, gain: i32, e_max: i32, fallback: i32) {
        let e = self.energy.entry(id).or_insert(fallback);
        *e = (*e + gain).min(e_max);
    }

    /// Give every active individual missing an energy entry the initial value
    pub fn ensure_energy(&mut self, e_init: i32) {
        let Self { active, energy, .. } = self;
        for &id in active.iter() {
            energy.entry(id).or_insert(e_init);
        }
    }

    /// Ordered per-species pools of the active population. Individuals
    /// without a species assignment appear in no pool.
    pub fn by_species(&self) -> BTreeMap<ClassId, Vec<IndividualId>> {
        let mut pools: BTreeMap<ClassId, Vec<IndividualId>> = BTreeMap::new();
        for &id in &self.active {
            if let Some(species) = self.species_of.get(&id) {
                pools.entry(species.clone()).or_default().push(id);
            }
        }
        pools
    }

    /// Register a fresh individual with a known species: overlay type
    /// assertion, indices, energy and, when predation rules are already
    /// compiled, its eats edges in both directions against the current
    /// population. With no compiled rules the linking is skipped and left
    /// to the next full rebuild.
    pub fn create(
        &mut self,
        graph: &mut KnowledgeGraph,
        rules: &PredationRules,
        species: &ClassId,
        initial_energy: i32,
    ) -> IndividualId {
        let id = self.allocate_id();
        graph.assert_type(id, species.clone());
        self.active.insert(id);
        self.species_of.insert(id, species.clone());
        self.energy.insert(id, initial_energy);
        if !rules.is_empty() {
            self.link_new_individual(graph, rules, id);
        }
        id
    }

    /// Admit an individual before any classification pass has run: it gets
    /// a type assertion and energy, but no species assignment until the
    /// next pass.
    pub fn admit_unclassified(
        &mut self,
        graph: &mut KnowledgeGraph,
        species: &ClassId,
        initial_energy: i32,
    ) -> IndividualId {
        let id = self.allocate_id();
        graph.assert_type(id, species.clone());
        self.active.insert(id);
        self.energy.insert(id, initial_energy);
        id
    }

    /// Drop `id` from every index and purge every overlay fact touching it.
    /// Safe to call on an already-removed individual.
    pub fn remove(&mut self, graph: &mut KnowledgeGraph, id: IndividualId) {
        self.active.remove(&id);
        self.species_of.remove(&id);
        self.energy.remove(&id);
        graph.retract_all(id);
    }

    /// Full recomputation of the eats edges: stale edges cleared, then one
    /// edge per (active predator, active member of one of its prey species).
    pub fn rebuild_eats_edges(&self, graph: &mut KnowledgeGraph, rules: &PredationRules) {
        graph.remove_stale_eats_edges(&self.active);
        for &predator in &self.active {
            let species = match self.species_of.get(&predator) {
                Some(s) => s,
                None => continue,
            };
            let prey_species = match rules.get(species) {
                Some(p) => p,
                None => continue,
            };
            for &other in &self.active {
                if predator == other {
                    continue;
                }
                if let Some(other_species) = self.species_of.get(&other) {
                    if prey_species.contains(other_species) {
                        graph.add_eats_edge(predator, other);
                    }
                }
            }
        }
    }

    fn allocate_id(&mut self) -> IndividualId {
        let id = IndividualId(self.next_id);
        self.next_id += 1;
        id
    }

    fn link_new_individual(
        &mut self,
        graph: &mut KnowledgeGraph,
        rules: &PredationRules,
        id: IndividualId,
    ) {
        let species = match self.species_of.get(&id) {
            Some(s) => s,
            None => return,
        };
        let own_prey = rules.get(species).map(Vec::as_slice).unwrap_or(&[]);

        for &other in &self.active {
            if other == id {
                continue;
            }
            let other_species = match self.species_of.get(&other) {
                Some(s) => s,
                None => continue,
            };
            // the newcomer as predator
            if own_prey.contains(other_species) {
                graph.add_eats_edge(id, other);
            }
            // the newcomer as prey
            if rules
                .get(other_species)
                .map(|p| p.contains(species))
                .unwrap_or(false)
            {
                graph.add_eats_edge(other, id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lion_rules() -> PredationRules {
        let mut rules = PredationRules::new();
        rules.insert(ClassId::from("Lion"), vec![ClassId::from("Impala")]);
        rules.insert(ClassId::from("Impala"), vec![]);
        rules
    }

    #[test]
    fn test_create_materializes_edges_both_directions() {
        let mut graph = KnowledgeGraph::new();
        let mut pop = PopulationStore::new();
        let rules = lion_rules();

        let impala = pop.create(&mut graph, &rules, &ClassId::from("Impala"), 6);
        let lion = pop.create(&mut graph, &rules, &ClassId::from("Lion"), 6);

        let edges: Vec<_> = graph.eats_pairs().collect();
        assert_eq!(edges, vec![(lion, impala)]);

        // a second impala becomes prey of the existing lion
        let impala2 = pop.create(&mut graph, &rules, &ClassId::from("Impala"), 6);
        assert!(graph.eats_pairs().any(|e| e == (lion, impala2)));
    }

    #[test]
    fn test_create_without_rules_skips_linking() {
        let mut graph = KnowledgeGraph::new();
        let mut pop = PopulationStore::new();
        let rules = PredationRules::new();

        pop.create(&mut graph, &rules, &ClassId::from("Impala"), 6);
        pop.create(&mut graph, &rules, &ClassId::from("Lion"), 6);
        assert_eq!(graph.eats_pairs().count(), 0);
    }

    #[test]
    fn test_remove_leaves_no_dangling_state() {
        let mut graph = KnowledgeGraph::new();
        let mut pop = PopulationStore::new();
        let rules = lion_rules();

        let impala = pop.create(&mut graph, &rules, &ClassId::from("Impala"), 6);
        let lion = pop.create(&mut graph, &rules, &ClassId::from("Lion"), 6);

        pop.remove(&mut graph, impala);

        assert!(!pop.is_active(impala));
        assert_eq!(pop.species_of(impala), None);
        assert_eq!(pop.energy_of(impala), None);
        assert!(graph.eats_pairs().all(|(s, o)| s != impala && o != impala));
        assert!(pop.is_active(lion));

        // removing again is a no-op
        pop.remove(&mut graph, impala);
    }

    #[test]
    fn test_rebuild_clears_stale_edges() {
        let mut graph = KnowledgeGraph::new();
        let mut pop = PopulationStore::new();
        let rules = lion_rules();

        let impala = pop.create(&mut graph, &rules, &ClassId::from("Impala"), 6);
        let lion = pop.create(&mut graph, &rules, &ClassId::from("Lion"), 6);

        // simulate an edge left behind by an out-of-band removal
        graph.add_eats_edge(lion, IndividualId(999));
        pop.rebuild_eats_edges(&mut graph, &rules);

        let edges: Vec<_> = graph.eats_pairs().collect();
        assert_eq!(edges, vec![(lion, impala)]);
    }

    #[test]
    fn test_energy_gain_is_clamped() {
        let mut graph = KnowledgeGraph::new();
        let mut pop = PopulationStore::new();
        let rules = PredationRules::new();

        let id = pop.create(&mut graph, &rules, &ClassId::from("Impala"), 8);
        pop.gain_energy(id, 5, 10, 6);
        assert_eq!(pop.energy_of(id), Some(10));

        pop.drain_energy(id, 12, 6);
        assert_eq!(pop.energy_of(id), Some(-2));
    }

    #[test]
    fn test_unclassified_individuals_join_no_pool() {
        let mut graph = KnowledgeGraph::new();
        let mut pop = PopulationStore::new();

        pop.admit_unclassified(&mut graph, &ClassId::from("Mystery"), 6);
        assert_eq!(pop.len(), 1);
        assert!(pop.by_species().is_empty());
    }
}
