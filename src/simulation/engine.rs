//! The stochastic five-phase simulation step
//!
//! Phase order is part of the contract: maintenance cost, foraging,
//! hunting, starvation, reproduction. Every phase iterates snapshots taken
//! up front: the population mutates mid-phase, never the container being
//! iterated. All randomness comes from the one seeded generator owned by
//! the ecosystem.

use ahash::AHashSet;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

use crate::core::config::SimulationParams;
use crate::core::types::{ClassId, IndividualId};
use crate::graph::store::KnowledgeGraph;
use crate::population::PopulationStore;
use crate::simulation::state::SimulationState;
use crate::simulation::Ecosystem;
use crate::taxonomy::resolver::Classification;

/// Half-saturation constant of the herbivore foraging response: the
/// per-herbivore feeding probability is plants / (plants + H).
const HALF_SATURATION: f64 = 5.0;

/// Advance the ecosystem by one step
pub fn run_step(eco: &mut Ecosystem) {
    let Ecosystem {
        graph,
        population,
        classification,
        state,
        params,
        rng,
        ..
    } = eco;

    let mut fed: AHashSet<IndividualId> = AHashSet::new();

    maintenance_phase(population, classification, params);
    foraging_phase(population, graph, classification, params, rng, &mut fed);
    hunting_phase(population, graph, classification, params, rng, &mut fed);
    starvation_phase(population, graph, classification, params);
    reproduction_phase(population, graph, classification, state, params, rng, &fed);
}

/// Phase 1: every active non-plant pays the maintenance cost.
/// No clamp at zero: the starvation phase settles the bill.
fn maintenance_phase(
    population: &mut PopulationStore,
    classification: &Classification,
    params: &SimulationParams,
) {
    let ids: Vec<IndividualId> = population.active().iter().copied().collect();
    for id in ids {
        let is_plant = population
            .species_of(id)
            .map(|sp| classification.traits_of(sp).is_plant)
            .unwrap_or(false);
        if is_plant {
            continue;
        }
        population.drain_energy(id, params.cost_step, params.e_init);
    }
}

/// Phase 2: herbivores browse the shared plant pool.
///
/// Herbivores are shuffled, then each draws one density-dependent Bernoulli
/// trial while plants remain; a success removes one individual of a
/// uniformly chosen plant species and feeds the herbivore.
fn foraging_phase(
    population: &mut PopulationStore,
    graph: &mut KnowledgeGraph,
    classification: &Classification,
    params: &SimulationParams,
    rng: &mut ChaCha8Rng,
    fed: &mut AHashSet<IndividualId>,
) {
    let pools = population.by_species();

    let mut plant_pools: BTreeMap<ClassId, Vec<IndividualId>> = BTreeMap::new();
    for (species, members) in &pools {
        if classification.traits_of(species).is_plant {
            plant_pools.insert(species.clone(), members.clone());
        }
    }
    let mut total_plants: usize = plant_pools.values().map(Vec::len).sum();

    let mut herbivores: Vec<IndividualId> = Vec::new();
    for (species, members) in &pools {
        let traits = classification.traits_of(species);
        if traits.is_herbivore && !traits.is_carnivore {
            herbivores.extend(members.iter().copied());
        }
    }
    herbivores.shuffle(rng);

    for herbivore in herbivores {
        if total_plants == 0 {
            break;
        }
        let p_feed = (total_plants as f64 / (total_plants as f64 + HALF_SATURATION)).min(1.0);
        if rng.gen::<f64>() >= p_feed {
            continue;
        }

        let available: Vec<ClassId> = plant_pools
            .iter()
            .filter(|(_, members)| !members.is_empty())
            .map(|(species, _)| species.clone())
            .collect();
        if available.is_empty() {
            break;
        }
        let species = &available[rng.gen_range(0..available.len())];
        let victim = match plant_pools.get_mut(species).and_then(Vec::pop) {
            Some(v) => v,
            None => continue,
        };
        if population.is_active(victim) {
            population.remove(graph, victim);
            fed.insert(herbivore);
            population.gain_energy(herbivore, params.gain_plant, params.e_max, params.e_init);
            total_plants -= 1;
        }
    }
}

/// Phase 3: carnivores hunt, one attempt each.
///
/// Pools are recomputed after foraging and plant species dropped from the
/// prey set. A carnivore with at least one compiled prey species still
/// alive draws one Bernoulli trial at the hunt probability.
fn hunting_phase(
    population: &mut PopulationStore,
    graph: &mut KnowledgeGraph,
    classification: &Classification,
    params: &SimulationParams,
    rng: &mut ChaCha8Rng,
    fed: &mut AHashSet<IndividualId>,
) {
    let pools = population.by_species();

    let mut prey_pools: BTreeMap<ClassId, Vec<IndividualId>> = BTreeMap::new();
    for (species, members) in &pools {
        if !classification.traits_of(species).is_plant {
            prey_pools.insert(species.clone(), members.clone());
        }
    }

    let mut carnivores: Vec<IndividualId> = Vec::new();
    for (species, members) in &pools {
        if classification.traits_of(species).is_carnivore {
            carnivores.extend(members.iter().copied());
        }
    }
    carnivores.shuffle(rng);

    for carnivore in carnivores {
        // it may have been eaten by an earlier carnivore this phase
        if !population.is_active(carnivore) {
            continue;
        }
        let species = match population.species_of(carnivore) {
            Some(s) => s.clone(),
            None => continue,
        };
        let prey_species = classification.prey_of(&species);
        if prey_species.is_empty() {
            continue;
        }

        let candidates: Vec<&ClassId> = prey_species
            .iter()
            .filter(|prey| prey_pools.get(*prey).map(|m| !m.is_empty()).unwrap_or(false))
            .collect();
        if candidates.is_empty() {
            continue;
        }

        if rng.gen::<f64>() >= params.hunt_prob {
            continue;
        }
        let chosen = candidates[rng.gen_range(0..candidates.len())].clone();
        let victim = match prey_pools.get_mut(&chosen).and_then(Vec::pop) {
            Some(v) => v,
            None => continue,
        };
        if population.is_active(victim) {
            population.remove(graph, victim);
            fed.insert(carnivore);
            population.gain_energy(carnivore, params.gain_prey, params.e_max, params.e_init);
        }
    }
}

/// Phase 4: every non-plant with energy <= 0 is removed, then edges with a
/// dead endpoint are purged.
fn starvation_phase(
    population: &mut PopulationStore,
    graph: &mut KnowledgeGraph,
    classification: &Classification,
    params: &SimulationParams,
) {
    let ids: Vec<IndividualId> = population.active().iter().copied().collect();
    for id in ids {
        let is_plant = population
            .species_of(id)
            .map(|sp| classification.traits_of(sp).is_plant)
            .unwrap_or(false);
        if is_plant {
            continue;
        }
        if population.energy(id, params.e_init) <= 0 {
            population.remove(graph, id);
        }
    }
    graph.remove_stale_eats_edges(population.active());
}

/// Phase 5: reproduction in three sub-phases, each over a fresh snapshot:
/// plants (logistic), herbivores, carnivores.
fn reproduction_phase(
    population: &mut PopulationStore,
    graph: &mut KnowledgeGraph,
    classification: &Classification,
    state: &mut SimulationState,
    params: &SimulationParams,
    rng: &mut ChaCha8Rng,
    fed: &AHashSet<IndividualId>,
) {
    // plants: n independent trials at p_repro_plant scaled by logistic room
    let pools = population.by_species();
    for (species, members) in &pools {
        if !classification.traits_of(species).is_plant {
            continue;
        }
        let n = members.len();
        if n == 0 || n >= params.k_plant {
            continue;
        }
        let room = 1.0 - n as f64 / params.k_plant as f64;
        let p_eff = params.p_repro_plant * room.max(0.0);
        let births = (0..n).filter(|_| rng.gen::<f64>() < p_eff).count();
        for _ in 0..births {
            spawn_offspring(population, graph, classification, state, params, species);
        }
    }

    // herbivores need a viable population of at least two
    let pools = population.by_species();
    for (species, members) in &pools {
        let traits = classification.traits_of(species);
        if !traits.is_herbivore || traits.is_carnivore {
            continue;
        }
        breed_consumers(
            population,
            graph,
            classification,
            state,
            params,
            rng,
            fed,
            species,
            members,
            params.p_repro_herb,
        );
    }

    // carnivores: identical rule with their own probability
    let pools = population.by_species();
    for (species, members) in &pools {
        if !classification.traits_of(species).is_carnivore {
            continue;
        }
        breed_consumers(
            population,
            graph,
            classification,
            state,
            params,
            rng,
            fed,
            species,
            members,
            params.p_repro_carn,
        );
    }
}

/// Shared herbivore/carnivore reproduction rule: gated on having fed this
/// step and on the energy threshold. The reproduction cost is debited on a
/// successful draw; the offspring only appears if energy stays positive.
#[allow(clippy::too_many_arguments)]
fn breed_consumers(
    population: &mut PopulationStore,
    graph: &mut KnowledgeGraph,
    classification: &Classification,
    state: &mut SimulationState,
    params: &SimulationParams,
    rng: &mut ChaCha8Rng,
    fed: &AHashSet<IndividualId>,
    species: &ClassId,
    members: &[IndividualId],
    p_repro: f64,
) {
    if members.len() < 2 {
        return;
    }
    for &id in members {
        if !population.is_active(id) {
            continue;
        }
        if !fed.contains(&id) {
            continue;
        }
        if population.energy(id, params.e_init) < params.e_repro {
            continue;
        }
        if rng.gen::<f64>() >= p_repro {
            continue;
        }
        population.drain_energy(id, params.repro_cost, params.e_init);
        if population.energy(id, params.e_init) > 0 {
            spawn_offspring(population, graph, classification, state, params, species);
        }
    }
}

/// Offspring inherit the parent's species directly; the resolver is never
/// consulted while the reasoner is frozen.
fn spawn_offspring(
    population: &mut PopulationStore,
    graph: &mut KnowledgeGraph,
    classification: &Classification,
    state: &mut SimulationState,
    params: &SimulationParams,
    species: &ClassId,
) -> IndividualId {
    let id = population.create(graph, &classification.prey, species, params.e_init);
    state.known_species.insert(species.clone());
    id
}
