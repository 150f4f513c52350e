//! Ecosystem wiring and run control
//!
//! Single-threaded and synchronous by design: the graph, caches and
//! population are plain mutable state, and callers serialize all mutating
//! operations. At most one step runs at a time and always to completion.

pub mod engine;
pub mod output;
pub mod state;
pub mod stopping;

pub use output::{RunOutput, RunStats, StateSnapshot};
pub use state::SimulationState;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::core::config::SimulationParams;
use crate::core::error::{EcoError, Result};
use crate::core::types::{ClassId, IndividualId, StopReason, Tick};
use crate::graph::reasoner::ReasonerCache;
use crate::graph::store::KnowledgeGraph;
use crate::population::PopulationStore;
use crate::simulation::output::{EdgeSnapshot, NodeSnapshot};
use crate::taxonomy::resolver::{self, Classification};
use crate::taxonomy::rules::EatsRulesCache;
use crate::taxonomy::{BIOLOGICAL_SPECIES, PLANT};

/// Result of one `step` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub t: Tick,
    pub status: Option<StopReason>,
}

/// The whole simulation: knowledge graph, caches, population and run state
pub struct Ecosystem {
    pub graph: KnowledgeGraph,
    pub reasoner: ReasonerCache,
    pub eats_rules: EatsRulesCache,
    pub population: PopulationStore,
    pub classification: Classification,
    pub state: SimulationState,
    pub params: SimulationParams,
    pub rng: ChaCha8Rng,
}

impl Ecosystem {
    pub fn new(graph: KnowledgeGraph, params: SimulationParams, seed: u64) -> Self {
        Self {
            graph,
            reasoner: ReasonerCache::new(),
            eats_rules: EatsRulesCache::new(),
            population: PopulationStore::new(),
            classification: Classification::new(),
            state: SimulationState::new(),
            params,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Admit a new individual of the given species class.
    ///
    /// Rejected while a run is active. The class must sit (reflexively)
    /// under one of the taxonomy roots. Classification is deferred to the
    /// next pass; until then the individual has no species assignment.
    pub fn add_individual(&mut self, species: impl Into<ClassId>) -> Result<IndividualId> {
        if self.state.running {
            return Err(EcoError::RunInProgress);
        }
        let species = species.into();
        let bio = ClassId::new(BIOLOGICAL_SPECIES);
        let plant = ClassId::new(PLANT);
        let qualifies = species == bio
            || species == plant
            || self.graph.is_subclass_of(&species, &bio)
            || self.graph.is_subclass_of(&species, &plant);
        if !qualifies {
            return Err(EcoError::UnknownSpecies(species));
        }

        let id = self
            .population
            .admit_unclassified(&mut self.graph, &species, self.params.e_init);
        self.reasoner.mark_dirty();
        tracing::debug!(%id, %species, "individual admitted");
        Ok(id)
    }

    /// Remove an individual and every fact referencing it.
    /// Rejected while a run is active.
    pub fn remove_individual(&mut self, id: IndividualId) -> Result<()> {
        if self.state.running {
            return Err(EcoError::RunInProgress);
        }
        if !self.population.is_active(id) {
            return Err(EcoError::IndividualNotFound(id));
        }
        self.population.remove(&mut self.graph, id);
        self.graph.remove_stale_eats_edges(self.population.active());
        self.reasoner.mark_dirty();
        Ok(())
    }

    /// Reclassify the population and rebuild every eats edge.
    /// Rejected while a run is active.
    pub fn auto_relink(&mut self) -> Result<()> {
        if self.state.running {
            return Err(EcoError::RunInProgress);
        }
        self.classify_population();
        self.population
            .rebuild_eats_edges(&mut self.graph, &self.classification.prey);
        self.reasoner.mark_dirty();
        Ok(())
    }

    /// Start a run: one classification pass, energy defaults, a full edge
    /// rebuild, history seeded with the t=0 counts, reasoner frozen.
    pub fn start(&mut self) -> Result<()> {
        if self.state.running {
            return Err(EcoError::RunInProgress);
        }
        self.classify_population();
        self.population.ensure_energy(self.params.e_init);
        self.population
            .rebuild_eats_edges(&mut self.graph, &self.classification.prey);

        let pools = self.population.by_species();
        self.state.history.clear();
        for species in &self.state.known_species {
            let count = pools.get(species).map(Vec::len).unwrap_or(0);
            self.state.history.insert(species.clone(), vec![count]);
        }

        self.state.t = 0;
        self.state.frozen_reasoner = true;
        self.state.running = true;
        tracing::info!(
            species = self.state.known_species.len(),
            individuals = self.population.len(),
            "run started"
        );
        Ok(())
    }

    /// Advance one step and evaluate the stopping detector
    pub fn step(&mut self) -> Result<StepReport> {
        if !self.state.running {
            return Err(EcoError::NotRunning);
        }

        engine::run_step(self);
        self.state.t += 1;

        let status = stopping::update_history_and_check(&self.population, &mut self.state, &self.params);
        if let Some(reason) = status {
            self.state.running = false;
            self.state.frozen_reasoner = false;
            tracing::info!(t = self.state.t, ?reason, "run stopped");
        }
        self.reasoner.mark_dirty();

        Ok(StepReport {
            t: self.state.t,
            status,
        })
    }

    /// Drive a started run until the stopping detector fires
    pub fn run_to_completion(&mut self) -> Result<StopReason> {
        loop {
            let report = self.step()?;
            if let Some(reason) = report.status {
                return Ok(reason);
            }
        }
    }

    /// Read-only view of the population and eats edges, served through the
    /// reasoning cache, honoring the frozen flag during a run.
    pub fn state_snapshot(&mut self) -> StateSnapshot {
        let frozen = self.state.frozen_reasoner;
        let view = self.reasoner.reasoned_view(&self.graph, frozen);

        let mut nodes = Vec::new();
        for &id in self.population.active() {
            nodes.push(NodeSnapshot {
                id,
                species: self.population.species_of(id).cloned(),
                types: view.types_of(id).to_vec(),
                energy: self.population.energy_of(id),
            });
        }

        let edges = self
            .graph
            .eats_pairs()
            .filter(|(s, o)| self.population.is_active(*s) && self.population.is_active(*o))
            .map(|(source, target)| EdgeSnapshot { source, target })
            .collect();

        StateSnapshot {
            t: self.state.t,
            running: self.state.running,
            nodes,
            edges,
        }
    }

    /// One classification pass with the reasoner unfrozen: species
    /// assignment, traits, predation rules and the known-species reset.
    fn classify_population(&mut self) {
        let rules = self.eats_rules.class_level_rules(&self.graph).to_vec();
        let view = self.reasoner.reasoned_view(&self.graph, false);
        let (species_of, classification) =
            resolver::classify_population(view, &rules, self.population.active());

        self.state.known_species = classification.species().cloned().collect();
        self.population.set_species_map(species_of);
        self.classification = classification;
        tracing::debug!(
            species = self.state.known_species.len(),
            "classification pass complete"
        );
    }
}
