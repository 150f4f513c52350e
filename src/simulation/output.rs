//! Run output, state snapshots and serialization

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use crate::core::types::{ClassId, IndividualId, StopReason, Tick};
use crate::simulation::state::SimulationState;

/// Complete output of one finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub run_id: Uuid,
    pub seed: u64,
    pub status: StopReason,
    pub history: BTreeMap<ClassId, Vec<usize>>,
    pub stats: RunStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub steps: Tick,
    pub simulation_time_ms: u64,
    pub species_tracked: usize,
    pub species_surviving: usize,
    pub final_population: usize,
}

impl RunOutput {
    pub fn new(
        state: &SimulationState,
        status: StopReason,
        seed: u64,
        final_population: usize,
        elapsed: Duration,
    ) -> Self {
        let species_surviving = state
            .history
            .values()
            .filter(|row| row.last().copied().unwrap_or(0) > 0)
            .count();

        Self {
            run_id: Uuid::new_v4(),
            seed,
            status,
            history: state.history.clone(),
            stats: RunStats {
                steps: state.t,
                simulation_time_ms: elapsed.as_millis() as u64,
                species_tracked: state.known_species.len(),
                species_surviving,
                final_population,
            },
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn summary(&self) -> String {
        format!(
            "Simulated {} steps in {}ms: {:?}\n{} species tracked, {} surviving, {} individuals remain",
            self.stats.steps,
            self.stats.simulation_time_ms,
            self.status,
            self.stats.species_tracked,
            self.stats.species_surviving,
            self.stats.final_population,
        )
    }
}

/// Read-only view of the live population and its eats edges
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub t: Tick,
    pub running: bool,
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub id: IndividualId,
    pub species: Option<ClassId>,
    /// Entailed types served by the reasoning cache; stale during a frozen run
    pub types: Vec<ClassId>,
    pub energy: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeSnapshot {
    pub source: IndividualId,
    pub target: IndividualId,
}
