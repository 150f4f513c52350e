//! History recording and termination detection

use crate::core::config::SimulationParams;
use crate::core::types::StopReason;
use crate::population::PopulationStore;
use crate::simulation::state::SimulationState;

/// Append this step's per-species counts to the history, then decide whether
/// the run stops.
///
/// Every known species gets a history row and every row gets an entry each
/// step (0 when the species is absent), so all rows stay the same length;
/// a species that went extinct keeps accumulating zeros.
pub fn update_history_and_check(
    population: &PopulationStore,
    state: &mut SimulationState,
    params: &SimulationParams,
) -> Option<StopReason> {
    let pools = population.by_species();

    for species in &state.known_species {
        state.history.entry(species.clone()).or_default();
    }
    for (species, row) in state.history.iter_mut() {
        row.push(pools.get(species).map(Vec::len).unwrap_or(0));
    }

    if population.is_empty() {
        return Some(StopReason::Extinction);
    }

    let window = params.stable_window;
    if state.t >= window as u64 {
        let stable = state.history.values().all(|row| {
            if row.len() < window {
                return false;
            }
            let recent = &row[row.len() - window..];
            let max = recent.iter().max().copied().unwrap_or(0);
            let min = recent.iter().min().copied().unwrap_or(0);
            max - min <= params.stable_range
        });
        if stable {
            return Some(StopReason::Stable);
        }
    }

    if state.t >= params.max_steps {
        return Some(StopReason::Timeout);
    }

    None
}
