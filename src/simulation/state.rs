//! Run-level simulation state

use std::collections::{BTreeMap, BTreeSet};

use crate::core::types::{ClassId, Tick};

/// Mutable state of one simulation run
#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    pub running: bool,

    /// While set, the reasoning cache is reused unconditionally and
    /// offspring inherit their parent's species without re-reasoning.
    pub frozen_reasoner: bool,

    pub t: Tick,

    /// Per-species population counts, one entry per elapsed step including
    /// t=0. All rows always share the same length.
    pub history: BTreeMap<ClassId, Vec<usize>>,

    /// Every species observed this run. Append-only: a species stays
    /// tracked even after going extinct.
    pub known_species: BTreeSet<ClassId>,
}

impl SimulationState {
    pub fn new() -> Self {
        Self::default()
    }
}
