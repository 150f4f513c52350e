//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for individuals in the population
///
/// Allocated from a monotonic counter owned by the population store, so
/// creation order doubles as a stable iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndividualId(pub u64);

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reference to a class in the taxonomy (species, trait class or root category)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassId(pub String);

impl ClassId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ClassId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Simulation time counter (discrete steps)
pub type Tick = u64;

/// Why a simulation run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The active population is empty
    Extinction,
    /// Every tracked species held steady over the stability window
    Stable,
    /// The configured step limit was reached
    Timeout,
}

/// Feeding traits of a species, derived from the taxonomy once per
/// classification pass (never per individual)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesTraits {
    pub is_plant: bool,
    pub is_herbivore: bool,
    pub is_carnivore: bool,
}
