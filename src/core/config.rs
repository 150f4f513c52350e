//! Simulation parameters with documented constants
//!
//! All tuning knobs are collected here. The defaults reproduce a slowly
//! oscillating plant/herbivore/carnivore system; changing them shifts the
//! balance between starvation pressure and reproduction.

use serde::Deserialize;
use std::path::Path;

use crate::core::error::Result;

/// Parameters consumed by the step engine and the stopping detector
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Energy ceiling. Every foraging or hunting gain is clamped to this.
    pub e_max: i32,

    /// Energy assigned on creation, and the fallback for any individual
    /// missing an energy entry when a run starts.
    pub e_init: i32,

    /// Per-step maintenance cost paid by every non-plant individual.
    ///
    /// Energy is not clamped at zero here: it may go negative within a step
    /// and is only checked (`<= 0`) by the starvation phase.
    pub cost_step: i32,

    /// Energy a herbivore gains for each plant eaten.
    pub gain_plant: i32,

    /// Energy a carnivore gains for each prey killed.
    pub gain_prey: i32,

    /// Minimum energy required to attempt reproduction.
    pub e_repro: i32,

    /// Energy debited on a successful reproduction draw.
    ///
    /// The debit is applied before the offspring check: if energy does not
    /// stay positive afterwards, no offspring is created but the cost stands.
    pub repro_cost: i32,

    /// Base per-individual reproduction probability for plants, scaled by
    /// the logistic room factor `1 - n/k_plant`.
    pub p_repro_plant: f64,

    /// Carrying capacity per plant species.
    pub k_plant: usize,

    /// Per-individual reproduction probability for herbivores that fed this
    /// step and meet the energy threshold.
    pub p_repro_herb: f64,

    /// Same as `p_repro_herb`, for carnivores.
    pub p_repro_carn: f64,

    /// Probability that a carnivore's single hunt attempt per step succeeds.
    pub hunt_prob: f64,

    /// Number of trailing steps inspected by the stability check.
    pub stable_window: usize,

    /// Maximum (max - min) spread tolerated inside the stability window.
    pub stable_range: usize,

    /// Hard step limit; the run times out once `t` reaches it.
    pub max_steps: u64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            e_max: 10,
            e_init: 6,
            cost_step: 1,

            gain_plant: 4,
            gain_prey: 5,

            e_repro: 8,
            repro_cost: 4,

            p_repro_plant: 0.20,
            k_plant: 30,

            p_repro_herb: 0.25,
            p_repro_carn: 0.20,

            hunt_prob: 0.55,

            stable_window: 10,
            stable_range: 1,
            max_steps: 300,
        }
    }
}

impl SimulationParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load parameters from a TOML file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the parameter set for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, p) in [
            ("p_repro_plant", self.p_repro_plant),
            ("p_repro_herb", self.p_repro_herb),
            ("p_repro_carn", self.p_repro_carn),
            ("hunt_prob", self.hunt_prob),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("{} ({}) must be within [0, 1]", name, p));
            }
        }

        if self.stable_window == 0 {
            return Err("stable_window must be at least 1".into());
        }

        if self.k_plant == 0 {
            return Err("k_plant must be at least 1".into());
        }

        if self.e_init > self.e_max {
            return Err(format!(
                "e_init ({}) must not exceed e_max ({})",
                self.e_init, self.e_max
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SimulationParams::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_probability() {
        let mut params = SimulationParams::default();
        params.hunt_prob = 1.5;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut params = SimulationParams::default();
        params.stable_window = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_energy_bounds() {
        let mut params = SimulationParams::default();
        params.e_init = 20;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_partial_toml_overrides_defaults() {
        let params = SimulationParams::from_toml_str("hunt_prob = 0.9\nmax_steps = 50\n")
            .expect("parse failed");
        assert_eq!(params.hunt_prob, 0.9);
        assert_eq!(params.max_steps, 50);
        // untouched keys keep their defaults
        assert_eq!(params.e_max, 10);
        assert_eq!(params.k_plant, 30);
    }
}
