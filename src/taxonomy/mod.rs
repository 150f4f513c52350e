//! Species taxonomy: traversal, classification and predation rules

pub mod resolver;
pub mod rules;
pub mod savanna;

pub use resolver::{class_depth, is_subclass_of, list_species, most_specific_species, Classification};
pub use rules::{compile_predation_rules, EatsRulesCache, PredationRules};

/// Root category for animal species
pub const BIOLOGICAL_SPECIES: &str = "BiologicalSpecies";

/// Root category for plant species
pub const PLANT: &str = "Plant";

/// Trait class marking meat eaters
pub const CARNIVORE: &str = "Carnivore";

/// Trait class marking plant eaters
pub const HERBIVORE: &str = "Herbivore";
