//! Canned savanna food web used by the binaries and tests

use crate::graph::store::KnowledgeGraph;
use crate::taxonomy::{BIOLOGICAL_SPECIES, CARNIVORE, HERBIVORE, PLANT};

/// Build the demo base taxonomy: a small African-savanna food web.
///
/// Lions hunt any herbivore, cheetahs specialize in impala, herbivores
/// browse the plants. Trait classes sit between the species and the roots
/// so classification picks the species, never the trait.
pub fn savanna_taxonomy() -> KnowledgeGraph {
    let mut g = KnowledgeGraph::new();

    g.add_class(BIOLOGICAL_SPECIES);
    g.add_class(PLANT);
    g.add_subclass("Animal", BIOLOGICAL_SPECIES);
    g.add_subclass(HERBIVORE, "Animal");
    g.add_subclass(CARNIVORE, "Animal");

    g.add_subclass("Impala", HERBIVORE);
    g.add_subclass("Zebra", HERBIVORE);
    g.add_subclass("Warthog", HERBIVORE);
    g.add_subclass("Lion", CARNIVORE);
    g.add_subclass("Cheetah", CARNIVORE);

    g.add_subclass("Grass", PLANT);
    g.add_subclass("Acacia", PLANT);

    g.add_eats_rule(HERBIVORE, PLANT);
    g.add_eats_rule("Lion", HERBIVORE);
    g.add_eats_rule("Cheetah", "Impala");

    g
}
