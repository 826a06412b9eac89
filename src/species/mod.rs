pub mod repository;
pub mod species;
pub mod stats;

// Re-export key types
pub use repository::SpeciesRepository;
pub use species::{PokemonType, SpeciesTemplate};
pub use stats::{BaseStats, StatSet};
