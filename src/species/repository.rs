use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::species::species::SpeciesTemplate;

/// Root of the species resource file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesCatalog {
    pub species: Vec<SpeciesTemplate>,
}

/// In-memory stand-in for the external species data provider: id and name
/// lookup over a bundled JSON catalog.
pub struct SpeciesRepository {
    templates: HashMap<u32, SpeciesTemplate>,
    ids_by_name: HashMap<String, u32>,
}

impl SpeciesRepository {
    pub fn load(path: &str) -> Self {
        let file = File::open(Path::new(path)).expect("Failed to open species catalog file");
        let reader = BufReader::new(file);
        let catalog: SpeciesCatalog =
            serde_json::from_reader(reader).expect("Failed to parse species catalog JSON");
        let repository = Self::from_catalog(catalog);
        info!("Loaded {} species from {}", repository.len(), path);
        repository
    }

    pub fn from_catalog(catalog: SpeciesCatalog) -> Self {
        let mut templates = HashMap::new();
        let mut ids_by_name = HashMap::new();

        for template in catalog.species {
            ids_by_name.insert(template.name.to_lowercase(), template.id);
            templates.insert(template.id, template);
        }

        SpeciesRepository {
            templates,
            ids_by_name,
        }
    }

    pub fn get(&self, id: u32) -> Option<&SpeciesTemplate> {
        self.templates.get(&id)
    }

    /// Name lookup is case-insensitive.
    pub fn get_by_name(&self, name: &str) -> Option<&SpeciesTemplate> {
        let id = self.ids_by_name.get(&name.to_lowercase())?;
        self.templates.get(id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
