use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::skills::SkillCatalogIndex;
use crate::{Developer, DeveloperId};

/// Point-in-time read of the developer population plus its skill index.
///
/// One matching computation runs against exactly one snapshot; nothing in the
/// engine mutates it.
#[derive(Debug, Clone)]
pub struct DeveloperSnapshot {
    generation: u64,
    taken_at: DateTime<Utc>,
    developers: Vec<Developer>,
    positions: HashMap<DeveloperId, usize>,
    index: SkillCatalogIndex,
}

impl DeveloperSnapshot {
    /// Later records win when the same id appears twice.
    pub fn new(generation: u64, developers: Vec<Developer>) -> Self {
        let mut unique: Vec<Developer> = Vec::with_capacity(developers.len());
        let mut positions: HashMap<DeveloperId, usize> = HashMap::with_capacity(developers.len());

        for developer in developers {
            match positions.get(&developer.id) {
                Some(&pos) => unique[pos] = developer,
                None => {
                    positions.insert(developer.id.clone(), unique.len());
                    unique.push(developer);
                }
            }
        }

        let index = SkillCatalogIndex::build(generation, &unique);

        Self {
            generation,
            taken_at: Utc::now(),
            developers: unique,
            positions,
            index,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn developer(&self, id: &str) -> Option<&Developer> {
        self.positions.get(id).map(|&pos| &self.developers[pos])
    }

    pub fn index(&self) -> &SkillCatalogIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.developers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.developers.is_empty()
    }
}
