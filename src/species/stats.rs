use serde::{Deserialize, Serialize};

/// Generic six-stat block shared by species templates and combatants.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StatSet<T> {
    pub hp: T,
    pub attack: T,
    pub defense: T,
    pub special_attack: T,
    pub special_defense: T,
    pub speed: T,
}

pub type BaseStats = StatSet<u32>;

impl BaseStats {
    /// True when every stat is at least 1. Damage math divides by defense
    /// stats, so zero values are rejected before a battle starts.
    pub fn all_positive(&self) -> bool {
        self.hp > 0
            && self.attack > 0
            && self.defense > 0
            && self.special_attack > 0
            && self.special_defense > 0
            && self.speed > 0
    }
}
