use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::species::{BaseStats, PokemonType, SpeciesTemplate};

/// Which side of the battle a value refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BattleSlot {
    Combatant1,
    Combatant2,
}

impl BattleSlot {
    pub fn other(&self) -> BattleSlot {
        match self {
            BattleSlot::Combatant1 => BattleSlot::Combatant2,
            BattleSlot::Combatant2 => BattleSlot::Combatant1,
        }
    }
}

/// Coarse battle lifecycle phase. `Idle` is the only re-enterable state (via
/// reset); `Complete` is terminal until reset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BattlePhase {
    Idle,
    Preparing,
    ArenaEnter,
    Combat,
    Knockout,
    Victory,
    Complete,
}

/// Fine-grained per-turn animation stage, cycled once per log entry while the
/// top-level phase is `Combat`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CombatSubPhase {
    TurnStart,
    Charging,
    Attacking,
    Impact,
    HpDrain,
    TurnEnd,
}

/// Category of a type effectiveness multiplier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Effectiveness {
    Immune,
    NotEffective,
    Normal,
    SuperEffective,
}

/// Playback speed multiplier. Divides scheduled delays, never damage values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum BattleSpeed {
    #[default]
    Normal,
    Double,
}

impl BattleSpeed {
    pub fn multiplier(&self) -> u64 {
        match self {
            BattleSpeed::Normal => 1,
            BattleSpeed::Double => 2,
        }
    }
}

/// Read-only combat snapshot of one participant, built once per battle from
/// species data and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleCombatant {
    pub id: u32,
    pub name: String,
    pub types: Vec<PokemonType>,
    pub stats: BaseStats,
}

impl BattleCombatant {
    pub fn from_species(template: &SpeciesTemplate) -> Self {
        BattleCombatant {
            id: template.id,
            name: template.name.clone(),
            types: template.types.clone(),
            stats: template.base_stats.clone(),
        }
    }
}

/// One resolved turn of a battle. Immutable once produced; the ordered
/// sequence of entries for one battle is the battle log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BattleLogEntry {
    pub round: u32,
    pub attacker: BattleSlot,
    pub attacker_name: String,
    pub defender_name: String,
    pub damage: u32,
    pub is_critical: bool,
    pub effectiveness: Effectiveness,
    pub attack_type: PokemonType,
    pub attacker_hp_after: u32,
    pub defender_hp_after: u32,
}

/// Damage aggregates for one combatant over a whole battle.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CombatantStats {
    pub total_damage: u32,
    pub critical_hits: u32,
    pub super_effective_hits: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BattleStats {
    pub combatant1: CombatantStats,
    pub combatant2: CombatantStats,
}

impl BattleStats {
    pub fn for_slot(&self, slot: BattleSlot) -> &CombatantStats {
        match slot {
            BattleSlot::Combatant1 => &self.combatant1,
            BattleSlot::Combatant2 => &self.combatant2,
        }
    }

    pub fn for_slot_mut(&mut self, slot: BattleSlot) -> &mut CombatantStats {
        match slot {
            BattleSlot::Combatant1 => &mut self.combatant1,
            BattleSlot::Combatant2 => &mut self.combatant2,
        }
    }
}

/// Terminal summary of a battle, produced exactly once and handed to the
/// history collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleResult {
    pub winner: BattleSlot,
    pub loser: BattleSlot,
    pub winner_name: String,
    pub loser_name: String,
    pub total_rounds: u32,
    pub stats: BattleStats,
    pub battle_log: Vec<BattleLogEntry>,
    pub timestamp: String,
}

/// The single mutable entity of the battle core, owned exclusively by the
/// playback machine. External consumers only ever see cloned snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleState {
    pub phase: BattlePhase,
    pub combat_sub_phase: Option<CombatSubPhase>,
    pub round: u32,
    pub current_attacker: Option<BattleSlot>,

    pub combatant1: Option<BattleCombatant>,
    pub combatant2: Option<BattleCombatant>,

    pub combatant1_hp: u32,
    pub combatant2_hp: u32,
    pub combatant1_max_hp: u32,
    pub combatant2_max_hp: u32,

    pub last_damage: u32,
    pub last_attack_type: Option<PokemonType>,
    pub last_effectiveness: Option<Effectiveness>,
    pub last_is_critical: bool,

    pub winner: Option<BattleSlot>,
    pub battle_log: Vec<BattleLogEntry>,
    pub result: Option<BattleResult>,

    pub speed: BattleSpeed,
    pub is_paused: bool,
}

impl Default for BattleState {
    fn default() -> Self {
        BattleState {
            phase: BattlePhase::Idle,
            combat_sub_phase: None,
            round: 0,
            current_attacker: None,
            combatant1: None,
            combatant2: None,
            combatant1_hp: 0,
            combatant2_hp: 0,
            combatant1_max_hp: 0,
            combatant2_max_hp: 0,
            last_damage: 0,
            last_attack_type: None,
            last_effectiveness: None,
            last_is_critical: false,
            winner: None,
            battle_log: Vec::new(),
            result: None,
            speed: BattleSpeed::Normal,
            is_paused: false,
        }
    }
}

impl BattleState {
    pub fn live_hp(&self, slot: BattleSlot) -> u32 {
        match slot {
            BattleSlot::Combatant1 => self.combatant1_hp,
            BattleSlot::Combatant2 => self.combatant2_hp,
        }
    }

    pub fn set_live_hp(&mut self, slot: BattleSlot, hp: u32) {
        match slot {
            BattleSlot::Combatant1 => self.combatant1_hp = hp,
            BattleSlot::Combatant2 => self.combatant2_hp = hp,
        }
    }
}

/// Named cue events for the audio/visual collaborator. The playback machine
/// decides when these fire; rendering them is someone else's problem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum BattleCue {
    BattleStart,
    PokemonCry { slot: BattleSlot },
    Charge { slot: BattleSlot },
    Attack { slot: BattleSlot, attack_type: PokemonType },
    Hit,
    CriticalHit,
    SuperEffective,
    NotEffective,
    HpDecrease { slot: BattleSlot },
    Faint { slot: BattleSlot },
    Victory { slot: BattleSlot },
}

#[derive(Debug, Error)]
pub enum BattleError {
    #[error("combatant `{0}` must have one or two types")]
    InvalidTypes(String),
    #[error("combatant `{0}` has a non-positive base stat")]
    NonPositiveStat(String),
    #[error("no active battle with id {0}")]
    UnknownBattle(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_other() {
        assert_eq!(BattleSlot::Combatant1.other(), BattleSlot::Combatant2);
        assert_eq!(BattleSlot::Combatant2.other(), BattleSlot::Combatant1);
    }

    #[test]
    fn test_default_state_is_idle() {
        let state = BattleState::default();
        assert_eq!(state.phase, BattlePhase::Idle);
        assert!(state.combat_sub_phase.is_none());
        assert!(state.combatant1.is_none());
        assert!(state.battle_log.is_empty());
        assert!(state.result.is_none());
        assert_eq!(state.speed, BattleSpeed::Normal);
        assert!(!state.is_paused);
    }

    #[test]
    fn test_speed_multiplier() {
        assert_eq!(BattleSpeed::Normal.multiplier(), 1);
        assert_eq!(BattleSpeed::Double.multiplier(), 2);
    }

    #[test]
    fn test_cue_serialization() {
        let cue = BattleCue::Attack {
            slot: BattleSlot::Combatant1,
            attack_type: crate::species::PokemonType::Fire,
        };
        let json = serde_json::to_string(&cue).unwrap();
        assert_eq!(
            json,
            r#"{"cue":"attack","slot":"combatant1","attack_type":"fire"}"#
        );
    }
}
