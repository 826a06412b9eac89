use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub battle: BattleConfig,
    pub timings: BattleTimings,
    pub history: HistoryConfig,
    pub species: SpeciesConfig,
}

/// Constants of the simplified damage formula.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BattleConfig {
    pub base_damage: f32,
    pub critical_hit_chance: f64,
    pub critical_hit_multiplier: f32,
    pub random_factor_min: f32,
    pub random_factor_max: f32,
    pub hp_multiplier: u32,
    pub hp_base: u32,
    pub max_rounds: u32,
}

/// Playback phase durations in milliseconds, at 1x speed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BattleTimings {
    pub preparing_ms: u64,
    pub arena_enter_ms: u64,
    pub turn_start_ms: u64,
    pub charging_ms: u64,
    pub attacking_ms: u64,
    pub impact_ms: u64,
    pub hp_drain_ms: u64,
    pub turn_end_ms: u64,
    pub knockout_ms: u64,
    pub victory_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HistoryConfig {
    pub max_entries: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpeciesConfig {
    pub species_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            battle: BattleConfig {
                base_damage: 20.0,
                critical_hit_chance: 0.0625, // 1/16
                critical_hit_multiplier: 1.5,
                random_factor_min: 0.85,
                random_factor_max: 1.0,
                hp_multiplier: 2,
                hp_base: 100,
                max_rounds: 20,
            },
            timings: BattleTimings {
                preparing_ms: 500,
                arena_enter_ms: 1500,
                turn_start_ms: 300,
                charging_ms: 400,
                attacking_ms: 500,
                impact_ms: 300,
                hp_drain_ms: 400,
                turn_end_ms: 300,
                knockout_ms: 1500,
                victory_ms: 2000,
            },
            history: HistoryConfig { max_entries: 50 },
            species: SpeciesConfig {
                species_path: "resources/species.json".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        // Load .env file if available
        dotenv::dotenv().ok();

        let mut config = Config::default();

        // Battle config
        if let Ok(max_rounds) = env::var("BATTLE_MAX_ROUNDS") {
            if let Ok(max_rounds) = max_rounds.parse::<u32>() {
                config.battle.max_rounds = max_rounds;
            }
        }

        if let Ok(base_damage) = env::var("BATTLE_BASE_DAMAGE") {
            if let Ok(base_damage) = base_damage.parse::<f32>() {
                config.battle.base_damage = base_damage;
            }
        }

        // History config
        if let Ok(max_entries) = env::var("HISTORY_MAX_ENTRIES") {
            if let Ok(max_entries) = max_entries.parse::<usize>() {
                config.history.max_entries = max_entries;
            }
        }

        // Species config
        if let Ok(species_path) = env::var("SPECIES_PATH") {
            config.species.species_path = species_path;
        }

        info!("Configuration loaded: {:?}", config);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_battle_constants() {
        let config = Config::default();
        assert_eq!(config.battle.base_damage, 20.0);
        assert_eq!(config.battle.critical_hit_chance, 0.0625);
        assert_eq!(config.battle.critical_hit_multiplier, 1.5);
        assert_eq!(config.battle.hp_multiplier, 2);
        assert_eq!(config.battle.hp_base, 100);
        assert_eq!(config.battle.max_rounds, 20);
        assert_eq!(config.history.max_entries, 50);
    }

    #[test]
    fn test_default_timings() {
        let timings = Config::default().timings;
        assert_eq!(timings.preparing_ms, 500);
        assert_eq!(timings.arena_enter_ms, 1500);
        assert_eq!(timings.turn_start_ms, 300);
        assert_eq!(timings.victory_ms, 2000);
    }
}
