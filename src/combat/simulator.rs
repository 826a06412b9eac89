use rand::Rng;
use tracing::debug;

use crate::combat::resolver::{compute_damage, first_attacker, primary_type, scale_hp};
use crate::combat::state::{
    BattleCombatant, BattleLogEntry, BattleSlot, BattleStats, Effectiveness,
};
use crate::config::BattleConfig;

/// Complete pre-computed outcome of a battle: the ordered log plus the
/// aggregates the playback machine replays. Computed once, never re-derived.
#[derive(Debug, Clone)]
pub struct BattleSimulation {
    pub log: Vec<BattleLogEntry>,
    pub stats: BattleStats,
    pub winner: BattleSlot,
    pub loser: BattleSlot,
    pub winner_name: String,
    pub loser_name: String,
    pub total_rounds: u32,
    pub combatant1_final_hp: u32,
    pub combatant2_final_hp: u32,
    pub combatant1_max_hp: u32,
    pub combatant2_max_hp: u32,
}

/// Run an entire battle to completion in one synchronous pass.
///
/// Each turn the attacker uses its primary-type attack; the defender's HP is
/// clamped at 0 and the attacker alternates. The loop stops when one side
/// reaches 0 HP or after `max_rounds` turns — the cap guards against a
/// zero-damage stalemate between mutually immune types. On a cap exit the
/// side with remaining HP wins, combatant 1 if both still stand.
pub fn simulate_battle<R: Rng>(
    combatant1: &BattleCombatant,
    combatant2: &BattleCombatant,
    config: &BattleConfig,
    rng: &mut R,
) -> BattleSimulation {
    let combatant1_max_hp = scale_hp(combatant1.stats.hp, config);
    let combatant2_max_hp = scale_hp(combatant2.stats.hp, config);
    let mut hp1 = combatant1_max_hp;
    let mut hp2 = combatant2_max_hp;

    let mut log = Vec::new();
    let mut stats = BattleStats::default();

    let mut attacker = first_attacker(combatant1.stats.speed, combatant2.stats.speed, rng);
    let mut round = 0;

    while hp1 > 0 && hp2 > 0 && round < config.max_rounds {
        round += 1;
        let (attacking, defending) = match attacker {
            BattleSlot::Combatant1 => (combatant1, combatant2),
            BattleSlot::Combatant2 => (combatant2, combatant1),
        };
        let attack_type = primary_type(&attacking.types);

        let outcome = compute_damage(
            &attacking.stats,
            &defending.stats,
            attack_type,
            &defending.types,
            config,
            rng,
        );

        match attacker {
            BattleSlot::Combatant1 => hp2 = hp2.saturating_sub(outcome.damage),
            BattleSlot::Combatant2 => hp1 = hp1.saturating_sub(outcome.damage),
        }

        let side = stats.for_slot_mut(attacker);
        side.total_damage += outcome.damage;
        if outcome.is_critical {
            side.critical_hits += 1;
        }
        if outcome.effectiveness == Effectiveness::SuperEffective {
            side.super_effective_hits += 1;
        }

        let (attacker_hp_after, defender_hp_after) = match attacker {
            BattleSlot::Combatant1 => (hp1, hp2),
            BattleSlot::Combatant2 => (hp2, hp1),
        };

        log.push(BattleLogEntry {
            round,
            attacker,
            attacker_name: attacking.name.clone(),
            defender_name: defending.name.clone(),
            damage: outcome.damage,
            is_critical: outcome.is_critical,
            effectiveness: outcome.effectiveness,
            attack_type,
            attacker_hp_after,
            defender_hp_after,
        });

        attacker = attacker.other();
    }

    let winner = if hp1 > 0 {
        BattleSlot::Combatant1
    } else {
        BattleSlot::Combatant2
    };
    let loser = winner.other();
    let (winner_name, loser_name) = match winner {
        BattleSlot::Combatant1 => (combatant1.name.clone(), combatant2.name.clone()),
        BattleSlot::Combatant2 => (combatant2.name.clone(), combatant1.name.clone()),
    };

    debug!(
        "Simulated {} vs {}: {} wins after {} rounds",
        combatant1.name, combatant2.name, winner_name, round
    );

    BattleSimulation {
        log,
        stats,
        winner,
        loser,
        winner_name,
        loser_name,
        total_rounds: round,
        combatant1_final_hp: hp1,
        combatant2_final_hp: hp2,
        combatant1_max_hp,
        combatant2_max_hp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::{BaseStats, PokemonType};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn combatant(id: u32, name: &str, types: Vec<PokemonType>, stats: BaseStats) -> BattleCombatant {
        BattleCombatant {
            id,
            name: name.to_string(),
            types,
            stats,
        }
    }

    fn stats(hp: u32, attack: u32, defense: u32, speed: u32) -> BaseStats {
        BaseStats {
            hp,
            attack,
            defense,
            special_attack: attack / 2,
            special_defense: defense,
            speed,
        }
    }

    fn config() -> BattleConfig {
        crate::config::Config::default().battle
    }

    #[test]
    fn test_same_seed_produces_identical_logs() {
        let c1 = combatant(6, "charizard", vec![PokemonType::Fire], stats(78, 84, 78, 100));
        let c2 = combatant(9, "blastoise", vec![PokemonType::Water], stats(79, 83, 100, 78));

        let first = simulate_battle(&c1, &c2, &config(), &mut SmallRng::seed_from_u64(42));
        let second = simulate_battle(&c1, &c2, &config(), &mut SmallRng::seed_from_u64(42));

        assert_eq!(first.log, second.log);
        assert_eq!(first.winner, second.winner);
        assert_eq!(first.total_rounds, second.total_rounds);
    }

    #[test]
    fn test_battle_ends_with_fainted_defender() {
        let c1 = combatant(6, "charizard", vec![PokemonType::Fire], stats(78, 200, 78, 100));
        let c2 = combatant(3, "venusaur", vec![PokemonType::Grass], stats(80, 82, 50, 80));

        let simulation = simulate_battle(&c1, &c2, &config(), &mut SmallRng::seed_from_u64(1));

        assert!(simulation.total_rounds <= 20);
        let last = simulation.log.last().unwrap();
        assert_eq!(last.defender_hp_after, 0);
        assert_eq!(simulation.winner, last.attacker);
        assert_eq!(simulation.log.len() as u32, simulation.total_rounds);
    }

    #[test]
    fn test_round_cap_resolves_mutual_immunity_stalemate() {
        // Normal vs ghost in both directions deals zero damage forever.
        let c1 = combatant(143, "snorlax", vec![PokemonType::Normal], stats(160, 110, 65, 30));
        let c2 = combatant(94, "gengar", vec![PokemonType::Ghost], stats(60, 65, 60, 110));

        let simulation = simulate_battle(&c1, &c2, &config(), &mut SmallRng::seed_from_u64(5));

        assert_eq!(simulation.total_rounds, 20);
        assert!(simulation.log.iter().all(|entry| entry.damage == 0));
        assert!(simulation.combatant1_final_hp > 0);
        assert!(simulation.combatant2_final_hp > 0);
        // Both sides still standing: combatant 1 takes the verdict.
        assert_eq!(simulation.winner, BattleSlot::Combatant1);
        assert_eq!(simulation.loser, BattleSlot::Combatant2);
    }

    #[test]
    fn test_faster_fire_attacker_opens_super_effective() {
        let c1 = combatant(6, "charizard", vec![PokemonType::Fire], stats(78, 100, 78, 100));
        let c2 = combatant(3, "venusaur", vec![PokemonType::Grass], stats(80, 82, 50, 50));

        let simulation = simulate_battle(&c1, &c2, &config(), &mut SmallRng::seed_from_u64(9));

        let first = &simulation.log[0];
        assert_eq!(first.attacker, BattleSlot::Combatant1);
        assert_eq!(first.attack_type, PokemonType::Fire);
        assert_eq!(first.effectiveness, Effectiveness::SuperEffective);
        assert_eq!(first.round, 1);
    }

    #[test]
    fn test_attackers_alternate_and_rounds_increase() {
        let c1 = combatant(25, "pikachu", vec![PokemonType::Electric], stats(35, 55, 40, 90));
        let c2 = combatant(9, "blastoise", vec![PokemonType::Water], stats(79, 83, 100, 78));

        let simulation = simulate_battle(&c1, &c2, &config(), &mut SmallRng::seed_from_u64(21));

        for (i, pair) in simulation.log.windows(2).enumerate() {
            assert_eq!(pair[1].attacker, pair[0].attacker.other(), "turn {}", i);
            assert_eq!(pair[1].round, pair[0].round + 1);
        }
    }

    #[test]
    fn test_aggregates_match_log() {
        let c1 = combatant(6, "charizard", vec![PokemonType::Fire], stats(78, 84, 78, 100));
        let c2 = combatant(3, "venusaur", vec![PokemonType::Grass], stats(80, 82, 83, 80));

        let simulation = simulate_battle(&c1, &c2, &config(), &mut SmallRng::seed_from_u64(33));

        let mut expected = BattleStats::default();
        for entry in &simulation.log {
            let side = expected.for_slot_mut(entry.attacker);
            side.total_damage += entry.damage;
            if entry.is_critical {
                side.critical_hits += 1;
            }
            if entry.effectiveness == Effectiveness::SuperEffective {
                side.super_effective_hits += 1;
            }
        }
        assert_eq!(simulation.stats, expected);
    }

    #[test]
    fn test_hp_pools_are_scaled() {
        let c1 = combatant(6, "charizard", vec![PokemonType::Fire], stats(78, 84, 78, 100));
        let c2 = combatant(3, "venusaur", vec![PokemonType::Grass], stats(80, 82, 83, 80));

        let simulation = simulate_battle(&c1, &c2, &config(), &mut SmallRng::seed_from_u64(2));

        assert_eq!(simulation.combatant1_max_hp, 78 * 2 + 100);
        assert_eq!(simulation.combatant2_max_hp, 80 * 2 + 100);
    }
}
