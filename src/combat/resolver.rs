use rand::Rng;

use crate::combat::state::{BattleSlot, Effectiveness};
use crate::config::BattleConfig;
use crate::species::{BaseStats, PokemonType};

/// 18x18 type effectiveness chart.
/// Row = attacking type, Column = defending type.
/// Values: 0.0 = immune, 0.5 = not very effective, 1.0 = neutral, 2.0 = super effective.
///
/// Order: Normal, Fire, Water, Electric, Grass, Ice, Fighting, Poison, Ground,
///        Flying, Psychic, Bug, Rock, Ghost, Dragon, Dark, Steel, Fairy
#[rustfmt::skip]
pub static TYPE_CHART: [[f32; 18]; 18] = [
    // Normal attacking
    [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.5, 0.0, 1.0, 1.0, 0.5, 1.0],
    // Fire attacking
    [1.0, 0.5, 0.5, 1.0, 2.0, 2.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 0.5, 1.0, 0.5, 1.0, 2.0, 1.0],
    // Water attacking
    [1.0, 2.0, 0.5, 1.0, 0.5, 1.0, 1.0, 1.0, 2.0, 1.0, 1.0, 1.0, 2.0, 1.0, 0.5, 1.0, 1.0, 1.0],
    // Electric attacking
    [1.0, 1.0, 2.0, 0.5, 0.5, 1.0, 1.0, 1.0, 0.0, 2.0, 1.0, 1.0, 1.0, 1.0, 0.5, 1.0, 1.0, 1.0],
    // Grass attacking
    [1.0, 0.5, 2.0, 1.0, 0.5, 1.0, 1.0, 0.5, 2.0, 0.5, 1.0, 0.5, 2.0, 1.0, 0.5, 1.0, 0.5, 1.0],
    // Ice attacking
    [1.0, 0.5, 0.5, 1.0, 2.0, 0.5, 1.0, 1.0, 2.0, 2.0, 1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 0.5, 1.0],
    // Fighting attacking
    [2.0, 1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 0.5, 1.0, 0.5, 0.5, 0.5, 2.0, 0.0, 1.0, 2.0, 2.0, 0.5],
    // Poison attacking
    [1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 1.0, 0.5, 0.5, 1.0, 1.0, 1.0, 0.5, 0.5, 1.0, 1.0, 0.0, 2.0],
    // Ground attacking
    [1.0, 2.0, 1.0, 2.0, 0.5, 1.0, 1.0, 2.0, 1.0, 0.0, 1.0, 0.5, 2.0, 1.0, 1.0, 1.0, 2.0, 1.0],
    // Flying attacking
    [1.0, 1.0, 1.0, 0.5, 2.0, 1.0, 2.0, 1.0, 1.0, 1.0, 1.0, 2.0, 0.5, 1.0, 1.0, 1.0, 0.5, 1.0],
    // Psychic attacking
    [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 1.0, 1.0, 0.5, 1.0, 1.0, 1.0, 1.0, 0.0, 0.5, 1.0],
    // Bug attacking
    [1.0, 0.5, 1.0, 1.0, 2.0, 1.0, 0.5, 0.5, 1.0, 0.5, 2.0, 1.0, 1.0, 0.5, 1.0, 2.0, 0.5, 0.5],
    // Rock attacking
    [1.0, 2.0, 1.0, 1.0, 1.0, 2.0, 0.5, 1.0, 0.5, 2.0, 1.0, 2.0, 1.0, 1.0, 1.0, 1.0, 0.5, 1.0],
    // Ghost attacking
    [0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 1.0, 2.0, 1.0, 0.5, 1.0, 1.0],
    // Dragon attacking
    [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 0.5, 0.0],
    // Dark attacking
    [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.5, 1.0, 1.0, 1.0, 2.0, 1.0, 1.0, 2.0, 1.0, 0.5, 1.0, 0.5],
    // Steel attacking
    [1.0, 0.5, 0.5, 0.5, 1.0, 2.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 1.0, 1.0, 0.5, 2.0],
    // Fairy attacking
    [1.0, 0.5, 1.0, 1.0, 1.0, 1.0, 2.0, 0.5, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 0.5, 1.0],
];

/// Chart lookup for a single attacking/defending type pair.
pub fn effectiveness(attack_type: PokemonType, defender_type: PokemonType) -> f32 {
    TYPE_CHART[attack_type as usize][defender_type as usize]
}

/// Combined multiplier against a defender with one or two types: the product
/// of the per-type chart entries. An empty type list is treated as neutral.
pub fn effectiveness_multiplier(attack_type: PokemonType, defender_types: &[PokemonType]) -> f32 {
    defender_types
        .iter()
        .map(|t| effectiveness(attack_type, *t))
        .product()
}

pub fn effectiveness_category(multiplier: f32) -> Effectiveness {
    if multiplier == 0.0 {
        Effectiveness::Immune
    } else if multiplier < 1.0 {
        Effectiveness::NotEffective
    } else if multiplier > 1.0 {
        Effectiveness::SuperEffective
    } else {
        Effectiveness::Normal
    }
}

/// Outcome of one damage roll.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageOutcome {
    pub damage: u32,
    pub is_critical: bool,
    pub effectiveness: Effectiveness,
    pub multiplier: f32,
}

/// Resolve one attack using the simplified damage formula.
///
/// The attacker's stronger attacking stat picks the branch (special only when
/// special attack is strictly higher) and is paired with the matching defense
/// stat. Base damage is attack/defense scaled by the configured base constant,
/// then modified by type effectiveness, a 1/16 critical roll and a uniform
/// damage roll in [random_factor_min, random_factor_max).
pub fn compute_damage<R: Rng>(
    attacker_stats: &BaseStats,
    defender_stats: &BaseStats,
    attack_type: PokemonType,
    defender_types: &[PokemonType],
    config: &BattleConfig,
    rng: &mut R,
) -> DamageOutcome {
    let use_special = attacker_stats.special_attack > attacker_stats.attack;
    let (attack_stat, defense_stat) = if use_special {
        (attacker_stats.special_attack, defender_stats.special_defense)
    } else {
        (attacker_stats.attack, defender_stats.defense)
    };

    let mut damage = attack_stat as f32 / defense_stat as f32 * config.base_damage;

    let multiplier = effectiveness_multiplier(attack_type, defender_types);
    damage *= multiplier;

    let is_critical = rng.gen_bool(config.critical_hit_chance);
    if is_critical {
        damage *= config.critical_hit_multiplier;
    }

    let random_factor = rng.gen_range(config.random_factor_min..config.random_factor_max);
    damage *= random_factor;

    // Minimum damage is 1, except that immunity overrides the floor.
    let damage = if multiplier == 0.0 {
        0
    } else {
        (damage.floor() as u32).max(1)
    };

    DamageOutcome {
        damage,
        is_critical,
        effectiveness: effectiveness_category(multiplier),
        multiplier,
    }
}

/// Effective HP pool for a battle: every combatant fights with a much larger
/// pool than its raw base stat.
pub fn scale_hp(base_hp: u32, config: &BattleConfig) -> u32 {
    base_hp * config.hp_multiplier + config.hp_base
}

/// Higher speed acts first; an exact tie is broken uniformly at random.
pub fn first_attacker<R: Rng>(speed1: u32, speed2: u32, rng: &mut R) -> BattleSlot {
    if speed1 > speed2 {
        BattleSlot::Combatant1
    } else if speed2 > speed1 {
        BattleSlot::Combatant2
    } else if rng.gen_bool(0.5) {
        BattleSlot::Combatant1
    } else {
        BattleSlot::Combatant2
    }
}

/// The type of the implicit attack a combatant uses every turn: its first
/// listed type, falling back to Normal for an empty list.
pub fn primary_type(types: &[PokemonType]) -> PokemonType {
    types.first().copied().unwrap_or(PokemonType::Normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn config() -> BattleConfig {
        crate::config::Config::default().battle
    }

    #[test]
    fn test_chart_entries_are_in_domain() {
        for attack in PokemonType::ALL {
            for defend in PokemonType::ALL {
                let m = effectiveness(attack, defend);
                assert!(
                    m == 0.0 || m == 0.5 || m == 1.0 || m == 2.0,
                    "{} vs {} produced {}",
                    attack,
                    defend,
                    m
                );
            }
        }
    }

    #[test]
    fn test_single_type_effectiveness() {
        assert_eq!(effectiveness(PokemonType::Fire, PokemonType::Grass), 2.0);
        assert_eq!(effectiveness(PokemonType::Water, PokemonType::Fire), 2.0);
        assert_eq!(effectiveness(PokemonType::Fire, PokemonType::Water), 0.5);
        assert_eq!(effectiveness(PokemonType::Normal, PokemonType::Ghost), 0.0);
        assert_eq!(effectiveness(PokemonType::Electric, PokemonType::Ground), 0.0);
        assert_eq!(effectiveness(PokemonType::Dragon, PokemonType::Fairy), 0.0);
    }

    #[test]
    fn test_dual_type_multiplier_is_product() {
        // Fire vs Grass/Steel = 4x
        assert_eq!(
            effectiveness_multiplier(PokemonType::Fire, &[PokemonType::Grass, PokemonType::Steel]),
            4.0
        );
        // Fire vs Water/Rock = 0.25x
        assert_eq!(
            effectiveness_multiplier(PokemonType::Fire, &[PokemonType::Water, PokemonType::Rock]),
            0.25
        );
        // Ground vs Flying/Steel = 0x, one immunity zeroes the product
        assert_eq!(
            effectiveness_multiplier(
                PokemonType::Ground,
                &[PokemonType::Flying, PokemonType::Steel]
            ),
            0.0
        );
        // Empty defender list defaults to neutral
        assert_eq!(effectiveness_multiplier(PokemonType::Fire, &[]), 1.0);
    }

    #[test]
    fn test_dual_type_products_stay_in_domain() {
        for attack in PokemonType::ALL {
            for d1 in PokemonType::ALL {
                for d2 in PokemonType::ALL {
                    let m = effectiveness_multiplier(attack, &[d1, d2]);
                    assert!([0.0, 0.25, 0.5, 1.0, 2.0, 4.0].contains(&m));
                }
            }
        }
    }

    #[test]
    fn test_effectiveness_category_partition() {
        assert_eq!(effectiveness_category(0.0), Effectiveness::Immune);
        assert_eq!(effectiveness_category(0.25), Effectiveness::NotEffective);
        assert_eq!(effectiveness_category(0.5), Effectiveness::NotEffective);
        // The boundary value is normal, never super effective
        assert_eq!(effectiveness_category(1.0), Effectiveness::Normal);
        assert_eq!(effectiveness_category(2.0), Effectiveness::SuperEffective);
        assert_eq!(effectiveness_category(4.0), Effectiveness::SuperEffective);
    }

    fn stats(attack: u32, special_attack: u32, defense: u32, special_defense: u32) -> BaseStats {
        BaseStats {
            hp: 100,
            attack,
            defense,
            special_attack,
            special_defense,
            speed: 100,
        }
    }

    #[test]
    fn test_immunity_forces_zero_damage() {
        let mut rng = SmallRng::seed_from_u64(7);
        let attacker = stats(999, 999, 100, 100);
        let defender = stats(100, 100, 1, 1);
        for _ in 0..64 {
            let outcome = compute_damage(
                &attacker,
                &defender,
                PokemonType::Normal,
                &[PokemonType::Ghost],
                &config(),
                &mut rng,
            );
            assert_eq!(outcome.damage, 0);
            assert_eq!(outcome.effectiveness, Effectiveness::Immune);
            assert_eq!(outcome.multiplier, 0.0);
        }
    }

    #[test]
    fn test_minimum_damage_floor() {
        let mut rng = SmallRng::seed_from_u64(11);
        // 1/999 * 20 is far below 1 before the floor kicks in
        let attacker = stats(1, 1, 100, 100);
        let defender = stats(100, 100, 999, 999);
        for _ in 0..64 {
            let outcome = compute_damage(
                &attacker,
                &defender,
                PokemonType::Normal,
                &[PokemonType::Normal],
                &config(),
                &mut rng,
            );
            assert_eq!(outcome.damage, 1);
        }
    }

    #[test]
    fn test_special_branch_used_when_special_attack_is_higher() {
        let mut rng = SmallRng::seed_from_u64(13);
        // Special branch pairs 200 against 10_000, so damage lands on the floor;
        // the physical branch would deal on the order of 20.
        let attacker = stats(10, 200, 100, 100);
        let defender = stats(100, 100, 10, 10_000);
        let outcome = compute_damage(
            &attacker,
            &defender,
            PokemonType::Normal,
            &[PokemonType::Normal],
            &config(),
            &mut rng,
        );
        assert_eq!(outcome.damage, 1);
    }

    #[test]
    fn test_attack_tie_stays_physical() {
        let mut rng = SmallRng::seed_from_u64(17);
        let attacker = stats(100, 100, 100, 100);
        let defender = stats(100, 100, 10, 10_000);
        // Physical: 100/10 * 20 = 200 before modifiers; special would floor to 1.
        let outcome = compute_damage(
            &attacker,
            &defender,
            PokemonType::Normal,
            &[PokemonType::Normal],
            &config(),
            &mut rng,
        );
        assert!(outcome.damage > 100);
    }

    #[test]
    fn test_damage_is_positive_whenever_not_immune() {
        let mut rng = SmallRng::seed_from_u64(19);
        let attacker = stats(5, 5, 100, 100);
        let defender = stats(100, 100, 500, 500);
        for defend in PokemonType::ALL {
            let outcome = compute_damage(
                &attacker,
                &defender,
                PokemonType::Fire,
                &[defend],
                &config(),
                &mut rng,
            );
            if outcome.multiplier == 0.0 {
                assert_eq!(outcome.damage, 0);
            } else {
                assert!(outcome.damage >= 1);
            }
        }
    }

    #[test]
    fn test_scale_hp() {
        assert_eq!(scale_hp(0, &config()), 100);
        assert_eq!(scale_hp(100, &config()), 300);
    }

    #[test]
    fn test_first_attacker_by_speed() {
        let mut rng = SmallRng::seed_from_u64(23);
        assert_eq!(first_attacker(100, 50, &mut rng), BattleSlot::Combatant1);
        assert_eq!(first_attacker(50, 100, &mut rng), BattleSlot::Combatant2);
    }

    #[test]
    fn test_first_attacker_tie_is_roughly_even() {
        let mut rng = SmallRng::seed_from_u64(29);
        let mut first = 0u32;
        for _ in 0..1000 {
            if first_attacker(80, 80, &mut rng) == BattleSlot::Combatant1 {
                first += 1;
            }
        }
        assert!((400..=600).contains(&first), "tie split was {}/1000", first);
    }

    #[test]
    fn test_primary_type() {
        assert_eq!(
            primary_type(&[PokemonType::Fire, PokemonType::Flying]),
            PokemonType::Fire
        );
        assert_eq!(primary_type(&[]), PokemonType::Normal);
    }
}
