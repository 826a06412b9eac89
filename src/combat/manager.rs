use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use crate::combat::playback::BattlePlayback;
use crate::combat::state::{BattleCombatant, BattleError, BattleSpeed, BattleState};
use crate::config::Config;
use crate::history::BattleHistoryManager;

/// Manages active battle playback instances, keyed by battle id. Completed
/// battles stay registered (their final state remains readable) until
/// explicitly removed.
pub struct BattleManager {
    active_battles: DashMap<Uuid, Arc<BattlePlayback>>,
    history: Arc<BattleHistoryManager>,
    config: Arc<Config>,
}

impl BattleManager {
    pub fn new(config: Arc<Config>) -> Self {
        let history = Arc::new(BattleHistoryManager::new(config.history.max_entries));
        BattleManager {
            active_battles: DashMap::new(),
            history,
            config,
        }
    }

    pub fn history(&self) -> Arc<BattleHistoryManager> {
        self.history.clone()
    }

    /// Validate both combatants, pre-simulate and begin playback. Nothing is
    /// registered when validation fails, so a refused start leaves no
    /// partial state behind.
    pub async fn start_battle(
        &self,
        combatant1: BattleCombatant,
        combatant2: BattleCombatant,
    ) -> Result<Uuid, BattleError> {
        validate_combatant(&combatant1)?;
        validate_combatant(&combatant2)?;

        let battle_id = Uuid::new_v4();
        info!(
            "Starting battle {}: {} vs {}",
            battle_id, combatant1.name, combatant2.name
        );

        let playback = BattlePlayback::new(
            combatant1,
            combatant2,
            self.config.clone(),
            Some(self.history.clone()),
        );
        playback.start().await;
        self.active_battles.insert(battle_id, playback);
        Ok(battle_id)
    }

    /// Seeded variant for reproducible battles.
    pub async fn start_battle_seeded(
        &self,
        combatant1: BattleCombatant,
        combatant2: BattleCombatant,
        seed: u64,
    ) -> Result<Uuid, BattleError> {
        validate_combatant(&combatant1)?;
        validate_combatant(&combatant2)?;

        let battle_id = Uuid::new_v4();
        info!(
            "Starting seeded battle {}: {} vs {}",
            battle_id, combatant1.name, combatant2.name
        );

        let playback = BattlePlayback::with_seed(
            combatant1,
            combatant2,
            self.config.clone(),
            Some(self.history.clone()),
            seed,
        );
        playback.start().await;
        self.active_battles.insert(battle_id, playback);
        Ok(battle_id)
    }

    pub fn playback(&self, battle_id: Uuid) -> Option<Arc<BattlePlayback>> {
        self.active_battles
            .get(&battle_id)
            .map(|entry| entry.value().clone())
    }

    fn playback_or_err(&self, battle_id: Uuid) -> Result<Arc<BattlePlayback>, BattleError> {
        self.playback(battle_id)
            .ok_or(BattleError::UnknownBattle(battle_id))
    }

    pub async fn battle_state(&self, battle_id: Uuid) -> Result<BattleState, BattleError> {
        Ok(self.playback_or_err(battle_id)?.state().await)
    }

    pub async fn pause(&self, battle_id: Uuid) -> Result<(), BattleError> {
        self.playback_or_err(battle_id)?.pause().await;
        Ok(())
    }

    pub async fn resume(&self, battle_id: Uuid) -> Result<(), BattleError> {
        self.playback_or_err(battle_id)?.resume().await;
        Ok(())
    }

    pub async fn set_speed(&self, battle_id: Uuid, speed: BattleSpeed) -> Result<(), BattleError> {
        self.playback_or_err(battle_id)?.set_speed(speed).await;
        Ok(())
    }

    pub async fn skip_to_end(&self, battle_id: Uuid) -> Result<(), BattleError> {
        self.playback_or_err(battle_id)?.skip_to_end().await;
        Ok(())
    }

    pub async fn reset(&self, battle_id: Uuid) -> Result<(), BattleError> {
        self.playback_or_err(battle_id)?.reset().await;
        Ok(())
    }

    /// Cancel any pending transition and drop the battle from the registry.
    pub async fn remove_battle(&self, battle_id: Uuid) -> Result<(), BattleError> {
        let playback = self.playback_or_err(battle_id)?;
        playback.reset().await;
        self.active_battles.remove(&battle_id);
        info!("Removed battle {}", battle_id);
        Ok(())
    }

    pub fn active_battle_count(&self) -> usize {
        self.active_battles.len()
    }
}

/// Precondition check from the battle core's contract: one or two types and
/// strictly positive stats (damage math divides by defense values).
fn validate_combatant(combatant: &BattleCombatant) -> Result<(), BattleError> {
    if combatant.types.is_empty() || combatant.types.len() > 2 {
        return Err(BattleError::InvalidTypes(combatant.name.clone()));
    }
    if !combatant.stats.all_positive() {
        return Err(BattleError::NonPositiveStat(combatant.name.clone()));
    }
    Ok(())
}
