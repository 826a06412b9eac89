pub use battle_sim::*;

use std::sync::Arc;

use combat::state::{BattleCombatant, BattlePhase};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let config = Arc::new(config::Config::from_env());

    // Load the bundled species catalog
    let repository = species::SpeciesRepository::load(&config.species.species_path);

    // Matchup is configurable through the environment; defaults to the
    // classic starter rivalry.
    let id1 = species_id_from_env("BATTLE_COMBATANT_1", 6);
    let id2 = species_id_from_env("BATTLE_COMBATANT_2", 9);

    let species1 = repository.get(id1).expect("Unknown species id for combatant 1");
    let species2 = repository.get(id2).expect("Unknown species id for combatant 2");

    let manager = combat::manager::BattleManager::new(config.clone());
    let battle_id = manager
        .start_battle(
            BattleCombatant::from_species(species1),
            BattleCombatant::from_species(species2),
        )
        .await
        .expect("Failed to start battle");

    let playback = manager.playback(battle_id).expect("Battle just started");

    // Log every cue as the audio/visual collaborator would receive it
    let mut cues = playback.subscribe_cues();
    tokio::spawn(async move {
        while let Ok(cue) = cues.recv().await {
            tracing::info!("cue: {:?}", cue);
        }
    });

    // Wait for playback to finish
    let mut phases = playback.phase_watcher();
    while *phases.borrow() != BattlePhase::Complete {
        if phases.changed().await.is_err() {
            break;
        }
    }

    let state = playback.state().await;
    if let Some(result) = state.result {
        tracing::info!(
            "{} defeated {} in {} rounds ({} battles stored in history)",
            result.winner_name,
            result.loser_name,
            result.total_rounds,
            manager.history().len()
        );
    }
}

fn species_id_from_env(var: &str, default: u32) -> u32 {
    std::env::var(var)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
