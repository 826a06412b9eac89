use std::sync::Arc;

use chrono::Utc;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::combat::simulator::{simulate_battle, BattleSimulation};
use crate::combat::state::{
    BattleCombatant, BattleCue, BattlePhase, BattleResult, BattleSlot, BattleSpeed, BattleState,
    CombatSubPhase, Effectiveness,
};
use crate::config::{BattleTimings, Config};
use crate::history::BattleHistoryManager;

const CUE_CHANNEL_CAPACITY: usize = 256;

/// One scheduled transition of the playback machine. The whole animation is a
/// chain of these steps; at any moment at most one is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaybackStep {
    EnterArena,
    BeginCombat,
    Charge { turn: usize },
    Strike { turn: usize },
    Impact { turn: usize },
    DrainHp { turn: usize },
    EndTurn { turn: usize },
    NextTurn { turn: usize },
    Knockout,
    Victory,
    Complete,
}

impl PlaybackStep {
    /// Base delay that elapses before this step fires, at 1x speed. The delay
    /// belongs to the phase the machine is leaving.
    fn lead_in_ms(&self, timings: &BattleTimings) -> u64 {
        match self {
            PlaybackStep::EnterArena => timings.preparing_ms,
            PlaybackStep::BeginCombat => timings.arena_enter_ms,
            PlaybackStep::Charge { .. } => timings.turn_start_ms,
            PlaybackStep::Strike { .. } => timings.charging_ms,
            PlaybackStep::Impact { .. } => timings.attacking_ms,
            PlaybackStep::DrainHp { .. } => timings.impact_ms,
            PlaybackStep::EndTurn { .. } => timings.hp_drain_ms,
            PlaybackStep::NextTurn { .. } => timings.turn_end_ms,
            PlaybackStep::Knockout => timings.turn_end_ms,
            PlaybackStep::Victory => timings.knockout_ms,
            PlaybackStep::Complete => timings.victory_ms,
        }
    }
}

/// Mutable playback bookkeeping, guarded by one mutex so every transition and
/// every operation runs on a single logical timeline.
struct PlaybackInner {
    state: BattleState,
    simulation: Option<BattleSimulation>,
    /// The single pending timer. Arming a new step aborts the previous handle.
    timer: Option<JoinHandle<()>>,
    /// Identity of the next unexecuted step, kept across a pause so resume
    /// re-arms exactly this step.
    next: Option<PlaybackStep>,
    /// Bumped by reset and skip; a fired timer that fails the epoch check is
    /// stale and must not touch state.
    epoch: u64,
    rng: SmallRng,
}

/// Timed playback state machine for one battle. Pre-simulates the whole
/// battle on `start`, then replays the log as a sequence of delayed phase
/// transitions. Consumers read cloned state snapshots, watch phase changes
/// and subscribe to cue events; all mutation stays in here.
pub struct BattlePlayback {
    combatant1: BattleCombatant,
    combatant2: BattleCombatant,
    config: Arc<Config>,
    history: Option<Arc<BattleHistoryManager>>,
    cue_tx: broadcast::Sender<BattleCue>,
    phase_tx: watch::Sender<BattlePhase>,
    inner: Mutex<PlaybackInner>,
}

impl BattlePlayback {
    pub fn new(
        combatant1: BattleCombatant,
        combatant2: BattleCombatant,
        config: Arc<Config>,
        history: Option<Arc<BattleHistoryManager>>,
    ) -> Arc<Self> {
        Self::with_rng(combatant1, combatant2, config, history, SmallRng::from_entropy())
    }

    /// Seeded variant: the pre-simulation becomes fully reproducible.
    pub fn with_seed(
        combatant1: BattleCombatant,
        combatant2: BattleCombatant,
        config: Arc<Config>,
        history: Option<Arc<BattleHistoryManager>>,
        seed: u64,
    ) -> Arc<Self> {
        Self::with_rng(
            combatant1,
            combatant2,
            config,
            history,
            SmallRng::seed_from_u64(seed),
        )
    }

    fn with_rng(
        combatant1: BattleCombatant,
        combatant2: BattleCombatant,
        config: Arc<Config>,
        history: Option<Arc<BattleHistoryManager>>,
        rng: SmallRng,
    ) -> Arc<Self> {
        let (cue_tx, _) = broadcast::channel(CUE_CHANNEL_CAPACITY);
        let (phase_tx, _) = watch::channel(BattlePhase::Idle);
        Arc::new(BattlePlayback {
            combatant1,
            combatant2,
            config,
            history,
            cue_tx,
            phase_tx,
            inner: Mutex::new(PlaybackInner {
                state: BattleState::default(),
                simulation: None,
                timer: None,
                next: None,
                epoch: 0,
                rng,
            }),
        })
    }

    pub fn subscribe_cues(&self) -> broadcast::Receiver<BattleCue> {
        self.cue_tx.subscribe()
    }

    pub fn phase_watcher(&self) -> watch::Receiver<BattlePhase> {
        self.phase_tx.subscribe()
    }

    /// Cloned snapshot of the current battle state.
    pub async fn state(&self) -> BattleState {
        self.inner.lock().await.state.clone()
    }

    /// Pre-simulate the battle and begin playback. No-op unless idle; call
    /// `reset` first to replay.
    pub async fn start(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        if inner.state.phase != BattlePhase::Idle {
            warn!(
                "Ignoring start: battle {} vs {} is already in phase {:?}",
                self.combatant1.name, self.combatant2.name, inner.state.phase
            );
            return;
        }

        let simulation = simulate_battle(
            &self.combatant1,
            &self.combatant2,
            &self.config.battle,
            &mut inner.rng,
        );
        info!(
            "Battle {} vs {}: pre-simulated {} rounds, winner {}",
            self.combatant1.name, self.combatant2.name, simulation.total_rounds, simulation.winner_name
        );

        let mut state = BattleState::default();
        state.phase = BattlePhase::Preparing;
        state.combatant1 = Some(self.combatant1.clone());
        state.combatant2 = Some(self.combatant2.clone());
        state.combatant1_hp = simulation.combatant1_max_hp;
        state.combatant2_hp = simulation.combatant2_max_hp;
        state.combatant1_max_hp = simulation.combatant1_max_hp;
        state.combatant2_max_hp = simulation.combatant2_max_hp;

        inner.state = state;
        inner.simulation = Some(simulation);

        self.phase_tx.send_replace(BattlePhase::Preparing);
        self.cue(BattleCue::BattleStart);
        self.arm(&mut inner, PlaybackStep::EnterArena);
    }

    /// Only affects delays armed after the change; the pending delay and all
    /// damage values are untouched.
    pub async fn set_speed(&self, speed: BattleSpeed) {
        let mut inner = self.inner.lock().await;
        debug!(?speed, "Playback speed changed");
        inner.state.speed = speed;
    }

    /// Cancel the pending transition without advancing state. The next
    /// unexecuted step stays recorded for `resume`.
    pub async fn pause(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state.is_paused
            || matches!(inner.state.phase, BattlePhase::Idle | BattlePhase::Complete)
        {
            return;
        }
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        inner.state.is_paused = true;
        debug!("Playback paused before {:?}", inner.next);
    }

    /// Re-arm exactly the step that was pending when `pause` hit. No-op when
    /// not paused.
    pub async fn resume(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        if !inner.state.is_paused {
            return;
        }
        inner.state.is_paused = false;
        if let Some(step) = inner.next {
            self.arm(&mut inner, step);
        }
    }

    /// Cancel all pending work and jump straight to the final state. Cues for
    /// the skipped turns never fire.
    pub async fn skip_to_end(&self) {
        let mut inner = self.inner.lock().await;
        if matches!(inner.state.phase, BattlePhase::Idle | BattlePhase::Complete) {
            return;
        }
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        inner.next = None;
        inner.epoch += 1;

        let inner = &mut *inner;
        let Some(simulation) = inner.simulation.as_ref() else {
            return;
        };
        inner.state.combatant1_hp = simulation.combatant1_final_hp;
        inner.state.combatant2_hp = simulation.combatant2_final_hp;
        inner.state.round = simulation.total_rounds;
        inner.state.winner = Some(simulation.winner);
        inner.state.battle_log = simulation.log.clone();
        inner.state.combat_sub_phase = None;
        inner.state.current_attacker = None;

        info!(
            "Battle {} vs {} skipped to end",
            self.combatant1.name, self.combatant2.name
        );
        self.finish(inner);
    }

    /// Cancel everything and return to idle, the only re-entry into `Idle`.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        inner.next = None;
        inner.epoch += 1;
        inner.simulation = None;
        inner.state = BattleState::default();
        self.phase_tx.send_replace(BattlePhase::Idle);
        info!(
            "Battle {} vs {} reset",
            self.combatant1.name, self.combatant2.name
        );
    }

    fn cue(&self, cue: BattleCue) {
        // No receivers is fine; cue consumers are optional.
        let _ = self.cue_tx.send(cue);
    }

    /// Arm `step` as the single pending transition, aborting any previous
    /// timer first. The delay is the step's base duration divided by the
    /// current speed, sampled now.
    fn arm(self: &Arc<Self>, inner: &mut PlaybackInner, step: PlaybackStep) {
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        inner.next = Some(step);

        let delay_ms = step.lead_in_ms(&self.config.timings) / inner.state.speed.multiplier();
        let epoch = inner.epoch;
        let playback = Arc::clone(self);
        inner.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            playback.advance(epoch).await;
        }));
    }

    /// Timer callback: execute the pending step and arm its successor.
    async fn advance(self: Arc<Self>, epoch: u64) {
        let mut inner = self.inner.lock().await;
        // A stale timer (cancelled by reset/skip) or a pause that won the
        // race must not mutate state.
        if inner.epoch != epoch || inner.state.is_paused {
            return;
        }
        // This task is the timer that just fired; drop its handle so arming
        // the successor does not abort the running step.
        inner.timer = None;
        let Some(step) = inner.next.take() else {
            return;
        };

        debug!(?step, "Playback step");
        let next = self.apply(&mut inner, step);
        match next {
            Some(next) => self.arm(&mut inner, next),
            None => inner.timer = None,
        }
    }

    /// Execute one step's side effects on the battle state and report the
    /// step that follows it.
    fn apply(&self, inner: &mut PlaybackInner, step: PlaybackStep) -> Option<PlaybackStep> {
        if let PlaybackStep::Complete = step {
            self.finish(inner);
            return None;
        }

        let PlaybackInner {
            state, simulation, ..
        } = inner;
        let simulation = simulation.as_ref()?;

        match step {
            // Handled above; the terminal step never reaches this match.
            PlaybackStep::Complete => None,
            PlaybackStep::EnterArena => {
                state.phase = BattlePhase::ArenaEnter;
                self.phase_tx.send_replace(BattlePhase::ArenaEnter);
                self.cue(BattleCue::PokemonCry {
                    slot: BattleSlot::Combatant1,
                });
                self.cue(BattleCue::PokemonCry {
                    slot: BattleSlot::Combatant2,
                });
                Some(PlaybackStep::BeginCombat)
            }
            PlaybackStep::BeginCombat => {
                state.phase = BattlePhase::Combat;
                self.phase_tx.send_replace(BattlePhase::Combat);
                if simulation.log.is_empty() {
                    state.winner = Some(simulation.winner);
                    return Some(PlaybackStep::Knockout);
                }
                Self::enter_turn(state, simulation, 0);
                Some(PlaybackStep::Charge { turn: 0 })
            }
            PlaybackStep::NextTurn { turn } => {
                Self::enter_turn(state, simulation, turn);
                Some(PlaybackStep::Charge { turn })
            }
            PlaybackStep::Charge { turn } => {
                let entry = &simulation.log[turn];
                state.combat_sub_phase = Some(CombatSubPhase::Charging);
                self.cue(BattleCue::Charge {
                    slot: entry.attacker,
                });
                Some(PlaybackStep::Strike { turn })
            }
            PlaybackStep::Strike { turn } => {
                let entry = &simulation.log[turn];
                state.combat_sub_phase = Some(CombatSubPhase::Attacking);
                self.cue(BattleCue::Attack {
                    slot: entry.attacker,
                    attack_type: entry.attack_type,
                });
                Some(PlaybackStep::Impact { turn })
            }
            PlaybackStep::Impact { turn } => {
                let entry = &simulation.log[turn];
                state.combat_sub_phase = Some(CombatSubPhase::Impact);
                state.last_damage = entry.damage;
                state.last_is_critical = entry.is_critical;
                state.last_effectiveness = Some(entry.effectiveness);
                if entry.is_critical {
                    self.cue(BattleCue::CriticalHit);
                } else {
                    self.cue(BattleCue::Hit);
                }
                match entry.effectiveness {
                    Effectiveness::SuperEffective => self.cue(BattleCue::SuperEffective),
                    Effectiveness::NotEffective => self.cue(BattleCue::NotEffective),
                    _ => {}
                }
                Some(PlaybackStep::DrainHp { turn })
            }
            PlaybackStep::DrainHp { turn } => {
                let entry = &simulation.log[turn];
                state.combat_sub_phase = Some(CombatSubPhase::HpDrain);
                // Live HP mirrors the log entry's post-turn value.
                state.set_live_hp(entry.attacker.other(), entry.defender_hp_after);
                self.cue(BattleCue::HpDecrease {
                    slot: entry.attacker.other(),
                });
                Some(PlaybackStep::EndTurn { turn })
            }
            PlaybackStep::EndTurn { turn } => {
                let entry = &simulation.log[turn];
                state.combat_sub_phase = Some(CombatSubPhase::TurnEnd);
                state.battle_log.push(entry.clone());
                if entry.defender_hp_after == 0 {
                    state.winner = Some(entry.attacker);
                    Some(PlaybackStep::Knockout)
                } else if turn + 1 >= simulation.log.len() {
                    // Round cap hit without a faint; the pre-simulated verdict stands.
                    state.winner = Some(simulation.winner);
                    Some(PlaybackStep::Knockout)
                } else {
                    Some(PlaybackStep::NextTurn { turn: turn + 1 })
                }
            }
            PlaybackStep::Knockout => {
                state.phase = BattlePhase::Knockout;
                state.combat_sub_phase = None;
                self.phase_tx.send_replace(BattlePhase::Knockout);
                self.cue(BattleCue::Faint {
                    slot: simulation.loser,
                });
                Some(PlaybackStep::Victory)
            }
            PlaybackStep::Victory => {
                state.phase = BattlePhase::Victory;
                self.phase_tx.send_replace(BattlePhase::Victory);
                self.cue(BattleCue::Victory {
                    slot: simulation.winner,
                });
                Some(PlaybackStep::Complete)
            }
        }
    }

    fn enter_turn(state: &mut BattleState, simulation: &BattleSimulation, turn: usize) {
        let entry = &simulation.log[turn];
        state.round = entry.round;
        state.current_attacker = Some(entry.attacker);
        state.combat_sub_phase = Some(CombatSubPhase::TurnStart);
        state.last_attack_type = Some(entry.attack_type);
    }

    /// Enter the terminal phase: build the one and only result, hand it to
    /// the history collaborator and stop scheduling.
    fn finish(&self, inner: &mut PlaybackInner) {
        if inner.state.result.is_some() {
            return;
        }
        let Some(simulation) = inner.simulation.as_ref() else {
            return;
        };

        let result = BattleResult {
            winner: simulation.winner,
            loser: simulation.loser,
            winner_name: simulation.winner_name.clone(),
            loser_name: simulation.loser_name.clone(),
            total_rounds: simulation.total_rounds,
            stats: simulation.stats.clone(),
            battle_log: simulation.log.clone(),
            timestamp: Utc::now().to_rfc3339(),
        };

        inner.state.phase = BattlePhase::Complete;
        inner.state.combat_sub_phase = None;
        inner.state.result = Some(result.clone());

        if let Some(history) = &self.history {
            history.record(&result, &self.combatant1, &self.combatant2);
        }
        self.phase_tx.send_replace(BattlePhase::Complete);
        info!(
            "Battle complete: {} defeated {} in {} rounds",
            result.winner_name, result.loser_name, result.total_rounds
        );
    }
}
