use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::combat::state::{BattleCombatant, BattleResult, BattleSlot};

/// Identity of one participant as kept in a history record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantSummary {
    pub id: u32,
    pub name: String,
}

/// One completed battle as remembered by the history collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleHistoryRecord {
    pub id: String,
    pub combatant1: CombatantSummary,
    pub combatant2: CombatantSummary,
    pub winner: BattleSlot,
    pub total_rounds: u32,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MostBattled {
    pub id: u32,
    pub name: String,
    pub count: u32,
}

/// Aggregate view over the stored records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_battles: usize,
    /// Wins per species id.
    pub wins: HashMap<u32, u32>,
    /// Win percentage per species id, over that species' appearances.
    pub win_rate: HashMap<u32, f32>,
    pub most_battled: Option<MostBattled>,
}

/// Bounded, append-only battle history: newest first, oldest evicted once the
/// cap is reached.
pub struct BattleHistoryManager {
    max_entries: usize,
    records: Mutex<VecDeque<BattleHistoryRecord>>,
}

impl BattleHistoryManager {
    pub fn new(max_entries: usize) -> Self {
        BattleHistoryManager {
            max_entries,
            records: Mutex::new(VecDeque::new()),
        }
    }

    /// Store one completed battle. Evicts the oldest record when full.
    pub fn record(
        &self,
        result: &BattleResult,
        combatant1: &BattleCombatant,
        combatant2: &BattleCombatant,
    ) -> BattleHistoryRecord {
        let record = BattleHistoryRecord {
            id: Uuid::new_v4().to_string(),
            combatant1: CombatantSummary {
                id: combatant1.id,
                name: combatant1.name.clone(),
            },
            combatant2: CombatantSummary {
                id: combatant2.id,
                name: combatant2.name.clone(),
            },
            winner: result.winner,
            total_rounds: result.total_rounds,
            timestamp: result.timestamp.clone(),
        };

        let mut records = self.records.lock().expect("history lock poisoned");
        records.push_front(record.clone());
        records.truncate(self.max_entries);
        info!(
            "Recorded battle {} vs {} ({} stored)",
            combatant1.name,
            combatant2.name,
            records.len()
        );
        record
    }

    /// Stored records, newest first.
    pub fn recent(&self) -> Vec<BattleHistoryRecord> {
        self.records
            .lock()
            .expect("history lock poisoned")
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("history lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records.lock().expect("history lock poisoned").clear();
    }

    pub fn stats(&self) -> HistoryStats {
        let records = self.records.lock().expect("history lock poisoned");

        let mut wins: HashMap<u32, u32> = HashMap::new();
        let mut appearances: HashMap<u32, (String, u32)> = HashMap::new();

        for record in records.iter() {
            let winner = match record.winner {
                BattleSlot::Combatant1 => &record.combatant1,
                BattleSlot::Combatant2 => &record.combatant2,
            };
            *wins.entry(winner.id).or_insert(0) += 1;

            for summary in [&record.combatant1, &record.combatant2] {
                let entry = appearances
                    .entry(summary.id)
                    .or_insert_with(|| (summary.name.clone(), 0));
                entry.1 += 1;
            }
        }

        let win_rate = appearances
            .iter()
            .map(|(id, (_, count))| {
                let won = wins.get(id).copied().unwrap_or(0);
                (*id, won as f32 / *count as f32 * 100.0)
            })
            .collect();

        let most_battled = appearances
            .iter()
            .max_by_key(|(_, (_, count))| *count)
            .map(|(id, (name, count))| MostBattled {
                id: *id,
                name: name.clone(),
                count: *count,
            });

        HistoryStats {
            total_battles: records.len(),
            wins,
            win_rate,
            most_battled,
        }
    }
}
