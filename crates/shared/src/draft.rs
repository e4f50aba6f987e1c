use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    arrangement::{arrange, shuffle_order, shuffle_order_seeded, FlowerInstance},
    domain::{FlowerId, Letter, DEFAULT_MODE},
    protocol::CreateBouquetRequest,
    selection::{AddOutcome, RemoveOutcome, Selection},
};

/// Bouquet being assembled by one session. Owned by whoever drives the
/// steps; nothing else holds a reference to it until it is published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BouquetDraft {
    pub mode: String,
    pub selection: Selection,
    pub letter: Letter,
    pub greenery: u32,
    pub flower_order: Option<Vec<usize>>,
    pub timestamp: DateTime<Utc>,
}

impl Default for BouquetDraft {
    fn default() -> Self {
        Self::new(DEFAULT_MODE)
    }
}

impl BouquetDraft {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            selection: Selection::new(),
            letter: Letter::default(),
            greenery: 0,
            flower_order: None,
            timestamp: Utc::now(),
        }
    }

    /// Selection changes invalidate any shuffled order.
    pub fn add_flower(&mut self, id: FlowerId) -> AddOutcome {
        let outcome = self.selection.add(id);
        if matches!(outcome, AddOutcome::Added { .. }) {
            self.flower_order = None;
        }
        outcome
    }

    pub fn remove_flower(&mut self, id: FlowerId) -> RemoveOutcome {
        let outcome = self.selection.remove(id);
        if outcome != RemoveOutcome::Absent {
            self.flower_order = None;
        }
        outcome
    }

    pub fn shuffle(&mut self) -> &[usize] {
        let order = shuffle_order(self.selection.total() as usize);
        self.flower_order.insert(order)
    }

    pub fn shuffle_seeded(&mut self, seed: u64) -> &[usize] {
        let order = shuffle_order_seeded(self.selection.total() as usize, seed);
        self.flower_order.insert(order)
    }

    pub fn instances(&self) -> Vec<FlowerInstance> {
        arrange(
            self.selection.entries(),
            self.flower_order.as_deref().unwrap_or_default(),
        )
    }

    pub fn into_request(self) -> CreateBouquetRequest {
        CreateBouquetRequest {
            mode: self.mode,
            flowers: self.selection.into_entries(),
            letter: self.letter,
            greenery: self.greenery,
            timestamp: Some(self.timestamp),
            flower_order: self.flower_order.unwrap_or_default(),
        }
    }
}
