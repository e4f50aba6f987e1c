use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{BouquetFlower, FlowerId};

pub const MAX_FLOWERS: u32 = 10;
/// The pick step refuses to advance below this many flowers. Not enforced on
/// persistence.
pub const MIN_FLOWERS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added { count: u32 },
    TooMany,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Decremented { count: u32 },
    Removed,
    Absent,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidSelection {
    #[error("flower {id} has a zero count")]
    ZeroCount { id: FlowerId },
    #[error("flower {id} listed more than once")]
    Duplicate { id: FlowerId },
    #[error("selection holds more than {limit} flowers")]
    TooMany { limit: u32 },
}

/// Picked-flower multiset in insertion order. No entry ever holds a zero
/// count and the total never exceeds [`MAX_FLOWERS`]; deserialized
/// selections are checked against the same rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BouquetFlower>", into = "Vec<BouquetFlower>")]
pub struct Selection {
    entries: Vec<BouquetFlower>,
}

impl TryFrom<Vec<BouquetFlower>> for Selection {
    type Error = InvalidSelection;

    fn try_from(entries: Vec<BouquetFlower>) -> Result<Self, Self::Error> {
        let mut total = 0u32;
        for (index, entry) in entries.iter().enumerate() {
            if entry.count == 0 {
                return Err(InvalidSelection::ZeroCount { id: entry.id });
            }
            if entries[..index].iter().any(|earlier| earlier.id == entry.id) {
                return Err(InvalidSelection::Duplicate { id: entry.id });
            }
            total = total.saturating_add(entry.count);
            if total > MAX_FLOWERS {
                return Err(InvalidSelection::TooMany { limit: MAX_FLOWERS });
            }
        }
        Ok(Self { entries })
    }
}

impl From<Selection> for Vec<BouquetFlower> {
    fn from(selection: Selection) -> Self {
        selection.entries
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: FlowerId) -> AddOutcome {
        if self.total() >= MAX_FLOWERS {
            return AddOutcome::TooMany;
        }
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.count += 1;
                AddOutcome::Added { count: entry.count }
            }
            None => {
                self.entries.push(BouquetFlower { id, count: 1 });
                AddOutcome::Added { count: 1 }
            }
        }
    }

    pub fn remove(&mut self, id: FlowerId) -> RemoveOutcome {
        let Some(position) = self.entries.iter().position(|entry| entry.id == id) else {
            return RemoveOutcome::Absent;
        };
        let entry = &mut self.entries[position];
        if entry.count <= 1 {
            self.entries.remove(position);
            RemoveOutcome::Removed
        } else {
            entry.count -= 1;
            RemoveOutcome::Decremented { count: entry.count }
        }
    }

    pub fn total(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |total, entry| total.saturating_add(entry.count))
    }

    pub fn count_of(&self, id: FlowerId) -> u32 {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map_or(0, |entry| entry.count)
    }

    pub fn meets_minimum(&self) -> bool {
        self.total() >= MIN_FLOWERS
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[BouquetFlower] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<BouquetFlower> {
        self.entries
    }
}
