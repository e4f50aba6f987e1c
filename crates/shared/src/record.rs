//! Read-time migration of stored bouquet records.
//!
//! Records written over the life of the service disagree on shape: the order
//! field is `flower_order` or `flowerOrder`, the letter is either an object or
//! a JSON-encoded string, and some rows carry the same flower id twice. All
//! of them are migrated here into the canonical [`Bouquet`] exactly once, and
//! the caller gets back either the bouquet or an explicit [`InvalidRecord`].

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::{
    catalog,
    domain::{Bouquet, BouquetFlower, FlowerId, Letter, DEFAULT_MODE},
    error::ApiError,
    selection::MAX_FLOWERS,
};

/// Version stamped on every record this service writes.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidRecord {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("record has no flowers field")]
    MissingFlowers,
    #[error("flowers field is not a sequence")]
    FlowersNotSequence,
    #[error("flower entry {index} is malformed: {reason}")]
    MalformedFlower { index: usize, reason: String },
    #[error("record holds more than {limit} flowers")]
    TooManyFlowers { limit: u32 },
}

impl From<InvalidRecord> for ApiError {
    fn from(value: InvalidRecord) -> Self {
        ApiError::invalid_data(value.to_string())
    }
}

/// Non-fatal repairs applied while migrating a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    LetterUndecodable,
    FlowerOrderMalformed,
    ZeroCountDropped { id: FlowerId },
    UnknownFlowerDropped { id: FlowerId },
    DuplicateMerged { id: FlowerId },
    TimestampUnparsable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub bouquet: Bouquet,
    pub recoveries: Vec<Recovery>,
}

impl NormalizedRecord {
    pub fn letter_recovered(&self) -> bool {
        self.recoveries.contains(&Recovery::LetterUndecodable)
    }
}

#[derive(Deserialize)]
struct RawFlower {
    id: u32,
    count: i64,
}

pub fn normalize(raw: &Value) -> Result<NormalizedRecord, InvalidRecord> {
    let object = raw.as_object().ok_or(InvalidRecord::NotAnObject)?;
    let mut recoveries = Vec::new();

    let flowers = migrate_flowers(object, &mut recoveries)?;
    let letter = migrate_letter(object.get("letter"), &mut recoveries);
    let flower_order = migrate_flower_order(object, &mut recoveries);
    let created_at = migrate_timestamp(object.get("timestamp"), &mut recoveries);

    let mode = object
        .get("mode")
        .and_then(Value::as_str)
        .filter(|mode| !mode.trim().is_empty())
        .unwrap_or(DEFAULT_MODE)
        .to_string();
    let greenery = object
        .get("greenery")
        .and_then(Value::as_u64)
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(0);

    Ok(NormalizedRecord {
        bouquet: Bouquet {
            mode,
            flowers,
            letter,
            greenery,
            created_at,
            flower_order,
        },
        recoveries,
    })
}

fn migrate_flowers(
    object: &Map<String, Value>,
    recoveries: &mut Vec<Recovery>,
) -> Result<Vec<BouquetFlower>, InvalidRecord> {
    let raw = match object.get("flowers") {
        None | Some(Value::Null) => return Err(InvalidRecord::MissingFlowers),
        Some(raw) => raw,
    };
    let entries = raw.as_array().ok_or(InvalidRecord::FlowersNotSequence)?;

    let mut flowers: Vec<BouquetFlower> = Vec::with_capacity(entries.len());
    // Bounded per entry before summing, so this never overflows.
    let mut total = 0u32;
    for (index, entry) in entries.iter().enumerate() {
        let parsed = RawFlower::deserialize(entry).map_err(|err| InvalidRecord::MalformedFlower {
            index,
            reason: err.to_string(),
        })?;
        let id = FlowerId(parsed.id);
        let count = u32::try_from(parsed.count).map_err(|_| InvalidRecord::MalformedFlower {
            index,
            reason: format!("count {} out of range", parsed.count),
        })?;
        if count == 0 {
            recoveries.push(Recovery::ZeroCountDropped { id });
            continue;
        }
        if count > MAX_FLOWERS {
            return Err(InvalidRecord::TooManyFlowers { limit: MAX_FLOWERS });
        }
        if !catalog::contains(id) {
            warn!(%id, "dropping flower missing from the catalog");
            recoveries.push(Recovery::UnknownFlowerDropped { id });
            continue;
        }
        total += count;
        if total > MAX_FLOWERS {
            return Err(InvalidRecord::TooManyFlowers { limit: MAX_FLOWERS });
        }
        match flowers.iter_mut().find(|flower| flower.id == id) {
            Some(existing) => {
                existing.count += count;
                recoveries.push(Recovery::DuplicateMerged { id });
            }
            None => flowers.push(BouquetFlower { id, count }),
        }
    }
    Ok(flowers)
}

fn migrate_letter(raw: Option<&Value>, recoveries: &mut Vec<Recovery>) -> Letter {
    let decoded = match raw {
        None | Some(Value::Null) => return Letter::default(),
        Some(Value::String(encoded)) => serde_json::from_str::<Letter>(encoded),
        Some(value) => Letter::deserialize(value),
    };
    match decoded {
        Ok(letter) => letter,
        Err(error) => {
            warn!(%error, "failed to decode bouquet letter; substituting an empty letter");
            recoveries.push(Recovery::LetterUndecodable);
            Letter::default()
        }
    }
}

fn migrate_flower_order(object: &Map<String, Value>, recoveries: &mut Vec<Recovery>) -> Vec<usize> {
    let raw = ["flowerOrder", "flower_order"]
        .iter()
        .find_map(|key| object.get(*key).filter(|value| !value.is_null()));
    let Some(raw) = raw else {
        return Vec::new();
    };

    let parsed: Option<Vec<usize>> = raw.as_array().and_then(|items| {
        items
            .iter()
            .map(|item| item.as_u64().and_then(|v| usize::try_from(v).ok()))
            .collect()
    });
    parsed.unwrap_or_else(|| {
        warn!("ignoring malformed flower order; falling back to natural order");
        recoveries.push(Recovery::FlowerOrderMalformed);
        Vec::new()
    })
}

fn migrate_timestamp(raw: Option<&Value>, recoveries: &mut Vec<Recovery>) -> Option<DateTime<Utc>> {
    let parsed = match raw {
        None | Some(Value::Null) => return None,
        Some(Value::String(text)) => parse_timestamp_text(text),
        Some(Value::Number(millis)) => millis
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        Some(_) => None,
    };
    if parsed.is_none() {
        recoveries.push(Recovery::TimestampUnparsable);
    }
    parsed
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Rows written without an offset are UTC.
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[path = "tests/record_tests.rs"]
mod tests;
