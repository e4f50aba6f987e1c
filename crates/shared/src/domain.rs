use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ApiException, ErrorCode};

pub const SHORT_ID_LEN: usize = 8;
pub const SHORT_ID_MAX_LEN: usize = 64;
pub const DEFAULT_MODE: &str = "color";

const SHORT_ID_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowerId(pub u32);

impl fmt::Display for FlowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public lookup key of a persisted bouquet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortId(String);

impl ShortId {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let id = (0..SHORT_ID_LEN)
            .map(|_| SHORT_ID_ALPHABET[rng.gen_range(0..SHORT_ID_ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    pub fn parse(raw: &str) -> Result<Self, ApiException> {
        let raw = raw.trim();
        if raw.is_empty() || raw.len() > SHORT_ID_MAX_LEN {
            return Err(ApiException::new(
                ErrorCode::Validation,
                "short id must be between 1 and 64 characters",
            ));
        }
        if !raw.bytes().all(|b| SHORT_ID_ALPHABET.contains(&b)) {
            return Err(ApiException::new(
                ErrorCode::Validation,
                "short id contains unsupported characters",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowerSize {
    Small,
    Medium,
    Large,
}

impl FlowerSize {
    /// Edge length in pixels of the rendered flower image.
    pub fn pixels(self) -> u32 {
        match self {
            FlowerSize::Small => 80,
            FlowerSize::Medium => 120,
            FlowerSize::Large => 160,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flower {
    pub id: FlowerId,
    pub name: &'static str,
    pub meaning: &'static str,
    pub birth_month: &'static str,
    pub size: FlowerSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BouquetFlower {
    pub id: FlowerId,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Letter {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub message: String,
}

impl Letter {
    pub fn display_recipient(&self) -> &str {
        non_empty_or(&self.recipient, "Friend")
    }

    pub fn display_message(&self) -> &str {
        non_empty_or(&self.message, "Hope you enjoy this bouquet!")
    }

    pub fn display_sender(&self) -> &str {
        non_empty_or(&self.sender, "Anonymous")
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Canonical in-memory bouquet, whatever revision it was stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bouquet {
    pub mode: String,
    pub flowers: Vec<BouquetFlower>,
    pub letter: Letter,
    pub greenery: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub flower_order: Vec<usize>,
}

impl Bouquet {
    pub fn total_flowers(&self) -> u32 {
        self.flowers
            .iter()
            .fold(0u32, |total, flower| total.saturating_add(flower.count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_flowers_saturates_instead_of_overflowing() {
        let bouquet = Bouquet {
            mode: DEFAULT_MODE.into(),
            flowers: vec![
                BouquetFlower {
                    id: FlowerId(1),
                    count: u32::MAX,
                },
                BouquetFlower {
                    id: FlowerId(2),
                    count: 1,
                },
            ],
            letter: Letter::default(),
            greenery: 0,
            created_at: None,
            flower_order: Vec::new(),
        };
        assert_eq!(bouquet.total_flowers(), u32::MAX);
    }
}
