use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    arrangement::FlowerInstance,
    domain::{Bouquet, BouquetFlower, Flower, FlowerId, FlowerSize, Letter, ShortId},
    share::ShareLinks,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBouquetRequest {
    pub mode: String,
    pub flowers: Vec<BouquetFlower>,
    #[serde(default)]
    pub letter: Letter,
    #[serde(default)]
    pub greenery: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub flower_order: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBouquetResponse {
    pub short_id: ShortId,
    pub share: ShareLinks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowerSummary {
    pub id: FlowerId,
    pub name: String,
    pub meaning: String,
    pub birth_month: String,
    pub size: FlowerSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl From<&Flower> for FlowerSummary {
    fn from(flower: &Flower) -> Self {
        Self {
            id: flower.id,
            name: flower.name.to_string(),
            meaning: flower.meaning.to_string(),
            birth_month: flower.birth_month.to_string(),
            size: flower.size,
            color: flower.color.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BouquetView {
    pub short_id: ShortId,
    pub bouquet: Bouquet,
    pub instances: Vec<FlowerInstance>,
    /// True when a stored letter could not be decoded and was blanked.
    #[serde(default)]
    pub letter_recovered: bool,
    pub share: ShareLinks,
}
