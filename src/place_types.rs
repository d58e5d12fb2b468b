use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceType {
    Cafe,
    Restaurant,
    Accommodation,
    Attraction,
    CulturalEvent,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaceTypeInfo {
    pub place_type: PlaceType,
    pub id: &'static str,
    pub emoji: &'static str,
    pub name: &'static str,
    pub name_en: &'static str,
}

pub static PLACE_TYPES: [PlaceTypeInfo; 5] = [
    PlaceTypeInfo {
        place_type: PlaceType::Cafe,
        id: "cafe",
        emoji: "☕",
        name: "카페",
        name_en: "Cafe",
    },
    PlaceTypeInfo {
        place_type: PlaceType::Restaurant,
        id: "restaurant",
        emoji: "🍽️",
        name: "음식점",
        name_en: "Restaurant",
    },
    PlaceTypeInfo {
        place_type: PlaceType::Accommodation,
        id: "accommodation",
        emoji: "🏨",
        name: "숙박",
        name_en: "Accommodation",
    },
    PlaceTypeInfo {
        place_type: PlaceType::Attraction,
        id: "attraction",
        emoji: "🏯",
        name: "관광명소",
        name_en: "Attraction",
    },
    PlaceTypeInfo {
        place_type: PlaceType::CulturalEvent,
        id: "cultural_event",
        emoji: "🎭",
        name: "문화행사",
        name_en: "Cultural Event",
    },
];

impl PlaceType {
    pub fn info(self) -> &'static PlaceTypeInfo {
        // PLACE_TYPES 는 열거형 순서와 같다
        &PLACE_TYPES[self as usize]
    }

    pub fn id(self) -> &'static str {
        self.info().id
    }

    pub fn all() -> impl Iterator<Item = PlaceType> {
        PLACE_TYPES.iter().map(|info| info.place_type)
    }
}

impl fmt::Display for PlaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PlaceType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        get_place_type_by_id(s)
            .map(|info| info.place_type)
            .ok_or_else(|| ClientError::InvalidInput(format!("unknown place type: {}", s)))
    }
}

/// id 또는 한글 이름으로 조회
pub fn get_place_type_by_id(id: &str) -> Option<&'static PlaceTypeInfo> {
    PLACE_TYPES
        .iter()
        .find(|info| info.id == id || info.name == id)
}

pub fn get_all_place_types() -> &'static [PlaceTypeInfo] {
    &PLACE_TYPES
}

pub fn is_valid_place_type_id(id: &str) -> bool {
    get_place_type_by_id(id).is_some()
}
