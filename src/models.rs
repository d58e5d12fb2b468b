use geo_types::{coord, Point, Rect};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::place_types::PlaceType;

/// 서울 경계 (lon, lat)
pub fn seoul_bounds() -> Rect<f64> {
    Rect::new(coord! { x: 126.734, y: 37.413 }, coord! { x: 127.269, y: 37.715 })
}

/// 검색 결과 / 카테고리 클릭 결과로 받는 장소
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub place_id: i64,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub lon: Option<f64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub lat: Option<f64>,
    #[serde(rename = "type")]
    pub place_type: PlaceType,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub area_id: Option<i64>,
}

impl SearchResult {
    pub fn key(&self) -> Favorite {
        Favorite::new(self.place_type, self.place_id)
    }

    /// 지도에 그릴 수 있는 좌표. 누락, 0, NaN, 무한대는 None
    pub fn coordinates(&self) -> Option<Point<f64>> {
        let (lon, lat) = (self.lon?, self.lat?);
        let usable = |v: f64| v.is_finite() && v != 0.0;
        if usable(lon) && usable(lat) {
            Some(Point::new(lon, lat))
        } else {
            None
        }
    }

    pub fn in_seoul(&self) -> bool {
        self.coordinates()
            .map(|p| {
                let bounds = seoul_bounds();
                let (min, max) = (bounds.min(), bounds.max());
                (min.x..=max.x).contains(&p.x()) && (min.y..=max.y).contains(&p.y())
            })
            .unwrap_or(false)
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub area_id: i64,
    pub area_name: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub lat: f64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub lon: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub eng_name: String,
}

impl Area {
    pub fn center(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryContent {
    pub category: PlaceType,
    #[serde(default)]
    pub content: Vec<SearchResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: PlaceType,
    pub count: usize,
}

/// 즐겨찾기 키 (type, place_id)
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Favorite {
    #[serde(rename = "type")]
    pub place_type: PlaceType,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub place_id: i64,
}

impl Favorite {
    pub fn new(place_type: PlaceType, place_id: i64) -> Self {
        Self { place_type, place_id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CongestionLevel {
    #[serde(rename = "여유")]
    Relaxed,
    #[serde(rename = "보통")]
    Normal,
    #[serde(rename = "약간 붐빔")]
    SlightlyBusy,
    #[serde(rename = "붐빔")]
    Busy,
}

impl CongestionLevel {
    pub fn label(self) -> &'static str {
        match self {
            CongestionLevel::Relaxed => "여유",
            CongestionLevel::Normal => "보통",
            CongestionLevel::SlightlyBusy => "약간 붐빔",
            CongestionLevel::Busy => "붐빔",
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CongestionData {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub area_id: i64,
    #[serde(default)]
    pub area_name: String,
    pub congestion_level: CongestionLevel,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub population_min: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub population_max: u64,
    #[serde(default)]
    pub message: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub area_id: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub temperature: f64,
    #[serde(default)]
    pub precipitation_type: String,
    #[serde(default)]
    pub sky_status: String,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub pm10: Option<u32>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub pm25: Option<u32>,
}

/// 교통/주차 등 외부 데이터
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalData {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub area_id: i64,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub traffic_index: Option<f64>,
    #[serde(default)]
    pub road_message: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub parking_available: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationReply {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
pub(crate) fn sample_place(place_id: i64, place_type: PlaceType, lon: f64, lat: f64) -> SearchResult {
    SearchResult {
        place_id,
        name: format!("장소 {}", place_id),
        address: "서울특별시 중구".to_string(),
        phone: None,
        lon: Some(lon),
        lat: Some(lat),
        place_type,
        area_id: Some(1),
    }
}
