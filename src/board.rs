use chrono::{DateTime, Utc};
use log::debug;
use std::sync::{Arc, RwLock};

use crate::models::{CongestionData, ExternalData, WeatherData};

/// 지역 단위로 들어오는 실시간 데이터
pub trait AreaScoped {
    fn area_id(&self) -> i64;
}

impl AreaScoped for CongestionData {
    fn area_id(&self) -> i64 {
        self.area_id
    }
}

impl AreaScoped for WeatherData {
    fn area_id(&self) -> i64 {
        self.area_id
    }
}

impl AreaScoped for ExternalData {
    fn area_id(&self) -> i64 {
        self.area_id
    }
}

struct Snapshot<T> {
    items: Arc<Vec<T>>,
    received_at: Option<DateTime<Utc>>,
}

/// 서버 푸시마다 통째로 교체되는 최신 스냅샷
pub struct LiveBoard<T> {
    snapshot: RwLock<Snapshot<T>>,
}

pub type CongestionBoard = LiveBoard<CongestionData>;
pub type WeatherBoard = LiveBoard<WeatherData>;
pub type ExternalBoard = LiveBoard<ExternalData>;

impl<T> Default for LiveBoard<T> {
    fn default() -> Self {
        Self {
            snapshot: RwLock::new(Snapshot {
                items: Arc::new(Vec::new()),
                received_at: None,
            }),
        }
    }
}

impl<T: AreaScoped + Clone> LiveBoard<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, items: Vec<T>) {
        let mut snapshot = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        debug!("📡 스냅샷 교체 ({}개 -> {}개)", snapshot.items.len(), items.len());
        snapshot.items = Arc::new(items);
        snapshot.received_at = Some(Utc::now());
    }

    pub fn for_area(&self, area_id: i64) -> Option<T> {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .items
            .iter()
            .find(|item| item.area_id() == area_id)
            .cloned()
    }

    pub fn all(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(|e| e.into_inner()).items)
    }

    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.read().unwrap_or_else(|e| e.into_inner()).received_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CongestionLevel;

    fn congestion(area_id: i64, level: CongestionLevel) -> CongestionData {
        CongestionData {
            area_id,
            area_name: format!("지역 {}", area_id),
            congestion_level: level,
            population_min: 1000,
            population_max: 2000,
            message: None,
        }
    }

    #[test]
    fn test_replace_is_wholesale() {
        let board = CongestionBoard::new();
        assert!(board.received_at().is_none());

        board.replace(vec![
            congestion(1, CongestionLevel::Busy),
            congestion(2, CongestionLevel::Relaxed),
        ]);
        board.replace(vec![congestion(2, CongestionLevel::Normal)]);

        assert!(board.for_area(1).is_none());
        assert_eq!(board.for_area(2).unwrap().congestion_level, CongestionLevel::Normal);
        assert_eq!(board.all().len(), 1);
        assert!(board.received_at().is_some());
    }
}
