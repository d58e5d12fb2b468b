use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::api::AreaApi;
use crate::error::Result;
use crate::models::{Area, CategoryContent, CategoryCount};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry<T> {
    value: Arc<T>,
    fetched_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(value: T) -> Self {
        Self {
            value: Arc::new(value),
            fetched_at: Instant::now(),
        }
    }

    fn fresh(&self, ttl: Duration) -> Option<Arc<T>> {
        (self.fetched_at.elapsed() < ttl).then(|| Arc::clone(&self.value))
    }
}

pub struct AreaCache {
    api: Arc<dyn AreaApi>,
    ttl: Duration,
    areas: Mutex<Option<CacheEntry<Vec<Area>>>>,
    places: Mutex<HashMap<i64, CacheEntry<Vec<CategoryContent>>>>,
}

impl AreaCache {
    pub fn new(api: Arc<dyn AreaApi>, ttl: Duration) -> Self {
        Self {
            api,
            ttl,
            areas: Mutex::new(None),
            places: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_area_list(&self) -> Result<Arc<Vec<Area>>> {
        if let Some(hit) = self.lock_areas().as_ref().and_then(|e| e.fresh(self.ttl)) {
            debug!("🗂️ 지역 목록 캐시 사용 ({}개)", hit.len());
            return Ok(hit);
        }

        let areas = self.api.get_area_list().await?;
        info!("🗂️ 지역 목록 캐시 갱신 ({}개)", areas.len());

        let entry = CacheEntry::new(areas);
        let value = Arc::clone(&entry.value);
        *self.lock_areas() = Some(entry);
        Ok(value)
    }

    pub async fn get_place_list(&self, area_id: i64) -> Result<Arc<Vec<CategoryContent>>> {
        if let Some(hit) = self.lock_places().get(&area_id).and_then(|e| e.fresh(self.ttl)) {
            debug!("🗂️ 지역 {} 장소 캐시 사용", area_id);
            return Ok(hit);
        }

        let places = self.api.get_place_list_by_area(area_id).await?;
        info!(
            "🗂️ 지역 {} 장소 캐시 갱신 ({}개 카테고리)",
            area_id,
            places.len()
        );

        let entry = CacheEntry::new(places);
        let value = Arc::clone(&entry.value);
        self.lock_places().insert(area_id, entry);
        Ok(value)
    }

    pub async fn find_area(&self, area_id: i64) -> Result<Option<Area>> {
        let areas = self.get_area_list().await?;
        Ok(areas.iter().find(|a| a.area_id == area_id).cloned())
    }

    /// 카테고리별 장소 개수 (빈 카테고리 포함)
    pub async fn category_counts(&self, area_id: i64) -> Result<Vec<CategoryCount>> {
        let places = self.get_place_list(area_id).await?;
        Ok(places
            .iter()
            .map(|c| CategoryCount {
                category: c.category,
                count: c.content.len(),
            })
            .collect())
    }

    pub fn invalidate(&self) {
        *self.lock_areas() = None;
        self.lock_places().clear();
        info!("🗂️ 캐시 초기화");
    }

    fn lock_areas(&self) -> std::sync::MutexGuard<'_, Option<CacheEntry<Vec<Area>>>> {
        self.areas.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_places(&self) -> std::sync::MutexGuard<'_, HashMap<i64, CacheEntry<Vec<CategoryContent>>>> {
        self.places.lock().unwrap_or_else(|e| e.into_inner())
    }
}
