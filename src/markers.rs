use log::{debug, info, warn};

use crate::map::{AnimationId, CameraTarget, MapSurface, MarkerHandle, MarkerStyle};
use crate::models::SearchResult;

/// 지도 위 마커와 그 마커가 가리키는 장소
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerEntry {
    pub marker: MarkerHandle,
    pub item: SearchResult,
}

/// 현재 지도에 그려진 마커 목록의 유일한 소유자
pub struct MarkerManager {
    entries: Vec<MarkerEntry>,
    fly_zoom: f64,
    last_flight: Option<AnimationId>,
}

impl MarkerManager {
    pub fn new(fly_zoom: f64) -> Self {
        Self {
            entries: Vec::new(),
            fly_zoom,
            last_flight: None,
        }
    }

    pub fn entries(&self) -> &[MarkerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 마지막으로 시작한 카메라 이동
    pub fn last_flight(&self) -> Option<AnimationId> {
        self.last_flight
    }

    pub fn entry_for(&self, handle: MarkerHandle) -> Option<&MarkerEntry> {
        self.entries.iter().find(|e| e.marker == handle)
    }

    /// 기존 마커를 모두 지우고 새 목록으로 마커를 만든다
    pub fn create_markers<M: MapSurface>(&mut self, map: &mut M, items: &[SearchResult]) -> &[MarkerEntry] {
        self.clear_markers(map);

        let mut rejected = 0;
        for item in items {
            let Some(position) = item.coordinates() else {
                warn!(
                    "⚠️ 잘못된 좌표로 마커 생략: {} ({} #{}) lon={:?} lat={:?}",
                    item.name, item.place_type, item.place_id, item.lon, item.lat
                );
                rejected += 1;
                continue;
            };
            if self.entries.iter().any(|e| e.item.key() == item.key()) {
                debug!("📍 중복 장소 생략: {} #{}", item.place_type, item.place_id);
                continue;
            }
            if !item.in_seoul() {
                warn!("⚠️ 서울 밖 좌표: {} ({}, {})", item.name, position.x(), position.y());
            }

            let marker = map.add_marker(position, item, MarkerStyle::Default);
            self.entries.push(MarkerEntry {
                marker,
                item: item.clone(),
            });
        }

        self.last_flight = match self.entries.first().and_then(|e| e.item.coordinates()) {
            Some(center) => {
                map.stop();
                Some(map.fly_to(CameraTarget {
                    center,
                    zoom: self.fly_zoom,
                }))
            }
            None => None,
        };

        info!("📍 마커 {}개 생성 ({}개 좌표 오류)", self.entries.len(), rejected);
        &self.entries
    }

    /// 모든 마커를 지도에서 먼저 제거한 뒤 목록을 비운다
    pub fn clear_markers<M: MapSurface>(&mut self, map: &mut M) {
        if self.entries.is_empty() {
            return;
        }
        let count = self.entries.len();
        for entry in self.entries.drain(..) {
            map.remove_marker(entry.marker);
        }
        debug!("🧹 마커 {}개 제거", count);
    }

    /// 이미 그려진 마커로 카메라를 옮긴다. 해당 마커가 없으면 아무것도 하지 않는다
    pub fn focus_marker<M: MapSurface>(
        &mut self,
        map: &mut M,
        item: &SearchResult,
    ) -> Option<(MarkerHandle, AnimationId)> {
        let key = item.key();
        let Some(entry) = self.entries.iter().find(|e| e.item.key() == key) else {
            debug!("🔍 포커스할 마커 없음: {} #{}", item.place_type, item.place_id);
            return None;
        };
        let marker = entry.marker;
        let center = entry.item.coordinates()?;

        map.stop();
        let animation = map.fly_to(CameraTarget {
            center,
            zoom: self.fly_zoom,
        });
        self.last_flight = Some(animation);
        Some((marker, animation))
    }

    /// 강조 마커 하나만 남기고 그 위치로 이동
    pub fn show_highlight_poi<M: MapSurface>(
        &mut self,
        map: &mut M,
        item: &SearchResult,
    ) -> Option<(MarkerHandle, AnimationId)> {
        // 좌표가 잘못되면 기존 검색 결과는 그대로 둔다
        let Some(center) = item.coordinates() else {
            warn!("⚠️ 잘못된 좌표로 강조 마커 생략: {} #{}", item.place_type, item.place_id);
            return None;
        };
        self.clear_markers(map);

        let marker = map.add_marker(center, item, MarkerStyle::Highlight);
        self.entries.push(MarkerEntry {
            marker,
            item: item.clone(),
        });

        map.stop();
        let animation = map.fly_to(CameraTarget {
            center,
            zoom: self.fly_zoom,
        });
        self.last_flight = Some(animation);
        info!("✨ 강조 마커 표시: {}", item.name);
        Some((marker, animation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::testing::FakeMap;
    use crate::models::sample_place;
    use crate::place_types::PlaceType;
    use geo_types::Point;

    #[test]
    fn test_one_marker_per_valid_item() {
        let mut map = FakeMap::default();
        let mut manager = MarkerManager::new(16.0);

        let mut bad_zero = sample_place(2, PlaceType::Cafe, 0.0, 37.5);
        bad_zero.lat = Some(0.0);
        let mut bad_nan = sample_place(3, PlaceType::Cafe, 127.0, 37.5);
        bad_nan.lat = Some(f64::NAN);
        let mut missing = sample_place(4, PlaceType::Cafe, 127.0, 37.5);
        missing.lon = None;

        let items = vec![
            sample_place(1, PlaceType::Cafe, 127.0, 37.5),
            bad_zero,
            bad_nan,
            missing,
            sample_place(5, PlaceType::Restaurant, 126.98, 37.57),
        ];
        let entries = manager.create_markers(&mut map, &items);

        assert_eq!(entries.len(), 2);
        assert_eq!(map.markers.len(), 2);
        assert_eq!(entries[0].item.place_id, 1);
        assert_eq!(entries[1].item.place_id, 5);
    }

    #[test]
    fn test_create_flies_to_first_item() {
        let mut map = FakeMap::default();
        let mut manager = MarkerManager::new(16.0);

        manager.create_markers(&mut map, &[sample_place(1, PlaceType::Cafe, 127.0, 37.5)]);

        let (id, target) = map.last_flight().unwrap();
        assert_eq!(target.center, Point::new(127.0, 37.5));
        assert_eq!(target.zoom, 16.0);
        assert_eq!(manager.last_flight(), Some(id));
        assert_eq!(map.stops, 1);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_recreate_removes_previous_markers_first() {
        let mut map = FakeMap::default();
        let mut manager = MarkerManager::new(16.0);

        manager.create_markers(
            &mut map,
            &[
                sample_place(1, PlaceType::Cafe, 127.0, 37.5),
                sample_place(2, PlaceType::Cafe, 127.01, 37.5),
            ],
        );
        let old: Vec<_> = manager.entries().iter().map(|e| e.marker).collect();

        manager.create_markers(&mut map, &[sample_place(3, PlaceType::Attraction, 126.9, 37.6)]);

        assert_eq!(map.removed, old);
        assert_eq!(map.markers.len(), 1);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_clear_then_empty_create_leaves_nothing() {
        let mut map = FakeMap::default();
        let mut manager = MarkerManager::new(16.0);
        manager.create_markers(&mut map, &[sample_place(1, PlaceType::Cafe, 127.0, 37.5)]);
        let flights_before = map.flights.len();

        manager.clear_markers(&mut map);
        manager.create_markers(&mut map, &[]);

        assert!(manager.is_empty());
        assert!(map.markers.is_empty());
        assert_eq!(map.flights.len(), flights_before);
        assert_eq!(manager.last_flight(), None);
    }

    #[test]
    fn test_duplicate_items_produce_one_marker() {
        let mut map = FakeMap::default();
        let mut manager = MarkerManager::new(16.0);
        let item = sample_place(7, PlaceType::Cafe, 127.0, 37.5);

        manager.create_markers(&mut map, &[item.clone(), item]);

        assert_eq!(manager.len(), 1);
        assert_eq!(map.markers.len(), 1);
    }

    #[test]
    fn test_focus_missing_marker_is_noop() {
        let mut map = FakeMap::default();
        let mut manager = MarkerManager::new(16.0);
        manager.create_markers(&mut map, &[sample_place(1, PlaceType::Cafe, 127.0, 37.5)]);
        let flights_before = map.flights.len();
        let stops_before = map.stops;

        let result = manager.focus_marker(&mut map, &sample_place(99, PlaceType::Cafe, 127.0, 37.5));

        assert!(result.is_none());
        assert_eq!(map.flights.len(), flights_before);
        assert_eq!(map.stops, stops_before);
    }

    #[test]
    fn test_focus_existing_marker_stops_then_flies() {
        let mut map = FakeMap::default();
        let mut manager = MarkerManager::new(15.0);
        let target = sample_place(2, PlaceType::Restaurant, 126.95, 37.55);
        manager.create_markers(
            &mut map,
            &[sample_place(1, PlaceType::Cafe, 127.0, 37.5), target.clone()],
        );

        let (marker, animation) = manager.focus_marker(&mut map, &target).unwrap();

        assert_eq!(manager.entry_for(marker).unwrap().item, target);
        assert_eq!(map.last_flight().unwrap().0, animation);
        assert_eq!(map.last_flight().unwrap().1.center, Point::new(126.95, 37.55));
        assert_eq!(map.stops, 2);
    }

    #[test]
    fn test_highlight_replaces_markers_with_one() {
        let mut map = FakeMap::default();
        let mut manager = MarkerManager::new(16.0);
        manager.create_markers(
            &mut map,
            &[
                sample_place(1, PlaceType::Cafe, 127.0, 37.5),
                sample_place(2, PlaceType::Cafe, 127.01, 37.5),
            ],
        );

        let poi = sample_place(9, PlaceType::Attraction, 126.977, 37.579);
        let (marker, _) = manager.show_highlight_poi(&mut map, &poi).unwrap();

        assert_eq!(manager.len(), 1);
        assert_eq!(map.markers.len(), 1);
        assert_eq!(map.markers[&marker].1, MarkerStyle::Highlight);
    }

    #[test]
    fn test_highlight_rejects_bad_coordinates() {
        let mut map = FakeMap::default();
        let mut manager = MarkerManager::new(16.0);
        let mut poi = sample_place(9, PlaceType::Attraction, 126.977, 37.579);
        poi.lat = Some(f64::NAN);

        assert!(manager.show_highlight_poi(&mut map, &poi).is_none());
        assert!(map.markers.is_empty());
        assert!(map.flights.is_empty());
    }

    #[test]
    fn test_bad_highlight_keeps_search_results() {
        let mut map = FakeMap::default();
        let mut manager = MarkerManager::new(16.0);
        manager.create_markers(
            &mut map,
            &[
                sample_place(1, PlaceType::Cafe, 127.0, 37.5),
                sample_place(2, PlaceType::Restaurant, 127.01, 37.5),
            ],
        );
        let flight = manager.last_flight();

        let poi = sample_place(9, PlaceType::Attraction, 0.0, 37.579);
        assert!(manager.show_highlight_poi(&mut map, &poi).is_none());

        assert_eq!(manager.len(), 2);
        assert_eq!(map.markers.len(), 2);
        assert_eq!(map.flights.len(), 1);
        assert_eq!(manager.last_flight(), flight);
    }
}
