use geo_types::Point;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::board::{CongestionBoard, WeatherBoard};
use crate::cache::AreaCache;
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::error_handler::ErrorHandler;
use crate::favorites::FavoriteStore;
use crate::map::{AnimationId, CameraTarget, MapEvent, MapSurface, MarkerHandle};
use crate::markers::MarkerManager;
use crate::models::{Area, CategoryCount, CongestionData, SearchResult, WeatherData};
use crate::navigation::{disable_scroll_after_mount, PageSection, SectionNavigator};
use crate::place_types::PlaceType;

#[derive(Debug, Clone, PartialEq)]
pub struct PopupCard {
    pub marker: MarkerHandle,
    pub item: SearchResult,
    /// 화면 좌표 (마커 윗변 가운데)
    pub position: (f64, f64),
    pub is_favorite: bool,
}

// 팝업은 카메라 이동이 끝난 뒤(MoveEnd)에만 열린다
#[derive(Debug, Clone, PartialEq)]
pub enum PopupState {
    Idle,
    MarkersShown,
    PendingPopup {
        marker: MarkerHandle,
        animation: AnimationId,
    },
    PopupOpen(PopupCard),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AreaDetail {
    pub area: Area,
    pub congestion: Option<CongestionData>,
    pub weather: Option<WeatherData>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AreaFocus {
    pub detail: AreaDetail,
    pub counts: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FocusState {
    Idle,
    Loading {
        area_id: i64,
    },
    AreaFocusShown(AreaFocus),
    DetailRequested {
        area_id: i64,
    },
    Failed {
        area_id: i64,
        message: &'static str,
        retryable: bool,
    },
}

/// 조정자가 참조하는 공유 서비스
#[derive(Clone)]
pub struct MapServices {
    pub cache: Arc<AreaCache>,
    pub favorites: Arc<FavoriteStore>,
    pub congestion: Arc<CongestionBoard>,
    pub weather: Arc<WeatherBoard>,
    pub navigator: Arc<dyn SectionNavigator>,
}

pub struct MapCoordinator<M: MapSurface> {
    map: M,
    markers: MarkerManager,
    services: MapServices,
    popup: PopupState,
    focus: FocusState,
    move_end_listener: Option<AnimationId>,
    area_focus_zoom: f64,
    scroll_lock_delay: Duration,
}

impl<M: MapSurface> MapCoordinator<M> {
    pub fn new(map: M, services: MapServices, config: &Config) -> Self {
        Self {
            map,
            markers: MarkerManager::new(config.marker_fly_zoom),
            services,
            popup: PopupState::Idle,
            focus: FocusState::Idle,
            move_end_listener: None,
            area_focus_zoom: config.area_focus_zoom,
            scroll_lock_delay: config.scroll_lock_delay(),
        }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn markers(&self) -> &MarkerManager {
        &self.markers
    }

    pub fn popup(&self) -> &PopupState {
        &self.popup
    }

    pub fn focus(&self) -> &FocusState {
        &self.focus
    }

    /// 마운트 직후 페이지 스크롤을 끈다
    pub fn mount(&self) -> JoinHandle<()> {
        info!("📍 지도 섹션 마운트");
        tokio::spawn(disable_scroll_after_mount(
            Arc::clone(&self.services.navigator),
            self.scroll_lock_delay,
        ))
    }

    /// 검색/카테고리 결과를 마커로 표시. 이동 중에는 포커스 카드를 숨긴다
    pub fn show_search_results(&mut self, items: &[SearchResult]) -> usize {
        self.focus = FocusState::Idle;
        self.move_end_listener = None;

        let count = self.markers.create_markers(&mut self.map, items).len();
        self.popup = if count == 0 {
            PopupState::Idle
        } else {
            PopupState::MarkersShown
        };
        count
    }

    pub fn clear_results(&mut self) {
        self.markers.clear_markers(&mut self.map);
        self.move_end_listener = None;
        self.popup = PopupState::Idle;
    }

    /// 해당 장소의 마커로 이동하고 팝업을 토글한다. 마커가 없으면 false
    pub fn focus_marker(&mut self, item: &SearchResult) -> bool {
        let Some((marker, animation)) = self.markers.focus_marker(&mut self.map, item) else {
            return false;
        };

        let already_open = matches!(&self.popup, PopupState::PopupOpen(card) if card.marker == marker);
        if already_open {
            debug!("📍 팝업 닫기 (같은 마커 재선택)");
            self.move_end_listener = None;
            self.popup = PopupState::Idle;
        } else {
            self.await_move_end(marker, animation);
        }
        true
    }

    /// 강조 장소 하나만 표시하고 이동이 끝나면 팝업을 연다
    pub fn show_highlight_poi(&mut self, item: &SearchResult) -> bool {
        match self.markers.show_highlight_poi(&mut self.map, item) {
            Some((marker, animation)) => {
                self.focus = FocusState::Idle;
                self.await_move_end(marker, animation);
                true
            }
            None => false,
        }
    }

    pub fn close_popup(&mut self) {
        if matches!(self.popup, PopupState::PopupOpen(_) | PopupState::PendingPopup { .. }) {
            debug!("📍 팝업 닫기");
            self.move_end_listener = None;
            self.popup = PopupState::Idle;
        }
    }

    pub async fn handle_event(&mut self, event: MapEvent) {
        match event {
            MapEvent::MarkerClicked(handle) => match self.markers.entry_for(handle).cloned() {
                Some(entry) => {
                    self.focus_marker(&entry.item);
                }
                None => debug!("🔍 알 수 없는 마커 클릭: {:?}", handle),
            },
            MapEvent::PointClicked { area_id } => {
                if let Err(e) = self.focus_area(area_id).await {
                    debug!("📍 지역 포커스 실패 ({}): {}", area_id, e);
                }
            }
            MapEvent::ClusterClicked {
                center,
                expansion_zoom,
            } => self.expand_cluster(center, expansion_zoom),
            MapEvent::BackgroundClicked => self.close_popup(),
            MapEvent::MoveEnd { animation } => self.on_move_end(animation),
        }
    }

    /// 팝업 카드의 즐겨찾기 토글
    pub async fn toggle_popup_favorite(&mut self) -> bool {
        let PopupState::PopupOpen(card) = &self.popup else {
            return false;
        };
        let (place_type, place_id) = (card.item.place_type, card.item.place_id);

        let favorites = Arc::clone(&self.services.favorites);
        let ok = favorites.toggle(place_type, place_id).await;

        if let PopupState::PopupOpen(card) = &mut self.popup {
            if card.item.place_type == place_type && card.item.place_id == place_id {
                card.is_favorite = favorites.is_item_favorite(place_type, place_id);
            }
        }
        ok
    }

    /// 지역 포커스 카드: 지역 상세와 카테고리별 개수를 함께 불러온다
    pub async fn focus_area(&mut self, area_id: i64) -> Result<()> {
        self.focus = FocusState::Loading { area_id };

        let services = self.services.clone();
        let (detail, counts) = tokio::join!(
            load_area_detail(&services, area_id),
            services.cache.category_counts(area_id)
        );

        match detail.and_then(|detail| counts.map(|counts| (detail, counts))) {
            Ok((detail, counts)) => {
                info!(
                    "📍 지역 포커스: {} (카테고리 {}개)",
                    detail.area.area_name,
                    counts.len()
                );
                let center = detail.area.center();
                self.fly_camera(center, self.area_focus_zoom);
                self.focus = FocusState::AreaFocusShown(AreaFocus { detail, counts });
                Ok(())
            }
            Err(e) => {
                ErrorHandler::log("지역 정보 조회", &e);
                self.focus = FocusState::Failed {
                    area_id,
                    message: ErrorHandler::user_message(&e),
                    retryable: e.is_retryable(),
                };
                Err(e)
            }
        }
    }

    /// 실패한 지역 포커스를 다시 시도
    pub async fn retry_focus(&mut self) -> Result<()> {
        match self.focus {
            FocusState::Failed { area_id, .. } => self.focus_area(area_id).await,
            _ => Ok(()),
        }
    }

    /// 포커스 카드의 카테고리 클릭: 장소 목록을 다시 받아 해당 카테고리 마커를 띄운다
    pub async fn select_category(&mut self, category: PlaceType) -> Result<usize> {
        let FocusState::AreaFocusShown(focus) = &self.focus else {
            return Err(ClientError::InvalidInput("no area is focused".to_string()));
        };
        let area_id = focus.detail.area.area_id;

        let places = self.services.cache.get_place_list(area_id).await?;
        let items: Vec<SearchResult> = places
            .iter()
            .filter(|c| c.category == category)
            .flat_map(|c| c.content.iter().cloned())
            .collect();

        info!("📍 지역 {} {} {}개 표시", area_id, category.info().name, items.len());
        Ok(self.show_search_results(&items))
    }

    /// 상세 보기: 대시보드 섹션으로 이동
    pub fn request_detail(&mut self) -> Option<i64> {
        let FocusState::AreaFocusShown(focus) = &self.focus else {
            return None;
        };
        let area_id = focus.detail.area.area_id;
        self.focus = FocusState::DetailRequested { area_id };
        self.services.navigator.move_to(PageSection::Dashboard);
        Some(area_id)
    }

    pub fn close_focus(&mut self) {
        self.focus = FocusState::Idle;
    }

    fn await_move_end(&mut self, marker: MarkerHandle, animation: AnimationId) {
        self.move_end_listener = Some(animation);
        self.popup = PopupState::PendingPopup { marker, animation };
    }

    fn on_move_end(&mut self, animation: AnimationId) {
        if self.move_end_listener != Some(animation) {
            debug!("⏭️ 지난 이동의 MoveEnd 무시: {:?}", animation);
            return;
        }
        self.move_end_listener = None;

        let PopupState::PendingPopup { marker, .. } = self.popup else {
            return;
        };
        let item = self.markers.entry_for(marker).map(|e| e.item.clone());
        let rect = self.map.marker_screen_rect(marker);

        self.popup = match (item, rect) {
            (Some(item), Some(rect)) => {
                let is_favorite = self
                    .services
                    .favorites
                    .is_item_favorite(item.place_type, item.place_id);
                debug!("💬 팝업 열기: {}", item.name);
                PopupState::PopupOpen(PopupCard {
                    marker,
                    item,
                    position: rect.top_center(),
                    is_favorite,
                })
            }
            _ => {
                debug!("🔍 팝업 대상 마커가 사라짐: {:?}", marker);
                self.markers_state()
            }
        };
    }

    fn expand_cluster(&mut self, center: Point<f64>, expansion_zoom: Option<f64>) {
        match expansion_zoom.filter(|z| z.is_finite()) {
            Some(zoom) => self.fly_camera(center, zoom),
            None => warn!("⚠️ 클러스터 확대 줌을 알 수 없어 무시: ({}, {})", center.x(), center.y()),
        }
    }

    /// 팝업과 무관한 카메라 이동. 대기 중인 팝업은 취소된다
    fn fly_camera(&mut self, center: Point<f64>, zoom: f64) {
        self.map.stop();
        self.map.fly_to(CameraTarget { center, zoom });
        if self.move_end_listener.take().is_some() {
            self.popup = self.markers_state();
        }
    }

    fn markers_state(&self) -> PopupState {
        if self.markers.is_empty() {
            PopupState::Idle
        } else {
            PopupState::MarkersShown
        }
    }
}

async fn load_area_detail(services: &MapServices, area_id: i64) -> Result<AreaDetail> {
    let area = services
        .cache
        .find_area(area_id)
        .await?
        .ok_or_else(|| ClientError::InvalidInput(format!("unknown area {}", area_id)))?;

    Ok(AreaDetail {
        area,
        congestion: services.congestion.for_area(area_id),
        weather: services.weather.for_area(area_id),
    })
}
