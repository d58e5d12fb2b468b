use geo_types::Point;

use crate::models::SearchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerHandle(pub u64);

/// `fly_to` 한 번마다 새로 발급되는 애니메이션 번호
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    Default,
    Highlight,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTarget {
    pub center: Point<f64>,
    pub zoom: f64,
}

/// 화면 좌표 (px)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn top_center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y)
    }
}

pub trait MapSurface {
    fn add_marker(&mut self, position: Point<f64>, item: &SearchResult, style: MarkerStyle) -> MarkerHandle;
    fn remove_marker(&mut self, handle: MarkerHandle);
    /// 진행 중인 애니메이션이 있으면 호스트가 그 애니메이션의 MoveEnd 를 보낼 수 있다
    fn fly_to(&mut self, target: CameraTarget) -> AnimationId;
    fn stop(&mut self);
    /// 애니메이션이 끝난 뒤의 마커 위치
    fn marker_screen_rect(&self, handle: MarkerHandle) -> Option<ScreenRect>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    MarkerClicked(MarkerHandle),
    /// 클러스터되지 않은 지역 포인트
    PointClicked { area_id: i64 },
    ClusterClicked {
        center: Point<f64>,
        expansion_zoom: Option<f64>,
    },
    BackgroundClicked,
    MoveEnd { animation: AnimationId },
}
