use log::debug;
use std::sync::Arc;
use std::time::Duration;

/// 풀페이지 섹션 순서
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSection {
    Intro,
    Map,
    Dashboard,
    MyPage,
}

impl PageSection {
    /// 페이지 스크롤러의 1 기반 섹션 번호
    pub fn index(self) -> usize {
        match self {
            PageSection::Intro => 1,
            PageSection::Map => 2,
            PageSection::Dashboard => 3,
            PageSection::MyPage => 4,
        }
    }
}

/// 페이지 섹션 이동 기능. 스크롤러가 없는 환경은 `NoopNavigator`
pub trait SectionNavigator: Send + Sync {
    fn move_to(&self, section: PageSection);
    fn move_slide_left(&self);
    fn move_slide_right(&self);
    fn move_section_up(&self);
    fn move_section_down(&self);
    fn set_allow_scrolling(&self, allow: bool);
    fn set_keyboard_scrolling(&self, allow: bool);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl SectionNavigator for NoopNavigator {
    fn move_to(&self, section: PageSection) {
        debug!("🧭 (noop) move_to {:?}", section);
    }

    fn move_slide_left(&self) {}

    fn move_slide_right(&self) {}

    fn move_section_up(&self) {}

    fn move_section_down(&self) {}

    fn set_allow_scrolling(&self, _allow: bool) {}

    fn set_keyboard_scrolling(&self, _allow: bool) {}
}

/// 마운트 직후 지도 섹션의 페이지 스크롤을 끈다.
/// 페이지 스크롤러 초기화를 기다리는 고정 지연이며 순서 보장 수단은 아니다.
pub async fn disable_scroll_after_mount(navigator: Arc<dyn SectionNavigator>, delay: Duration) {
    tokio::time::sleep(delay).await;
    navigator.set_allow_scrolling(false);
    navigator.set_keyboard_scrolling(false);
    debug!("🧭 페이지 스크롤 비활성화");
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub enum NavCall {
        MoveTo(PageSection),
        SlideLeft,
        SlideRight,
        Up,
        Down,
        AllowScrolling(bool),
        KeyboardScrolling(bool),
    }

    #[derive(Default)]
    pub struct RecordingNavigator {
        pub calls: Mutex<Vec<NavCall>>,
    }

    impl RecordingNavigator {
        pub fn calls(&self) -> Vec<NavCall> {
            self.calls.lock().unwrap().clone()
        }

        fn push(&self, call: NavCall) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl SectionNavigator for RecordingNavigator {
        fn move_to(&self, section: PageSection) {
            self.push(NavCall::MoveTo(section));
        }

        fn move_slide_left(&self) {
            self.push(NavCall::SlideLeft);
        }

        fn move_slide_right(&self) {
            self.push(NavCall::SlideRight);
        }

        fn move_section_up(&self) {
            self.push(NavCall::Up);
        }

        fn move_section_down(&self) {
            self.push(NavCall::Down);
        }

        fn set_allow_scrolling(&self, allow: bool) {
            self.push(NavCall::AllowScrolling(allow));
        }

        fn set_keyboard_scrolling(&self, allow: bool) {
            self.push(NavCall::KeyboardScrolling(allow));
        }
    }
}
