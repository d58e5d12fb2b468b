use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::FavoriteApi;
use crate::error::{ClientError, Result};
use crate::error_handler::{ErrorHandler, Notifier, LOGIN_REQUIRED_MESSAGE};
use crate::models::Favorite;
use crate::place_types::PlaceType;
use crate::session::AuthSession;

/// 키별 동기화 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// 서버와 일치 (목록에 있으면 즐겨찾기)
    Synced,
    PendingAdd,
    PendingRemove,
}

impl SyncState {
    fn optimistic_value(self) -> Option<bool> {
        match self {
            SyncState::Synced => None,
            SyncState::PendingAdd => Some(true),
            SyncState::PendingRemove => Some(false),
        }
    }
}

#[derive(Default)]
struct FavoriteState {
    favorites: Vec<Favorite>,
    pending: HashMap<Favorite, SyncState>,
}

impl FavoriteState {
    fn contains(&self, key: &Favorite) -> bool {
        self.favorites.contains(key)
    }

    fn reconcile(&mut self, key: Favorite, favorite: bool) {
        if favorite {
            if !self.contains(&key) {
                self.favorites.push(key);
            }
        } else {
            self.favorites.retain(|f| *f != key);
        }
        self.pending.remove(&key);
    }
}

pub struct FavoriteStore {
    api: Arc<dyn FavoriteApi>,
    session: Arc<AuthSession>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<FavoriteState>,
    key_locks: Mutex<HashMap<Favorite, Arc<tokio::sync::Mutex<()>>>>,
}

impl FavoriteStore {
    pub fn new(
        api: Arc<dyn FavoriteApi>,
        session: Arc<AuthSession>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            session,
            notifier,
            state: Mutex::new(FavoriteState::default()),
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_item_favorite(&self, place_type: PlaceType, place_id: i64) -> bool {
        let key = Favorite::new(place_type, place_id);
        let state = self.lock_state();
        state
            .pending
            .get(&key)
            .and_then(|s| s.optimistic_value())
            .unwrap_or_else(|| state.contains(&key))
    }

    pub fn sync_state(&self, place_type: PlaceType, place_id: i64) -> SyncState {
        let key = Favorite::new(place_type, place_id);
        self.lock_state()
            .pending
            .get(&key)
            .copied()
            .unwrap_or(SyncState::Synced)
    }

    /// 마지막으로 서버와 맞춘 즐겨찾기 목록
    pub fn favorites(&self) -> Vec<Favorite> {
        self.lock_state().favorites.clone()
    }

    pub async fn add_to_favorites(&self, place_type: PlaceType, place_id: i64) -> bool {
        self.apply(Favorite::new(place_type, place_id), true).await
    }

    pub async fn remove_from_favorites(&self, place_type: PlaceType, place_id: i64) -> bool {
        self.apply(Favorite::new(place_type, place_id), false).await
    }

    pub async fn toggle(&self, place_type: PlaceType, place_id: i64) -> bool {
        if self.is_item_favorite(place_type, place_id) {
            self.remove_from_favorites(place_type, place_id).await
        } else {
            self.add_to_favorites(place_type, place_id).await
        }
    }

    /// 서버 목록으로 교체 (중복 제거)
    pub async fn refresh(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            self.lock_state().favorites.clear();
            return Err(ClientError::AuthRequired);
        }

        let server = self.api.list_favorites().await?;
        let mut favorites: Vec<Favorite> = Vec::with_capacity(server.len());
        for favorite in server {
            if !favorites.contains(&favorite) {
                favorites.push(favorite);
            }
        }
        info!("⭐ 즐겨찾기 목록 동기화 ({}개)", favorites.len());
        self.lock_state().favorites = favorites;
        Ok(())
    }

    async fn apply(&self, key: Favorite, favorite: bool) -> bool {
        if !self.session.is_authenticated() {
            warn!("🔒 로그인하지 않은 상태에서 즐겨찾기 변경 시도: {} #{}", key.place_type, key.place_id);
            self.notifier.alert(LOGIN_REQUIRED_MESSAGE);
            return false;
        }

        let key_lock = self.key_lock(key);
        let result = {
            let _guard = key_lock.lock().await;

            let pending = if favorite { SyncState::PendingAdd } else { SyncState::PendingRemove };
            let overlay = PendingOverlay::insert(self, key, pending);
            debug!("⭐ 낙관적 반영: {} #{} -> {:?}", key.place_type, key.place_id, pending);

            let result = if favorite {
                self.api.add_favorite(&key).await
            } else {
                self.api.delete_favorite(&key).await
            };

            if result.is_ok() {
                overlay.reconcile(favorite);
            }
            result
        };
        drop(key_lock);
        self.release_key_locks();

        match result {
            Ok(_) => {
                info!(
                    "⭐ 즐겨찾기 {} 완료: {} #{}",
                    if favorite { "추가" } else { "삭제" },
                    key.place_type,
                    key.place_id
                );
                true
            }
            Err(e) => {
                let context = if favorite { "즐겨찾기 추가" } else { "즐겨찾기 삭제" };
                ErrorHandler::log_and_alert(&self.notifier, context, &e);
                false
            }
        }
    }

    fn key_lock(&self, key: Favorite) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.key_locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(key).or_default())
    }

    fn release_key_locks(&self) {
        let mut locks = self.key_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    fn lock_state(&self) -> MutexGuard<'_, FavoriteState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// 요청 중인 낙관적 값. 확정되지 않고 버려지면 (실패, 취소) 오버레이를 지운다.
struct PendingOverlay<'a> {
    store: &'a FavoriteStore,
    key: Favorite,
    settled: bool,
}

impl<'a> PendingOverlay<'a> {
    fn insert(store: &'a FavoriteStore, key: Favorite, pending: SyncState) -> Self {
        store.lock_state().pending.insert(key, pending);
        Self { store, key, settled: false }
    }

    fn reconcile(mut self, favorite: bool) {
        self.store.lock_state().reconcile(self.key, favorite);
        self.settled = true;
    }
}

impl Drop for PendingOverlay<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.store.lock_state().pending.remove(&self.key);
            debug!("⭐ 낙관적 반영 취소: {} #{}", self.key.place_type, self.key.place_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeFavoriteApi;
    use crate::error_handler::testing::RecordingNotifier;
    use tokio::sync::Notify;

    struct Harness {
        store: FavoriteStore,
        api: Arc<FakeFavoriteApi>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(api: FakeFavoriteApi, logged_in: bool) -> Harness {
        let api = Arc::new(api);
        let notifier = Arc::new(RecordingNotifier::default());
        let session = Arc::new(if logged_in {
            AuthSession::with_token("session-token")
        } else {
            AuthSession::new()
        });
        Harness {
            store: FavoriteStore::new(api.clone(), session, notifier.clone()),
            api,
            notifier,
        }
    }

    #[tokio::test]
    async fn test_add_while_logged_out_fails_fast() {
        let h = harness(FakeFavoriteApi::default(), false);

        assert!(!h.store.add_to_favorites(PlaceType::Cafe, 1).await);
        assert_eq!(h.api.calls(), 0);
        assert_eq!(h.notifier.messages(), vec![LOGIN_REQUIRED_MESSAGE.to_string()]);
        assert!(!h.store.is_item_favorite(PlaceType::Cafe, 1));
    }

    #[tokio::test]
    async fn test_add_is_visible_before_server_confirms() {
        let gate = Arc::new(Notify::new());
        let h = harness(FakeFavoriteApi::gated(gate.clone()), true);

        let (added, _) = tokio::join!(h.store.add_to_favorites(PlaceType::Cafe, 1), async {
            assert!(h.store.is_item_favorite(PlaceType::Cafe, 1));
            assert_eq!(h.store.sync_state(PlaceType::Cafe, 1), SyncState::PendingAdd);
            assert!(h.store.favorites().is_empty());
            gate.notify_one();
        });

        assert!(added);
        assert!(h.store.is_item_favorite(PlaceType::Cafe, 1));
        assert_eq!(h.store.sync_state(PlaceType::Cafe, 1), SyncState::Synced);
        assert_eq!(h.store.favorites(), vec![Favorite::new(PlaceType::Cafe, 1)]);
    }

    #[tokio::test]
    async fn test_failed_add_reverts_optimistic_value() {
        let gate = Arc::new(Notify::new());
        let h = harness(FakeFavoriteApi::gated(gate.clone()), true);
        *h.api.fail.lock().unwrap() = true;

        let (added, _) = tokio::join!(h.store.add_to_favorites(PlaceType::Restaurant, 5), async {
            assert!(h.store.is_item_favorite(PlaceType::Restaurant, 5));
            gate.notify_one();
        });

        assert!(!added);
        assert!(!h.store.is_item_favorite(PlaceType::Restaurant, 5));
        assert_eq!(h.notifier.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_add_clears_optimistic_value() {
        let gate = Arc::new(Notify::new());
        let h = harness(FakeFavoriteApi::gated(gate.clone()), true);

        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            h.store.add_to_favorites(PlaceType::Cafe, 1),
        )
        .await;

        assert!(outcome.is_err());
        assert_eq!(h.api.calls(), 1);
        assert_eq!(h.store.sync_state(PlaceType::Cafe, 1), SyncState::Synced);
        assert!(!h.store.is_item_favorite(PlaceType::Cafe, 1));
        assert!(h.store.favorites().is_empty());
    }

    #[tokio::test]
    async fn test_failed_remove_restores_favorite() {
        let h = harness(FakeFavoriteApi::default(), true);
        assert!(h.store.add_to_favorites(PlaceType::Attraction, 9).await);

        *h.api.fail.lock().unwrap() = true;
        assert!(!h.store.remove_from_favorites(PlaceType::Attraction, 9).await);
        assert!(h.store.is_item_favorite(PlaceType::Attraction, 9));
    }

    #[tokio::test]
    async fn test_adding_twice_keeps_single_entry() {
        let h = harness(FakeFavoriteApi::default(), true);

        assert!(h.store.add_to_favorites(PlaceType::Cafe, 3).await);
        assert!(h.store.add_to_favorites(PlaceType::Cafe, 3).await);

        assert_eq!(h.store.favorites(), vec![Favorite::new(PlaceType::Cafe, 3)]);
    }

    #[tokio::test]
    async fn test_same_id_different_type_are_distinct() {
        let h = harness(FakeFavoriteApi::default(), true);

        h.store.add_to_favorites(PlaceType::Cafe, 3).await;
        h.store.add_to_favorites(PlaceType::Restaurant, 3).await;

        assert_eq!(h.store.favorites().len(), 2);
        h.store.remove_from_favorites(PlaceType::Cafe, 3).await;
        assert!(!h.store.is_item_favorite(PlaceType::Cafe, 3));
        assert!(h.store.is_item_favorite(PlaceType::Restaurant, 3));
    }

    #[tokio::test]
    async fn test_refresh_deduplicates_server_list() {
        let h = harness(FakeFavoriteApi::default(), true);
        *h.api.server.lock().unwrap() = vec![
            Favorite::new(PlaceType::Cafe, 1),
            Favorite::new(PlaceType::Cafe, 1),
            Favorite::new(PlaceType::CulturalEvent, 2),
        ];

        h.store.refresh().await.unwrap();

        assert_eq!(h.store.favorites().len(), 2);
        assert!(h.store.is_item_favorite(PlaceType::CulturalEvent, 2));
    }

    #[tokio::test]
    async fn test_toggle_flips_value() {
        let h = harness(FakeFavoriteApi::default(), true);

        assert!(h.store.toggle(PlaceType::Cafe, 8).await);
        assert!(h.store.is_item_favorite(PlaceType::Cafe, 8));
        assert!(h.store.toggle(PlaceType::Cafe, 8).await);
        assert!(!h.store.is_item_favorite(PlaceType::Cafe, 8));
        assert_eq!(h.api.calls(), 2);
    }

    #[tokio::test]
    async fn test_toggles_of_same_key_are_serialized() {
        let gate = Arc::new(Notify::new());
        let h = harness(FakeFavoriteApi::gated(gate.clone()), true);

        let (first, second, _) = tokio::join!(
            h.store.add_to_favorites(PlaceType::Cafe, 4),
            h.store.remove_from_favorites(PlaceType::Cafe, 4),
            async {
                // 두 번째 요청은 첫 요청이 끝날 때까지 서버로 가지 않는다
                tokio::task::yield_now().await;
                assert_eq!(h.api.calls(), 1);
                gate.notify_one();
                tokio::task::yield_now().await;
                tokio::task::yield_now().await;
                gate.notify_one();
            }
        );

        assert!(first && second);
        assert_eq!(h.api.calls(), 2);
        assert!(!h.store.is_item_favorite(PlaceType::Cafe, 4));
        assert!(h.store.favorites().is_empty());
    }
}
