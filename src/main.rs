use log::{error, info, warn};
use std::sync::Arc;

use congestion_map::api::ApiClient;
use congestion_map::board::{CongestionBoard, ExternalBoard, WeatherBoard};
use congestion_map::cache::AreaCache;
use congestion_map::error_handler::{LogNotifier, Notifier};
use congestion_map::favorites::FavoriteStore;
use congestion_map::session::AuthSession;
use congestion_map::stream::{subscribe_congestion_update, subscribe_external, subscribe_weather_update};
use congestion_map::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::new()?;

    info!("🚀 혼잡도 지도 클라이언트가 시작됩니다...");
    info!("📍 API 서버: {}", config.api_base_url);

    let session = Arc::new(AuthSession::new());
    if let Some(token) = &config.auth_token {
        session.login(token.clone());
    }

    let client = ApiClient::new(&config, Arc::clone(&session))?;
    let cache = AreaCache::new(Arc::new(client.clone()), config.cache_ttl());

    match cache.get_area_list().await {
        Ok(areas) => {
            info!("🗺️ 지역 {}개", areas.len());
            for area in areas.iter().take(5) {
                info!("   - #{} {} ({})", area.area_id, area.area_name, area.category);
            }
        }
        Err(e) => error!("🚨 지역 목록을 불러오지 못했습니다: {}", e),
    }

    if session.is_authenticated() {
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
        let favorites = FavoriteStore::new(Arc::new(client.clone()), Arc::clone(&session), notifier);
        match favorites.refresh().await {
            Ok(()) => info!("⭐ 즐겨찾기 {}개", favorites.favorites().len()),
            Err(e) => warn!("⚠️ 즐겨찾기 동기화 실패: {}", e),
        }
    }

    let congestion = Arc::new(CongestionBoard::new());
    let weather = Arc::new(WeatherBoard::new());
    let external = Arc::new(ExternalBoard::new());

    let congestion_sub = {
        let board = Arc::clone(&congestion);
        subscribe_congestion_update(&client, config.sse_retry(), move |items| {
            for item in &items {
                info!(
                    "👥 {} - {} ({}~{}명)",
                    item.area_name,
                    item.congestion_level.label(),
                    item.population_min,
                    item.population_max
                );
            }
            board.replace(items);
        })
    };
    let weather_sub = {
        let board = Arc::clone(&weather);
        subscribe_weather_update(&client, config.sse_retry(), move |items| board.replace(items))
    };
    let external_sub = {
        let board = Arc::clone(&external);
        subscribe_external(&client, config.sse_retry(), move |items| board.replace(items))
    };

    tokio::signal::ctrl_c().await?;

    congestion_sub.close();
    weather_sub.close();
    external_sub.close();
    info!(
        "👋 종료 - 혼잡도 {}개 / 날씨 {}개 / 외부 {}개 지역 수신",
        congestion.all().len(),
        weather.all().len(),
        external.all().len()
    );
    Ok(())
}
