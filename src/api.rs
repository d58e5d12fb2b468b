use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::{Area, CategoryContent, Favorite, MutationReply};
use crate::session::AuthSession;

pub const FAVORITE_ADDED_MESSAGE: &str = "즐겨찾기 추가 완료";
pub const FAVORITE_DELETED_MESSAGE: &str = "즐겨찾기 삭제 완료";

#[async_trait]
pub trait AreaApi: Send + Sync {
    async fn get_area_list(&self) -> Result<Vec<Area>>;
    async fn get_place_list_by_area(&self, area_id: i64) -> Result<Vec<CategoryContent>>;
}

#[async_trait]
pub trait FavoriteApi: Send + Sync {
    async fn list_favorites(&self) -> Result<Vec<Favorite>>;
    async fn add_favorite(&self, favorite: &Favorite) -> Result<MutationReply>;
    async fn delete_favorite(&self, favorite: &Favorite) -> Result<MutationReply>;
}

/// 성공 응답의 메시지가 예상과 다르면 경고만 남긴다
pub fn check_reply(reply: &MutationReply, expected: &str) {
    if reply.message != expected {
        warn!(
            "⚠️ 예상과 다른 서버 메시지: '{}' (기대값: '{}')",
            reply.message, expected
        );
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<AuthSession>,
    request_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &Config, session: Arc<AuthSession>) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.request_timeout())
            .build()?;

        info!("✅ API 클라이언트 초기화 완료 - {}", config.api_base_url);

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            session,
            request_timeout: config.request_timeout(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    /// 토큰이 있으면 Authorization 헤더를 붙인다
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // REST 요청에만 전체 타임아웃. 스트림 연결은 오래 유지되어야 한다
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.timeout(self.request_timeout).send().await?;
        Self::read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        debug!("📥 {} {} ({} bytes)", status.as_u16(), url, body.len());
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AreaApi for ApiClient {
    async fn get_area_list(&self) -> Result<Vec<Area>> {
        info!("🗺️ 지역 목록 요청");
        self.send(self.request(Method::GET, "/api/areas")).await
    }

    async fn get_place_list_by_area(&self, area_id: i64) -> Result<Vec<CategoryContent>> {
        info!("📍 지역 {} 장소 목록 요청", area_id);
        let path = format!("/api/areas/{}/places", area_id);
        self.send(self.request(Method::GET, &path)).await
    }
}

#[async_trait]
impl FavoriteApi for ApiClient {
    async fn list_favorites(&self) -> Result<Vec<Favorite>> {
        if self.session.token().is_none() {
            return Err(ClientError::AuthRequired);
        }
        self.send(self.request(Method::GET, "/api/stars")).await
    }

    async fn add_favorite(&self, favorite: &Favorite) -> Result<MutationReply> {
        info!("⭐ 즐겨찾기 추가 요청: {} #{}", favorite.place_type, favorite.place_id);
        let reply: MutationReply = self
            .send(self.request(Method::POST, "/api/stars").json(favorite))
            .await?;
        check_reply(&reply, FAVORITE_ADDED_MESSAGE);
        Ok(reply)
    }

    async fn delete_favorite(&self, favorite: &Favorite) -> Result<MutationReply> {
        info!("🗑️ 즐겨찾기 삭제 요청: {} #{}", favorite.place_type, favorite.place_id);
        let reply: MutationReply = self
            .send(self.request(Method::DELETE, "/api/stars").json(favorite))
            .await?;
        check_reply(&reply, FAVORITE_DELETED_MESSAGE);
        Ok(reply)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let config = Config {
            api_base_url: "http://localhost:9999".into(),
            ..Config::default()
        };
        let client = ApiClient::new(&config, Arc::new(AuthSession::new())).unwrap();
        assert_eq!(client.url("/api/areas"), "http://localhost:9999/api/areas");
        assert_eq!(client.url("api/stars"), "http://localhost:9999/api/stars");
    }

    #[tokio::test]
    async fn test_list_favorites_requires_token() {
        let client = ApiClient::new(&Config::default(), Arc::new(AuthSession::new())).unwrap();
        let err = client.list_favorites().await.unwrap_err();
        assert!(matches!(err, ClientError::AuthRequired));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        // 연결은 받지만 응답하지 않는 서버
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut sockets = Vec::new();
            loop {
                let (socket, _) = listener.accept().await.unwrap();
                sockets.push(socket);
            }
        });

        let config = Config {
            api_base_url: format!("http://{}", addr),
            request_timeout_secs: 1,
            ..Config::default()
        };
        let client = ApiClient::new(&config, Arc::new(AuthSession::new())).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), client.get_area_list())
            .await
            .expect("request should give up on its own");
        server.abort();

        match result {
            Err(ClientError::Network(e)) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got {:?}", other.map(|areas| areas.len())),
        }
    }
}
