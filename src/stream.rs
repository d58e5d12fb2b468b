use futures_util::StreamExt;
use log::{debug, info, warn};
use reqwest::header::ACCEPT;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::ApiClient;
use crate::error::{ClientError, Result};
use crate::error_handler::ErrorHandler;
use crate::models::{CongestionData, ExternalData, WeatherData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Congestion,
    Weather,
    External,
}

impl StreamKind {
    pub fn path(self) -> &'static str {
        match self {
            StreamKind::Congestion => "/api/stream/congestion",
            StreamKind::Weather => "/api/stream/weather",
            StreamKind::External => "/api/stream/external",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamPayload {
    Congestion(Vec<CongestionData>),
    Weather(Vec<WeatherData>),
    External(Vec<ExternalData>),
}

impl StreamPayload {
    pub fn len(&self) -> usize {
        match self {
            StreamPayload::Congestion(items) => items.len(),
            StreamPayload::Weather(items) => items.len(),
            StreamPayload::External(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 배열 페이로드를 종류에 맞게 해석한다. 단일 객체는 원소 하나짜리 배열로 본다
pub fn parse_payload(kind: StreamKind, data: &str) -> Result<StreamPayload> {
    let items = match serde_json::from_str::<Value>(data)? {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => {
            return Err(ClientError::InvalidPayload(format!(
                "expected array for {:?}, got {}",
                kind, other
            )))
        }
    };

    Ok(match kind {
        StreamKind::Congestion => StreamPayload::Congestion(parse_items(items)?),
        StreamKind::Weather => StreamPayload::Weather(parse_items(items)?),
        StreamKind::External => StreamPayload::External(parse_items(items)?),
    })
}

fn parse_items<T: DeserializeOwned>(items: Vec<Value>) -> Result<Vec<T>> {
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(ClientError::from))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// 바이트 조각을 SSE 이벤트로 바꾼다
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    events.push(event);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }
        events
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent { event, data })
    }
}

/// 구독 핸들. `close()` 하거나 drop 하면 연결도 닫힌다
pub struct Subscription {
    id: Uuid,
    kind: StreamKind,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn is_closed(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("📡 {:?} 스트림 구독 종료 ({})", self.kind, self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// 연결이 끊기면 `retry` 뒤에 다시 연결한다
pub fn subscribe<F>(client: &ApiClient, kind: StreamKind, retry: Duration, mut on_payload: F) -> Subscription
where
    F: FnMut(StreamPayload) + Send + 'static,
{
    let id = Uuid::new_v4();
    let client = client.clone();

    let task = tokio::spawn(async move {
        loop {
            match run_once(&client, kind, &mut on_payload).await {
                Ok(()) => info!("📡 {:?} 스트림이 서버에서 종료됨", kind),
                Err(e) => ErrorHandler::log("실시간 스트림 연결", &e),
            }
            debug!("📡 {:?} 스트림 재연결 대기 {:?}", kind, retry);
            tokio::time::sleep(retry).await;
        }
    });

    info!("📡 {:?} 스트림 구독 시작 ({})", kind, id);
    Subscription {
        id,
        kind,
        task: Some(task),
    }
}

async fn run_once<F>(client: &ApiClient, kind: StreamKind, on_payload: &mut F) -> Result<()>
where
    F: FnMut(StreamPayload),
{
    let response = client
        .request(Method::GET, kind.path())
        .header(ACCEPT, "text/event-stream")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Server {
            status: status.as_u16(),
            message: format!("stream {} rejected", kind.path()),
        });
    }

    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    while let Some(chunk) = body.next().await {
        for event in decoder.feed(&chunk?) {
            dispatch_event(kind, &event, on_payload);
        }
    }
    Ok(())
}

fn dispatch_event<F>(kind: StreamKind, event: &SseEvent, on_payload: &mut F)
where
    F: FnMut(StreamPayload),
{
    match parse_payload(kind, &event.data) {
        Ok(payload) => {
            if payload.is_empty() {
                debug!("📡 {:?} 빈 스냅샷 수신", kind);
            } else {
                debug!("📡 {:?} 수신 ({}개)", kind, payload.len());
            }
            on_payload(payload);
        }
        Err(e) => warn!("⚠️ {:?} 페이로드 무시: {}", kind, e),
    }
}

pub fn subscribe_congestion_update<F>(client: &ApiClient, retry: Duration, mut callback: F) -> Subscription
where
    F: FnMut(Vec<CongestionData>) + Send + 'static,
{
    subscribe(client, StreamKind::Congestion, retry, move |payload| {
        if let StreamPayload::Congestion(items) = payload {
            callback(items);
        }
    })
}

pub fn subscribe_weather_update<F>(client: &ApiClient, retry: Duration, mut callback: F) -> Subscription
where
    F: FnMut(Vec<WeatherData>) + Send + 'static,
{
    subscribe(client, StreamKind::Weather, retry, move |payload| {
        if let StreamPayload::Weather(items) = payload {
            callback(items);
        }
    })
}

pub fn subscribe_external<F>(client: &ApiClient, retry: Duration, mut callback: F) -> Subscription
where
    F: FnMut(Vec<ExternalData>) + Send + 'static,
{
    subscribe(client, StreamKind::External, retry, move |payload| {
        if let StreamPayload::External(items) = payload {
            callback(items);
        }
    })
}
