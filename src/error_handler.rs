use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::error::ClientError;

/// 사용자에게 보여줄 알림 창구 (브라우저의 alert 에 해당)
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

/// 알림을 로그로만 남기는 기본 구현
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        info!("💬 알림: {}", message);
    }
}

pub const LOGIN_REQUIRED_MESSAGE: &str = "로그인이 필요한 기능입니다.";

pub struct ErrorHandler;

impl ErrorHandler {
    pub fn user_message(err: &ClientError) -> &'static str {
        match err {
            ClientError::AuthRequired => LOGIN_REQUIRED_MESSAGE,
            ClientError::Network(_) => "네트워크 연결을 확인한 뒤 다시 시도해 주세요.",
            ClientError::Server { status, .. } => match *status {
                401 | 403 => "로그인이 만료되었습니다. 다시 로그인해 주세요.",
                404 => "요청한 정보를 찾을 수 없습니다.",
                409 => "이미 처리된 요청입니다.",
                s if s >= 500 => "서버에 일시적인 문제가 발생했습니다. 잠시 후 다시 시도해 주세요.",
                _ => "요청을 처리하지 못했습니다.",
            },
            ClientError::Decode(_) | ClientError::InvalidPayload(_) => {
                "데이터를 불러오는 중 문제가 발생했습니다."
            }
            ClientError::InvalidInput(_) => "잘못된 입력입니다.",
            ClientError::Config(_) => "설정을 확인해 주세요.",
        }
    }

    pub fn log(context: &str, err: &ClientError) {
        match err {
            ClientError::AuthRequired => {
                warn!("🔒 인증 필요 - {}", context);
            }
            ClientError::Network(e) => {
                error!("🌐 네트워크 오류 - {}", context);
                error!("   📋 상세 에러: {}", e);
            }
            ClientError::Server { status, message } => match *status {
                401 | 403 => {
                    warn!("🚫 {} 권한 오류 - {}", status, context);
                    warn!("   📋 상세 에러: {}", message);
                }
                404 => {
                    info!("🔍 404 Not Found - {}", context);
                }
                _ => {
                    error!("💥 {} 서버 오류 - {}", status, context);
                    error!("   📋 상세 에러: {}", message);
                }
            },
            ClientError::Decode(e) => {
                error!("📝 응답 파싱 실패 - {}", context);
                error!("   📋 상세 에러: {}", e);
            }
            ClientError::InvalidPayload(detail) | ClientError::InvalidInput(detail) => {
                warn!("⚠️ 잘못된 데이터 - {}: {}", context, detail);
            }
            ClientError::Config(detail) => {
                error!("⚙️ 설정 오류 - {}: {}", context, detail);
            }
        }
    }

    /// 로그를 남기고 사용자에게 알림을 띄운다
    pub fn log_and_alert(notifier: &Arc<dyn Notifier>, context: &str, err: &ClientError) {
        Self::log(context, err);
        let message = Self::user_message(err);
        debug!("   💬 사용자 메시지: {}", message);
        notifier.alert(message);
    }
}
