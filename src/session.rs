use chrono::Utc;
use jsonwebtoken::{decode, DecodingKey, Validation};
use log::{debug, info};
use serde::Deserialize;
use std::sync::RwLock;

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<i64>,
}

/// 로그인 상태 (토큰 보관)
#[derive(Debug, Default)]
pub struct AuthSession {
    token: RwLock<Option<String>>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.login(token);
        session
    }

    pub fn login(&self, token: impl Into<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.into());
        info!("🔑 로그인 세션 시작");
    }

    pub fn logout(&self) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        if guard.take().is_some() {
            info!("🔒 로그아웃");
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// 토큰이 있고 만료되지 않았으면 true
    pub fn is_authenticated(&self) -> bool {
        match self.token() {
            Some(token) => match token_expiry(&token) {
                Some(exp) if exp <= Utc::now().timestamp() => {
                    debug!("⏰ 토큰 만료됨 (exp={})", exp);
                    false
                }
                _ => true,
            },
            None => false,
        }
    }
}

/// JWT 의 exp 클레임 (서명 검증 없이 읽음)
pub fn token_expiry(token: &str) -> Option<i64> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .and_then(|data| data.claims.exp)
}
