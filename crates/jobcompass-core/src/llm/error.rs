//! LLM gateway error taxonomy (§4.11, §7 "Error kinds").

use thiserror::Error;

/// Seven-member error taxonomy, each carrying a technical detail and
/// exposing a canned Japanese user-facing message.
#[derive(Debug, Error, Clone)]
pub enum LlmError {
    #[error("no API key configured for provider: {0}")]
    NoApiKey(String),

    #[error("billing error: {0}")]
    Billing(String),

    #[error("rate limited: {0}")]
    RateLimit(String),

    #[error("invalid API key: {0}")]
    InvalidKey(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to parse LLM response as JSON: {0}")]
    Parse(String),

    #[error("unknown LLM error: {0}")]
    Unknown(String),
}

impl LlmError {
    /// Canned Japanese message suitable for direct display to an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NoApiKey(_) => "AIサービスの設定が完了していません。管理者にお問い合わせください。",
            Self::Billing(_) => "AIサービスの利用上限に達しました。しばらく経ってから再度お試しください。",
            Self::RateLimit(_) => "リクエストが集中しています。少し時間をおいて再度お試しください。",
            Self::InvalidKey(_) => "AIサービスの認証に失敗しました。管理者にお問い合わせください。",
            Self::Network(_) => "AIサービスへの接続に失敗しました。ネットワーク状況をご確認ください。",
            Self::Parse(_) => "AIサービスの応答を解析できませんでした。再度お試しください。",
            Self::Unknown(_) => "予期しないエラーが発生しました。再度お試しください。",
        }
    }

    /// Whether this failure class should trigger cross-provider fallback
    /// (§4.11 "Cross-provider fallback").
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(self, Self::Billing(_) | Self::RateLimit(_) | Self::Parse(_))
    }

    /// Whether this failure counts toward the per-provider circuit breaker.
    pub fn counts_toward_circuit_breaker(&self) -> bool {
        !matches!(self, Self::NoApiKey(_) | Self::InvalidKey(_))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            LlmError::Network(e.to_string())
        } else {
            LlmError::Unknown(e.to_string())
        }
    }
}
