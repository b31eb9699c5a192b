//! LLM Gateway (C11): feature-routed provider selection, JSON repair,
//! circuit breaker, cross-provider fallback (§4.11).

use super::circuit_breaker::CircuitBreaker;
use super::error::LlmError;
use super::json_repair::repair_and_parse;
use crate::config::{Config, Feature, ModelRoute};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of a gateway call: mirrors the reference contract of
/// `{success, data?, error?}` rather than a bare `Result`, since callers
/// (expansion, HyDE, rerank, classify) treat failure as "degrade to skip"
/// rather than as a propagated error.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<LlmError>,
}

impl LlmResponse {
    fn ok(data: serde_json::Value) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    fn err(error: LlmError) -> Self {
        Self { success: false, data: None, error: Some(error) }
    }
}

pub struct Gateway {
    http: reqwest::Client,
    config: Config,
    circuit_breaker: CircuitBreaker,
}

impl Gateway {
    pub fn new(config: Config) -> Self {
        Self { http: reqwest::Client::new(), config, circuit_breaker: CircuitBreaker::new() }
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    fn route_for(&self, feature: Feature) -> ModelRoute {
        self.config
            .feature_routes
            .get(&feature)
            .cloned()
            .unwrap_or(ModelRoute { provider: "openai".into(), model: "gpt-5-nano".into() })
    }

    fn default_model_for(&self, provider: &str) -> String {
        match provider {
            "anthropic" => "claude-haiku".to_string(),
            _ => "gpt-5-nano".to_string(),
        }
    }

    fn has_key(&self, provider: &str) -> bool {
        match provider {
            "openai" => self.config.llm.openai_api_key.is_some(),
            "anthropic" => self.config.llm.anthropic_api_key.is_some(),
            _ => false,
        }
    }

    fn alternate_provider(&self, provider: &str) -> Option<String> {
        let alt = if provider == "openai" { "anthropic" } else { "openai" };
        self.has_key(alt).then(|| alt.to_string())
    }

    fn timeout_for(&self, feature: Feature) -> Duration {
        if feature.is_rag() {
            self.config.rag_timeout()
        } else {
            self.config.foreground_timeout()
        }
    }

    /// Entry point (§4.11). `json_schema` is currently used only to decide
    /// whether the response must parse as JSON; true schema-constrained
    /// decoding is provider-specific and applied inside `call_provider`
    /// when the provider supports it.
    pub async fn call_llm_with_error(
        &self,
        system: &str,
        user: &str,
        feature: Feature,
        expect_json: bool,
    ) -> LlmResponse {
        let route = self.route_for(feature);
        let timeout = self.timeout_for(feature);

        let primary = self.attempt(&route.provider, &route.model, system, user, timeout, expect_json).await;
        match primary {
            Ok(value) => LlmResponse::ok(value),
            Err(e) if e.is_fallback_eligible() => {
                if let Some(alt_provider) = self.alternate_provider(&route.provider) {
                    let alt_model = self.default_model_for(&alt_provider);
                    match self.attempt(&alt_provider, &alt_model, system, user, timeout, expect_json).await {
                        Ok(value) => LlmResponse::ok(value),
                        Err(e2) => LlmResponse::err(e2),
                    }
                } else {
                    LlmResponse::err(e)
                }
            }
            Err(e) => LlmResponse::err(e),
        }
    }

    /// One provider's full attempt: call → parse → strict-retry → repair-retry.
    async fn attempt(
        &self,
        provider: &str,
        model: &str,
        system: &str,
        user: &str,
        timeout: Duration,
        expect_json: bool,
    ) -> Result<serde_json::Value, LlmError> {
        if !self.has_key(provider) {
            return Err(LlmError::NoApiKey(provider.to_string()));
        }
        if self.circuit_breaker.is_open(provider) {
            return Err(LlmError::Unknown(format!("circuit breaker open for {provider}")));
        }

        let raw = match self.call_provider(provider, model, system, user, timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                if e.counts_toward_circuit_breaker() {
                    self.circuit_breaker.record_failure(provider);
                }
                return Err(e);
            }
        };

        if !expect_json {
            self.circuit_breaker.record_success(provider);
            return Ok(serde_json::Value::String(raw));
        }

        if let Some(value) = repair_and_parse(&raw) {
            self.circuit_breaker.record_success(provider);
            return Ok(value);
        }

        let strict_system = format!("{system}\n\nRespond with JSON only. No prose, no markdown fences.");
        let retry_raw = self.call_provider(provider, model, &strict_system, user, timeout).await;
        if let Ok(retry_raw) = &retry_raw {
            if let Some(value) = repair_and_parse(retry_raw) {
                self.circuit_breaker.record_success(provider);
                return Ok(value);
            }
        }

        let last_raw = retry_raw.unwrap_or(raw);
        let repair_user = format!(
            "Your previous response was:\n{last_raw}\n\nThat is not valid JSON. \
             Return only the corrected, valid JSON with the same information."
        );
        match self.call_provider(provider, model, &strict_system, &repair_user, timeout).await {
            Ok(repaired_raw) => match repair_and_parse(&repaired_raw) {
                Some(value) => {
                    self.circuit_breaker.record_success(provider);
                    Ok(value)
                }
                None => {
                    self.circuit_breaker.record_failure(provider);
                    Err(LlmError::Parse(repaired_raw))
                }
            },
            Err(e) => {
                if e.counts_toward_circuit_breaker() {
                    self.circuit_breaker.record_failure(provider);
                }
                Err(e)
            }
        }
    }

    async fn call_provider(
        &self,
        provider: &str,
        model: &str,
        system: &str,
        user: &str,
        timeout: Duration,
    ) -> Result<String, LlmError> {
        let call = match provider {
            "anthropic" => self.call_anthropic(model, system, user),
            _ => self.call_openai(model, system, user),
        };
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Network(format!("{provider} request timed out after {timeout:?}"))),
        }
    }

    async fn call_openai(&self, model: &str, system: &str, user: &str) -> Result<String, LlmError> {
        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
            temperature: f32,
        }
        #[derive(Deserialize)]
        struct Response {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ResponseMessage,
        }
        #[derive(Deserialize)]
        struct ResponseMessage {
            content: String,
        }

        let api_key = self.config.llm.openai_api_key.as_deref().ok_or_else(|| LlmError::NoApiKey("openai".into()))?;
        let url = format!("{}/v1/chat/completions", self.config.llm.openai_base_url);
        let body = Request {
            model,
            messages: vec![Message { role: "system", content: system }, Message { role: "user", content: user }],
            temperature: 0.2,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(LlmError::from)?;

        classify_status(response.status())?;

        let parsed: Response = response.json().await.map_err(LlmError::from)?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::Unknown("empty choices array from openai".into()))
    }

    async fn call_anthropic(&self, model: &str, system: &str, user: &str) -> Result<String, LlmError> {
        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            system: &'a str,
            max_tokens: u32,
            messages: Vec<Message<'a>>,
        }
        #[derive(Deserialize)]
        struct Response {
            content: Vec<ContentBlock>,
        }
        #[derive(Deserialize)]
        struct ContentBlock {
            text: String,
        }

        let api_key =
            self.config.llm.anthropic_api_key.as_deref().ok_or_else(|| LlmError::NoApiKey("anthropic".into()))?;
        let url = format!("{}/v1/messages", self.config.llm.anthropic_base_url);
        let body = Request { model, system, max_tokens: 1024, messages: vec![Message { role: "user", content: user }] };

        let response = self
            .http
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(LlmError::from)?;

        classify_status(response.status())?;

        let parsed: Response = response.json().await.map_err(LlmError::from)?;
        parsed.content.into_iter().next().map(|c| c.text).ok_or_else(|| LlmError::Unknown("empty content array from anthropic".into()))
    }
}

fn classify_status(status: reqwest::StatusCode) -> Result<(), LlmError> {
    if status.is_success() {
        return Ok(());
    }
    match status.as_u16() {
        401 => Err(LlmError::InvalidKey(status.to_string())),
        402 => Err(LlmError::Billing(status.to_string())),
        429 => Err(LlmError::RateLimit(status.to_string())),
        _ => Err(LlmError::Unknown(format!("HTTP {status}"))),
    }
}

pub fn gateway_from_config(config: &Config) -> Gateway {
    Gateway::new(config.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_falls_back_to_default_when_feature_unmapped() {
        let mut config = Config::default();
        config.feature_routes.clear();
        let gateway = Gateway::new(config);
        let route = gateway.route_for(Feature::Classify);
        assert_eq!(route.provider, "openai");
    }

    #[test]
    fn alternate_provider_is_none_without_key() {
        let mut config = Config::default();
        config.llm.openai_api_key = None;
        config.llm.anthropic_api_key = None;
        let gateway = Gateway::new(config);
        assert!(gateway.alternate_provider("openai").is_none());
    }
}
