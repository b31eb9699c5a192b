//! Per-provider circuit breaker (§4.11 "Circuit breaker"): 3 consecutive
//! failures open the breaker for 5 minutes.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

const FAILURE_THRESHOLD: u32 = 3;
const COOLDOWN: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
struct ProviderState {
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self { consecutive_failures: 0, opened_at: None }
    }
}

/// Tracks open/closed state per provider name. Shared process-wide and
/// guarded by a single lock (§5 "Shared state lifecycle").
pub struct CircuitBreaker {
    providers: RwLock<HashMap<String, ProviderState>>,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self { providers: RwLock::new(HashMap::new()) }
    }

    /// Whether calls to `provider` should be routed elsewhere or fail fast.
    pub fn is_open(&self, provider: &str) -> bool {
        let mut providers = self.providers.write().expect("circuit breaker lock poisoned");
        let state = providers.entry(provider.to_string()).or_default();
        match state.opened_at {
            Some(opened_at) if opened_at.elapsed() >= COOLDOWN => {
                *state = ProviderState::default();
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn record_success(&self, provider: &str) {
        let mut providers = self.providers.write().expect("circuit breaker lock poisoned");
        providers.insert(provider.to_string(), ProviderState::default());
    }

    pub fn record_failure(&self, provider: &str) {
        let mut providers = self.providers.write().expect("circuit breaker lock poisoned");
        let state = providers.entry(provider.to_string()).or_default();
        state.consecutive_failures += 1;
        if state.consecutive_failures >= FAILURE_THRESHOLD && state.opened_at.is_none() {
            state.opened_at = Some(Instant::now());
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_by_default() {
        let cb = CircuitBreaker::new();
        assert!(!cb.is_open("openai"));
    }

    #[test]
    fn opens_after_threshold_failures() {
        let cb = CircuitBreaker::new();
        for _ in 0..FAILURE_THRESHOLD {
            cb.record_failure("openai");
        }
        assert!(cb.is_open("openai"));
    }

    #[test]
    fn success_resets_failure_count() {
        let cb = CircuitBreaker::new();
        cb.record_failure("openai");
        cb.record_failure("openai");
        cb.record_success("openai");
        cb.record_failure("openai");
        assert!(!cb.is_open("openai"));
    }

    #[test]
    fn providers_are_tracked_independently() {
        let cb = CircuitBreaker::new();
        for _ in 0..FAILURE_THRESHOLD {
            cb.record_failure("openai");
        }
        assert!(cb.is_open("openai"));
        assert!(!cb.is_open("anthropic"));
    }
}
