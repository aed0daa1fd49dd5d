use anyhow::Result;
use lazy_static::lazy_static;
use log::{info, warn};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 3,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failures: u32,
    successes: u32,
    last_failure: Option<Instant>,
}

/// Trips after repeated failures so a flapping external service stops
/// eating every window fetch; half-opens after the cooldown.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                last_failure: None,
            }),
        }
    }

    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send,
    {
        {
            let mut inner = self.inner.lock().await;
            if inner.state == CircuitState::Open {
                let cooled_down = inner
                    .last_failure
                    .map(|at| at.elapsed() > self.config.timeout)
                    .unwrap_or(false);
                if cooled_down {
                    inner.state = CircuitState::HalfOpen;
                    inner.successes = 0;
                    info!("Circuit breaker transitioning to half-open after timeout");
                } else {
                    return Err(anyhow::anyhow!("Circuit breaker is open"));
                }
            }
        }

        let result = operation().await;
        self.record(result.is_ok()).await;
        result
    }

    async fn record(&self, success: bool) {
        let mut inner = self.inner.lock().await;
        if success {
            match inner.state {
                CircuitState::HalfOpen => {
                    inner.successes += 1;
                    if inner.successes >= self.config.success_threshold {
                        inner.state = CircuitState::Closed;
                        inner.failures = 0;
                        info!("Circuit breaker closing after {} successful calls", inner.successes);
                    }
                }
                _ => {
                    inner.state = CircuitState::Closed;
                    inner.failures = 0;
                }
            }
        } else {
            inner.failures += 1;
            inner.last_failure = Some(Instant::now());
            if inner.state != CircuitState::Open && inner.failures >= self.config.failure_threshold
            {
                inner.state = CircuitState::Open;
                warn!("Circuit breaker opening after {} failures", inner.failures);
            }
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }
}

// Global registry, one breaker per external service name.
lazy_static! {
    static ref REGISTRY: RwLock<HashMap<String, Arc<CircuitBreaker>>> = RwLock::new(HashMap::new());
}

pub async fn get_circuit_breaker(service_name: &str) -> Arc<CircuitBreaker> {
    {
        let registry = REGISTRY.read().await;
        if let Some(breaker) = registry.get(service_name) {
            return breaker.clone();
        }
    }

    let mut registry = REGISTRY.write().await;
    registry
        .entry(service_name.to_string())
        .or_insert_with(|| {
            let config = match service_name {
                "calendar_source" => CircuitBreakerConfig {
                    failure_threshold: 3,
                    success_threshold: 2,
                    timeout: Duration::from_secs(30),
                },
                _ => CircuitBreakerConfig::default(),
            };
            info!("Created circuit breaker for service: {}", service_name);
            Arc::new(CircuitBreaker::new(config))
        })
        .clone()
}
