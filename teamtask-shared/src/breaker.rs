/// Three-state circuit breaker
///
/// Guards calls to an unreliable dependency (the mailer). The breaker never
/// retries; it only decides whether a call may run and records its outcome.
///
/// # States
///
/// ```text
///            trip condition                 timeout elapsed
///  Closed ───────────────────▶ Open ───────────────────────▶ HalfOpen
///    ▲                           ▲                               │
///    │                           └──────── any failure ──────────┤
///    └────────────── max_requests consecutive successes ─────────┘
/// ```
///
/// - **Closed**: calls run. Counts reset every `interval`. After a failure,
///   the breaker trips when `requests >= min_requests` and
///   `failures / requests >= failure_rate`.
/// - **Open**: calls are rejected with [`BreakerError::Open`] until `timeout`
///   has elapsed.
/// - **HalfOpen**: up to `max_requests` probes run; further calls are
///   rejected with [`BreakerError::TooManyRequests`].
///
/// Counts belong to a generation; every state change starts a new one and
/// outcomes reported for an older generation are ignored.
///
/// # Example
///
/// ```
/// use teamtask_shared::breaker::{BreakerConfig, CircuitBreaker};
///
/// # async fn example() {
/// let breaker = CircuitBreaker::new("mailer", BreakerConfig::default());
///
/// let result: Result<u32, _> = breaker.call(async { Ok::<_, std::io::Error>(42) }).await;
/// assert_eq!(result.unwrap(), 42);
/// # }
/// ```

use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

/// Breaker settings
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Minimum requests in a generation before the breaker may trip
    pub min_requests: u32,

    /// Failure ratio at or above which the breaker trips
    pub failure_rate: f64,

    /// Time spent open before probing
    pub timeout: Duration,

    /// Probes admitted in half-open state
    pub max_requests: u32,

    /// Period after which closed-state counts reset; zero disables resets
    pub interval: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            min_requests: 20,
            failure_rate: 0.5,
            timeout: Duration::from_secs(30),
            max_requests: 3,
            interval: Duration::from_secs(60),
        }
    }
}

/// Breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request counts of the current generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub requests: u32,
    pub total_successes: u32,
    pub total_failures: u32,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
}

impl Counts {
    fn on_request(&mut self) {
        self.requests += 1;
    }

    fn on_success(&mut self) {
        self.total_successes += 1;
        self.consecutive_successes += 1;
        self.consecutive_failures = 0;
    }

    fn on_failure(&mut self) {
        self.total_failures += 1;
        self.consecutive_failures += 1;
        self.consecutive_successes = 0;
    }

    fn clear(&mut self) {
        *self = Counts::default();
    }
}

/// Error returned by [`CircuitBreaker::call`]
#[derive(Debug, thiserror::Error)]
pub enum BreakerError<E> {
    /// Breaker is open; the call was not attempted
    #[error("circuit breaker is open")]
    Open,

    /// Half-open probe limit reached; the call was not attempted
    #[error("circuit breaker is half-open and at its probe limit")]
    TooManyRequests,

    /// The call ran and failed
    #[error(transparent)]
    Inner(E),
}

impl<E> BreakerError<E> {
    /// True when the call was short-circuited without running
    pub fn is_rejected(&self) -> bool {
        matches!(self, BreakerError::Open | BreakerError::TooManyRequests)
    }
}

struct Inner {
    state: BreakerState,
    generation: u64,
    counts: Counts,
    expiry: Option<Instant>,
}

/// Circuit breaker shared by all callers of one dependency
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        let mut inner = Inner {
            state: BreakerState::Closed,
            generation: 0,
            counts: Counts::default(),
            expiry: None,
        };
        inner.expiry = closed_expiry(&config, Instant::now());

        Self {
            name: name.into(),
            config,
            inner: Mutex::new(inner),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state, advancing time-based transitions first
    pub fn state(&self) -> BreakerState {
        let mut inner = self.lock();
        self.current_state(&mut inner, Instant::now());
        inner.state
    }

    /// Snapshot of the current generation's counts
    pub fn counts(&self) -> Counts {
        let mut inner = self.lock();
        self.current_state(&mut inner, Instant::now());
        inner.counts
    }

    /// Runs `fut` if the breaker admits it and records the outcome
    ///
    /// A future dropped before completion counts as a failure.
    pub async fn call<F, T, E>(&self, fut: F) -> Result<T, BreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        let generation = self.before_request::<E>()?;
        let mut guard = OutcomeGuard {
            breaker: self,
            generation,
            armed: true,
        };

        let result = fut.await;

        guard.armed = false;
        self.after_request(generation, result.is_ok());

        result.map_err(BreakerError::Inner)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn before_request<E>(&self) -> Result<u64, BreakerError<E>> {
        let mut inner = self.lock();
        self.current_state(&mut inner, Instant::now());

        match inner.state {
            BreakerState::Open => return Err(BreakerError::Open),
            BreakerState::HalfOpen if inner.counts.requests >= self.config.max_requests => {
                return Err(BreakerError::TooManyRequests)
            }
            _ => {}
        }

        inner.counts.on_request();
        Ok(inner.generation)
    }

    fn after_request(&self, generation: u64, success: bool) {
        let mut inner = self.lock();
        let now = Instant::now();
        self.current_state(&mut inner, now);

        if inner.generation != generation {
            return;
        }

        if success {
            inner.counts.on_success();
            if inner.state == BreakerState::HalfOpen
                && inner.counts.consecutive_successes >= self.config.max_requests
            {
                self.set_state(&mut inner, BreakerState::Closed, now);
            }
        } else {
            inner.counts.on_failure();
            let state = inner.state;
            match state {
                BreakerState::Closed if self.ready_to_trip(&inner.counts) => {
                    self.set_state(&mut inner, BreakerState::Open, now)
                }
                BreakerState::HalfOpen => self.set_state(&mut inner, BreakerState::Open, now),
                _ => {}
            }
        }
    }

    fn ready_to_trip(&self, counts: &Counts) -> bool {
        if counts.requests < self.config.min_requests || counts.requests == 0 {
            return false;
        }

        f64::from(counts.total_failures) / f64::from(counts.requests) >= self.config.failure_rate
    }

    fn current_state(&self, inner: &mut Inner, now: Instant) {
        let state = inner.state;
        match state {
            BreakerState::Closed => {
                if matches!(inner.expiry, Some(expiry) if expiry <= now) {
                    self.new_generation(inner, now);
                }
            }
            BreakerState::Open => {
                if matches!(inner.expiry, Some(expiry) if expiry <= now) {
                    self.set_state(inner, BreakerState::HalfOpen, now);
                }
            }
            BreakerState::HalfOpen => {}
        }
    }

    fn set_state(&self, inner: &mut Inner, state: BreakerState, now: Instant) {
        if inner.state == state {
            return;
        }

        let previous = inner.state;
        inner.state = state;
        self.new_generation(inner, now);

        match state {
            BreakerState::Open => tracing::warn!(
                breaker = %self.name,
                from = %previous,
                to = %state,
                "circuit breaker opened"
            ),
            _ => tracing::info!(
                breaker = %self.name,
                from = %previous,
                to = %state,
                "circuit breaker state changed"
            ),
        }
    }

    fn new_generation(&self, inner: &mut Inner, now: Instant) {
        inner.generation += 1;
        inner.counts.clear();
        inner.expiry = match inner.state {
            BreakerState::Closed => closed_expiry(&self.config, now),
            BreakerState::Open => Some(now + self.config.timeout),
            BreakerState::HalfOpen => None,
        };
    }
}

fn closed_expiry(config: &BreakerConfig, now: Instant) -> Option<Instant> {
    if config.interval.is_zero() {
        None
    } else {
        Some(now + config.interval)
    }
}

/// Records a failure if the guarded call is dropped mid-flight
struct OutcomeGuard<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    armed: bool,
}

impl Drop for OutcomeGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.breaker.after_request(self.generation, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Boom;

    async fn fail(breaker: &CircuitBreaker) -> Result<(), BreakerError<Boom>> {
        breaker.call(async { Err::<(), _>(Boom) }).await
    }

    async fn succeed(breaker: &CircuitBreaker) -> Result<(), BreakerError<Boom>> {
        breaker.call(async { Ok::<(), Boom>(()) }).await
    }

    fn small_config() -> BreakerConfig {
        BreakerConfig {
            min_requests: 4,
            failure_rate: 0.5,
            timeout: Duration::from_secs(30),
            max_requests: 2,
            interval: Duration::from_secs(60),
        }
    }

    async fn trip(breaker: &CircuitBreaker) {
        for _ in 0..4 {
            let _ = fail(breaker).await;
        }
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[tokio::test]
    async fn test_passes_results_through_when_closed() {
        let breaker = CircuitBreaker::new("test", BreakerConfig::default());

        assert!(succeed(&breaker).await.is_ok());
        assert!(matches!(fail(&breaker).await, Err(BreakerError::Inner(Boom))));

        let counts = breaker.counts();
        assert_eq!(counts.requests, 2);
        assert_eq!(counts.total_successes, 1);
        assert_eq!(counts.total_failures, 1);
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_does_not_trip_below_min_requests() {
        let breaker = CircuitBreaker::new("test", BreakerConfig::default());

        for _ in 0..19 {
            let _ = fail(&breaker).await;
        }
        assert_eq!(breaker.state(), BreakerState::Closed);

        let _ = fail(&breaker).await;
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[tokio::test]
    async fn test_does_not_trip_below_failure_rate() {
        let breaker = CircuitBreaker::new("test", small_config());

        for _ in 0..3 {
            let _ = succeed(&breaker).await;
        }
        let _ = fail(&breaker).await;

        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_open_rejects_without_running() {
        let breaker = CircuitBreaker::new("test", small_config());
        trip(&breaker).await;

        let mut ran = false;
        let result: Result<(), BreakerError<Boom>> = breaker
            .call(async {
                ran = true;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(BreakerError::Open)));
        assert!(result.unwrap_err().is_rejected());
        assert!(!ran);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_after_timeout_then_closes() {
        let breaker = CircuitBreaker::new("test", small_config());
        trip(&breaker).await;

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(breaker.state(), BreakerState::HalfOpen);

        assert!(succeed(&breaker).await.is_ok());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
        assert!(succeed(&breaker).await.is_ok());
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert_eq!(breaker.counts(), Counts::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_failure_reopens() {
        let breaker = CircuitBreaker::new("test", small_config());
        trip(&breaker).await;

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(breaker.state(), BreakerState::HalfOpen);

        let _ = fail(&breaker).await;
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_limits_concurrent_probes() {
        let breaker = CircuitBreaker::new("test", small_config());
        trip(&breaker).await;
        tokio::time::advance(Duration::from_secs(30)).await;

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let slow = breaker.call(async move {
            let _ = rx.await;
            Ok::<(), Boom>(())
        });
        let other = breaker.call(async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<(), Boom>(())
        });
        tokio::pin!(slow);
        tokio::pin!(other);

        // Poll both probes once so they are admitted.
        assert!(futures_poll_once(slow.as_mut()).await.is_none());
        assert!(futures_poll_once(other.as_mut()).await.is_none());

        assert!(matches!(succeed(&breaker).await, Err(BreakerError::TooManyRequests)));

        let _ = tx.send(());
        assert!(slow.await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_counts_reset_each_interval() {
        let breaker = CircuitBreaker::new("test", small_config());

        for _ in 0..3 {
            let _ = fail(&breaker).await;
        }
        assert_eq!(breaker.counts().total_failures, 3);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(breaker.counts(), Counts::default());

        let _ = fail(&breaker).await;
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_dropped_call_counts_as_failure() {
        let breaker = CircuitBreaker::new("test", small_config());

        {
            let pending = breaker.call(std::future::pending::<Result<(), Boom>>());
            tokio::pin!(pending);
            assert!(futures_poll_once(pending.as_mut()).await.is_none());
        }

        let counts = breaker.counts();
        assert_eq!(counts.requests, 1);
        assert_eq!(counts.total_failures, 1);
    }

    /// Polls a future exactly once
    async fn futures_poll_once<F: Future + Unpin>(fut: F) -> Option<F::Output> {
        let mut fut = fut;
        std::future::poll_fn(|cx| {
            std::task::Poll::Ready(match std::pin::Pin::new(&mut fut).poll(cx) {
                std::task::Poll::Ready(out) => Some(out),
                std::task::Poll::Pending => None,
            })
        })
        .await
    }
}
