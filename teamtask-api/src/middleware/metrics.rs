/// HTTP request metrics
///
/// Counts requests and accumulates their durations per
/// `(method, matched route, status)`. The route is the router's path pattern
/// (`/api/v1/tasks/:id`), not the concrete path, so label cardinality stays
/// bounded.
///
/// # Exposition
///
/// [`HttpMetrics::render`] produces the Prometheus text format:
///
/// ```text
/// # TYPE teamtask_up gauge
/// teamtask_up 1
/// # TYPE teamtask_http_requests_total counter
/// teamtask_http_requests_total{method="GET",route="/api/v1/teams",status="200"} 3
/// # TYPE teamtask_http_request_duration_seconds summary
/// teamtask_http_request_duration_seconds_sum{method="GET",route="/api/v1/teams",status="200"} 0.012
/// teamtask_http_request_duration_seconds_count{method="GET",route="/api/v1/teams",status="200"} 3
/// ```

use axum::{
    extract::{MatchedPath, Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Content type of the Prometheus text format
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SeriesKey {
    method: String,
    route: String,
    status: u16,
}

#[derive(Debug, Clone, Copy, Default)]
struct Series {
    count: u64,
    duration_sum: f64,
}

/// Request counters shared by the middleware and the metrics endpoint
#[derive(Debug, Default)]
pub struct HttpMetrics {
    series: Mutex<BTreeMap<SeriesKey, Series>>,
}

impl HttpMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        let key = SeriesKey {
            method: method.to_string(),
            route: route.to_string(),
            status,
        };

        let mut series = self.lock();
        let entry = series.entry(key).or_default();
        entry.count += 1;
        entry.duration_sum += elapsed.as_secs_f64();
    }

    /// Requests recorded for one series
    pub fn request_count(&self, method: &str, route: &str, status: u16) -> u64 {
        let key = SeriesKey {
            method: method.to_string(),
            route: route.to_string(),
            status,
        };

        self.lock().get(&key).map(|s| s.count).unwrap_or(0)
    }

    /// Renders all series in the Prometheus text format
    pub fn render(&self) -> String {
        let series = self.lock().clone();
        let mut out = String::new();

        let _ = writeln!(out, "# HELP teamtask_up Whether the API server is running");
        let _ = writeln!(out, "# TYPE teamtask_up gauge");
        let _ = writeln!(out, "teamtask_up 1");

        let _ = writeln!(out, "# HELP teamtask_http_requests_total Total HTTP requests");
        let _ = writeln!(out, "# TYPE teamtask_http_requests_total counter");
        for (key, s) in &series {
            let _ = writeln!(out, "teamtask_http_requests_total{} {}", labels(key), s.count);
        }

        let _ = writeln!(
            out,
            "# HELP teamtask_http_request_duration_seconds HTTP request duration"
        );
        let _ = writeln!(out, "# TYPE teamtask_http_request_duration_seconds summary");
        for (key, s) in &series {
            let labels = labels(key);
            let _ = writeln!(
                out,
                "teamtask_http_request_duration_seconds_sum{} {}",
                labels, s.duration_sum
            );
            let _ = writeln!(
                out,
                "teamtask_http_request_duration_seconds_count{} {}",
                labels, s.count
            );
        }

        out
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<SeriesKey, Series>> {
        self.series.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn labels(key: &SeriesKey) -> String {
    format!(
        "{{method=\"{}\",route=\"{}\",status=\"{}\"}}",
        escape(&key.method),
        escape(&key.route),
        key.status
    )
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Middleware recording every routed request
///
/// Must be installed with `Router::route_layer` so the matched route is known.
pub async fn track_metrics(
    State(metrics): State<Arc<HttpMetrics>>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;
    metrics.record(&method, &route, response.status().as_u16(), start.elapsed());

    response
}

/// Metrics exposition handler
pub async fn render_metrics(State(metrics): State<Arc<HttpMetrics>>) -> Response {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        metrics.render(),
    )
        .into_response()
}
