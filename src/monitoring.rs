// src/monitoring.rs
use serde::Serialize;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};

/// Per-client request counters.
#[derive(Debug, Clone)]
pub struct ClientMetrics {
    pub request_count: Arc<AtomicU64>,
    pub error_count: Arc<AtomicU64>,
    pub refresh_count: Arc<AtomicU64>,
    pub retry_count: Arc<AtomicU64>,
    pub redirect_count: Arc<AtomicU64>,
    pub response_times: Arc<std::sync::Mutex<Vec<u64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub errors_total: u64,
    pub refreshes_total: u64,
    pub retries_total: u64,
    pub redirects_total: u64,
    pub avg_response_time_ms: f64,
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self {
            request_count: Arc::new(AtomicU64::new(0)),
            error_count: Arc::new(AtomicU64::new(0)),
            refresh_count: Arc::new(AtomicU64::new(0)),
            retry_count: Arc::new(AtomicU64::new(0)),
            redirect_count: Arc::new(AtomicU64::new(0)),
            response_times: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn increment_requests(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_errors(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_refreshes(&self) {
        self.refresh_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retries(&self) {
        self.retry_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_redirects(&self) {
        self.redirect_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_response_time(&self, time_ms: u64) {
        if let Ok(mut times) = self.response_times.lock() {
            times.push(time_ms);
            if times.len() > 1000 {
                times.remove(0);
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let avg_response_time = if let Ok(times) = self.response_times.lock() {
            if times.is_empty() { 0.0 } else { times.iter().sum::<u64>() as f64 / times.len() as f64 }
        } else { 0.0 };

        MetricsSnapshot {
            requests_total: self.request_count.load(Ordering::Relaxed),
            errors_total: self.error_count.load(Ordering::Relaxed),
            refreshes_total: self.refresh_count.load(Ordering::Relaxed),
            retries_total: self.retry_count.load(Ordering::Relaxed),
            redirects_total: self.redirect_count.load(Ordering::Relaxed),
            avg_response_time_ms: avg_response_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_average() {
        let metrics = ClientMetrics::new();
        metrics.increment_requests();
        metrics.increment_requests();
        metrics.increment_errors();
        metrics.increment_refreshes();
        metrics.record_response_time(10);
        metrics.record_response_time(30);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.errors_total, 1);
        assert_eq!(snapshot.refreshes_total, 1);
        assert_eq!(snapshot.retries_total, 0);
        assert_eq!(snapshot.avg_response_time_ms, 20.0);
    }

    #[test]
    fn test_response_times_are_capped() {
        let metrics = ClientMetrics::new();
        for i in 0..1005 {
            metrics.record_response_time(i);
        }
        let times = metrics.response_times.lock().unwrap();
        assert_eq!(times.len(), 1000);
        assert_eq!(times[0], 5);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = ClientMetrics::new();
        let clone = metrics.clone();
        clone.increment_redirects();
        assert_eq!(metrics.snapshot().redirects_total, 1);
    }
}
