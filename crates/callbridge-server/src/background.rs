//! Background tasks for the callbridge server.
//!
//! Includes:
//! - Sweeping expired call reports.

use crate::AppState;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};

/// Starts the report sweep task.
///
/// Runs indefinitely, removing call reports older than the cache TTL.
pub async fn start_report_sweep_task(state: Arc<AppState>, interval: Duration) {
    if interval.is_zero() {
        tracing::warn!("report sweep task disabled (interval=0)");
        return;
    }

    tracing::info!(
        interval_seconds = interval.as_secs(),
        "starting report sweep task"
    );

    loop {
        sleep(interval).await;
        sweep_once(&state, Instant::now());
    }
}

/// One sweep pass. Returns the number of reports removed.
pub fn sweep_once(state: &AppState, now: Instant) -> usize {
    let (removed, remaining) = {
        let mut reports = state.lock_reports();
        let removed = reports.sweep(now);
        (removed, reports.len())
    };
    if removed > 0 {
        tracing::info!(removed, remaining, "swept expired call reports");
    }
    tracing::debug!(active_calls = state.active_call_count(), "report sweep finished");
    removed
}

/// Sweep cadence for a given report TTL: half the TTL, between 1 and 60 seconds.
pub fn sweep_interval(ttl: Duration) -> Duration {
    Duration::from_secs((ttl.as_secs() / 2).clamp(1, 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use callbridge_pipeline::{CallReport, CallSummary};

    fn report(call_sid: &str) -> CallReport {
        CallReport {
            call_sid: call_sid.into(),
            recording_sid: "RE1".into(),
            transcript: String::new(),
            summary: CallSummary {
                summary: "short".into(),
                category: "uncategorized".into(),
                action_items: Vec::new(),
            },
            emailed: false,
            completed_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn sweep_removes_expired_reports() {
        let state = AppState::from_config(&Config::default());
        let ttl = state.lock_reports().ttl();
        let t0 = Instant::now();
        state.lock_reports().insert("CA1".into(), report("CA1"), t0);
        state
            .lock_reports()
            .insert("CA2".into(), report("CA2"), t0 + ttl);

        assert_eq!(sweep_once(&state, t0 + ttl), 1);
        assert_eq!(state.lock_reports().len(), 1);
        assert!(state.lock_reports().get(&"CA2".to_string(), t0 + ttl).is_some());
    }

    #[test]
    fn interval_is_clamped() {
        assert_eq!(sweep_interval(Duration::from_secs(3600)), Duration::from_secs(60));
        assert_eq!(sweep_interval(Duration::from_secs(10)), Duration::from_secs(5));
        assert_eq!(sweep_interval(Duration::from_secs(0)), Duration::from_secs(1));
    }
}
