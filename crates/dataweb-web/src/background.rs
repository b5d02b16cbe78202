//! Background processing: feed tick loop, projection, page rendering.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use dataweb_core::api::convert::{ConvertContext, convert};
use dataweb_core::api::snapshot::ApiDashboard;
use dataweb_core::model::FeedSnapshot;
use dataweb_core::projector::StatusFeedProjector;
use dataweb_core::provider::ProviderError;
use dataweb_core::render::{PageOptions, render_page};

use crate::state::{SharedProvider, SharedState, WebAppInner, now_epoch};

// ============================================================
// Tick loop
// ============================================================

pub(crate) async fn tick_loop(
    state: SharedState,
    tx: broadcast::Sender<Arc<ApiDashboard>>,
    provider: SharedProvider,
    projector: StatusFeedProjector,
    interval: Duration,
) {
    let mut tick = tokio::time::interval(interval);
    // A fetch slower than the interval swallows the ticks it overlaps.
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tick.tick().await;

        // Run the blocking fetch off the async runtime
        let provider_clone = provider.clone();
        let t0 = Instant::now();
        let result = tokio::task::spawn_blocking(move || {
            let mut provider = provider_clone
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            provider.fetch()
        })
        .await;

        let elapsed = t0.elapsed();

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                error!(error = %e, "fetch panicked in spawn_blocking");
                continue;
            }
        };

        let (dashboard, count) = {
            let mut inner = state.lock().unwrap();
            let dashboard = apply_fetch(&mut inner, &projector, fetched, now_epoch());
            (dashboard, inner.snapshot_count)
        };

        match dashboard {
            Some(dash) => {
                if count == 1 {
                    info!(
                        duration_ms = elapsed.as_millis() as u64,
                        config = %dash.config_name,
                        "first snapshot fetched"
                    );
                } else {
                    debug!(
                        duration_ms = elapsed.as_millis() as u64,
                        snapshot_count = count,
                        alarms = dash.alarm_count,
                        "tick completed"
                    );
                }
                let _ = tx.send(dash);
            }
            None => {
                warn!(duration_ms = elapsed.as_millis() as u64, "tick produced no snapshot");
            }
        }

        if elapsed > interval / 2 {
            warn!(
                duration_ms = elapsed.as_millis() as u64,
                interval_ms = interval.as_millis() as u64,
                "tick exceeded 50% of interval"
            );
        }
    }
}

/// Applies one fetch result to the shared state.
///
/// On success the previous dashboard and page are replaced wholesale and the
/// new dashboard is returned. On failure the previous dashboard stays in
/// place and only the error is recorded.
pub(crate) fn apply_fetch(
    inner: &mut WebAppInner,
    projector: &StatusFeedProjector,
    fetched: Result<FeedSnapshot, ProviderError>,
    timestamp: i64,
) -> Option<Arc<ApiDashboard>> {
    let snapshot = match fetched {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(error = %e, "feed fetch failed");
            inner.last_error = Some(e.to_string());
            return None;
        }
    };

    let dashboard = projector.project(&snapshot);
    let api = Arc::new(convert(&ConvertContext {
        dashboard: &dashboard,
        instrument: &inner.instrument,
        timestamp,
    }));
    let page = render_page(
        &dashboard,
        &PageOptions {
            instrument: &inner.instrument,
            refresh_secs: Some(inner.refresh_secs),
            updated_at: DateTime::<Utc>::from_timestamp(timestamp, 0),
        },
    );

    inner.current = Some(api.clone());
    inner.current_page = Some(Arc::new(page));
    inner.snapshot_count += 1;
    inner.last_success = Some(timestamp);
    inner.last_error = None;
    Some(api)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataweb_core::model::FieldState;

    fn snapshot(config: &str) -> FeedSnapshot {
        FeedSnapshot {
            config_name: config.into(),
            groups: [(
                "NONE".to_string(),
                [(
                    "WEST".to_string(),
                    FieldState::connected("-1.000", "OK, OK"),
                )]
                .into_iter()
                .collect(),
            )]
            .into_iter()
            .collect(),
            instrument_fields: Default::default(),
        }
    }

    #[test]
    fn test_success_replaces_dashboard() {
        let mut inner = WebAppInner::new("DEMO".into(), 5);
        let projector = StatusFeedProjector::default();

        apply_fetch(&mut inner, &projector, Ok(snapshot("first")), 100).unwrap();
        let dash = apply_fetch(&mut inner, &projector, Ok(snapshot("second")), 200).unwrap();

        assert_eq!(dash.config_name, "second");
        assert_eq!(inner.current.as_ref().unwrap().timestamp, 200);
        assert_eq!(inner.snapshot_count, 2);
        assert_eq!(inner.last_success, Some(200));
        let page = inner.current_page.as_ref().unwrap();
        assert!(page.contains("Configuration: second"));
        assert!(page.contains("<h3>OTHER</h3>"));
    }

    #[test]
    fn test_failure_keeps_previous_dashboard() {
        let mut inner = WebAppInner::new("DEMO".into(), 5);
        let projector = StatusFeedProjector::default();

        apply_fetch(&mut inner, &projector, Ok(snapshot("good")), 100);
        let failed = apply_fetch(
            &mut inner,
            &projector,
            Err(ProviderError::Http("connection refused".into())),
            200,
        );

        assert!(failed.is_none());
        assert_eq!(inner.current.as_ref().unwrap().config_name, "good");
        assert_eq!(inner.snapshot_count, 1);
        assert_eq!(
            inner.last_error.as_deref(),
            Some("HTTP error: connection refused")
        );

        apply_fetch(&mut inner, &projector, Ok(snapshot("recovered")), 300);
        assert!(inner.last_error.is_none());
    }
}
