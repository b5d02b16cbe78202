//! Shared application state and global statics.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use tokio::sync::broadcast;

use dataweb_core::api::snapshot::ApiDashboard;
use dataweb_core::provider::FeedProvider;

pub(crate) struct WebAppInner {
    /// Instrument name shown in page headings.
    pub(crate) instrument: String,
    /// Browser refresh interval for the HTML page, in seconds.
    pub(crate) refresh_secs: u64,
    // Latest successful projection, replaced wholesale on every good tick
    pub(crate) current: Option<Arc<ApiDashboard>>,
    // HTML page rendered from `current`
    pub(crate) current_page: Option<Arc<String>>,
    // Poll bookkeeping for /api/v1/health
    pub(crate) snapshot_count: u64,
    pub(crate) last_success: Option<i64>,
    pub(crate) last_error: Option<String>,
}

impl WebAppInner {
    pub(crate) fn new(instrument: String, refresh_secs: u64) -> Self {
        Self {
            instrument,
            refresh_secs,
            current: None,
            current_page: None,
            snapshot_count: 0,
            last_success: None,
            last_error: None,
        }
    }
}

pub(crate) type SharedState = Arc<Mutex<WebAppInner>>;

/// Feed source, owned by the tick loop and used from blocking threads.
pub(crate) type SharedProvider = Arc<Mutex<Box<dyn FeedProvider + Send>>>;

pub(crate) type AppState = State<(SharedState, broadcast::Sender<Arc<ApiDashboard>>)>;

pub(crate) static SSE_CONNECTIONS: AtomicUsize = AtomicUsize::new(0);

pub(crate) fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}
