//! API dashboard payload.

use serde::Serialize;
use utoipa::ToSchema;

use crate::projector::{DisplayRow, GroupRows};

/// Top-level dashboard payload sent to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiDashboard {
    /// Unix timestamp (seconds since epoch) of the feed poll.
    pub timestamp: i64,
    /// Instrument name shown in the page heading.
    pub instrument: String,
    /// Active instrument configuration.
    pub config_name: String,
    /// Whether private run information (title, users) is shown.
    pub show_private: bool,
    /// Number of rows carrying an active alarm.
    pub alarm_count: usize,
    /// Block groups in feed order.
    pub groups: Vec<GroupRows>,
    /// Instrument run-information rows in feed order.
    pub inst_pvs: Vec<DisplayRow>,
}
