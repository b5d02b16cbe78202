//! Dashboard → ApiDashboard conversion.

use crate::projector::Dashboard;

use super::snapshot::ApiDashboard;

/// Input context for dashboard conversion.
pub struct ConvertContext<'a> {
    pub dashboard: &'a Dashboard,
    pub instrument: &'a str,
    pub timestamp: i64,
}

/// Convert a projected dashboard into the API payload.
pub fn convert(ctx: &ConvertContext<'_>) -> ApiDashboard {
    let dash = ctx.dashboard;
    ApiDashboard {
        timestamp: ctx.timestamp,
        instrument: ctx.instrument.to_string(),
        config_name: dash.config_name.clone(),
        show_private: dash.show_private,
        alarm_count: dash.alarm_count(),
        groups: dash.groups.clone(),
        inst_pvs: dash.inst_pvs.clone(),
    }
}
