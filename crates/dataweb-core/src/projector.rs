//! Snapshot → display rows.
//!
//! Applies the dashboard visibility rules to one `FeedSnapshot`:
//! disconnected PVs show only their status, private run information is
//! withheld when the instrument asks for it, and alarms are shown only when
//! active. Projection is pure; every poll is projected from scratch.

use serde::Serialize;
use tracing::debug;

use crate::labels::LabelTable;
use crate::model::{ConnectionStatus, FeedSnapshot, FieldState, OrderedMap};

/// Instrument PV that switches private run information on or off.
pub const DISPLAY_KEY: &str = "DISPLAY";

/// Instrument PVs withheld while `DISPLAY` is `NO`.
pub const PRIVATE_FIELDS: &[&str] = &["TITLE", "_USERNAME"];

/// Group the block server uses for blocks outside any named group.
pub const UNGROUPED_NAME: &str = "NONE";

/// Label shown for the ungrouped blocks.
pub const UNGROUPED_LABEL: &str = "OTHER";

// ============================================================
// Output rows
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    /// Connected field showing its value.
    Value,
    /// Field whose PV is not connected.
    Disconnected,
    /// Private field withheld from display.
    Suppressed,
}

/// One rendered line of the dashboard.
///
/// `value` is set only for `RowKind::Value`; `alarm` only when that value
/// carries an active alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct DisplayRow {
    pub label: String,
    pub kind: RowKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm: Option<String>,
}

impl DisplayRow {
    pub fn value(
        label: impl Into<String>,
        value: impl Into<String>,
        alarm: Option<String>,
    ) -> Self {
        Self {
            label: label.into(),
            kind: RowKind::Value,
            value: Some(value.into()),
            alarm,
        }
    }

    pub fn disconnected(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: RowKind::Disconnected,
            value: None,
            alarm: None,
        }
    }

    pub fn suppressed(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: RowKind::Suppressed,
            value: None,
            alarm: None,
        }
    }
}

/// A block group with its display label and rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct GroupRows {
    pub label: String,
    pub rows: Vec<DisplayRow>,
}

/// Projected instrument PVs plus the privacy flag derived from `DISPLAY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentRows {
    pub show_private: bool,
    pub rows: Vec<DisplayRow>,
}

/// Full projection of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub config_name: String,
    pub show_private: bool,
    pub groups: Vec<GroupRows>,
    pub inst_pvs: Vec<DisplayRow>,
}

impl Dashboard {
    /// Number of rows across all groups and instrument PVs.
    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum::<usize>() + self.inst_pvs.len()
    }

    /// Number of rows with an active alarm.
    pub fn alarm_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| g.rows.iter())
            .chain(self.inst_pvs.iter())
            .filter(|r| r.alarm.is_some())
            .count()
    }
}

// ============================================================
// Projector
// ============================================================

/// Projects feed snapshots into dashboard rows using a fixed label table.
#[derive(Debug, Clone, Default)]
pub struct StatusFeedProjector {
    labels: LabelTable,
}

impl StatusFeedProjector {
    pub fn new(labels: LabelTable) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Projects a whole snapshot.
    pub fn project(&self, snapshot: &FeedSnapshot) -> Dashboard {
        let groups = self.project_groups(&snapshot.groups);
        let instrument = self.project_instrument_fields(&snapshot.instrument_fields);
        let dashboard = Dashboard {
            config_name: snapshot.config_name.clone(),
            show_private: instrument.show_private,
            groups,
            inst_pvs: instrument.rows,
        };
        debug!(
            config = %dashboard.config_name,
            groups = dashboard.groups.len(),
            rows = dashboard.row_count(),
            alarms = dashboard.alarm_count(),
            show_private = dashboard.show_private,
            "snapshot projected"
        );
        dashboard
    }

    /// Projects block groups in feed order. Blocks are never private.
    pub fn project_groups(&self, groups: &OrderedMap<OrderedMap<FieldState>>) -> Vec<GroupRows> {
        groups
            .iter()
            .map(|(name, blocks)| GroupRows {
                label: normalize_group_label(name).to_string(),
                rows: blocks
                    .iter()
                    .map(|(block, state)| project_field(block, state, false, true))
                    .collect(),
            })
            .collect()
    }

    /// Projects instrument PVs in feed order, consuming `DISPLAY` for the privacy flag.
    pub fn project_instrument_fields(&self, fields: &OrderedMap<FieldState>) -> InstrumentRows {
        let show_private = show_private_from(fields.get(DISPLAY_KEY));
        let rows = fields
            .iter()
            .filter(|(key, _)| *key != DISPLAY_KEY)
            .map(|(key, state)| {
                project_field(
                    self.labels.label_for(key),
                    state,
                    PRIVATE_FIELDS.contains(&key.as_str()),
                    show_private,
                )
            })
            .collect();
        InstrumentRows { show_private, rows }
    }
}

// ============================================================
// Rules
// ============================================================

/// Projects a single field. Disconnection takes priority over suppression.
pub fn project_field(
    label: &str,
    state: &FieldState,
    suppressible: bool,
    show_private: bool,
) -> DisplayRow {
    if state.connection_status == ConnectionStatus::Disconnected {
        return DisplayRow::disconnected(label);
    }
    if suppressible && !show_private {
        return DisplayRow::suppressed(label);
    }
    let alarm = is_active_alarm(&state.alarm_text).then(|| state.alarm_text.clone());
    DisplayRow::value(label, state.value.as_str(), alarm)
}

/// Alarm text is active unless it starts with `null` or `OK` (case-sensitive prefix).
pub fn is_active_alarm(alarm_text: &str) -> bool {
    !alarm_text.starts_with("null") && !alarm_text.starts_with("OK")
}

/// `NONE` displays as `OTHER`; every other group name is shown as-is.
pub fn normalize_group_label(name: &str) -> &str {
    if name == UNGROUPED_NAME {
        UNGROUPED_LABEL
    } else {
        name
    }
}

/// Private fields are shown unless `DISPLAY` reads `NO` in any case.
pub fn show_private_from(display: Option<&FieldState>) -> bool {
    display.is_none_or(|state| !state.value.eq_ignore_ascii_case("NO"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected(value: &str, alarm: &str) -> FieldState {
        FieldState::connected(value, alarm)
    }

    fn display(value: &str) -> FieldState {
        connected(value, "null")
    }

    fn owned<T>((key, value): (&str, T)) -> (String, T) {
        (key.to_string(), value)
    }

    #[test]
    fn test_disconnected_ignores_value_and_alarm() {
        let mut state = connected("12.0", "MAJOR, HIHI");
        state.connection_status = ConnectionStatus::Disconnected;
        for suppressible in [false, true] {
            for show_private in [false, true] {
                let row = project_field("TEMP", &state, suppressible, show_private);
                assert_eq!(row, DisplayRow::disconnected("TEMP"));
            }
        }
    }

    #[test]
    fn test_disconnected_wins_over_suppression() {
        let row = project_field("Title", &FieldState::disconnected(), true, false);
        assert_eq!(row.kind, RowKind::Disconnected);
    }

    #[test]
    fn test_suppressed_only_when_private_hidden() {
        let state = connected("Secret", "MINOR, LINK_ALARM");
        assert_eq!(
            project_field("Title", &state, true, false),
            DisplayRow::suppressed("Title")
        );
        let shown = project_field("Title", &state, true, true);
        assert_eq!(shown.kind, RowKind::Value);
        assert_eq!(shown.value.as_deref(), Some("Secret"));
        let not_private = project_field("Run Status", &state, false, false);
        assert_eq!(not_private.kind, RowKind::Value);
    }

    #[test]
    fn test_alarm_activation() {
        assert!(!is_active_alarm("OK, OK"));
        assert!(!is_active_alarm("null"));
        assert!(is_active_alarm("MINOR, LINK_ALARM"));
        assert!(is_active_alarm("ok"));
        // Prefix match: these read as "no alarm".
        assert!(!is_active_alarm("OKAY"));
        assert!(!is_active_alarm("nullified"));
    }

    #[test]
    fn test_active_alarm_shown_verbatim() {
        let row = project_field("WEST", &connected("3", "MINOR, LINK_ALARM"), false, true);
        assert_eq!(row.alarm.as_deref(), Some("MINOR, LINK_ALARM"));
        let quiet = project_field("WEST", &connected("3", "OK, OK"), false, true);
        assert_eq!(quiet.alarm, None);
    }

    #[test]
    fn test_null_value_is_shown_as_text() {
        let row = project_field("WEST", &connected("null", "null"), false, true);
        assert_eq!(row.value.as_deref(), Some("null"));
        assert_eq!(row.alarm, None);
    }

    #[test]
    fn test_show_private_derivation() {
        for hidden in ["no", "NO", "No", "nO"] {
            assert!(!show_private_from(Some(&display(hidden))), "{hidden}");
        }
        for shown in ["yes", "YES", "", "NOPE", "null"] {
            assert!(show_private_from(Some(&display(shown))), "{shown}");
        }
        assert!(show_private_from(None));
    }

    #[test]
    fn test_group_label_translation() {
        assert_eq!(normalize_group_label("NONE"), "OTHER");
        assert_eq!(normalize_group_label("none"), "none");
        assert_eq!(normalize_group_label("TEMPERATURES"), "TEMPERATURES");
    }

    #[test]
    fn test_groups_keep_feed_order() {
        let groups: OrderedMap<OrderedMap<FieldState>> = [
            (
                "Z_GROUP",
                [("B2", connected("2", "OK")), ("B1", connected("1", "OK"))]
                    .into_iter()
                    .map(owned)
                    .collect(),
            ),
            ("NONE", [("A", connected("0", "OK"))].into_iter().map(owned).collect()),
        ]
        .into_iter()
        .map(owned)
        .collect();
        let projected = StatusFeedProjector::default().project_groups(&groups);
        let labels: Vec<&str> = projected.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Z_GROUP", "OTHER"]);
        let blocks: Vec<&str> = projected[0].rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(blocks, vec!["B2", "B1"]);
    }

    #[test]
    fn test_blocks_are_never_suppressed() {
        let groups: OrderedMap<OrderedMap<FieldState>> =
            [("G", [("TITLE", connected("x", "OK"))].into_iter().map(owned).collect())]
                .into_iter()
                .map(owned)
                .collect();
        let projector = StatusFeedProjector::default();
        let rows = &projector.project_groups(&groups)[0].rows;
        assert_eq!(rows[0].kind, RowKind::Value);
    }

    #[test]
    fn test_instrument_fields_consume_display() {
        let fields: OrderedMap<FieldState> = [
            ("RUNSTATE", connected("RUNNING", "null")),
            ("DISPLAY", display("No")),
            ("_USERNAME", connected("Ada", "null")),
            ("SHUTTER", connected("OPEN", "MINOR, STATE")),
        ]
        .into_iter()
        .map(owned)
        .collect();
        let projected = StatusFeedProjector::default().project_instrument_fields(&fields);
        assert!(!projected.show_private);
        assert_eq!(
            projected.rows,
            vec![
                DisplayRow::value("Run Status", "RUNNING", None),
                DisplayRow::suppressed("User(s)"),
                DisplayRow::value("SHUTTER", "OPEN", Some("MINOR, STATE".to_string())),
            ]
        );
    }

    #[test]
    fn test_missing_display_shows_private() {
        let fields: OrderedMap<FieldState> = [("TITLE", connected("Public run", "null"))]
            .into_iter()
            .map(owned)
            .collect();
        let projected = StatusFeedProjector::default().project_instrument_fields(&fields);
        assert!(projected.show_private);
        assert_eq!(projected.rows[0].value.as_deref(), Some("Public run"));
    }

    #[test]
    fn test_custom_labels() {
        let projector =
            StatusFeedProjector::new(LabelTable::default().with_overrides([("TITLE", "Run Title")]));
        let fields: OrderedMap<FieldState> =
            [("TITLE", connected("T", "null"))].into_iter().map(owned).collect();
        let projected = projector.project_instrument_fields(&fields);
        assert_eq!(projected.rows[0].label, "Run Title");
    }

    #[test]
    fn test_dashboard_counts() {
        let snapshot = FeedSnapshot {
            config_name: "cfg".into(),
            groups: [(
                "G",
                [
                    ("A", connected("1", "MAJOR")),
                    ("B", connected("2", "OK")),
                    ("C", FieldState::disconnected()),
                ]
                .into_iter()
                .map(owned)
                .collect(),
            )]
            .into_iter()
            .map(owned)
            .collect(),
            instrument_fields: [
                ("DISPLAY", display("YES")),
                ("RUNSTATE", connected("SETUP", "MINOR")),
            ]
            .into_iter()
            .map(owned)
            .collect(),
        };
        let dashboard = StatusFeedProjector::default().project(&snapshot);
        assert_eq!(dashboard.config_name, "cfg");
        assert!(dashboard.show_private);
        assert_eq!(dashboard.row_count(), 4);
        assert_eq!(dashboard.alarm_count(), 2);
    }
}
