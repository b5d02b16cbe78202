use dataweb_core::model::FeedSnapshot;
use dataweb_core::projector::{DisplayRow, GroupRows, RowKind, StatusFeedProjector};
use dataweb_core::render::{escape_html, render_fragment};

const SCENARIO: &str = r#"{
    "config_name": "Demo",
    "groups": {
        "NONE": {
            "WEST": {"status": "Connected", "value": "-1.000", "alarm": "OK, OK"}
        }
    },
    "inst_pvs": {
        "DISPLAY": {"status": "Connected", "value": "No", "alarm": "null"},
        "TITLE": {"status": "Connected", "value": "Secret", "alarm": "null"}
    }
}"#;

#[test]
fn test_scenario_projection() {
    let snapshot = FeedSnapshot::from_json(SCENARIO).unwrap();
    let dashboard = StatusFeedProjector::default().project(&snapshot);

    assert_eq!(
        dashboard.groups,
        vec![GroupRows {
            label: "OTHER".into(),
            rows: vec![DisplayRow::value("WEST", "-1.000", None)],
        }]
    );
    assert_eq!(dashboard.inst_pvs, vec![DisplayRow::suppressed("Title")]);
    assert!(!dashboard.show_private);
}

#[test]
fn test_scenario_html_never_leaks_private_value() {
    let snapshot = FeedSnapshot::from_json(SCENARIO).unwrap();
    let dashboard = StatusFeedProjector::default().project(&snapshot);
    let html = render_fragment(&dashboard, "DEMO");
    assert!(!html.contains("Secret"));
    assert!(html.contains("Unavailable"));
    assert!(!html.contains("DISPLAY"));
}

#[test]
fn test_every_field_maps_to_one_row() {
    let feed = r#"{
        "config_name": "Full",
        "groups": {
            "MOTORS": {
                "M1": {"status": "Connected", "value": "1", "alarm": "MINOR, LINK_ALARM"},
                "M2": {"status": "Disconnected", "value": "2", "alarm": "MAJOR"}
            },
            "NONE": {
                "LOOSE": {"status": "Connected", "value": "x", "alarm": "null"}
            }
        },
        "inst_pvs": {
            "RUNSTATE": {"status": "Connected", "value": "RUNNING", "alarm": "null"},
            "_USERNAME": {"status": "Disconnected", "value": "null", "alarm": "null"},
            "DISPLAY": {"status": "Connected", "value": "NO", "alarm": "null"},
            "TITLE": {"status": "Connected", "value": "Hidden", "alarm": "MAJOR"}
        }
    }"#;
    let snapshot = FeedSnapshot::from_json(feed).unwrap();
    let dashboard = StatusFeedProjector::default().project(&snapshot);

    // DISPLAY is consumed, everything else yields exactly one row.
    assert_eq!(dashboard.row_count(), snapshot.field_count() - 1);

    let kinds: Vec<RowKind> = dashboard.inst_pvs.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![RowKind::Value, RowKind::Disconnected, RowKind::Suppressed]
    );
    let motors = &dashboard.groups[0];
    assert_eq!(motors.rows[0].alarm.as_deref(), Some("MINOR, LINK_ALARM"));
    assert_eq!(motors.rows[1], DisplayRow::disconnected("M2"));
    assert_eq!(dashboard.groups[1].label, "OTHER");
}

#[test]
fn test_block_names_are_escaped_in_html() {
    let feed = r#"{
        "config_name": "x",
        "groups": {"G": {"<script>": {"status": "Connected", "value": "1", "alarm": "OK"}}},
        "inst_pvs": {}
    }"#;
    let snapshot = FeedSnapshot::from_json(feed).unwrap();
    let html = render_fragment(&StatusFeedProjector::default().project(&snapshot), "DEMO");
    assert!(html.contains(&escape_html("<script>")));
    assert!(!html.contains("<script>"));
}
