use rulemine::normalizer::{self, AttrValue, Event, LogDocument, Point};
use serde_json::json;

fn event(v: serde_json::Value) -> Event {
    serde_json::from_value(v).expect("event")
}

#[test]
fn splits_history_by_command_in_first_seen_order() {
    let history: Vec<Event> = vec![
        event(json!({"time": "12:00", "command": "on"})),
        event(json!({"time": "12:00", "command": "off"})),
        event(json!({"time": "12:00", "command": "on"})),
        event(json!({"time": "12:00", "command": "off"})),
        event(json!({"time": "12:00", "command": "on"})),
        event(json!({"time": "12:00", "command": "off"})),
    ];
    let groups = normalizer::group_by_command(&history);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].command, "on");
    assert_eq!(groups[1].command, "off");
    assert_eq!(groups[0].entries.len(), 3);
    assert_eq!(groups[1].entries.len(), 3);
    assert_eq!(groups[0].entries[0], vec![Point::new("time", AttrValue::Time(180.0))]);
}

#[test]
fn list_values_become_indexed_sub_attributes() {
    let e = event(json!({
        "timestamp": "2022-01-01T01:00:00.000Z",
        "command": "on",
        "sensor": [50, "active"],
        "switch": "on"
    }));
    let points = normalizer::normalize_event(&e);
    assert_eq!(
        points,
        vec![
            Point::new("time", AttrValue::Time(15.0)),
            Point::new("sensor:0", AttrValue::Numeric(50.0)),
            Point::new("sensor:1", AttrValue::Text("active".into())),
            Point::new("switch", AttrValue::Text("on".into())),
        ]
    );
}

#[test]
fn time_point_comes_first_even_when_written_last() {
    let e = event(json!({"command": "on", "my-sensor": [70], "time": "18:00"}));
    let points = normalizer::normalize_event(&e);
    assert_eq!(points[0], Point::new("time", AttrValue::Time(270.0)));
    assert_eq!(points[1], Point::new("my-sensor:0", AttrValue::Numeric(70.0)));
}

#[test]
fn attribute_order_follows_the_document() {
    let e = event(json!({"command": "on", "zeta": 1, "alpha": 2, "mid": "x"}));
    let names: Vec<String> = normalizer::normalize_event(&e).into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn unusable_values_are_dropped_not_fatal() {
    let e = event(json!({
        "timestamp": "2022-01-01T17:77:00.000Z",
        "command": "on",
        "gone": null,
        "nested": {"a": 1},
        "flag": true,
        "list": [1, null, [2]]
    }));
    let points = normalizer::normalize_event(&e);
    assert_eq!(
        points,
        vec![
            Point::new("flag", AttrValue::Text("true".into())),
            Point::new("list:0", AttrValue::Numeric(1.0)),
        ]
    );
}

#[test]
fn reads_a_full_log_document() {
    let doc: LogDocument = serde_json::from_value(json!({
        "device": "my-device",
        "capability": "switch",
        "neighbors": [{"device": "my-sensor", "value": [{"attribute": "motion"}]}],
        "history": [{"timestamp": "2022-01-01T18:00:00.000Z", "command": "on", "my-sensor": ["active"]}]
    }))
    .expect("doc");
    assert_eq!(doc.device, "my-device");
    assert_eq!(doc.capability, "switch");
    assert_eq!(doc.neighbors[0].value[0].attribute, "motion");
    assert_eq!(doc.history[0].command, "on");
    assert_eq!(doc.history[0].timestamp, Some(json!("2022-01-01T18:00:00.000Z")));
}

#[test]
fn numeric_timestamps_are_epochs_and_others_are_dropped() {
    let history: Vec<Event> = serde_json::from_value(json!([
        {"timestamp": 1641060000, "command": "on", "lamp": "on"},
        {"timestamp": 1641060000000u64, "command": "on"},
        {"timestamp": 12.5, "command": "on", "lamp": "on"},
        {"timestamp": {"at": "18:00"}, "command": "on", "lamp": "off"}
    ]))
    .expect("history");
    let points: Vec<Vec<Point>> = history.iter().map(normalizer::normalize_event).collect();
    assert_eq!(points[0][0], Point::new("time", AttrValue::Time(270.0)));
    assert_eq!(points[1], vec![Point::new("time", AttrValue::Time(270.0))]);
    assert_eq!(points[2], vec![Point::new("lamp", AttrValue::Text("on".into()))]);
    assert_eq!(points[3], vec![Point::new("lamp", AttrValue::Text("off".into()))]);
}
