use rulemine::config::MiningConfig;
use rulemine::engine::{self, GroupOutcome};
use rulemine::normalizer::LogDocument;
use rulemine::store;
use serde_json::json;

fn doc(v: serde_json::Value) -> LogDocument {
    serde_json::from_value(v).expect("doc")
}

fn switch_doc(history: serde_json::Value) -> LogDocument {
    doc(json!({
        "device": "my-device",
        "capability": "switch",
        "neighbors": [{"device": "my-sensor", "value": [{"attribute": "temperature"}]}],
        "history": history
    }))
}

#[test]
fn routine_time_becomes_a_daily_schedule() {
    let history: Vec<_> = ["17:55", "18:00", "18:00", "18:00", "18:05", "18:00"]
        .iter()
        .map(|t| json!({"timestamp": format!("2022-01-01T{t}:00.000Z"), "command": "on"}))
        .collect();
    let report = engine::mine_document(&switch_doc(json!(history)), &MiningConfig::default());
    assert_eq!(report.rule_count(), 1);
    let rule = report.rules().next().unwrap();
    assert_eq!(
        serde_json::to_value(rule).unwrap(),
        json!({"name": "my-device-on", "actions": [{"every": {
            "specific": {"time": {"hour": 18, "minute": 0}},
            "actions": [{"command": {"devices": ["my-device"], "commands": [{"capability": "switch", "command": "on"}]}}]
        }}]})
    );
}

#[test]
fn sensor_reading_becomes_a_condition() {
    let history: Vec<_> = [("17:55", 50), ("18:00", 50), ("18:00", 50), ("18:00", 47), ("18:05", 46), ("18:00", 45)]
        .iter()
        .map(|(t, v)| json!({"timestamp": format!("2022-01-01T{t}:00.000Z"), "command": "on", "my-sensor": [v]}))
        .collect();
    let report = engine::mine_document(&switch_doc(json!(history)), &MiningConfig::default());
    let on = report.command("on").unwrap();
    assert_eq!(on.outcome, GroupOutcome::Synthesized);
    assert_eq!(on.rules.len(), 1);
    assert_eq!(
        serde_json::to_value(&on.rules[0]).unwrap(),
        json!({"name": "my-device-my-sensor-on", "actions": [{"if": {
            "and": [
                {"between": {"value": {"time": {"reference": "Now"}},
                             "start": {"time": {"hour": 17, "minute": 55}},
                             "end": {"time": {"hour": 18, "minute": 5}}}},
                {"less_than": {"left": {"device": {"devices": ["my-sensor"], "attribute": "temperature"}},
                               "right": {"integer": 50}}}
            ],
            "then": [{"command": {"devices": ["my-device"], "commands": [{"capability": "switch", "command": "on"}]}}]
        }}]})
    );
}

#[test]
fn groups_report_why_no_rule_was_built() {
    let history = json!([
        {"time": "18:00", "command": "off"},
        {"time": "18:00", "command": "off"},
        {"time": "01:00", "command": "on"},
        {"time": "07:00", "command": "on"},
        {"time": "13:00", "command": "on"}
    ]);
    let report = engine::mine_document(&switch_doc(history), &MiningConfig::default());
    assert_eq!(report.rule_count(), 0);
    assert_eq!(report.command("off").unwrap().outcome, GroupOutcome::InsufficientHistory);
    assert_eq!(report.command("on").unwrap().outcome, GroupOutcome::NoRuleDetected);
    assert_eq!(report.commands[0].command, "off");
}

#[test]
fn unresolvable_cluster_is_reported_and_skipped() {
    let history = json!([
        {"time": "01:00", "command": "on", "ghost": ["x"]},
        {"time": "07:00", "command": "on", "ghost": ["x"]},
        {"time": "13:00", "command": "on", "ghost": ["x"]}
    ]);
    let report = engine::mine_document(&switch_doc(history), &MiningConfig::default());
    let on = report.command("on").unwrap();
    assert_eq!(on.outcome, GroupOutcome::Synthesized);
    assert!(on.rules.is_empty());
    assert_eq!(on.failures.len(), 1);
    assert_eq!(on.failures[0].support, 3);
    assert!(on.failures[0].error.contains("ghost"));
}

#[test]
fn rules_are_written_one_file_each() {
    let history: Vec<_> = ["07:00", "07:00", "07:00", "19:00", "19:00", "19:00"]
        .iter()
        .map(|t| json!({"time": t, "command": "on"}))
        .chain(std::iter::repeat(json!({"time": "23:00", "command": "off"})).take(3))
        .collect();
    let input = tempfile::tempdir().unwrap();
    let log_path = input.path().join("lamp.json");
    std::fs::write(&log_path, serde_json::to_string(&switch_doc(json!(history))).unwrap()).unwrap();

    let doc = store::read_log_file(&log_path).unwrap();
    let report = engine::mine_document(&doc, &MiningConfig::default());
    let out = tempfile::tempdir().unwrap();
    let dir = out.path().join("rules");
    let written = store::write_rules(&dir, "lamp", &report).unwrap();
    assert_eq!(written, vec!["lamp_on_rule.json", "lamp_on_rule_2.json", "lamp_off_rule.json"]);

    let text = std::fs::read_to_string(dir.join("lamp_off_rule.json")).unwrap();
    let rule: rulemine::rules::Rule = serde_json::from_str(&text).unwrap();
    assert_eq!(rule.name, "my-device-off");
}

#[test]
fn bad_log_files_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    assert!(matches!(store::read_log_file(&missing), Err(store::StoreError::Io { .. })));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{\"history\": [").unwrap();
    assert!(matches!(store::read_log_file(&broken), Err(store::StoreError::Json { .. })));
}

#[test]
fn file_names_number_extra_rules() {
    assert_eq!(store::rule_file_name("log", "on", 1), "log_on_rule.json");
    assert_eq!(store::rule_file_name("log", "on", 3), "log_on_rule_3.json");
}

#[test]
fn condition_window_can_span_midnight() {
    let history: Vec<_> = [
        "2022-01-01T23:55:00Z",
        "2022-01-02T23:55:00Z",
        "2022-01-03T00:00:00Z",
        "2022-01-04T00:00:00Z",
        "2022-01-05T00:05:00Z",
    ]
    .iter()
    .map(|ts| json!({"timestamp": ts, "command": "on", "door": ["open"]}))
    .collect();
    let log = doc(json!({
        "device": "my-device",
        "capability": "switch",
        "neighbors": [{"device": "door", "value": [{"attribute": "contact"}]}],
        "history": history
    }));
    let report = engine::mine_document(&log, &MiningConfig::default());
    assert_eq!(report.rule_count(), 1);
    assert_eq!(
        serde_json::to_value(report.rules().next().unwrap()).unwrap(),
        json!({"name": "my-device-door-on", "actions": [{"if": {
            "and": [
                {"between": {"value": {"time": {"reference": "Now"}},
                             "start": {"time": {"hour": 23, "minute": 55}},
                             "end": {"time": {"hour": 0, "minute": 5}}}},
                {"equals": {"left": {"device": {"devices": ["door"], "attribute": "contact"}},
                            "right": {"string": "open"}}}
            ],
            "then": [{"command": {"devices": ["my-device"], "commands": [{"capability": "switch", "command": "on"}]}}]
        }}]})
    );
}
