use crate::clock;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Name of the Point carrying the time-of-day angle.
pub const TIME_ATTRIBUTE: &str = "time";

/// Device usage log as read from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogDocument {
    pub device: String,
    #[serde(default)]
    pub capability: String,
    #[serde(default)]
    pub neighbors: Vec<Neighbor>,
    #[serde(default)]
    pub history: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub device: String,
    #[serde(default)]
    pub value: Vec<NeighborAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborAttribute {
    pub attribute: String,
}

/// One historical log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Date-time text or a Unix epoch number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    pub command: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrKind {
    Time,
    Numeric,
    Text,
}

impl fmt::Display for AttrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttrKind::Time => "time",
            AttrKind::Numeric => "numeric",
            AttrKind::Text => "text",
        };
        f.write_str(s)
    }
}

/// Attribute value, classified once at normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Time of day as an angle in `[0, 360)`.
    Time(f64),
    Numeric(f64),
    Text(String),
}

impl AttrValue {
    pub fn kind(&self) -> AttrKind {
        match self {
            AttrValue::Time(_) => AttrKind::Time,
            AttrValue::Numeric(_) => AttrKind::Numeric,
            AttrValue::Text(_) => AttrKind::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub name: String,
    pub value: AttrValue,
}

impl Point {
    pub fn new(name: impl Into<String>, value: AttrValue) -> Self {
        Self { name: name.into(), value }
    }
}

/// Normalized entries of one command, in log order.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandGroup {
    pub command: String,
    pub entries: Vec<Vec<Point>>,
}

/// Splits the history by command. Groups keep the order in which their
/// command first appears.
pub fn group_by_command(history: &[Event]) -> Vec<CommandGroup> {
    let mut groups: Vec<CommandGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for event in history {
        let slot = *index.entry(event.command.as_str()).or_insert_with(|| {
            groups.push(CommandGroup { command: event.command.clone(), entries: Vec::new() });
            groups.len() - 1
        });
        groups[slot].entries.push(normalize_event(event));
    }
    groups
}

/// Converts one Event into Points, time first, then attributes in
/// document order with list values split into `name:0`, `name:1`, ...
pub fn normalize_event(event: &Event) -> Vec<Point> {
    let mut points = Vec::with_capacity(event.attributes.len() + 1);
    if let Some(ts) = event.timestamp.as_ref() {
        match timestamp_angle(ts) {
            Some(angle) => points.push(Point::new(TIME_ATTRIBUTE, AttrValue::Time(angle))),
            None => warn!("dropping unparseable timestamp {ts} of command '{}'", event.command),
        }
    }
    for (name, value) in event.attributes.iter() {
        if name == TIME_ATTRIBUTE {
            push_clock_point(&mut points, value);
            continue;
        }
        match value {
            Value::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    push_scalar(&mut points, format!("{name}:{idx}"), item);
                }
            }
            _ => push_scalar(&mut points, name.clone(), value),
        }
    }
    points
}

fn timestamp_angle(ts: &Value) -> Option<f64> {
    match ts {
        Value::String(s) => clock::timestamp_to_angle(s),
        Value::Number(n) => n.as_i64().and_then(clock::epoch_to_time).map(clock::time_to_angle),
        _ => None,
    }
}

fn push_clock_point(points: &mut Vec<Point>, value: &Value) {
    if points.iter().any(|p| p.name == TIME_ATTRIBUTE) {
        debug!("ignoring 'time' field, a timestamp was already given");
        return;
    }
    match value.as_str().and_then(clock::parse_clock) {
        Some(c) => points.insert(0, Point::new(TIME_ATTRIBUTE, AttrValue::Time(c.to_angle()))),
        None => warn!("dropping unparseable time of day {value}"),
    }
}

fn push_scalar(points: &mut Vec<Point>, name: String, value: &Value) {
    match scalar_value(value) {
        Some(v) => points.push(Point::new(name, v)),
        None => debug!("attribute '{name}' holds no scalar value ({value}), skipped"),
    }
}

fn scalar_value(v: &Value) -> Option<AttrValue> {
    match v {
        Value::Number(n) => n.as_f64().map(AttrValue::Numeric),
        Value::String(s) => Some(AttrValue::Text(s.clone())),
        Value::Bool(b) => Some(AttrValue::Text(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
