use crate::clock::ClockTime;
use crate::normalizer::Neighbor;
use crate::representative::{AttributeSummary, Representative};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::iter;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("attribute '{attribute}' refers to unknown neighbor device '{device}'")]
    UnknownNeighbor { attribute: String, device: String },
    #[error("neighbor device '{device}' declares no attribute at index {index}")]
    UnknownAttribute { device: String, index: usize },
    #[error("cluster has no attributes to build a rule from")]
    EmptyCluster,
}

/// A rule document: `{"name": ..., "actions": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Every(EveryAction),
    If(IfAction),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EveryAction {
    pub specific: Specific,
    pub actions: Vec<ThenAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specific {
    pub time: ClockTime,
}

/// `{"<operator>": {...}, "then": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfAction {
    #[serde(flatten)]
    pub condition: Condition,
    pub then: Vec<ThenAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    And(Vec<Condition>),
    Between(Between),
    GreaterThan(Comparison),
    LessThan(Comparison),
    Equals(Comparison),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Between {
    pub value: Operand,
    pub start: Operand,
    pub end: Operand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub left: Operand,
    pub right: Operand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Time(TimeOperand),
    Device(DeviceOperand),
    Integer(i64),
    Decimal(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeOperand {
    Reference { reference: TimeReference },
    Clock(ClockTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeReference {
    Now,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceOperand {
    pub devices: Vec<String>,
    pub attribute: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThenAction {
    Command(DeviceCommand),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCommand {
    pub devices: Vec<String>,
    pub commands: Vec<CapabilityCommand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityCommand {
    pub capability: String,
    pub command: String,
}

/// Declared attribute names of each neighbor device, by device id.
#[derive(Debug, Clone, Default)]
pub struct NeighborDirectory {
    devices: HashMap<String, Vec<String>>,
}

impl NeighborDirectory {
    pub fn new(neighbors: &[Neighbor]) -> Self {
        let devices = neighbors
            .iter()
            .map(|n| (n.device.clone(), n.value.iter().map(|v| v.attribute.clone()).collect()))
            .collect();
        Self { devices }
    }

    /// Maps a mined attribute such as `my-sensor:1` to the neighbor device
    /// and the name of its declared attribute at that index. A name without
    /// an index refers to the first declared attribute.
    pub fn resolve<'a, 's>(&'s self, attribute: &'a str) -> Result<(&'a str, &'s str), SynthesisError> {
        let (device, index) = split_attribute(attribute);
        let declared = self.devices.get(device).ok_or_else(|| SynthesisError::UnknownNeighbor {
            attribute: attribute.to_string(),
            device: device.to_string(),
        })?;
        let name = declared.get(index).ok_or_else(|| SynthesisError::UnknownAttribute {
            device: device.to_string(),
            index,
        })?;
        Ok((device, name.as_str()))
    }
}

/// `dev:3` -> (`dev`, 3); anything without a numeric suffix -> (name, 0).
pub fn split_attribute(name: &str) -> (&str, usize) {
    if let Some(pos) = name.rfind(':') {
        let suffix = &name[pos + 1..];
        if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(index) = suffix.parse::<usize>() {
                return (&name[..pos], index);
            }
        }
    }
    (name, 0)
}

/// Identity of the rule being built for one cluster.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub device: &'a str,
    pub capability: &'a str,
    pub command: &'a str,
    pub neighbors: &'a NeighborDirectory,
}

/// Device, referenced neighbors (first occurrence each) and command, joined by `-`.
pub fn construct_name(device: &str, neighbors: &[&str], command: &str) -> String {
    iter::once(device)
        .chain(neighbors.iter().copied().unique())
        .chain(iter::once(command))
        .join("-")
}

pub fn then_payload(device: &str, capability: &str, command: &str) -> Vec<ThenAction> {
    vec![ThenAction::Command(DeviceCommand {
        devices: vec![device.to_string()],
        commands: vec![CapabilityCommand { capability: capability.to_string(), command: command.to_string() }],
    })]
}

pub fn every_action(at: ClockTime, then: Vec<ThenAction>) -> Action {
    Action::Every(EveryAction { specific: Specific { time: at }, actions: then })
}

/// Now within `[start, end]`.
pub fn time_operation(start: ClockTime, end: ClockTime) -> Condition {
    Condition::Between(Between {
        value: Operand::Time(TimeOperand::Reference { reference: TimeReference::Now }),
        start: Operand::Time(TimeOperand::Clock(start)),
        end: Operand::Time(TimeOperand::Clock(end)),
    })
}

/// Keeps the bulk of the observations on the true side: values mostly sit
/// above the mode when the mode is not above the mean.
pub fn numeric_operation(device: &str, attribute: &str, mode: f64, mean: f64) -> Condition {
    let cmp = Comparison { left: device_operand(device, attribute), right: number_operand(mode) };
    if mode <= mean {
        Condition::GreaterThan(cmp)
    } else {
        Condition::LessThan(cmp)
    }
}

pub fn text_operation(device: &str, attribute: &str, value: &str) -> Condition {
    Condition::Equals(Comparison {
        left: device_operand(device, attribute),
        right: Operand::String(value.to_string()),
    })
}

fn device_operand(device: &str, attribute: &str) -> Operand {
    Operand::Device(DeviceOperand { devices: vec![device.to_string()], attribute: attribute.to_string() })
}

fn number_operand(v: f64) -> Operand {
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Operand::Integer(v as i64)
    } else {
        Operand::Decimal(v)
    }
}

/// Compiles one cluster's representatives into a rule. A cluster made of a
/// single time attribute becomes a daily schedule; anything else becomes a
/// conditional over all of its attributes.
pub fn synthesize(ctx: &RuleContext<'_>, summaries: &[AttributeSummary]) -> Result<Rule, SynthesisError> {
    if summaries.is_empty() {
        return Err(SynthesisError::EmptyCluster);
    }
    let then = then_payload(ctx.device, ctx.capability, ctx.command);
    let mut referenced: Vec<&str> = Vec::new();
    let action = match summaries {
        [AttributeSummary { representative: Representative::Time { mode, .. }, .. }] => every_action(*mode, then),
        _ => {
            let mut ops = Vec::with_capacity(summaries.len());
            for summary in summaries {
                ops.push(condition_for(summary, ctx.neighbors, &mut referenced)?);
            }
            let condition = if ops.len() == 1 { ops.remove(0) } else { Condition::And(ops) };
            Action::If(IfAction { condition, then })
        }
    };
    Ok(Rule { name: construct_name(ctx.device, &referenced, ctx.command), actions: vec![action] })
}

fn condition_for<'a>(
    summary: &'a AttributeSummary,
    neighbors: &NeighborDirectory,
    referenced: &mut Vec<&'a str>,
) -> Result<Condition, SynthesisError> {
    match &summary.representative {
        Representative::Time { start, end, .. } => Ok(time_operation(*start, *end)),
        Representative::Numeric { mode, mean } => {
            let (device, attribute) = neighbors.resolve(&summary.attribute)?;
            referenced.push(device);
            Ok(numeric_operation(device, attribute, *mode, *mean))
        }
        Representative::Text { value } => {
            let (device, attribute) = neighbors.resolve(&summary.attribute)?;
            referenced.push(device);
            Ok(text_operation(device, attribute, value))
        }
    }
}
