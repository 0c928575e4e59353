use crate::clock::DAY_ANGLE;
use crate::config::MiningConfig;
use crate::normalizer::{AttrKind, AttrValue, Point};
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;

/// A dense run of time or numeric values.
///
/// Values are ascending, except for a time span that wraps past midnight:
/// it holds the late values followed by the early ones, so `first() > last()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Span {
    values: Vec<f64>,
}

impl Span {
    /// `values` must be non-empty.
    fn from_run(values: Vec<f64>) -> Self {
        debug_assert!(!values.is_empty());
        Self { values }
    }

    pub fn values(&self) -> &[f64] { &self.values }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn first(&self) -> f64 { self.values[0] }

    pub fn last(&self) -> f64 { self.values[self.values.len() - 1] }

    pub fn wraps(&self) -> bool { self.first() > self.last() }

    pub fn contains(&self, v: f64) -> bool {
        if self.wraps() {
            v <= self.last() || v >= self.first()
        } else {
            self.first() <= v && v <= self.last()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "regions", rename_all = "snake_case")]
pub enum RegionSet {
    /// Non-wrapping spans ascending, a wrapping span (if any) last.
    Time(Vec<Span>),
    Numeric(Vec<Span>),
    Text(Vec<String>),
}

impl RegionSet {
    pub fn kind(&self) -> AttrKind {
        match self {
            RegionSet::Time(_) => AttrKind::Time,
            RegionSet::Numeric(_) => AttrKind::Numeric,
            RegionSet::Text(_) => AttrKind::Text,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RegionSet::Time(s) | RegionSet::Numeric(s) => s.len(),
            RegionSet::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeRegions {
    pub attribute: String,
    pub regions: RegionSet,
}

/// Points of an attribute whose kind disagrees with the kind the attribute
/// was classified as (its first-seen value). They are left out of mining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationConflict {
    pub attribute: String,
    pub expected: AttrKind,
    pub found: AttrKind,
    pub count: usize,
}

/// Dense regions of one command group, per attribute in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DenseRegions {
    attributes: Vec<AttributeRegions>,
    conflicts: Vec<ClassificationConflict>,
}

impl DenseRegions {
    pub fn get(&self, attribute: &str) -> Option<&RegionSet> {
        self.attributes.iter().find(|a| a.attribute == attribute).map(|a| &a.regions)
    }

    pub fn attributes(&self) -> &[AttributeRegions] { &self.attributes }

    pub fn conflicts(&self) -> &[ClassificationConflict] { &self.conflicts }

    /// True when no attribute has a single dense region.
    pub fn is_empty(&self) -> bool {
        self.attributes.iter().all(|a| a.regions.is_empty())
    }
}

struct Observed<'a> {
    name: &'a str,
    kind: AttrKind,
    values: Vec<&'a AttrValue>,
    conflicts: Vec<(AttrKind, usize)>,
}

pub fn mine_regions(entries: &[Vec<Point>], config: &MiningConfig) -> DenseRegions {
    let mut observed: Vec<Observed> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for point in entries.iter().flatten() {
        let kind = point.value.kind();
        let slot = *index.entry(point.name.as_str()).or_insert_with(|| {
            observed.push(Observed { name: &point.name, kind, values: Vec::new(), conflicts: Vec::new() });
            observed.len() - 1
        });
        let obs = &mut observed[slot];
        if obs.kind == kind {
            obs.values.push(&point.value);
        } else if let Some(c) = obs.conflicts.iter_mut().find(|(k, _)| *k == kind) {
            c.1 += 1;
        } else {
            obs.conflicts.push((kind, 1));
        }
    }

    let mut out = DenseRegions::default();
    for obs in observed {
        for (found, count) in obs.conflicts {
            warn!(
                "attribute '{}' is {} but {} value(s) are {}; skipping them",
                obs.name, obs.kind, count, found
            );
            out.conflicts.push(ClassificationConflict {
                attribute: obs.name.to_string(),
                expected: obs.kind,
                found,
                count,
            });
        }
        let regions = match obs.kind {
            AttrKind::Time => {
                let angles: Vec<f64> = obs.values.iter().filter_map(|v| as_number(v)).collect();
                RegionSet::Time(time_regions(&angles, config.time_err(), config.min_sup()))
            }
            AttrKind::Numeric => {
                let nums: Vec<f64> = obs.values.iter().filter_map(|v| as_number(v)).collect();
                RegionSet::Numeric(numeric_regions(&nums, config.num_err(), config.min_sup()))
            }
            AttrKind::Text => {
                let texts: Vec<&str> = obs
                    .values
                    .iter()
                    .filter_map(|v| match v {
                        AttrValue::Text(s) => Some(s.as_str()),
                        _ => None,
                    })
                    .collect();
                RegionSet::Text(text_regions(&texts, config.min_sup()))
            }
        };
        debug!("attribute '{}' ({}): {} dense region(s)", obs.name, obs.kind, regions.len());
        out.attributes.push(AttributeRegions { attribute: obs.name.to_string(), regions });
    }
    out
}

fn as_number(v: &AttrValue) -> Option<f64> {
    match v {
        AttrValue::Time(x) | AttrValue::Numeric(x) => Some(*x),
        AttrValue::Text(_) => None,
    }
}

/// Splits ascending values into maximal runs where every value is within
/// `tolerance` of its predecessor.
fn chain_runs(sorted: &[f64], tolerance: f64) -> Vec<Vec<f64>> {
    let mut runs = Vec::new();
    let mut current: Vec<f64> = Vec::new();
    for &v in sorted {
        if let Some(&prev) = current.last() {
            if v - prev > tolerance {
                runs.push(std::mem::take(&mut current));
            }
        }
        current.push(v);
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut s = values.to_vec();
    s.sort_by(f64::total_cmp);
    s
}

/// Dense time regions over angles in `[0, 360)`. A run ending near midnight
/// and one starting just after it are joined into a single wrapping span.
pub fn time_regions(angles: &[f64], time_err: f64, min_sup: usize) -> Vec<Span> {
    let mut runs = chain_runs(&sorted(angles), time_err);

    let wraps = runs.len() > 1
        && match (runs.first(), runs.last()) {
            (Some(early), Some(late)) => late[late.len() - 1] + time_err >= DAY_ANGLE + early[0],
            _ => false,
        };
    let mut wrapped = None;
    if wraps {
        let early = runs.remove(0);
        if let Some(mut late) = runs.pop() {
            late.extend(early);
            wrapped = Some(late);
        }
    }

    let mut spans: Vec<Span> = runs
        .into_iter()
        .filter(|r| r.len() >= min_sup)
        .map(Span::from_run)
        .collect();
    if let Some(w) = wrapped.filter(|w| w.len() >= min_sup) {
        spans.push(Span::from_run(w));
    }
    spans
}

pub fn numeric_regions(values: &[f64], num_err: f64, min_sup: usize) -> Vec<Span> {
    chain_runs(&sorted(values), num_err)
        .into_iter()
        .filter(|r| r.len() >= min_sup)
        .map(Span::from_run)
        .collect()
}

/// Every distinct value seen at least `min_sup` times, in first-seen order.
pub fn text_regions(values: &[&str], min_sup: usize) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for v in values {
        match counts.iter_mut().find(|(s, _)| s == v) {
            Some(c) => c.1 += 1,
            None => counts.push((*v, 1)),
        }
    }
    counts
        .into_iter()
        .filter(|(_, c)| *c >= min_sup)
        .map(|(s, _)| s.to_string())
        .collect()
}
