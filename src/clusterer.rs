use crate::config::MiningConfig;
use crate::normalizer::{AttrValue, Point};
use crate::regions::{DenseRegions, RegionSet, Span};
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

/// An attribute matched to one of its dense regions, by index into the
/// attribute's region list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RegionMatch {
    pub attribute: String,
    pub region: usize,
}

/// Region matches of one entry, in the entry's attribute order.
pub type Candidate = Vec<RegionMatch>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub matches: Candidate,
    /// Indices of the contributing entries.
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn support(&self) -> usize { self.members.len() }
}

/// Forms one candidate per entry and keeps those seen at least `min_sup`
/// times. Clusters come out in the order their candidate first appeared.
pub fn cluster_entries(entries: &[Vec<Point>], regions: &DenseRegions, config: &MiningConfig) -> Vec<Cluster> {
    let mut order: Vec<Candidate> = Vec::new();
    let mut members: HashMap<Candidate, Vec<usize>> = HashMap::new();
    for (i, points) in entries.iter().enumerate() {
        let candidate = form_candidate(points, regions);
        if candidate.is_empty() {
            continue;
        }
        match members.get_mut(&candidate) {
            Some(m) => m.push(i),
            None => {
                order.push(candidate.clone());
                members.insert(candidate, vec![i]);
            }
        }
    }

    let mut clusters = Vec::new();
    for candidate in order {
        let Some(m) = members.remove(&candidate) else { continue };
        if m.len() >= config.min_sup() {
            clusters.push(Cluster { matches: candidate, members: m });
        } else {
            debug!("candidate with {} attribute(s) has support {}, dropped", candidate.len(), m.len());
        }
    }
    clusters
}

pub fn form_candidate(points: &[Point], regions: &DenseRegions) -> Candidate {
    let mut out = Vec::new();
    for p in points {
        let Some(set) = regions.get(&p.name) else { continue };
        let hit = match (set, &p.value) {
            (RegionSet::Time(spans), AttrValue::Time(a)) => locate_time(spans, *a),
            (RegionSet::Numeric(spans), AttrValue::Numeric(v)) => locate_span(spans, *v),
            (RegionSet::Text(values), AttrValue::Text(s)) => values.iter().position(|v| v == s),
            // classification conflict, already reported by the miner
            _ => None,
        };
        if let Some(region) = hit {
            out.push(RegionMatch { attribute: p.name.clone(), region });
        }
    }
    out
}

/// Finds the time span holding `angle`. A wrapping span can only be the
/// last one and is tested on its own.
pub fn locate_time(spans: &[Span], angle: f64) -> Option<usize> {
    match spans.split_last() {
        Some((last, rest)) if last.wraps() => {
            if last.contains(angle) {
                Some(rest.len())
            } else {
                locate_span(rest, angle)
            }
        }
        _ => locate_span(spans, angle),
    }
}

/// Binary search over ascending, non-overlapping spans.
pub fn locate_span(spans: &[Span], value: f64) -> Option<usize> {
    let mut lo = 0usize;
    let mut hi = spans.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let span = &spans[mid];
        if value < span.first() {
            hi = mid;
        } else if value > span.last() {
            lo = mid + 1;
        } else {
            return Some(mid);
        }
    }
    None
}
