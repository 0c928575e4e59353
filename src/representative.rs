use crate::clock::{self, ClockTime, DAY_ANGLE};
use crate::clusterer::Cluster;
use crate::normalizer::{AttrValue, Point};
use crate::regions::{DenseRegions, RegionSet};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Representative {
    /// Most frequent time and the bounds of the matched region.
    Time { mode: ClockTime, start: ClockTime, end: ClockTime },
    Numeric { mode: f64, mean: f64 },
    Text { value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeSummary {
    pub attribute: String,
    #[serde(flatten)]
    pub representative: Representative,
}

/// One representative per matched attribute of `cluster`, in match order.
/// Attributes whose values cannot be recovered from `entries` are skipped.
pub fn extract(cluster: &Cluster, entries: &[Vec<Point>], regions: &DenseRegions) -> Vec<AttributeSummary> {
    let mut out = Vec::with_capacity(cluster.matches.len());
    for m in &cluster.matches {
        let values: Vec<&AttrValue> = cluster
            .members
            .iter()
            .filter_map(|&i| entries.get(i))
            .filter_map(|points| points.iter().find(|p| p.name == m.attribute))
            .map(|p| &p.value)
            .collect();
        let representative = match regions.get(&m.attribute) {
            Some(RegionSet::Time(spans)) => spans.get(m.region).and_then(|span| {
                let angles = numbers(&values);
                let origin = span.wraps().then(|| span.first());
                mode_nearest_mean(&angles, origin).map(|mode| Representative::Time {
                    mode: clock::angle_to_time(mode),
                    start: clock::angle_to_time(span.first()),
                    end: clock::angle_to_time(span.last()),
                })
            }),
            Some(RegionSet::Numeric(spans)) => {
                // mode over the cluster's values, mean over the whole region
                let nums = numbers(&values);
                let region_mean = spans.get(m.region).and_then(|s| mean(s.values()));
                match (mode_nearest_mean(&nums, None), region_mean) {
                    (Some(mode), Some(mean)) => Some(Representative::Numeric { mode, mean }),
                    _ => None,
                }
            }
            Some(RegionSet::Text(texts)) => texts
                .get(m.region)
                .map(|value| Representative::Text { value: value.clone() }),
            None => None,
        };
        if let Some(representative) = representative {
            out.push(AttributeSummary { attribute: m.attribute.clone(), representative });
        }
    }
    out
}

fn numbers(values: &[&AttrValue]) -> Vec<f64> {
    values
        .iter()
        .filter_map(|v| match v {
            AttrValue::Time(x) | AttrValue::Numeric(x) => Some(*x),
            AttrValue::Text(_) => None,
        })
        .collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Most frequent value. A tie goes to the tied value nearest the mean of the
/// tied values, and an exact distance tie to the larger of the two.
///
/// With `circular_origin` set, values are angles measured from that origin
/// (`(v - origin) mod 360`) while comparing, and the winner is mapped back.
/// This keeps a region spanning midnight contiguous.
pub fn mode_nearest_mean(values: &[f64], circular_origin: Option<f64>) -> Option<f64> {
    let mut shifted: Vec<f64> = match circular_origin {
        Some(origin) => values.iter().map(|v| (v - origin).rem_euclid(DAY_ANGLE)).collect(),
        None => values.to_vec(),
    };
    shifted.sort_by(f64::total_cmp);

    let mut counts: Vec<(f64, usize)> = Vec::new();
    for v in shifted {
        if let Some((last, n)) = counts.last_mut() {
            if *last == v {
                *n += 1;
                continue;
            }
        }
        counts.push((v, 1));
    }
    let top = counts.iter().map(|(_, n)| *n).max()?;
    let tied: Vec<f64> = counts.iter().filter(|(_, n)| *n == top).map(|(v, _)| *v).collect();
    let centre = mean(&tied)?;

    let mut best = tied[0];
    for &v in &tied[1..] {
        if (v - centre).abs() <= (best - centre).abs() {
            best = v;
        }
    }
    Some(match circular_origin {
        Some(origin) => clock::normalize_angle(best + origin),
        None => best,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_mode_wins_without_tie() {
        assert_eq!(mode_nearest_mean(&[1.0, 2.0, 2.0, 9.0], None), Some(2.0));
    }

    #[test]
    fn tie_prefers_value_nearest_the_mean() {
        assert_eq!(mode_nearest_mean(&[48.0, 48.0, 49.0, 49.0, 50.0, 51.0], None), Some(49.0));
        assert_eq!(mode_nearest_mean(&[10.0, 20.0, 21.0, 40.0], None), Some(21.0));
    }

    #[test]
    fn tie_across_midnight_is_judged_from_the_origin() {
        // 23:55 x2, 00:00 x2, 00:05
        let angles = [358.75, 358.75, 0.0, 0.0, 1.25];
        assert_eq!(mode_nearest_mean(&angles, Some(358.75)), Some(0.0));
    }

    #[test]
    fn empty_values_have_no_mode() {
        assert_eq!(mode_nearest_mean(&[], None), None);
        assert_eq!(mean(&[]), None);
    }
}
