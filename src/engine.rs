use crate::clusterer::{self, Cluster};
use crate::config::MiningConfig;
use crate::normalizer::{self, CommandGroup, LogDocument, Point};
use crate::regions::{self, ClassificationConflict, DenseRegions};
use crate::representative::{self, AttributeSummary};
use crate::rules::{self, NeighborDirectory, Rule, RuleContext};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;

/// What happened to one command group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOutcome {
    /// Fewer events than `min_sup`; nothing was mined.
    InsufficientHistory,
    /// Mined, but no candidate reached `min_sup`.
    NoRuleDetected,
    /// At least one cluster was found. Rules may still be missing for
    /// clusters listed in `failures`.
    Synthesized,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub support: usize,
    pub attributes: Vec<AttributeSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterFailure {
    pub cluster: usize,
    pub support: usize,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub events: usize,
    pub outcome: GroupOutcome,
    pub rules: Vec<Rule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ClusterFailure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ClassificationConflict>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MiningReport {
    pub device: String,
    pub commands: Vec<CommandReport>,
}

impl MiningReport {
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.commands.iter().flat_map(|c| c.rules.iter())
    }

    pub fn rule_count(&self) -> usize {
        self.commands.iter().map(|c| c.rules.len()).sum()
    }

    pub fn command(&self, command: &str) -> Option<&CommandReport> {
        self.commands.iter().find(|c| c.command == command)
    }
}

/// Output of one mining pass over a command group, before rule synthesis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patterns {
    pub regions: DenseRegions,
    pub clusters: Vec<Cluster>,
    pub summaries: Vec<ClusterSummary>,
}

/// Dense regions, clusters and their representatives for the entries of
/// one command.
pub fn mine_patterns(entries: &[Vec<Point>], config: &MiningConfig) -> Patterns {
    let regions = regions::mine_regions(entries, config);
    let clusters = if regions.is_empty() {
        Vec::new()
    } else {
        clusterer::cluster_entries(entries, &regions, config)
    };
    let summaries = clusters
        .iter()
        .map(|c| ClusterSummary {
            support: c.support(),
            attributes: representative::extract(c, entries, &regions),
        })
        .collect();
    Patterns { regions, clusters, summaries }
}

/// Mines every command group of the document and synthesizes its rules.
/// Groups are independent and mined in parallel; the report keeps their
/// first-seen order.
pub fn mine_document(doc: &LogDocument, config: &MiningConfig) -> MiningReport {
    let neighbors = NeighborDirectory::new(&doc.neighbors);
    let groups = normalizer::group_by_command(&doc.history);
    info!(
        "device '{}': {} event(s) across {} command(s)",
        doc.device,
        doc.history.len(),
        groups.len()
    );
    let commands = groups
        .par_iter()
        .map(|group| {
            let ctx = RuleContext {
                device: &doc.device,
                capability: &doc.capability,
                command: &group.command,
                neighbors: &neighbors,
            };
            mine_group(group, &ctx, config)
        })
        .collect();
    MiningReport { device: doc.device.clone(), commands }
}

pub fn mine_group(group: &CommandGroup, ctx: &RuleContext<'_>, config: &MiningConfig) -> CommandReport {
    let mut report = CommandReport {
        command: group.command.clone(),
        events: group.entries.len(),
        outcome: GroupOutcome::InsufficientHistory,
        rules: Vec::new(),
        failures: Vec::new(),
        conflicts: Vec::new(),
    };
    if group.entries.len() < config.min_sup() {
        info!(
            "command '{}': {} event(s), below min_sup {}; no rule detected",
            group.command,
            group.entries.len(),
            config.min_sup()
        );
        return report;
    }

    let patterns = mine_patterns(&group.entries, config);
    report.conflicts = patterns.regions.conflicts().to_vec();
    if patterns.summaries.is_empty() {
        info!("command '{}': no rule detected", group.command);
        report.outcome = GroupOutcome::NoRuleDetected;
        return report;
    }

    report.outcome = GroupOutcome::Synthesized;
    for (i, summary) in patterns.summaries.iter().enumerate() {
        match rules::synthesize(ctx, &summary.attributes) {
            Ok(rule) => {
                debug!("command '{}': cluster {} (support {}) -> rule '{}'", group.command, i, summary.support, rule.name);
                report.rules.push(rule);
            }
            Err(e) => {
                warn!("command '{}': cluster {} skipped: {}", group.command, i, e);
                report.failures.push(ClusterFailure { cluster: i, support: summary.support, error: e.to_string() });
            }
        }
    }
    info!("command '{}': {} rule(s) from {} cluster(s)", group.command, report.rules.len(), patterns.summaries.len());
    report
}
