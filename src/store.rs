use crate::engine::MiningReport;
use crate::normalizer::LogDocument;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid log document {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
    #[error("json encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

pub fn parse_log_document(s: &str) -> Result<LogDocument, serde_json::Error> {
    serde_json::from_str(s)
}

pub fn read_log_file(path: &Path) -> Result<LogDocument, StoreError> {
    let text = fs::read_to_string(path).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
    parse_log_document(&text).map_err(|source| StoreError::Json { path: path.to_path_buf(), source })
}

/// `<stem>_<command>_rule.json` for a command's first rule,
/// `<stem>_<command>_rule_<n>.json` for the n-th one after that.
pub fn rule_file_name(stem: &str, command: &str, ordinal: usize) -> String {
    if ordinal <= 1 {
        format!("{stem}_{command}_rule.json")
    } else {
        format!("{stem}_{command}_rule_{ordinal}.json")
    }
}

/// Writes every rule of the report under `dir` and returns the file names
/// in the order they were written.
pub fn write_rules(dir: &Path, stem: &str, report: &MiningReport) -> Result<Vec<String>, StoreError> {
    fs::create_dir_all(dir).map_err(|source| StoreError::Io { path: dir.to_path_buf(), source })?;
    let mut written = Vec::new();
    for cmd in &report.commands {
        for (i, rule) in cmd.rules.iter().enumerate() {
            let name = rule_file_name(stem, &cmd.command, i + 1);
            let path = dir.join(&name);
            let body = serde_json::to_string_pretty(rule)?;
            fs::write(&path, body).map_err(|source| StoreError::Io { path: path.clone(), source })?;
            written.push(name);
        }
    }
    Ok(written)
}
