use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One unlock-rule record from the authored rule table.
///
/// `requires_all` and `requires_any` are the AND/OR precondition lists
/// evaluated against the reached-state set; the remaining string fields
/// are informational and never evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnlockRule {
    pub node: String,
    pub requires_all: Vec<String>,
    pub requires_any: Vec<String>,
    pub starting_character: String,
    pub starting_scene: String,
    pub rules: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RuleTableFile {
    unlock_parts: Vec<UnlockRule>,
}

/// Where the loaded rules actually came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTableSource {
    File,
    /// The table file was absent; the engine starts degraded with the
    /// open-world default (every node unlocked).
    Missing,
}

#[derive(Debug, Clone)]
pub struct LoadedRuleTable {
    pub rules: Vec<UnlockRule>,
    pub source: RuleTableSource,
}

/// Loads the unlock-rule table from `path`.
///
/// A missing file degrades to an empty table (`RuleTableSource::Missing`)
/// rather than failing; a present-but-unparseable file is an authoring
/// error and is surfaced with context.
pub fn load_rule_table(path: &Path) -> Result<LoadedRuleTable> {
    if !path.exists() {
        return Ok(LoadedRuleTable {
            rules: Vec::new(),
            source: RuleTableSource::Missing,
        });
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read rule table: {}", path.display()))?;
    let file: RuleTableFile = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse rule table json: {}", path.display()))?;

    Ok(LoadedRuleTable {
        rules: file.unlock_parts,
        source: RuleTableSource::File,
    })
}
