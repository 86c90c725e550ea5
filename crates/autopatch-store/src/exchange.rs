//! Moving registry records between workspaces as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use autopatch_core::CommitRecord;

use crate::registry::CommitRegistry;
use crate::StoreError;

pub const EXPORT_FILE: &str = "autopatch-export.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedCommit {
    #[serde(flatten)]
    pub record: CommitRecord,
    /// Artifact contents, so an import can recreate the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_content: Option<String>,
}

pub fn export_commits(
    registry: &CommitRegistry,
    records: &[&CommitRecord],
    path: &Path,
) -> Result<usize, StoreError> {
    let mut exported = Vec::with_capacity(records.len());
    for record in records {
        let patch_content = match registry.artifact_path(record) {
            Some(p) if p.exists() => Some(std::fs::read_to_string(p)?),
            _ => None,
        };
        exported.push(ExportedCommit {
            record: (*record).clone(),
            patch_content,
        });
    }
    std::fs::write(path, serde_json::to_string_pretty(&exported)?)?;
    Ok(exported.len())
}

/// Merge exported records into the registry. Keys already present are
/// skipped. Group orders and artifact names that clash with local records
/// are moved aside; missing artifacts are written into the patch directory.
pub fn import_commits(registry: &mut CommitRegistry, path: &Path) -> Result<usize, StoreError> {
    let content = std::fs::read_to_string(path)?;
    let mut exported: Vec<ExportedCommit> = serde_json::from_str(&content)?;
    // Renumbering appends to the group, so members go in by their order.
    exported.sort_by_key(|item| (item.record.group, item.record.order));

    let mut imported = 0;
    for item in exported {
        let key = item.record.key.clone();
        let Some(patch) = registry.push_imported(item.record)? else {
            tracing::warn!(key = %key, "skipping import of existing key");
            continue;
        };
        if let (false, Some(content)) = (patch.is_empty(), item.patch_content) {
            let target = registry.patch_path(&patch);
            if !target.exists() {
                std::fs::create_dir_all(registry.patch_dir())?;
                std::fs::write(target, content)?;
            }
        }
        imported += 1;
    }
    Ok(imported)
}
