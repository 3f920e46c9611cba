//! Discovery of output manifests written by earlier task runs.

use std::collections::HashMap;

use tracing::debug;

use crate::error::TransferError;
use crate::keys::step_output_prefix;
use crate::traits::{ObjectInfo, StorageClient};
use crate::transfer::TransferManager;

/// An output manifest key broken into its layout components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputManifestKey {
    /// Full object key.
    pub key: String,
    pub task_id: String,
    pub session_action_id: String,
    /// ISO-8601 timestamp from the key; sorts chronologically as a string.
    pub timestamp: String,
}

/// Parse a key listed under a step's output prefix.
///
/// Expected shape after the prefix:
/// `<task>/<sessionAction>_<isoTimestamp>/<manifestHash>_output[.<hashAlg>]`.
///
/// # Returns
/// None for keys that are not output manifests.
pub fn parse_output_manifest_key(step_prefix: &str, key: &str) -> Option<OutputManifestKey> {
    let rest: &str = key.strip_prefix(step_prefix)?;
    let mut parts = rest.split('/');
    let task_id: &str = parts.next()?;
    let session_dir: &str = parts.next()?;
    let file_name: &str = parts.next()?;
    if parts.next().is_some() || task_id.is_empty() {
        return None;
    }

    let stem: &str = match file_name.split_once('.') {
        Some((stem, _extension)) => stem,
        None => file_name,
    };
    let manifest_hash: &str = stem.strip_suffix("_output")?;
    if manifest_hash.is_empty() {
        return None;
    }

    let (session_action_id, timestamp) = session_dir.rsplit_once('_')?;
    if session_action_id.is_empty() || timestamp.is_empty() {
        return None;
    }

    Some(OutputManifestKey {
        key: key.to_string(),
        task_id: task_id.to_string(),
        session_action_id: session_action_id.to_string(),
        timestamp: timestamp.to_string(),
    })
}

/// Keep only the manifests of each task's most recent session action.
///
/// A session action writes one manifest per asset root, so several keys may
/// survive per task. The result is ordered chronologically, then by task.
pub fn select_latest_per_task(keys: Vec<OutputManifestKey>) -> Vec<OutputManifestKey> {
    let mut latest: HashMap<String, (String, String)> = HashMap::new();
    for k in &keys {
        let candidate: (String, String) = (k.timestamp.clone(), k.session_action_id.clone());
        match latest.get(&k.task_id) {
            Some(current) if *current >= candidate => {}
            _ => {
                latest.insert(k.task_id.clone(), candidate);
            }
        }
    }

    let mut selected: Vec<OutputManifestKey> = keys
        .into_iter()
        .filter(|k| {
            latest
                .get(&k.task_id)
                .is_some_and(|(ts, sa)| *ts == k.timestamp && *sa == k.session_action_id)
        })
        .collect();
    selected.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.task_id.cmp(&b.task_id))
            .then_with(|| a.key.cmp(&b.key))
    });
    selected
}

/// List the latest output manifests of every task in a step.
///
/// # Errors
/// Returns `TransferError` if listing fails after retries.
pub async fn discover_step_output_manifests<C: StorageClient + ?Sized>(
    transfer: &TransferManager<'_, C>,
    farm_id: &str,
    queue_id: &str,
    job_id: &str,
    step_id: &str,
) -> Result<Vec<OutputManifestKey>, TransferError> {
    let prefix: String = step_output_prefix(transfer.settings(), farm_id, queue_id, job_id, step_id);
    let objects: Vec<ObjectInfo> = transfer.list(&prefix).await?;

    let parsed: Vec<OutputManifestKey> = objects
        .iter()
        .filter_map(|o| parse_output_manifest_key(&prefix, &o.key))
        .collect();
    debug!(
        "Found {} output manifests under {} ({} objects listed)",
        parsed.len(),
        prefix,
        objects.len()
    );

    Ok(select_latest_per_task(parsed))
}
