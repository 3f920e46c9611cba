//! Input and output synchronization for one task session.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashSet;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use asset_sync_filesystem::{
    collect_output_files, hash_file, join_relative, set_mtime_us, FileHash, FileStat, ScannedFile,
};
use asset_sync_model::{
    decode_manifest_bytes, merge_manifests, merge_overlays, HashAlgorithm, Manifest, PathEntry,
};
use asset_sync_storage::{
    data_key, discover_step_output_manifests, manifest_key, DataSource, FetchedObject,
    ManifestObjectMetadata, OutputManifestKey, OutputManifestPath, ProgressCallback,
    StorageClient, StoreSettings, TransferManager, UploadOutcome, MANIFEST_CONTENT_TYPE,
};

use crate::error::SyncError;
use crate::mount::{
    host_supports_virtual_fs, ExecutableMountHelper, MountError, MountHelper, MountRequest,
};
use crate::options::SyncOptions;
use crate::paths::{build_rule, DestinationResolver, ResolvedRoot};
use crate::progress::{FileProgress, ProgressReporter, ProgressTracker, SummaryStatistics};
use crate::telemetry::{SummarySink, SyncDirection, TracingSummarySink};
use crate::types::{Attachments, FileSystemMode, ManifestProperties, PathMappingRule};

/// Parameters of [`AssetSync::sync_inputs`].
#[derive(Debug, Clone, Copy)]
pub struct InputSyncRequest<'r> {
    pub settings: &'r StoreSettings,
    pub attachments: &'r Attachments,
    pub queue_id: &'r str,
    pub job_id: &'r str,
    /// Directory generated roots are created under.
    pub session_dir: &'r Path,
    /// Steps whose latest outputs are merged into the inputs, in priority order.
    pub step_dependencies: &'r [String],
    /// Storage-profile mapping from submitted root path to local path.
    pub storage_profile_overrides: Option<&'r HashMap<String, String>>,
}

impl<'r> InputSyncRequest<'r> {
    pub fn new(
        settings: &'r StoreSettings,
        attachments: &'r Attachments,
        queue_id: &'r str,
        job_id: &'r str,
        session_dir: &'r Path,
    ) -> Self {
        Self {
            settings,
            attachments,
            queue_id,
            job_id,
            session_dir,
            step_dependencies: &[],
            storage_profile_overrides: None,
        }
    }

    pub fn with_step_dependencies(mut self, step_dependencies: &'r [String]) -> Self {
        self.step_dependencies = step_dependencies;
        self
    }

    pub fn with_storage_profile_overrides(mut self, overrides: &'r HashMap<String, String>) -> Self {
        self.storage_profile_overrides = Some(overrides);
        self
    }
}

/// Parameters of [`AssetSync::sync_outputs`].
#[derive(Debug, Clone, Copy)]
pub struct OutputSyncRequest<'r> {
    pub settings: &'r StoreSettings,
    pub attachments: &'r Attachments,
    pub queue_id: &'r str,
    pub job_id: &'r str,
    pub step_id: &'r str,
    pub task_id: &'r str,
    pub session_action_id: &'r str,
    /// When the session action started; part of the output manifest key.
    pub start_time: DateTime<Utc>,
    pub session_dir: &'r Path,
    pub storage_profile_overrides: Option<&'r HashMap<String, String>>,
    /// Manifests of what each root held before the task ran, by root path.
    /// Files whose path, size and mtime match reuse the recorded hash.
    pub baseline_manifests: Option<&'r HashMap<String, Manifest>>,
}

impl<'r> OutputSyncRequest<'r> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: &'r StoreSettings,
        attachments: &'r Attachments,
        queue_id: &'r str,
        job_id: &'r str,
        step_id: &'r str,
        task_id: &'r str,
        session_action_id: &'r str,
        start_time: DateTime<Utc>,
        session_dir: &'r Path,
    ) -> Self {
        Self {
            settings,
            attachments,
            queue_id,
            job_id,
            step_id,
            task_id,
            session_action_id,
            start_time,
            session_dir,
            storage_profile_overrides: None,
            baseline_manifests: None,
        }
    }

    pub fn with_storage_profile_overrides(mut self, overrides: &'r HashMap<String, String>) -> Self {
        self.storage_profile_overrides = Some(overrides);
        self
    }

    pub fn with_baseline_manifests(mut self, baselines: &'r HashMap<String, Manifest>) -> Self {
        self.baseline_manifests = Some(baselines);
        self
    }
}

/// Dependency outputs recorded against one submitted root.
struct DependencyRoot {
    asset_root: String,
    location_name: Option<String>,
    overlays: Vec<(Manifest, String)>,
}

/// A root whose merged manifest must be materialized locally.
struct InputPlan {
    label: String,
    destination: PathBuf,
    manifest: Manifest,
}

/// A root whose outputs were hashed and await upload.
struct OutputRoot<'p> {
    props: &'p ManifestProperties,
    hash_alg: HashAlgorithm,
    files: Vec<(ScannedFile, FileHash)>,
}

/// Synchronizes job attachments between a worker session and the store.
///
/// Collaborators are passed in explicitly; nothing is shared process-wide.
pub struct AssetSync<C: StorageClient + ?Sized> {
    farm_id: String,
    client: Arc<C>,
    mount_helper: Arc<dyn MountHelper>,
    summary_sink: Arc<dyn SummarySink>,
    options: SyncOptions,
}

impl<C: StorageClient + ?Sized> AssetSync<C> {
    /// Create an asset sync for a farm.
    ///
    /// Uses the mount helper named by `DEADLINE_VFS_PATH` and logs summaries
    /// through `tracing`.
    pub fn new(farm_id: impl Into<String>, client: Arc<C>) -> Self {
        Self {
            farm_id: farm_id.into(),
            client,
            mount_helper: Arc::new(ExecutableMountHelper::from_env()),
            summary_sink: Arc::new(TracingSummarySink),
            options: SyncOptions::default(),
        }
    }

    pub fn with_mount_helper(mut self, mount_helper: Arc<dyn MountHelper>) -> Self {
        self.mount_helper = mount_helper;
        self
    }

    pub fn with_summary_sink(mut self, summary_sink: Arc<dyn SummarySink>) -> Self {
        self.summary_sink = summary_sink;
        self
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn farm_id(&self) -> &str {
        &self.farm_id
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    fn transfer(&self, settings: &StoreSettings) -> TransferManager<'_, C> {
        TransferManager::with_retry_settings(
            self.client.as_ref(),
            settings.clone(),
            self.options.retry.clone(),
        )
    }

    /// Materialize a task's inputs in the session directory.
    ///
    /// For each root: resolve its local directory, fetch and verify its input
    /// manifest, merge the latest outputs of the dependency steps that target
    /// it, then mount or download the result.
    ///
    /// # Arguments
    /// * `request` - Job identity, attachments and session directory
    /// * `reporter` - Optional progress reporter; returning false cancels
    ///
    /// # Returns
    /// Download statistics and one path mapping rule per generated attachment root.
    ///
    /// # Errors
    /// Returns `SyncError` if a manifest cannot be fetched or decoded, a
    /// transfer fails, or the reporter cancels.
    pub async fn sync_inputs(
        &self,
        request: &InputSyncRequest<'_>,
        reporter: Option<&dyn ProgressReporter>,
    ) -> Result<(SummaryStatistics, Vec<PathMappingRule>), SyncError> {
        let tracker: ProgressTracker = ProgressTracker::for_download();
        let transfer: TransferManager<'_, C> = self.transfer(request.settings);

        if request.attachments.manifests.is_empty() && request.step_dependencies.is_empty() {
            debug!("Job {} has no attachments", request.job_id);
            let summary: SummaryStatistics = tracker.summary();
            self.summary_sink.record(SyncDirection::Inputs, &summary);
            return Ok((summary, Vec::new()));
        }

        let mut resolver: DestinationResolver = DestinationResolver::new(
            request.session_dir,
            request.storage_profile_overrides.cloned().unwrap_or_default(),
        );
        let mut rules: Vec<PathMappingRule> = Vec::new();
        let mut plans: Vec<InputPlan> = Vec::new();

        // 1. Collect the latest outputs of each dependency step
        let mut dependency_roots: Vec<DependencyRoot> = self
            .collect_dependency_outputs(
                &transfer,
                request.queue_id,
                request.job_id,
                request.step_dependencies,
            )
            .await?;

        // 2. Resolve each root and build its merged manifest
        for props in &request.attachments.manifests {
            let resolved: ResolvedRoot = resolver.resolve(props);
            if resolved.needs_rule() {
                push_rule(
                    &mut rules,
                    build_rule(props.root_path_format, &props.root_path, resolved.path()),
                );
                create_dir(resolved.path()).await?;
            }

            let base: Option<Manifest> = self.fetch_input_manifest(&transfer, props).await?;
            let overlays: Vec<(Manifest, String)> =
                match dependency_roots.iter().position(|d| d.asset_root == props.root_path) {
                    Some(index) => dependency_roots.remove(index).overlays,
                    None => Vec::new(),
                };

            let merged: Option<Manifest> = match base {
                Some(base) => Some(merge_manifests(&base, &overlays)?),
                None => merge_overlays(&overlays)?,
            };
            if let Some(manifest) = merged {
                plans.push(InputPlan {
                    label: props.root_path.clone(),
                    destination: resolved.path().to_path_buf(),
                    manifest,
                });
            }
        }

        // 3. Dependency outputs for roots this job does not declare; these
        //    are materialized but get no path mapping rule
        for dependency in dependency_roots {
            let resolved: ResolvedRoot =
                resolver.resolve_root(&dependency.asset_root, dependency.location_name.as_deref());
            if resolved.needs_rule() {
                create_dir(resolved.path()).await?;
            }
            if let Some(manifest) = merge_overlays(&dependency.overlays)? {
                plans.push(InputPlan {
                    label: dependency.asset_root,
                    destination: resolved.path().to_path_buf(),
                    manifest,
                });
            }
        }

        // 4. Mount where requested and possible, download the rest
        let to_download: Vec<InputPlan> = if request.attachments.file_system
            == FileSystemMode::Virtual
            && host_supports_virtual_fs()
        {
            self.mount_plans(plans, request.settings, request.session_dir).await?
        } else {
            plans
        };

        self.download_plans(&transfer, &to_download, &tracker, reporter)
            .await?;

        if let Some(r) = reporter {
            r.on_report(&tracker.final_report());
        }
        let summary: SummaryStatistics = tracker.summary();
        self.summary_sink.record(SyncDirection::Inputs, &summary);
        Ok((summary, rules))
    }

    /// Fetch, verify and decode a root's input manifest, if it has one.
    async fn fetch_input_manifest(
        &self,
        transfer: &TransferManager<'_, C>,
        props: &ManifestProperties,
    ) -> Result<Option<Manifest>, SyncError> {
        let Some(manifest_path) = &props.input_manifest_path else {
            return Ok(None);
        };
        let key: String = manifest_key(transfer.settings(), manifest_path);
        let data: Vec<u8> = transfer.fetch(&key).await?;
        let manifest: Manifest = decode_manifest_bytes(&data)?;

        if let Some(expected) = &props.input_manifest_hash {
            let actual: String = manifest.hash_alg().hash_bytes(&data);
            if actual != *expected {
                return Err(SyncError::ManifestHashMismatch {
                    key,
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        Ok(Some(manifest))
    }

    /// Fetch the latest output manifests of each dependency step, grouped by
    /// the root recorded in their metadata.
    ///
    /// Overlays are ordered by step, then chronologically within a step.
    async fn collect_dependency_outputs(
        &self,
        transfer: &TransferManager<'_, C>,
        queue_id: &str,
        job_id: &str,
        step_ids: &[String],
    ) -> Result<Vec<DependencyRoot>, SyncError> {
        let mut roots: Vec<DependencyRoot> = Vec::new();

        for step_id in step_ids {
            let keys: Vec<OutputManifestKey> =
                discover_step_output_manifests(transfer, &self.farm_id, queue_id, job_id, step_id)
                    .await?;
            let fetched: Vec<(OutputManifestKey, FetchedObject)> = stream::iter(keys)
                .map(|k| async move {
                    let object: FetchedObject = transfer.fetch_with_metadata(&k.key).await?;
                    Ok::<_, SyncError>((k, object))
                })
                .buffered(self.options.concurrency())
                .try_collect()
                .await?;

            for (k, object) in fetched {
                let Some(metadata) = ManifestObjectMetadata::from_map(&object.metadata) else {
                    warn!("Output manifest {} has no asset root metadata, ignoring", k.key);
                    continue;
                };
                let manifest: Manifest = decode_manifest_bytes(&object.data)?;
                let label: String = format!("{}/{}/{}", step_id, k.task_id, k.session_action_id);

                match roots.iter_mut().find(|r| r.asset_root == metadata.asset_root) {
                    Some(root) => root.overlays.push((manifest, label)),
                    None => roots.push(DependencyRoot {
                        asset_root: metadata.asset_root,
                        location_name: metadata.file_system_location_name,
                        overlays: vec![(manifest, label)],
                    }),
                }
            }
        }

        Ok(roots)
    }

    /// Mount each plan's manifest; returns the plans that must be downloaded.
    async fn mount_plans(
        &self,
        plans: Vec<InputPlan>,
        settings: &StoreSettings,
        session_dir: &Path,
    ) -> Result<Vec<InputPlan>, SyncError> {
        if let Err(e) = self.mount_helper.locate() {
            info!("Virtual file system unavailable ({}), downloading inputs", e);
            return Ok(plans);
        }

        let mut remaining: Vec<InputPlan> = Vec::new();
        for plan in plans {
            let manifest_path: PathBuf = write_temp_manifest(&plan.manifest, session_dir).await?;
            let request: MountRequest = MountRequest {
                manifest_path,
                mount_point: plan.destination.clone(),
                bucket: settings.s3_bucket_name.clone(),
                cas_prefix: settings.full_cas_prefix(),
            };
            match self.mount_helper.mount(&request).await {
                Ok(handle) => debug!("Mounted {} at {}", plan.label, handle.mount_point.display()),
                Err(MountError::HelperMissing { searched }) => {
                    info!("Mount helper missing ({}), downloading {}", searched, plan.label);
                    remove_temp_manifest(&request.manifest_path).await;
                    remaining.push(plan);
                }
                Err(e) => {
                    remove_temp_manifest(&request.manifest_path).await;
                    return Err(e.into());
                }
            }
        }
        Ok(remaining)
    }

    /// Download every manifest entry not already present locally.
    async fn download_plans(
        &self,
        transfer: &TransferManager<'_, C>,
        plans: &[InputPlan],
        tracker: &ProgressTracker,
        reporter: Option<&dyn ProgressReporter>,
    ) -> Result<(), SyncError> {
        let work: Vec<(&Path, &PathEntry)> = plans
            .iter()
            .flat_map(|p| {
                let root: &Path = p.destination.as_path();
                p.manifest.paths().iter().map(move |e| (root, e))
            })
            .collect();
        tracker.add_expected(
            work.len() as u64,
            work.iter().map(|(_, e)| e.size).sum(),
        );

        stream::iter(work)
            .map(|(root, entry)| async move {
                let destination: PathBuf = join_relative(root, &entry.path)?;

                let local: Option<FileStat> = FileStat::read(&destination)?;
                if local.is_some_and(|s| s.size == entry.size && s.mtime_us == entry.mtime) {
                    tracker.record_skipped(entry.size);
                } else {
                    let key: String = data_key(transfer.settings(), &entry.hash);
                    let progress: FileProgress<'_> = FileProgress::new(tracker, reporter);
                    transfer
                        .download(&key, &destination, Some(&progress as &dyn ProgressCallback))
                        .await?;
                    set_mtime_us(&destination, entry.mtime)?;
                    tracker.record_processed(entry.size, progress.streamed());
                }

                if tracker.report(reporter) {
                    Ok(())
                } else {
                    Err(SyncError::Cancelled)
                }
            })
            .buffer_unordered(self.options.concurrency())
            .try_collect::<Vec<()>>()
            .await?;
        Ok(())
    }

    /// Upload a task's outputs and publish one manifest per root.
    ///
    /// Every file under each root's output directories is hashed. Content
    /// already in the store, or already claimed by another file in this run,
    /// is skipped; the rest is uploaded. Manifests are only published after
    /// all content uploads succeeded.
    ///
    /// # Arguments
    /// * `request` - Task identity, attachments and session directory
    /// * `reporter` - Optional progress reporter; returning false cancels
    ///
    /// # Errors
    /// Returns `SyncError` if hashing or a transfer fails, or the reporter cancels.
    pub async fn sync_outputs(
        &self,
        request: &OutputSyncRequest<'_>,
        reporter: Option<&dyn ProgressReporter>,
    ) -> Result<SummaryStatistics, SyncError> {
        let tracker: ProgressTracker = ProgressTracker::for_upload();
        let transfer: TransferManager<'_, C> = self.transfer(request.settings);
        let mut resolver: DestinationResolver = DestinationResolver::new(
            request.session_dir,
            request.storage_profile_overrides.cloned().unwrap_or_default(),
        );

        // 1. Hash the outputs of every root
        let mut roots: Vec<OutputRoot<'_>> = Vec::new();
        for props in &request.attachments.manifests {
            let output_dirs: &[String] = match &props.output_relative_directories {
                Some(dirs) if !dirs.is_empty() => dirs,
                _ => continue,
            };
            let resolved: ResolvedRoot = resolver.resolve(props);
            let baseline: Option<&Manifest> = request
                .baseline_manifests
                .and_then(|b| b.get(&props.root_path));
            let hash_alg: HashAlgorithm = baseline
                .map(Manifest::hash_alg)
                .unwrap_or(self.options.hash_algorithm);

            let files: Vec<(ScannedFile, FileHash)> = self
                .hash_outputs(resolved.path(), output_dirs, hash_alg, baseline)
                .await?;
            if files.is_empty() {
                debug!("No outputs under {}", resolved.path().display());
                continue;
            }
            tracker.add_expected(
                files.len() as u64,
                files.iter().map(|(_, h)| h.size).sum(),
            );
            roots.push(OutputRoot {
                props,
                hash_alg,
                files,
            });
        }

        // 2. Upload content not already in the store
        let claims: DashSet<String> = DashSet::new();
        let uploads: Vec<(&ScannedFile, &FileHash)> = roots
            .iter()
            .flat_map(|r| r.files.iter().map(|(f, h)| (f, h)))
            .collect();
        let (transfer_ref, tracker_ref, claims_ref) = (&transfer, &tracker, &claims);
        stream::iter(uploads)
            .map(|(file, hash)| async move {
                let key: String = data_key(transfer_ref.settings(), &hash.hash);
                if !claims_ref.insert(key.clone()) {
                    debug!("{} shares content with another output", file.relative_path);
                    tracker_ref.record_skipped(hash.size);
                } else {
                    let progress: FileProgress<'_> = FileProgress::new(tracker_ref, reporter);
                    let outcome: UploadOutcome = transfer_ref
                        .upload(
                            &key,
                            &DataSource::File(file.full_path.clone()),
                            Some(&progress as &dyn ProgressCallback),
                        )
                        .await?;
                    match outcome {
                        UploadOutcome::Uploaded => {
                            tracker_ref.record_processed(hash.size, progress.streamed())
                        }
                        UploadOutcome::Skipped => tracker_ref.record_skipped(hash.size),
                    }
                }

                if tracker_ref.report(reporter) {
                    Ok(())
                } else {
                    Err(SyncError::Cancelled)
                }
            })
            .buffer_unordered(self.options.concurrency())
            .try_collect::<Vec<()>>()
            .await?;

        // 3. Publish the output manifest of each root
        let manifest_path: OutputManifestPath = OutputManifestPath {
            farm_id: self.farm_id.clone(),
            queue_id: request.queue_id.to_string(),
            job_id: request.job_id.to_string(),
            step_id: request.step_id.to_string(),
            task_id: request.task_id.to_string(),
            session_action_id: request.session_action_id.to_string(),
            timestamp: request.start_time,
        };
        for root in &roots {
            let entries: Vec<PathEntry> = root
                .files
                .iter()
                .map(|(f, h)| {
                    PathEntry::new(f.relative_path.clone(), h.hash.clone(), h.size, h.mtime_us)
                })
                .collect();
            let manifest: Manifest = Manifest::with_algorithm(root.hash_alg, entries);
            let encoded: String = manifest.encode()?;
            let manifest_hash: String = root.hash_alg.hash_bytes(encoded.as_bytes());
            let key: String = manifest_path.key(request.settings, &manifest_hash, root.hash_alg);

            let metadata: ManifestObjectMetadata = ManifestObjectMetadata {
                asset_root: root.props.root_path.clone(),
                root_path_format: Some(root.props.root_path_format.as_str().to_string()),
                file_system_location_name: root.props.file_system_location_name.clone(),
            };
            transfer
                .put_bytes(
                    &key,
                    encoded.as_bytes(),
                    Some(MANIFEST_CONTENT_TYPE),
                    &metadata.to_map(),
                )
                .await?;
            info!("Published output manifest {} ({} files)", key, manifest.file_count());
        }

        if let Some(r) = reporter {
            r.on_report(&tracker.final_report());
        }
        let summary: SummaryStatistics = tracker.summary();
        self.summary_sink.record(SyncDirection::Outputs, &summary);
        Ok(summary)
    }

    /// Walk and hash a root's output directories on blocking workers.
    async fn hash_outputs(
        &self,
        root: &Path,
        output_dirs: &[String],
        hash_alg: HashAlgorithm,
        baseline: Option<&Manifest>,
    ) -> Result<Vec<(ScannedFile, FileHash)>, SyncError> {
        let walk_root: PathBuf = root.to_path_buf();
        let walk_dirs: Vec<String> = output_dirs.to_vec();
        let files: Vec<ScannedFile> =
            tokio::task::spawn_blocking(move || collect_output_files(&walk_root, &walk_dirs))
                .await
                .map_err(|e| SyncError::Worker(e.to_string()))??;

        let known_entries: HashMap<&str, &PathEntry> = index_by_path(baseline);
        let known_entries: &HashMap<&str, &PathEntry> = &known_entries;

        stream::iter(files)
            .map(|file| async move {
                let stat: Option<FileStat> = FileStat::read(&file.full_path)?;
                let known: Option<&PathEntry> =
                    known_entries.get(file.relative_path.as_str()).copied();
                if let (Some(stat), Some(entry)) = (stat, known) {
                    if stat.size == entry.size && stat.mtime_us == entry.mtime {
                        let hash: FileHash = FileHash {
                            hash: entry.hash.clone(),
                            size: stat.size,
                            mtime_us: stat.mtime_us,
                        };
                        return Ok((file, hash));
                    }
                }

                let path: PathBuf = file.full_path.clone();
                let hash: FileHash = tokio::task::spawn_blocking(move || hash_file(&path, hash_alg))
                    .await
                    .map_err(|e| SyncError::Worker(e.to_string()))??;
                Ok::<_, SyncError>((file, hash))
            })
            .buffer_unordered(self.options.concurrency())
            .try_collect()
            .await
    }
}

/// Baseline entries keyed by relative path.
fn index_by_path(baseline: Option<&Manifest>) -> HashMap<&str, &PathEntry> {
    baseline
        .map(|b| b.paths().iter().map(|e| (e.path.as_str(), e)).collect())
        .unwrap_or_default()
}

fn push_rule(rules: &mut Vec<PathMappingRule>, rule: PathMappingRule) {
    if !rules.contains(&rule) {
        rules.push(rule);
    }
}

async fn create_dir(path: &Path) -> Result<(), SyncError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| SyncError::io(path.display().to_string(), e))
}

/// Encode a manifest into a file the mount helper reads after this call returns.
///
/// The file lives in the session directory for as long as the mount does and
/// is removed with it; a failed mount removes it right away.
async fn write_temp_manifest(manifest: &Manifest, session_dir: &Path) -> Result<PathBuf, SyncError> {
    let encoded: String = manifest.encode()?;
    let dir: PathBuf = session_dir.to_path_buf();
    tokio::task::spawn_blocking(move || persist_manifest(&dir, encoded.as_bytes()))
        .await
        .map_err(|e| SyncError::Worker(e.to_string()))?
}

fn persist_manifest(dir: &Path, encoded: &[u8]) -> Result<PathBuf, SyncError> {
    let mut file: tempfile::NamedTempFile = tempfile::Builder::new()
        .prefix("manifest-")
        .suffix(".json")
        .tempfile_in(dir)
        .map_err(|e| SyncError::io(dir.display().to_string(), e))?;
    file.write_all(encoded)
        .map_err(|e| SyncError::io(file.path().display().to_string(), e))?;
    let (_, path) = file
        .keep()
        .map_err(|e| SyncError::io(dir.display().to_string(), e.error))?;
    Ok(path)
}

async fn remove_temp_manifest(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Failed to remove {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_index_by_path() {
        let baseline: Manifest = Manifest::new(vec![
            PathEntry::new("out/a.txt", "h1", 1, 10),
            PathEntry::new("out/b.txt", "h2", 2, 20),
        ]);
        let index: HashMap<&str, &PathEntry> = index_by_path(Some(&baseline));

        assert_eq!(index.len(), 2);
        assert_eq!(index["out/b.txt"].hash, "h2");
        assert!(index_by_path(None).is_empty());
    }

    #[tokio::test]
    async fn test_temp_manifest_written_and_removed() {
        let session: TempDir = TempDir::new().unwrap();
        let manifest: Manifest = Manifest::new(vec![PathEntry::new("a.txt", "h1", 1, 1)]);

        let path: PathBuf = write_temp_manifest(&manifest, session.path()).await.unwrap();
        assert_eq!(path.parent().unwrap(), session.path());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            manifest.encode().unwrap()
        );

        remove_temp_manifest(&path).await;
        assert!(!path.exists());
    }
}
