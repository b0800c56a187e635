//! Reconciliation of the external folder hierarchy against the local store.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

use super::node::FolderRecord;
use super::store::FolderStore;
use crate::access::{resolve_metadata, AccessMetadata};
use crate::config::GroupConfig;
use crate::error::{DocGateError, DocGateResult};
use crate::source::{ExternalFolder, ExternalSource};

/// Counts reported by one sync run. Partial when branches were skipped.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub total_scanned: usize,
    /// Branches whose listing failed and were skipped this run.
    pub skipped_branches: usize,
}

impl SyncReport {
    fn merge(&mut self, other: SyncReport) {
        self.added += other.added;
        self.updated += other.updated;
        self.removed += other.removed;
        self.total_scanned += other.total_scanned;
        self.skipped_branches += other.skipped_branches;
    }
}

/// A candidate node from the fresh external listing, with metadata already
/// resolved along the candidate parent chain.
struct Candidate {
    folder: ExternalFolder,
    resolved: AccessMetadata,
    /// External id of the parent, `None` when the parent is the group root.
    parent_external_id: Option<String>,
}

/// Reconciles externally fetched folder trees against the persisted store.
///
/// Admin-triggered and infrequent. Re-runnable: a second run against an
/// unchanged external tree adds and removes nothing. Syncs of the same group
/// serialize on a per-group lock; different groups may run concurrently.
pub struct FolderSyncEngine {
    store: FolderStore,
    source: Arc<dyn ExternalSource>,
    groups: Vec<GroupConfig>,
    group_locks: std::sync::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl FolderSyncEngine {
    pub fn new(store: FolderStore, source: Arc<dyn ExternalSource>, groups: Vec<GroupConfig>) -> Self {
        Self {
            store,
            source,
            groups,
            group_locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn groups(&self) -> &[GroupConfig] {
        &self.groups
    }

    /// Sync every configured group, sequentially, merging the reports.
    pub async fn sync_all(&self) -> DocGateResult<SyncReport> {
        let mut report = SyncReport::default();
        for group in &self.groups {
            report.merge(self.sync_group(group).await?);
        }
        Ok(report)
    }

    /// Sync one group by id.
    pub async fn sync_group_id(&self, group_id: &str) -> DocGateResult<SyncReport> {
        let group = self
            .groups
            .iter()
            .find(|g| g.group_id == group_id)
            .ok_or_else(|| DocGateError::NotFound(format!("unknown group '{}'", group_id)))?
            .clone();
        self.sync_group(&group).await
    }

    async fn sync_group(&self, group: &GroupConfig) -> DocGateResult<SyncReport> {
        let lock = self.lock_for(&group.group_id);
        let _guard = lock.lock().await;

        log::info!(
            "Starting sync for group '{}' (root {})",
            group.group_id,
            group.root_external_id
        );

        let (candidates, skipped_branches) = self.walk_group(group).await;
        let mut report = self.reconcile(group, &candidates, skipped_branches)?;
        report.skipped_branches = skipped_branches;

        log::info!(
            "Sync for group '{}' done: {} scanned, {} added, {} updated, {} removed, {} branches skipped",
            group.group_id,
            report.total_scanned,
            report.added,
            report.updated,
            report.removed,
            report.skipped_branches
        );
        Ok(report)
    }

    /// Breadth-first walk of the external hierarchy, resolving inherited
    /// metadata along the candidate parent chain. A failed branch listing is
    /// logged and skipped; the walk continues elsewhere. The explicit queue
    /// keeps arbitrary depth off the call stack.
    async fn walk_group(&self, group: &GroupConfig) -> (Vec<Candidate>, usize) {
        let mut candidates = Vec::new();
        let mut skipped_branches = 0usize;

        // (external id to list, its resolved metadata, whether it is the root)
        let mut queue: VecDeque<(String, AccessMetadata, bool)> = VecDeque::new();
        queue.push_back((
            group.root_external_id.clone(),
            AccessMetadata::default(),
            true,
        ));

        while let Some((parent_external_id, parent_resolved, is_root)) = queue.pop_front() {
            let children = match self.source.list_child_folders(&parent_external_id).await {
                Ok(children) => children,
                Err(e) => {
                    log::warn!(
                        "Skipping branch '{}' in group '{}': {}",
                        parent_external_id,
                        group.group_id,
                        e
                    );
                    skipped_branches += 1;
                    continue;
                }
            };

            for child in children {
                let resolved = resolve_metadata(&child.metadata, &parent_resolved);
                queue.push_back((child.external_id.clone(), resolved.clone(), false));
                candidates.push(Candidate {
                    parent_external_id: if is_root {
                        None
                    } else {
                        Some(parent_external_id.clone())
                    },
                    folder: child,
                    resolved,
                });
            }
        }

        (candidates, skipped_branches)
    }

    /// Diff the candidate set against the persisted group and apply changes.
    fn reconcile(
        &self,
        group: &GroupConfig,
        candidates: &[Candidate],
        skipped_branches: usize,
    ) -> DocGateResult<SyncReport> {
        let mut report = SyncReport {
            total_scanned: candidates.len(),
            ..Default::default()
        };

        // Candidates arrive parents-first, so the local id of a parent is
        // always known by the time its children are processed.
        let mut local_ids: HashMap<String, Uuid> = HashMap::new();
        let mut candidate_ids: HashSet<&str> = HashSet::new();

        for candidate in candidates {
            candidate_ids.insert(candidate.folder.external_id.as_str());
            let parent_id = candidate
                .parent_external_id
                .as_deref()
                .and_then(|pe| local_ids.get(pe).copied());

            match self.store.get_by_external_id(&candidate.folder.external_id)? {
                Some(mut record) => {
                    let mut changed = false;
                    if record.name != candidate.folder.name {
                        record.name = candidate.folder.name.clone();
                        changed = true;
                    }
                    if record.parent_id != parent_id {
                        record.parent_id = parent_id;
                        changed = true;
                    }
                    // Only first-creation seeds attributes; later syncs fill
                    // fields that are still empty and touch nothing else.
                    if fill_empty_fields(&mut record.metadata, &candidate.resolved) {
                        changed = true;
                    }
                    if changed {
                        record.synced_at = chrono::Utc::now();
                        self.store.put(&record)?;
                        report.updated += 1;
                    }
                    local_ids.insert(record.external_id.clone(), record.id);
                }
                None => {
                    let record = FolderRecord::new(
                        candidate.folder.external_id.clone(),
                        parent_id,
                        candidate.folder.name.clone(),
                        group.group_id.clone(),
                        candidate.resolved.clone(),
                    );
                    local_ids.insert(record.external_id.clone(), record.id);
                    self.store.put(&record)?;
                    report.added += 1;
                }
            }
        }

        // A partial listing cannot distinguish "gone upstream" from
        // "unreachable this run", so deletion only runs on a complete walk.
        if skipped_branches == 0 {
            for record in self.store.list_group(&group.group_id)? {
                if !candidate_ids.contains(record.external_id.as_str()) {
                    self.store.remove_by_external_id(&record.external_id)?;
                    report.removed += 1;
                }
            }
        } else {
            log::warn!(
                "Group '{}' listing was partial; deletion pass skipped",
                group.group_id
            );
        }

        Ok(report)
    }

    fn lock_for(&self, group_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .group_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(group_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

/// Copy each non-empty source field into the destination where the
/// destination field is still empty. Returns whether anything changed.
fn fill_empty_fields(dest: &mut AccessMetadata, src: &AccessMetadata) -> bool {
    let mut changed = false;
    if dest.departments.is_empty() && !src.departments.is_empty() {
        dest.departments = src.departments.clone();
        changed = true;
    }
    if dest.years.is_empty() && !src.years.is_empty() {
        dest.years = src.years.clone();
        changed = true;
    }
    if dest.semesters.is_empty() && !src.semesters.is_empty() {
        dest.semesters = src.semesters.clone();
        changed = true;
    }
    if dest.tags.is_empty() && !src.tags.is_empty() {
        dest.tags = src.tags.clone();
        changed = true;
    }
    if dest.access_tags.is_empty() && !src.access_tags.is_empty() {
        dest.access_tags = src.access_tags.clone();
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockSource;
    use tempfile::tempdir;

    fn meta(departments: &[&str], years: &[u8], semesters: &[u8]) -> AccessMetadata {
        AccessMetadata {
            departments: departments.iter().map(|d| d.to_string()).collect(),
            years: years.iter().copied().collect(),
            semesters: semesters.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn group() -> GroupConfig {
        GroupConfig {
            group_id: "main".to_string(),
            root_external_id: "root".to_string(),
        }
    }

    fn engine_with(source: Arc<MockSource>) -> (tempfile::TempDir, FolderSyncEngine) {
        let dir = tempdir().unwrap();
        let store = FolderStore::open(dir.path()).unwrap();
        let engine = FolderSyncEngine::new(store, source, vec![group()]);
        (dir, engine)
    }

    #[tokio::test]
    async fn first_sync_inserts_with_inherited_metadata() {
        let source = Arc::new(MockSource::new());
        source.add_folder("root", "cse", "CSE", meta(&["CSE"], &[0], &[0, 1]));
        source.add_folder("cse", "cse-y2", "Year 2", meta(&[], &[2], &[]));
        let (_dir, engine) = engine_with(source);

        let report = engine.sync_all().await.unwrap();
        assert_eq!(report.added, 2);
        assert_eq!(report.total_scanned, 2);

        let child = engine
            .store
            .get_by_external_id("cse-y2")
            .unwrap()
            .unwrap();
        // Own years win; departments and semesters inherit from the parent.
        assert!(child.metadata.departments.contains("CSE"));
        assert_eq!(child.metadata.years, meta(&[], &[2], &[]).years);
        assert!(child.metadata.semesters.contains(&1));

        let parent = engine.store.get_by_external_id("cse").unwrap().unwrap();
        assert_eq!(child.parent_id, Some(parent.id));
        assert_eq!(parent.parent_id, None);
    }

    #[tokio::test]
    async fn second_run_is_idempotent() {
        // Scenario D
        let source = Arc::new(MockSource::new());
        source.add_folder("root", "a", "A", meta(&["CSE"], &[1], &[1]));
        source.add_folder("a", "b", "B", AccessMetadata::default());
        let (_dir, engine) = engine_with(source);

        engine.sync_all().await.unwrap();
        let second = engine.sync_all().await.unwrap();
        assert_eq!(second.added, 0);
        assert_eq!(second.removed, 0);
        assert_eq!(second.updated, 0);
        assert_eq!(second.total_scanned, 2);
    }

    #[tokio::test]
    async fn populated_attributes_are_never_overwritten() {
        let source = Arc::new(MockSource::new());
        source.add_folder("root", "a", "A", meta(&["CSE"], &[1], &[1]));
        let (_dir, engine) = engine_with(Arc::clone(&source));
        engine.sync_all().await.unwrap();

        // Upstream changes its declared departments; the persisted value must
        // survive, while the rename applies.
        source.remove_folder("root", "a");
        source.add_folder("root", "a", "A renamed", meta(&["ECE"], &[2], &[2]));
        let report = engine.sync_all().await.unwrap();
        assert_eq!(report.updated, 1);

        let record = engine.store.get_by_external_id("a").unwrap().unwrap();
        assert_eq!(record.name, "A renamed");
        assert!(record.metadata.departments.contains("CSE"));
        assert!(!record.metadata.departments.contains("ECE"));
    }

    #[tokio::test]
    async fn empty_persisted_fields_are_seeded_on_later_runs() {
        let source = Arc::new(MockSource::new());
        source.add_folder("root", "a", "A", meta(&["CSE"], &[], &[]));
        let (_dir, engine) = engine_with(Arc::clone(&source));
        engine.sync_all().await.unwrap();

        source.remove_folder("root", "a");
        source.add_folder("root", "a", "A", meta(&["CSE"], &[3], &[5]));
        engine.sync_all().await.unwrap();

        let record = engine.store.get_by_external_id("a").unwrap().unwrap();
        assert!(record.metadata.years.contains(&3));
        assert!(record.metadata.semesters.contains(&5));
    }

    #[tokio::test]
    async fn vanished_folders_are_deleted() {
        let source = Arc::new(MockSource::new());
        source.add_folder("root", "a", "A", meta(&["CSE"], &[1], &[1]));
        source.add_folder("root", "b", "B", meta(&["CSE"], &[1], &[1]));
        let (_dir, engine) = engine_with(Arc::clone(&source));
        engine.sync_all().await.unwrap();

        source.remove_folder("root", "b");
        let report = engine.sync_all().await.unwrap();
        assert_eq!(report.removed, 1);
        assert!(engine.store.get_by_external_id("b").unwrap().is_none());
        assert!(engine.store.get_by_external_id("a").unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_branch_is_skipped_and_suppresses_deletion() {
        let source = Arc::new(MockSource::new());
        source.add_folder("root", "ok", "Ok", meta(&["CSE"], &[1], &[1]));
        source.add_folder("root", "bad", "Bad", meta(&["CSE"], &[1], &[1]));
        source.add_folder("bad", "bad-child", "Bad child", AccessMetadata::default());
        let (_dir, engine) = engine_with(Arc::clone(&source));
        engine.sync_all().await.unwrap();
        assert!(engine.store.get_by_external_id("bad-child").unwrap().is_some());

        source.fail_folder("bad");
        let report = engine.sync_all().await.unwrap();
        assert_eq!(report.skipped_branches, 1);
        assert_eq!(report.removed, 0);
        // The unreachable record survives a partial run.
        assert!(engine.store.get_by_external_id("bad-child").unwrap().is_some());
    }

    #[tokio::test]
    async fn reparented_node_points_at_its_new_parent() {
        let source = Arc::new(MockSource::new());
        source.add_folder("root", "a", "A", meta(&["CSE"], &[1], &[1]));
        source.add_folder("root", "b", "B", meta(&["ECE"], &[2], &[2]));
        source.add_folder("a", "leaf", "Leaf", AccessMetadata::default());
        let (_dir, engine) = engine_with(Arc::clone(&source));
        engine.sync_all().await.unwrap();

        source.remove_folder("a", "leaf");
        source.add_folder("b", "leaf", "Leaf", AccessMetadata::default());
        engine.sync_all().await.unwrap();

        let leaf = engine.store.get_by_external_id("leaf").unwrap().unwrap();
        let b = engine.store.get_by_external_id("b").unwrap().unwrap();
        assert_eq!(leaf.parent_id, Some(b.id));
        // Attributes were seeded on first creation and are kept.
        assert!(leaf.metadata.departments.contains("CSE"));
    }

    #[tokio::test]
    async fn unknown_group_id_is_an_error() {
        let source = Arc::new(MockSource::new());
        let (_dir, engine) = engine_with(source);
        assert!(engine.sync_group_id("nope").await.is_err());
    }
}
