//! Per-principal tree shaping: filter denied folders and promote their
//! visible descendants into the denied folder's place.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

use super::node::FolderRecord;
use super::store::FolderStore;
use crate::access::{AccessEvaluator, AccessMetadata, Principal};
use crate::error::DocGateResult;

/// One node of an assembled tree response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibleNode {
    pub id: Uuid,
    pub external_id: String,
    pub name: String,
    pub metadata: AccessMetadata,
    pub children: Vec<VisibleNode>,
}

/// Builds tree views over the flat persisted records.
///
/// The visible view applies the access decision per node; a denied node
/// disappears and its allowed descendants take its place among the denied
/// node's siblings. The full view skips filtering and is admin-only.
pub struct TreeFilterPromoter {
    store: FolderStore,
    evaluator: AccessEvaluator,
}

impl TreeFilterPromoter {
    pub fn new(store: FolderStore) -> Self {
        Self {
            store,
            evaluator: AccessEvaluator::new(),
        }
    }

    /// The tree as `principal` may see it, siblings sorted by name.
    pub fn visible_tree(
        &self,
        group_id: &str,
        principal: &Principal,
    ) -> DocGateResult<Vec<VisibleNode>> {
        self.assemble(group_id, Some(principal))
    }

    /// The unfiltered tree, for administrative inspection.
    pub fn full_tree(&self, group_id: &str) -> DocGateResult<Vec<VisibleNode>> {
        self.assemble(group_id, None)
    }

    /// Single pass over the group's records, no recursion. Nodes are visited
    /// in reverse breadth-first order so every child's promoted contribution
    /// exists before its parent consumes it.
    fn assemble(
        &self,
        group_id: &str,
        principal: Option<&Principal>,
    ) -> DocGateResult<Vec<VisibleNode>> {
        let records = self.store.list_group(group_id)?;

        let mut by_id: HashMap<Uuid, &FolderRecord> = HashMap::new();
        let mut children_of: HashMap<Option<Uuid>, Vec<Uuid>> = HashMap::new();
        for record in &records {
            by_id.insert(record.id, record);
            children_of.entry(record.parent_id).or_default().push(record.id);
        }

        // Breadth-first from the roots. Records whose parent id points at
        // nothing are unreachable and never appear in any view.
        let mut order: Vec<Uuid> = Vec::with_capacity(records.len());
        let mut queue: VecDeque<Uuid> = children_of
            .get(&None)
            .map(|roots| roots.iter().copied().collect())
            .unwrap_or_default();
        while let Some(id) = queue.pop_front() {
            order.push(id);
            if let Some(kids) = children_of.get(&Some(id)) {
                queue.extend(kids.iter().copied());
            }
        }

        // contribution[id] is what the node hands up to its parent: itself
        // when allowed, otherwise its own children's contributions promoted.
        let mut contribution: HashMap<Uuid, Vec<VisibleNode>> = HashMap::new();
        for id in order.iter().rev() {
            let record = by_id[id];
            let mut assembled: Vec<VisibleNode> = Vec::new();
            if let Some(kids) = children_of.get(&Some(*id)) {
                for kid in kids {
                    assembled.extend(contribution.remove(kid).unwrap_or_default());
                }
            }
            assembled.sort_by(|a, b| a.name.cmp(&b.name));

            let allowed = match principal {
                Some(p) => self.evaluator.allow(&record.metadata, p),
                None => true,
            };
            let handed_up = if allowed {
                vec![VisibleNode {
                    id: record.id,
                    external_id: record.external_id.clone(),
                    name: record.name.clone(),
                    metadata: record.metadata.clone(),
                    children: assembled,
                }]
            } else {
                assembled
            };
            contribution.insert(*id, handed_up);
        }

        let mut top: Vec<VisibleNode> = Vec::new();
        if let Some(roots) = children_of.get(&None) {
            for root in roots {
                top.extend(contribution.remove(root).unwrap_or_default());
            }
        }
        top.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(top)
    }
}
