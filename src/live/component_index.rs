//! Minimal component subtree needed to recompute a set of touched components.
//!
//! The index holds the touched components and every ancestor up to the
//! branch root, sorted deepest first, plus one extra layer: the direct
//! children of each of those nodes. Children are read-only inputs to the
//! hierarchy pass; they are never recomputed themselves.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::core::errors::{LiveMeasureError, Result};
use crate::io::store::StoreSession;
use crate::live::types::Component;

/// Loaded subtree of one branch
#[derive(Debug, Clone)]
pub struct ComponentIndex {
    sorted_tree: Vec<Component>,
    root_position: usize,
    children_by_parent: IndexMap<String, Vec<Component>>,
    all_uuids: BTreeSet<String>,
}

impl ComponentIndex {
    /// Load the subtree of `touched` through `session`.
    ///
    /// All touched components must belong to the same branch.
    pub async fn load(session: &dyn StoreSession, touched: &[Component]) -> Result<Self> {
        let first = touched.first().ok_or_else(|| {
            LiveMeasureError::validation("Cannot build an index without touched components")
        })?;
        if let Some(other) = touched.iter().find(|c| c.branch_uuid != first.branch_uuid) {
            return Err(LiveMeasureError::validation(format!(
                "Touched components span branches {} and {}",
                first.branch_uuid, other.branch_uuid
            )));
        }

        let mut uuids = BTreeSet::new();
        for component in touched {
            uuids.insert(component.uuid.clone());
            uuids.extend(component.ancestors.iter().cloned());
        }
        let uuids: Vec<String> = uuids.into_iter().collect();
        let components = session.select_components(&uuids).await?;

        if let Some(missing) = uuids
            .iter()
            .find(|uuid| !components.iter().any(|c| &c.uuid == *uuid))
        {
            return Err(LiveMeasureError::integrity(format!(
                "Component {missing} referenced by touched components does not exist"
            )));
        }

        let loaded: Vec<String> = components.iter().map(|c| c.uuid.clone()).collect();
        let children = session.select_children(&loaded).await?;
        debug!(
            "Loaded {} components and {} children for branch {}",
            components.len(),
            children.len(),
            first.branch_uuid
        );

        Self::build(components, children)
    }

    /// Assemble an index from already loaded components and their children.
    pub fn build(mut components: Vec<Component>, children: Vec<Component>) -> Result<Self> {
        components.sort_by(|a, b| {
            b.depth()
                .cmp(&a.depth())
                .then_with(|| a.uuid.cmp(&b.uuid))
        });

        let mut roots = components
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_branch_root)
            .map(|(i, _)| i);
        let root_position = roots.next().ok_or_else(|| {
            LiveMeasureError::integrity("Could not find the branch root among loaded components")
        })?;
        if let Some(extra) = roots.next() {
            return Err(LiveMeasureError::integrity(format!(
                "Found several branch roots: {} and {}",
                components[root_position].uuid, components[extra].uuid
            )));
        }

        let mut all_uuids: BTreeSet<String> = components.iter().map(|c| c.uuid.clone()).collect();
        let mut children_by_parent: IndexMap<String, Vec<Component>> = IndexMap::new();
        for child in children {
            let Some(parent) = child.parent_uuid() else {
                continue;
            };
            all_uuids.insert(child.uuid.clone());
            children_by_parent
                .entry(parent.to_string())
                .or_default()
                .push(child);
        }
        for siblings in children_by_parent.values_mut() {
            siblings.sort_by(|a, b| a.uuid.cmp(&b.uuid));
            siblings.dedup_by(|a, b| a.uuid == b.uuid);
        }

        Ok(Self {
            sorted_tree: components,
            root_position,
            children_by_parent,
            all_uuids,
        })
    }

    /// Direct children of a component, empty if none were loaded.
    pub fn children(&self, component_uuid: &str) -> &[Component] {
        self.children_by_parent
            .get(component_uuid)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every loaded uuid, including the extra children layer.
    pub fn all_uuids(&self) -> &BTreeSet<String> {
        &self.all_uuids
    }

    /// Touched components and their ancestors, deepest first.
    pub fn sorted_tree(&self) -> &[Component] {
        &self.sorted_tree
    }

    /// Root component of the branch.
    pub fn branch_root(&self) -> &Component {
        &self.sorted_tree[self.root_position]
    }
}
