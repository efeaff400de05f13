//! Storage collaborator contracts.
//!
//! The engine never talks to a database directly. A [`LiveMeasureStore`]
//! hands out [`StoreSession`]s; every read of one recomputation goes through
//! a single session so the measure baseline and the issue counts describe the
//! same point in time. Writes are staged on the session and only become
//! visible on [`StoreSession::commit`]; dropping a session discards them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::Result;
use crate::live::quality_gate::QualityGate;
use crate::live::types::{
    Analysis, Branch, ChangedMeasure, Component, ComponentIssueGroups, LeakBoundary, Metric,
    PersistedMeasure,
};

/// Per-project settings relevant to recomputation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Debt rating grid override, comma separated (`"0.05,0.1,0.2,0.5"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_rating_grid: Option<String>,
}

/// Source of consistent read scopes
#[async_trait]
pub trait LiveMeasureStore: Send + Sync {
    /// Open a session; all its reads observe the same snapshot.
    async fn begin(&self) -> Result<Box<dyn StoreSession>>;
}

/// One consistent read scope plus a staged write batch
#[async_trait]
pub trait StoreSession: Send + Sync {
    /// Branch by uuid.
    async fn select_branch(&self, branch_uuid: &str) -> Result<Option<Branch>>;

    /// Last analysis of a branch.
    async fn select_last_analysis(&self, branch_uuid: &str) -> Result<Option<Analysis>>;

    /// Settings of a project; defaults when none are stored.
    async fn select_project_settings(&self, project_uuid: &str) -> Result<ProjectSettings>;

    /// Components with the given uuids. Unknown uuids are skipped.
    async fn select_components(&self, uuids: &[String]) -> Result<Vec<Component>>;

    /// Direct children of the given parents.
    async fn select_children(&self, parent_uuids: &[String]) -> Result<Vec<Component>>;

    /// Metric definitions for the given keys. Unknown keys are skipped.
    async fn select_metrics(&self, keys: &[String]) -> Result<Vec<Metric>>;

    /// Persisted measures for every (component, metric) pair of the inputs.
    async fn select_measures(
        &self,
        component_uuids: &[String],
        metric_keys: &[String],
    ) -> Result<Vec<PersistedMeasure>>;

    /// Grouped issue counts of one component, leak flags set per `boundary`.
    async fn select_issue_groups(
        &self,
        component_uuid: &str,
        boundary: LeakBoundary,
    ) -> Result<ComponentIssueGroups>;

    /// Effective quality gate of a project.
    async fn select_quality_gate(&self, project_uuid: &str) -> Result<Option<QualityGate>>;

    /// Stage the changed measures of one component.
    async fn upsert_measures(
        &mut self,
        component_uuid: &str,
        measures: Vec<ChangedMeasure>,
    ) -> Result<()>;

    /// Apply every staged write atomically.
    async fn commit(self: Box<Self>) -> Result<()>;
}
