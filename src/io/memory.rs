//! In-memory storage backed by a serde dataset.
//!
//! The dataset is what a JSON or YAML fixture file deserializes into. Raw
//! issues are kept per component and bucketed into issue, impact and
//! impact-severity groups on demand for the requested leak boundary.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::errors::{LiveMeasureError, Result};
use crate::io::store::{LiveMeasureStore, ProjectSettings, StoreSession};
use crate::live::metrics::default_metrics;
use crate::live::quality_gate::QualityGate;
use crate::live::types::{
    Analysis, Branch, ChangedMeasure, Component, ComponentIssueGroups, ImpactGroup,
    ImpactSeverity, ImpactSeverityGroup, IssueGroup, IssueStatus, LeakBoundary, MeasureValue,
    Metric, PersistedMeasure, Resolution, RuleType, Severity, SoftwareQuality,
};

/// Impact of a stored issue on one software quality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredImpact {
    /// Affected quality
    pub software_quality: SoftwareQuality,
    /// Impact severity
    pub severity: ImpactSeverity,
}

/// A single issue as kept by the in-memory store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredIssue {
    /// Component the issue is raised on
    pub component_uuid: String,
    /// Rule type
    pub rule_type: RuleType,
    /// Rule severity
    pub severity: Severity,
    /// Workflow status
    pub status: IssueStatus,
    /// Resolution, absent while unresolved
    #[serde(default)]
    pub resolution: Option<Resolution>,
    /// Remediation effort in minutes
    #[serde(default)]
    pub effort: f64,
    /// Creation date
    pub created_at: DateTime<Utc>,
    /// Whether the issue is new against the reference branch
    #[serde(default)]
    pub new_code_reference: bool,
    /// Whether the rule is prioritized
    #[serde(default)]
    pub prioritized_rule: bool,
    /// Impacts on software qualities
    #[serde(default)]
    pub impacts: Vec<StoredImpact>,
}

impl StoredIssue {
    fn in_leak(&self, boundary: LeakBoundary) -> bool {
        match boundary {
            LeakBoundary::Everything => true,
            LeakBoundary::ReferenceBranch => self.new_code_reference,
            LeakBoundary::Since(date) => self.created_at > date,
            LeakBoundary::Unbounded => false,
        }
    }
}

/// Everything the in-memory store knows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Metric catalog; empty means the built-in definitions
    #[serde(default)]
    pub metrics: Vec<Metric>,
    /// Branches
    #[serde(default)]
    pub branches: Vec<Branch>,
    /// Analyses of all branches
    #[serde(default)]
    pub analyses: Vec<Analysis>,
    /// Components of all branches
    #[serde(default)]
    pub components: Vec<Component>,
    /// Persisted measures
    #[serde(default)]
    pub measures: Vec<PersistedMeasure>,
    /// Raw issues
    #[serde(default)]
    pub issues: Vec<StoredIssue>,
    /// Quality gates by project uuid
    #[serde(default)]
    pub quality_gates: BTreeMap<String, QualityGate>,
    /// Gate used by projects without their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_quality_gate: Option<QualityGate>,
    /// Settings by project uuid
    #[serde(default)]
    pub project_settings: BTreeMap<String, ProjectSettings>,
}

impl Dataset {
    /// Load a dataset; `.yaml`/`.yml` files are YAML, anything else JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LiveMeasureError::io(format!("Failed to read dataset: {}", path.display()), e)
        })?;
        let mut dataset: Dataset = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        if dataset.metrics.is_empty() {
            dataset.metrics = default_metrics();
        }
        Ok(dataset)
    }

    /// Write the dataset in the format implied by the extension.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, content).map_err(|e| {
            LiveMeasureError::io(format!("Failed to write dataset: {}", path.display()), e)
        })
    }

    /// Components with the given uuids.
    pub fn components_by_uuid(&self, uuids: &[String]) -> Vec<Component> {
        let wanted: HashSet<&str> = uuids.iter().map(String::as_str).collect();
        self.components
            .iter()
            .filter(|c| wanted.contains(c.uuid.as_str()))
            .cloned()
            .collect()
    }

    /// Stored value of one measure.
    pub fn measure(&self, component_uuid: &str, metric_key: &str) -> Option<&MeasureValue> {
        self.measures
            .iter()
            .find(|m| m.component_uuid == component_uuid && m.metric_key == metric_key)
            .map(|m| &m.value)
    }

    /// Bucket the issues of a component for a leak boundary.
    pub fn issue_groups(&self, component_uuid: &str, boundary: LeakBoundary) -> ComponentIssueGroups {
        type IssueKey = (RuleType, Severity, IssueStatus, Option<Resolution>, bool);
        type ImpactKey = (SoftwareQuality, ImpactSeverity, IssueStatus, Option<Resolution>, bool);

        let mut issues: BTreeMap<IssueKey, IssueGroup> = BTreeMap::new();
        let mut impacts: BTreeMap<ImpactKey, ImpactGroup> = BTreeMap::new();
        let mut highest: BTreeMap<(ImpactSeverity, Option<Resolution>, bool), ImpactSeverityGroup> =
            BTreeMap::new();

        let relevant = self
            .issues
            .iter()
            .filter(|i| i.component_uuid == component_uuid && i.status != IssueStatus::Closed);
        for issue in relevant {
            let in_leak = issue.in_leak(boundary);
            let group = issues
                .entry((issue.rule_type, issue.severity, issue.status, issue.resolution, in_leak))
                .or_insert_with(|| IssueGroup {
                    rule_type: issue.rule_type,
                    severity: issue.severity,
                    status: issue.status,
                    resolution: issue.resolution,
                    count: 0,
                    effort: 0.0,
                    in_leak,
                    prioritized_rule_count: 0,
                });
            group.count += 1;
            group.effort += issue.effort;
            if issue.prioritized_rule {
                group.prioritized_rule_count += 1;
            }

            if issue.rule_type == RuleType::SecurityHotspot {
                continue;
            }
            for impact in &issue.impacts {
                let key = (
                    impact.software_quality,
                    impact.severity,
                    issue.status,
                    issue.resolution,
                    in_leak,
                );
                let group = impacts.entry(key).or_insert_with(|| ImpactGroup {
                    software_quality: impact.software_quality,
                    severity: impact.severity,
                    status: issue.status,
                    resolution: issue.resolution,
                    count: 0,
                    effort: 0.0,
                    in_leak,
                });
                group.count += 1;
                group.effort += issue.effort;
            }
            if let Some(severity) = issue.impacts.iter().map(|i| i.severity).max() {
                highest
                    .entry((severity, issue.resolution, in_leak))
                    .or_insert_with(|| ImpactSeverityGroup {
                        severity,
                        resolution: issue.resolution,
                        count: 0,
                        in_leak,
                    })
                    .count += 1;
            }
        }

        ComponentIssueGroups {
            issue_groups: issues.into_values().collect(),
            impact_groups: impacts.into_values().collect(),
            impact_severity_groups: highest.into_values().collect(),
        }
    }

    fn apply(&mut self, component_uuid: &str, changes: Vec<ChangedMeasure>) {
        for change in changes {
            self.measures.retain(|m| {
                !(m.component_uuid == component_uuid && m.metric_key == change.metric_key)
            });
            if let Some(value) = change.value {
                self.measures.push(PersistedMeasure {
                    component_uuid: component_uuid.to_string(),
                    metric_key: change.metric_key,
                    value,
                });
            }
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// [`LiveMeasureStore`] over a shared in-memory [`Dataset`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    data: Arc<RwLock<Dataset>>,
}

impl InMemoryStore {
    /// Wrap a dataset.
    pub fn new(dataset: Dataset) -> Self {
        Self {
            data: Arc::new(RwLock::new(dataset)),
        }
    }

    /// Load a dataset file into a store.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Dataset::from_file(path).map(Self::new)
    }

    /// Copy of the current data.
    pub fn snapshot(&self) -> Dataset {
        self.data.read().clone()
    }

    /// Currently stored value of one measure.
    pub fn measure(&self, component_uuid: &str, metric_key: &str) -> Option<MeasureValue> {
        self.data.read().measure(component_uuid, metric_key).cloned()
    }

    /// Record a new issue.
    pub fn add_issue(&self, issue: StoredIssue) {
        self.data.write().issues.push(issue);
    }

    /// Replace a project's quality gate.
    pub fn set_quality_gate(&self, project_uuid: impl Into<String>, gate: QualityGate) {
        self.data.write().quality_gates.insert(project_uuid.into(), gate);
    }
}

#[async_trait]
impl LiveMeasureStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreSession>> {
        Ok(Box::new(InMemorySession {
            snapshot: self.snapshot(),
            target: Arc::clone(&self.data),
            staged: Vec::new(),
        }))
    }
}

/// Session reading a snapshot taken at [`LiveMeasureStore::begin`]
#[derive(Debug)]
pub struct InMemorySession {
    snapshot: Dataset,
    target: Arc<RwLock<Dataset>>,
    staged: Vec<(String, Vec<ChangedMeasure>)>,
}

#[async_trait]
impl StoreSession for InMemorySession {
    async fn select_branch(&self, branch_uuid: &str) -> Result<Option<Branch>> {
        Ok(self
            .snapshot
            .branches
            .iter()
            .find(|b| b.uuid == branch_uuid)
            .cloned())
    }

    async fn select_last_analysis(&self, branch_uuid: &str) -> Result<Option<Analysis>> {
        Ok(self
            .snapshot
            .analyses
            .iter()
            .filter(|a| a.branch_uuid == branch_uuid)
            .max_by_key(|a| a.created_at)
            .cloned())
    }

    async fn select_project_settings(&self, project_uuid: &str) -> Result<ProjectSettings> {
        Ok(self
            .snapshot
            .project_settings
            .get(project_uuid)
            .cloned()
            .unwrap_or_default())
    }

    async fn select_components(&self, uuids: &[String]) -> Result<Vec<Component>> {
        Ok(self.snapshot.components_by_uuid(uuids))
    }

    async fn select_children(&self, parent_uuids: &[String]) -> Result<Vec<Component>> {
        let parents: HashSet<&str> = parent_uuids.iter().map(String::as_str).collect();
        Ok(self
            .snapshot
            .components
            .iter()
            .filter(|c| c.parent_uuid().is_some_and(|p| parents.contains(p)))
            .cloned()
            .collect())
    }

    async fn select_metrics(&self, keys: &[String]) -> Result<Vec<Metric>> {
        let wanted: HashSet<&str> = keys.iter().map(String::as_str).collect();
        Ok(self
            .snapshot
            .metrics
            .iter()
            .filter(|m| wanted.contains(m.key.as_str()))
            .cloned()
            .collect())
    }

    async fn select_measures(
        &self,
        component_uuids: &[String],
        metric_keys: &[String],
    ) -> Result<Vec<PersistedMeasure>> {
        let components: HashSet<&str> = component_uuids.iter().map(String::as_str).collect();
        let metrics: HashSet<&str> = metric_keys.iter().map(String::as_str).collect();
        Ok(self
            .snapshot
            .measures
            .iter()
            .filter(|m| {
                components.contains(m.component_uuid.as_str())
                    && metrics.contains(m.metric_key.as_str())
            })
            .cloned()
            .collect())
    }

    async fn select_issue_groups(
        &self,
        component_uuid: &str,
        boundary: LeakBoundary,
    ) -> Result<ComponentIssueGroups> {
        Ok(self.snapshot.issue_groups(component_uuid, boundary))
    }

    async fn select_quality_gate(&self, project_uuid: &str) -> Result<Option<QualityGate>> {
        Ok(self
            .snapshot
            .quality_gates
            .get(project_uuid)
            .or(self.snapshot.default_quality_gate.as_ref())
            .cloned())
    }

    async fn upsert_measures(
        &mut self,
        component_uuid: &str,
        measures: Vec<ChangedMeasure>,
    ) -> Result<()> {
        if let Some(foreign) = measures.iter().find(|m| m.component_uuid != component_uuid) {
            return Err(LiveMeasureError::storage(
                "upsert_measures",
                format!(
                    "Measure {} belongs to {}, not {}",
                    foreign.metric_key, foreign.component_uuid, component_uuid
                ),
            ));
        }
        self.staged.push((component_uuid.to_string(), measures));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemorySession { target, staged, .. } = *self;
        let mut data = target.write();
        let mut written = 0;
        for (component_uuid, measures) in staged {
            written += measures.len();
            data.apply(&component_uuid, measures);
        }
        debug!("Committed {} measures", written);
        Ok(())
    }
}
