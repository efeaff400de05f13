//! Top-level entry point: recompute live measures for touched components.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::config::LiveMeasureConfig;
use crate::core::errors::{LiveMeasureError, Result};
use crate::core::rating::DebtRatingGrid;
use crate::io::store::{LiveMeasureStore, StoreSession};
use crate::live::component_index::ComponentIndex;
use crate::live::formulas::FormulaCatalog;
use crate::live::measure_matrix::MeasureMatrix;
use crate::live::metrics::{ALERT_STATUS, QUALITY_GATE_DETAILS};
use crate::live::quality_gate::{EvaluatedQualityGate, QualityGateComputer, QualityGateStatus};
use crate::live::tree_updater::LiveMeasureTreeUpdater;
use crate::live::types::{Analysis, Branch, ChangedMeasure, Component};

/// Change notification produced for every recomputed branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityGateChangeEvent {
    /// Event id
    pub event_id: Uuid,
    /// Project of the branch
    pub project_uuid: String,
    /// Recomputed branch
    pub branch: Branch,
    /// Last analysis of the branch
    pub analysis: Analysis,
    /// Gate status stored before recomputation
    pub previous_status: Option<QualityGateStatus>,
    /// Gate evaluated on the recomputed measures
    pub evaluated_gate: EvaluatedQualityGate,
    /// Measures written by this recomputation
    pub changed_measures: Vec<ChangedMeasure>,
    /// When the recomputation finished
    pub computed_at: DateTime<Utc>,
}

impl QualityGateChangeEvent {
    /// Whether the gate status differs from the stored one.
    pub fn status_changed(&self) -> bool {
        self.previous_status != Some(self.evaluated_gate.status)
    }
}

/// Branch whose recomputation was rolled back
#[derive(Debug)]
pub struct BranchFailure {
    /// Branch uuid
    pub branch_uuid: String,
    /// Cause of the rollback
    pub error: LiveMeasureError,
}

/// Outcome of a multi-branch refresh
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// One event per committed branch, in branch uuid order
    pub events: Vec<QualityGateChangeEvent>,
    /// Branches that committed nothing
    pub failures: Vec<BranchFailure>,
}

impl RefreshReport {
    /// Whether every touched branch was committed or skipped.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Event of the given branch, if it was committed.
    pub fn event(&self, branch_uuid: &str) -> Option<&QualityGateChangeEvent> {
        self.events.iter().find(|e| e.branch.uuid == branch_uuid)
    }

    /// Failure of the given branch, if it was rolled back.
    pub fn failure(&self, branch_uuid: &str) -> Option<&LiveMeasureError> {
        self.failures
            .iter()
            .find(|f| f.branch_uuid == branch_uuid)
            .map(|f| &f.error)
    }
}

/// Recomputes measures and gate status after components were touched
pub struct LiveMeasureComputer {
    store: Arc<dyn LiveMeasureStore>,
    catalog: Arc<FormulaCatalog>,
    config: Arc<LiveMeasureConfig>,
}

impl LiveMeasureComputer {
    /// Computer over the built-in formula catalog.
    pub fn new(store: Arc<dyn LiveMeasureStore>, config: LiveMeasureConfig) -> Result<Self> {
        Self::with_catalog(store, FormulaCatalog::standard(), config)
    }

    /// Computer over a custom catalog.
    pub fn with_catalog(
        store: Arc<dyn LiveMeasureStore>,
        catalog: Arc<FormulaCatalog>,
        config: LiveMeasureConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            catalog,
            config: Arc::new(config),
        })
    }

    /// Formula catalog in use.
    pub fn catalog(&self) -> &FormulaCatalog {
        &self.catalog
    }

    /// Recompute every branch touched by `touched`.
    ///
    /// Branches are processed one after another in uuid order, each in its
    /// own session. A failing branch rolls back alone: the remaining
    /// branches are still recomputed, and the report carries the events of
    /// every committed branch next to the failures.
    pub async fn refresh(&self, touched: &[Component]) -> RefreshReport {
        let mut by_branch: BTreeMap<&str, Vec<Component>> = BTreeMap::new();
        for component in touched {
            by_branch
                .entry(component.branch_uuid.as_str())
                .or_default()
                .push(component.clone());
        }

        let mut report = RefreshReport::default();
        for (branch_uuid, components) in by_branch {
            match self.refresh_branch(branch_uuid, &components).await {
                Ok(Some(event)) => report.events.push(event),
                Ok(None) => {}
                Err(error) => {
                    error!("Recomputation of branch {} failed: {}", branch_uuid, error);
                    report.failures.push(BranchFailure {
                        branch_uuid: branch_uuid.to_string(),
                        error,
                    });
                }
            }
        }
        report
    }

    /// Recompute one branch; `None` when the branch has no analysis yet.
    pub async fn refresh_branch(
        &self,
        branch_uuid: &str,
        touched: &[Component],
    ) -> Result<Option<QualityGateChangeEvent>> {
        let mut session = self.store.begin().await?;

        let branch = session.select_branch(branch_uuid).await?.ok_or_else(|| {
            LiveMeasureError::integrity(format!("Branch {branch_uuid} does not exist"))
        })?;
        let Some(analysis) = session.select_last_analysis(branch_uuid).await? else {
            warn!("Branch {} has no analysis, skipping recomputation", branch.key);
            return Ok(None);
        };

        let grid = self.debt_rating_grid(session.as_ref(), &branch).await?;
        let gate_computer = QualityGateComputer::new();
        let gate = gate_computer.load_gate(session.as_ref(), &branch).await?;
        let index = ComponentIndex::load(session.as_ref(), touched).await?;

        let metric_keys = self.metric_keys(&gate.metric_keys());
        let metrics = session.select_metrics(&metric_keys).await?;
        if let Some(missing) = metric_keys
            .iter()
            .find(|key| !metrics.iter().any(|m| &m.key == *key))
        {
            return Err(LiveMeasureError::integrity(format!(
                "Metric with key {missing} not found"
            )));
        }

        let component_uuids: Vec<String> = index.all_uuids().iter().cloned().collect();
        let measures = session.select_measures(&component_uuids, &metric_keys).await?;
        debug!(
            "Branch {}: {} components, {} metrics, {} stored measures",
            branch.key,
            component_uuids.len(),
            metrics.len(),
            measures.len()
        );
        let mut matrix = MeasureMatrix::new(component_uuids, metrics, measures);

        let root = index.branch_root().clone();
        let previous_status = gate_computer.previous_status(&root, &matrix)?;

        let mut updater = LiveMeasureTreeUpdater::new(Arc::clone(&self.catalog));
        updater
            .update(session.as_ref(), &branch, &analysis, &grid, &index, &mut matrix)
            .await?;
        let evaluated_gate = gate_computer.evaluate(&root, &gate, &mut matrix)?;

        let changed_measures = matrix.changed();
        stage(session.as_mut(), &changed_measures).await?;
        session.commit().await?;

        info!(
            "Branch {}: {} measures changed, quality gate {}",
            branch.key,
            changed_measures.len(),
            evaluated_gate.status
        );

        Ok(Some(QualityGateChangeEvent {
            event_id: Uuid::new_v4(),
            project_uuid: branch.project_uuid.clone(),
            branch,
            analysis,
            previous_status,
            evaluated_gate,
            changed_measures,
            computed_at: Utc::now(),
        }))
    }

    async fn debt_rating_grid(
        &self,
        session: &dyn StoreSession,
        branch: &Branch,
    ) -> Result<DebtRatingGrid> {
        let settings = session.select_project_settings(&branch.project_uuid).await?;
        match settings.debt_rating_grid {
            Some(grid) => DebtRatingGrid::parse(&grid).map_err(|e| {
                LiveMeasureError::integrity(format!(
                    "Invalid debt rating grid for project {}: {}",
                    branch.project_uuid, e
                ))
            }),
            None => self.config.debt_rating_grid(),
        }
    }

    fn metric_keys(&self, gate_metrics: &[String]) -> Vec<String> {
        let mut keys: BTreeSet<String> = self.catalog.metric_keys().into_iter().collect();
        keys.extend(gate_metrics.iter().cloned());
        keys.insert(ALERT_STATUS.to_string());
        keys.insert(QUALITY_GATE_DETAILS.to_string());
        keys.into_iter().collect()
    }
}

async fn stage(session: &mut dyn StoreSession, changed: &[ChangedMeasure]) -> Result<()> {
    let mut by_component: BTreeMap<&str, Vec<ChangedMeasure>> = BTreeMap::new();
    for measure in changed {
        by_component
            .entry(measure.component_uuid.as_str())
            .or_default()
            .push(measure.clone());
    }
    for (component_uuid, measures) in by_component {
        session.upsert_measures(component_uuid, measures).await?;
    }
    Ok(())
}
