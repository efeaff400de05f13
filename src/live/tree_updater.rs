//! Two-pass recomputation over a loaded subtree.
//!
//! The leaf pass runs every eligible formula's leaf step on each component of
//! the sorted tree, using issue groups loaded concurrently for all of them. The
//! hierarchy pass then walks the same deepest-first order so that a parent is
//! only aggregated once all of its loaded children are final.

use std::sync::Arc;

use futures::future;
use tracing::debug;

use crate::core::errors::{LiveMeasureError, Result};
use crate::core::rating::DebtRatingGrid;
use crate::io::store::StoreSession;
use crate::live::component_index::ComponentIndex;
use crate::live::formula::{Formula, FormulaContext};
use crate::live::formulas::FormulaCatalog;
use crate::live::issue_counter::IssueCounter;
use crate::live::measure_matrix::MeasureMatrix;
use crate::live::types::{Analysis, Branch, LeakBoundary, PeriodMode};

/// Progress of a [`LiveMeasureTreeUpdater`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    /// Nothing ran yet
    Idle,
    /// Leaf steps are running
    LeafPass,
    /// Hierarchy steps are running
    HierarchyPass,
    /// Both passes completed
    Done,
}

/// Which issues count as new code for a branch and its last analysis.
pub fn leak_boundary(branch: &Branch, analysis: &Analysis) -> LeakBoundary {
    if branch.is_pull_request() {
        return LeakBoundary::Everything;
    }
    if analysis.period_mode == Some(PeriodMode::ReferenceBranch) {
        return LeakBoundary::ReferenceBranch;
    }
    match analysis.period_date {
        Some(date) => LeakBoundary::Since(date),
        None => LeakBoundary::Unbounded,
    }
}

/// Whether new code formulas run for a branch.
pub fn uses_leak_formulas(branch: &Branch, analysis: &Analysis) -> bool {
    branch.is_pull_request()
        || analysis.period_date.is_some()
        || analysis.period_mode == Some(PeriodMode::ReferenceBranch)
}

/// Runs the catalog over one branch's subtree.
///
/// An updater holds per-branch state and runs once; build a new one for
/// every branch.
#[derive(Debug)]
pub struct LiveMeasureTreeUpdater {
    catalog: Arc<FormulaCatalog>,
    phase: UpdatePhase,
}

impl LiveMeasureTreeUpdater {
    /// Create an idle updater over `catalog`.
    pub fn new(catalog: Arc<FormulaCatalog>) -> Self {
        Self {
            catalog,
            phase: UpdatePhase::Idle,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> UpdatePhase {
        self.phase
    }

    /// Run both passes, writing results into `matrix`.
    ///
    /// Any formula failure aborts the update; the matrix is then left
    /// partially updated and must be discarded.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &mut self,
        session: &dyn StoreSession,
        branch: &Branch,
        analysis: &Analysis,
        grid: &DebtRatingGrid,
        index: &ComponentIndex,
        matrix: &mut MeasureMatrix,
    ) -> Result<()> {
        if self.phase != UpdatePhase::Idle {
            return Err(LiveMeasureError::internal(format!(
                "Tree updater for branch {} already ran (phase {:?})",
                branch.uuid, self.phase
            )));
        }

        let catalog = Arc::clone(&self.catalog);
        let formulas = eligible_formulas(&catalog, branch, analysis, index, matrix)?;
        let boundary = leak_boundary(branch, analysis);
        debug!(
            "Branch {}: {} of {} formulas eligible, leak boundary {:?}",
            branch.uuid,
            formulas.len(),
            catalog.len(),
            boundary
        );

        self.phase = UpdatePhase::LeafPass;
        let all_groups = future::try_join_all(
            index
                .sorted_tree()
                .iter()
                .map(|component| session.select_issue_groups(&component.uuid, boundary)),
        )
        .await?;
        for (component, groups) in index.sorted_tree().iter().zip(&all_groups) {
            let counter = IssueCounter::new(groups);
            for formula in &formulas {
                let mut ctx = FormulaContext::new(component, formula, matrix, index, grid);
                formula.compute_leaf(&mut ctx, &counter)?;
            }
        }
        debug!(
            "Leaf pass done on {} components of branch {}",
            index.sorted_tree().len(),
            branch.uuid
        );

        self.phase = UpdatePhase::HierarchyPass;
        for component in index.sorted_tree() {
            for formula in &formulas {
                let mut ctx = FormulaContext::new(component, formula, matrix, index, grid);
                formula.aggregate(&mut ctx)?;
            }
        }

        self.phase = UpdatePhase::Done;
        Ok(())
    }
}

// Eligibility is decided once, against the measures as loaded, so a value
// written on the root during the leaf pass cannot enable a formula halfway.
fn eligible_formulas<'c>(
    catalog: &'c FormulaCatalog,
    branch: &Branch,
    analysis: &Analysis,
    index: &ComponentIndex,
    matrix: &MeasureMatrix,
) -> Result<Vec<&'c Formula>> {
    let use_leak = uses_leak_formulas(branch, analysis);
    let root = index.branch_root();
    let mut eligible = Vec::with_capacity(catalog.len());
    for formula in catalog.formulas() {
        if formula.should_compute(use_leak, matrix, root)? {
            eligible.push(formula);
        }
    }
    Ok(eligible)
}
