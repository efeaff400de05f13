//! Formula records and the per-call context handed to formula steps.
//!
//! A [`Formula`] is plain data: a target metric, two flags, the metrics it
//! reads, a leaf step and a hierarchy step. Steps are function pointers that
//! receive a [`FormulaContext`] built fresh for every (component, formula)
//! call, so a step can only observe what the context exposes.

use std::fmt;

use crate::core::errors::{LiveMeasureError, Result};
use crate::core::rating::{DebtRatingGrid, Rating};
use crate::live::component_index::ComponentIndex;
use crate::live::impact::ImpactMeasure;
use crate::live::issue_counter::IssueCounter;
use crate::live::measure_matrix::MeasureMatrix;
use crate::live::types::Component;

/// Computes a metric for one component from its own issues.
pub type LeafStep = fn(&mut FormulaContext<'_>, &IssueCounter) -> Result<()>;

/// Computes a metric for one component from values already in the matrix.
pub type CustomStep = fn(&mut FormulaContext<'_>) -> Result<()>;

/// How a formula folds children into their parent
#[derive(Clone, Copy)]
pub enum HierarchyStep {
    /// Own value plus the sum of the children's values
    SumChildren,
    /// Worst of the own rating and the children's ratings, when children exist
    MaxRatingChildren,
    /// Own impact measure merged with the children's impact measures
    ImpactSumChildren,
    /// Formula specific recombination
    Custom(CustomStep),
}

impl HierarchyStep {
    /// Short label used in listings.
    pub fn label(&self) -> &'static str {
        match self {
            HierarchyStep::SumChildren => "sum",
            HierarchyStep::MaxRatingChildren => "max-rating",
            HierarchyStep::ImpactSumChildren => "impact-sum",
            HierarchyStep::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for HierarchyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Computation rule of one metric
#[derive(Clone)]
pub struct Formula {
    metric_key: &'static str,
    on_leak: bool,
    only_if_computed_on_branch: bool,
    dependencies: &'static [&'static str],
    leaf: LeafStep,
    hierarchy: HierarchyStep,
}

impl Formula {
    /// Formula over the whole code base with no dependencies.
    pub fn new(metric_key: &'static str, hierarchy: HierarchyStep, leaf: LeafStep) -> Self {
        Self {
            metric_key,
            on_leak: false,
            only_if_computed_on_branch: false,
            dependencies: &[],
            leaf,
            hierarchy,
        }
    }

    /// Restrict the formula to new code.
    #[must_use]
    pub fn leak(mut self) -> Self {
        self.on_leak = true;
        self
    }

    /// Only run when the branch root already carries the metric.
    #[must_use]
    pub fn only_if_computed_on_branch(mut self) -> Self {
        self.only_if_computed_on_branch = true;
        self
    }

    /// Declare the metrics this formula reads besides its own.
    #[must_use]
    pub fn depends_on(mut self, dependencies: &'static [&'static str]) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Target metric.
    pub fn metric_key(&self) -> &'static str {
        self.metric_key
    }

    /// Whether the formula applies to new code only.
    pub fn is_on_leak(&self) -> bool {
        self.on_leak
    }

    /// Whether the formula requires a value on the branch root.
    pub fn requires_branch_value(&self) -> bool {
        self.only_if_computed_on_branch
    }

    /// Declared dependency metrics.
    pub fn dependencies(&self) -> &'static [&'static str] {
        self.dependencies
    }

    /// Hierarchy step kind.
    pub fn hierarchy(&self) -> HierarchyStep {
        self.hierarchy
    }

    /// Whether this formula runs for a branch.
    ///
    /// Leak formulas need the branch to use new code; formulas flagged
    /// [`Formula::only_if_computed_on_branch`] need the root to carry a value.
    pub fn should_compute(
        &self,
        use_leak_formulas: bool,
        matrix: &MeasureMatrix,
        branch_root: &Component,
    ) -> Result<bool> {
        if self.on_leak && !use_leak_formulas {
            return Ok(false);
        }
        if self.only_if_computed_on_branch {
            return matrix.has_value(&branch_root.uuid, self.metric_key);
        }
        Ok(true)
    }

    /// Run the leaf step; failures carry the metric and component.
    pub fn compute_leaf(&self, ctx: &mut FormulaContext<'_>, issues: &IssueCounter) -> Result<()> {
        (self.leaf)(ctx, issues).map_err(|e| self.wrap(ctx, e))
    }

    /// Run the hierarchy step; failures carry the metric and component.
    pub fn aggregate(&self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        let result = match self.hierarchy {
            HierarchyStep::SumChildren => sum_children(ctx),
            HierarchyStep::MaxRatingChildren => max_rating_children(ctx),
            HierarchyStep::ImpactSumChildren => impact_sum_children(ctx),
            HierarchyStep::Custom(step) => step(ctx),
        };
        result.map_err(|e| self.wrap(ctx, e))
    }

    fn wrap(&self, ctx: &FormulaContext<'_>, error: LiveMeasureError) -> LiveMeasureError {
        LiveMeasureError::formula_failure(self.metric_key, &ctx.component.uuid, error)
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formula")
            .field("metric_key", &self.metric_key)
            .field("on_leak", &self.on_leak)
            .field("only_if_computed_on_branch", &self.only_if_computed_on_branch)
            .field("dependencies", &self.dependencies)
            .field("hierarchy", &self.hierarchy)
            .finish()
    }
}

fn sum_children(ctx: &mut FormulaContext<'_>) -> Result<()> {
    let own = ctx.value(ctx.metric_key())?.unwrap_or(0.0);
    let children: f64 = ctx.children_values()?.iter().sum();
    ctx.set_number(own + children)
}

fn max_rating_children(ctx: &mut FormulaContext<'_>) -> Result<()> {
    let Some(worst_child) = ctx.children_ratings()?.into_iter().max() else {
        return Ok(());
    };
    let own = ctx.rating(ctx.metric_key())?.unwrap_or(Rating::A);
    ctx.set_rating(own.max(worst_child))
}

fn impact_sum_children(ctx: &mut FormulaContext<'_>) -> Result<()> {
    let mut total = match ctx.text(ctx.metric_key())? {
        Some(json) => ImpactMeasure::parse(&json)?,
        None => ImpactMeasure::default(),
    };
    for json in ctx.children_texts()? {
        total.merge(&ImpactMeasure::parse(&json)?);
    }
    ctx.set_text(total.to_json()?)
}

/// Arguments of one formula step: the component, the formula, the matrix
/// and the loaded children.
pub struct FormulaContext<'a> {
    component: &'a Component,
    formula: &'a Formula,
    matrix: &'a mut MeasureMatrix,
    index: &'a ComponentIndex,
    grid: &'a DebtRatingGrid,
}

impl<'a> FormulaContext<'a> {
    /// Bundle the arguments of one step.
    pub fn new(
        component: &'a Component,
        formula: &'a Formula,
        matrix: &'a mut MeasureMatrix,
        index: &'a ComponentIndex,
        grid: &'a DebtRatingGrid,
    ) -> Self {
        Self {
            component,
            formula,
            matrix,
            index,
            grid,
        }
    }

    /// Component being computed.
    pub fn component(&self) -> &Component {
        self.component
    }

    /// Metric the formula writes.
    pub fn metric_key(&self) -> &'static str {
        self.formula.metric_key
    }

    /// Grid used for debt ratings.
    pub fn debt_rating_grid(&self) -> &DebtRatingGrid {
        self.grid
    }

    /// Numeric value of the own metric or a declared dependency.
    pub fn value(&self, metric_key: &str) -> Result<Option<f64>> {
        self.check_readable(metric_key)?;
        self.matrix.number(&self.component.uuid, metric_key)
    }

    /// Text value of the own metric or a declared dependency.
    pub fn text(&self, metric_key: &str) -> Result<Option<String>> {
        self.check_readable(metric_key)?;
        self.matrix.text(&self.component.uuid, metric_key)
    }

    /// Rating value of the own metric or a declared dependency.
    pub fn rating(&self, metric_key: &str) -> Result<Option<Rating>> {
        self.check_readable(metric_key)?;
        self.matrix.rating(&self.component.uuid, metric_key)
    }

    /// Values of the own metric on the children that carry one.
    pub fn children_values(&self) -> Result<Vec<f64>> {
        let mut values = Vec::new();
        for child in self.index.children(&self.component.uuid) {
            if let Some(v) = self.matrix.number(&child.uuid, self.metric_key())? {
                values.push(v);
            }
        }
        Ok(values)
    }

    /// Ratings of the own metric on the children that carry one.
    pub fn children_ratings(&self) -> Result<Vec<Rating>> {
        let mut ratings = Vec::new();
        for child in self.index.children(&self.component.uuid) {
            if let Some(r) = self.matrix.rating(&child.uuid, self.metric_key())? {
                ratings.push(r);
            }
        }
        Ok(ratings)
    }

    /// Text values of the own metric on the children that carry one.
    pub fn children_texts(&self) -> Result<Vec<String>> {
        let mut texts = Vec::new();
        for child in self.index.children(&self.component.uuid) {
            if let Some(t) = self.matrix.text(&child.uuid, self.metric_key())? {
                texts.push(t);
            }
        }
        Ok(texts)
    }

    /// Reviewed hotspots summed over children.
    ///
    /// A child without `status_key` falls back to its review percentage and
    /// hotspot count: `reviewed = percent * hotspots / (100 - percent)`.
    pub fn children_hotspots_reviewed(
        &self,
        status_key: &str,
        percent_key: &str,
        hotspots_key: &str,
    ) -> Result<u64> {
        let mut total = 0;
        for child in self.index.children(&self.component.uuid) {
            if let Some(reviewed) = self.matrix.number(&child.uuid, status_key)? {
                total += reviewed.max(0.0) as u64;
                continue;
            }
            let percent = self.matrix.number(&child.uuid, percent_key)?;
            let hotspots = self.matrix.number(&child.uuid, hotspots_key)?;
            if let (Some(percent), Some(hotspots)) = (percent, hotspots) {
                total += reviewed_from_percent(percent, hotspots);
            }
        }
        Ok(total)
    }

    /// Hotspots to review summed over children, falling back to a child's
    /// hotspot count when `status_key` is absent.
    pub fn children_hotspots_to_review(&self, status_key: &str, hotspots_key: &str) -> Result<u64> {
        let mut total = 0;
        for child in self.index.children(&self.component.uuid) {
            let value = match self.matrix.number(&child.uuid, status_key)? {
                Some(v) => Some(v),
                None => self.matrix.number(&child.uuid, hotspots_key)?,
            };
            total += value.map_or(0, |v| v.max(0.0) as u64);
        }
        Ok(total)
    }

    /// Write a number to the own metric.
    pub fn set_number(&mut self, value: f64) -> Result<()> {
        let key = self.metric_key();
        self.matrix.set_number(&self.component.uuid, key, value)
    }

    /// Write a count to the own metric.
    pub fn set_count(&mut self, count: u64) -> Result<()> {
        self.set_number(count as f64)
    }

    /// Write a rating to the own metric.
    pub fn set_rating(&mut self, rating: Rating) -> Result<()> {
        let key = self.metric_key();
        self.matrix.set_rating(&self.component.uuid, key, rating)
    }

    /// Write text to the own metric.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<()> {
        let key = self.metric_key();
        self.matrix.set_text(&self.component.uuid, key, text)
    }

    fn check_readable(&self, metric_key: &str) -> Result<()> {
        let declared = self.formula.dependencies.iter().any(|d| *d == metric_key);
        if metric_key == self.formula.metric_key || declared {
            Ok(())
        } else {
            Err(LiveMeasureError::UndeclaredDependency {
                metric_key: self.formula.metric_key.to_string(),
                dependency: metric_key.to_string(),
            })
        }
    }
}

fn reviewed_from_percent(percent: f64, hotspots: f64) -> u64 {
    if !(0.0..100.0).contains(&percent) || hotspots <= 0.0 {
        return 0;
    }
    (percent * hotspots / (100.0 - percent)).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::types::{MeasureValue, Metric, MetricType, PersistedMeasure, Qualifier};

    fn component(uuid: &str, ancestors: &[&str]) -> Component {
        Component {
            uuid: uuid.to_string(),
            key: uuid.to_string(),
            branch_uuid: "ROOT".to_string(),
            project_uuid: "P".to_string(),
            ancestors: ancestors.iter().map(|a| a.to_string()).collect(),
            qualifier: if ancestors.is_empty() {
                Qualifier::Project
            } else {
                Qualifier::File
            },
            is_branch_root: ancestors.is_empty(),
        }
    }

    fn fixture(measures: Vec<(&str, &str, MeasureValue)>) -> (ComponentIndex, MeasureMatrix) {
        let root = component("ROOT", &[]);
        let f1 = component("F1", &["ROOT"]);
        let f2 = component("F2", &["ROOT"]);
        let index = ComponentIndex::build(vec![root], vec![f1, f2]).unwrap();
        let matrix = MeasureMatrix::new(
            index.all_uuids().iter().cloned(),
            vec![
                Metric::new("count", MetricType::Int),
                Metric::new("rating", MetricType::Rating),
                Metric::new("impacts", MetricType::Data),
                Metric::new("other", MetricType::Int),
                Metric::new("status", MetricType::Int),
                Metric::new("percent", MetricType::Percent).with_scale(1),
                Metric::new("hotspots", MetricType::Int),
            ],
            measures.into_iter().map(|(c, m, v)| PersistedMeasure {
                component_uuid: c.to_string(),
                metric_key: m.to_string(),
                value: v,
            }),
        );
        (index, matrix)
    }

    fn noop(_: &mut FormulaContext<'_>, _: &IssueCounter) -> Result<()> {
        Ok(())
    }

    fn run_hierarchy(formula: &Formula, index: &ComponentIndex, matrix: &mut MeasureMatrix) -> Result<()> {
        let grid = DebtRatingGrid::default();
        let root = index.branch_root().clone();
        let mut ctx = FormulaContext::new(&root, formula, matrix, index, &grid);
        formula.aggregate(&mut ctx)
    }

    #[test]
    fn sum_children_adds_own_value() {
        let (index, mut matrix) = fixture(vec![
            ("ROOT", "count", MeasureValue::Number(1.0)),
            ("F1", "count", MeasureValue::Number(3.0)),
            ("F2", "count", MeasureValue::Number(5.0)),
        ]);
        let formula = Formula::new("count", HierarchyStep::SumChildren, noop);
        run_hierarchy(&formula, &index, &mut matrix).unwrap();
        assert_eq!(matrix.number("ROOT", "count").unwrap(), Some(9.0));
    }

    #[test]
    fn max_rating_children_keeps_worst() {
        let (index, mut matrix) = fixture(vec![
            ("ROOT", "rating", MeasureValue::Rating(Rating::B)),
            ("F1", "rating", MeasureValue::Rating(Rating::D)),
            ("F2", "rating", MeasureValue::Rating(Rating::A)),
        ]);
        let formula = Formula::new("rating", HierarchyStep::MaxRatingChildren, noop);
        run_hierarchy(&formula, &index, &mut matrix).unwrap();
        assert_eq!(matrix.rating("ROOT", "rating").unwrap(), Some(Rating::D));
    }

    #[test]
    fn max_rating_children_without_child_values_writes_nothing() {
        let (index, mut matrix) = fixture(vec![]);
        let formula = Formula::new("rating", HierarchyStep::MaxRatingChildren, noop);
        run_hierarchy(&formula, &index, &mut matrix).unwrap();
        assert_eq!(matrix.rating("ROOT", "rating").unwrap(), None);
    }

    #[test]
    fn impact_sum_children_merges_json() {
        let (index, mut matrix) = fixture(vec![
            ("F1", "impacts", MeasureValue::Text(r#"{"total":3,"HIGH":1,"LOW":2}"#.into())),
            ("F2", "impacts", MeasureValue::Text(r#"{"total":3,"MEDIUM":2,"LOW":1}"#.into())),
        ]);
        let formula = Formula::new("impacts", HierarchyStep::ImpactSumChildren, noop);
        run_hierarchy(&formula, &index, &mut matrix).unwrap();
        assert_eq!(
            matrix.text("ROOT", "impacts").unwrap().as_deref(),
            Some(r#"{"total":6,"BLOCKER":0,"HIGH":1,"MEDIUM":2,"LOW":3,"INFO":0}"#)
        );
    }

    #[test]
    fn undeclared_reads_are_rejected_and_wrapped() {
        let (index, mut matrix) = fixture(vec![]);
        let formula = Formula::new(
            "count",
            HierarchyStep::Custom(|ctx| {
                let other = ctx.value("other")?.unwrap_or(0.0);
                ctx.set_number(other)
            }),
            noop,
        );
        let err = run_hierarchy(&formula, &index, &mut matrix).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Fail to update measure count on component ROOT"
        );

        let declared = formula.depends_on(&["other"]);
        run_hierarchy(&declared, &index, &mut matrix).unwrap();
    }

    #[test]
    fn children_hotspots_fall_back_to_percent_and_count() {
        let (index, matrix) = fixture(vec![
            ("F1", "status", MeasureValue::Number(2.0)),
            ("F2", "percent", MeasureValue::Number(60.0)),
            ("F2", "hotspots", MeasureValue::Number(4.0)),
        ]);
        let mut matrix = matrix;
        let formula = Formula::new("status", HierarchyStep::SumChildren, noop);
        let grid = DebtRatingGrid::default();
        let root = index.branch_root().clone();
        let ctx = FormulaContext::new(&root, &formula, &mut matrix, &index, &grid);

        assert_eq!(
            ctx.children_hotspots_reviewed("status", "percent", "hotspots").unwrap(),
            8
        );
        assert_eq!(ctx.children_hotspots_to_review("status", "hotspots").unwrap(), 6);
    }

    #[test]
    fn reviewed_from_percent_guards_full_review() {
        assert_eq!(reviewed_from_percent(100.0, 3.0), 0);
        assert_eq!(reviewed_from_percent(50.0, 3.0), 3);
        assert_eq!(reviewed_from_percent(0.0, 3.0), 0);
    }

    #[test]
    fn should_compute_honours_leak_and_branch_flags() {
        let (index, matrix) = fixture(vec![("ROOT", "count", MeasureValue::Number(1.0))]);
        let root = index.branch_root();

        let leak = Formula::new("count", HierarchyStep::SumChildren, noop).leak();
        assert!(!leak.should_compute(false, &matrix, root).unwrap());
        assert!(leak.should_compute(true, &matrix, root).unwrap());

        let present = Formula::new("count", HierarchyStep::SumChildren, noop)
            .only_if_computed_on_branch();
        assert!(present.should_compute(false, &matrix, root).unwrap());
        let absent = Formula::new("other", HierarchyStep::SumChildren, noop)
            .only_if_computed_on_branch();
        assert!(!absent.should_compute(false, &matrix, root).unwrap());
    }
}
