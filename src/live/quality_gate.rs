//! Quality gate loading and evaluation.
//!
//! A gate is evaluated on the branch root once both passes are done. The
//! outcome is written back into the matrix under two reserved metrics, so
//! it is persisted with the rest of the changed measures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::errors::{LiveMeasureError, Result};
use crate::core::rating::Rating;
use crate::io::store::StoreSession;
use crate::live::measure_matrix::MeasureMatrix;
use crate::live::metrics::{ALERT_STATUS, QUALITY_GATE_DETAILS};
use crate::live::types::{Branch, Component, MeasureValue, Metric, MetricType};

/// Comparison applied between a measure and a condition threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Fails when the value is greater than the threshold
    #[serde(rename = "GT")]
    GreaterThan,
    /// Fails when the value is lower than the threshold
    #[serde(rename = "LT")]
    LessThan,
    /// Fails when the value equals the threshold
    #[serde(rename = "EQ")]
    Equals,
    /// Fails when the value differs from the threshold
    #[serde(rename = "NE")]
    NotEquals,
}

impl Operator {
    /// Wire code of the operator.
    pub fn code(self) -> &'static str {
        match self {
            Operator::GreaterThan => "GT",
            Operator::LessThan => "LT",
            Operator::Equals => "EQ",
            Operator::NotEquals => "NE",
        }
    }

    fn fails<T: PartialOrd>(self, value: T, threshold: T) -> bool {
        match self {
            Operator::GreaterThan => value > threshold,
            Operator::LessThan => value < threshold,
            Operator::Equals => value == threshold,
            Operator::NotEquals => value != threshold,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One gate condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Metric the condition applies to
    pub metric_key: String,
    /// Comparison operator
    pub operator: Operator,
    /// Threshold, kept as text the way gates are stored
    pub error_threshold: String,
}

impl Condition {
    /// Build a condition.
    pub fn new(
        metric_key: impl Into<String>,
        operator: Operator,
        error_threshold: impl Into<String>,
    ) -> Self {
        Self {
            metric_key: metric_key.into(),
            operator,
            error_threshold: error_threshold.into(),
        }
    }
}

/// A named pass/fail policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityGate {
    /// Gate id
    pub uuid: String,
    /// Display name
    pub name: String,
    /// Conditions, all of which must pass
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl QualityGate {
    /// Metric keys referenced by the conditions, without duplicates.
    pub fn metric_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .conditions
            .iter()
            .map(|c| c.metric_key.clone())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

/// Outcome of a gate or of a single condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityGateStatus {
    /// Passed
    Ok,
    /// Failed
    Error,
}

impl QualityGateStatus {
    /// Stored level text.
    pub fn as_str(self) -> &'static str {
        match self {
            QualityGateStatus::Ok => "OK",
            QualityGateStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for QualityGateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityGateStatus {
    type Err = LiveMeasureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "OK" => Ok(QualityGateStatus::Ok),
            "ERROR" => Ok(QualityGateStatus::Error),
            other => Err(LiveMeasureError::validation(format!(
                "Unknown quality gate level '{other}'"
            ))),
        }
    }
}

/// A condition together with the value it was checked against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedCondition {
    /// Evaluated condition
    pub condition: Condition,
    /// Condition outcome
    pub status: QualityGateStatus,
    /// Measure value used, absent when the component has none
    pub actual: Option<String>,
}

/// Gate outcome for one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedQualityGate {
    /// Evaluated gate
    pub gate: QualityGate,
    /// Overall outcome
    pub status: QualityGateStatus,
    /// Per-condition outcomes in gate order
    pub conditions: Vec<EvaluatedCondition>,
}

impl EvaluatedQualityGate {
    /// JSON stored under `quality_gate_details`.
    pub fn details_json(&self) -> Result<String> {
        let details = Details {
            level: self.status,
            conditions: self
                .conditions
                .iter()
                .map(|c| DetailCondition {
                    metric: &c.condition.metric_key,
                    op: c.condition.operator,
                    error: &c.condition.error_threshold,
                    actual: c.actual.as_deref(),
                    level: c.status,
                })
                .collect(),
        };
        Ok(serde_json::to_string(&details)?)
    }
}

#[derive(Serialize)]
struct Details<'a> {
    level: QualityGateStatus,
    conditions: Vec<DetailCondition<'a>>,
}

#[derive(Serialize)]
struct DetailCondition<'a> {
    metric: &'a str,
    op: Operator,
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual: Option<&'a str>,
    level: QualityGateStatus,
}

/// Check one condition against a measure value of `metric`.
pub fn evaluate_condition(
    metric: &Metric,
    condition: &Condition,
    value: Option<&MeasureValue>,
) -> Result<EvaluatedCondition> {
    let Some(number) = value.and_then(MeasureValue::as_number) else {
        return Ok(EvaluatedCondition {
            condition: condition.clone(),
            status: QualityGateStatus::Ok,
            actual: None,
        });
    };

    let (failed, actual) = if metric.value_type.compares_as_integer() {
        let threshold = integer_threshold(metric, &condition.error_threshold)?;
        let value = number.trunc() as i64;
        (condition.operator.fails(value, threshold), value.to_string())
    } else {
        let threshold: f64 = condition.error_threshold.trim().parse().map_err(|_| {
            invalid_threshold(metric, &condition.error_threshold)
        })?;
        (condition.operator.fails(number, threshold), number.to_string())
    };

    Ok(EvaluatedCondition {
        condition: condition.clone(),
        status: if failed {
            QualityGateStatus::Error
        } else {
            QualityGateStatus::Ok
        },
        actual: Some(actual),
    })
}

fn integer_threshold(metric: &Metric, threshold: &str) -> Result<i64> {
    let trimmed = threshold.trim();
    if let Ok(number) = trimmed.parse::<f64>() {
        return Ok(number.trunc() as i64);
    }
    if metric.value_type == MetricType::Rating {
        if let Ok(rating) = trimmed.parse::<Rating>() {
            return Ok(i64::from(rating.index()));
        }
    }
    Err(invalid_threshold(metric, threshold))
}

fn invalid_threshold(metric: &Metric, threshold: &str) -> LiveMeasureError {
    LiveMeasureError::integrity(format!(
        "Invalid threshold '{}' for metric {}",
        threshold, metric.key
    ))
}

/// Loads and evaluates the gate of a branch
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityGateComputer;

impl QualityGateComputer {
    /// Create a computer.
    pub fn new() -> Self {
        Self
    }

    /// Effective gate of the branch's project.
    ///
    /// Pull requests only keep conditions on new code metrics.
    pub async fn load_gate(&self, session: &dyn StoreSession, branch: &Branch) -> Result<QualityGate> {
        let mut gate = session
            .select_quality_gate(&branch.project_uuid)
            .await?
            .ok_or_else(|| {
                LiveMeasureError::integrity(format!(
                    "No quality gate found for project {}",
                    branch.project_uuid
                ))
            })?;

        let keys = gate.metric_keys();
        let metrics = session.select_metrics(&keys).await?;
        for key in &keys {
            let metric = metrics.iter().find(|m| &m.key == key).ok_or_else(|| {
                LiveMeasureError::integrity(format!(
                    "Quality gate {} references unknown metric {}",
                    gate.name, key
                ))
            })?;
            if !metric.value_type.is_numeric() {
                return Err(LiveMeasureError::integrity(format!(
                    "Metric {} of quality gate {} is not numeric",
                    key, gate.name
                )));
            }
        }

        if branch.is_pull_request() {
            let before = gate.conditions.len();
            gate.conditions.retain(|c| {
                metrics
                    .iter()
                    .any(|m| m.key == c.metric_key && m.on_leak)
            });
            debug!(
                "Pull request {} keeps {} of {} gate conditions",
                branch.key,
                gate.conditions.len(),
                before
            );
        }
        Ok(gate)
    }

    /// Status currently stored on a component, if it parses.
    pub fn previous_status(
        &self,
        component: &Component,
        matrix: &MeasureMatrix,
    ) -> Result<Option<QualityGateStatus>> {
        Ok(matrix
            .text(&component.uuid, ALERT_STATUS)?
            .and_then(|level| level.parse().ok()))
    }

    /// Evaluate `gate` on `component` and store the outcome in the matrix.
    pub fn evaluate(
        &self,
        component: &Component,
        gate: &QualityGate,
        matrix: &mut MeasureMatrix,
    ) -> Result<EvaluatedQualityGate> {
        let mut conditions = Vec::with_capacity(gate.conditions.len());
        for condition in &gate.conditions {
            let metric = matrix.metric(&condition.metric_key)?;
            let value = matrix.get(&component.uuid, &condition.metric_key)?;
            conditions.push(evaluate_condition(metric, condition, value)?);
        }

        let status = if conditions
            .iter()
            .any(|c| c.status == QualityGateStatus::Error)
        {
            QualityGateStatus::Error
        } else {
            QualityGateStatus::Ok
        };
        let evaluated = EvaluatedQualityGate {
            gate: gate.clone(),
            status,
            conditions,
        };

        matrix.set_text(&component.uuid, ALERT_STATUS, status.as_str())?;
        matrix.set_text(&component.uuid, QUALITY_GATE_DETAILS, evaluated.details_json()?)?;
        Ok(evaluated)
    }
}
