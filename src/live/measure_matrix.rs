//! Sparse component × metric table with change tracking.
//!
//! Cells are seeded from persisted measures and remember the value they were
//! loaded with. [`MeasureMatrix::changed`] diffs live values against that
//! snapshot, so overwriting a cell several times only persists the net effect.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::core::errors::{LiveMeasureError, Result};
use crate::core::rating::Rating;
use crate::live::impact::ImpactMeasure;
use crate::live::metrics::is_impact_metric;
use crate::live::types::{ChangedMeasure, MeasureValue, Metric, PersistedMeasure};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct CellKey {
    component_uuid: String,
    metric_key: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct MeasureCell {
    initial: Option<MeasureValue>,
    value: Option<MeasureValue>,
}

impl MeasureCell {
    fn is_changed(&self) -> bool {
        self.initial != self.value
    }
}

/// In-memory measures of the loaded subtree
#[derive(Debug, Clone)]
pub struct MeasureMatrix {
    metrics: HashMap<String, Metric>,
    components: HashSet<String>,
    cells: HashMap<CellKey, MeasureCell>,
}

impl MeasureMatrix {
    /// Build the matrix from the components in scope, the registered metrics
    /// and previously persisted measures.
    pub fn new(
        component_uuids: impl IntoIterator<Item = String>,
        metrics: impl IntoIterator<Item = Metric>,
        measures: impl IntoIterator<Item = PersistedMeasure>,
    ) -> Self {
        let metrics: HashMap<String, Metric> =
            metrics.into_iter().map(|m| (m.key.clone(), m)).collect();
        let components: HashSet<String> = component_uuids.into_iter().collect();

        let mut cells = HashMap::new();
        let mut ignored = 0usize;
        for measure in measures {
            let Some(metric) = metrics.get(&measure.metric_key) else {
                ignored += 1;
                continue;
            };
            if !components.contains(&measure.component_uuid) {
                ignored += 1;
                continue;
            }
            let value = canonical_impact(
                &measure.metric_key,
                measure.value.normalize(metric.value_type),
            );
            cells.insert(
                CellKey {
                    component_uuid: measure.component_uuid,
                    metric_key: measure.metric_key,
                },
                MeasureCell {
                    initial: Some(value.clone()),
                    value: Some(value),
                },
            );
        }
        if ignored > 0 {
            debug!("Ignored {} persisted measures outside the matrix scope", ignored);
        }

        Self {
            metrics,
            components,
            cells,
        }
    }

    /// Registered metric definition.
    pub fn metric(&self, metric_key: &str) -> Result<&Metric> {
        self.metrics
            .get(metric_key)
            .ok_or_else(|| LiveMeasureError::unknown_metric(metric_key))
    }

    /// Whether a metric key was registered.
    pub fn has_metric(&self, metric_key: &str) -> bool {
        self.metrics.contains_key(metric_key)
    }

    /// Current value of a cell.
    pub fn get(&self, component_uuid: &str, metric_key: &str) -> Result<Option<&MeasureValue>> {
        self.metric(metric_key)?;
        Ok(self.lookup(component_uuid, metric_key))
    }

    /// Numeric view of a cell; ratings read as their ordinal.
    pub fn number(&self, component_uuid: &str, metric_key: &str) -> Result<Option<f64>> {
        Ok(self
            .get(component_uuid, metric_key)?
            .and_then(MeasureValue::as_number))
    }

    /// Text view of a cell.
    pub fn text(&self, component_uuid: &str, metric_key: &str) -> Result<Option<String>> {
        Ok(self.get(component_uuid, metric_key)?.map(|value| match value {
            MeasureValue::Text(text) => text.clone(),
            MeasureValue::Number(number) => number.to_string(),
            MeasureValue::Rating(rating) => rating.to_string(),
        }))
    }

    /// Rating view of a cell.
    pub fn rating(&self, component_uuid: &str, metric_key: &str) -> Result<Option<Rating>> {
        Ok(self
            .get(component_uuid, metric_key)?
            .and_then(MeasureValue::as_rating))
    }

    /// Whether a cell currently holds a value.
    pub fn has_value(&self, component_uuid: &str, metric_key: &str) -> Result<bool> {
        Ok(self.get(component_uuid, metric_key)?.is_some())
    }

    /// Store a number, rounded half-up to the metric's decimal scale.
    pub fn set_number(&mut self, component_uuid: &str, metric_key: &str, value: f64) -> Result<()> {
        let scale = self.metric(metric_key)?.decimal_scale;
        let value = match scale {
            Some(scale) => round_to_scale(value, scale),
            None => value,
        };
        self.write(component_uuid, metric_key, Some(MeasureValue::Number(value)))
    }

    /// Store a rating.
    pub fn set_rating(&mut self, component_uuid: &str, metric_key: &str, rating: Rating) -> Result<()> {
        self.metric(metric_key)?;
        self.write(component_uuid, metric_key, Some(MeasureValue::Rating(rating)))
    }

    /// Store a text value.
    pub fn set_text(
        &mut self,
        component_uuid: &str,
        metric_key: &str,
        text: impl Into<String>,
    ) -> Result<()> {
        self.metric(metric_key)?;
        self.write(component_uuid, metric_key, Some(MeasureValue::Text(text.into())))
    }

    /// Cells whose value differs from the loaded one, ordered by
    /// component then metric.
    pub fn changed(&self) -> Vec<ChangedMeasure> {
        let mut changed: Vec<(&CellKey, &MeasureCell)> = self
            .cells
            .iter()
            .filter(|(_, cell)| cell.is_changed())
            .collect();
        changed.sort_by(|(a, _), (b, _)| a.cmp(b));
        changed
            .into_iter()
            .map(|(key, cell)| ChangedMeasure {
                component_uuid: key.component_uuid.clone(),
                metric_key: key.metric_key.clone(),
                value: cell.value.clone(),
            })
            .collect()
    }

    fn lookup(&self, component_uuid: &str, metric_key: &str) -> Option<&MeasureValue> {
        // CellKey owns its strings; lookups allocate a probe key
        let key = CellKey {
            component_uuid: component_uuid.to_string(),
            metric_key: metric_key.to_string(),
        };
        self.cells.get(&key).and_then(|cell| cell.value.as_ref())
    }

    fn write(
        &mut self,
        component_uuid: &str,
        metric_key: &str,
        value: Option<MeasureValue>,
    ) -> Result<()> {
        if !self.components.contains(component_uuid) {
            return Err(LiveMeasureError::integrity(format!(
                "Component {component_uuid} is not part of the loaded subtree"
            )));
        }
        let key = CellKey {
            component_uuid: component_uuid.to_string(),
            metric_key: metric_key.to_string(),
        };
        self.cells.entry(key).or_default().value = value;
        Ok(())
    }
}

/// Impact JSON rewritten in the key order formulas write it; anything else,
/// including unparsable text, is returned as is.
fn canonical_impact(metric_key: &str, value: MeasureValue) -> MeasureValue {
    if !is_impact_metric(metric_key) {
        return value;
    }
    let MeasureValue::Text(json) = &value else {
        return value;
    };
    match ImpactMeasure::parse(json).and_then(|impact| impact.to_json()) {
        Ok(canonical) => MeasureValue::Text(canonical),
        Err(_) => value,
    }
}

/// Round half away from zero to `scale` decimals, working from the shortest
/// decimal representation of `value` so 0.125 rounds to 0.13.
pub fn round_to_scale(value: f64, scale: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let decimal = Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value));
    decimal
        .map(|d| d.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_string().parse::<f64>().ok())
        .unwrap_or(value)
}
