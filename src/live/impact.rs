//! Serialized impact measures.
//!
//! An impact measure carries the number of unresolved issues per impact
//! severity plus their total, stored as a JSON text value such as
//! `{"total":6,"BLOCKER":0,"HIGH":1,"MEDIUM":2,"LOW":3,"INFO":0}`.

use serde::{Deserialize, Serialize};

use crate::core::errors::Result;
use crate::live::types::ImpactSeverity;

/// Per-severity breakdown of unresolved issues for one software quality
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactMeasure {
    /// Number of issues across all severities
    #[serde(default)]
    pub total: u64,
    /// Blocker issues
    #[serde(rename = "BLOCKER", default)]
    pub blocker: u64,
    /// High severity issues
    #[serde(rename = "HIGH", default)]
    pub high: u64,
    /// Medium severity issues
    #[serde(rename = "MEDIUM", default)]
    pub medium: u64,
    /// Low severity issues
    #[serde(rename = "LOW", default)]
    pub low: u64,
    /// Informational issues
    #[serde(rename = "INFO", default)]
    pub info: u64,
}

impl ImpactMeasure {
    /// Parse a stored impact measure.
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Record `count` issues of the given severity.
    pub fn add_severity(&mut self, severity: ImpactSeverity, count: u64) {
        *self.slot(severity) += count;
        self.total += count;
    }

    /// Count for one severity.
    pub fn count(&self, severity: ImpactSeverity) -> u64 {
        match severity {
            ImpactSeverity::Blocker => self.blocker,
            ImpactSeverity::High => self.high,
            ImpactSeverity::Medium => self.medium,
            ImpactSeverity::Low => self.low,
            ImpactSeverity::Info => self.info,
        }
    }

    /// Add another measure into this one.
    pub fn merge(&mut self, other: &ImpactMeasure) {
        for severity in ImpactSeverity::ALL {
            *self.slot(severity) += other.count(severity);
        }
        self.total += other.total;
    }

    /// JSON text form with a stable key order.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn slot(&mut self, severity: ImpactSeverity) -> &mut u64 {
        match severity {
            ImpactSeverity::Blocker => &mut self.blocker,
            ImpactSeverity::High => &mut self.high,
            ImpactSeverity::Medium => &mut self.medium,
            ImpactSeverity::Low => &mut self.low,
            ImpactSeverity::Info => &mut self.info,
        }
    }
}
