//! Metric keys computed or consumed by the live measure engine, and the
//! default catalog describing their types and scales.

#![allow(missing_docs)]

use crate::live::types::{Metric, MetricType};

pub const CODE_SMELLS: &str = "code_smells";
pub const BUGS: &str = "bugs";
pub const VULNERABILITIES: &str = "vulnerabilities";
pub const PRIORITIZED_RULE_ISSUES: &str = "prioritized_rule_issues";
pub const SECURITY_HOTSPOTS: &str = "security_hotspots";

pub const RELIABILITY_ISSUES: &str = "reliability_issues";
pub const MAINTAINABILITY_ISSUES: &str = "maintainability_issues";
pub const SECURITY_ISSUES: &str = "security_issues";
pub const NEW_RELIABILITY_ISSUES: &str = "new_reliability_issues";
pub const NEW_MAINTAINABILITY_ISSUES: &str = "new_maintainability_issues";
pub const NEW_SECURITY_ISSUES: &str = "new_security_issues";

/// Metrics whose value is an impact count JSON object.
pub const IMPACT_METRICS: [&str; 6] = [
    RELIABILITY_ISSUES,
    MAINTAINABILITY_ISSUES,
    SECURITY_ISSUES,
    NEW_RELIABILITY_ISSUES,
    NEW_MAINTAINABILITY_ISSUES,
    NEW_SECURITY_ISSUES,
];

pub fn is_impact_metric(metric_key: &str) -> bool {
    IMPACT_METRICS.contains(&metric_key)
}

pub const VIOLATIONS: &str = "violations";
pub const BLOCKER_VIOLATIONS: &str = "blocker_violations";
pub const CRITICAL_VIOLATIONS: &str = "critical_violations";
pub const MAJOR_VIOLATIONS: &str = "major_violations";
pub const MINOR_VIOLATIONS: &str = "minor_violations";
pub const INFO_VIOLATIONS: &str = "info_violations";
pub const FALSE_POSITIVE_ISSUES: &str = "false_positive_issues";
pub const ACCEPTED_ISSUES: &str = "accepted_issues";
pub const HIGH_IMPACT_ACCEPTED_ISSUES: &str = "high_impact_accepted_issues";
pub const OPEN_ISSUES: &str = "open_issues";
pub const REOPENED_ISSUES: &str = "reopened_issues";
pub const CONFIRMED_ISSUES: &str = "confirmed_issues";

/// Maintainability remediation effort, historically named after SQALE.
pub const TECHNICAL_DEBT: &str = "sqale_index";
pub const RELIABILITY_REMEDIATION_EFFORT: &str = "reliability_remediation_effort";
pub const SECURITY_REMEDIATION_EFFORT: &str = "security_remediation_effort";
pub const SQALE_DEBT_RATIO: &str = "sqale_debt_ratio";
pub const SQALE_RATING: &str = "sqale_rating";
pub const EFFORT_TO_REACH_MAINTAINABILITY_RATING_A: &str =
    "effort_to_reach_maintainability_rating_a";
pub const RELIABILITY_RATING: &str = "reliability_rating";
pub const SECURITY_RATING: &str = "security_rating";

pub const SECURITY_HOTSPOTS_REVIEWED_STATUS: &str = "security_hotspots_reviewed_status";
pub const SECURITY_HOTSPOTS_TO_REVIEW_STATUS: &str = "security_hotspots_to_review_status";
pub const SECURITY_HOTSPOTS_REVIEWED: &str = "security_hotspots_reviewed";
pub const SECURITY_REVIEW_RATING: &str = "security_review_rating";

pub const NEW_CODE_SMELLS: &str = "new_code_smells";
pub const NEW_BUGS: &str = "new_bugs";
pub const NEW_VULNERABILITIES: &str = "new_vulnerabilities";
pub const NEW_SECURITY_HOTSPOTS: &str = "new_security_hotspots";
pub const NEW_VIOLATIONS: &str = "new_violations";
pub const NEW_BLOCKER_VIOLATIONS: &str = "new_blocker_violations";
pub const NEW_CRITICAL_VIOLATIONS: &str = "new_critical_violations";
pub const NEW_MAJOR_VIOLATIONS: &str = "new_major_violations";
pub const NEW_MINOR_VIOLATIONS: &str = "new_minor_violations";
pub const NEW_INFO_VIOLATIONS: &str = "new_info_violations";
pub const NEW_ACCEPTED_ISSUES: &str = "new_accepted_issues";
pub const NEW_TECHNICAL_DEBT: &str = "new_technical_debt";
pub const NEW_RELIABILITY_REMEDIATION_EFFORT: &str = "new_reliability_remediation_effort";
pub const NEW_SECURITY_REMEDIATION_EFFORT: &str = "new_security_remediation_effort";
pub const NEW_RELIABILITY_RATING: &str = "new_reliability_rating";
pub const NEW_SECURITY_RATING: &str = "new_security_rating";
pub const NEW_SECURITY_HOTSPOTS_REVIEWED_STATUS: &str = "new_security_hotspots_reviewed_status";
pub const NEW_SECURITY_HOTSPOTS_TO_REVIEW_STATUS: &str =
    "new_security_hotspots_to_review_status";
pub const NEW_SECURITY_HOTSPOTS_REVIEWED: &str = "new_security_hotspots_reviewed";
pub const NEW_SECURITY_REVIEW_RATING: &str = "new_security_review_rating";
pub const NEW_SQALE_DEBT_RATIO: &str = "new_sqale_debt_ratio";
pub const NEW_MAINTAINABILITY_RATING: &str = "new_maintainability_rating";

pub const SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT: &str =
    "software_quality_maintainability_remediation_effort";
pub const SOFTWARE_QUALITY_RELIABILITY_REMEDIATION_EFFORT: &str =
    "software_quality_reliability_remediation_effort";
pub const SOFTWARE_QUALITY_SECURITY_REMEDIATION_EFFORT: &str =
    "software_quality_security_remediation_effort";
pub const NEW_SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT: &str =
    "new_software_quality_maintainability_remediation_effort";
pub const NEW_SOFTWARE_QUALITY_RELIABILITY_REMEDIATION_EFFORT: &str =
    "new_software_quality_reliability_remediation_effort";
pub const NEW_SOFTWARE_QUALITY_SECURITY_REMEDIATION_EFFORT: &str =
    "new_software_quality_security_remediation_effort";
pub const SOFTWARE_QUALITY_MAINTAINABILITY_DEBT_RATIO: &str =
    "software_quality_maintainability_debt_ratio";
pub const NEW_SOFTWARE_QUALITY_MAINTAINABILITY_DEBT_RATIO: &str =
    "new_software_quality_maintainability_debt_ratio";
pub const SOFTWARE_QUALITY_MAINTAINABILITY_RATING: &str =
    "software_quality_maintainability_rating";
pub const NEW_SOFTWARE_QUALITY_MAINTAINABILITY_RATING: &str =
    "new_software_quality_maintainability_rating";
pub const EFFORT_TO_REACH_SOFTWARE_QUALITY_MAINTAINABILITY_RATING_A: &str =
    "effort_to_reach_software_quality_maintainability_rating_a";
pub const SOFTWARE_QUALITY_RELIABILITY_RATING: &str = "software_quality_reliability_rating";
pub const NEW_SOFTWARE_QUALITY_RELIABILITY_RATING: &str =
    "new_software_quality_reliability_rating";
pub const SOFTWARE_QUALITY_SECURITY_RATING: &str = "software_quality_security_rating";
pub const NEW_SOFTWARE_QUALITY_SECURITY_RATING: &str = "new_software_quality_security_rating";
pub const SOFTWARE_QUALITY_SECURITY_REVIEW_RATING: &str =
    "software_quality_security_review_rating";
pub const NEW_SOFTWARE_QUALITY_SECURITY_REVIEW_RATING: &str =
    "new_software_quality_security_review_rating";

/// Development cost computed by the analysis, stored as text.
pub const DEVELOPMENT_COST: &str = "development_cost";
/// Development cost of new code, stored as a number.
pub const NEW_DEVELOPMENT_COST: &str = "new_development_cost";

/// Reserved: overall quality gate status.
pub const ALERT_STATUS: &str = "alert_status";
/// Reserved: serialized quality gate evaluation.
pub const QUALITY_GATE_DETAILS: &str = "quality_gate_details";

/// Metric definitions for every key above.
pub fn default_metrics() -> Vec<Metric> {
    use MetricType::{Data, Float, Int, Level, Percent, Rating, String, WorkDur};

    let int = [
        CODE_SMELLS,
        BUGS,
        VULNERABILITIES,
        PRIORITIZED_RULE_ISSUES,
        SECURITY_HOTSPOTS,
        VIOLATIONS,
        BLOCKER_VIOLATIONS,
        CRITICAL_VIOLATIONS,
        MAJOR_VIOLATIONS,
        MINOR_VIOLATIONS,
        INFO_VIOLATIONS,
        FALSE_POSITIVE_ISSUES,
        ACCEPTED_ISSUES,
        HIGH_IMPACT_ACCEPTED_ISSUES,
        OPEN_ISSUES,
        REOPENED_ISSUES,
        CONFIRMED_ISSUES,
        SECURITY_HOTSPOTS_REVIEWED_STATUS,
        SECURITY_HOTSPOTS_TO_REVIEW_STATUS,
        NEW_CODE_SMELLS,
        NEW_BUGS,
        NEW_VULNERABILITIES,
        NEW_SECURITY_HOTSPOTS,
        NEW_VIOLATIONS,
        NEW_BLOCKER_VIOLATIONS,
        NEW_CRITICAL_VIOLATIONS,
        NEW_MAJOR_VIOLATIONS,
        NEW_MINOR_VIOLATIONS,
        NEW_INFO_VIOLATIONS,
        NEW_ACCEPTED_ISSUES,
        NEW_SECURITY_HOTSPOTS_REVIEWED_STATUS,
        NEW_SECURITY_HOTSPOTS_TO_REVIEW_STATUS,
    ];
    let work = [
        TECHNICAL_DEBT,
        RELIABILITY_REMEDIATION_EFFORT,
        SECURITY_REMEDIATION_EFFORT,
        EFFORT_TO_REACH_MAINTAINABILITY_RATING_A,
        NEW_TECHNICAL_DEBT,
        NEW_RELIABILITY_REMEDIATION_EFFORT,
        NEW_SECURITY_REMEDIATION_EFFORT,
        SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
        SOFTWARE_QUALITY_RELIABILITY_REMEDIATION_EFFORT,
        SOFTWARE_QUALITY_SECURITY_REMEDIATION_EFFORT,
        NEW_SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
        NEW_SOFTWARE_QUALITY_RELIABILITY_REMEDIATION_EFFORT,
        NEW_SOFTWARE_QUALITY_SECURITY_REMEDIATION_EFFORT,
        EFFORT_TO_REACH_SOFTWARE_QUALITY_MAINTAINABILITY_RATING_A,
    ];
    let percent = [
        SQALE_DEBT_RATIO,
        SECURITY_HOTSPOTS_REVIEWED,
        NEW_SECURITY_HOTSPOTS_REVIEWED,
        NEW_SQALE_DEBT_RATIO,
        SOFTWARE_QUALITY_MAINTAINABILITY_DEBT_RATIO,
        NEW_SOFTWARE_QUALITY_MAINTAINABILITY_DEBT_RATIO,
    ];
    let rating = [
        SQALE_RATING,
        RELIABILITY_RATING,
        SECURITY_RATING,
        SECURITY_REVIEW_RATING,
        NEW_RELIABILITY_RATING,
        NEW_SECURITY_RATING,
        NEW_SECURITY_REVIEW_RATING,
        NEW_MAINTAINABILITY_RATING,
        SOFTWARE_QUALITY_MAINTAINABILITY_RATING,
        NEW_SOFTWARE_QUALITY_MAINTAINABILITY_RATING,
        SOFTWARE_QUALITY_RELIABILITY_RATING,
        NEW_SOFTWARE_QUALITY_RELIABILITY_RATING,
        SOFTWARE_QUALITY_SECURITY_RATING,
        NEW_SOFTWARE_QUALITY_SECURITY_RATING,
        SOFTWARE_QUALITY_SECURITY_REVIEW_RATING,
        NEW_SOFTWARE_QUALITY_SECURITY_REVIEW_RATING,
    ];
    let data = [
        RELIABILITY_ISSUES,
        MAINTAINABILITY_ISSUES,
        SECURITY_ISSUES,
        NEW_RELIABILITY_ISSUES,
        NEW_MAINTAINABILITY_ISSUES,
        NEW_SECURITY_ISSUES,
        QUALITY_GATE_DETAILS,
    ];

    let mut metrics = Vec::new();
    metrics.extend(int.iter().map(|key| Metric::new(*key, Int)));
    metrics.extend(work.iter().map(|key| Metric::new(*key, WorkDur)));
    metrics.extend(percent.iter().map(|key| Metric::new(*key, Percent).with_scale(1)));
    metrics.extend(rating.iter().map(|key| Metric::new(*key, Rating)));
    metrics.extend(data.iter().map(|key| Metric::new(*key, Data)));
    metrics.push(Metric::new(DEVELOPMENT_COST, String));
    metrics.push(Metric::new(NEW_DEVELOPMENT_COST, Float));
    metrics.push(Metric::new(ALERT_STATUS, Level));
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_metrics_have_unique_keys() {
        let metrics = default_metrics();
        let keys: HashSet<_> = metrics.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys.len(), metrics.len());
    }

    #[test]
    fn leak_metrics_are_flagged() {
        let metrics = default_metrics();
        let new_bugs = metrics.iter().find(|m| m.key == NEW_BUGS).unwrap();
        assert!(new_bugs.on_leak);
        let ratio = metrics.iter().find(|m| m.key == SQALE_DEBT_RATIO).unwrap();
        assert!(!ratio.on_leak);
        assert_eq!(ratio.decimal_scale, Some(1));
    }
}
