//! Per-component aggregation of grouped issue counts.
//!
//! The counter consumes the pre-grouped rows of one component and answers
//! lookups by rule type, severity, status, resolution and software quality.
//! Every accumulator keeps an absolute part and a new code (leak) part;
//! unseen keys read as zero.

use std::collections::HashMap;

use crate::live::impact::ImpactMeasure;
use crate::live::types::{
    ComponentIssueGroups, ImpactGroup, ImpactSeverity, ImpactSeverityGroup, IssueGroup,
    IssueStatus, Resolution, RuleType, Severity, SoftwareQuality,
};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Count {
    absolute: u64,
    leak: u64,
}

impl Count {
    fn add(&mut self, count: u64, in_leak: bool) {
        self.absolute += count;
        if in_leak {
            self.leak += count;
        }
    }

    fn get(&self, only_in_leak: bool) -> u64 {
        if only_in_leak {
            self.leak
        } else {
            self.absolute
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Effort {
    absolute: f64,
    leak: f64,
}

impl Effort {
    fn add(&mut self, effort: f64, in_leak: bool) {
        self.absolute += effort;
        if in_leak {
            self.leak += effort;
        }
    }

    fn get(&self, only_in_leak: bool) -> f64 {
        if only_in_leak {
            self.leak
        } else {
            self.absolute
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HighestSeverity<S> {
    absolute: Option<S>,
    leak: Option<S>,
}

impl<S> Default for HighestSeverity<S> {
    fn default() -> Self {
        Self {
            absolute: None,
            leak: None,
        }
    }
}

impl<S: Ord + Copy> HighestSeverity<S> {
    fn add(&mut self, severity: S, in_leak: bool) {
        self.absolute = self.absolute.max(Some(severity));
        if in_leak {
            self.leak = self.leak.max(Some(severity));
        }
    }

    fn get(&self, only_in_leak: bool) -> Option<S> {
        if only_in_leak {
            self.leak
        } else {
            self.absolute
        }
    }
}

/// Lookups over the grouped issues of one component
#[derive(Debug, Clone, Default)]
pub struct IssueCounter {
    unresolved: Count,
    unresolved_by_type: HashMap<RuleType, Count>,
    unresolved_by_severity: HashMap<Severity, Count>,
    by_resolution: HashMap<Resolution, Count>,
    by_status: HashMap<IssueStatus, Count>,
    hotspots_by_status: HashMap<IssueStatus, Count>,
    effort_of_unresolved: HashMap<RuleType, Effort>,
    highest_severity_of_unresolved: HashMap<RuleType, HighestSeverity<Severity>>,
    prioritized_rule_issues: Count,
    impacts: HashMap<(SoftwareQuality, ImpactSeverity), Count>,
    effort_by_quality: HashMap<SoftwareQuality, Effort>,
    highest_impact_severity: HashMap<SoftwareQuality, HighestSeverity<ImpactSeverity>>,
    high_impact_accepted: Count,
}

impl IssueCounter {
    /// Build the counter from the three grouped collections of a component.
    pub fn new(groups: &ComponentIssueGroups) -> Self {
        Self::from_groups(
            &groups.issue_groups,
            &groups.impact_groups,
            &groups.impact_severity_groups,
        )
    }

    /// Build the counter from explicit collections.
    pub fn from_groups(
        issue_groups: &[IssueGroup],
        impact_groups: &[ImpactGroup],
        impact_severity_groups: &[ImpactSeverityGroup],
    ) -> Self {
        let mut counter = Self::default();
        for group in issue_groups {
            if group.rule_type == RuleType::SecurityHotspot {
                counter.add_hotspot_group(group);
            } else {
                counter.add_issue_group(group);
            }
        }
        for group in impact_groups {
            counter.add_impact_group(group);
        }
        for group in impact_severity_groups {
            counter.add_impact_severity_group(group);
        }
        counter
    }

    fn add_issue_group(&mut self, group: &IssueGroup) {
        let (count, in_leak) = (group.count, group.in_leak);
        match group.resolution {
            None => {
                self.unresolved.add(count, in_leak);
                self.unresolved_by_type
                    .entry(group.rule_type)
                    .or_default()
                    .add(count, in_leak);
                self.unresolved_by_severity
                    .entry(group.severity)
                    .or_default()
                    .add(count, in_leak);
                self.effort_of_unresolved
                    .entry(group.rule_type)
                    .or_default()
                    .add(group.effort, in_leak);
                self.highest_severity_of_unresolved
                    .entry(group.rule_type)
                    .or_default()
                    .add(group.severity, in_leak);
                self.prioritized_rule_issues
                    .add(group.prioritized_rule_count, in_leak);
            }
            Some(resolution) => {
                self.by_resolution
                    .entry(resolution)
                    .or_default()
                    .add(count, in_leak);
            }
        }
        self.by_status
            .entry(group.status)
            .or_default()
            .add(count, in_leak);
    }

    fn add_hotspot_group(&mut self, group: &IssueGroup) {
        if group.resolution.is_none() {
            self.unresolved_by_type
                .entry(RuleType::SecurityHotspot)
                .or_default()
                .add(group.count, group.in_leak);
        }
        self.hotspots_by_status
            .entry(group.status)
            .or_default()
            .add(group.count, group.in_leak);
    }

    fn add_impact_group(&mut self, group: &ImpactGroup) {
        if group.resolution.is_some() {
            return;
        }
        self.impacts
            .entry((group.software_quality, group.severity))
            .or_default()
            .add(group.count, group.in_leak);
        self.effort_by_quality
            .entry(group.software_quality)
            .or_default()
            .add(group.effort, group.in_leak);
        self.highest_impact_severity
            .entry(group.software_quality)
            .or_default()
            .add(group.severity, group.in_leak);
    }

    fn add_impact_severity_group(&mut self, group: &ImpactSeverityGroup) {
        let high = matches!(
            group.severity,
            ImpactSeverity::High | ImpactSeverity::Blocker
        );
        if high && group.resolution == Some(Resolution::WontFix) {
            self.high_impact_accepted.add(group.count, group.in_leak);
        }
    }

    /// Unresolved issues excluding hotspots.
    pub fn count_unresolved(&self, only_in_leak: bool) -> u64 {
        self.unresolved.get(only_in_leak)
    }

    /// Unresolved issues of a rule type (hotspots included for their type).
    pub fn count_unresolved_by_type(&self, rule_type: RuleType, only_in_leak: bool) -> u64 {
        self.unresolved_by_type
            .get(&rule_type)
            .map_or(0, |c| c.get(only_in_leak))
    }

    /// Unresolved issues of a severity.
    pub fn count_unresolved_by_severity(&self, severity: Severity, only_in_leak: bool) -> u64 {
        self.unresolved_by_severity
            .get(&severity)
            .map_or(0, |c| c.get(only_in_leak))
    }

    /// Resolved issues with the given resolution.
    pub fn count_by_resolution(&self, resolution: Resolution, only_in_leak: bool) -> u64 {
        self.by_resolution
            .get(&resolution)
            .map_or(0, |c| c.get(only_in_leak))
    }

    /// Issues (not hotspots) in a workflow status.
    pub fn count_by_status(&self, status: IssueStatus, only_in_leak: bool) -> u64 {
        self.by_status
            .get(&status)
            .map_or(0, |c| c.get(only_in_leak))
    }

    /// Hotspots in a review status.
    pub fn count_hotspots_by_status(&self, status: IssueStatus, only_in_leak: bool) -> u64 {
        self.hotspots_by_status
            .get(&status)
            .map_or(0, |c| c.get(only_in_leak))
    }

    /// Unresolved issues raised by prioritized rules.
    pub fn count_prioritized_rule_issues(&self, only_in_leak: bool) -> u64 {
        self.prioritized_rule_issues.get(only_in_leak)
    }

    /// Accepted issues whose highest impact severity is high or blocker.
    pub fn count_high_impact_accepted(&self, only_in_leak: bool) -> u64 {
        self.high_impact_accepted.get(only_in_leak)
    }

    /// Remediation effort of unresolved issues of a rule type.
    pub fn effort_of_unresolved(&self, rule_type: RuleType, only_in_leak: bool) -> f64 {
        self.effort_of_unresolved
            .get(&rule_type)
            .map_or(0.0, |e| e.get(only_in_leak))
    }

    /// Highest severity among unresolved issues of a rule type.
    pub fn highest_severity_of_unresolved(
        &self,
        rule_type: RuleType,
        only_in_leak: bool,
    ) -> Option<Severity> {
        self.highest_severity_of_unresolved
            .get(&rule_type)
            .and_then(|h| h.get(only_in_leak))
    }

    /// Per-severity breakdown of unresolved impacts on a software quality.
    pub fn impact_measure(&self, quality: SoftwareQuality, only_in_leak: bool) -> ImpactMeasure {
        let mut measure = ImpactMeasure::default();
        for severity in ImpactSeverity::ALL {
            let count = self
                .impacts
                .get(&(quality, severity))
                .map_or(0, |c| c.get(only_in_leak));
            measure.add_severity(severity, count);
        }
        measure
    }

    /// Remediation effort of unresolved impacts on a software quality.
    pub fn effort_of_unresolved_by_quality(
        &self,
        quality: SoftwareQuality,
        only_in_leak: bool,
    ) -> f64 {
        self.effort_by_quality
            .get(&quality)
            .map_or(0.0, |e| e.get(only_in_leak))
    }

    /// Highest impact severity among unresolved impacts on a software quality.
    pub fn highest_impact_severity_of_unresolved(
        &self,
        quality: SoftwareQuality,
        only_in_leak: bool,
    ) -> Option<ImpactSeverity> {
        self.highest_impact_severity
            .get(&quality)
            .and_then(|h| h.get(only_in_leak))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(rule_type: RuleType, severity: Severity, count: u64) -> IssueGroup {
        IssueGroup {
            rule_type,
            severity,
            status: IssueStatus::Open,
            resolution: None,
            count,
            effort: 0.0,
            in_leak: false,
            prioritized_rule_count: 0,
        }
    }

    fn impact(quality: SoftwareQuality, severity: ImpactSeverity, count: u64) -> ImpactGroup {
        ImpactGroup {
            software_quality: quality,
            severity,
            status: IssueStatus::Open,
            resolution: None,
            count,
            effort: 0.0,
            in_leak: false,
        }
    }

    #[test]
    fn empty_counter_reads_zero() {
        let counter = IssueCounter::new(&ComponentIssueGroups::default());
        assert_eq!(counter.count_unresolved(false), 0);
        assert_eq!(counter.count_unresolved_by_type(RuleType::Bug, true), 0);
        assert_eq!(counter.effort_of_unresolved(RuleType::CodeSmell, false), 0.0);
        assert_eq!(
            counter.highest_severity_of_unresolved(RuleType::Bug, false),
            None
        );
        assert_eq!(
            counter.impact_measure(SoftwareQuality::Security, false),
            ImpactMeasure::default()
        );
    }

    #[test]
    fn counts_unresolved_by_severity_excluding_resolved_and_hotspots() {
        let mut resolved = group(RuleType::Bug, Severity::Major, 7);
        resolved.resolution = Some(Resolution::Fixed);
        let groups = vec![
            group(RuleType::Vulnerability, Severity::Blocker, 11),
            group(RuleType::Bug, Severity::Blocker, 13),
            group(RuleType::Bug, Severity::Major, 17),
            resolved,
            group(RuleType::SecurityHotspot, Severity::Major, 3),
        ];
        let counter = IssueCounter::from_groups(&groups, &[], &[]);

        assert_eq!(counter.count_unresolved_by_severity(Severity::Blocker, false), 24);
        assert_eq!(counter.count_unresolved_by_severity(Severity::Major, false), 17);
        assert_eq!(counter.count_unresolved_by_severity(Severity::Critical, false), 0);
        assert_eq!(counter.count_unresolved(false), 41);
        assert_eq!(
            counter.count_unresolved_by_type(RuleType::SecurityHotspot, false),
            3
        );
    }

    #[test]
    fn counts_by_resolution_and_status() {
        let mut fp = group(RuleType::Bug, Severity::Major, 5);
        fp.resolution = Some(Resolution::FalsePositive);
        fp.status = IssueStatus::Resolved;
        let mut wontfix = group(RuleType::CodeSmell, Severity::Minor, 7);
        wontfix.resolution = Some(Resolution::WontFix);
        wontfix.status = IssueStatus::Resolved;
        let mut confirmed = group(RuleType::Bug, Severity::Major, 3);
        confirmed.status = IssueStatus::Confirmed;
        let mut reopened = group(RuleType::Bug, Severity::Major, 2);
        reopened.status = IssueStatus::Reopened;
        let mut hotspot = group(RuleType::SecurityHotspot, Severity::Major, 4);
        hotspot.resolution = Some(Resolution::WontFix);

        let counter =
            IssueCounter::from_groups(&[fp, wontfix, confirmed, reopened, hotspot], &[], &[]);

        assert_eq!(counter.count_by_resolution(Resolution::FalsePositive, false), 5);
        assert_eq!(counter.count_by_resolution(Resolution::WontFix, false), 7);
        assert_eq!(counter.count_by_status(IssueStatus::Confirmed, false), 3);
        assert_eq!(counter.count_by_status(IssueStatus::Reopened, false), 2);
        assert_eq!(counter.count_by_status(IssueStatus::Open, false), 0);
    }

    #[test]
    fn leak_counts_are_a_subset_of_absolute() {
        let mut leak = group(RuleType::Bug, Severity::Critical, 2);
        leak.in_leak = true;
        leak.effort = 20.0;
        let mut old = group(RuleType::Bug, Severity::Blocker, 3);
        old.effort = 30.0;

        let counter = IssueCounter::from_groups(&[leak, old], &[], &[]);

        assert_eq!(counter.count_unresolved_by_type(RuleType::Bug, false), 5);
        assert_eq!(counter.count_unresolved_by_type(RuleType::Bug, true), 2);
        assert_eq!(counter.effort_of_unresolved(RuleType::Bug, false), 50.0);
        assert_eq!(counter.effort_of_unresolved(RuleType::Bug, true), 20.0);
        assert_eq!(
            counter.highest_severity_of_unresolved(RuleType::Bug, false),
            Some(Severity::Blocker)
        );
        assert_eq!(
            counter.highest_severity_of_unresolved(RuleType::Bug, true),
            Some(Severity::Critical)
        );
    }

    #[test]
    fn hotspots_are_counted_by_review_status() {
        let mut to_review = group(RuleType::SecurityHotspot, Severity::Major, 4);
        to_review.status = IssueStatus::ToReview;
        let mut reviewed = group(RuleType::SecurityHotspot, Severity::Major, 1);
        reviewed.status = IssueStatus::Reviewed;
        reviewed.resolution = Some(Resolution::Fixed);
        reviewed.in_leak = true;

        let counter = IssueCounter::from_groups(&[to_review, reviewed], &[], &[]);

        assert_eq!(counter.count_hotspots_by_status(IssueStatus::ToReview, false), 4);
        assert_eq!(counter.count_hotspots_by_status(IssueStatus::Reviewed, false), 1);
        assert_eq!(counter.count_hotspots_by_status(IssueStatus::Reviewed, true), 1);
        assert_eq!(counter.count_by_status(IssueStatus::ToReview, false), 0);
        assert_eq!(counter.count_unresolved(false), 0);
    }

    #[test]
    fn prioritized_rule_issues_are_summed() {
        let mut first = group(RuleType::Bug, Severity::Major, 3);
        first.prioritized_rule_count = 1;
        let mut second = group(RuleType::CodeSmell, Severity::Minor, 6);
        second.prioritized_rule_count = 4;

        let counter = IssueCounter::from_groups(&[first, second], &[], &[]);
        assert_eq!(counter.count_prioritized_rule_issues(false), 5);
    }

    #[test]
    fn impacts_are_aggregated_per_quality() {
        let mut resolved = impact(SoftwareQuality::Reliability, ImpactSeverity::High, 9);
        resolved.resolution = Some(Resolution::FalsePositive);
        let mut leak = impact(SoftwareQuality::Reliability, ImpactSeverity::Low, 3);
        leak.in_leak = true;
        leak.effort = 15.0;
        let impacts = vec![
            impact(SoftwareQuality::Reliability, ImpactSeverity::High, 1),
            impact(SoftwareQuality::Reliability, ImpactSeverity::Medium, 2),
            leak,
            resolved,
            impact(SoftwareQuality::Security, ImpactSeverity::Blocker, 1),
        ];
        let counter = IssueCounter::from_groups(&[], &impacts, &[]);

        let reliability = counter.impact_measure(SoftwareQuality::Reliability, false);
        assert_eq!(reliability.total, 6);
        assert_eq!(reliability.high, 1);
        assert_eq!(reliability.medium, 2);
        assert_eq!(reliability.low, 3);
        assert_eq!(
            counter.impact_measure(SoftwareQuality::Reliability, true).total,
            3
        );
        assert_eq!(
            counter.effort_of_unresolved_by_quality(SoftwareQuality::Reliability, true),
            15.0
        );
        assert_eq!(
            counter.highest_impact_severity_of_unresolved(SoftwareQuality::Security, false),
            Some(ImpactSeverity::Blocker)
        );
        assert_eq!(
            counter
                .highest_impact_severity_of_unresolved(SoftwareQuality::Maintainability, false),
            None
        );
    }

    #[test]
    fn high_impact_accepted_counts_each_issue_once() {
        let severity_groups = vec![
            ImpactSeverityGroup {
                severity: ImpactSeverity::High,
                resolution: Some(Resolution::WontFix),
                count: 2,
                in_leak: true,
            },
            ImpactSeverityGroup {
                severity: ImpactSeverity::Blocker,
                resolution: Some(Resolution::WontFix),
                count: 1,
                in_leak: false,
            },
            ImpactSeverityGroup {
                severity: ImpactSeverity::Medium,
                resolution: Some(Resolution::WontFix),
                count: 5,
                in_leak: false,
            },
            ImpactSeverityGroup {
                severity: ImpactSeverity::High,
                resolution: None,
                count: 8,
                in_leak: false,
            },
        ];
        let counter = IssueCounter::from_groups(&[], &[], &severity_groups);

        assert_eq!(counter.count_high_impact_accepted(false), 3);
        assert_eq!(counter.count_high_impact_accepted(true), 2);
    }
}
