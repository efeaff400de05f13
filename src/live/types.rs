//! Core data types for live measure recomputation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::rating::Rating;

/// Kind of node in a branch's component tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualifier {
    /// Source file
    File,
    /// Test source file
    UnitTestFile,
    /// Directory or module
    Directory,
    /// Project root
    Project,
    /// Branch root of a project
    Branch,
    /// Application aggregating projects
    Application,
    /// Portfolio aggregating projects
    Portfolio,
    /// Portfolio nested in another portfolio
    SubPortfolio,
}

/// One node of a branch's component tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Unique id
    pub uuid: String,

    /// Human readable key
    #[serde(default)]
    pub key: String,

    /// Branch the component belongs to
    pub branch_uuid: String,

    /// Project the branch belongs to
    pub project_uuid: String,

    /// Ancestor ids ordered from the branch root down to the parent
    #[serde(default)]
    pub ancestors: Vec<String>,

    /// Node kind
    pub qualifier: Qualifier,

    /// Whether this component is the root of its branch
    #[serde(default)]
    pub is_branch_root: bool,
}

impl Component {
    /// Direct parent id, `None` for the branch root.
    pub fn parent_uuid(&self) -> Option<&str> {
        self.ancestors.last().map(String::as_str)
    }

    /// Number of ancestors.
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }
}

/// Kind of branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BranchType {
    /// Long or short lived branch
    #[default]
    Branch,
    /// Pull request
    PullRequest,
}

/// A project branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Branch id, equal to the uuid of its root component
    pub uuid: String,

    /// Owning project
    pub project_uuid: String,

    /// Branch name
    pub key: String,

    /// Branch or pull request
    #[serde(default)]
    pub branch_type: BranchType,
}

impl Branch {
    /// Whether this branch is a pull request.
    pub fn is_pull_request(&self) -> bool {
        self.branch_type == BranchType::PullRequest
    }
}

/// How the new code period of an analysis was defined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodMode {
    /// Since the previous version
    PreviousVersion,
    /// Over a number of days
    Days,
    /// Since a date
    Date,
    /// Since a given version
    Version,
    /// Compared against a reference branch
    ReferenceBranch,
}

/// Snapshot of the last analysis of a branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Analysis id
    pub uuid: String,

    /// Branch the analysis belongs to
    pub branch_uuid: String,

    /// When the analysis ran
    pub created_at: DateTime<Utc>,

    /// New code period definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_mode: Option<PeriodMode>,

    /// Start of the new code period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_date: Option<DateTime<Utc>>,
}

/// Which issues count as new code when grouping issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeakBoundary {
    /// Every issue is new (pull requests)
    Everything,
    /// No time cutoff: issues flagged against the reference branch are new
    ReferenceBranch,
    /// Issues created after the instant are new
    Since(DateTime<Utc>),
    /// No new code period
    Unbounded,
}

/// Value type of a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricType {
    /// Integer count
    Int,
    /// Floating point number
    Float,
    /// Percentage
    Percent,
    /// Work duration in minutes
    WorkDur,
    /// Letter rating stored as ordinal
    Rating,
    /// Gate level (`OK`/`ERROR`)
    Level,
    /// Free text
    String,
    /// Structured data
    Data,
}

impl MetricType {
    /// Whether measures of this type carry a number.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            MetricType::Int
                | MetricType::Float
                | MetricType::Percent
                | MetricType::WorkDur
                | MetricType::Rating
        )
    }

    /// Whether gate thresholds on this type compare as integers.
    pub fn compares_as_integer(self) -> bool {
        matches!(self, MetricType::Int | MetricType::WorkDur | MetricType::Rating)
    }
}

/// Metric definition from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metric {
    /// Unique key
    pub key: String,

    /// Value type
    pub value_type: MetricType,

    /// Number of decimals kept when storing numeric values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_scale: Option<u32>,

    /// Whether the metric only applies to new code
    #[serde(default)]
    pub on_leak: bool,
}

impl Metric {
    /// Create a metric; keys starting with `new_` apply to new code.
    pub fn new(key: impl Into<String>, value_type: MetricType) -> Self {
        let key = key.into();
        let on_leak = key.starts_with("new_");
        Self {
            key,
            value_type,
            decimal_scale: None,
            on_leak,
        }
    }

    /// Set the decimal scale.
    #[must_use]
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.decimal_scale = Some(scale);
        self
    }
}

/// Value held by a measure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeasureValue {
    /// Numeric value
    Number(f64),
    /// Letter rating
    Rating(Rating),
    /// Text or serialized data
    Text(String),
}

impl MeasureValue {
    /// Numeric view: ratings yield their ordinal, text parses as a float.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MeasureValue::Number(v) => Some(*v),
            MeasureValue::Rating(r) => Some(f64::from(r.index())),
            MeasureValue::Text(t) => t.trim().parse().ok(),
        }
    }

    /// Text view of textual values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MeasureValue::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Rating view: ratings as-is, numbers decoded as ordinals.
    pub fn as_rating(&self) -> Option<Rating> {
        match self {
            MeasureValue::Rating(r) => Some(*r),
            MeasureValue::Number(v) => Rating::from_index(*v),
            MeasureValue::Text(t) => t.parse().ok(),
        }
    }

    /// Coerce a persisted value to the representation the metric type uses,
    /// so unchanged values compare equal after recomputation.
    pub fn normalize(self, value_type: MetricType) -> Self {
        match (value_type, &self) {
            (MetricType::Rating, MeasureValue::Number(_) | MeasureValue::Text(_)) => {
                self.as_rating().map_or(self, MeasureValue::Rating)
            }
            (
                MetricType::Int | MetricType::Float | MetricType::Percent | MetricType::WorkDur,
                MeasureValue::Text(_) | MeasureValue::Rating(_),
            ) => self.as_number().map_or(self, MeasureValue::Number),
            (
                MetricType::Level | MetricType::String | MetricType::Data,
                MeasureValue::Number(v),
            ) => MeasureValue::Text(v.to_string()),
            _ => self,
        }
    }
}

/// Measure read from storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedMeasure {
    /// Component the measure belongs to
    pub component_uuid: String,
    /// Metric key
    pub metric_key: String,
    /// Stored value
    pub value: MeasureValue,
}

/// Measure whose value differs from what was loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangedMeasure {
    /// Component the measure belongs to
    pub component_uuid: String,
    /// Metric key
    pub metric_key: String,
    /// New value, `None` when the value was removed
    pub value: Option<MeasureValue>,
}

/// Type of the rule that raised an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    /// Maintainability issue
    CodeSmell,
    /// Reliability issue
    Bug,
    /// Security issue
    Vulnerability,
    /// Code to review for security
    SecurityHotspot,
}

/// Rule severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Informational
    Info,
    /// Minor
    Minor,
    /// Major
    Major,
    /// Critical
    Critical,
    /// Blocker
    Blocker,
}

/// Impact severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpactSeverity {
    /// Informational
    Info,
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
    /// Blocker
    Blocker,
}

impl ImpactSeverity {
    /// All severities from least to most severe.
    pub const ALL: [ImpactSeverity; 5] = [
        ImpactSeverity::Info,
        ImpactSeverity::Low,
        ImpactSeverity::Medium,
        ImpactSeverity::High,
        ImpactSeverity::Blocker,
    ];
}

/// Software quality an impact applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoftwareQuality {
    /// Maintainability
    Maintainability,
    /// Reliability
    Reliability,
    /// Security
    Security,
}

/// Issue workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    /// Open
    Open,
    /// Confirmed
    Confirmed,
    /// Reopened
    Reopened,
    /// Resolved
    Resolved,
    /// Closed
    Closed,
    /// Hotspot waiting for review
    ToReview,
    /// Reviewed hotspot
    Reviewed,
}

/// Issue resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resolution {
    /// Fixed
    Fixed,
    /// False positive
    FalsePositive,
    /// Accepted
    #[serde(rename = "WONTFIX")]
    WontFix,
    /// Removed
    Removed,
    /// Hotspot reviewed as safe
    Safe,
}

/// Issues of one component sharing type, severity, status, resolution and leak flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueGroup {
    /// Rule type
    pub rule_type: RuleType,
    /// Rule severity
    pub severity: Severity,
    /// Workflow status
    pub status: IssueStatus,
    /// Resolution, `None` for unresolved issues
    #[serde(default)]
    pub resolution: Option<Resolution>,
    /// Number of issues
    pub count: u64,
    /// Summed remediation effort in minutes
    #[serde(default)]
    pub effort: f64,
    /// Whether the issues fall in the new code period
    #[serde(default)]
    pub in_leak: bool,
    /// How many of the issues come from prioritized rules
    #[serde(default)]
    pub prioritized_rule_count: u64,
}

/// Impacts of one component sharing quality, severity, status, resolution and leak flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactGroup {
    /// Software quality
    pub software_quality: SoftwareQuality,
    /// Impact severity
    pub severity: ImpactSeverity,
    /// Workflow status
    pub status: IssueStatus,
    /// Resolution, `None` for unresolved issues
    #[serde(default)]
    pub resolution: Option<Resolution>,
    /// Number of issues
    pub count: u64,
    /// Summed remediation effort in minutes
    #[serde(default)]
    pub effort: f64,
    /// Whether the issues fall in the new code period
    #[serde(default)]
    pub in_leak: bool,
}

/// Issues grouped by their highest impact severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactSeverityGroup {
    /// Highest impact severity of the issues
    pub severity: ImpactSeverity,
    /// Resolution, `None` for unresolved issues
    #[serde(default)]
    pub resolution: Option<Resolution>,
    /// Number of issues
    pub count: u64,
    /// Whether the issues fall in the new code period
    #[serde(default)]
    pub in_leak: bool,
}

/// The three grouped collections loaded for one component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentIssueGroups {
    /// Groups by rule type, severity, status and resolution
    #[serde(default)]
    pub issue_groups: Vec<IssueGroup>,
    /// Groups by software quality and impact severity
    #[serde(default)]
    pub impact_groups: Vec<ImpactGroup>,
    /// Groups by highest impact severity
    #[serde(default)]
    pub impact_severity_groups: Vec<ImpactSeverityGroup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_navigation() {
        let file = Component {
            uuid: "F1".into(),
            key: "proj:src/a.rs".into(),
            branch_uuid: "ROOT".into(),
            project_uuid: "P".into(),
            ancestors: vec!["ROOT".into(), "DIR".into()],
            qualifier: Qualifier::File,
            is_branch_root: false,
        };
        assert_eq!(file.parent_uuid(), Some("DIR"));
        assert_eq!(file.depth(), 2);
    }

    #[test]
    fn metric_leak_flag_follows_key() {
        assert!(Metric::new("new_bugs", MetricType::Int).on_leak);
        assert!(!Metric::new("bugs", MetricType::Int).on_leak);
        assert_eq!(
            Metric::new("sqale_debt_ratio", MetricType::Percent)
                .with_scale(1)
                .decimal_scale,
            Some(1)
        );
    }

    #[test]
    fn measure_value_normalizes_to_metric_type() {
        assert_eq!(
            MeasureValue::Number(2.0).normalize(MetricType::Rating),
            MeasureValue::Rating(Rating::C)
        );
        assert_eq!(
            MeasureValue::Text("D".into()).normalize(MetricType::Rating),
            MeasureValue::Rating(Rating::D)
        );
        assert_eq!(
            MeasureValue::Text("12".into()).normalize(MetricType::Int),
            MeasureValue::Number(12.0)
        );
        assert_eq!(
            MeasureValue::Text("OK".into()).normalize(MetricType::Level),
            MeasureValue::Text("OK".into())
        );
    }

    #[test]
    fn measure_value_untagged_serde() {
        let values: Vec<MeasureValue> = serde_json::from_str(r#"[3, "B", "OK"]"#).unwrap();
        assert_eq!(values[0], MeasureValue::Number(3.0));
        assert_eq!(values[1], MeasureValue::Rating(Rating::B));
        assert_eq!(values[2], MeasureValue::Text("OK".into()));
        assert_eq!(values[2].as_number(), None);
        assert_eq!(values[1].as_number(), Some(1.0));
    }

    #[test]
    fn enums_use_upper_case_wire_names() {
        assert_eq!(
            serde_json::to_string(&Resolution::WontFix).unwrap(),
            "\"WONTFIX\""
        );
        assert_eq!(
            serde_json::to_string(&RuleType::SecurityHotspot).unwrap(),
            "\"SECURITY_HOTSPOT\""
        );
        assert!(Severity::Blocker > Severity::Critical);
        assert!(ImpactSeverity::High > ImpactSeverity::Medium);
    }
}
