//! End-to-end recomputation scenarios over the in-memory store.

use std::sync::Arc;

use approx::assert_relative_eq;
use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use livemeasure_rs::io::memory::{StoredImpact, StoredIssue};
use livemeasure_rs::io::store::ProjectSettings;
use livemeasure_rs::live::component_index::ComponentIndex;
use livemeasure_rs::live::formula::{Formula, HierarchyStep};
use livemeasure_rs::live::measure_matrix::MeasureMatrix;
use livemeasure_rs::live::metrics::*;
use livemeasure_rs::live::quality_gate::{Condition, Operator};
use livemeasure_rs::live::types::{
    Analysis, Branch, BranchType, Component, ImpactSeverity, IssueStatus, MeasureValue, Metric,
    MetricType, PeriodMode, PersistedMeasure, Qualifier, Resolution, RuleType, Severity,
    SoftwareQuality,
};
use livemeasure_rs::{
    Dataset, FormulaCatalog, InMemoryStore, LiveMeasureComputer, LiveMeasureConfig,
    LiveMeasureError, LiveMeasureStore, QualityGate, QualityGateChangeEvent, QualityGateStatus,
    Rating,
};

fn date(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, 9, 0, 0).unwrap()
}

fn component(uuid: &str, branch: &str, ancestors: &[&str]) -> Component {
    Component {
        uuid: uuid.to_string(),
        key: format!("proj:{}", uuid.to_lowercase()),
        branch_uuid: branch.to_string(),
        project_uuid: "P".to_string(),
        ancestors: ancestors.iter().map(|a| a.to_string()).collect(),
        qualifier: match ancestors.len() {
            0 => Qualifier::Project,
            1 if uuid.starts_with("DIR") => Qualifier::Directory,
            _ => Qualifier::File,
        },
        is_branch_root: ancestors.is_empty(),
    }
}

fn branch(uuid: &str, branch_type: BranchType) -> Branch {
    Branch {
        uuid: uuid.to_string(),
        project_uuid: "P".to_string(),
        key: uuid.to_lowercase(),
        branch_type,
    }
}

fn analysis(branch: &str, period_date: Option<DateTime<Utc>>) -> Analysis {
    Analysis {
        uuid: format!("A-{branch}"),
        branch_uuid: branch.to_string(),
        created_at: date(3, 1),
        period_mode: period_date.map(|_| PeriodMode::PreviousVersion),
        period_date,
    }
}

fn bug(component: &str, effort: f64, created_at: DateTime<Utc>) -> StoredIssue {
    StoredIssue {
        component_uuid: component.to_string(),
        rule_type: RuleType::Bug,
        severity: Severity::Major,
        status: IssueStatus::Open,
        resolution: None,
        effort,
        created_at,
        new_code_reference: false,
        prioritized_rule: false,
        impacts: vec![StoredImpact {
            software_quality: SoftwareQuality::Reliability,
            severity: ImpactSeverity::Medium,
        }],
    }
}

fn hotspot(component: &str, reviewed: bool) -> StoredIssue {
    StoredIssue {
        component_uuid: component.to_string(),
        rule_type: RuleType::SecurityHotspot,
        severity: Severity::Major,
        status: if reviewed {
            IssueStatus::Reviewed
        } else {
            IssueStatus::ToReview
        },
        resolution: reviewed.then_some(Resolution::Safe),
        effort: 0.0,
        created_at: date(1, 15),
        new_code_reference: false,
        prioritized_rule: false,
        impacts: vec![],
    }
}

fn measure(component: &str, metric: &str, value: MeasureValue) -> PersistedMeasure {
    PersistedMeasure {
        component_uuid: component.to_string(),
        metric_key: metric.to_string(),
        value,
    }
}

fn bugs_gate() -> QualityGate {
    QualityGate {
        uuid: "G1".to_string(),
        name: "Default".to_string(),
        conditions: vec![Condition::new(BUGS, Operator::GreaterThan, "0")],
    }
}

/// ROOT with two files F1 and F2, one analysis without new code period.
fn flat_dataset() -> Dataset {
    Dataset {
        metrics: default_metrics(),
        branches: vec![branch("ROOT", BranchType::Branch)],
        analyses: vec![analysis("ROOT", None)],
        components: vec![
            component("ROOT", "ROOT", &[]),
            component("F1", "ROOT", &["ROOT"]),
            component("F2", "ROOT", &["ROOT"]),
        ],
        default_quality_gate: Some(bugs_gate()),
        ..Default::default()
    }
}

fn computer(store: &Arc<InMemoryStore>) -> LiveMeasureComputer {
    LiveMeasureComputer::new(store.clone(), LiveMeasureConfig::default()).unwrap()
}

fn touched(store: &InMemoryStore, uuids: &[&str]) -> Vec<Component> {
    let snapshot = store.snapshot();
    uuids
        .iter()
        .map(|uuid| {
            snapshot
                .components
                .iter()
                .find(|c| c.uuid == *uuid)
                .cloned()
                .unwrap()
        })
        .collect()
}

async fn refresh(store: &Arc<InMemoryStore>, uuids: &[&str]) -> Vec<QualityGateChangeEvent> {
    let report = computer(store).refresh(&touched(store, uuids)).await;
    assert!(report.is_success(), "unexpected failures: {:?}", report.failures);
    report.events
}

fn number(store: &InMemoryStore, component: &str, metric: &str) -> Option<f64> {
    store
        .measure(component, metric)
        .and_then(|v| v.as_number())
}

#[tokio::test]
async fn touching_a_file_updates_its_ancestors_only() {
    let mut data = flat_dataset();
    data.measures = vec![
        measure("F2", BUGS, MeasureValue::Number(1.0)),
        measure("F2", RELIABILITY_REMEDIATION_EFFORT, MeasureValue::Number(5.0)),
    ];
    data.issues = vec![
        bug("F1", 10.0, date(1, 2)),
        bug("F1", 10.0, date(1, 3)),
        bug("F1", 10.0, date(1, 4)),
    ];
    let store = Arc::new(InMemoryStore::new(data));

    let events = refresh(&store, &["F1"]).await;

    assert_eq!(events.len(), 1);
    assert_eq!(number(&store, "ROOT", BUGS), Some(4.0));
    assert_eq!(number(&store, "ROOT", RELIABILITY_REMEDIATION_EFFORT), Some(35.0));
    assert_eq!(number(&store, "F1", BUGS), Some(3.0));
    assert_eq!(number(&store, "F2", BUGS), Some(1.0));
    assert!(events[0]
        .changed_measures
        .iter()
        .all(|m| m.component_uuid != "F2"));
}

#[tokio::test]
async fn new_bug_flips_gate_and_reports_previous_status() {
    let mut data = flat_dataset();
    data.measures = vec![
        measure("ROOT", BUGS, MeasureValue::Number(0.0)),
        measure("F1", BUGS, MeasureValue::Number(0.0)),
        measure("ROOT", ALERT_STATUS, MeasureValue::Text("OK".into())),
    ];
    let store = Arc::new(InMemoryStore::new(data));
    store.add_issue(bug("F1", 5.0, date(2, 1)));

    let events = refresh(&store, &["F1"]).await;
    let event = &events[0];

    assert_eq!(event.previous_status, Some(QualityGateStatus::Ok));
    assert_eq!(event.evaluated_gate.status, QualityGateStatus::Error);
    assert!(event.status_changed());
    assert_eq!(event.evaluated_gate.conditions[0].actual.as_deref(), Some("1"));
    assert_eq!(
        store.measure("ROOT", ALERT_STATUS),
        Some(MeasureValue::Text("ERROR".into()))
    );
    let details = store.measure("ROOT", QUALITY_GATE_DETAILS).unwrap();
    let details: serde_json::Value =
        serde_json::from_str(details.as_text().unwrap()).unwrap();
    assert_eq!(details["level"], "ERROR");
}

#[tokio::test]
async fn hotspot_review_percentage_and_rating() {
    let mut data = flat_dataset();
    data.issues = vec![
        hotspot("F1", false),
        hotspot("F1", false),
        hotspot("F1", false),
        hotspot("F1", false),
        hotspot("F1", true),
    ];
    let store = Arc::new(InMemoryStore::new(data));

    refresh(&store, &["F1"]).await;

    for component in ["F1", "ROOT"] {
        assert_relative_eq!(
            number(&store, component, SECURITY_HOTSPOTS_REVIEWED).unwrap(),
            20.0
        );
        assert_eq!(
            store
                .measure(component, SECURITY_REVIEW_RATING)
                .and_then(|v| v.as_rating()),
            Some(Rating::E)
        );
    }
    assert_eq!(number(&store, "ROOT", SECURITY_HOTSPOTS_TO_REVIEW_STATUS), Some(4.0));
    assert_eq!(number(&store, "ROOT", SECURITY_HOTSPOTS_REVIEWED_STATUS), Some(1.0));
    assert_eq!(number(&store, "ROOT", SECURITY_HOTSPOTS), Some(4.0));
}

#[tokio::test]
async fn second_run_changes_nothing() {
    let mut data = flat_dataset();
    data.issues = vec![bug("F1", 12.0, date(1, 2)), hotspot("F2", false)];
    data.measures = vec![measure("F2", DEVELOPMENT_COST, MeasureValue::Text("300".into()))];
    let store = Arc::new(InMemoryStore::new(data));

    let first = refresh(&store, &["F1", "F2"]).await;
    assert!(!first[0].changed_measures.is_empty());

    let second = refresh(&store, &["F1", "F2"]).await;
    assert_eq!(second.len(), 1);
    assert!(
        second[0].changed_measures.is_empty(),
        "unexpected changes: {:?}",
        second[0].changed_measures
    );
    assert_eq!(second[0].previous_status, Some(second[0].evaluated_gate.status));
}

#[tokio::test]
async fn index_loads_touched_ancestors_and_their_children_only() {
    let store = InMemoryStore::new(Dataset {
        components: vec![
            component("ROOT", "ROOT", &[]),
            component("DIR1", "ROOT", &["ROOT"]),
            component("DIR2", "ROOT", &["ROOT"]),
            component("F1", "ROOT", &["ROOT", "DIR1"]),
            component("F2", "ROOT", &["ROOT", "DIR1"]),
            component("F3", "ROOT", &["ROOT", "DIR2"]),
        ],
        ..Default::default()
    });
    let session = store.begin().await.unwrap();
    let index = ComponentIndex::load(session.as_ref(), &touched(&store, &["F1"]))
        .await
        .unwrap();

    let loaded: Vec<&str> = index.all_uuids().iter().map(String::as_str).collect();
    assert_eq!(loaded, vec!["DIR1", "DIR2", "F1", "F2", "ROOT"]);
    let order: Vec<&str> = index.sorted_tree().iter().map(|c| c.uuid.as_str()).collect();
    assert_eq!(order, vec!["F1", "DIR1", "ROOT"]);
    assert_eq!(index.branch_root().uuid, "ROOT");
}

#[tokio::test]
async fn touching_a_component_outside_its_branch_tree_fails() {
    let store = InMemoryStore::new(Dataset {
        components: vec![component("F1", "ROOT", &["ROOT"])],
        ..Default::default()
    });
    let session = store.begin().await.unwrap();
    let err = ComponentIndex::load(session.as_ref(), &touched(&store, &["F1"]))
        .await
        .unwrap_err();
    assert!(err.is_integrity_violation());
}

#[tokio::test]
async fn leak_formulas_do_not_run_without_new_code_period() {
    let mut data = flat_dataset();
    data.measures = vec![measure("ROOT", NEW_BUGS, MeasureValue::Number(7.0))];
    data.issues = vec![bug("F1", 1.0, date(2, 1))];
    let store = Arc::new(InMemoryStore::new(data));

    let events = refresh(&store, &["F1"]).await;

    assert_eq!(number(&store, "ROOT", NEW_BUGS), Some(7.0));
    assert!(events[0]
        .changed_measures
        .iter()
        .all(|m| !m.metric_key.starts_with("new_")));
}

#[tokio::test]
async fn leak_formulas_count_issues_after_period_start() {
    let mut data = flat_dataset();
    data.analyses = vec![analysis("ROOT", Some(date(1, 10)))];
    data.issues = vec![bug("F1", 4.0, date(1, 5)), bug("F1", 6.0, date(2, 1))];
    let store = Arc::new(InMemoryStore::new(data));

    refresh(&store, &["F1"]).await;

    assert_eq!(number(&store, "F1", BUGS), Some(2.0));
    assert_eq!(number(&store, "F1", NEW_BUGS), Some(1.0));
    assert_eq!(number(&store, "ROOT", NEW_BUGS), Some(1.0));
    assert_eq!(number(&store, "ROOT", NEW_RELIABILITY_REMEDIATION_EFFORT), Some(6.0));
}

#[test]
fn two_decimal_scale_rounds_half_up() {
    let mut matrix = MeasureMatrix::new(
        vec!["ROOT".to_string()],
        vec![Metric::new("coverage", MetricType::Percent).with_scale(2)],
        Vec::<PersistedMeasure>::new(),
    );
    matrix.set_number("ROOT", "coverage", 0.125).unwrap();
    assert_eq!(matrix.number("ROOT", "coverage").unwrap(), Some(0.13));
}

#[tokio::test]
async fn sum_formulas_fold_own_value_and_children() {
    let mut data = Dataset {
        metrics: default_metrics(),
        branches: vec![branch("ROOT", BranchType::Branch)],
        analyses: vec![analysis("ROOT", None)],
        components: vec![
            component("ROOT", "ROOT", &[]),
            component("DIR1", "ROOT", &["ROOT"]),
            component("F1", "ROOT", &["ROOT", "DIR1"]),
            component("F2", "ROOT", &["ROOT", "DIR1"]),
        ],
        default_quality_gate: Some(bugs_gate()),
        ..Default::default()
    };
    data.issues = vec![
        bug("F1", 1.0, date(1, 1)),
        bug("F1", 2.0, date(1, 1)),
        bug("F2", 4.0, date(1, 1)),
        bug("DIR1", 8.0, date(1, 1)),
    ];
    let store = Arc::new(InMemoryStore::new(data));

    refresh(&store, &["F1", "F2"]).await;

    assert_eq!(number(&store, "DIR1", BUGS), Some(4.0));
    assert_eq!(number(&store, "ROOT", BUGS), Some(4.0));
    assert_eq!(number(&store, "DIR1", RELIABILITY_REMEDIATION_EFFORT), Some(15.0));
    assert_eq!(number(&store, "ROOT", VIOLATIONS), Some(4.0));
    assert_eq!(
        store
            .measure("ROOT", RELIABILITY_RATING)
            .and_then(|v| v.as_rating()),
        Some(Rating::C)
    );
}

#[tokio::test]
async fn branches_are_recomputed_independently() {
    let mut data = flat_dataset();
    data.branches.push(branch("PR1", BranchType::PullRequest));
    data.analyses.push(analysis("PR1", None));
    data.components.push(component("PR1", "PR1", &[]));
    data.components.push(component("G1", "PR1", &["PR1"]));
    data.default_quality_gate = Some(QualityGate {
        uuid: "G1".into(),
        name: "Default".into(),
        conditions: vec![
            Condition::new(BUGS, Operator::GreaterThan, "5"),
            Condition::new(NEW_BUGS, Operator::GreaterThan, "0"),
        ],
    });
    data.issues = vec![
        bug("F1", 1.0, date(1, 1)),
        bug("G1", 1.0, date(1, 1)),
        bug("G1", 1.0, date(1, 1)),
    ];
    let store = Arc::new(InMemoryStore::new(data));

    let events = refresh(&store, &["G1", "F1"]).await;

    let branches: Vec<&str> = events.iter().map(|e| e.branch.uuid.as_str()).collect();
    assert_eq!(branches, vec!["PR1", "ROOT"]);

    let pr = &events[0];
    assert_eq!(pr.evaluated_gate.conditions.len(), 1);
    assert_eq!(pr.evaluated_gate.conditions[0].condition.metric_key, NEW_BUGS);
    assert_eq!(pr.evaluated_gate.status, QualityGateStatus::Error);
    assert_eq!(number(&store, "PR1", NEW_BUGS), Some(2.0));
    assert_eq!(number(&store, "PR1", BUGS), Some(2.0));

    let main = &events[1];
    assert_eq!(main.evaluated_gate.conditions.len(), 2);
    assert_eq!(main.evaluated_gate.status, QualityGateStatus::Ok);
    assert_eq!(number(&store, "ROOT", BUGS), Some(1.0));
    assert_eq!(number(&store, "ROOT", NEW_BUGS), None);
}

#[tokio::test]
async fn branch_without_analysis_is_skipped() {
    let mut data = flat_dataset();
    data.branches.push(branch("B2", BranchType::Branch));
    data.components.push(component("B2", "B2", &[]));
    data.components.push(component("H1", "B2", &["B2"]));
    data.issues = vec![bug("H1", 1.0, date(1, 1)), bug("F1", 1.0, date(1, 1))];
    let store = Arc::new(InMemoryStore::new(data));

    let events = refresh(&store, &["H1", "F1"]).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].branch.uuid, "ROOT");
    assert_eq!(number(&store, "H1", BUGS), None);
    assert_eq!(number(&store, "B2", BUGS), None);
}

#[tokio::test]
async fn failing_formula_commits_nothing() {
    let mut data = flat_dataset();
    data.issues = vec![bug("F1", 1.0, date(1, 1))];
    let store = Arc::new(InMemoryStore::new(data));
    let before = store.snapshot();

    let catalog = FormulaCatalog::new(vec![
        Formula::new(BUGS, HierarchyStep::SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_type(RuleType::Bug, false))
        }),
        Formula::new(
            VIOLATIONS,
            HierarchyStep::Custom(|_| Err(LiveMeasureError::internal("aggregation failed"))),
            |ctx, issues| ctx.set_count(issues.count_unresolved(false)),
        ),
    ])
    .unwrap();
    let computer = LiveMeasureComputer::with_catalog(
        store.clone(),
        Arc::new(catalog),
        LiveMeasureConfig::default(),
    )
    .unwrap();

    let mut report = computer.refresh(&touched(&store, &["F1"])).await;
    assert!(report.events.is_empty());
    assert_eq!(report.failures.len(), 1);
    let failure = report.failures.remove(0);
    assert_eq!(failure.branch_uuid, "ROOT");

    match failure.error {
        LiveMeasureError::FormulaFailure {
            metric_key,
            component_uuid,
            ..
        } => {
            assert_eq!(metric_key, VIOLATIONS);
            assert_eq!(component_uuid, "F1");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn gate_on_unknown_metric_commits_nothing() {
    let mut data = flat_dataset();
    data.issues = vec![bug("F1", 1.0, date(1, 1))];
    data.default_quality_gate = Some(QualityGate {
        uuid: "G1".into(),
        name: "Broken".into(),
        conditions: vec![Condition::new("coverage", Operator::LessThan, "80")],
    });
    let store = Arc::new(InMemoryStore::new(data));
    let before = store.snapshot();

    let report = computer(&store).refresh(&touched(&store, &["F1"])).await;

    assert!(report.events.is_empty());
    assert!(report.failure("ROOT").unwrap().is_integrity_violation());
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn failing_branch_keeps_events_of_committed_branches() {
    let mut data = flat_dataset();
    // B0 and ZZZ sort around ROOT; neither has its root component loaded
    for orphan in ["B0", "ZZZ"] {
        data.branches.push(branch(orphan, BranchType::Branch));
        data.analyses.push(analysis(orphan, None));
        data.components.push(component(&format!("{orphan}-F"), orphan, &[orphan]));
    }
    data.measures.push(measure("ROOT", ALERT_STATUS, MeasureValue::Text("OK".into())));
    data.issues = vec![
        bug("F1", 1.0, date(1, 1)),
        bug("B0-F", 1.0, date(1, 1)),
        bug("ZZZ-F", 1.0, date(1, 1)),
    ];
    let store = Arc::new(InMemoryStore::new(data));

    let report = computer(&store)
        .refresh(&touched(&store, &["B0-F", "F1", "ZZZ-F"]))
        .await;

    assert!(!report.is_success());
    let failed: Vec<&str> = report
        .failures
        .iter()
        .map(|f| f.branch_uuid.as_str())
        .collect();
    assert_eq!(failed, vec!["B0", "ZZZ"]);
    assert!(report.failures.iter().all(|f| f.error.is_integrity_violation()));

    assert_eq!(report.events.len(), 1);
    let event = report.event("ROOT").unwrap();
    assert_eq!(event.previous_status, Some(QualityGateStatus::Ok));
    assert_eq!(event.evaluated_gate.status, QualityGateStatus::Error);
    assert!(event.status_changed());
    assert_eq!(
        store.measure("ROOT", ALERT_STATUS),
        Some(MeasureValue::Text("ERROR".into()))
    );
    assert_eq!(number(&store, "ROOT", BUGS), Some(1.0));

    let snapshot = store.snapshot();
    assert!(snapshot
        .measures
        .iter()
        .all(|m| !m.component_uuid.starts_with("B0") && !m.component_uuid.starts_with("ZZZ")));
}

#[tokio::test]
async fn project_grid_overrides_configured_grid() {
    let mut data = flat_dataset();
    data.issues = vec![StoredIssue {
        rule_type: RuleType::CodeSmell,
        ..bug("F1", 10.0, date(1, 1))
    }];
    data.measures = vec![
        measure("F1", DEVELOPMENT_COST, MeasureValue::Text("1000".into())),
        measure("ROOT", DEVELOPMENT_COST, MeasureValue::Text("2000".into())),
    ];
    let store = Arc::new(InMemoryStore::new(data.clone()));
    refresh(&store, &["F1"]).await;
    assert_eq!(
        store.measure("ROOT", SQALE_RATING).and_then(|v| v.as_rating()),
        Some(Rating::A)
    );
    assert_relative_eq!(number(&store, "ROOT", SQALE_DEBT_RATIO).unwrap(), 0.5);

    data.project_settings.insert(
        "P".into(),
        ProjectSettings {
            debt_rating_grid: Some("0.001,0.002,0.003,0.004".into()),
        },
    );
    let store = Arc::new(InMemoryStore::new(data));
    refresh(&store, &["F1"]).await;
    assert_eq!(
        store.measure("ROOT", SQALE_RATING).and_then(|v| v.as_rating()),
        Some(Rating::E)
    );
    assert_eq!(
        store.measure("F1", SQALE_RATING).and_then(|v| v.as_rating()),
        Some(Rating::E)
    );
}

#[tokio::test]
async fn software_quality_formulas_need_a_branch_value() {
    let mut data = flat_dataset();
    data.issues = vec![bug("F1", 3.0, date(1, 1))];
    let store = Arc::new(InMemoryStore::new(data.clone()));
    refresh(&store, &["F1"]).await;
    assert!(store.measure("F1", RELIABILITY_ISSUES).is_none());
    assert!(store.measure("ROOT", SOFTWARE_QUALITY_RELIABILITY_RATING).is_none());

    data.measures = vec![
        measure("ROOT", RELIABILITY_ISSUES, MeasureValue::Text("{\"total\":0}".into())),
        measure("ROOT", SOFTWARE_QUALITY_RELIABILITY_RATING, MeasureValue::Number(0.0)),
    ];
    let store = Arc::new(InMemoryStore::new(data));
    refresh(&store, &["F1"]).await;
    assert_eq!(
        store.measure("ROOT", RELIABILITY_ISSUES),
        Some(MeasureValue::Text(
            r#"{"total":1,"BLOCKER":0,"HIGH":0,"MEDIUM":1,"LOW":0,"INFO":0}"#.into()
        ))
    );
    assert_eq!(
        store
            .measure("ROOT", SOFTWARE_QUALITY_RELIABILITY_RATING)
            .and_then(|v| v.as_rating()),
        Some(Rating::C)
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn parent_equals_own_value_plus_children(
        f1 in 0usize..4,
        f2 in 0usize..4,
        own in 0usize..3,
        stale in 0u32..50,
    ) {
        let mut data = flat_dataset();
        data.measures = vec![measure("ROOT", BUGS, MeasureValue::Number(f64::from(stale)))];
        data.issues = std::iter::repeat_with(|| bug("F1", 1.0, date(1, 1)))
            .take(f1)
            .chain(std::iter::repeat_with(|| bug("F2", 1.0, date(1, 1))).take(f2))
            .chain(std::iter::repeat_with(|| bug("ROOT", 1.0, date(1, 1))).take(own))
            .collect();
        let store = Arc::new(InMemoryStore::new(data));

        tokio_test::block_on(refresh(&store, &["F1", "F2"]));

        let root = number(&store, "ROOT", BUGS).unwrap();
        let children = number(&store, "F1", BUGS).unwrap() + number(&store, "F2", BUGS).unwrap();
        prop_assert_eq!(root, own as f64 + children);
        prop_assert_eq!(root, (f1 + f2 + own) as f64);
    }
}
