//! The ordered catalog of live measure formulas.
//!
//! Formulas run in catalog order for every component, so a formula may only
//! depend on metrics computed earlier in the list (or on inputs such as the
//! development cost that no formula computes). [`FormulaCatalog::new`]
//! checks that ordering.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexSet;
use once_cell::sync::Lazy;

use crate::core::errors::{LiveMeasureError, Result};
use crate::core::rating::{review_percent, review_rating, review_rating_a_to_d, Rating};
use crate::live::formula::{Formula, FormulaContext, HierarchyStep};
use crate::live::issue_counter::IssueCounter;
use crate::live::metrics::*;
use crate::live::types::{IssueStatus, Resolution, RuleType, Severity, SoftwareQuality};

use crate::live::formula::HierarchyStep::{ImpactSumChildren, MaxRatingChildren, SumChildren};

static STANDARD: Lazy<Arc<FormulaCatalog>> = Lazy::new(|| {
    Arc::new(FormulaCatalog::new(standard_formulas()).expect("built-in formula catalog is valid"))
});

/// Ordered list of formulas
#[derive(Debug, Clone)]
pub struct FormulaCatalog {
    formulas: Vec<Formula>,
}

impl FormulaCatalog {
    /// Validate and wrap an ordered list of formulas.
    pub fn new(formulas: Vec<Formula>) -> Result<Self> {
        let mut seen = HashSet::new();
        let all: HashSet<&str> = formulas.iter().map(Formula::metric_key).collect();
        for formula in &formulas {
            for dependency in formula.dependencies() {
                if all.contains(dependency) && !seen.contains(dependency) {
                    return Err(LiveMeasureError::validation(format!(
                        "Formula {} depends on {} which is computed later",
                        formula.metric_key(),
                        dependency
                    )));
                }
            }
            if !seen.insert(formula.metric_key()) {
                return Err(LiveMeasureError::validation(format!(
                    "Metric {} has several formulas",
                    formula.metric_key()
                )));
            }
        }
        Ok(Self { formulas })
    }

    /// The built-in catalog.
    pub fn standard() -> Arc<FormulaCatalog> {
        Arc::clone(&STANDARD)
    }

    /// Formulas in execution order.
    pub fn formulas(&self) -> &[Formula] {
        &self.formulas
    }

    /// Formula computing a metric.
    pub fn get(&self, metric_key: &str) -> Option<&Formula> {
        self.formulas.iter().find(|f| f.metric_key() == metric_key)
    }

    /// Every metric the catalog writes or reads, in first-use order.
    pub fn metric_keys(&self) -> Vec<String> {
        let mut keys = IndexSet::new();
        for formula in &self.formulas {
            keys.insert(formula.metric_key());
            keys.extend(formula.dependencies().iter().copied());
        }
        keys.into_iter().map(str::to_string).collect()
    }

    /// Number of formulas.
    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }
}

#[derive(Clone, Copy)]
enum DevelopmentCost {
    Overall,
    NewCode,
}

fn development_cost(ctx: &FormulaContext<'_>, cost: DevelopmentCost) -> Result<f64> {
    let value = match cost {
        DevelopmentCost::Overall => ctx
            .text(DEVELOPMENT_COST)?
            .and_then(|text| text.trim().parse::<f64>().ok()),
        DevelopmentCost::NewCode => ctx.value(NEW_DEVELOPMENT_COST)?,
    };
    Ok(value.unwrap_or(0.0))
}

fn debt_density(ctx: &FormulaContext<'_>, effort_key: &str, cost: DevelopmentCost) -> Result<f64> {
    let effort = ctx.value(effort_key)?.unwrap_or(0.0);
    let cost = development_cost(ctx, cost)?;
    Ok(if cost > 0.0 { effort.max(0.0) / cost } else { 0.0 })
}

fn debt_ratio(ctx: &mut FormulaContext<'_>, effort_key: &str, cost: DevelopmentCost) -> Result<()> {
    let density = debt_density(ctx, effort_key, cost)?;
    ctx.set_number(100.0 * density)
}

fn debt_rating(ctx: &mut FormulaContext<'_>, effort_key: &str, cost: DevelopmentCost) -> Result<()> {
    let density = debt_density(ctx, effort_key, cost)?;
    let rating = ctx.debt_rating_grid().rating_for_density(density);
    ctx.set_rating(rating)
}

fn effort_to_rating_a(ctx: &mut FormulaContext<'_>, effort_key: &str) -> Result<()> {
    let effort = ctx.value(effort_key)?.unwrap_or(0.0);
    let cost = development_cost(ctx, DevelopmentCost::Overall)?;
    let upper = ctx.debt_rating_grid().upper_bound(Rating::A) * cost;
    ctx.set_number(if effort > upper { effort - upper } else { 0.0 })
}

fn severity_rating(issues: &IssueCounter, rule_type: RuleType, only_in_leak: bool) -> Rating {
    issues
        .highest_severity_of_unresolved(rule_type, only_in_leak)
        .map_or(Rating::A, Rating::from_severity)
}

fn impact_rating(issues: &IssueCounter, quality: SoftwareQuality, only_in_leak: bool) -> Rating {
    issues
        .highest_impact_severity_of_unresolved(quality, only_in_leak)
        .map_or(Rating::A, Rating::from_impact_severity)
}

fn impact_json(
    ctx: &mut FormulaContext<'_>,
    issues: &IssueCounter,
    quality: SoftwareQuality,
    only_in_leak: bool,
) -> Result<()> {
    let json = issues.impact_measure(quality, only_in_leak).to_json()?;
    ctx.set_text(json)
}

fn issues_review_percent(issues: &IssueCounter, only_in_leak: bool) -> Option<f64> {
    review_percent(
        issues.count_hotspots_by_status(IssueStatus::ToReview, only_in_leak),
        issues.count_hotspots_by_status(IssueStatus::Reviewed, only_in_leak),
    )
}

fn status_review_percent(
    ctx: &FormulaContext<'_>,
    to_review_key: &str,
    reviewed_key: &str,
) -> Result<Option<f64>> {
    let to_review = ctx.value(to_review_key)?.unwrap_or(0.0).max(0.0) as u64;
    let reviewed = ctx.value(reviewed_key)?.unwrap_or(0.0).max(0.0) as u64;
    Ok(review_percent(to_review, reviewed))
}

fn set_percent(ctx: &mut FormulaContext<'_>, percent: Option<f64>) -> Result<()> {
    match percent {
        Some(percent) => ctx.set_number(percent),
        None => Ok(()),
    }
}

fn own_plus(ctx: &mut FormulaContext<'_>, children: u64) -> Result<()> {
    let own = ctx.value(ctx.metric_key())?.unwrap_or(0.0);
    ctx.set_number(own + children as f64)
}

/// The built-in formulas in execution order.
#[allow(clippy::too_many_lines)]
pub fn standard_formulas() -> Vec<Formula> {
    vec![
        Formula::new(CODE_SMELLS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_type(RuleType::CodeSmell, false))
        }),
        Formula::new(BUGS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_type(RuleType::Bug, false))
        }),
        Formula::new(VULNERABILITIES, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_type(RuleType::Vulnerability, false))
        }),
        Formula::new(PRIORITIZED_RULE_ISSUES, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_prioritized_rule_issues(false))
        }),
        Formula::new(SECURITY_HOTSPOTS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_type(RuleType::SecurityHotspot, false))
        }),
        Formula::new(RELIABILITY_ISSUES, ImpactSumChildren, |ctx, issues| {
            impact_json(ctx, issues, SoftwareQuality::Reliability, false)
        })
        .only_if_computed_on_branch(),
        Formula::new(MAINTAINABILITY_ISSUES, ImpactSumChildren, |ctx, issues| {
            impact_json(ctx, issues, SoftwareQuality::Maintainability, false)
        })
        .only_if_computed_on_branch(),
        Formula::new(SECURITY_ISSUES, ImpactSumChildren, |ctx, issues| {
            impact_json(ctx, issues, SoftwareQuality::Security, false)
        })
        .only_if_computed_on_branch(),
        Formula::new(NEW_RELIABILITY_ISSUES, ImpactSumChildren, |ctx, issues| {
            impact_json(ctx, issues, SoftwareQuality::Reliability, true)
        })
        .leak()
        .only_if_computed_on_branch(),
        Formula::new(NEW_MAINTAINABILITY_ISSUES, ImpactSumChildren, |ctx, issues| {
            impact_json(ctx, issues, SoftwareQuality::Maintainability, true)
        })
        .leak()
        .only_if_computed_on_branch(),
        Formula::new(NEW_SECURITY_ISSUES, ImpactSumChildren, |ctx, issues| {
            impact_json(ctx, issues, SoftwareQuality::Security, true)
        })
        .leak()
        .only_if_computed_on_branch(),
        Formula::new(VIOLATIONS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved(false))
        }),
        Formula::new(BLOCKER_VIOLATIONS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_severity(Severity::Blocker, false))
        }),
        Formula::new(CRITICAL_VIOLATIONS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_severity(Severity::Critical, false))
        }),
        Formula::new(MAJOR_VIOLATIONS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_severity(Severity::Major, false))
        }),
        Formula::new(MINOR_VIOLATIONS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_severity(Severity::Minor, false))
        }),
        Formula::new(INFO_VIOLATIONS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_severity(Severity::Info, false))
        }),
        Formula::new(FALSE_POSITIVE_ISSUES, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_by_resolution(Resolution::FalsePositive, false))
        }),
        Formula::new(ACCEPTED_ISSUES, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_by_resolution(Resolution::WontFix, false))
        }),
        Formula::new(HIGH_IMPACT_ACCEPTED_ISSUES, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_high_impact_accepted(false))
        })
        .only_if_computed_on_branch(),
        Formula::new(OPEN_ISSUES, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_by_status(IssueStatus::Open, false))
        }),
        Formula::new(REOPENED_ISSUES, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_by_status(IssueStatus::Reopened, false))
        }),
        Formula::new(CONFIRMED_ISSUES, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_by_status(IssueStatus::Confirmed, false))
        }),
        Formula::new(TECHNICAL_DEBT, SumChildren, |ctx, issues| {
            ctx.set_number(issues.effort_of_unresolved(RuleType::CodeSmell, false))
        }),
        Formula::new(RELIABILITY_REMEDIATION_EFFORT, SumChildren, |ctx, issues| {
            ctx.set_number(issues.effort_of_unresolved(RuleType::Bug, false))
        }),
        Formula::new(SECURITY_REMEDIATION_EFFORT, SumChildren, |ctx, issues| {
            ctx.set_number(issues.effort_of_unresolved(RuleType::Vulnerability, false))
        }),
        Formula::new(
            SQALE_DEBT_RATIO,
            HierarchyStep::Custom(|ctx| debt_ratio(ctx, TECHNICAL_DEBT, DevelopmentCost::Overall)),
            |ctx, _| debt_ratio(ctx, TECHNICAL_DEBT, DevelopmentCost::Overall),
        )
        .depends_on(&[TECHNICAL_DEBT, DEVELOPMENT_COST]),
        Formula::new(
            SQALE_RATING,
            HierarchyStep::Custom(|ctx| debt_rating(ctx, TECHNICAL_DEBT, DevelopmentCost::Overall)),
            |ctx, _| debt_rating(ctx, TECHNICAL_DEBT, DevelopmentCost::Overall),
        )
        .depends_on(&[TECHNICAL_DEBT, DEVELOPMENT_COST]),
        Formula::new(
            EFFORT_TO_REACH_MAINTAINABILITY_RATING_A,
            HierarchyStep::Custom(|ctx| effort_to_rating_a(ctx, TECHNICAL_DEBT)),
            |ctx, _| effort_to_rating_a(ctx, TECHNICAL_DEBT),
        )
        .depends_on(&[TECHNICAL_DEBT, DEVELOPMENT_COST]),
        Formula::new(RELIABILITY_RATING, MaxRatingChildren, |ctx, issues| {
            ctx.set_rating(severity_rating(issues, RuleType::Bug, false))
        }),
        Formula::new(SECURITY_RATING, MaxRatingChildren, |ctx, issues| {
            ctx.set_rating(severity_rating(issues, RuleType::Vulnerability, false))
        }),
        Formula::new(
            SECURITY_HOTSPOTS_REVIEWED_STATUS,
            HierarchyStep::Custom(|ctx| {
                let children = ctx.children_hotspots_reviewed(
                    SECURITY_HOTSPOTS_REVIEWED_STATUS,
                    SECURITY_HOTSPOTS_REVIEWED,
                    SECURITY_HOTSPOTS,
                )?;
                own_plus(ctx, children)
            }),
            |ctx, issues| ctx.set_count(issues.count_hotspots_by_status(IssueStatus::Reviewed, false)),
        ),
        Formula::new(
            SECURITY_HOTSPOTS_TO_REVIEW_STATUS,
            HierarchyStep::Custom(|ctx| {
                let children = ctx.children_hotspots_to_review(
                    SECURITY_HOTSPOTS_TO_REVIEW_STATUS,
                    SECURITY_HOTSPOTS,
                )?;
                own_plus(ctx, children)
            }),
            |ctx, issues| ctx.set_count(issues.count_hotspots_by_status(IssueStatus::ToReview, false)),
        ),
        Formula::new(
            SECURITY_HOTSPOTS_REVIEWED,
            HierarchyStep::Custom(|ctx| {
                let percent = status_review_percent(
                    ctx,
                    SECURITY_HOTSPOTS_TO_REVIEW_STATUS,
                    SECURITY_HOTSPOTS_REVIEWED_STATUS,
                )?;
                set_percent(ctx, percent)
            }),
            |ctx, issues| set_percent(ctx, issues_review_percent(issues, false)),
        )
        .depends_on(&[SECURITY_HOTSPOTS_TO_REVIEW_STATUS, SECURITY_HOTSPOTS_REVIEWED_STATUS]),
        Formula::new(
            SECURITY_REVIEW_RATING,
            HierarchyStep::Custom(|ctx| {
                let percent = ctx.value(SECURITY_HOTSPOTS_REVIEWED)?;
                ctx.set_rating(review_rating(percent))
            }),
            |ctx, issues| ctx.set_rating(review_rating(issues_review_percent(issues, false))),
        )
        .depends_on(&[SECURITY_HOTSPOTS_REVIEWED]),
        Formula::new(NEW_CODE_SMELLS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_type(RuleType::CodeSmell, true))
        })
        .leak(),
        Formula::new(NEW_BUGS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_type(RuleType::Bug, true))
        })
        .leak(),
        Formula::new(NEW_VULNERABILITIES, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_type(RuleType::Vulnerability, true))
        })
        .leak(),
        Formula::new(NEW_SECURITY_HOTSPOTS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_type(RuleType::SecurityHotspot, true))
        })
        .leak(),
        Formula::new(NEW_VIOLATIONS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved(true))
        })
        .leak(),
        Formula::new(NEW_BLOCKER_VIOLATIONS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_severity(Severity::Blocker, true))
        })
        .leak(),
        Formula::new(NEW_CRITICAL_VIOLATIONS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_severity(Severity::Critical, true))
        })
        .leak(),
        Formula::new(NEW_MAJOR_VIOLATIONS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_severity(Severity::Major, true))
        })
        .leak(),
        Formula::new(NEW_MINOR_VIOLATIONS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_severity(Severity::Minor, true))
        })
        .leak(),
        Formula::new(NEW_INFO_VIOLATIONS, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_unresolved_by_severity(Severity::Info, true))
        })
        .leak(),
        Formula::new(NEW_ACCEPTED_ISSUES, SumChildren, |ctx, issues| {
            ctx.set_count(issues.count_by_resolution(Resolution::WontFix, true))
        })
        .leak()
        .only_if_computed_on_branch(),
        Formula::new(NEW_TECHNICAL_DEBT, SumChildren, |ctx, issues| {
            ctx.set_number(issues.effort_of_unresolved(RuleType::CodeSmell, true))
        })
        .leak(),
        Formula::new(NEW_RELIABILITY_REMEDIATION_EFFORT, SumChildren, |ctx, issues| {
            ctx.set_number(issues.effort_of_unresolved(RuleType::Bug, true))
        })
        .leak(),
        Formula::new(NEW_SECURITY_REMEDIATION_EFFORT, SumChildren, |ctx, issues| {
            ctx.set_number(issues.effort_of_unresolved(RuleType::Vulnerability, true))
        })
        .leak(),
        Formula::new(NEW_RELIABILITY_RATING, MaxRatingChildren, |ctx, issues| {
            ctx.set_rating(severity_rating(issues, RuleType::Bug, true))
        })
        .leak(),
        Formula::new(NEW_SECURITY_RATING, MaxRatingChildren, |ctx, issues| {
            ctx.set_rating(severity_rating(issues, RuleType::Vulnerability, true))
        })
        .leak(),
        Formula::new(
            NEW_SECURITY_HOTSPOTS_REVIEWED_STATUS,
            HierarchyStep::Custom(|ctx| {
                let children = ctx.children_hotspots_reviewed(
                    NEW_SECURITY_HOTSPOTS_REVIEWED_STATUS,
                    NEW_SECURITY_HOTSPOTS_REVIEWED,
                    NEW_SECURITY_HOTSPOTS,
                )?;
                own_plus(ctx, children)
            }),
            |ctx, issues| ctx.set_count(issues.count_hotspots_by_status(IssueStatus::Reviewed, true)),
        )
        .leak(),
        Formula::new(
            NEW_SECURITY_HOTSPOTS_TO_REVIEW_STATUS,
            HierarchyStep::Custom(|ctx| {
                let children = ctx.children_hotspots_to_review(
                    NEW_SECURITY_HOTSPOTS_TO_REVIEW_STATUS,
                    NEW_SECURITY_HOTSPOTS,
                )?;
                own_plus(ctx, children)
            }),
            |ctx, issues| ctx.set_count(issues.count_hotspots_by_status(IssueStatus::ToReview, true)),
        )
        .leak(),
        Formula::new(
            NEW_SECURITY_HOTSPOTS_REVIEWED,
            HierarchyStep::Custom(|ctx| {
                let percent = status_review_percent(
                    ctx,
                    NEW_SECURITY_HOTSPOTS_TO_REVIEW_STATUS,
                    NEW_SECURITY_HOTSPOTS_REVIEWED_STATUS,
                )?;
                set_percent(ctx, percent)
            }),
            |ctx, issues| set_percent(ctx, issues_review_percent(issues, true)),
        )
        .leak()
        .depends_on(&[
            NEW_SECURITY_HOTSPOTS_TO_REVIEW_STATUS,
            NEW_SECURITY_HOTSPOTS_REVIEWED_STATUS,
        ]),
        Formula::new(
            NEW_SECURITY_REVIEW_RATING,
            HierarchyStep::Custom(|ctx| {
                let percent = ctx.value(NEW_SECURITY_HOTSPOTS_REVIEWED)?;
                ctx.set_rating(review_rating(percent))
            }),
            |ctx, issues| ctx.set_rating(review_rating(issues_review_percent(issues, true))),
        )
        .leak()
        .depends_on(&[NEW_SECURITY_HOTSPOTS_REVIEWED]),
        Formula::new(
            NEW_SQALE_DEBT_RATIO,
            HierarchyStep::Custom(|ctx| {
                debt_ratio(ctx, NEW_TECHNICAL_DEBT, DevelopmentCost::NewCode)
            }),
            |ctx, _| debt_ratio(ctx, NEW_TECHNICAL_DEBT, DevelopmentCost::NewCode),
        )
        .leak()
        .depends_on(&[NEW_TECHNICAL_DEBT, NEW_DEVELOPMENT_COST]),
        Formula::new(
            NEW_MAINTAINABILITY_RATING,
            HierarchyStep::Custom(|ctx| {
                debt_rating(ctx, NEW_TECHNICAL_DEBT, DevelopmentCost::NewCode)
            }),
            |ctx, _| debt_rating(ctx, NEW_TECHNICAL_DEBT, DevelopmentCost::NewCode),
        )
        .leak()
        .depends_on(&[NEW_TECHNICAL_DEBT, NEW_DEVELOPMENT_COST]),
        Formula::new(
            SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
            SumChildren,
            |ctx, issues| {
                ctx.set_number(
                    issues.effort_of_unresolved_by_quality(SoftwareQuality::Maintainability, false),
                )
            },
        )
        .only_if_computed_on_branch(),
        Formula::new(
            SOFTWARE_QUALITY_RELIABILITY_REMEDIATION_EFFORT,
            SumChildren,
            |ctx, issues| {
                ctx.set_number(
                    issues.effort_of_unresolved_by_quality(SoftwareQuality::Reliability, false),
                )
            },
        )
        .only_if_computed_on_branch(),
        Formula::new(
            SOFTWARE_QUALITY_SECURITY_REMEDIATION_EFFORT,
            SumChildren,
            |ctx, issues| {
                ctx.set_number(
                    issues.effort_of_unresolved_by_quality(SoftwareQuality::Security, false),
                )
            },
        )
        .only_if_computed_on_branch(),
        Formula::new(
            NEW_SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
            SumChildren,
            |ctx, issues| {
                ctx.set_number(
                    issues.effort_of_unresolved_by_quality(SoftwareQuality::Maintainability, true),
                )
            },
        )
        .leak()
        .only_if_computed_on_branch(),
        Formula::new(
            NEW_SOFTWARE_QUALITY_RELIABILITY_REMEDIATION_EFFORT,
            SumChildren,
            |ctx, issues| {
                ctx.set_number(
                    issues.effort_of_unresolved_by_quality(SoftwareQuality::Reliability, true),
                )
            },
        )
        .leak()
        .only_if_computed_on_branch(),
        Formula::new(
            NEW_SOFTWARE_QUALITY_SECURITY_REMEDIATION_EFFORT,
            SumChildren,
            |ctx, issues| {
                ctx.set_number(
                    issues.effort_of_unresolved_by_quality(SoftwareQuality::Security, true),
                )
            },
        )
        .leak()
        .only_if_computed_on_branch(),
        Formula::new(
            SOFTWARE_QUALITY_MAINTAINABILITY_DEBT_RATIO,
            HierarchyStep::Custom(|ctx| {
                debt_ratio(
                    ctx,
                    SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
                    DevelopmentCost::Overall,
                )
            }),
            |ctx, _| {
                debt_ratio(
                    ctx,
                    SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
                    DevelopmentCost::Overall,
                )
            },
        )
        .only_if_computed_on_branch()
        .depends_on(&[
            SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
            DEVELOPMENT_COST,
        ]),
        Formula::new(
            NEW_SOFTWARE_QUALITY_MAINTAINABILITY_DEBT_RATIO,
            HierarchyStep::Custom(|ctx| {
                debt_ratio(
                    ctx,
                    NEW_SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
                    DevelopmentCost::NewCode,
                )
            }),
            |ctx, _| {
                debt_ratio(
                    ctx,
                    NEW_SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
                    DevelopmentCost::NewCode,
                )
            },
        )
        .leak()
        .only_if_computed_on_branch()
        .depends_on(&[
            NEW_SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
            NEW_DEVELOPMENT_COST,
        ]),
        Formula::new(
            SOFTWARE_QUALITY_MAINTAINABILITY_RATING,
            HierarchyStep::Custom(|ctx| {
                debt_rating(
                    ctx,
                    SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
                    DevelopmentCost::Overall,
                )
            }),
            |ctx, _| {
                debt_rating(
                    ctx,
                    SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
                    DevelopmentCost::Overall,
                )
            },
        )
        .only_if_computed_on_branch()
        .depends_on(&[
            SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
            DEVELOPMENT_COST,
        ]),
        Formula::new(
            NEW_SOFTWARE_QUALITY_MAINTAINABILITY_RATING,
            HierarchyStep::Custom(|ctx| {
                debt_rating(
                    ctx,
                    NEW_SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
                    DevelopmentCost::NewCode,
                )
            }),
            |ctx, _| {
                debt_rating(
                    ctx,
                    NEW_SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
                    DevelopmentCost::NewCode,
                )
            },
        )
        .leak()
        .only_if_computed_on_branch()
        .depends_on(&[
            NEW_SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
            NEW_DEVELOPMENT_COST,
        ]),
        Formula::new(
            EFFORT_TO_REACH_SOFTWARE_QUALITY_MAINTAINABILITY_RATING_A,
            HierarchyStep::Custom(|ctx| {
                effort_to_rating_a(ctx, SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT)
            }),
            |ctx, _| effort_to_rating_a(ctx, SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT),
        )
        .only_if_computed_on_branch()
        .depends_on(&[
            SOFTWARE_QUALITY_MAINTAINABILITY_REMEDIATION_EFFORT,
            DEVELOPMENT_COST,
        ]),
        Formula::new(SOFTWARE_QUALITY_RELIABILITY_RATING, MaxRatingChildren, |ctx, issues| {
            ctx.set_rating(impact_rating(issues, SoftwareQuality::Reliability, false))
        })
        .only_if_computed_on_branch(),
        Formula::new(
            NEW_SOFTWARE_QUALITY_RELIABILITY_RATING,
            MaxRatingChildren,
            |ctx, issues| ctx.set_rating(impact_rating(issues, SoftwareQuality::Reliability, true)),
        )
        .leak()
        .only_if_computed_on_branch(),
        Formula::new(SOFTWARE_QUALITY_SECURITY_RATING, MaxRatingChildren, |ctx, issues| {
            ctx.set_rating(impact_rating(issues, SoftwareQuality::Security, false))
        })
        .only_if_computed_on_branch(),
        Formula::new(
            NEW_SOFTWARE_QUALITY_SECURITY_RATING,
            MaxRatingChildren,
            |ctx, issues| ctx.set_rating(impact_rating(issues, SoftwareQuality::Security, true)),
        )
        .leak()
        .only_if_computed_on_branch(),
        Formula::new(
            SOFTWARE_QUALITY_SECURITY_REVIEW_RATING,
            HierarchyStep::Custom(|ctx| {
                let percent = ctx.value(SECURITY_HOTSPOTS_REVIEWED)?;
                ctx.set_rating(review_rating_a_to_d(percent))
            }),
            |ctx, issues| {
                ctx.set_rating(review_rating_a_to_d(issues_review_percent(issues, false)))
            },
        )
        .only_if_computed_on_branch()
        .depends_on(&[SECURITY_HOTSPOTS_REVIEWED]),
        Formula::new(
            NEW_SOFTWARE_QUALITY_SECURITY_REVIEW_RATING,
            HierarchyStep::Custom(|ctx| {
                let percent = ctx.value(NEW_SECURITY_HOTSPOTS_REVIEWED)?;
                ctx.set_rating(review_rating_a_to_d(percent))
            }),
            |ctx, issues| {
                ctx.set_rating(review_rating_a_to_d(issues_review_percent(issues, true)))
            },
        )
        .leak()
        .only_if_computed_on_branch()
        .depends_on(&[NEW_SECURITY_HOTSPOTS_REVIEWED]),
    ]
}
