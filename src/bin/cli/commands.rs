//! Command execution for the livemeasure binary.

use std::path::Path;
use std::sync::Arc;

use owo_colors::OwoColorize;
use tabled::{settings::Style as TableStyle, Table, Tabled};
use tracing::{debug, info};

use crate::cli::args::*;
use livemeasure_rs::core::config::LoggingConfig;
use livemeasure_rs::live::quality_gate::QualityGateStatus;
use livemeasure_rs::live::types::{Component, MeasureValue};
use livemeasure_rs::{
    FormulaCatalog, InMemoryStore, LiveMeasureComputer, LiveMeasureConfig, QualityGateChangeEvent,
};

/// Logging settings for a command line: config file values, overridden by flags.
pub fn logging_settings(cli: &Cli) -> LoggingConfig {
    let mut logging = match &cli.command {
        Commands::Recompute(args) => args
            .config
            .as_deref()
            .and_then(|path| LiveMeasureConfig::from_yaml_file(path).ok())
            .map(|config| config.logging)
            .unwrap_or_default(),
        _ => LoggingConfig::default(),
    };
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    logging.json |= cli.json_logs;
    logging
}

/// Load configuration from file or use defaults
pub fn load_configuration(path: Option<&Path>) -> anyhow::Result<LiveMeasureConfig> {
    let config = match path {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            LiveMeasureConfig::from_yaml_file(path)?
        }
        None => LiveMeasureConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Recompute live measures for the touched components of a dataset
pub async fn recompute(args: RecomputeArgs) -> anyhow::Result<()> {
    let config = load_configuration(args.config.as_deref())?;
    let store = Arc::new(InMemoryStore::from_file(&args.dataset)?);

    let components = store.snapshot().components;
    let touched = resolve_touched(&components, &args.touched)?;
    info!(
        "Recomputing {} touched components from {}",
        touched.len(),
        args.dataset.display()
    );

    let computer = LiveMeasureComputer::new(store.clone(), config)?;
    let report = computer.refresh(&touched).await;
    let events = &report.events;

    if args.write_back {
        store.snapshot().to_file(&args.dataset)?;
        info!("Wrote measures back to {}", args.dataset.display());
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(events)?),
        OutputFormat::Pretty => print_events(events),
    }

    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            "❌ Branch rolled back".bright_red().bold(),
            failure.branch_uuid,
            failure.error
        );
    }
    if !report.is_success() {
        anyhow::bail!("{} branch(es) failed to recompute", report.failures.len());
    }
    Ok(())
}

fn resolve_touched(components: &[Component], uuids: &[String]) -> anyhow::Result<Vec<Component>> {
    uuids
        .iter()
        .map(|uuid| {
            components
                .iter()
                .find(|c| &c.uuid == uuid)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Unknown component: {uuid}"))
        })
        .collect()
}

fn print_events(events: &[QualityGateChangeEvent]) {
    if events.is_empty() {
        println!("{}", "No branch was recomputed".dimmed());
        return;
    }

    #[derive(Tabled)]
    struct MeasureRow {
        component: String,
        metric: String,
        value: String,
    }

    #[derive(Tabled)]
    struct ConditionRow {
        metric: String,
        operator: String,
        threshold: String,
        actual: String,
        level: String,
    }

    for event in events {
        let status = match event.evaluated_gate.status {
            QualityGateStatus::Ok => "OK".bright_green().bold().to_string(),
            QualityGateStatus::Error => "ERROR".bright_red().bold().to_string(),
        };
        let previous = event
            .previous_status
            .map_or_else(|| "none".to_string(), |s| s.to_string());
        println!(
            "{} {} {} (previously {})",
            "📊 Branch".bright_blue().bold(),
            event.branch.key.cyan(),
            status,
            previous.dimmed()
        );
        println!();

        if !event.evaluated_gate.conditions.is_empty() {
            let rows: Vec<ConditionRow> = event
                .evaluated_gate
                .conditions
                .iter()
                .map(|c| ConditionRow {
                    metric: c.condition.metric_key.clone(),
                    operator: c.condition.operator.to_string(),
                    threshold: c.condition.error_threshold.clone(),
                    actual: c.actual.clone().unwrap_or_else(|| "-".to_string()),
                    level: c.status.to_string(),
                })
                .collect();
            let mut table = Table::new(rows);
            table.with(TableStyle::rounded());
            println!("{table}");
            println!();
        }

        println!(
            "{} {}",
            event.changed_measures.len().to_string().bright_green().bold(),
            "measures changed".bright_green()
        );
        if event.changed_measures.is_empty() {
            println!();
            continue;
        }
        let rows: Vec<MeasureRow> = event
            .changed_measures
            .iter()
            .map(|m| MeasureRow {
                component: m.component_uuid.clone(),
                metric: m.metric_key.clone(),
                value: m
                    .value
                    .as_ref()
                    .map_or_else(|| "(removed)".to_string(), display_value),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(TableStyle::rounded());
        println!("{table}");
        println!();
    }
}

fn display_value(value: &MeasureValue) -> String {
    match value {
        MeasureValue::Number(n) => n.to_string(),
        MeasureValue::Rating(r) => r.letter().to_string(),
        MeasureValue::Text(t) => t.clone(),
    }
}

/// List the built-in formulas in execution order
pub async fn list_formulas() -> anyhow::Result<()> {
    let catalog = FormulaCatalog::standard();
    println!("{}", "🧮 Formula Catalog".bright_blue().bold());
    println!("   {} formulas, run in this order", catalog.len());
    println!();

    #[derive(Tabled)]
    struct FormulaRow {
        metric: String,
        new_code: String,
        requires_branch_value: String,
        hierarchy: String,
        dependencies: String,
    }

    let rows: Vec<FormulaRow> = catalog
        .formulas()
        .iter()
        .map(|f| FormulaRow {
            metric: f.metric_key().to_string(),
            new_code: yes_no(f.is_on_leak()),
            requires_branch_value: yes_no(f.requires_branch_value()),
            hierarchy: f.hierarchy().label().to_string(),
            dependencies: f.dependencies().join(", "),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{table}");
    Ok(())
}

fn yes_no(flag: bool) -> String {
    let text = if flag { "yes" } else { "" };
    text.to_string()
}

/// Print default configuration in YAML format
pub async fn print_default_config() -> anyhow::Result<()> {
    println!("{}", "# Default livemeasure configuration".dimmed());
    println!("{}", "# Save this to a file and customize as needed".dimmed());
    println!(
        "{}",
        "# Usage: livemeasure recompute --config your-config.yml ...".dimmed()
    );
    println!();

    let yaml_output = serde_yaml::to_string(&LiveMeasureConfig::default())?;
    println!("{yaml_output}");
    Ok(())
}

/// Validate a configuration file and summarize it
pub async fn validate_config(args: ValidateConfigArgs) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "🔍 Validating configuration:".bright_blue().bold(),
        args.config.display().to_string().cyan()
    );
    println!();

    let config = match load_configuration(Some(args.config.as_path())) {
        Ok(config) => {
            println!("{}", "✅ Configuration file is valid!".bright_green().bold());
            println!();
            config
        }
        Err(e) => {
            eprintln!("{} {}", "❌ Configuration validation failed:".red(), e);
            println!();
            println!(
                "{}",
                "💡 Tip: Use 'livemeasure print-default-config' to see valid format".dimmed()
            );
            std::process::exit(1);
        }
    };

    #[derive(Tabled)]
    struct SettingRow {
        setting: String,
        value: String,
    }

    let grid = config
        .rating
        .debt_rating_grid
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let rows = vec![
        SettingRow {
            setting: "Debt Rating Grid".to_string(),
            value: grid,
        },
        SettingRow {
            setting: "Log Level".to_string(),
            value: config.logging.level.clone(),
        },
        SettingRow {
            setting: "JSON Logs".to_string(),
            value: config.logging.json.to_string(),
        },
    ];
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{table}");
    Ok(())
}
