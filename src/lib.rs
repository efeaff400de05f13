//! # Livemeasure-RS: Incremental Live Measure Recomputation
//!
//! Recomputes derived quality measures (issue counts, remediation effort,
//! debt ratios, letter ratings, hotspot review rates, quality gate status)
//! for the part of a component tree touched by new analysis data, without
//! re-analyzing the whole project.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    LiveMeasureComputer                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Component  │ Measure   │ Formula        │ Quality  │ Store   │
//! │ Index      │ Matrix    │ Engine         │ Gate     │         │
//! │            │           │                │          │         │
//! │ • subtree  │ • sparse  │ • leaf pass    │ • conds  │ • trait │
//! │ • ordering │ • diffing │ • hierarchy    │ • status │ • memory│
//! │ • children │ • scales  │ • catalog      │ • detail │         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use livemeasure_rs::{InMemoryStore, LiveMeasureComputer, LiveMeasureConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryStore::from_file("dataset.json")?);
//!     let touched = store.snapshot().components.into_iter().take(1).collect::<Vec<_>>();
//!
//!     let computer = LiveMeasureComputer::new(store, LiveMeasureConfig::default())?;
//!     let report = computer.refresh(&touched).await;
//!     for event in &report.events {
//!         println!("{}: {}", event.branch.key, event.evaluated_gate.status);
//!     }
//!     for failure in &report.failures {
//!         eprintln!("{}: {}", failure.branch_uuid, failure.error);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Shared building blocks
pub mod core {
    //! Errors, configuration and rating grids.

    pub mod config;
    pub mod errors;
    pub mod rating;
}

// Recomputation engine
pub mod live {
    //! Incremental recomputation of live measures.

    pub mod component_index;
    pub mod computer;
    pub mod formula;
    pub mod formulas;
    pub mod impact;
    pub mod issue_counter;
    pub mod measure_matrix;
    pub mod metrics;
    pub mod quality_gate;
    pub mod tree_updater;
    pub mod types;
}

// Storage collaborators
pub mod io {
    //! Storage contracts and the in-memory store.

    pub mod memory;
    pub mod store;
}

// Re-export primary types for convenience
pub use core::config::LiveMeasureConfig;
pub use core::errors::{LiveMeasureError, Result, ResultExt};
pub use core::rating::{DebtRatingGrid, Rating};
pub use io::memory::{Dataset, InMemoryStore};
pub use io::store::{LiveMeasureStore, StoreSession};
pub use live::computer::{
    BranchFailure, LiveMeasureComputer, QualityGateChangeEvent, RefreshReport,
};
pub use live::formulas::FormulaCatalog;
pub use live::quality_gate::{EvaluatedQualityGate, QualityGate, QualityGateStatus};
