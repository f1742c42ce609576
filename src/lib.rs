//! # Revenue Forecast
//!
//! A Rust library for forecasting a periodic business metric (e.g. monthly
//! revenue) from its own history using singular spectrum analysis.
//!
//! ## Features
//!
//! - Windowed SSA decomposition with linear-recurrence forecasting
//! - Point forecasts with lower/upper confidence bounds per future period
//! - Checkpoint/restore of fitted model state and cheap incremental updates
//! - Holdout evaluation (MAE/RMSE) and a sequential training pipeline
//! - Pluggable data-source and persistence collaborators
//!
//! ## Quick Start
//!
//! ```no_run
//! use revenue_forecast::data::{CsvSource, FileStore};
//! use revenue_forecast::engine::EngineConfig;
//! use revenue_forecast::pipeline::{year_cutoff, TrainingPipeline};
//!
//! # fn main() -> revenue_forecast::Result<()> {
//! // Five tunables plus the domain floor, validated up front
//! let config = EngineConfig::new(12, 36, 120, 12, 0.95);
//!
//! // Train on everything before 2025, score against 2025 actuals
//! let mut pipeline = TrainingPipeline::new(
//!     config,
//!     CsvSource::new("monthly_revenue.csv"),
//!     FileStore::new("model_state.json"),
//!     year_cutoff(2025),
//! );
//!
//! let outcome = pipeline.run()?;
//! println!("{}", outcome.metrics);
//! println!("{}", outcome.forecast);
//! # Ok(())
//! # }
//! ```
//!
//! ## Confidence convention
//!
//! `confidence_level` scales the width of the forecast band directly: a
//! LOWER value gives TIGHTER bounds. It is not classical coverage
//! probability; see [`EngineConfig::confidence_level`](engine::EngineConfig).

pub mod data;
mod decompose;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod pipeline;
pub mod window;

// Re-export commonly used types
pub use crate::data::{CsvSource, FileStore, ObservationSource, StateStore};
pub use crate::engine::{EngineConfig, ForecastEngine, ForecastModelState, ForecastResult};
pub use crate::error::{ForecastError, Result};
pub use crate::evaluate::{evaluate, EvaluationMetrics};
pub use crate::pipeline::{year_cutoff, PipelineOutcome, SplitRule, TrainingPipeline};
pub use crate::window::{Observation, SeriesWindow};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
