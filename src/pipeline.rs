//! End-to-end training pipeline.
//!
//! One run walks a fixed sequence: load the history, split it at the
//! caller's boundary, fit on the training segment, score the holdout, refit
//! on the full series, checkpoint the refitted state, and produce the final
//! forecast. Every stage consumes the previous stage's artifacts and any
//! failure aborts the remaining stages, so a failed run yields an error and
//! never a partial or zero-filled forecast.

use crate::data::{period_year, ObservationSource, StateStore};
use crate::engine::{EngineConfig, ForecastEngine, ForecastResult};
use crate::error::{ForecastError, Result};
use crate::evaluate::{evaluate, EvaluationMetrics};
use crate::window::Observation;

/// Boundary rule deciding segment membership: `true` puts an observation in
/// the training segment, `false` in the holdout.
///
/// The rule partitions by the observation itself (e.g. its period's year),
/// never by position count, so the train/holdout composition is explicit
/// per deployment.
pub type SplitRule = Box<dyn Fn(&Observation) -> bool + Send + Sync>;

/// Split rule assigning periods in years strictly before `cutoff_year` to
/// the training segment and everything from that year on to the holdout
pub fn year_cutoff(cutoff_year: i32) -> SplitRule {
    Box::new(move |obs| period_year(obs.period) < cutoff_year)
}

/// Artifacts of a completed pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Holdout accuracy of the training-segment fit
    pub metrics: EvaluationMetrics,
    /// Final forecast from the full-series refit
    pub forecast: ForecastResult,
}

/// Sequential fit/evaluate/refit/forecast orchestrator.
///
/// All collaborators are injected at construction; the pipeline holds no
/// ambient connection strings or model paths. Independent pipelines over
/// different series share nothing and may run in parallel.
pub struct TrainingPipeline<S: ObservationSource, P: StateStore> {
    config: EngineConfig,
    source: S,
    store: P,
    split: SplitRule,
}

impl<S: ObservationSource, P: StateStore> TrainingPipeline<S, P> {
    /// Create a pipeline from its configuration and collaborators
    pub fn new(config: EngineConfig, source: S, store: P, split: SplitRule) -> Self {
        Self {
            config,
            source,
            store,
            split,
        }
    }

    /// Execute the full run and return the holdout metrics together with
    /// the final forecast
    pub fn run(&mut self) -> Result<PipelineOutcome> {
        // LOAD
        let series = self.source.load()?;
        for pair in series.windows(2) {
            if pair[1].period <= pair[0].period {
                return Err(ForecastError::InvalidInput(format!(
                    "Loaded series is not strictly ordered: period {} follows {}",
                    pair[1].period, pair[0].period
                )));
            }
        }

        // SPLIT
        let (train, holdout): (Vec<Observation>, Vec<Observation>) =
            series.iter().copied().partition(|obs| (self.split)(obs));

        // FIT on the training segment
        let mut engine = ForecastEngine::new(self.config)?;
        engine.fit(&train)?;

        // EVALUATE against the holdout
        let metrics = evaluate(&engine, &holdout)?;

        // FIT again on the full series
        engine.fit(&series)?;

        // CHECKPOINT the refitted state
        engine.checkpoint_to(&mut self.store)?;

        // FORECAST
        let forecast = engine.predict()?;

        Ok(PipelineOutcome { metrics, forecast })
    }
}
