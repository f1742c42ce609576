//! Forecast accuracy evaluation against held-out actuals

use crate::engine::ForecastEngine;
use crate::error::{ForecastError, Result};
use crate::window::Observation;

/// Aggregate error metrics from one evaluation pass
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationMetrics {
    /// Mean Absolute Error
    pub mean_absolute_error: f64,
    /// Root Mean Squared Error
    pub root_mean_squared_error: f64,
}

impl std::fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Evaluation Metrics")?;
        writeln!(f, "---------------------")?;
        writeln!(f, "  MAE:  {:.3}", self.mean_absolute_error)?;
        writeln!(f, "  RMSE: {:.3}", self.root_mean_squared_error)?;
        Ok(())
    }
}

/// Score a fitted engine's forecast against held-out actuals.
///
/// The forecast is aligned step-for-step with the start of the holdout and
/// the comparison covers the shorter of the two, so a holdout shorter than
/// the horizon scores only the overlapping prefix and a longer one ignores
/// steps past the horizon. An empty holdout is `InsufficientData`, never a
/// metrics object with NaN fields.
pub fn evaluate(engine: &ForecastEngine, holdout: &[Observation]) -> Result<EvaluationMetrics> {
    if holdout.is_empty() {
        return Err(ForecastError::InsufficientData(
            "Holdout series is empty; nothing to evaluate".to_string(),
        ));
    }

    let result = engine.predict()?;
    let forecast = result.forecast();
    let steps = holdout.len().min(forecast.len());

    let residuals: Vec<f64> = holdout[..steps]
        .iter()
        .zip(forecast[..steps].iter())
        .map(|(actual, predicted)| actual.value - predicted)
        .collect();

    let n = residuals.len() as f64;
    let mean_absolute_error = residuals.iter().map(|e| e.abs()).sum::<f64>() / n;
    let root_mean_squared_error =
        (residuals.iter().map(|e| e * e).sum::<f64>() / n).sqrt();

    Ok(EvaluationMetrics {
        mean_absolute_error,
        root_mean_squared_error,
    })
}
