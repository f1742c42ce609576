//! Observation buffer backing the forecast engine's working memory

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A single recorded data point: one period of the metric being forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Discrete period index; strictly increasing within one series
    pub period: i64,
    /// Observed value for the period
    pub value: f64,
}

impl Observation {
    /// Create a new observation
    pub fn new(period: i64, value: f64) -> Self {
        Self { period, value }
    }
}

/// Fixed-capacity FIFO buffer holding the most recent observations.
///
/// The window is owned exclusively by the engine that trained on it; the
/// engine replaces it wholesale on every re-fit.
#[derive(Debug, Clone)]
pub struct SeriesWindow {
    /// Maximum number of observations retained (`series_length`)
    capacity: usize,
    /// Buffered observations, oldest first
    buffer: VecDeque<Observation>,
}

impl SeriesWindow {
    /// Create an empty window with the given capacity
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < 2 {
            return Err(ForecastError::InvalidConfiguration(format!(
                "Window capacity must be at least 2, got {}",
                capacity
            )));
        }

        Ok(Self {
            capacity,
            buffer: VecDeque::with_capacity(capacity),
        })
    }

    /// Create a window pre-filled with the trailing `capacity` observations
    /// of `series`. The series must already be ordered by period.
    pub fn from_series(capacity: usize, series: &[Observation]) -> Result<Self> {
        let mut window = Self::new(capacity)?;
        let start = series.len().saturating_sub(capacity);
        for obs in &series[start..] {
            window.append(*obs)?;
        }
        Ok(window)
    }

    /// Append the newest observation, evicting the oldest when full.
    ///
    /// The new period must be strictly greater than the current newest.
    pub fn append(&mut self, observation: Observation) -> Result<()> {
        if let Some(last) = self.buffer.back() {
            if observation.period <= last.period {
                return Err(ForecastError::InvalidInput(format!(
                    "Period {} is not after the newest buffered period {}",
                    observation.period, last.period
                )));
            }
        }

        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(observation);

        Ok(())
    }

    /// Return an immutable ordered copy of the buffered observations
    pub fn snapshot(&self) -> Vec<Observation> {
        self.buffer.iter().copied().collect()
    }

    /// Return the buffered values in order, oldest first
    pub fn values(&self) -> Vec<f64> {
        self.buffer.iter().map(|obs| obs.value).collect()
    }

    /// Period of the newest buffered observation
    pub fn last_period(&self) -> Option<i64> {
        self.buffer.back().map(|obs| obs.period)
    }

    /// Number of buffered observations
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check whether the window holds no observations
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Maximum number of observations the window retains
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
