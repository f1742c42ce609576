//! Forecast engine owning the fitted decomposition and its working window.
//!
//! Mutating operations (`fit`, `update`, `restore`) take `&mut self` and
//! read-only forecasting takes `&self`, so the single-writer discipline is
//! enforced by the borrow checker: concurrent `predict` calls against a
//! quiescent engine are fine, while mutation requires exclusive access.
//! Independent engines share no state and may run in parallel.

use crate::data::StateStore;
use crate::decompose::{self, SsaDecomposition};
use crate::error::{ForecastError, Result};
use crate::window::{Observation, SeriesWindow};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Checkpoint blob format version; bumped on incompatible layout changes
const STATE_FORMAT_VERSION: u32 = 1;

/// Engine tunables, validated once at construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Embedding dimension (W) used when building the trajectory matrix
    pub window_size: usize,
    /// Total history retained in the working window (L); must exceed W
    pub series_length: usize,
    /// Maximum number of trailing observations used to fit (T)
    pub train_size: usize,
    /// Number of future periods to forecast (H)
    pub horizon: usize,
    /// Band-width parameter in (0, 1) exclusive.
    ///
    /// The value scales the width of the confidence band directly, so a
    /// LOWER value gives TIGHTER bounds. It is not coverage probability in
    /// the classical sense; callers expecting classical semantics must
    /// invert it first.
    pub confidence_level: f64,
    /// Floor every forecast value and bound is clamped to; revenue cannot
    /// go negative, so this defaults to 0
    pub domain_floor: f64,
}

impl EngineConfig {
    /// Create a configuration with the default domain floor of 0
    pub fn new(
        window_size: usize,
        series_length: usize,
        train_size: usize,
        horizon: usize,
        confidence_level: f64,
    ) -> Self {
        Self {
            window_size,
            series_length,
            train_size,
            horizon,
            confidence_level,
            domain_floor: 0.0,
        }
    }

    /// Override the domain floor
    pub fn with_domain_floor(mut self, domain_floor: f64) -> Self {
        self.domain_floor = domain_floor;
        self
    }

    /// Check every tunable against its stated constraint.
    ///
    /// Runs at engine construction so invalid combinations fail fast and
    /// never surface mid-fit.
    pub fn validate(&self) -> Result<()> {
        if self.window_size < 2 {
            return Err(ForecastError::InvalidConfiguration(format!(
                "Window size must be greater than 1, got {}",
                self.window_size
            )));
        }
        if self.window_size >= self.series_length {
            return Err(ForecastError::InvalidConfiguration(format!(
                "Window size ({}) must be smaller than series length ({})",
                self.window_size, self.series_length
            )));
        }
        if self.train_size < self.window_size + 1 {
            return Err(ForecastError::InvalidConfiguration(format!(
                "Train size ({}) must be at least window size + 1 ({}); \
                 a smaller training budget can never fit",
                self.train_size,
                self.window_size + 1
            )));
        }
        if self.horizon == 0 {
            return Err(ForecastError::InvalidConfiguration(
                "Horizon must be at least 1".to_string(),
            ));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ForecastError::InvalidConfiguration(format!(
                "Confidence level must be between 0 and 1 exclusive, got {}",
                self.confidence_level
            )));
        }
        if !self.domain_floor.is_finite() {
            return Err(ForecastError::InvalidConfiguration(format!(
                "Domain floor must be finite, got {}",
                self.domain_floor
            )));
        }

        Ok(())
    }

    /// Standard-normal quantile backing the band half-width.
    ///
    /// `z(c) = Phi^-1(0.5 + c/2)`, monotonically increasing in `c`, so the
    /// documented smaller-c-means-tighter-bounds behavior holds.
    fn confidence_multiplier(&self) -> Result<f64> {
        let normal = Normal::new(0.0, 1.0).map_err(|e| {
            ForecastError::InvalidConfiguration(format!("Normal distribution: {}", e))
        })?;
        Ok(normal.inverse_cdf(0.5 + self.confidence_level / 2.0))
    }
}

/// The fitted decomposition plus the trailing context needed to continue
/// the series autoregressively. This is the unit that checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastModelState {
    /// Blob layout version
    format_version: u32,
    /// Embedding dimension the state was fitted with
    window_size: usize,
    /// Retained signal-subspace eigenvectors, dominant first
    eigenvectors: Vec<Vec<f64>>,
    /// Linear recurrence coefficients, oldest lag first
    recurrence: Vec<f64>,
    /// Trailing-lag buffer: the last `window_size - 1` values, oldest first
    lags: Vec<f64>,
    /// One-step-ahead residual standard deviation from fitting
    residual_std: f64,
    /// Period of the newest observation the state has absorbed
    last_period: i64,
}

impl ForecastModelState {
    fn from_fit(decomposition: SsaDecomposition, lags: Vec<f64>, last_period: i64) -> Self {
        let window_size = lags.len() + 1;
        Self {
            format_version: STATE_FORMAT_VERSION,
            window_size,
            eigenvectors: decomposition.eigenvectors,
            recurrence: decomposition.recurrence,
            lags,
            residual_std: decomposition.residual_std,
            last_period,
        }
    }
}

/// Point forecast with confidence bounds for periods `t+1 .. t+horizon`
/// relative to the last trained period `t`.
///
/// `lower_bound[i] <= forecast[i] <= upper_bound[i]` holds for every step;
/// all three sequences are clamped to the configured domain floor.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    forecast: Vec<f64>,
    lower_bound: Vec<f64>,
    upper_bound: Vec<f64>,
}

impl ForecastResult {
    /// Point forecast per future period
    pub fn forecast(&self) -> &[f64] {
        &self.forecast
    }

    /// Lower confidence bound per future period
    pub fn lower_bound(&self) -> &[f64] {
        &self.lower_bound
    }

    /// Upper confidence bound per future period
    pub fn upper_bound(&self) -> &[f64] {
        &self.upper_bound
    }

    /// Number of forecast periods
    pub fn horizon(&self) -> usize {
        self.forecast.len()
    }
}

impl std::fmt::Display for ForecastResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast")?;
        writeln!(f, "---------------------")?;
        for i in 0..self.forecast.len() {
            writeln!(
                f,
                "Step {}: lower {:.3}, forecast {:.3}, upper {:.3}",
                i + 1,
                self.lower_bound[i],
                self.forecast[i],
                self.upper_bound[i]
            )?;
        }
        Ok(())
    }
}

/// Windowed decomposition-and-recurrence forecaster.
///
/// Owns exactly one [`ForecastModelState`] and one [`SeriesWindow`];
/// re-fitting replaces both together, never one without the other.
#[derive(Debug)]
pub struct ForecastEngine {
    config: EngineConfig,
    z_score: f64,
    window: SeriesWindow,
    state: Option<ForecastModelState>,
}

impl ForecastEngine {
    /// Create an unfitted engine. Fails with `InvalidConfiguration` if any
    /// tunable violates its constraint.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let z_score = config.confidence_multiplier()?;
        let window = SeriesWindow::new(config.series_length)?;

        Ok(Self {
            config,
            z_score,
            window,
            state: None,
        })
    }

    /// The configuration the engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether the engine holds a fitted model state
    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Fit the decomposition to the trailing `train_size` observations of
    /// an ordered series.
    ///
    /// Embeds the series into lagged windows, extracts the dominant signal
    /// subspace, derives the linear recurrence, and measures one-step
    /// residual error. On success the model state and the working window
    /// are replaced together; on any failure the previous fit is untouched.
    pub fn fit(&mut self, series: &[Observation]) -> Result<()> {
        for pair in series.windows(2) {
            if pair[1].period <= pair[0].period {
                return Err(ForecastError::InvalidInput(format!(
                    "Series periods must be strictly increasing: {} follows {}",
                    pair[1].period, pair[0].period
                )));
            }
        }

        let start = series.len().saturating_sub(self.config.train_size);
        let training = &series[start..];
        if training.len() < self.config.window_size + 1 {
            return Err(ForecastError::InsufficientData(format!(
                "Need at least {} observations to fit, got {}",
                self.config.window_size + 1,
                training.len()
            )));
        }

        let values: Vec<f64> = training.iter().map(|obs| obs.value).collect();
        let decomposition = decompose::fit(&values, self.config.window_size)?;

        let lags = values[values.len() - (self.config.window_size - 1)..].to_vec();
        let last_period = training[training.len() - 1].period;
        let window = SeriesWindow::from_series(self.config.series_length, series)?;

        // All fallible work is done; install the new state and window as one
        self.state = Some(ForecastModelState::from_fit(decomposition, lags, last_period));
        self.window = window;

        Ok(())
    }

    /// Absorb one new observation without re-fitting.
    ///
    /// Appends to the working window and shifts the trailing-lag buffer;
    /// the retained eigenvectors are untouched, so a full [`fit`] is still
    /// needed to pick up new trend or seasonal structure.
    ///
    /// [`fit`]: ForecastEngine::fit
    pub fn update(&mut self, observation: Observation) -> Result<()> {
        let state = self.state.as_mut().ok_or_else(|| {
            ForecastError::InsufficientData("Engine has not been fitted".to_string())
        })?;

        self.window.append(observation)?;

        state.lags.remove(0);
        state.lags.push(observation.value);
        state.last_period = observation.period;

        Ok(())
    }

    /// Roll the recurrence forward `horizon` steps and attach confidence
    /// bounds.
    ///
    /// Pure autoregressive rollout: each step's output becomes the newest
    /// lag for the next. The band half-width at step `i` is
    /// `z(c) * residual_std * sqrt(i + 1)`, so uncertainty compounds
    /// forward and never shrinks. Every output value is clamped to the
    /// domain floor.
    pub fn predict(&self) -> Result<ForecastResult> {
        let state = self.state.as_ref().ok_or_else(|| {
            ForecastError::InsufficientData("Engine has not been fitted".to_string())
        })?;

        let mut lags = state.lags.clone();
        let mut forecast = Vec::with_capacity(self.config.horizon);
        for _ in 0..self.config.horizon {
            let next = decompose::recurrence_step(&state.recurrence, &lags);
            lags.remove(0);
            lags.push(next);
            forecast.push(next);
        }

        let floor = self.config.domain_floor;
        let mut lower_bound = Vec::with_capacity(forecast.len());
        let mut upper_bound = Vec::with_capacity(forecast.len());
        for (i, value) in forecast.iter().enumerate() {
            let half_width = self.z_score * state.residual_std * ((i + 1) as f64).sqrt();
            lower_bound.push((value - half_width).max(floor));
            upper_bound.push((value + half_width).max(floor));
        }
        let forecast: Vec<f64> = forecast.into_iter().map(|v| v.max(floor)).collect();

        Ok(ForecastResult {
            forecast,
            lower_bound,
            upper_bound,
        })
    }

    /// Serialize the fitted model state to a self-describing blob.
    ///
    /// Restoring the blob into an engine with the same configuration
    /// reproduces `predict()` output exactly.
    pub fn checkpoint(&self) -> Result<Vec<u8>> {
        let state = self.state.as_ref().ok_or_else(|| {
            ForecastError::InsufficientData("Engine has not been fitted".to_string())
        })?;

        serde_json::to_vec(state)
            .map_err(|e| ForecastError::SerializationFailure(e.to_string()))
    }

    /// Replace the engine's model state with a previously checkpointed one.
    ///
    /// The blob must carry the current format version and match the
    /// engine's window size; anything else is a `SerializationFailure` and
    /// leaves the engine unchanged. The working window is reseeded from the
    /// restored trailing lags.
    pub fn restore(&mut self, blob: &[u8]) -> Result<()> {
        let state: ForecastModelState = serde_json::from_slice(blob)
            .map_err(|e| ForecastError::SerializationFailure(e.to_string()))?;

        if state.format_version != STATE_FORMAT_VERSION {
            return Err(ForecastError::SerializationFailure(format!(
                "Unsupported state format version {} (expected {})",
                state.format_version, STATE_FORMAT_VERSION
            )));
        }
        if state.window_size != self.config.window_size {
            return Err(ForecastError::SerializationFailure(format!(
                "State was fitted with window size {} but the engine uses {}",
                state.window_size, self.config.window_size
            )));
        }
        let lag_count = self.config.window_size - 1;
        if state.lags.len() != lag_count
            || state.recurrence.len() != lag_count
            || state.eigenvectors.is_empty()
            || state.eigenvectors.iter().any(|u| u.len() != state.window_size)
        {
            return Err(ForecastError::SerializationFailure(
                "State dimensions are inconsistent with its window size".to_string(),
            ));
        }

        let mut window = SeriesWindow::new(self.config.series_length)?;
        for (i, value) in state.lags.iter().enumerate() {
            let offset = (state.lags.len() - 1 - i) as i64;
            window.append(Observation::new(state.last_period - offset, *value))?;
        }

        self.state = Some(state);
        self.window = window;

        Ok(())
    }

    /// Checkpoint through a persistence collaborator
    pub fn checkpoint_to(&self, store: &mut dyn StateStore) -> Result<()> {
        let blob = self.checkpoint()?;
        store.save(&blob)
    }

    /// Restore through a persistence collaborator
    pub fn restore_from(&mut self, store: &dyn StateStore) -> Result<()> {
        let blob = store.load()?;
        self.restore(&blob)
    }

    /// Ordered copy of the engine's working window
    pub fn window_snapshot(&self) -> Vec<Observation> {
        self.window.snapshot()
    }
}
