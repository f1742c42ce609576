use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use revenue_forecast::data::{period_index, period_year};
use revenue_forecast::pipeline::year_cutoff;
use revenue_forecast::{
    evaluate, CsvSource, EngineConfig, FileStore, ForecastEngine, ForecastError, Observation,
    ObservationSource, StateStore, TrainingPipeline,
};
use std::io::Write;
use tempfile::NamedTempFile;

// Helper: write a monthly revenue CSV starting at `start_year`-01 with one
// value per row
fn write_monthly_csv(values: &[f64], start_year: i32) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,value").unwrap();
    for (i, value) in values.iter().enumerate() {
        let year = start_year + (i / 12) as i32;
        let month = (i % 12) + 1;
        writeln!(file, "{:04}-{:02}-01,{}", year, month, value).unwrap();
    }
    file
}

#[test]
fn test_period_helpers_round_trip_years() {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    assert_eq!(period_year(period_index(date)), 2024);

    let january = chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let december = chrono::NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
    assert_eq!(period_index(december) - period_index(january), 11);
}

#[test]
fn test_csv_source_loads_ordered_observations() {
    let file = write_monthly_csv(&[100.0, 110.0, 120.0, 130.0, 140.0], 2023);
    let source = CsvSource::new(file.path());

    let series = source.load().unwrap();
    assert_eq!(series.len(), 5);
    assert_eq!(series[0].value, 100.0);
    assert_eq!(series[4].value, 140.0);
    assert!(series.windows(2).all(|p| p[1].period == p[0].period + 1));
}

#[test]
fn test_csv_source_missing_file_fails() {
    let source = CsvSource::new("/nonexistent/revenue.csv");
    let result = source.load();
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_file_store_round_trip() {
    let file = NamedTempFile::new().unwrap();
    let mut store = FileStore::new(file.path());

    store.save(b"checkpoint bytes").unwrap();
    assert_eq!(store.load().unwrap(), b"checkpoint bytes".to_vec());
}

#[test]
fn test_full_pipeline_workflow() {
    // 1. Eighteen months of linear revenue growth: 2023 trains, 2024 holds out
    let values: Vec<f64> = (0..18).map(|i| 100.0 + 10.0 * i as f64).collect();
    let data_file = write_monthly_csv(&values, 2023);
    let state_file = NamedTempFile::new().unwrap();

    let config = EngineConfig::new(4, 12, 18, 6, 0.05);
    let mut pipeline = TrainingPipeline::new(
        config,
        CsvSource::new(data_file.path()),
        FileStore::new(state_file.path()),
        year_cutoff(2024),
    );

    // 2. Run the full sequence
    let outcome = pipeline.run().unwrap();

    // 3. The training fit continues the noiseless ramp, so the holdout
    //    months are predicted almost exactly
    assert!(outcome.metrics.mean_absolute_error < 1e-6);
    assert!(outcome.metrics.root_mean_squared_error < 1e-6);

    // 4. The final forecast extends the full-series refit
    assert_eq!(outcome.forecast.horizon(), 6);
    let expected = [280.0, 290.0, 300.0, 310.0, 320.0, 330.0];
    for (value, want) in outcome.forecast.forecast().iter().zip(expected.iter()) {
        assert!(
            (value - want).abs() < 1e-5,
            "forecast {} expected {}",
            value,
            want
        );
    }

    // 5. The checkpoint written during the run restores into a fresh engine
    //    that reproduces the final forecast
    let store = FileStore::new(state_file.path());
    let mut restored = ForecastEngine::new(config).unwrap();
    restored.restore_from(&store).unwrap();
    let replayed = restored.predict().unwrap();
    assert_eq!(replayed.forecast(), outcome.forecast.forecast());
}

#[test]
fn test_pipeline_rejects_unordered_source() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,value").unwrap();
    writeln!(file, "2023-03-01,100.0").unwrap();
    writeln!(file, "2023-01-01,110.0").unwrap();
    writeln!(file, "2023-02-01,120.0").unwrap();

    let state_file = NamedTempFile::new().unwrap();
    let mut pipeline = TrainingPipeline::new(
        EngineConfig::new(4, 12, 18, 6, 0.05),
        CsvSource::new(file.path()),
        FileStore::new(state_file.path()),
        year_cutoff(2024),
    );

    let result = pipeline.run();
    assert!(matches!(result, Err(ForecastError::InvalidInput(_))));
}

#[test]
fn test_pipeline_with_empty_holdout_fails() {
    // Cutoff beyond the data: everything is training, nothing to score
    let values: Vec<f64> = (0..12).map(|i| 100.0 + 10.0 * i as f64).collect();
    let data_file = write_monthly_csv(&values, 2023);
    let state_file = NamedTempFile::new().unwrap();

    let mut pipeline = TrainingPipeline::new(
        EngineConfig::new(4, 12, 18, 6, 0.05),
        CsvSource::new(data_file.path()),
        FileStore::new(state_file.path()),
        year_cutoff(2030),
    );

    let result = pipeline.run();
    assert!(matches!(result, Err(ForecastError::InsufficientData(_))));
}

#[test]
fn test_evaluate_truncates_to_short_holdout() {
    let series: Vec<Observation> = (0..12)
        .map(|i| Observation::new(i + 1, 1.0 + i as f64))
        .collect();
    let mut engine = ForecastEngine::new(EngineConfig::new(4, 12, 12, 5, 0.05)).unwrap();
    engine.fit(&series).unwrap();

    // Holdout shorter than the horizon: only the overlapping prefix scores
    let holdout = vec![
        Observation::new(13, 13.0),
        Observation::new(14, 15.0),
    ];
    let metrics = evaluate(&engine, &holdout).unwrap();

    // Residuals are 0 and +1 over the two overlapping steps
    assert!((metrics.mean_absolute_error - 0.5).abs() < 1e-6);
    assert!((metrics.root_mean_squared_error - (0.5f64).sqrt()).abs() < 1e-6);
}

#[test]
fn test_evaluate_ignores_holdout_beyond_horizon() {
    let series: Vec<Observation> = (0..12)
        .map(|i| Observation::new(i + 1, 1.0 + i as f64))
        .collect();
    let mut engine = ForecastEngine::new(EngineConfig::new(4, 12, 12, 2, 0.05)).unwrap();
    engine.fit(&series).unwrap();

    // Holdout longer than the horizon: steps past the horizon are ignored,
    // including the wild final value
    let holdout = vec![
        Observation::new(13, 13.0),
        Observation::new(14, 14.0),
        Observation::new(15, 1000.0),
    ];
    let metrics = evaluate(&engine, &holdout).unwrap();
    assert!(metrics.mean_absolute_error < 1e-6);
}

#[test]
fn test_evaluate_empty_holdout_fails() {
    let series: Vec<Observation> = (0..12)
        .map(|i| Observation::new(i + 1, 1.0 + i as f64))
        .collect();
    let mut engine = ForecastEngine::new(EngineConfig::new(4, 12, 12, 3, 0.05)).unwrap();
    engine.fit(&series).unwrap();

    let result = evaluate(&engine, &[]);
    assert!(matches!(result, Err(ForecastError::InsufficientData(_))));
}

#[test]
fn test_rmse_recovers_injected_noise_sigma() {
    // Fit on a clean constant level so the forecast is exactly the level,
    // then score against a long holdout with known Gaussian noise: the RMSE
    // should come out near the injected sigma
    let level = 100.0;
    let sigma = 5.0;
    let series: Vec<Observation> = (0..20).map(|i| Observation::new(i + 1, level)).collect();

    let mut engine = ForecastEngine::new(EngineConfig::new(4, 12, 20, 300, 0.5)).unwrap();
    engine.fit(&series).unwrap();

    let mut rng = StdRng::seed_from_u64(99);
    let noise = Normal::new(0.0, sigma).unwrap();
    let holdout: Vec<Observation> = (0..300)
        .map(|i| Observation::new(21 + i, level + noise.sample(&mut rng)))
        .collect();

    let metrics = evaluate(&engine, &holdout).unwrap();
    assert!(
        (metrics.root_mean_squared_error - sigma).abs() < 0.5,
        "RMSE {} expected near {}",
        metrics.root_mean_squared_error,
        sigma
    );
    assert!(metrics.mean_absolute_error < metrics.root_mean_squared_error);
}
