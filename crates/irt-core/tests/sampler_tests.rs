use embassy_time::Duration;
use irt_core::{AcquisitionUi, SampleSource, Sampler};

struct ConstSource(f32);

impl SampleSource for ConstSource {
    async fn read(&mut self) -> f32 {
        self.0
    }
}

struct SeqSource {
    values: Vec<f32>,
    next: usize,
}

impl SampleSource for SeqSource {
    async fn read(&mut self) -> f32 {
        let v = self.values[self.next % self.values.len()];
        self.next += 1;
        v
    }
}

#[derive(Default)]
struct RecordingUi {
    reports: Vec<u8>,
}

impl AcquisitionUi for RecordingUi {
    async fn progress(&mut self, percent: u8) {
        self.reports.push(percent);
    }
}

#[test]
fn mean_matches_arithmetic_mean() {
    let readings = [36.4_f32, 36.8, 37.1, 36.2, 36.9, 36.55];
    let expected: f32 =
        readings.iter().sum::<f32>() / readings.len() as f32;

    let mut sampler = Sampler::new();
    for r in readings {
        sampler.add_reading(r);
    }

    assert_eq!(sampler.count(), readings.len() as u32);
    assert!((sampler.mean() - expected).abs() < 1e-4);
}

#[test]
fn constant_input_yields_exact_mean() {
    let mut sampler = Sampler::new();
    for _ in 0..1000 {
        sampler.add_reading(25.0);
    }
    assert_eq!(sampler.mean(), 25.0);
    assert_eq!(sampler.std_dev(), 0.0);
}

#[test]
fn reset_clears_previous_window() {
    let mut sampler = Sampler::new();
    sampler.add_reading(100.0);
    sampler.add_reading(200.0);

    sampler.reset();
    assert_eq!(sampler.count(), 0);

    sampler.add_reading(36.6);
    assert!((sampler.mean() - 36.6).abs() < 1e-6);
}

#[test]
fn std_dev_of_spread_readings() {
    let mut sampler = Sampler::new();
    // Mean 4.0, population variance 4.0.
    for r in [2.0_f32, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 1.0] {
        sampler.add_reading(r);
    }
    assert!((sampler.mean() - 4.0).abs() < 1e-5);
    assert!((sampler.std_dev() - 2.0).abs() < 1e-4);
}

#[futures_test::test]
async fn run_for_returns_mean_of_constant_source() {
    let mut sampler = Sampler::new();
    let mut source = ConstSource(25.0);
    let mut ui = RecordingUi::default();

    let mean = sampler
        .run_for(
            Duration::from_millis(80),
            Duration::from_millis(10),
            &mut source,
            &mut ui,
        )
        .await;

    assert_eq!(mean, 25.0);
    // Stop-after-max-time: at least duration / poll_interval samples, and the
    // final iteration is allowed to overshoot.
    assert!(sampler.count() >= 8, "count = {}", sampler.count());
}

#[futures_test::test]
async fn run_for_reports_monotonic_progress_up_to_full() {
    let mut sampler = Sampler::new();
    let mut source = SeqSource { values: vec![36.5, 36.7, 36.6], next: 0 };
    let mut ui = RecordingUi::default();

    sampler
        .run_for(
            Duration::from_millis(50),
            Duration::from_millis(10),
            &mut source,
            &mut ui,
        )
        .await;

    assert!(!ui.reports.is_empty());
    assert!(ui.reports.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*ui.reports.last().unwrap(), 100);
}

#[futures_test::test]
async fn run_for_zero_window_takes_one_sample_and_completes() {
    let mut sampler = Sampler::new();
    let mut source = ConstSource(36.6);
    let mut ui = RecordingUi::default();

    let mean = sampler
        .run_for(
            Duration::from_millis(0),
            Duration::from_millis(10),
            &mut source,
            &mut ui,
        )
        .await;

    // Degenerate window: one read, full progress, no division blowup.
    assert_eq!(sampler.count(), 1);
    assert!((mean - 36.6).abs() < 1e-6);
    assert_eq!(ui.reports.as_slice(), &[100]);
}

#[futures_test::test]
async fn run_for_reseals_each_acquisition() {
    let mut sampler = Sampler::new();
    let mut ui = RecordingUi::default();

    let first = sampler
        .run_for(
            Duration::from_millis(30),
            Duration::from_millis(10),
            &mut ConstSource(40.0),
            &mut ui,
        )
        .await;
    let second = sampler
        .run_for(
            Duration::from_millis(30),
            Duration::from_millis(10),
            &mut ConstSource(20.0),
            &mut ui,
        )
        .await;

    // The second window must not be contaminated by the first.
    assert_eq!(first, 40.0);
    assert_eq!(second, 20.0);
}
