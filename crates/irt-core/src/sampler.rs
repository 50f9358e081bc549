use embassy_time::{Duration, Instant, Timer};
use micromath::F32Ext;

/// Source of raw temperature readings, implemented by the sensor adapter.
pub trait SampleSource {
    /// Obtain one raw reading in degrees Celsius.
    ///
    /// Read failures are resolved by the implementation (best effort, e.g.
    /// repeating the last good value); the sampler includes whatever comes
    /// back unconditionally.
    async fn read(&mut self) -> f32;
}

/// Progress feedback during an acquisition window, implemented by the
/// display adapter.
pub trait AcquisitionUi {
    /// Called once per poll with the completed fraction in percent (0..=100).
    async fn progress(&mut self, percent: u8);
}

/// Streaming mean/variance accumulator (Welford), O(1) memory regardless of
/// how long the acquisition runs.
pub struct Sampler {
    count: u32,
    mean: f32,
    m2: f32,
}

impl Sampler {
    pub const fn new() -> Self {
        Self { count: 0, mean: 0.0, m2: 0.0 }
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.mean = 0.0;
        self.m2 = 0.0;
    }

    /// Fold one reading into the running statistics.
    pub fn add_reading(&mut self, value: f32) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f32;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Running mean. Only meaningful after at least one reading.
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Population standard deviation of the readings so far.
    pub fn std_dev(&self) -> f32 {
        if self.count < 2 {
            return 0.0;
        }
        (self.m2 / self.count as f32).sqrt()
    }

    /// Acquisition driver: sample `source` every `poll_interval` until
    /// `duration` has elapsed, reporting percent progress to `ui`, and return
    /// the sealed mean.
    ///
    /// The elapsed check happens at the top of each iteration, so the final
    /// read may overshoot `duration` (stop after max time, never truncate a
    /// read in progress). This is the only multi-second operation in the
    /// core; the caller accepts that no other event is handled meanwhile.
    pub async fn run_for<S, U>(
        &mut self,
        duration: Duration,
        poll_interval: Duration,
        source: &mut S,
        ui: &mut U,
    ) -> f32
    where
        S: SampleSource,
        U: AcquisitionUi,
    {
        self.reset();
        let start = Instant::now();
        // Guards the percent division; a zero window still takes one sample
        // and reports completion.
        let window_ms = duration.as_millis().max(1);
        loop {
            let value = source.read().await;
            self.add_reading(value);

            let elapsed = Instant::now() - start;
            let done = elapsed >= duration;
            let percent = if done {
                100
            } else {
                (elapsed.as_millis() * 100 / window_ms).min(100) as u8
            };
            ui.progress(percent).await;

            if done {
                break;
            }
            Timer::after(poll_interval).await;
        }
        self.mean()
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}
