//! Recursive smoothing of latitude/longitude pairs.
//!
//! Both axes share one scalar variance and one gain. The variance is in
//! meters² and grows with elapsed time at the configured process noise rate.

use crate::config::SmootherConfig;

/// One-dimensional Kalman filter applied to latitude and longitude.
#[derive(Debug, Clone)]
pub struct Smoother {
    latitude: f64,
    longitude: f64,
    /// Negative until the first measurement arrives.
    variance: f64,
    last_update_ms: i64,
    noise_rate: f64,
    sensor_accuracy: f64,
}

impl Smoother {
    /// Create an uninitialised smoother.
    pub fn new(config: SmootherConfig) -> Self {
        Smoother {
            latitude: 0.0,
            longitude: 0.0,
            variance: -1.0,
            last_update_ms: 0,
            noise_rate: config.process_noise_rate(),
            sensor_accuracy: config.sensor_accuracy_m,
        }
    }

    /// Seed the filter with a known position whose accuracy is `accuracy_m`.
    pub fn set_state(&mut self, latitude: f64, longitude: f64, accuracy_m: f64, timestamp_ms: i64) {
        self.latitude = latitude;
        self.longitude = longitude;
        self.variance = accuracy_m * accuracy_m;
        self.last_update_ms = timestamp_ms;
    }

    /// Feed one measurement and return the smoothed `(latitude, longitude)`.
    ///
    /// The first measurement after construction or `reset` is returned as is.
    /// A timestamp that is not newer than the previous one skips the process
    /// noise step but still corrects the estimate.
    pub fn process(&mut self, latitude: f64, longitude: f64, timestamp_ms: i64) -> (f64, f64) {
        if self.variance < 0.0 {
            let accuracy = self.sensor_accuracy;
            self.set_state(latitude, longitude, accuracy, timestamp_ms);
            return (latitude, longitude);
        }

        let dt = timestamp_ms.wrapping_sub(self.last_update_ms);
        if dt > 0 {
            self.variance += dt as f64 * self.noise_rate * self.noise_rate / 1000.0;
            self.last_update_ms = timestamp_ms;
        }

        let gain = self.variance / (self.variance + self.sensor_accuracy * self.sensor_accuracy);
        self.latitude += gain * (latitude - self.latitude);
        self.longitude += gain * (longitude - self.longitude);
        self.variance *= 1.0 - gain;

        (self.latitude, self.longitude)
    }

    /// Forget everything; the next measurement seeds the filter again.
    pub fn reset(&mut self) {
        self.variance = -1.0;
    }

    pub fn is_initialized(&self) -> bool {
        self.variance >= 0.0
    }

    /// Current uncertainty in meters², `None` before the first measurement.
    pub fn variance(&self) -> Option<f64> {
        if self.is_initialized() {
            Some(self.variance)
        } else {
            None
        }
    }

    /// Current estimate, `None` before the first measurement.
    pub fn estimate(&self) -> Option<(f64, f64)> {
        if self.is_initialized() {
            Some((self.latitude, self.longitude))
        } else {
            None
        }
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Smoother::new(SmootherConfig::default())
    }
}
