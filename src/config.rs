use std::time::Duration;

/// Port X-Plane style simulators broadcast XGPS sentences to.
pub const DEFAULT_PORT: u16 = 49002;

/// Tuning of the coordinate smoother.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmootherConfig {
    /// Lower bound on the accuracy of any fix, in meters. The process noise
    /// rate is five times this value per second.
    pub min_accuracy_m: f64,
    /// Assumed accuracy of every measurement, in meters.
    pub sensor_accuracy_m: f64,
}

impl SmootherConfig {
    /// Growth rate of the position uncertainty in meters per second.
    #[inline]
    pub fn process_noise_rate(&self) -> f64 {
        5.0 * self.min_accuracy_m
    }
}

impl Default for SmootherConfig {
    fn default() -> Self {
        SmootherConfig {
            min_accuracy_m: 1.0,
            sensor_accuracy_m: 15.0,
        }
    }
}

/// Accuracy figures attached to every emitted fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedAccuracy {
    /// Horizontal accuracy in meters.
    pub horizontal_m: f32,
    /// Vertical accuracy in meters.
    pub vertical_m: f32,
    /// Speed accuracy in meters per second.
    pub speed_mps: f32,
    /// Bearing accuracy in degrees.
    pub bearing_deg: f32,
}

impl Default for ReportedAccuracy {
    fn default() -> Self {
        ReportedAccuracy {
            horizontal_m: 3.0,
            vertical_m: 1.0,
            speed_mps: 0.1,
            bearing_deg: 1.0,
        }
    }
}

/// Everything a session needs to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// UDP port to listen on. `0` picks an ephemeral port.
    pub port: u16,
    /// Size of the receive buffer; longer datagrams are truncated.
    pub recv_buffer_len: usize,
    /// How long a receive may block before the cancel token is checked again.
    pub poll_interval: Duration,
    pub smoother: SmootherConfig,
    pub accuracy: ReportedAccuracy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            recv_buffer_len: 1024,
            poll_interval: Duration::from_millis(200),
            smoother: SmootherConfig::default(),
            accuracy: ReportedAccuracy::default(),
        }
    }
}
