use chrono::{DateTime, Utc};

use std::sync::mpsc;

use crate::config::ReportedAccuracy;
use crate::err::SinkError;
use crate::parser::FixMeasurement;

/// A smoothed position ready to be handed to the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedFix {
    /// Smoothed latitude in decimal degrees.
    pub latitude: f64,
    /// Smoothed longitude in decimal degrees.
    pub longitude: f64,
    /// Altitude in meters, as received.
    pub altitude: f64,
    /// Bearing in degrees, as received.
    pub bearing: f32,
    /// Ground speed in meters per second, as received.
    pub speed: f32,
    pub accuracy: ReportedAccuracy,
    /// When the fix was produced.
    pub emitted_at: DateTime<Utc>,
}

impl SmoothedFix {
    /// Combine smoothed coordinates with the untouched parts of `raw`.
    pub fn new(raw: &FixMeasurement, (latitude, longitude): (f64, f64), accuracy: ReportedAccuracy) -> Self {
        SmoothedFix {
            latitude,
            longitude,
            altitude: raw.altitude,
            bearing: raw.bearing,
            speed: raw.speed,
            accuracy,
            emitted_at: Utc::now(),
        }
    }
}

/// Consumer of smoothed fixes, called in arrival order.
///
/// Errors are logged by the caller and never stop the pipeline.
pub trait FixSink {
    fn deliver(&mut self, fix: SmoothedFix) -> Result<(), SinkError>;
}

impl FixSink for mpsc::Sender<SmoothedFix> {
    fn deliver(&mut self, fix: SmoothedFix) -> Result<(), SinkError> {
        self.send(fix).map_err(|_| SinkError::Disconnected)
    }
}

impl<F> FixSink for F
where
    F: FnMut(SmoothedFix) -> Result<(), SinkError>,
{
    fn deliver(&mut self, fix: SmoothedFix) -> Result<(), SinkError> {
        self(fix)
    }
}
