//! Smooths the XGPS position stream a flight simulator broadcasts over UDP.
//!
//! Datagrams are parsed into [FixMeasurement](parser/struct.FixMeasurement.html)s,
//! their coordinates run through a [Smoother](kalman/struct.Smoother.html) and
//! the result is handed to a [FixSink](sink/trait.FixSink.html). A
//! [Session](session/struct.Session.html) owns one such pipeline at a time.

#[cfg(test)]
#[macro_use]
extern crate assert_matches;
extern crate arrayvec;
extern crate chrono;
#[macro_use]
extern crate log;
#[macro_use]
extern crate quick_error;
extern crate socket2;

pub mod config;
pub mod err;
pub mod ingest;
pub mod kalman;
mod lexer;
pub mod parser;
pub mod session;
pub mod sink;

pub use config::{Config, ReportedAccuracy, SmootherConfig, DEFAULT_PORT};
pub use err::{ParseError, SessionError, SinkError};
pub use ingest::{CancelToken, Closer, Datagram, DatagramSource, IngestLoop, UdpSource};
pub use kalman::Smoother;
pub use parser::{parse, FixMeasurement};
pub use session::Session;
pub use sink::{FixSink, SmoothedFix};
