use clap::Parser;

use std::sync::mpsc;
use std::time::Duration;

use xgps_smoother::{Config, Session, SmoothedFix, SmootherConfig, DEFAULT_PORT};

#[derive(Parser, Debug)]
#[command(name = "xgps-smoother")]
#[command(about = "Listen for XGPS sentences on UDP and print smoothed fixes")]
#[command(version)]
struct Args {
    /// UDP port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Assumed accuracy of every received fix in meters
    #[arg(long, default_value_t = 15.0)]
    sensor_accuracy: f64,

    /// Accuracy floor in meters; process noise is five times this per second
    #[arg(long, default_value_t = 1.0)]
    min_accuracy: f64,

    /// How often a blocked receive checks for shutdown
    #[arg(long, default_value_t = 200)]
    poll_interval_ms: u64,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            port: self.port,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            smoother: SmootherConfig {
                min_accuracy_m: self.min_accuracy,
                sensor_accuracy_m: self.sensor_accuracy,
            },
            ..Config::default()
        }
    }
}

fn print_fix(fix: &SmoothedFix) {
    println!(
        "{} lat {:.7} lon {:.7} alt {:.1}m brg {:.1} spd {:.1}m/s",
        fix.emitted_at.format("%H:%M:%S%.3f"),
        fix.latitude,
        fix.longitude,
        fix.altitude,
        fix.bearing,
        fix.speed
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = args.config();

    let (tx, rx) = mpsc::channel::<SmoothedFix>();
    let mut session = Session::new(config.clone());
    session.start(tx)?;

    // The worker holds the only sender; the channel closes when it exits.
    for fix in rx {
        print_fix(&fix);
    }
    session.stop()?;
    Ok(())
}
