#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate xgps_smoother;

use xgps_smoother::{parse, Smoother};

fuzz_target!(|data: &[u8]| {
    let mut smoother = Smoother::default();
    if let Ok(fix) = parse(data, 0) {
        smoother.process(fix.latitude, fix.longitude, fix.timestamp_ms);
    }
});
