//! Fuzz target: `sht3x::decode_measurement`
//!
//! Feeds arbitrary six-byte frames to the SHT3x decoder and asserts it
//! never panics and that every frame it accepts decodes into the sensor's
//! physical range with matching CRCs.
//!
//! cargo fuzz run fuzz_sht3x_frame

#![no_main]

use libfuzzer_sys::fuzz_target;
use terralid::sensors::sht3x::{crc8, decode_measurement};

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = <[u8; 6]>::try_from(data.get(..6).unwrap_or_default()) else {
        return;
    };

    match decode_measurement(&frame) {
        Ok(m) => {
            assert_eq!(crc8(&frame[0..2]), frame[2]);
            assert_eq!(crc8(&frame[3..5]), frame[5]);
            assert!((-45.0..=130.0).contains(&m.temperature_c));
            assert!((0.0..=100.0).contains(&m.humidity_pct));
        }
        Err(_) => {
            assert!(crc8(&frame[0..2]) != frame[2] || crc8(&frame[3..5]) != frame[5]);
        }
    }
});
