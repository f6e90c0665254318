//! Sensirion SHT3x humidity/temperature sensor over `embedded-hal` I2C.
//!
//! Only the subset the heater controller needs: address probing, a
//! single-shot high-repeatability measurement, and the on-chip heater.
//!
//! ## Frame format
//!
//! Every 16-bit word the sensor returns is followed by a CRC-8
//! (polynomial 0x31, init 0xFF).  A measurement is six bytes:
//!
//! ```text
//! [ T_msb T_lsb T_crc | RH_msb RH_lsb RH_crc ]
//! ```
//!
//! Conversion (datasheet §4.13):
//! `T = -45 + 175 * raw / 65535`, `RH = 100 * raw / 65535`.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::debug;

use super::Measurement;
use crate::app::ports::HumiditySensorPort;
use crate::error::SensorError;

const CMD_SOFT_RESET: u16 = 0x30A2;
const CMD_READ_STATUS: u16 = 0xF32D;
/// Single shot, high repeatability, clock stretching disabled.
const CMD_MEASURE_HIGH_REP: u16 = 0x2400;
const CMD_HEATER_ENABLE: u16 = 0x306D;
const CMD_HEATER_DISABLE: u16 = 0x3066;

const RESET_DELAY_MS: u32 = 10;
/// Max conversion time at high repeatability is 15.5 ms.
const MEASURE_DELAY_MS: u32 = 20;

const CRC_POLY: u8 = 0x31;
const CRC_INIT: u8 = 0xFF;

/// SHT3x driver.  Owns the bus handle and a delay provider.
pub struct Sht3x<I2C, D> {
    i2c: I2C,
    delay: D,
    address: Option<u8>,
}

impl<I2C: I2c, D: DelayNs> Sht3x<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            i2c,
            delay,
            address: None,
        }
    }

    /// Address of the device found by the last successful probe.
    pub fn address(&self) -> Option<u8> {
        self.address
    }

    /// Give the bus and delay back to the caller.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Soft-reset the device at `address` and read its status register.
    ///
    /// On success the driver talks to `address` from now on and the raw
    /// status word is returned.  On failure the previous address is
    /// forgotten.
    pub fn probe_address(&mut self, address: u8) -> Result<u16, SensorError> {
        self.address = None;
        self.command(address, CMD_SOFT_RESET)?;
        self.delay.delay_ms(RESET_DELAY_MS);
        self.command(address, CMD_READ_STATUS)?;
        let mut buf = [0u8; 3];
        self.i2c.read(address, &mut buf).map_err(bus_error)?;
        let status = decode_word(&buf)?;
        self.address = Some(address);
        Ok(status)
    }

    /// Trigger a single-shot measurement and read it back.
    pub fn measure(&mut self) -> Result<Measurement, SensorError> {
        let address = self.address.ok_or(SensorError::NotPresent)?;
        self.command(address, CMD_MEASURE_HIGH_REP)?;
        self.delay.delay_ms(MEASURE_DELAY_MS);
        let mut frame = [0u8; 6];
        self.i2c.read(address, &mut frame).map_err(bus_error)?;
        decode_measurement(&frame)
    }

    /// Switch the on-chip heater.
    pub fn heater(&mut self, enabled: bool) -> Result<(), SensorError> {
        let address = self.address.ok_or(SensorError::NotPresent)?;
        let cmd = if enabled {
            CMD_HEATER_ENABLE
        } else {
            CMD_HEATER_DISABLE
        };
        self.command(address, cmd)
    }

    fn command(&mut self, address: u8, cmd: u16) -> Result<(), SensorError> {
        self.i2c
            .write(address, &cmd.to_be_bytes())
            .map_err(bus_error)
    }
}

impl<I2C: I2c, D: DelayNs> HumiditySensorPort for Sht3x<I2C, D> {
    fn probe(&mut self, address: u8) -> bool {
        match self.probe_address(address) {
            Ok(status) => {
                debug!("SHT3x found at 0x{address:02X}, status=0x{status:04X}");
                true
            }
            Err(e) => {
                debug!("SHT3x probe at 0x{address:02X} failed: {e}");
                false
            }
        }
    }

    fn read_measurement(&mut self) -> Result<Measurement, SensorError> {
        self.measure()
    }

    fn set_heater(&mut self, enabled: bool) -> Result<(), SensorError> {
        self.heater(enabled)
    }
}

fn bus_error<E: embedded_hal::i2c::Error>(e: E) -> SensorError {
    SensorError::Bus(e.kind())
}

// ── Frame decoding ────────────────────────────────────────────

/// Sensirion CRC-8 over `data`.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC_INIT;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Decode one `[msb, lsb, crc]` word.
fn decode_word(chunk: &[u8]) -> Result<u16, SensorError> {
    match chunk {
        [msb, lsb, crc] if crc8(&[*msb, *lsb]) == *crc => Ok(u16::from_be_bytes([*msb, *lsb])),
        _ => Err(SensorError::Crc),
    }
}

/// Decode a six-byte measurement frame into physical units.
pub fn decode_measurement(frame: &[u8; 6]) -> Result<Measurement, SensorError> {
    let raw_t = decode_word(&frame[0..3])?;
    let raw_rh = decode_word(&frame[3..6])?;
    Ok(Measurement {
        temperature_c: -45.0 + 175.0 * f32::from(raw_t) / 65535.0,
        humidity_pct: 100.0 * f32::from(raw_rh) / 65535.0,
    })
}
