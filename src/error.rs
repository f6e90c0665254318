//! Unified error types for the heater controller.
//!
//! All variants are `Copy` so they pass through the tick path without
//! allocation.  Sensor errors never escape a tick: the controller folds
//! them into an invalid [`Reading`](crate::sensors::Reading) or a logged
//! warning.  Only configuration errors reach the caller.

use core::fmt;

use embedded_hal::i2c::ErrorKind;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor transaction failed.
    Sensor(SensorError),
    /// Configuration is out of range.  The message names the field.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The I2C transaction itself failed (NACK, arbitration loss, ...).
    Bus(ErrorKind),
    /// A data word arrived with a bad CRC-8.
    Crc,
    /// No device has been probed successfully yet.
    NotPresent,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(kind) => write!(f, "I2C bus error: {kind}"),
            Self::Crc => write!(f, "CRC mismatch"),
            Self::NotPresent => write!(f, "sensor not present"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
